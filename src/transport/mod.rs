// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The outer-transport contract consumed by a jail connection.
//!
//! A jail connection never talks to the network itself; it builds exactly one
//! transport handle bound to the resolved outer host and funnels every
//! command and byte stream through it. The contract is deliberately small:
//! a factory that opens a handle, and a handle that runs commands with an
//! optional stdin payload.
//!
//! The default implementation drives the local OpenSSH client binary (see
//! [`openssh`]); orchestrators embedding this crate can substitute their own.

// Module declarations
pub mod config;
pub mod openssh;
pub mod result;

// Re-export public API types
pub use config::TransportConfig;
pub use openssh::{OpenSshFactory, OpenSshTransport};
pub use result::CommandResult;

use async_trait::async_trait;
use thiserror::Error;

/// Failures raised by a transport implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport process could not be started
    #[error("failed to spawn ssh client: {0}")]
    Spawn(#[source] std::io::Error),

    /// An I/O failure while feeding stdin or collecting output
    #[error("transport I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// The remote command finished without reporting an exit status
    #[error("remote command finished without an exit status")]
    NoExitStatus,

    /// Implementation-specific failure
    #[error("{0}")]
    Other(String),
}

/// A live handle to the outer host.
///
/// One handle serves one jail connection; it is never shared or rebuilt.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Run `command` on the outer host.
    ///
    /// `input` is fed to the command's stdin (an empty slice still closes
    /// stdin cleanly so commands that read it terminate). `sudo` requests
    /// privilege escalation; implementations that cannot escalate should run
    /// the command unescalated rather than fail.
    async fn exec(
        &self,
        command: &str,
        sudo: bool,
        input: Option<&[u8]>,
    ) -> Result<CommandResult, TransportError>;

    /// Release the underlying connection.
    async fn close(&self) -> Result<(), TransportError>;
}

/// Builds the transport handle for a resolved outer host.
///
/// A jail connection calls this at most once, on first need.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    type Transport: Transport;

    async fn connect(
        &self,
        host: &str,
        config: &TransportConfig,
    ) -> Result<Self::Transport, TransportError>;
}
