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

//! Error types for jail address resolution and connection lifecycle

use std::path::PathBuf;
use thiserror::Error;

use crate::transport::TransportError;

/// Errors surfaced by a jail connection.
///
/// These are reported to the caller unmodified; this layer performs no
/// retries and no recovery. Retry policy belongs to the transport or the
/// calling orchestrator.
#[derive(Debug, Error)]
pub enum JailError {
    /// An execution operation ran before any host identifier resolved
    #[error("no outer host resolved for execution (last candidate: {candidate:?})")]
    UnresolvedAddress { candidate: Option<String> },

    /// After overrides were applied the identifier still lacks the
    /// mandatory `jail@host` form
    #[error("host '{candidate}' is not in jail@host notation")]
    MissingJailNotation { candidate: String },

    /// A local file could not be read while staging an upload
    #[error("failed to read local file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The requested operation is intentionally unsupported
    #[error("{operation} is not implemented")]
    NotImplemented { operation: &'static str },

    /// Connecting again after an explicit close
    #[error("connection is closed")]
    ConnectionClosed,

    /// A failure inside the underlying transport, passed through verbatim
    #[error(transparent)]
    Transport(#[from] TransportError),
}
