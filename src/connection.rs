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

//! Lazy remote execution against a jail-hosted target.
//!
//! A [`JailConnection`] is driven by an orchestrator through three kinds of
//! calls, in no guaranteed order: construction with a provisional address,
//! override callbacks carrying better targeting information, and execution
//! requests. Whatever the order, the connection settles on one identity and
//! builds exactly one transport, on first need.

use std::path::Path;
use tracing::{debug, warn};

use crate::address::{JailAddress, Provenance};
use crate::error::JailError;
use crate::transport::{CommandResult, Transport, TransportConfig, TransportFactory};
use crate::utils::quote;

/// Opaque marker for an established inner-jail session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionId(u32);

impl SessionId {
    /// Placeholder until jail session management lands.
    // TODO: carry the jail id reported by `jls` once `jexec` routing is added
    pub(crate) const PLACEHOLDER: SessionId = SessionId(0);

    pub fn value(&self) -> u32 {
        self.0
    }
}

/// Targeting information supplied by an override callback.
///
/// When the orchestrator resolved a delegation for this task, the delegate
/// target is authoritative over the raw override string.
#[derive(Debug, Clone, Default)]
pub struct OverrideContext {
    pub delegate_to: Option<String>,
}

impl OverrideContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delegate(target: impl Into<String>) -> Self {
        Self {
            delegate_to: Some(target.into()),
        }
    }
}

/// Transport lifecycle of one connection.
///
/// `Connected` is terminal until [`JailConnection::close`], and `Closed` is
/// terminal outright: the target identity survives a close, the transport
/// does not come back.
enum ConnectionState<T> {
    /// No transport yet; address resolution may still be in progress
    Pending,
    /// Transport built and jail session marker assigned, exactly once
    Connected { transport: T, session: SessionId },
    /// Explicitly closed; re-connecting is rejected
    Closed,
}

/// A remote-execution target reached through an outer host.
///
/// Owns the resolved [`JailAddress`], the transport configuration, and,
/// once an execution operation forces it, exactly one transport handle.
pub struct JailConnection<F: TransportFactory> {
    address: JailAddress,
    config: TransportConfig,
    factory: F,
    state: ConnectionState<F::Transport>,
}

impl<F: TransportFactory> JailConnection<F> {
    /// Create a connection for `initial_address`.
    ///
    /// The initial address is resolved best-effort: it may be a placeholder
    /// (a loopback alias from the inventory) that an override supersedes
    /// before anything executes.
    pub fn new(initial_address: &str, config: TransportConfig, factory: F) -> Self {
        let mut address = JailAddress::new();
        address.resolve(initial_address, Provenance::Provisional);
        Self {
            address,
            config,
            factory,
            state: ConnectionState::Pending,
        }
    }

    /// Apply richer targeting information from the orchestrator.
    ///
    /// The context's delegate target, when present, is resolved instead of
    /// `candidate`. By the time overrides have been applied the compound
    /// `jail@host` form is mandatory; a still-unresolved identity is an
    /// error.
    pub fn apply_override(
        &mut self,
        candidate: &str,
        context: &OverrideContext,
    ) -> Result<(), JailError> {
        let chosen = context.delegate_to.as_deref().unwrap_or(candidate);
        self.address.resolve(chosen, Provenance::Authoritative);

        if self.address.is_resolved() {
            Ok(())
        } else {
            Err(JailError::MissingJailNotation {
                candidate: chosen.to_string(),
            })
        }
    }

    /// Establish the transport if it does not exist yet.
    ///
    /// Every execution operation funnels through here, so repeated or
    /// re-entrant calls must be cheap: once connected the call returns
    /// immediately and no second transport is ever built.
    pub async fn ensure_connected(&mut self) -> Result<(), JailError> {
        match self.state {
            ConnectionState::Closed => return Err(JailError::ConnectionClosed),
            ConnectionState::Connected { .. } => return Ok(()),
            ConnectionState::Pending => {}
        }

        let host = match self.address.outer_host() {
            Some(host) => host.to_string(),
            None => {
                return Err(JailError::UnresolvedAddress {
                    candidate: self.address.last_candidate().map(str::to_string),
                })
            }
        };

        let transport = self.factory.connect(&host, &self.config).await?;
        let session = SessionId::PLACEHOLDER;
        self.state = ConnectionState::Connected { transport, session };
        debug!(
            host = %host,
            jail = ?self.address.jail_name(),
            session = session.value(),
            "transport established"
        );
        Ok(())
    }

    /// Connect if needed, then hand out the live transport.
    async fn transport(&mut self) -> Result<&F::Transport, JailError> {
        self.ensure_connected().await?;
        match &self.state {
            ConnectionState::Connected { transport, .. } => Ok(transport),
            ConnectionState::Closed => Err(JailError::ConnectionClosed),
            ConnectionState::Pending => Err(JailError::UnresolvedAddress {
                candidate: self.address.last_candidate().map(str::to_string),
            }),
        }
    }

    /// Run a command on the target, feeding `input` to its stdin.
    ///
    /// The command is delegated to the transport verbatim; it runs on the
    /// outer host, unescalated.
    pub async fn exec_command(
        &mut self,
        command: &str,
        input: Option<&[u8]>,
    ) -> Result<CommandResult, JailError> {
        let result = self.transport().await?.exec(command, false, input).await?;
        Ok(result)
    }

    /// Upload a local file to `remote_path` on the target.
    pub async fn put_file(
        &mut self,
        local_path: &Path,
        remote_path: &str,
    ) -> Result<(), JailError> {
        let data = tokio::fs::read(local_path)
            .await
            .map_err(|source| JailError::Io {
                path: local_path.to_path_buf(),
                source,
            })?;
        self.put_bytes(&data, remote_path).await
    }

    /// Write `data` to `remote_path` on the target.
    ///
    /// An empty payload still creates or truncates the remote file.
    pub async fn put_bytes(&mut self, data: &[u8], remote_path: &str) -> Result<(), JailError> {
        let command = if data.is_empty() {
            format!("cat /dev/null > {}", quote(remote_path))
        } else {
            format!("cat - > {}", quote(remote_path))
        };

        let result = self.exec_command(&command, Some(data)).await?;
        if !result.is_success() {
            warn!(
                remote_path,
                exit_status = result.exit_status,
                stderr = %result.stderr_string().trim_end(),
                "remote write reported failure"
            );
        }
        Ok(())
    }

    /// Download a remote file. There is no retrieval path through the jail
    /// layer, so this always fails.
    pub async fn fetch_file(
        &self,
        _remote_path: &str,
        _local_path: &Path,
    ) -> Result<(), JailError> {
        Err(JailError::NotImplemented {
            operation: "fetch_file",
        })
    }

    /// Release the transport.
    ///
    /// Safe to call repeatedly. The resolved address survives, but the
    /// connection cannot be re-established afterwards.
    pub async fn close(&mut self) {
        let state = std::mem::replace(&mut self.state, ConnectionState::Closed);
        if let ConnectionState::Connected { transport, .. } = state {
            if let Err(err) = transport.close().await {
                warn!(error = %err, "transport close failed");
            }
            debug!(target_address = %self.address, "connection closed");
        }
    }

    /// The resolved (or partially resolved) target identity.
    pub fn address(&self) -> &JailAddress {
        &self.address
    }

    /// The inner-jail session marker, once connected.
    pub fn session_id(&self) -> Option<SessionId> {
        match &self.state {
            ConnectionState::Connected { session, .. } => Some(*session),
            _ => None,
        }
    }

    /// Whether the transport has been established and not yet closed.
    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected { .. })
    }
}
