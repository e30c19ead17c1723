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

//! Default transport driving the local OpenSSH client binary.
//!
//! Each `exec` spawns `ssh` in batch mode with connection sharing enabled
//! (`ControlMaster=auto`), so the first command pays the handshake cost and
//! later commands reuse the master socket. The control socket lives under
//! the system temp directory keyed by ssh's `%C` connection hash.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{CommandResult, Transport, TransportConfig, TransportError, TransportFactory};
use crate::utils::quote;

/// How long the control master keeps an idle connection alive.
const CONTROL_PERSIST_SECS: u64 = 60;

/// A handle to one outer host, backed by the `ssh` binary.
#[derive(Debug, Clone)]
pub struct OpenSshTransport {
    host: String,
    config: TransportConfig,
    control_path: PathBuf,
}

impl OpenSshTransport {
    fn new(host: String, config: TransportConfig) -> Self {
        // ssh expands %C to a hash of (local host, remote host, port, user),
        // which keeps one master socket per distinct destination.
        let control_path = std::env::temp_dir().join("sshjail-%C");
        Self {
            host,
            config,
            control_path,
        }
    }

    /// Arguments shared by every ssh invocation against this host.
    fn base_args(&self) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "ControlMaster=auto".to_string(),
            "-o".to_string(),
            format!("ControlPersist={CONTROL_PERSIST_SECS}s"),
            "-o".to_string(),
            format!("ControlPath={}", self.control_path.display()),
        ];
        if let Some(port) = self.config.port {
            args.push("-p".to_string());
            args.push(port.to_string());
        }
        if let Some(user) = &self.config.user {
            args.push("-l".to_string());
            args.push(user.clone());
        }
        if let Some(identity) = &self.config.identity_file {
            args.push("-i".to_string());
            args.push(identity.display().to_string());
        }
        if let Some(timeout) = self.config.connect_timeout {
            args.push("-o".to_string());
            args.push(format!("ConnectTimeout={}", timeout.as_secs().max(1)));
        }
        for option in &self.config.extra_options {
            args.push("-o".to_string());
            args.push(option.clone());
        }
        args
    }
}

#[async_trait]
impl Transport for OpenSshTransport {
    async fn exec(
        &self,
        command: &str,
        sudo: bool,
        input: Option<&[u8]>,
    ) -> Result<CommandResult, TransportError> {
        let remote_command = if sudo {
            format!("sudo -n -- sh -c {}", quote(command))
        } else {
            command.to_string()
        };

        let mut child = Command::new("ssh")
            .args(self.base_args())
            .arg(&self.host)
            .arg(&remote_command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(TransportError::Spawn)?;

        let payload = input.unwrap_or_default().to_vec();
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut pipe) = stdin {
                pipe.write_all(&payload).await?;
                pipe.shutdown().await?;
            }
            Ok::<_, std::io::Error>(())
        };

        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;

        // A command that never reads stdin closes its end early; that is
        // not a transport failure.
        if let Err(err) = fed {
            if err.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(TransportError::Io(err));
            }
        }

        let exit_status = output.status.code().ok_or(TransportError::NoExitStatus)?;
        debug!(host = %self.host, exit_status, "remote command finished");

        Ok(CommandResult {
            exit_status: exit_status as u32,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    async fn close(&self) -> Result<(), TransportError> {
        // Ask the control master to exit; a missing master is fine.
        let status = Command::new("ssh")
            .arg("-o")
            .arg(format!("ControlPath={}", self.control_path.display()))
            .arg("-O")
            .arg("exit")
            .arg(&self.host)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(TransportError::Spawn)?;
        if !status.success() {
            warn!(host = %self.host, "no control master to tear down");
        }
        Ok(())
    }
}

/// Factory producing [`OpenSshTransport`] handles.
#[derive(Debug, Clone, Default)]
pub struct OpenSshFactory;

#[async_trait]
impl TransportFactory for OpenSshFactory {
    type Transport = OpenSshTransport;

    async fn connect(
        &self,
        host: &str,
        config: &TransportConfig,
    ) -> Result<Self::Transport, TransportError> {
        debug!(host, "opening ssh transport");
        Ok(OpenSshTransport::new(host.to_string(), config.clone()))
    }
}
