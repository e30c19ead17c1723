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

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Connection settings handed to the transport factory.
///
/// The jail connection stores this at construction and treats it as opaque;
/// only the transport implementation interprets it. All fields are optional
/// so the orchestrator's inventory defaults apply when unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransportConfig {
    /// SSH port on the outer host (transport default when unset)
    #[serde(default)]
    pub port: Option<u16>,

    /// Login user on the outer host
    #[serde(default)]
    pub user: Option<String>,

    /// Private key file for authentication
    #[serde(default)]
    pub identity_file: Option<PathBuf>,

    /// Connection establishment timeout
    #[serde(default)]
    pub connect_timeout: Option<Duration>,

    /// Extra options passed through to the transport verbatim
    /// (for the OpenSSH transport, each entry becomes an `-o` argument)
    #[serde(default)]
    pub extra_options: Vec<String>,
}

impl TransportConfig {
    pub fn new() -> Self {
        Self::default()
    }
}
