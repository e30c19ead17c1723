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

//! Resolution of `jail@host` target identifiers.
//!
//! The orchestrator does not hand over the final target in one piece: the
//! constructor may see a placeholder like `127.0.0.1`, and the real
//! `jail@host` form (or a delegated outer host) arrives later through
//! override callbacks, possibly more than once and in any order. This module
//! owns the rules for folding that stream of candidates into one stable
//! identity.

use std::fmt;
use tracing::debug;

/// Separator between the jail name and the outer host.
pub const JAIL_SEPARATOR: char = '@';

/// Where a candidate host string came from.
///
/// The distinction matters for bare (non-`jail@host`) candidates: an early
/// inventory value is only a placeholder, while a delegation target reflects
/// the orchestrator's actual topology knowledge and must win over whatever
/// the compound form names as its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Construction-time inventory value; may be superseded
    Provisional,
    /// Delegation or override value; pins the outer host
    Authoritative,
}

/// A jail target identity, folded together from candidate host strings.
///
/// The first well-formed `jail@host` candidate locks the identity; every
/// later candidate is ignored. Bare candidates only ever contribute the
/// outer host.
#[derive(Debug, Clone, Default)]
pub struct JailAddress {
    raw: Option<String>,
    jail: Option<String>,
    host: Option<String>,
    host_pinned: bool,
    last_candidate: Option<String>,
}

impl JailAddress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one candidate host string into the resolution state.
    ///
    /// Empty candidates are ignored. Once the compound form is locked the
    /// call is a no-op, so duplicate or conflicting late candidates never
    /// reverse a resolved identity.
    pub fn resolve(&mut self, candidate: &str, provenance: Provenance) {
        if candidate.is_empty() {
            return;
        }
        self.last_candidate = Some(candidate.to_string());

        if self.raw.is_some() {
            debug!(candidate, "target already resolved, ignoring candidate");
            return;
        }

        match candidate.split_once(JAIL_SEPARATOR) {
            Some((jail, host)) => {
                if jail.is_empty() || host.is_empty() {
                    // Malformed notation is not repaired; the lifecycle
                    // gates report it when execution is attempted.
                    debug!(candidate, "malformed jail notation, ignoring candidate");
                    return;
                }
                if !self.host_pinned {
                    self.host = Some(host.to_string());
                }
                self.jail = Some(jail.to_string());
                self.raw = Some(candidate.to_string());
                debug!(
                    jail,
                    host = self.host.as_deref(),
                    "jail target resolved"
                );
            }
            None => match provenance {
                Provenance::Provisional => {
                    if self.host.is_none() {
                        self.host = Some(candidate.to_string());
                        debug!(host = candidate, "provisional outer host recorded");
                    }
                }
                Provenance::Authoritative => {
                    if !self.host_pinned {
                        self.host = Some(candidate.to_string());
                        self.host_pinned = true;
                        debug!(host = candidate, "outer host pinned by delegation");
                    }
                }
            },
        }
    }

    /// Whether the compound `jail@host` form has been locked in.
    pub fn is_resolved(&self) -> bool {
        self.raw.is_some()
    }

    /// The compound string that locked the identity.
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// The inner sub-environment name; unset means direct transport only.
    pub fn jail_name(&self) -> Option<&str> {
        self.jail.as_deref()
    }

    /// The address the outer transport connects to.
    pub fn outer_host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// The most recent candidate seen, for error reporting.
    pub fn last_candidate(&self) -> Option<&str> {
        self.last_candidate.as_deref()
    }
}

impl fmt::Display for JailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.jail, &self.host) {
            (Some(jail), Some(host)) => write!(f, "{jail}{JAIL_SEPARATOR}{host}"),
            (None, Some(host)) => write!(f, "{host}"),
            _ => write!(f, "(unresolved)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_compound() {
        let mut addr = JailAddress::new();
        addr.resolve("web1@server.example", Provenance::Provisional);
        assert!(addr.is_resolved());
        assert_eq!(addr.jail_name(), Some("web1"));
        assert_eq!(addr.outer_host(), Some("server.example"));
        assert_eq!(addr.raw(), Some("web1@server.example"));
    }

    #[test]
    fn test_resolve_bare_host() {
        let mut addr = JailAddress::new();
        addr.resolve("server.example", Provenance::Provisional);
        assert!(!addr.is_resolved());
        assert_eq!(addr.jail_name(), None);
        assert_eq!(addr.outer_host(), Some("server.example"));
    }

    #[test]
    fn test_split_on_first_separator_only() {
        let mut addr = JailAddress::new();
        addr.resolve("web1@user@server.example", Provenance::Provisional);
        assert_eq!(addr.jail_name(), Some("web1"));
        assert_eq!(addr.outer_host(), Some("user@server.example"));
    }

    #[test]
    fn test_first_resolution_wins() {
        let mut addr = JailAddress::new();
        addr.resolve("web1@server.example", Provenance::Provisional);
        addr.resolve("web2@other.example", Provenance::Authoritative);
        addr.resolve("other.example", Provenance::Authoritative);
        assert_eq!(addr.jail_name(), Some("web1"));
        assert_eq!(addr.outer_host(), Some("server.example"));
    }

    #[test]
    fn test_provisional_host_replaced_by_compound() {
        let mut addr = JailAddress::new();
        addr.resolve("127.0.0.1", Provenance::Provisional);
        addr.resolve("web1@server.example", Provenance::Authoritative);
        assert_eq!(addr.jail_name(), Some("web1"));
        assert_eq!(addr.outer_host(), Some("server.example"));
    }

    #[test]
    fn test_pinned_host_survives_compound_split() {
        let mut addr = JailAddress::new();
        addr.resolve("delegate.example", Provenance::Authoritative);
        addr.resolve("web1@alias.example", Provenance::Authoritative);
        assert_eq!(addr.jail_name(), Some("web1"));
        assert_eq!(addr.outer_host(), Some("delegate.example"));
    }

    #[test]
    fn test_provisional_does_not_pin() {
        let mut addr = JailAddress::new();
        addr.resolve("127.0.0.1", Provenance::Provisional);
        addr.resolve("192.168.0.10", Provenance::Provisional);
        // first provisional value holds until a compound form arrives
        assert_eq!(addr.outer_host(), Some("127.0.0.1"));
        assert!(!addr.is_resolved());
    }

    #[test]
    fn test_malformed_notation_ignored() {
        let mut addr = JailAddress::new();
        addr.resolve("@server.example", Provenance::Provisional);
        assert!(!addr.is_resolved());
        assert_eq!(addr.outer_host(), None);

        addr.resolve("web1@", Provenance::Provisional);
        assert!(!addr.is_resolved());
        assert_eq!(addr.last_candidate(), Some("web1@"));
    }

    #[test]
    fn test_empty_candidate_ignored() {
        let mut addr = JailAddress::new();
        addr.resolve("", Provenance::Provisional);
        assert_eq!(addr.last_candidate(), None);
        assert_eq!(addr.outer_host(), None);
    }

    #[test]
    fn test_display() {
        let mut addr = JailAddress::new();
        assert_eq!(addr.to_string(), "(unresolved)");
        addr.resolve("web1@server.example", Provenance::Provisional);
        assert_eq!(addr.to_string(), "web1@server.example");

        let mut bare = JailAddress::new();
        bare.resolve("server.example", Provenance::Provisional);
        assert_eq!(bare.to_string(), "server.example");
    }
}
