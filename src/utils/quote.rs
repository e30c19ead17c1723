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

//! POSIX shell quoting for values embedded in remote commands

/// Quote a value so a POSIX shell treats it as a single literal word.
///
/// Remote paths end up inside commands like `cat - > <path>`, so they must
/// survive whitespace, globs, and redirection characters. Single quotes
/// protect everything except the single quote itself, which is closed,
/// escaped, and reopened (`'` becomes `'\''`).
pub fn quote(value: &str) -> String {
    if value.is_empty() {
        return "''".to_string();
    }

    // Fast path: nothing a shell would interpret.
    if value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '@' | '%' | '+' | '='))
    {
        return value.to_string();
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}
