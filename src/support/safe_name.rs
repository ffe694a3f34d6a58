//-
// Copyright (c) 2026, the Msgtrawl authors
//
// This file is part of Msgtrawl.
//
// Msgtrawl is free software: you can  redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Msgtrawl is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or FITNESS
// FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License for  more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Msgtrawl. If not, see <http://www.gnu.org/licenses/>.

/// Returns whether `name` can be used as-is as the name of a file created
/// in an output directory.
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty() &&
        // Block directory traversal through .. and creation of hidden files on
        // UNIX
        !name.starts_with('.') &&
        name.find('/').is_none() &&
        // Only a path separator on Windows, but always block since it has high
        // potential of causing problems
        name.find('\\').is_none() &&
        // Don't allow any ASCII control characters
        name.find(|c| c < ' ' || c == '\x7F').is_none() &&
        // Reserved on Windows, which is where most .msg files come from
        name.find(|c| matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|'))
            .is_none()
}

/// Turn an attachment name taken from a message into something that
/// satisfies `is_safe_name`.
///
/// Offending characters are replaced with `_` and leading dots are dropped.
/// `fallback` is used if nothing usable remains.
pub fn sanitise_name(name: &str, fallback: &str) -> String {
    let cleaned: String = name
        .trim_start_matches('.')
        .chars()
        .map(|c| {
            if c < ' '
                || matches!(
                    c,
                    '\x7F'
                        | '/'
                        | '\\'
                        | ':'
                        | '*'
                        | '?'
                        | '"'
                        | '<'
                        | '>'
                        | '|'
                )
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    let cleaned = cleaned.trim();
    if is_safe_name(cleaned) {
        cleaned.to_owned()
    } else {
        fallback.to_owned()
    }
}
