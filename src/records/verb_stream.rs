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

//! Voting options (`PidLidVerbStream`).

use byteorder::LittleEndian;

use crate::support::codepage::DEFAULT_ANSI;
use crate::support::cursor::ByteCursor;
use crate::support::error::Error;

const VERSION: u16 = 0x0102;
const EXTRAS_VERSION: u16 = 0x0104;
/// Verb type of a voting button, as opposed to reply/forward actions.
const VERB_TYPE_VOTE: u32 = 4;

struct VoteOption {
    verb_type: u32,
    display_name: String,
}

/// Read an ANSI string prefixed by a one-byte length.
fn read_short_string(c: &mut ByteCursor<'_>) -> Result<String, Error> {
    let len = c.read_u8()?;
    c.read_fixed_string(usize::from(len), DEFAULT_ANSI)
}

fn read_short_wide_string(c: &mut ByteCursor<'_>) -> Result<String, Error> {
    let len = c.read_u8()?;
    c.read_utf16_string(usize::from(len))
}

fn read_option(c: &mut ByteCursor<'_>) -> Result<VoteOption, Error> {
    let verb_type = c.read_u32::<LittleEndian>()?;
    let display_name = read_short_string(c)?;
    // Message class, an internal string, then the display name again
    for _ in 0..3 {
        read_short_string(c)?;
    }
    // Seven 32-bit fields (use US headers, send behaviour, id, and several
    // internal values) and one internal byte
    c.skip(4 + 1 + 4 * 6)?;

    Ok(VoteOption {
        verb_type,
        display_name,
    })
}

/// Decode a verb stream, returning the names of its voting buttons joined
/// with `;`.
///
/// If the stream carries the optional second section, its UTF-16 display
/// names replace the 8-bit ones.
pub fn parse_verb_stream(data: &[u8]) -> Result<String, Error> {
    let mut c = ByteCursor::new(data);
    let version = c.read_u16::<LittleEndian>()?;
    if VERSION != version {
        return Err(Error::UnsupportedVersion {
            what: "verb stream",
            version: u32::from(version),
        });
    }

    let count = c.read_u32::<LittleEndian>()?;
    let mut options = Vec::new();
    for _ in 0..count {
        options.push(read_option(&mut c)?);
    }

    if c.remaining() >= 2 && EXTRAS_VERSION == c.read_u16::<LittleEndian>()? {
        for option in &mut options {
            option.display_name = read_short_wide_string(&mut c)?;
            // Repeated display name
            read_short_wide_string(&mut c)?;
        }
    }

    Ok(options
        .into_iter()
        .filter(|o| VERB_TYPE_VOTE == o.verb_type)
        .map(|o| o.display_name)
        .collect::<Vec<_>>()
        .join(";"))
}
