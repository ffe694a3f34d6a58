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

//! Mapping of Windows code page numbers to `encoding_rs` encodings.

use encoding_rs::*;

use super::error::Error;

/// Encoding used for 8-bit strings when nothing better is known.
pub const DEFAULT_ANSI: &Encoding = WINDOWS_1252;

/// Look up the encoding for a Windows code page identifier, as found in
/// `PidTagMessageCodepage` and `PidTagInternetCodepage`.
///
/// Returns `None` for code pages `encoding_rs` has no equivalent for.
pub fn for_codepage(codepage: u32) -> Option<&'static Encoding> {
    Some(match codepage {
        // US-ASCII is a subset; Outlook writes 20127 for plain text mail
        1252 | 20127 | 28591 => WINDOWS_1252,
        65001 => UTF_8,
        1200 => UTF_16LE,
        1201 => UTF_16BE,
        874 => WINDOWS_874,
        932 => SHIFT_JIS,
        936 => GBK,
        949 => EUC_KR,
        950 => BIG5,
        1250 => WINDOWS_1250,
        1251 => WINDOWS_1251,
        1253 => WINDOWS_1253,
        1254 => WINDOWS_1254,
        1255 => WINDOWS_1255,
        1256 => WINDOWS_1256,
        1257 => WINDOWS_1257,
        1258 => WINDOWS_1258,
        20866 => KOI8_R,
        21866 => KOI8_U,
        28592 => ISO_8859_2,
        28593 => ISO_8859_3,
        28594 => ISO_8859_4,
        28595 => ISO_8859_5,
        28596 => ISO_8859_6,
        28597 => ISO_8859_7,
        28598 => ISO_8859_8,
        28603 => ISO_8859_13,
        28605 => ISO_8859_15,
        50220 | 50221 | 50222 => ISO_2022_JP,
        51932 => EUC_JP,
        51949 => EUC_KR,
        54936 => GB18030,
        _ => return None,
    })
}

/// Resolve an encoding label such as "windows-1252" or "shift_jis".
pub fn for_label(label: &str) -> Result<&'static Encoding, Error> {
    Encoding::for_label_no_replacement(label.trim().as_bytes())
        .ok_or_else(|| Error::UnknownEncoding(label.to_owned()))
}

/// Decode 8-bit text, dropping trailing NULs.
pub fn decode_ansi(bytes: &[u8], encoding: &'static Encoding) -> String {
    let end = bytes.iter().rposition(|&b| 0 != b).map_or(0, |p| p + 1);
    encoding
        .decode_without_bom_handling(&bytes[..end])
        .0
        .into_owned()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn codepages() {
        assert_eq!(Some(WINDOWS_1252), for_codepage(1252));
        assert_eq!(Some(SHIFT_JIS), for_codepage(932));
        assert_eq!(None, for_codepage(37));
    }

    #[test]
    fn labels() {
        assert_eq!(WINDOWS_1251, for_label("windows-1251").unwrap());
        assert_eq!(WINDOWS_1252, for_label(" latin1 ").unwrap());
        assert_matches!(Err(Error::UnknownEncoding(_)), for_label("klingon"));
    }

    #[test]
    fn ansi_text() {
        assert_eq!("Grüße", decode_ansi(b"Gr\xfc\xdfe\0", WINDOWS_1252));
        assert_eq!("Привет", decode_ansi(b"\xcf\xf0\xe8\xe2\xe5\xf2", WINDOWS_1251));
        assert_eq!("", decode_ansi(b"\0\0", WINDOWS_1252));
    }
}
