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

use std::fmt::Write as _;
use std::str::FromStr;

use msgtrawl::cfb::{Container, Folder};
use msgtrawl::die;
use msgtrawl::msg::{FieldsData, FileData, MsgReader, ObjectKind};
use msgtrawl::records::{
    parse_verb_stream, AppointmentRecurrence, RecurrencePattern,
    TimeZoneDefinition, TimeZoneRule,
};
use msgtrawl::support::config::Config;
use msgtrawl::support::error::Error;
use msgtrawl::support::sysexits::*;

use super::main::{read_input, InputOptions, RecordSubcommand};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum RecordKind {
    Recurrence,
    Appointment,
    TimeZone,
    TimeZoneRule,
    Verbs,
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "recurrence" => Ok(RecordKind::Recurrence),
            "appointment" => Ok(RecordKind::Appointment),
            "timezone" => Ok(RecordKind::TimeZone),
            "tzrule" => Ok(RecordKind::TimeZoneRule),
            "verbs" => Ok(RecordKind::Verbs),
            _ => Err(format!("Unknown record kind '{}'", s)),
        }
    }
}

fn open<'a>(config: &Config, data: &'a [u8]) -> MsgReader<'a> {
    match MsgReader::new(data, &config.decode) {
        Ok(reader) => reader,
        Err(e) => die!(Sysexit::from(&e), "Failed to read message: {}", e),
    }
}

fn decoded(reader: &MsgReader<'_>) -> FieldsData {
    match reader.file_data() {
        Ok(FileData::Message(message)) => message,
        Ok(FileData::Unsupported { error }) => {
            die!(EX_DATAERR, "Unsupported input: {}", error)
        }
        Err(e) => die!(Sysexit::from(&e), "Failed to decode message: {}", e),
    }
}

pub(super) fn show(config: &Config, cmd: &InputOptions) {
    let data = read_input(cmd);
    let reader = open(config, &data);
    let message = decoded(&reader);
    let mut out = String::new();
    format_fields(&mut out, &message, 0);
    print!("{}", out);
}

/// Render `object` and everything below it as an indented outline.
pub(super) fn format_fields(
    out: &mut String,
    object: &FieldsData,
    depth: usize,
) {
    let indent = "  ".repeat(depth);
    let _ = writeln!(out, "{}{}", indent, object.kind);
    for (field, value) in &object.fields {
        let _ = writeln!(out, "{}  {}: {}", indent, field, value);
    }
    if let Some(len) = object.content_length {
        let _ = writeln!(out, "{}  content: {} bytes", indent, len);
    }
    for recipient in &object.recipients {
        format_fields(out, recipient, depth + 1);
    }
    for attachment in &object.attachments {
        format_fields(out, attachment, depth + 1);
        if let Some(ref inner) = attachment.inner_message {
            format_fields(out, inner, depth + 2);
        }
    }
}

pub(super) fn list(cmd: &InputOptions) {
    let data = read_input(cmd);
    let container = match Container::parse(&data) {
        Ok(container) => container,
        Err(e) => die!(Sysexit::from(&e), "Failed to read container: {}", e),
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "sector size {}, {} directory entries",
        container.sector_size(),
        container.entries().len()
    );
    format_tree(&mut out, container.root_folder(), 0);
    print!("{}", out);
}

pub(super) fn format_tree(
    out: &mut String,
    folder: Folder<'_, '_>,
    depth: usize,
) {
    let indent = "  ".repeat(depth);
    let _ = writeln!(out, "{}{}/", indent, folder.name());
    for file in folder.file_name_and_length_pairs() {
        let _ = writeln!(
            out,
            "{}  {} ({} bytes)",
            indent,
            file.name(),
            file.len()
        );
    }
    for sub in folder.sub_folders() {
        format_tree(out, sub, depth + 1);
    }
}

pub(super) fn dump(config: &Config, cmd: &InputOptions) {
    let data = read_input(cmd);
    let reader = open(config, &data);
    let mut out = String::new();
    let mut observer = |kind: ObjectKind, tag: u32, raw: &[u8]| {
        let _ = writeln!(
            out,
            "{} {:08X} {} {}",
            kind,
            tag,
            raw.len(),
            base64::encode(raw)
        );
    };
    if let Err(e) = reader.file_data_with_observer(&mut observer) {
        die!(Sysexit::from(&e), "Failed to decode message: {}", e);
    }
    print!("{}", out);
}

pub(super) fn record(cmd: &RecordSubcommand) {
    let data = read_input(&cmd.input);
    let container = match Container::parse(&data) {
        Ok(container) => container,
        Err(e) => die!(Sysexit::from(&e), "Failed to read container: {}", e),
    };

    let bytes = match find_stream(container.root_folder(), &cmd.stream) {
        Some(bytes) => bytes,
        None => die!(EX_USAGE, "No stream named '{}'", cmd.stream),
    };

    match decode_record(cmd.kind, &bytes) {
        Ok(text) => println!("{}", text),
        Err(e) => die!(Sysexit::from(&e), "{}: {}", cmd.stream, e),
    }
}

/// Look up a stream by a `/`-separated path from `root`.
pub(super) fn find_stream(
    root: Folder<'_, '_>,
    path: &str,
) -> Option<Vec<u8>> {
    let mut folder = root;
    let mut parts = path.split('/').filter(|p| !p.is_empty()).peekable();
    while let Some(part) = parts.next() {
        if parts.peek().is_none() {
            return folder.read_file(part);
        }
        folder = folder.sub_folder(part)?;
    }
    None
}

pub(super) fn decode_record(
    kind: RecordKind,
    bytes: &[u8],
) -> Result<String, Error> {
    Ok(match kind {
        RecordKind::Recurrence => {
            format!("{:#?}", RecurrencePattern::parse(bytes)?)
        }
        RecordKind::Appointment => {
            format!("{:#?}", AppointmentRecurrence::parse(bytes)?)
        }
        RecordKind::TimeZone => {
            format!("{:#?}", TimeZoneDefinition::parse(bytes)?)
        }
        RecordKind::TimeZoneRule => {
            format!("{:#?}", TimeZoneRule::parse(bytes)?)
        }
        RecordKind::Verbs => parse_verb_stream(bytes)?,
    })
}

#[cfg(test)]
mod test {
    use msgtrawl::cfb::{Burner, Node};

    use super::*;

    fn verb_stream() -> Vec<u8> {
        let mut data = vec![0x02, 0x01, 1, 0, 0, 0];
        data.extend_from_slice(&[4, 0, 0, 0]);
        data.push(3);
        data.extend_from_slice(b"Yes");
        data.extend_from_slice(&[0, 0, 3]);
        data.extend_from_slice(b"Yes");
        data.extend_from_slice(&[0; 29]);
        data
    }

    fn sample() -> Vec<u8> {
        Burner::new()
            .burn(&[
                Node::bytes("__substg1.0_0037001F", b"H\0i\0".to_vec()),
                Node::storage(
                    "__attach_version1.0_#00000000",
                    vec![Node::bytes("__substg1.0_80010102", verb_stream())],
                ),
            ])
            .unwrap()
    }

    #[test]
    fn record_kinds_parse() {
        assert_eq!(Ok(RecordKind::TimeZoneRule), "tzrule".parse());
        assert_eq!(Ok(RecordKind::Verbs), "verbs".parse());
        assert!("sundial".parse::<RecordKind>().is_err());
    }

    #[test]
    fn find_and_decode_stream() {
        let image = sample();
        let container = Container::parse(&image).unwrap();
        let root = container.root_folder();

        assert_eq!(
            Some(b"H\0i\0".to_vec()),
            find_stream(root, "__substg1.0_0037001F")
        );
        assert_eq!(None, find_stream(root, "__attach_version1.0_#00000000"));
        assert_eq!(None, find_stream(root, ""));

        let verbs = find_stream(
            root,
            "__attach_version1.0_#00000000/__substg1.0_80010102",
        )
        .unwrap();
        assert_eq!("Yes", decode_record(RecordKind::Verbs, &verbs).unwrap());
        assert!(decode_record(RecordKind::TimeZone, &verbs).is_err());
    }

    #[test]
    fn outlines() {
        let image = sample();
        let container = Container::parse(&image).unwrap();
        let mut tree = String::new();
        format_tree(&mut tree, container.root_folder(), 0);
        assert!(tree.contains("  __substg1.0_0037001F (4 bytes)\n"));
        assert!(tree.contains("  __attach_version1.0_#00000000/\n"));

        let reader =
            MsgReader::new(&image, &Config::default().decode).unwrap();
        let message = decoded(&reader);
        let mut fields = String::new();
        format_fields(&mut fields, &message, 0);
        assert!(fields.starts_with("message\n  subject: \"Hi\"\n"));
        assert!(fields.contains("  attachment\n"));
    }
}
