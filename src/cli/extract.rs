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

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};

use msgtrawl::die;
use msgtrawl::msg::{FieldsData, FileData, MsgReader};
use msgtrawl::support::config::Config;
use msgtrawl::support::error::Error;
use msgtrawl::support::safe_name::sanitise_name;
use msgtrawl::support::sysexits::*;

use super::main::{read_input, ExtractSubcommand};

const FALLBACK_NAME: &str = "Untitled";

pub(super) fn main(config: &Config, cmd: &ExtractSubcommand) {
    let data = read_input(&cmd.input);
    let reader = match MsgReader::new(&data, &config.decode) {
        Ok(reader) => reader,
        Err(e) => die!(Sysexit::from(&e), "Failed to read message: {}", e),
    };
    let message = match reader.file_data() {
        Ok(FileData::Message(message)) => message,
        Ok(FileData::Unsupported { error }) => {
            die!(EX_DATAERR, "Unsupported input: {}", error)
        }
        Err(e) => die!(Sysexit::from(&e), "Failed to decode message: {}", e),
    };

    if let Err(e) = fs::create_dir_all(&cmd.output) {
        die!(EX_CANTCREAT, "{}: {}", cmd.output.display(), e);
    }

    match extract_all(&reader, &message, &cmd.output) {
        Ok(paths) => {
            for path in paths {
                println!("{}", path.display());
            }
        }
        Err(e) => die!(Sysexit::from(&e), "Extraction failed: {}", e),
    }
}

/// Write every attachment of `message` that has content into `dir`,
/// returning the paths written.
pub(super) fn extract_all(
    reader: &MsgReader<'_>,
    message: &FieldsData,
    dir: &Path,
) -> Result<Vec<PathBuf>, Error> {
    let mut written = Vec::new();
    for (ix, attachment) in message.attachments.iter().enumerate() {
        let content = match reader.attachment(attachment) {
            Ok(content) => content,
            Err(Error::NoSuchAttachment) => {
                warn!("Attachment {} has no content; skipping", ix);
                continue;
            }
            Err(e) => return Err(e),
        };

        let name = sanitise_name(&content.file_name, FALLBACK_NAME);
        let (path, mut file) = create_unique(dir, &name)?;
        file.write_all(&content.content)?;
        info!(
            "Wrote attachment {} ({} bytes) to {}",
            ix,
            content.content.len(),
            path.display()
        );
        written.push(path);
    }

    Ok(written)
}

/// Create a new file in `dir` named `name`, or `name (2)`, `name (3)`, etc
/// if that already exists. The number goes before the extension.
fn create_unique(dir: &Path, name: &str) -> io::Result<(PathBuf, fs::File)> {
    let (stem, extension) = match name.rfind('.') {
        Some(dot) if dot > 0 => name.split_at(dot),
        _ => (name, ""),
    };

    let mut n = 1;
    loop {
        let candidate = if 1 == n {
            dir.join(name)
        } else {
            dir.join(format!("{} ({}){}", stem, n, extension))
        };

        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(file) => return Ok((candidate, file)),
            Err(e) if io::ErrorKind::AlreadyExists == e.kind() => n += 1,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod test {
    use msgtrawl::cfb::{Burner, Node};
    use msgtrawl::support::config::DecodeOptions;

    use super::*;

    fn utf16(s: &str) -> Vec<u8> {
        s.encode_utf16().flat_map(|u| u.to_le_bytes().to_vec()).collect()
    }

    fn attachment(
        index: u32,
        name: Option<&str>,
        data: &[u8],
    ) -> Node<'static> {
        let mut children =
            vec![Node::bytes("__substg1.0_37010102", data.to_vec())];
        if let Some(name) = name {
            children.push(Node::bytes("__substg1.0_3707001F", utf16(name)));
        }
        Node::storage(format!("__attach_version1.0_#{:08X}", index), children)
    }

    fn sample() -> Vec<u8> {
        Burner::new()
            .burn(&[
                Node::bytes("__substg1.0_0037001F", utf16("Files")),
                attachment(0, Some("a.txt"), b"first"),
                attachment(1, Some("a.txt"), b"second"),
                attachment(2, Some("../../etc/passwd"), b"sneaky"),
                attachment(3, None, b"anonymous"),
                // No data stream at all
                Node::storage(
                    "__attach_version1.0_#00000004",
                    vec![Node::bytes("__substg1.0_3707001F", utf16("x"))],
                ),
            ])
            .unwrap()
    }

    #[test]
    fn extract_sample() {
        let image = sample();
        let reader = MsgReader::new(&image, &DecodeOptions::default()).unwrap();
        let message = match reader.file_data().unwrap() {
            FileData::Message(m) => m,
            unexpected => panic!("Unexpected result: {:?}", unexpected),
        };

        let dir = tempfile::TempDir::new().unwrap();
        // Pre-existing files are never overwritten
        fs::write(dir.path().join("Untitled"), b"old").unwrap();

        let written = extract_all(&reader, &message, dir.path()).unwrap();
        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            vec!["a.txt", "a (2).txt", "_.._etc_passwd", "Untitled (2)"],
            names
        );

        assert_eq!(b"first", &fs::read(dir.path().join("a.txt")).unwrap()[..]);
        assert_eq!(
            b"second",
            &fs::read(dir.path().join("a (2).txt")).unwrap()[..]
        );
        assert_eq!(b"old", &fs::read(dir.path().join("Untitled")).unwrap()[..]);
        assert!(written.iter().all(|p| p.starts_with(dir.path())));
    }

    #[test]
    fn unique_names() {
        let dir = tempfile::TempDir::new().unwrap();
        for expected in &["x.tar.gz", "x.tar (2).gz", "x.tar (3).gz"] {
            let (path, _) = create_unique(dir.path(), "x.tar.gz").unwrap();
            assert_eq!(dir.path().join(expected), path);
        }
        let (path, _) = create_unique(dir.path(), ".rc").unwrap();
        assert_eq!(dir.path().join(".rc"), path);
    }
}
