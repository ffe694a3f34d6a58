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

//! Walking a message's storage tree into `FieldsData`.

use encoding_rs::Encoding;
use log::debug;

use super::model::{FieldsData, ObjectKind, Value};
use super::props::{parse_property_stream, StreamHeader};
use super::tags::{self, ChildName, Field, PropType};
use crate::cfb::Folder;
use crate::support::codepage::{self, decode_ansi};
use crate::support::cursor::decode_utf16le;
use crate::support::error::Error;

/// Receives every property encountered while decoding, whether or not it is
/// decoded into a field.
///
/// `raw` is the content of a `__substg1.0_*` stream, or the 8-byte inline
/// value of a property stream record.
pub trait PropertyObserver {
    fn observe(&mut self, kind: ObjectKind, tag: u32, raw: &[u8]);
}

impl<F: FnMut(ObjectKind, u32, &[u8])> PropertyObserver for F {
    fn observe(&mut self, kind: ObjectKind, tag: u32, raw: &[u8]) {
        self(kind, tag, raw)
    }
}

pub(super) struct Decoder<'o> {
    /// Overrides all code page information in the file.
    pub forced_encoding: Option<&'static Encoding>,
    pub observer: Option<&'o mut dyn PropertyObserver>,
}

impl Decoder<'_> {
    pub fn decode_message(
        &mut self,
        folder: Folder<'_, '_>,
        header: StreamHeader,
    ) -> Result<FieldsData, Error> {
        self.decode_object(folder, ObjectKind::Message, header, None)
    }

    fn observe(&mut self, kind: ObjectKind, tag: u32, raw: &[u8]) {
        if let Some(ref mut observer) = self.observer {
            observer.observe(kind, tag, raw);
        }
    }

    fn decode_object(
        &mut self,
        folder: Folder<'_, '_>,
        kind: ObjectKind,
        header: StreamHeader,
        inherited_encoding: Option<&'static Encoding>,
    ) -> Result<FieldsData, Error> {
        let mut data = FieldsData::new(kind);

        // The property stream goes first since it tells us the code page
        if let Some(raw) = folder.read_file(tags::PROPERTIES_STREAM) {
            for record in parse_property_stream(&raw, header)? {
                self.observe(kind, record.tag, &record.value);
                if let (Some(field), Some(value)) =
                    (Field::from_id(record.id()), record.decode(kind))
                {
                    data.fields.insert(field, value);
                }
            }
        }

        let own_encoding = [Field::MessageCodepage, Field::InternetCodepage]
            .iter()
            .filter_map(|&f| data.integer(f))
            .find_map(|cp| codepage::for_codepage(cp as u32));
        let encoding = self.forced_encoding.or(own_encoding).or(inherited_encoding);

        let mut streams = folder.file_name_and_length_pairs();
        streams.sort_by_key(|s| s.name());
        for stream in streams {
            let (id, prop_type) = match tags::classify(stream.name()) {
                ChildName::Property { id, prop_type } => (id, prop_type),
                _ => continue,
            };
            let tag = tags::tag(id, prop_type);

            if ObjectKind::Attachment == kind
                && tags::ATTACH_DATA_ID == id
                && PropType::Binary == prop_type
            {
                // Content is only read when asked for
                data.data_id = Some(stream.index());
                data.content_length = Some(stream.len());
                if self.observer.is_some() {
                    self.observe(kind, tag, &stream.read());
                }
                continue;
            }

            let field = Field::from_id(id);
            if field.is_none() && self.observer.is_none() {
                continue;
            }

            let raw = stream.read();
            self.observe(kind, tag, &raw);
            let field = match field {
                Some(field) => field,
                None => continue,
            };

            let value = match prop_type {
                PropType::Ansi => Value::Text(decode_ansi(
                    &raw,
                    encoding.unwrap_or(codepage::DEFAULT_ANSI),
                )),
                PropType::Unicode => Value::Text(decode_utf16le(&raw)),
                PropType::Binary => Value::Binary(raw),
                _ => continue,
            };
            data.fields.insert(field, value);
        }

        let mut storages = folder.sub_folders();
        storages.sort_by_key(|s| s.name());
        for storage in storages {
            match (kind, tags::classify(storage.name())) {
                (ObjectKind::Message, ChildName::Attachment) => {
                    let attachment = self.decode_object(
                        storage,
                        ObjectKind::Attachment,
                        StreamHeader::Child,
                        encoding,
                    )?;
                    data.attachments.push(attachment);
                }

                (ObjectKind::Message, ChildName::Recipient) => {
                    let recipient = self.decode_object(
                        storage,
                        ObjectKind::Recipient,
                        StreamHeader::Child,
                        encoding,
                    )?;
                    data.recipients.push(recipient);
                }

                (
                    ObjectKind::Attachment,
                    ChildName::Property {
                        prop_type: PropType::Object,
                        ..
                    },
                ) => {
                    debug!("Decoding embedded message in {}", storage.name());
                    let inner = self.decode_object(
                        storage,
                        ObjectKind::Message,
                        StreamHeader::Embedded,
                        encoding,
                    )?;
                    data.inner_message = Some(Box::new(inner));
                    data.has_inner_message = true;
                    data.data_id = Some(storage.index());
                }

                // Named property mappings and anything unrecognised
                _ => (),
            }
        }

        Ok(data)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cfb::writer::{Burner, Node};
    use crate::cfb::Container;
    use crate::test_data::*;

    fn decode(image: &[u8]) -> FieldsData {
        let container = Container::parse(image).unwrap();
        Decoder {
            forced_encoding: None,
            observer: None,
        }
        .decode_message(container.root_folder(), StreamHeader::TopLevel)
        .unwrap()
    }

    #[test]
    fn ansi_strings_follow_code_page() {
        let image = Burner::new()
            .burn(&[
                Node::bytes(
                    tags::PROPERTIES_STREAM,
                    property_stream(
                        StreamHeader::TopLevel,
                        &[long_record(Field::MessageCodepage, 1251)],
                    ),
                ),
                Node::bytes(
                    tags::substg_name(0x0037, PropType::Ansi),
                    b"\xcf\xf0\xe8\xe2\xe5\xf2".to_vec(),
                ),
                attachment_node(
                    0,
                    vec![Node::bytes(
                        tags::substg_name(0x3707, PropType::Ansi),
                        b"\xf4.txt".to_vec(),
                    )],
                ),
            ])
            .unwrap();

        let message = decode(&image);
        assert_eq!(Some("Привет"), message.subject());
        assert_eq!(Some("ф.txt"), message.attachments[0].file_name());

        let container = Container::parse(&image).unwrap();
        let forced = Decoder {
            forced_encoding: Some(encoding_rs::WINDOWS_1252),
            observer: None,
        }
        .decode_message(container.root_folder(), StreamHeader::TopLevel)
        .unwrap();
        assert_eq!(Some("Ïðèâåò"), forced.subject());
    }

    #[test]
    fn unknown_and_unsupported_properties_are_omitted() {
        let image = Burner::new()
            .burn(&[
                Node::bytes(
                    tags::substg_name(0x6789, PropType::Unicode),
                    utf16("mystery"),
                ),
                Node::bytes(
                    tags::substg_name(0x0037, PropType::Other(0x1102)),
                    vec![1, 2, 3],
                ),
                Node::bytes("__substg1.0_0037001F-00000000", utf16("nope")),
                Node::storage(tags::NAMEID_STORAGE, vec![]),
            ])
            .unwrap();

        let message = decode(&image);
        assert!(message.fields.is_empty());
        assert!(message.attachments.is_empty());
    }

    #[test]
    fn observer_sees_everything() {
        let image = sample_message();
        let container = Container::parse(&image).unwrap();

        let mut seen = Vec::new();
        let mut observer = |kind: ObjectKind, tag: u32, raw: &[u8]| {
            seen.push((kind, tag, raw.len()))
        };
        let observed = Decoder {
            forced_encoding: None,
            observer: Some(&mut observer),
        }
        .decode_message(container.root_folder(), StreamHeader::TopLevel)
        .unwrap();

        assert_eq!(decode(&image), observed);
        assert!(seen.contains(&(ObjectKind::Message, 0x0037_001F, 10)));
        assert!(seen.contains(&(ObjectKind::Message, 0x6789_001F, 4)));
        assert!(seen.contains(&(ObjectKind::Recipient, 0x0C15_0003, 8)));
        assert!(seen.contains(&(
            ObjectKind::Attachment,
            0x3701_0102,
            ATTACHMENT_CONTENT.len()
        )));
    }
}
