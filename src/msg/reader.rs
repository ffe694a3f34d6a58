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

use std::fmt;

use encoding_rs::Encoding;
use log::{debug, info};

use super::decode::{Decoder, PropertyObserver};
use super::export::export_embedded;
use super::model::{FieldsData, FileData};
use super::props::StreamHeader;
use crate::cfb::Container;
use crate::support::config::DecodeOptions;
use crate::support::error::Error;

const UNTITLED: &str = "Untitled";

enum State<'a> {
    Parsed(Container<'a>),
    Unsupported(String),
}

/// Reads an Outlook `.msg` file held in memory.
///
/// Decoding the message structure and reading attachment content are
/// separate calls; attachment bodies are never read unless asked for.
pub struct MsgReader<'a> {
    state: State<'a>,
    forced_encoding: Option<&'static Encoding>,
}

impl fmt::Debug for MsgReader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.state {
            State::Parsed(ref container) => {
                f.debug_tuple("MsgReader").field(container).finish()
            }
            State::Unsupported(ref error) => f
                .debug_struct("MsgReader")
                .field("unsupported", error)
                .finish(),
        }
    }
}

/// The bytes of one attachment and the name it should be saved under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachmentContent {
    pub file_name: String,
    pub content: Vec<u8>,
}

impl<'a> MsgReader<'a> {
    /// Parse the container structure of `data`.
    ///
    /// Input that is not a compound file at all (or uses a sector size we
    /// don't know) is not an error here; the reader instead reports
    /// `FileData::Unsupported`. A compound file that is structurally broken
    /// is an error.
    pub fn new(data: &'a [u8], options: &DecodeOptions) -> Result<Self, Error> {
        let forced_encoding = options.ansi_encoding()?;
        let state = match Container::parse(data) {
            Ok(container) => State::Parsed(container),
            Err(e) if e.is_unsupported() => {
                info!("Input is not a supported compound file: {}", e);
                State::Unsupported(e.to_string())
            }
            Err(e) => return Err(e),
        };

        Ok(MsgReader {
            state,
            forced_encoding,
        })
    }

    pub fn is_supported(&self) -> bool {
        match self.state {
            State::Parsed(_) => true,
            State::Unsupported(_) => false,
        }
    }

    /// The underlying container, if the input could be parsed.
    pub fn container(&self) -> Option<&Container<'a>> {
        match self.state {
            State::Parsed(ref container) => Some(container),
            State::Unsupported(_) => None,
        }
    }

    pub fn file_data(&self) -> Result<FileData, Error> {
        self.decode(None)
    }

    /// Like `file_data()`, additionally passing every property seen to
    /// `observer`.
    pub fn file_data_with_observer(
        &self,
        observer: &mut dyn PropertyObserver,
    ) -> Result<FileData, Error> {
        self.decode(Some(observer))
    }

    fn decode(
        &self,
        observer: Option<&mut dyn PropertyObserver>,
    ) -> Result<FileData, Error> {
        let container = match self.state {
            State::Parsed(ref container) => container,
            State::Unsupported(ref error) => {
                return Ok(FileData::Unsupported {
                    error: error.clone(),
                })
            }
        };

        let message = Decoder {
            forced_encoding: self.forced_encoding,
            observer,
        }
        .decode_message(container.root_folder(), StreamHeader::TopLevel)?;
        debug!(
            "Decoded message: {} fields, {} recipients, {} attachments",
            message.fields.len(),
            message.recipients.len(),
            message.attachments.len()
        );
        Ok(FileData::Message(message))
    }

    /// Fetch the content of a previously decoded attachment.
    ///
    /// An embedded message is exported as a new `.msg` file named after its
    /// subject.
    pub fn attachment(
        &self,
        attachment: &FieldsData,
    ) -> Result<AttachmentContent, Error> {
        let data_id = attachment.data_id.ok_or(Error::NoSuchAttachment)?;

        match attachment.inner_message {
            Some(ref inner) if attachment.has_inner_message => {
                let container =
                    self.container().ok_or(Error::NoSuchAttachment)?;
                let subject =
                    inner.subject().filter(|s| !s.is_empty()).unwrap_or(UNTITLED);
                Ok(AttachmentContent {
                    file_name: format!("{}.msg", subject),
                    content: export_embedded(container, data_id)?,
                })
            }
            _ => Ok(AttachmentContent {
                file_name: attachment.file_name().unwrap_or(UNTITLED).to_owned(),
                content: self.attachment_by_id(data_id)?,
            }),
        }
    }

    /// Read the stream with the given directory entry index.
    pub fn attachment_by_id(&self, data_id: usize) -> Result<Vec<u8>, Error> {
        self.container()
            .ok_or(Error::NoSuchAttachment)?
            .read_stream(data_id)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::msg::model::{ObjectKind, RecipType};
    use crate::msg::tags::Field;
    use crate::test_data::*;

    fn message(reader: &MsgReader<'_>) -> FieldsData {
        match reader.file_data().unwrap() {
            FileData::Message(m) => m,
            unexpected => panic!("Unexpected result: {:?}", unexpected),
        }
    }

    #[test]
    fn decode_sample_message() {
        crate::init_test_log();

        let image = sample_message();
        let reader = MsgReader::new(&image, &DecodeOptions::default()).unwrap();
        assert!(reader.is_supported());
        let message = message(&reader);

        assert_eq!(ObjectKind::Message, message.kind);
        assert_eq!(Some("Hello"), message.subject());
        assert_eq!(Some(SAMPLE_BODY), message.body());
        assert_eq!(
            Some(sample_delivery_time()),
            message.time(Field::MessageDeliveryTime)
        );

        assert_eq!(1, message.recipients.len());
        let recipient = &message.recipients[0];
        assert_eq!(Some(RecipType::To), recipient.recip_type());
        assert_eq!(Some("Alice"), recipient.text(Field::DisplayName));

        assert_eq!(2, message.attachments.len());
        let file = &message.attachments[0];
        assert_eq!(Some("notes.txt"), file.file_name());
        assert_eq!(
            Some(ATTACHMENT_CONTENT.len() as u32),
            file.content_length
        );
        assert!(!file.has_inner_message);
        assert!(!file.fields.contains_key(&Field::Subject));

        let embedded = &message.attachments[1];
        assert!(embedded.has_inner_message);
        let inner = embedded.inner_message.as_ref().unwrap();
        assert_eq!(Some("Inner"), inner.subject());
        assert_eq!(1, inner.attachments.len());
    }

    #[test]
    fn decode_is_idempotent() {
        let image = sample_message();
        let reader = MsgReader::new(&image, &DecodeOptions::default()).unwrap();
        assert_eq!(reader.file_data().unwrap(), reader.file_data().unwrap());
    }

    #[test]
    fn attachment_content() {
        let image = sample_message();
        let reader = MsgReader::new(&image, &DecodeOptions::default()).unwrap();
        let message = message(&reader);

        let content = reader.attachment(&message.attachments[0]).unwrap();
        assert_eq!("notes.txt", content.file_name);
        assert_eq!(ATTACHMENT_CONTENT, &content.content[..]);
        assert_eq!(
            content.content,
            reader
                .attachment_by_id(message.attachments[0].data_id.unwrap())
                .unwrap()
        );

        let no_data = FieldsData::new(ObjectKind::Attachment);
        assert_matches!(
            Err(Error::NoSuchAttachment),
            reader.attachment(&no_data)
        );
    }

    #[test]
    fn embedded_message_round_trips() {
        let image = sample_message();
        let reader = MsgReader::new(&image, &DecodeOptions::default()).unwrap();
        let message = message(&reader);
        let embedded = &message.attachments[1];

        let exported = reader.attachment(embedded).unwrap();
        assert_eq!("Inner.msg", exported.file_name);

        let inner_reader =
            MsgReader::new(&exported.content, &DecodeOptions::default())
                .unwrap();
        let reparsed = self::message(&inner_reader);
        assert_eq!(
            embedded
                .inner_message
                .as_ref()
                .map(|m| (**m).clone().without_data_ids()),
            Some(reparsed.clone().without_data_ids())
        );

        // The nested attachment's content is still reachable
        let nested = inner_reader.attachment(&reparsed.attachments[0]).unwrap();
        assert_eq!(INNER_ATTACHMENT_CONTENT, &nested.content[..]);

        // And the named property mapping came along
        let container = inner_reader.container().unwrap();
        assert!(container
            .root_folder()
            .sub_folder(crate::msg::tags::NAMEID_STORAGE)
            .is_some());
    }

    #[test]
    fn unsupported_input() {
        let reader =
            MsgReader::new(b"PK\x03\x04 definitely a zip", &DecodeOptions::default())
                .unwrap();
        assert!(!reader.is_supported());
        assert!(reader.container().is_none());
        assert_matches!(
            Ok(FileData::Unsupported { .. }),
            reader.file_data()
        );
        assert_matches!(
            Err(Error::NoSuchAttachment),
            reader.attachment_by_id(1)
        );
    }

    #[test]
    fn structural_errors_are_errors() {
        let mut image = sample_message();
        // Truncate inside the header
        image.truncate(100);
        assert_matches!(
            Err(Error::UnexpectedEnd),
            MsgReader::new(&image, &DecodeOptions::default())
        );
    }

    #[test]
    fn bad_forced_encoding() {
        let options = DecodeOptions {
            ansi_encoding: Some("klingon".to_owned()),
        };
        assert_matches!(
            Err(Error::UnknownEncoding(_)),
            MsgReader::new(&[], &options)
        );
    }

    #[test]
    fn observer_is_a_side_channel() {
        let image = sample_message();
        let reader = MsgReader::new(&image, &DecodeOptions::default()).unwrap();
        let mut count = 0;
        let mut observer = |_: ObjectKind, _: u32, _: &[u8]| count += 1;
        let observed = reader.file_data_with_observer(&mut observer).unwrap();
        assert_eq!(reader.file_data().unwrap(), observed);
        assert!(count > 10);
    }
}
