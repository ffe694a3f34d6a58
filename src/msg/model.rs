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

use std::collections::BTreeMap;
use std::fmt;

use chrono::prelude::*;

use super::tags::Field;

/// A decoded property value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Binary(Vec<u8>),
    Integer(i32),
    Boolean(bool),
    Time(DateTime<Utc>),
    RecipientType(RecipType),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Value::Text(ref s) => write!(f, "{:?}", s),
            Value::Binary(ref b) => write!(f, "<{} bytes>", b.len()),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Time(t) => write!(f, "{}", t.to_rfc3339()),
            Value::RecipientType(rt) => f.write_str(rt.name()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecipType {
    To,
    Cc,
    Bcc,
}

impl RecipType {
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            1 => Some(RecipType::To),
            2 => Some(RecipType::Cc),
            3 => Some(RecipType::Bcc),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RecipType::To => "to",
            RecipType::Cc => "cc",
            RecipType::Bcc => "bcc",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Message,
    Attachment,
    Recipient,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            ObjectKind::Message => "message",
            ObjectKind::Attachment => "attachment",
            ObjectKind::Recipient => "recipient",
        })
    }
}

/// The decoded properties of one message, attachment, or recipient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldsData {
    pub kind: ObjectKind,
    /// Only properties actually present (and of a supported type) appear.
    pub fields: BTreeMap<Field, Value>,
    pub attachments: Vec<FieldsData>,
    pub recipients: Vec<FieldsData>,
    /// For attachments, the embedded message, if the attachment is one.
    pub inner_message: Option<Box<FieldsData>>,
    /// For attachments, the directory entry holding the content: the data
    /// stream for ordinary attachments, or the message storage for embedded
    /// messages.
    pub data_id: Option<usize>,
    /// The declared size of the attachment data stream.
    pub content_length: Option<u32>,
    pub has_inner_message: bool,
}

impl FieldsData {
    pub fn new(kind: ObjectKind) -> Self {
        FieldsData {
            kind,
            fields: BTreeMap::new(),
            attachments: Vec::new(),
            recipients: Vec::new(),
            inner_message: None,
            data_id: None,
            content_length: None,
            has_inner_message: false,
        }
    }

    pub fn get(&self, field: Field) -> Option<&Value> {
        self.fields.get(&field)
    }

    pub fn text(&self, field: Field) -> Option<&str> {
        match self.fields.get(&field) {
            Some(&Value::Text(ref s)) => Some(s),
            _ => None,
        }
    }

    pub fn binary(&self, field: Field) -> Option<&[u8]> {
        match self.fields.get(&field) {
            Some(&Value::Binary(ref b)) => Some(b),
            _ => None,
        }
    }

    pub fn integer(&self, field: Field) -> Option<i32> {
        match self.fields.get(&field) {
            Some(&Value::Integer(i)) => Some(i),
            _ => None,
        }
    }

    pub fn time(&self, field: Field) -> Option<DateTime<Utc>> {
        match self.fields.get(&field) {
            Some(&Value::Time(t)) => Some(t),
            _ => None,
        }
    }

    pub fn subject(&self) -> Option<&str> {
        self.text(Field::Subject)
    }

    pub fn body(&self) -> Option<&str> {
        self.text(Field::Body)
    }

    pub fn recip_type(&self) -> Option<RecipType> {
        match self.fields.get(&Field::RecipType) {
            Some(&Value::RecipientType(rt)) => Some(rt),
            _ => None,
        }
    }

    /// The best available file name of an attachment: the long name, then
    /// the 8.3 name.
    pub fn file_name(&self) -> Option<&str> {
        self.text(Field::FileName)
            .or_else(|| self.text(Field::FileNameShort))
            .filter(|s| !s.is_empty())
    }

    /// Recursively clear `data_id`, which is only meaningful relative to the
    /// container the record was decoded from.
    pub fn without_data_ids(mut self) -> Self {
        self.data_id = None;
        self.attachments = self
            .attachments
            .into_iter()
            .map(FieldsData::without_data_ids)
            .collect();
        self.recipients = self
            .recipients
            .into_iter()
            .map(FieldsData::without_data_ids)
            .collect();
        self.inner_message =
            self.inner_message.map(|m| Box::new(m.without_data_ids()));
        self
    }
}

/// The result of decoding a file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileData {
    /// The input is not a compound file we can read.
    Unsupported { error: String },
    Message(FieldsData),
}

impl FileData {
    pub fn message(&self) -> Option<&FieldsData> {
        match *self {
            FileData::Message(ref m) => Some(m),
            FileData::Unsupported { .. } => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn accessors_check_types() {
        let mut fd = FieldsData::new(ObjectKind::Attachment);
        fd.fields
            .insert(Field::Subject, Value::Text("hi".to_owned()));
        fd.fields.insert(Field::Importance, Value::Integer(2));
        fd.fields
            .insert(Field::FileNameShort, Value::Text("A.TXT".to_owned()));

        assert_eq!(Some("hi"), fd.subject());
        assert_eq!(None, fd.text(Field::Importance));
        assert_eq!(Some(2), fd.integer(Field::Importance));
        assert_eq!(None, fd.binary(Field::Subject));
        assert_eq!(Some("A.TXT"), fd.file_name());

        fd.fields
            .insert(Field::FileName, Value::Text("a long.txt".to_owned()));
        assert_eq!(Some("a long.txt"), fd.file_name());
    }

    #[test]
    fn data_ids_stripped_recursively() {
        let mut inner = FieldsData::new(ObjectKind::Message);
        let mut inner_att = FieldsData::new(ObjectKind::Attachment);
        inner_att.data_id = Some(4);
        inner.attachments.push(inner_att);

        let mut att = FieldsData::new(ObjectKind::Attachment);
        att.data_id = Some(9);
        att.content_length = Some(3);
        att.inner_message = Some(Box::new(inner));

        let stripped = att.without_data_ids();
        assert_eq!(None, stripped.data_id);
        assert_eq!(Some(3), stripped.content_length);
        assert_eq!(
            None,
            stripped.inner_message.unwrap().attachments[0].data_id
        );
    }

    #[test]
    fn display() {
        assert_eq!("to", Value::RecipientType(RecipType::To).to_string());
        assert_eq!("<3 bytes>", Value::Binary(vec![1, 2, 3]).to_string());
        assert_eq!("\"x\"", Value::Text("x".to_owned()).to_string());
        assert_eq!(None, RecipType::from_raw(0));
    }
}
