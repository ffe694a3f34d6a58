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

//! Synthetic `.msg` files for tests, built with the container writer.

use byteorder::{ByteOrder, LittleEndian};
use chrono::prelude::*;

use crate::cfb::writer::{Burner, Node};
use crate::msg::props::{StreamHeader, RECORD_SIZE};
use crate::msg::tags::{
    self, Field, PropType, ATTACH_PREFIX, NAMEID_STORAGE, PROPERTIES_STREAM,
    RECIP_PREFIX,
};
use crate::support::wintime::datetime_to_filetime;

pub static SAMPLE_BODY: &str = "Hi Alice,\r\n\r\nSee attached.\r\n";
pub static ATTACHMENT_CONTENT: &[u8] =
    b"Remember to water the plants on Tuesday.\n";
pub static INNER_ATTACHMENT_CONTENT: &[u8] = b"\x00\x01\x02\x03 binary blob";

pub fn utf16(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(|u| u.to_le_bytes().to_vec()).collect()
}

/// A property stream record as `(tag, inline value)`.
pub type Record = (u32, u64);

pub fn long_record(field: Field, value: i32) -> Record {
    (tags::tag(field.id(), PropType::Long), u64::from(value as u32))
}

pub fn time_record(field: Field, value: DateTime<Utc>) -> Record {
    (tags::tag(field.id(), PropType::SysTime), datetime_to_filetime(value))
}

pub fn property_stream(header: StreamHeader, records: &[Record]) -> Vec<u8> {
    let mut data = vec![0u8; header.size()];
    for &(tag, value) in records {
        let mut r = [0u8; RECORD_SIZE];
        LittleEndian::write_u32(&mut r[0..4], tag);
        // PROPATTR_READABLE | PROPATTR_WRITABLE
        LittleEndian::write_u32(&mut r[4..8], 6);
        LittleEndian::write_u64(&mut r[8..16], value);
        data.extend_from_slice(&r);
    }
    data
}

pub fn unicode_node(id: u16, value: &str) -> Node<'static> {
    Node::bytes(tags::substg_name(id, PropType::Unicode), utf16(value))
}

pub fn attachment_node(
    index: u32,
    children: Vec<Node<'static>>,
) -> Node<'static> {
    Node::storage(format!("{}{:08X}", ATTACH_PREFIX, index), children)
}

pub fn recipient_node(
    index: u32,
    children: Vec<Node<'static>>,
) -> Node<'static> {
    Node::storage(format!("{}{:08X}", RECIP_PREFIX, index), children)
}

pub fn sample_delivery_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 11, 5, 9, 45, 12).unwrap()
}

fn inner_message_nodes() -> Vec<Node<'static>> {
    vec![
        Node::bytes(
            PROPERTIES_STREAM,
            property_stream(
                StreamHeader::Embedded,
                &[long_record(Field::Importance, 2)],
            ),
        ),
        unicode_node(Field::Subject.id(), "Inner"),
        unicode_node(Field::SenderName.id(), "Bob"),
        recipient_node(
            0,
            vec![
                Node::bytes(
                    PROPERTIES_STREAM,
                    property_stream(
                        StreamHeader::Child,
                        &[long_record(Field::RecipType, 2)],
                    ),
                ),
                unicode_node(Field::DisplayName.id(), "Carol"),
            ],
        ),
        attachment_node(
            0,
            vec![
                Node::bytes(
                    PROPERTIES_STREAM,
                    property_stream(
                        StreamHeader::Child,
                        &[long_record(Field::AttachMethod, 1)],
                    ),
                ),
                unicode_node(Field::FileName.id(), "blob.bin"),
                Node::bytes(
                    tags::substg_name(tags::ATTACH_DATA_ID, PropType::Binary),
                    INNER_ATTACHMENT_CONTENT.to_vec(),
                ),
            ],
        ),
    ]
}

/// A message with subject "Hello", one "to" recipient, one file attachment
/// and one embedded message attachment, plus an unknown property 0x6789.
pub fn sample_message() -> Vec<u8> {
    Burner::new()
        .burn(&[
            Node::bytes(
                PROPERTIES_STREAM,
                property_stream(
                    StreamHeader::TopLevel,
                    &[
                        time_record(
                            Field::MessageDeliveryTime,
                            sample_delivery_time(),
                        ),
                        long_record(Field::MessageFlags, 0x11),
                        (tags::tag(Field::HasAttachments.id(), PropType::Boolean), 1),
                    ],
                ),
            ),
            unicode_node(Field::Subject.id(), "Hello"),
            unicode_node(Field::Body.id(), SAMPLE_BODY),
            unicode_node(0x6789, "ab"),
            Node::bytes(
                tags::substg_name(Field::MessageClass.id(), PropType::Ansi),
                b"IPM.Note".to_vec(),
            ),
            Node::storage(
                NAMEID_STORAGE,
                vec![Node::bytes("__substg1.0_00020102", vec![0; 16])],
            ),
            recipient_node(
                0,
                vec![
                    Node::bytes(
                        PROPERTIES_STREAM,
                        property_stream(
                            StreamHeader::Child,
                            &[long_record(Field::RecipType, 1)],
                        ),
                    ),
                    unicode_node(Field::DisplayName.id(), "Alice"),
                    unicode_node(Field::EmailAddress.id(), "alice@example.com"),
                ],
            ),
            attachment_node(
                0,
                vec![
                    Node::bytes(
                        PROPERTIES_STREAM,
                        property_stream(
                            StreamHeader::Child,
                            &[long_record(Field::AttachMethod, 1)],
                        ),
                    ),
                    unicode_node(Field::FileName.id(), "notes.txt"),
                    unicode_node(Field::Extension.id(), ".txt"),
                    Node::bytes(
                        tags::substg_name(
                            tags::ATTACH_DATA_ID,
                            PropType::Binary,
                        ),
                        ATTACHMENT_CONTENT.to_vec(),
                    ),
                ],
            ),
            attachment_node(
                1,
                vec![
                    Node::bytes(
                        PROPERTIES_STREAM,
                        property_stream(
                            StreamHeader::Child,
                            &[long_record(Field::AttachMethod, 5)],
                        ),
                    ),
                    unicode_node(Field::DisplayName.id(), "Inner"),
                    Node::storage(
                        tags::substg_name(
                            tags::ATTACH_DATA_ID,
                            PropType::Object,
                        ),
                        inner_message_nodes(),
                    ),
                ],
            ),
        ])
        .unwrap()
}
