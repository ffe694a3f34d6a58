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

//! The `__properties_version1.0` stream: fixed-size property records.

use std::convert::TryInto;

use byteorder::{ByteOrder, LittleEndian};

use super::model::{ObjectKind, RecipType, Value};
use super::tags::{PropType, RECIPIENT_TYPE_ID};
use crate::support::cursor::ByteCursor;
use crate::support::error::Error;
use crate::support::wintime::filetime_to_datetime;

pub const RECORD_SIZE: usize = 16;

/// Which kind of object owns a property stream, which determines the size of
/// its header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamHeader {
    /// The message at the root of a file: 32 bytes.
    TopLevel,
    /// A message embedded in an attachment: 24 bytes.
    Embedded,
    /// An attachment or recipient: 8 bytes.
    Child,
}

impl StreamHeader {
    pub fn size(self) -> usize {
        match self {
            StreamHeader::TopLevel => 32,
            StreamHeader::Embedded => 24,
            StreamHeader::Child => 8,
        }
    }
}

/// One 16-byte entry of a property stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropertyRecord {
    pub tag: u32,
    pub flags: u32,
    /// The inline value; for variable-length types, a size and reserved
    /// field instead.
    pub value: [u8; 8],
}

impl PropertyRecord {
    pub fn id(&self) -> u16 {
        (self.tag >> 16) as u16
    }

    pub fn prop_type(&self) -> PropType {
        PropType::from_code(self.tag as u16)
    }

    /// Convert the inline value of fixed-size types.
    ///
    /// Variable-length types and fixed types we have no use for yield
    /// `None`.
    pub fn decode(&self, owner: ObjectKind) -> Option<Value> {
        let v = &self.value;
        match self.prop_type() {
            PropType::SysTime => filetime_to_datetime(
                LittleEndian::read_u32(&v[0..4]),
                LittleEndian::read_u32(&v[4..8]),
            )
            .map(Value::Time),
            PropType::Long => {
                let i = LittleEndian::read_i32(&v[0..4]);
                if ObjectKind::Recipient == owner
                    && RECIPIENT_TYPE_ID == self.id()
                {
                    Some(
                        RecipType::from_raw(i)
                            .map_or(Value::Integer(i), Value::RecipientType),
                    )
                } else {
                    Some(Value::Integer(i))
                }
            }
            PropType::Short => {
                Some(Value::Integer(i32::from(LittleEndian::read_i16(&v[0..2]))))
            }
            PropType::Boolean => {
                Some(Value::Boolean(0 != LittleEndian::read_u16(&v[0..2])))
            }
            _ => None,
        }
    }
}

/// Split a property stream into its records.
///
/// Every record advances exactly 16 bytes whatever its type; a trailing
/// partial record is ignored. An empty stream has no records.
pub fn parse_property_stream(
    data: &[u8],
    header: StreamHeader,
) -> Result<Vec<PropertyRecord>, Error> {
    if data.is_empty() {
        return Ok(Vec::new());
    }

    let mut c = ByteCursor::new(data);
    let reserved = c.read_bytes(header.size())?;
    if StreamHeader::Embedded == header && reserved[..8].iter().any(|&b| 0 != b)
    {
        return Err(Error::ReservedNotZero("embedded message property header"));
    }

    let mut records = Vec::with_capacity(c.remaining() / RECORD_SIZE);
    while c.remaining() >= RECORD_SIZE {
        let tag = c.read_u32::<LittleEndian>()?;
        let flags = c.read_u32::<LittleEndian>()?;
        let value: [u8; 8] = c
            .read_bytes(8)?
            .try_into()
            .map_err(|_| Error::UnexpectedEnd)?;
        records.push(PropertyRecord { tag, flags, value });
    }

    Ok(records)
}
