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

//! MAPI property identifiers and the naming conventions used to store them.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

pub const ATTACH_PREFIX: &str = "__attach_version1.0_#";
pub const RECIP_PREFIX: &str = "__recip_version1.0_#";
pub const NAMEID_STORAGE: &str = "__nameid_version1.0";
pub const PROPERTIES_STREAM: &str = "__properties_version1.0";

/// `PidTagAttachDataBinary` / `PidTagAttachDataObject`.
pub const ATTACH_DATA_ID: u16 = 0x3701;
pub const RECIPIENT_TYPE_ID: u16 = 0x0C15;

/// MAPI property type codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropType {
    Short,
    Long,
    Boolean,
    Object,
    SysTime,
    Ansi,
    Unicode,
    Binary,
    Other(u16),
}

impl PropType {
    pub fn from_code(code: u16) -> Self {
        match code {
            0x0002 => PropType::Short,
            0x0003 => PropType::Long,
            0x000B => PropType::Boolean,
            0x000D => PropType::Object,
            0x0040 => PropType::SysTime,
            0x001E => PropType::Ansi,
            0x001F => PropType::Unicode,
            0x0102 => PropType::Binary,
            other => PropType::Other(other),
        }
    }

    pub fn code(self) -> u16 {
        match self {
            PropType::Short => 0x0002,
            PropType::Long => 0x0003,
            PropType::Boolean => 0x000B,
            PropType::Object => 0x000D,
            PropType::SysTime => 0x0040,
            PropType::Ansi => 0x001E,
            PropType::Unicode => 0x001F,
            PropType::Binary => 0x0102,
            PropType::Other(other) => other,
        }
    }
}

/// Build a full property tag from its ID and type.
pub fn tag(id: u16, prop_type: PropType) -> u32 {
    u32::from(id) << 16 | u32::from(prop_type.code())
}

/// The name of the stream holding a single property.
pub fn substg_name(id: u16, prop_type: PropType) -> String {
    format!("__substg1.0_{:08X}", tag(id, prop_type))
}

/// What a child of a message object storage holds, judging by its name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChildName {
    Attachment,
    Recipient,
    NameId,
    Properties,
    Property { id: u16, prop_type: PropType },
    Other,
}

lazy_static! {
    static ref SUBSTG: Regex =
        Regex::new("^__substg1\\.0_([0-9A-Fa-f]{4})([0-9A-Fa-f]{4})$")
            .unwrap();
}

pub fn classify(name: &str) -> ChildName {
    if name.starts_with("__attach_version1.0") {
        ChildName::Attachment
    } else if name.starts_with("__recip_version1.0") {
        ChildName::Recipient
    } else if NAMEID_STORAGE == name {
        ChildName::NameId
    } else if PROPERTIES_STREAM == name {
        ChildName::Properties
    } else if let Some(cap) = SUBSTG.captures(name) {
        // The regex guarantees both groups are four hex digits
        match (
            u16::from_str_radix(&cap[1], 16),
            u16::from_str_radix(&cap[2], 16),
        ) {
            (Ok(id), Ok(code)) => ChildName::Property {
                id,
                prop_type: PropType::from_code(code),
            },
            _ => ChildName::Other,
        }
    } else {
        ChildName::Other
    }
}

macro_rules! fields {
    ($($variant:ident = $id:expr => $name:expr,)*) => {
        /// The properties that are decoded into named fields.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum Field {
            $($variant,)*
        }

        impl Field {
            pub fn from_id(id: u16) -> Option<Self> {
                match id {
                    $($id => Some(Field::$variant),)*
                    _ => None,
                }
            }

            pub fn id(self) -> u16 {
                match self {
                    $(Field::$variant => $id,)*
                }
            }

            /// The camel-case field name, e.g. "senderName".
            pub fn name(self) -> &'static str {
                match self {
                    $(Field::$variant => $name,)*
                }
            }
        }
    }
}

fields! {
    MessageClass = 0x001A => "messageClass",
    Subject = 0x0037 => "subject",
    NormalizedSubject = 0x0E1D => "normalizedSubject",
    ConversationTopic = 0x0070 => "conversationTopic",
    SenderName = 0x0C1A => "senderName",
    SenderEmail = 0x0C1F => "senderEmail",
    SenderSmtpAddress = 0x5D01 => "senderSmtpAddress",
    SentRepresentingName = 0x0042 => "sentRepresentingName",
    SentRepresentingEmail = 0x0065 => "sentRepresentingEmail",
    SentRepresentingSmtpAddress = 0x5D02 => "sentRepresentingSmtpAddress",
    DisplayTo = 0x0E04 => "displayTo",
    DisplayCc = 0x0E03 => "displayCc",
    DisplayBcc = 0x0E02 => "displayBcc",
    Body = 0x1000 => "body",
    BodyHtml = 0x1013 => "bodyHtml",
    CompressedRtf = 0x1009 => "compressedRtf",
    Headers = 0x007D => "headers",
    MessageId = 0x1035 => "messageId",
    InReplyToId = 0x1042 => "inReplyToId",
    References = 0x1039 => "references",
    ClientSubmitTime = 0x0039 => "clientSubmitTime",
    MessageDeliveryTime = 0x0E06 => "messageDeliveryTime",
    CreationTime = 0x3007 => "creationTime",
    LastModificationTime = 0x3008 => "lastModificationTime",
    LastModifierName = 0x3FFA => "lastModifierName",
    MessageFlags = 0x0E07 => "messageFlags",
    Importance = 0x0017 => "importance",
    Sensitivity = 0x0036 => "sensitivity",
    MessageSize = 0x0E08 => "messageSize",
    HasAttachments = 0x0E1B => "hasAttachments",
    InternetCodepage = 0x3FDE => "internetCodepage",
    MessageCodepage = 0x3FFD => "messageCodepage",
    Extension = 0x3703 => "extension",
    FileNameShort = 0x3704 => "fileNameShort",
    FileName = 0x3707 => "fileName",
    AttachMimeTag = 0x370E => "attachMimeTag",
    ContentId = 0x3712 => "pidContentId",
    AttachMethod = 0x3705 => "attachMethod",
    RenderingPosition = 0x370B => "renderingPosition",
    AttachSize = 0x0E20 => "attachSize",
    AttachmentHidden = 0x7FFE => "attachmentHidden",
    DisplayName = 0x3001 => "name",
    AddressType = 0x3002 => "addressType",
    EmailAddress = 0x3003 => "email",
    SmtpAddress = 0x39FE => "smtpAddress",
    RecipType = 0x0C15 => "recipType",
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn classify_names() {
        assert_eq!(
            ChildName::Attachment,
            classify("__attach_version1.0_#00000000")
        );
        assert_eq!(
            ChildName::Recipient,
            classify("__recip_version1.0_#0000000A")
        );
        assert_eq!(ChildName::NameId, classify("__nameid_version1.0"));
        assert_eq!(ChildName::Properties, classify("__properties_version1.0"));
        assert_eq!(
            ChildName::Property {
                id: 0x0037,
                prop_type: PropType::Unicode
            },
            classify("__substg1.0_0037001F")
        );
        assert_eq!(
            ChildName::Property {
                id: 0x3701,
                prop_type: PropType::Object
            },
            classify("__substg1.0_3701000d")
        );
        // Multi-valued properties carry a suffix and are not decoded
        assert_eq!(ChildName::Other, classify("__substg1.0_8003101F-00000000"));
        assert_eq!(ChildName::Other, classify("__substg1.0_0037001"));
        assert_eq!(ChildName::Other, classify("\u{1}CompObj"));
    }

    #[test]
    fn field_table() {
        assert_eq!(Some(Field::Subject), Field::from_id(0x0037));
        assert_eq!("subject", Field::Subject.name());
        assert_eq!(0x0C15, Field::RecipType.id());
        assert_eq!(None, Field::from_id(0x1234));
        assert_eq!("__substg1.0_0037001F", substg_name(0x0037, PropType::Unicode));
        assert_eq!(0x0037_001F, tag(0x0037, PropType::Unicode));
        assert_eq!(PropType::Other(0x1102), PropType::from_code(0x1102));
    }
}
