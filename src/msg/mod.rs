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

//! Decoding of Outlook `.msg` files.
//!
//! A message is a compound file whose root storage holds one stream per
//! variable-length property (`__substg1.0_TTTTPPPP`), a property stream
//! holding all fixed-length properties, and one sub-storage per recipient
//! and per attachment, each laid out the same way. An attachment that is
//! itself a message holds that message as a storage.

pub mod decode;
pub mod export;
pub mod model;
pub mod props;
pub mod reader;
pub mod tags;

pub use self::decode::PropertyObserver;
pub use self::model::{FieldsData, FileData, ObjectKind, RecipType, Value};
pub use self::reader::{AttachmentContent, MsgReader};
pub use self::tags::Field;
