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

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unexpected end of buffer")]
    UnexpectedEnd,
    #[error("Not a compound file (bad signature)")]
    NotCompoundFile,
    #[error("Unsupported sector size shift {0}")]
    UnsupportedSectorSize(u16),
    #[error("Directory entry 0 is not the root entry")]
    NoRootEntry,
    #[error("Unsupported {what} version {version:#x}")]
    UnsupportedVersion { what: &'static str, version: u32 },
    #[error("Unknown {what} {value:#x}")]
    UnknownValue { what: &'static str, value: u32 },
    #[error("Reserved field must be zero: {0}")]
    ReservedNotZero(&'static str),
    #[error("Length fields disagree: {0}")]
    LengthMismatch(&'static str),
    #[error("No such attachment")]
    NoSuchAttachment,
    #[error("Directory entry {0} is not a stream")]
    NotAStream(usize),
    #[error("Name too long for a directory entry: {0}")]
    NameTooLong(String),
    #[error("Container too large")]
    TooLarge,
    #[error("Unknown character encoding '{0}'")]
    UnknownEncoding(String),
    #[error("Unknown log level '{0}'")]
    BadLogLevel(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Config(#[from] toml::de::Error),
}

impl Error {
    /// Whether this error means the input is simply not something we can
    /// read, as opposed to being a damaged instance of a format we know.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            *self,
            Error::NotCompoundFile | Error::UnsupportedSectorSize(..)
        )
    }
}
