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

//! Reading and writing of the Compound File Binary Format (OLE2 structured
//! storage), the container that `.msg` files are built on.
//!
//! A compound file is a sequence of fixed-size sectors preceded by a 512-byte
//! header. Streams are stored as chains of sectors linked through the FAT;
//! streams smaller than `MINI_STREAM_CUTOFF` are instead stored as chains of
//! 64-byte mini sectors linked through the mini-FAT, and the mini sectors
//! themselves live inside the root entry's own stream (the "mini-stream").
//! A flat array of 128-byte directory entries, threaded into per-storage
//! sibling trees, names everything.

pub mod container;
pub mod directory;
pub mod folder;
pub mod header;
pub mod writer;

pub use self::container::Container;
pub use self::directory::{DirEntry, EntryKind};
pub use self::folder::{FileHandle, Folder};
pub use self::writer::{Burner, Node, NodeKind};

/// The 8-byte signature at the start of every compound file.
pub const SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// The header is 512 bytes regardless of sector size.
pub const HEADER_SIZE: usize = 512;
pub const DIR_ENTRY_SIZE: usize = 128;
pub const MINI_SECTOR_SIZE: usize = 64;
/// Streams strictly smaller than this live in the mini-stream.
pub const MINI_STREAM_CUTOFF: u32 = 0x1000;
/// Number of FAT sector locations stored in the header itself.
pub const DIFAT_IN_HEADER: usize = 109;

/// Largest value that refers to an actual sector.
pub const MAXREGSECT: u32 = 0xFFFF_FFFA;
pub const DIFSECT: u32 = 0xFFFF_FFFC;
pub const FATSECT: u32 = 0xFFFF_FFFD;
pub const ENDOFCHAIN: u32 = 0xFFFF_FFFE;
pub const FREESECT: u32 = 0xFFFF_FFFF;
/// "No entry" marker for directory sibling and child links.
pub const NOSTREAM: u32 = 0xFFFF_FFFF;

/// Returns whether `data` starts with the compound file signature.
///
/// This only inspects the signature; a `true` result does not mean the rest
/// of the file is well-formed.
pub fn is_container_file(data: &[u8]) -> bool {
    data.starts_with(&SIGNATURE)
}
