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

//! Directory entries and reconstruction of the storage hierarchy.

use std::collections::VecDeque;

use byteorder::LittleEndian;

use super::{DIR_ENTRY_SIZE, NOSTREAM};
use crate::support::cursor::ByteCursor;
use crate::support::error::Error;

pub const OFF_NAME_LEN: usize = 0x40;
pub const OFF_TYPE: usize = 0x42;
pub const OFF_COLOUR: usize = 0x43;
pub const OFF_LEFT_SIBLING: usize = 0x44;
pub const OFF_RIGHT_SIBLING: usize = 0x48;
pub const OFF_CHILD: usize = 0x4C;
pub const OFF_START_SECTOR: usize = 0x74;
pub const OFF_SIZE: usize = 0x78;

/// Name field capacity, in UTF-16 code units, including the terminator.
pub const NAME_UNITS: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Root,
    /// A "directory".
    Storage,
    /// A "document".
    Stream,
}

impl EntryKind {
    pub fn from_type_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(EntryKind::Storage),
            2 => Some(EntryKind::Stream),
            5 => Some(EntryKind::Root),
            _ => None,
        }
    }

    pub fn type_byte(self) -> u8 {
        match self {
            EntryKind::Storage => 1,
            EntryKind::Stream => 2,
            EntryKind::Root => 5,
        }
    }
}

/// One object in the compound file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
    pub left_sibling: Option<usize>,
    pub right_sibling: Option<usize>,
    pub child: Option<usize>,
    /// First sector of the content; a mini sector if `size` is below the
    /// mini-stream cutoff and this is not the root.
    pub start_sector: u32,
    pub size: u32,
    /// Direct children, populated by `build_hierarchy`.
    pub children: Vec<usize>,
}

impl DirEntry {
    /// Decode one 128-byte entry.
    ///
    /// Entries of unused or unknown type decode to `None`.
    pub fn parse(raw: &[u8]) -> Result<Option<Self>, Error> {
        if raw.len() < DIR_ENTRY_SIZE {
            return Err(Error::UnexpectedEnd);
        }

        let kind = match EntryKind::from_type_byte(raw[OFF_TYPE]) {
            Some(kind) => kind,
            None => return Ok(None),
        };

        let mut c = ByteCursor::new(raw);
        let units = (0..NAME_UNITS)
            .map(|_| c.read_u16::<LittleEndian>())
            .collect::<Result<Vec<u16>, Error>>()?;
        let name_len = usize::from(c.read_u16::<LittleEndian>()?);
        let mut units = &units[..(name_len / 2).min(NAME_UNITS)];
        if let Some(nul) = units.iter().position(|&u| 0 == u) {
            units = &units[..nul];
        }

        c.seek(OFF_LEFT_SIBLING);
        let left_sibling = link(c.read_u32::<LittleEndian>()?);
        let right_sibling = link(c.read_u32::<LittleEndian>()?);
        let child = link(c.read_u32::<LittleEndian>()?);
        c.seek(OFF_START_SECTOR);
        let start_sector = c.read_u32::<LittleEndian>()?;
        let size = c.read_u32::<LittleEndian>()?;

        Ok(Some(DirEntry {
            name: String::from_utf16_lossy(units),
            kind,
            left_sibling,
            right_sibling,
            child,
            start_sector,
            size,
            children: Vec::new(),
        }))
    }

    pub fn is_storage(&self) -> bool {
        EntryKind::Stream != self.kind
    }
}

fn link(raw: u32) -> Option<usize> {
    if NOSTREAM == raw {
        None
    } else {
        Some(raw as usize)
    }
}

/// Populate `children` for every storage reachable from the root (entry 0).
///
/// Each storage's children form a binary tree threaded through the sibling
/// links, starting at the storage's `child`. The tree is walked breadth-first
/// and every entry is visited at most once, so cyclic or shared links in a
/// corrupt file are simply ignored the second time around.
pub fn build_hierarchy(entries: &mut [Option<DirEntry>]) {
    let mut visited = vec![false; entries.len()];
    let mut storages = VecDeque::new();
    if !entries.is_empty() {
        visited[0] = true;
        storages.push_back(0);
    }

    while let Some(parent) = storages.pop_front() {
        let mut children = Vec::new();
        let mut pending = VecDeque::new();
        pending.extend(entries[parent].as_ref().and_then(|e| e.child));

        while let Some(ix) = pending.pop_front() {
            if ix >= entries.len() || visited[ix] {
                continue;
            }

            let entry = match entries[ix] {
                Some(ref entry) => entry,
                None => continue,
            };

            visited[ix] = true;
            children.push(ix);
            pending.extend(entry.left_sibling);
            pending.extend(entry.right_sibling);
            if EntryKind::Storage == entry.kind {
                storages.push_back(ix);
            }
        }

        if let Some(ref mut entry) = entries[parent] {
            entry.children = children;
        }
    }
}
