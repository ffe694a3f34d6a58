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

use super::container::Container;
use super::directory::DirEntry;

/// A storage within a `Container`, viewed as a directory of named children.
///
/// Lookups by name are exact and only consider direct children.
#[derive(Clone, Copy)]
pub struct Folder<'c, 'a> {
    container: &'c Container<'a>,
    index: usize,
}

impl fmt::Debug for Folder<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Folder({}, {:?})", self.index, self.name())
    }
}

impl<'c, 'a> Folder<'c, 'a> {
    pub(super) fn new(container: &'c Container<'a>, index: usize) -> Self {
        Folder { container, index }
    }

    /// The directory entry index of this storage.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &'c str {
        self.container.entry(self.index).map_or("", |e| &e.name[..])
    }

    pub fn container(&self) -> &'c Container<'a> {
        self.container
    }

    fn child_entries(&self) -> Vec<(usize, &'c DirEntry)> {
        let container = self.container;
        container
            .children(self.index)
            .iter()
            .filter_map(|&ix| container.entry(ix).map(|e| (ix, e)))
            .collect()
    }

    pub fn sub_folders(&self) -> Vec<Folder<'c, 'a>> {
        self.child_entries()
            .into_iter()
            .filter(|&(_, e)| e.is_storage())
            .map(|(ix, _)| Folder::new(self.container, ix))
            .collect()
    }

    pub fn sub_folder(&self, name: &str) -> Option<Folder<'c, 'a>> {
        self.child_entries()
            .into_iter()
            .find(|&(_, e)| e.is_storage() && e.name == name)
            .map(|(ix, _)| Folder::new(self.container, ix))
    }

    pub fn file_names(&self) -> Vec<&'c str> {
        self.child_entries()
            .into_iter()
            .filter(|&(_, e)| !e.is_storage())
            .map(|(_, e)| &e.name[..])
            .collect()
    }

    pub fn file_name_and_length_pairs(&self) -> Vec<FileHandle<'c, 'a>> {
        self.child_entries()
            .into_iter()
            .filter(|&(_, e)| !e.is_storage())
            .map(|(index, entry)| FileHandle {
                container: self.container,
                index,
                entry,
            })
            .collect()
    }

    /// Read the stream called `name` in this storage, if there is one.
    pub fn read_file(&self, name: &str) -> Option<Vec<u8>> {
        self.child_entries()
            .into_iter()
            .find(|&(_, e)| !e.is_storage() && e.name == name)
            .map(|(_, e)| self.container.read_entry(e))
    }
}

/// A stream within a `Folder` whose content has not been read yet.
#[derive(Clone, Copy)]
pub struct FileHandle<'c, 'a> {
    container: &'c Container<'a>,
    index: usize,
    entry: &'c DirEntry,
}

impl fmt::Debug for FileHandle<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FileHandle")
            .field("index", &self.index)
            .field("name", &self.entry.name)
            .field("len", &self.entry.size)
            .finish()
    }
}

impl<'c, 'a> FileHandle<'c, 'a> {
    pub fn name(&self) -> &'c str {
        &self.entry.name
    }

    /// The declared length of the stream.
    pub fn len(&self) -> u32 {
        self.entry.size
    }

    pub fn is_empty(&self) -> bool {
        0 == self.entry.size
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn read(&self) -> Vec<u8> {
        self.container.read_entry(self.entry)
    }
}
