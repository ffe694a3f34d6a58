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

use byteorder::LittleEndian;
use log::{debug, warn};

use super::directory::{self, DirEntry, EntryKind};
use super::folder::Folder;
use super::header::Header;
use super::{
    DIFAT_IN_HEADER, DIR_ENTRY_SIZE, ENDOFCHAIN, FREESECT, MAXREGSECT,
    MINI_SECTOR_SIZE, MINI_STREAM_CUTOFF,
};
use crate::support::cursor::ByteCursor;
use crate::support::error::Error;

/// A parsed compound file.
///
/// Parsing resolves the allocation tables and the directory up front; stream
/// content is only read on request. The container borrows the caller's
/// buffer and never mutates it.
///
/// Damage past the header is tolerated: sectors that lie outside the buffer,
/// FAT entries that are missing, and chains that loop all just cause the
/// affected reads to come up short.
pub struct Container<'a> {
    data: &'a [u8],
    header: Header,
    fat: Vec<u32>,
    mini_fat: Vec<u32>,
    entries: Vec<Option<DirEntry>>,
    /// The root entry's big-sector chain, which holds the mini-stream.
    mini_stream_chain: Vec<u32>,
}

impl fmt::Debug for Container<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Container")
            .field("len", &self.data.len())
            .field("sector_size", &self.header.sector_size)
            .field("fat", &self.fat.len())
            .field("mini_fat", &self.mini_fat.len())
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl<'a> Container<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, Error> {
        let header = Header::parse(data)?;
        let mut container = Container {
            data,
            header,
            fat: Vec::new(),
            mini_fat: Vec::new(),
            entries: Vec::new(),
            mini_stream_chain: Vec::new(),
        };

        let fat_sectors = container.fat_sector_locations()?;
        container.fat = container.read_table(&fat_sectors)?;

        let mini_fat_sectors: Vec<u32> = container
            .sector_chain(container.header.mini_fat_start)
            .into_iter()
            .take(container.header.mini_fat_count as usize)
            .collect();
        container.mini_fat = container.read_table(&mini_fat_sectors)?;

        container.entries = container.read_directory()?;
        let root_start = match container.entries.first() {
            Some(Some(root)) if EntryKind::Root == root.kind => {
                root.start_sector
            }
            _ => return Err(Error::NoRootEntry),
        };
        directory::build_hierarchy(&mut container.entries);
        container.mini_stream_chain = container.sector_chain(root_start);

        debug!(
            "Compound file: {} bytes, {}-byte sectors, {} FAT sectors, \
             {} FAT entries, {} mini-FAT entries, {} directory entries",
            data.len(),
            container.header.sector_size,
            fat_sectors.len(),
            container.fat.len(),
            container.mini_fat.len(),
            container.entries.len(),
        );

        Ok(container)
    }

    pub fn sector_size(&self) -> usize {
        self.header.sector_size
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Number of whole or partial sectors present in the buffer after the
    /// header.
    fn sectors_in_buffer(&self) -> usize {
        let ss = self.header.sector_size;
        (self.data.len().saturating_sub(ss) + ss - 1) / ss
    }

    /// The bytes of big sector `sector`.
    ///
    /// The last sector of a truncated file may be short. Returns `None` for
    /// special values and for sectors entirely outside the buffer.
    fn sector(&self, sector: u32) -> Option<&'a [u8]> {
        if sector > MAXREGSECT {
            return None;
        }

        let ss = self.header.sector_size;
        let start = (sector as usize + 1).checked_mul(ss)?;
        if start >= self.data.len() {
            return None;
        }

        let end = (start + ss).min(self.data.len());
        Some(&self.data[start..end])
    }

    /// Collect the locations of all FAT sectors, first from the header and
    /// then from the XBAT chain.
    fn fat_sector_locations(&self) -> Result<Vec<u32>, Error> {
        let ss = self.header.sector_size;
        // A FAT larger than the file itself is nonsense; don't let a hostile
        // count make us loop for ages.
        let declared = (self.header.fat_sector_count as usize)
            .min(self.sectors_in_buffer());

        let mut locations: Vec<u32> = self
            .header
            .difat
            .iter()
            .copied()
            .take(declared.min(DIFAT_IN_HEADER))
            .collect();

        let mut xbat = self.header.xbat_start;
        'xbat: for _ in 0..self.header.xbat_count {
            if locations.len() >= declared {
                break;
            }

            let bytes = match self.sector(xbat) {
                Some(bytes) if bytes.len() == ss => bytes,
                _ => {
                    warn!("XBAT sector {:#x} is not in the file", xbat);
                    break;
                }
            };

            let mut c = ByteCursor::new(bytes);
            for _ in 0..ss / 4 - 1 {
                let location = c.read_u32::<LittleEndian>()?;
                if FREESECT == location || ENDOFCHAIN == location {
                    break 'xbat;
                }

                locations.push(location);
                if locations.len() >= declared {
                    break 'xbat;
                }
            }

            c.seek(ss - 4);
            xbat = c.read_u32::<LittleEndian>()?;
        }

        Ok(locations)
    }

    /// Concatenate the `u32` entries of the given table sectors.
    ///
    /// Stops at the first sector that is not in the buffer, since entries
    /// after a gap would be attributed to the wrong sectors.
    fn read_table(&self, sectors: &[u32]) -> Result<Vec<u32>, Error> {
        let mut table = Vec::new();
        for &sector in sectors {
            let bytes = match self.sector(sector) {
                Some(bytes) => bytes,
                None => {
                    warn!("Table sector {:#x} is not in the file", sector);
                    break;
                }
            };

            let mut c = ByteCursor::new(bytes);
            table.extend(c.read_u32_array::<LittleEndian>(bytes.len() / 4)?);
            if bytes.len() < self.header.sector_size {
                warn!("Table sector {:#x} is truncated", sector);
                break;
            }
        }

        Ok(table)
    }

    fn read_directory(&self) -> Result<Vec<Option<DirEntry>>, Error> {
        let mut entries = Vec::new();
        for sector in self.sector_chain(self.header.first_dir_sector) {
            let bytes = match self.sector(sector) {
                Some(bytes) => bytes,
                None => {
                    warn!("Directory sector {:#x} is not in the file", sector);
                    break;
                }
            };

            for raw in bytes.chunks_exact(DIR_ENTRY_SIZE) {
                entries.push(DirEntry::parse(raw)?);
            }
        }

        Ok(entries)
    }

    /// The FAT successor of `sector`; end-of-chain if the FAT has no entry
    /// for it.
    pub fn next_sector(&self, sector: u32) -> u32 {
        self.fat.get(sector as usize).copied().unwrap_or(ENDOFCHAIN)
    }

    /// The mini-FAT successor of `mini_sector`; end-of-chain if the mini-FAT
    /// has no entry for it.
    pub fn next_mini_sector(&self, mini_sector: u32) -> u32 {
        self.mini_fat
            .get(mini_sector as usize)
            .copied()
            .unwrap_or(ENDOFCHAIN)
    }

    /// Follow the FAT from `start` until end of chain.
    ///
    /// A chain cannot legitimately be longer than the FAT, so the walk stops
    /// there even if the FAT contains a cycle.
    pub fn sector_chain(&self, start: u32) -> Vec<u32> {
        walk_chain(start, self.fat.len(), |s| self.next_sector(s))
    }

    /// Follow the mini-FAT from `start` until end of chain.
    pub fn mini_sector_chain(&self, start: u32) -> Vec<u32> {
        walk_chain(start, self.mini_fat.len(), |s| self.next_mini_sector(s))
    }

    /// Translate a mini sector number into the big sector holding it and the
    /// byte offset within that big sector.
    ///
    /// The mini-stream is the root entry's content, so mini sector `n` is at
    /// byte `n * 64` of the root's chain: that many whole big sectors along
    /// the chain, plus the remainder.
    pub fn mini_sector_location(&self, mini_sector: u32) -> Option<(u32, usize)> {
        let offset = (mini_sector as usize).checked_mul(MINI_SECTOR_SIZE)?;
        let ss = self.header.sector_size;
        self.mini_stream_chain
            .get(offset / ss)
            .map(|&sector| (sector, offset % ss))
    }

    /// All directory slots, including `None` for unused ones.
    pub fn entries(&self) -> &[Option<DirEntry>] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&DirEntry> {
        self.entries.get(index).and_then(Option::as_ref)
    }

    /// The direct children of entry `index`.
    pub fn children(&self, index: usize) -> &[usize] {
        self.entry(index).map_or(&[], |e| &e.children[..])
    }

    pub fn root_folder(&self) -> Folder<'_, 'a> {
        Folder::new(self, 0)
    }

    /// A folder view of the storage at `index`, if it is one.
    pub fn folder(&self, index: usize) -> Option<Folder<'_, 'a>> {
        self.entry(index)
            .filter(|e| e.is_storage())
            .map(|_| Folder::new(self, index))
    }

    /// Read the full content of the stream at `index`.
    ///
    /// The root may also be read this way, yielding the raw mini-stream.
    pub fn read_stream(&self, index: usize) -> Result<Vec<u8>, Error> {
        match self.entry(index) {
            Some(entry) if EntryKind::Storage != entry.kind => {
                Ok(self.read_entry(entry))
            }
            _ => Err(Error::NotAStream(index)),
        }
    }

    /// Read the content of `entry`, choosing the allocation table by size.
    ///
    /// The result is shorter than `entry.size` if the chain ends early or
    /// runs outside the buffer.
    pub fn read_entry(&self, entry: &DirEntry) -> Vec<u8> {
        if 0 == entry.size {
            Vec::new()
        } else if EntryKind::Root != entry.kind
            && entry.size < MINI_STREAM_CUTOFF
        {
            self.read_mini_chain(entry.start_sector, entry.size as usize)
        } else {
            self.read_big_chain(entry.start_sector, entry.size as usize)
        }
    }

    fn read_big_chain(&self, start: u32, size: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(size.min(self.data.len()));
        for sector in self.sector_chain(start) {
            let remaining = size - out.len();
            if 0 == remaining {
                break;
            }

            let bytes = match self.sector(sector) {
                Some(bytes) => bytes,
                None => break,
            };
            out.extend_from_slice(&bytes[..remaining.min(bytes.len())]);
            if bytes.len() < self.header.sector_size {
                break;
            }
        }

        out
    }

    fn read_mini_chain(&self, start: u32, size: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(size);
        for mini_sector in self.mini_sector_chain(start) {
            let remaining = size - out.len();
            if 0 == remaining {
                break;
            }

            let piece = self.mini_sector_location(mini_sector).and_then(
                |(sector, within)| {
                    let bytes = self.sector(sector)?;
                    let end = (within + MINI_SECTOR_SIZE).min(bytes.len());
                    bytes.get(within..end)
                },
            );
            let piece = match piece {
                Some(piece) => piece,
                None => break,
            };

            out.extend_from_slice(&piece[..remaining.min(piece.len())]);
            if piece.len() < MINI_SECTOR_SIZE {
                break;
            }
        }

        out
    }
}

fn walk_chain(
    start: u32,
    table_len: usize,
    next: impl Fn(u32) -> u32,
) -> Vec<u32> {
    let mut chain = Vec::new();
    let mut current = start;
    while current <= MAXREGSECT && chain.len() <= table_len {
        chain.push(current);
        current = next(current);
    }

    chain
}

#[cfg(test)]
mod test {
    use byteorder::ByteOrder;
    use proptest::prelude::*;

    use super::*;
    use crate::cfb::header::{OFF_FAT_SECTOR_COUNT, OFF_SECTOR_SHIFT};
    use crate::cfb::writer::{Burner, Node};
    use crate::cfb::HEADER_SIZE;

    fn single_stream(len: usize, sector_size: usize) -> (Vec<u8>, Vec<u8>) {
        let content: Vec<u8> = (0..len).map(|i| (i * 7 + i / 251) as u8).collect();
        let image = Burner::with_sector_shift(sector_size.trailing_zeros() as u16)
            .unwrap()
            .burn(&[Node::bytes("data", content.clone())])
            .unwrap();
        (content, image)
    }

    fn stream_index(container: &Container<'_>, name: &str) -> usize {
        container
            .children(0)
            .iter()
            .copied()
            .find(|&ix| container.entry(ix).unwrap().name == name)
            .unwrap()
    }

    #[test]
    fn sector_boundary_sizes_read_back_exactly() {
        for &sector_size in &[512, 4096] {
            for &len in &[
                0usize, 1, 63, 64, 65, 511, 512, 513, 4095, 4096, 4097, 65537,
            ] {
                let (content, image) = single_stream(len, sector_size);
                let container = Container::parse(&image).unwrap();
                assert_eq!(sector_size, container.sector_size());

                let ix = stream_index(&container, "data");
                let read = container.read_stream(ix).unwrap();
                assert_eq!(
                    content, read,
                    "len {} sector size {}",
                    len, sector_size
                );
            }
        }
    }

    #[test]
    fn mini_sector_translation_crosses_big_sectors() {
        // Nine 64-byte mini sectors of content spread over two 512-byte
        // sectors of mini-stream.
        let (_, image) = single_stream(64 * 9, 512);
        let container = Container::parse(&image).unwrap();
        let root = container.entry(0).unwrap();
        let chain = container.sector_chain(root.start_sector);
        assert_eq!(2, chain.len());

        assert_eq!(Some((chain[0], 0)), container.mini_sector_location(0));
        assert_eq!(Some((chain[0], 64)), container.mini_sector_location(1));
        assert_eq!(Some((chain[0], 448)), container.mini_sector_location(7));
        assert_eq!(Some((chain[1], 0)), container.mini_sector_location(8));
        assert_eq!(None, container.mini_sector_location(16));
    }

    #[test]
    fn chains_and_sentinels() {
        let (_, image) = single_stream(2000, 512);
        let container = Container::parse(&image).unwrap();
        let ix = stream_index(&container, "data");
        let start = container.entry(ix).unwrap().start_sector;

        // 2000 bytes is 32 mini sectors, allocated consecutively
        let chain = container.mini_sector_chain(start);
        assert_eq!(32, chain.len());
        assert_eq!(ENDOFCHAIN, container.next_mini_sector(chain[31]));

        assert_eq!(ENDOFCHAIN, container.next_sector(1_000_000));
        assert_eq!(ENDOFCHAIN, container.next_mini_sector(1_000_000));
        assert!(container.sector_chain(ENDOFCHAIN).is_empty());
    }

    #[test]
    fn storages_are_not_streams() {
        let image = Burner::new()
            .burn(&[Node::storage("dir", vec![Node::bytes("f", vec![1])])])
            .unwrap();
        let container = Container::parse(&image).unwrap();
        let dir = stream_index(&container, "dir");
        assert_matches!(
            Err(Error::NotAStream(_)),
            container.read_stream(dir)
        );
        assert_matches!(
            Err(Error::NotAStream(999)),
            container.read_stream(999)
        );
    }

    #[test]
    fn root_must_be_first() {
        let (_, mut image) = single_stream(10, 512);
        let container = Container::parse(&image).unwrap();
        let dir_sector = container.header().first_dir_sector as usize;
        // Turn the root entry into a plain storage
        image[(dir_sector + 1) * 512 + 0x42] = 1;
        assert_matches!(Err(Error::NoRootEntry), Container::parse(&image));
    }

    #[test]
    fn unsupported_sector_size() {
        let (_, mut image) = single_stream(10, 512);
        LittleEndian::write_u16(&mut image[OFF_SECTOR_SHIFT..], 10);
        assert_matches!(
            Err(Error::UnsupportedSectorSize(10)),
            Container::parse(&image)
        );
    }

    #[test]
    fn fat_cycle_terminates() {
        let (content, mut image) = single_stream(5000, 512);
        let container = Container::parse(&image).unwrap();
        let ix = stream_index(&container, "data");
        let start = container.entry(ix).unwrap().start_sector;
        let fat_sector = container.header().difat[0] as usize;

        // Point the stream's second sector back at its first
        let second = container.next_sector(start) as usize;
        let off = (fat_sector + 1) * 512 + second * 4;
        LittleEndian::write_u32(&mut image[off..], start);

        let container = Container::parse(&image).unwrap();
        let read = container.read_stream(ix).unwrap();
        assert_eq!(5000, read.len());
        assert_eq!(&content[..1024], &read[..1024]);
        assert_eq!(&content[..512], &read[1024..1536]);
        assert!(container.sector_chain(start).len() <= container.fat.len() + 1);
    }

    #[test]
    fn missing_fat_degrades_to_short_reads() {
        let (content, image) = single_stream(20_000, 512);
        let container = Container::parse(&image).unwrap();
        let ix = stream_index(&container, "data");

        // With no FAT at all, every chain is a single sector long
        let mut no_fat = image.clone();
        LittleEndian::write_u32(&mut no_fat[OFF_FAT_SECTOR_COUNT..], 0);
        let damaged = Container::parse(&no_fat).unwrap();
        let read = damaged.read_stream(ix).unwrap();
        assert_eq!(&content[..512], &read[..]);
    }

    #[test]
    fn truncated_fat_degrades_to_short_reads() {
        let (content, image) = single_stream(20_000, 512);
        let container = Container::parse(&image).unwrap();
        let ix = stream_index(&container, "data");
        let fat_sector = container.header().difat[0] as usize;

        // The FAT is the last thing in the file; keep only its first 25
        // entries.
        let cut = &image[..(fat_sector + 1) * 512 + 100];
        let damaged = Container::parse(cut).unwrap();
        let read = damaged.read_stream(ix).unwrap();
        assert!(read.len() < content.len());
        assert!(!read.is_empty());
        assert_eq!(&content[..read.len()], &read[..]);
    }

    #[test]
    fn xbat_chain_for_large_files() {
        // Needs more FAT sectors than fit in the header
        let len = 7_500_000;
        let (content, image) = single_stream(len, 512);
        let container = Container::parse(&image).unwrap();
        assert!(container.header().fat_sector_count > DIFAT_IN_HEADER as u32);
        assert!(container.header().xbat_count > 0);

        let ix = stream_index(&container, "data");
        let read = container.read_stream(ix).unwrap();
        assert_eq!(content.len(), read.len());
        assert!(content == read);
    }

    #[test]
    fn short_header_is_error() {
        let (_, image) = single_stream(10, 512);
        assert_matches!(
            Err(Error::UnexpectedEnd),
            Container::parse(&image[..HEADER_SIZE - 1])
        );
    }

    #[test]
    fn unlinked_entries_are_placeholders() {
        let (_, image) = single_stream(10, 512);
        let container = Container::parse(&image).unwrap();
        // root + "data", the rest of the sector is unused slots
        assert_eq!(4, container.entries().len());
        assert_eq!(2, container.entries().iter().flatten().count());
        assert!(container.entries()[3].is_none());
        assert!(container.entry(3).is_none());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn parse_never_panics(
            tail in prop::collection::vec(prop::num::u8::ANY, 0..3000)
        ) {
            let (_, mut image) = single_stream(700, 512);
            let keep = HEADER_SIZE.min(image.len());
            image.truncate(keep);
            image.extend_from_slice(&tail);
            if let Ok(container) = Container::parse(&image) {
                for entry in container.entries().iter().flatten() {
                    prop_assert!(
                        container.read_entry(entry).len()
                            <= entry.size as usize
                    );
                }
            }
        }
    }
}
