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

//! Serialisation of a storage tree into a new compound file.
//!
//! The output is laid out in one pass, in this order: the header sector,
//! the content of every large stream, the mini-stream, the mini-FAT, the
//! directory, the FAT, and finally any extra DIFAT ("XBAT") sectors. The
//! header is filled in last since it points at all of the others.

use std::cmp::Ordering;
use std::convert::TryFrom;
use std::fmt;

use byteorder::LittleEndian;
use log::debug;

use super::directory::{EntryKind, NAME_UNITS};
use super::{
    DIFAT_IN_HEADER, DIFSECT, DIR_ENTRY_SIZE, ENDOFCHAIN, FATSECT, FREESECT,
    HEADER_SIZE, MAXREGSECT, MINI_SECTOR_SIZE, MINI_STREAM_CUTOFF, NOSTREAM,
    SIGNATURE,
};
use crate::support::cursor::ByteWriter;
use crate::support::error::Error;

const MINOR_VERSION: u16 = 0x003E;
const BYTE_ORDER_MARK: u16 = 0xFFFE;
const MINI_SECTOR_SHIFT: u16 = 6;
const COLOUR_BLACK: u8 = 1;
const ROOT_NAME: &str = "Root Entry";

/// What a `Node` is.
pub enum NodeKind<'a> {
    Storage(Vec<Node<'a>>),
    /// A stream whose content is produced on demand while burning.
    Stream(Box<dyn Fn() -> Vec<u8> + 'a>),
}

/// One named element of a tree to be burnt into a compound file.
pub struct Node<'a> {
    pub name: String,
    pub kind: NodeKind<'a>,
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            NodeKind::Storage(ref children) => f
                .debug_struct("Storage")
                .field("name", &self.name)
                .field("children", children)
                .finish(),
            NodeKind::Stream(_) => {
                f.debug_struct("Stream").field("name", &self.name).finish()
            }
        }
    }
}

impl<'a> Node<'a> {
    pub fn storage(name: impl Into<String>, children: Vec<Node<'a>>) -> Self {
        Node {
            name: name.into(),
            kind: NodeKind::Storage(children),
        }
    }

    pub fn stream(
        name: impl Into<String>,
        content: impl Fn() -> Vec<u8> + 'a,
    ) -> Self {
        Node {
            name: name.into(),
            kind: NodeKind::Stream(Box::new(content)),
        }
    }

    pub fn bytes(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self::stream(name, move || content.clone())
    }
}

/// Writes compound files.
#[derive(Clone, Copy, Debug)]
pub struct Burner {
    sector_shift: u16,
}

impl Default for Burner {
    fn default() -> Self {
        Burner { sector_shift: 9 }
    }
}

impl Burner {
    /// A burner producing version 3 files with 512-byte sectors.
    pub fn new() -> Self {
        Self::default()
    }

    /// A burner using `1 << shift` byte sectors. Only 9 (version 3) and 12
    /// (version 4) are valid.
    pub fn with_sector_shift(shift: u16) -> Result<Self, Error> {
        match shift {
            9 | 12 => Ok(Burner {
                sector_shift: shift,
            }),
            _ => Err(Error::UnsupportedSectorSize(shift)),
        }
    }

    fn sector_size(&self) -> usize {
        1 << self.sector_shift
    }

    /// Produce a complete compound file whose root storage contains `nodes`.
    pub fn burn(&self, nodes: &[Node<'_>]) -> Result<Vec<u8>, Error> {
        let ss = self.sector_size();

        let mut entries = vec![FlatEntry {
            name: ROOT_NAME.encode_utf16().collect(),
            kind: EntryKind::Root,
            data: Vec::new(),
            children: Vec::new(),
            start_sector: ENDOFCHAIN,
            size: 0,
        }];
        flatten(0, nodes, &mut entries)?;

        let mut output = vec![0u8; ss];
        let mut fat = Vec::<u32>::new();

        // Large streams go straight into big sectors; the rest are packed
        // into the mini-stream.
        let mut mini_stream = Vec::<u8>::new();
        let mut mini_fat = Vec::<u32>::new();
        for entry in &mut entries[1..] {
            if EntryKind::Stream != entry.kind || entry.data.is_empty() {
                continue;
            }

            entry.size = u32::try_from(entry.data.len())
                .map_err(|_| Error::TooLarge)?;
            entry.start_sector = if entry.size >= MINI_STREAM_CUTOFF {
                append_chain(&mut output, &mut fat, &entry.data, ss)
            } else {
                append_chain(
                    &mut mini_stream,
                    &mut mini_fat,
                    &entry.data,
                    MINI_SECTOR_SIZE,
                )
            };
            entry.data = Vec::new();
        }

        entries[0].start_sector =
            append_chain(&mut output, &mut fat, &mini_stream, ss);
        entries[0].size =
            u32::try_from(mini_stream.len()).map_err(|_| Error::TooLarge)?;

        let mini_fat_sectors = ceil_div(mini_fat.len() * 4, ss);
        mini_fat.resize(mini_fat_sectors * ss / 4, FREESECT);
        let mini_fat_start =
            append_chain(&mut output, &mut fat, &table_bytes(&mini_fat), ss);

        let directory = serialize_directory(&entries, ss);
        let dir_sectors = directory.len() / ss;
        let first_dir_sector =
            append_chain(&mut output, &mut fat, &directory, ss);

        let layout = FatLayout::compute(fat.len(), ss)?;
        let fat_start = u32::try_from(fat.len()).map_err(|_| Error::TooLarge)?;
        fat.extend((0..layout.fat_sectors).map(|_| FATSECT));
        fat.extend((0..layout.difat_sectors).map(|_| DIFSECT));
        fat.resize(layout.fat_sectors * ss / 4, FREESECT);
        output.extend_from_slice(&table_bytes(&fat));

        let fat_locations: Vec<u32> = (0..layout.fat_sectors as u32)
            .map(|i| fat_start + i)
            .collect();
        let difat_start = fat_start + layout.fat_sectors as u32;
        output.extend_from_slice(&difat_bytes(
            fat_locations.get(DIFAT_IN_HEADER..).unwrap_or(&[]),
            difat_start,
            layout.difat_sectors,
            ss,
        ));

        let header = HeaderFields {
            sector_shift: self.sector_shift,
            dir_sectors: dir_sectors as u32,
            fat_sectors: layout.fat_sectors as u32,
            first_dir_sector,
            mini_fat_start,
            mini_fat_sectors: mini_fat_sectors as u32,
            difat_start: if 0 == layout.difat_sectors {
                ENDOFCHAIN
            } else {
                difat_start
            },
            difat_sectors: layout.difat_sectors as u32,
            fat_locations: &fat_locations,
        }
        .serialize();
        output[..HEADER_SIZE].copy_from_slice(&header);

        debug!(
            "Burnt compound file: {} bytes, {} entries, {} FAT sectors, \
             {} DIFAT sectors, {} mini-stream bytes",
            output.len(),
            entries.len(),
            layout.fat_sectors,
            layout.difat_sectors,
            mini_stream.len(),
        );

        Ok(output)
    }
}

struct FlatEntry {
    name: Vec<u16>,
    kind: EntryKind,
    data: Vec<u8>,
    children: Vec<usize>,
    start_sector: u32,
    size: u32,
}

/// Append `nodes` and all their descendants to `entries` as children of
/// `parent`, in directory order.
fn flatten(
    parent: usize,
    nodes: &[Node<'_>],
    entries: &mut Vec<FlatEntry>,
) -> Result<(), Error> {
    let mut sorted: Vec<&Node<'_>> = nodes.iter().collect();
    sorted.sort_by(|a, b| compare_names(&a.name, &b.name));

    for node in sorted {
        let name: Vec<u16> = node.name.encode_utf16().collect();
        if name.len() >= NAME_UNITS {
            return Err(Error::NameTooLong(node.name.clone()));
        }

        let index = entries.len();
        entries[parent].children.push(index);
        match node.kind {
            NodeKind::Stream(ref content) => {
                entries.push(FlatEntry {
                    name,
                    kind: EntryKind::Stream,
                    data: content(),
                    children: Vec::new(),
                    start_sector: ENDOFCHAIN,
                    size: 0,
                });
            }
            NodeKind::Storage(ref children) => {
                entries.push(FlatEntry {
                    name,
                    kind: EntryKind::Storage,
                    data: Vec::new(),
                    children: Vec::new(),
                    start_sector: 0,
                    size: 0,
                });
                flatten(index, children, entries)?;
            }
        }
    }

    Ok(())
}

/// The directory ordering: shorter names first, then by upper-cased UTF-16
/// code units.
fn compare_names(a: &str, b: &str) -> Ordering {
    let a_len = a.encode_utf16().count();
    let b_len = b.encode_utf16().count();
    a_len.cmp(&b_len).then_with(|| {
        a.to_uppercase()
            .encode_utf16()
            .cmp(b.to_uppercase().encode_utf16())
    })
}

/// Write `data` as a fresh chain of `unit`-sized sectors at the end of
/// `output`, recording the chain in `table`.
///
/// `table` must have exactly one entry per sector already in `output`
/// (excluding the header sector). Returns the first sector of the chain, or
/// end-of-chain if `data` is empty.
fn append_chain(
    output: &mut Vec<u8>,
    table: &mut Vec<u32>,
    data: &[u8],
    unit: usize,
) -> u32 {
    if data.is_empty() {
        return ENDOFCHAIN;
    }

    let start = table.len() as u32;
    let count = ceil_div(data.len(), unit);
    output.extend_from_slice(data);
    output.resize(output.len() + count * unit - data.len(), 0);
    for i in 1..count as u32 {
        table.push(start + i);
    }
    table.push(ENDOFCHAIN);
    start
}

/// Thread each storage's children into a right-leaning chain in directory
/// order. This is a valid (if unbalanced) binary search tree when every node
/// is black.
fn right_siblings(entries: &[FlatEntry]) -> Vec<u32> {
    let mut links = vec![NOSTREAM; entries.len()];
    for entry in entries {
        for pair in entry.children.windows(2) {
            links[pair[0]] = pair[1] as u32;
        }
    }
    links
}

fn serialize_directory(entries: &[FlatEntry], ss: usize) -> Vec<u8> {
    let right_siblings = right_siblings(entries);
    let mut w = ByteWriter::with_capacity(entries.len() * DIR_ENTRY_SIZE);
    for (entry, &right) in entries.iter().zip(&right_siblings) {
        let child = entry.children.first().map_or(NOSTREAM, |&c| c as u32);
        for &unit in &entry.name {
            w.write_u16::<LittleEndian>(unit);
        }
        w.fill(0, (NAME_UNITS - entry.name.len()) * 2);
        w.write_u16::<LittleEndian>((entry.name.len() as u16 + 1) * 2);
        w.write_u8(entry.kind.type_byte());
        w.write_u8(COLOUR_BLACK);
        w.write_u32::<LittleEndian>(NOSTREAM);
        w.write_u32::<LittleEndian>(right);
        w.write_u32::<LittleEndian>(child);
        // CLSID, state bits, creation and modification times
        w.fill(0, 36);
        w.write_u32::<LittleEndian>(entry.start_sector);
        w.write_u32::<LittleEndian>(entry.size);
        w.write_u32::<LittleEndian>(0);
    }

    let per_sector = ss / DIR_ENTRY_SIZE;
    let unused = (per_sector - entries.len() % per_sector) % per_sector;
    for _ in 0..unused {
        w.fill(0, 0x44);
        w.write_u32::<LittleEndian>(NOSTREAM);
        w.write_u32::<LittleEndian>(NOSTREAM);
        w.write_u32::<LittleEndian>(NOSTREAM);
        w.fill(0, DIR_ENTRY_SIZE - 0x50);
    }

    w.finish()
}

fn table_bytes(table: &[u32]) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(table.len() * 4);
    for &e in table {
        w.write_u32::<LittleEndian>(e);
    }
    w.finish()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FatLayout {
    fat_sectors: usize,
    difat_sectors: usize,
}

impl FatLayout {
    /// Find how many FAT and DIFAT sectors are needed to describe
    /// `content_sectors` other sectors plus themselves.
    fn compute(content_sectors: usize, ss: usize) -> Result<Self, Error> {
        let per_fat = ss / 4;
        let per_difat = per_fat - 1;
        let mut layout = FatLayout {
            fat_sectors: 0,
            difat_sectors: 0,
        };

        // Each step can only grow the counts, and they are bounded, so this
        // settles after a few rounds.
        loop {
            let total =
                content_sectors + layout.fat_sectors + layout.difat_sectors;
            let fat_sectors = ceil_div(total, per_fat);
            let difat_sectors = ceil_div(
                fat_sectors.saturating_sub(DIFAT_IN_HEADER),
                per_difat,
            );
            let next = FatLayout {
                fat_sectors,
                difat_sectors,
            };
            if next == layout {
                break;
            }
            layout = next;
        }

        let total = content_sectors + layout.fat_sectors + layout.difat_sectors;
        if total > MAXREGSECT as usize {
            return Err(Error::TooLarge);
        }

        Ok(layout)
    }
}

/// Build the DIFAT sectors listing `fat_locations`, which are the FAT
/// sectors that did not fit in the header.
fn difat_bytes(
    fat_locations: &[u32],
    first_sector: u32,
    count: usize,
    ss: usize,
) -> Vec<u8> {
    let per_difat = ss / 4 - 1;
    let mut w = ByteWriter::with_capacity(count * ss);
    for i in 0..count {
        for j in 0..per_difat {
            let location = fat_locations
                .get(i * per_difat + j)
                .copied()
                .unwrap_or(FREESECT);
            w.write_u32::<LittleEndian>(location);
        }

        let next = if i + 1 == count {
            ENDOFCHAIN
        } else {
            first_sector + i as u32 + 1
        };
        w.write_u32::<LittleEndian>(next);
    }
    w.finish()
}

struct HeaderFields<'a> {
    sector_shift: u16,
    dir_sectors: u32,
    fat_sectors: u32,
    first_dir_sector: u32,
    mini_fat_start: u32,
    mini_fat_sectors: u32,
    difat_start: u32,
    difat_sectors: u32,
    fat_locations: &'a [u32],
}

impl HeaderFields<'_> {
    fn serialize(&self) -> Vec<u8> {
        let v4 = 12 == self.sector_shift;
        let mut w = ByteWriter::with_capacity(HEADER_SIZE);
        w.write_bytes(&SIGNATURE);
        w.fill(0, 16);
        w.write_u16::<LittleEndian>(MINOR_VERSION);
        w.write_u16::<LittleEndian>(if v4 { 4 } else { 3 });
        w.write_u16::<LittleEndian>(BYTE_ORDER_MARK);
        w.write_u16::<LittleEndian>(self.sector_shift);
        w.write_u16::<LittleEndian>(MINI_SECTOR_SHIFT);
        w.fill(0, 6);
        // Version 3 files must leave the directory sector count zero
        w.write_u32::<LittleEndian>(if v4 { self.dir_sectors } else { 0 });
        w.write_u32::<LittleEndian>(self.fat_sectors);
        w.write_u32::<LittleEndian>(self.first_dir_sector);
        w.write_u32::<LittleEndian>(0);
        w.write_u32::<LittleEndian>(MINI_STREAM_CUTOFF);
        w.write_u32::<LittleEndian>(self.mini_fat_start);
        w.write_u32::<LittleEndian>(self.mini_fat_sectors);
        w.write_u32::<LittleEndian>(self.difat_start);
        w.write_u32::<LittleEndian>(self.difat_sectors);
        for i in 0..DIFAT_IN_HEADER {
            w.write_u32::<LittleEndian>(
                self.fat_locations.get(i).copied().unwrap_or(FREESECT),
            );
        }
        w.finish()
    }
}

fn ceil_div(a: usize, b: usize) -> usize {
    (a + b - 1) / b
}
