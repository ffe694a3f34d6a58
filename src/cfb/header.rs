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

use byteorder::LittleEndian;

use super::{is_container_file, DIFAT_IN_HEADER, HEADER_SIZE};
use crate::support::cursor::ByteCursor;
use crate::support::error::Error;

pub const OFF_MINOR_VERSION: usize = 0x18;
pub const OFF_MAJOR_VERSION: usize = 0x1A;
pub const OFF_BYTE_ORDER: usize = 0x1C;
pub const OFF_SECTOR_SHIFT: usize = 0x1E;
pub const OFF_MINI_SECTOR_SHIFT: usize = 0x20;
pub const OFF_DIR_SECTOR_COUNT: usize = 0x28;
pub const OFF_FAT_SECTOR_COUNT: usize = 0x2C;
pub const OFF_FIRST_DIR_SECTOR: usize = 0x30;
pub const OFF_MINI_STREAM_CUTOFF: usize = 0x38;
pub const OFF_MINI_FAT_START: usize = 0x3C;
pub const OFF_MINI_FAT_COUNT: usize = 0x40;
pub const OFF_XBAT_START: usize = 0x44;
pub const OFF_XBAT_COUNT: usize = 0x48;
pub const OFF_DIFAT: usize = 0x4C;

/// The fields of the compound file header that reading needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    /// 512 or 4096.
    pub sector_size: usize,
    pub fat_sector_count: u32,
    pub first_dir_sector: u32,
    pub mini_fat_start: u32,
    pub mini_fat_count: u32,
    /// First sector of the extended FAT location chain ("XBAT"/DIFAT).
    pub xbat_start: u32,
    pub xbat_count: u32,
    /// The FAT sector locations embedded in the header.
    pub difat: Vec<u32>,
}

impl Header {
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        if !is_container_file(data) {
            return Err(Error::NotCompoundFile);
        }

        if data.len() < HEADER_SIZE {
            return Err(Error::UnexpectedEnd);
        }

        let mut c = ByteCursor::new(&data[..HEADER_SIZE]);
        c.seek(OFF_SECTOR_SHIFT);
        let sector_size = match c.read_u16::<LittleEndian>()? {
            9 => 512,
            12 => 4096,
            shift => return Err(Error::UnsupportedSectorSize(shift)),
        };

        c.seek(OFF_FAT_SECTOR_COUNT);
        let fat_sector_count = c.read_u32::<LittleEndian>()?;
        let first_dir_sector = c.read_u32::<LittleEndian>()?;
        c.seek(OFF_MINI_FAT_START);
        let mini_fat_start = c.read_u32::<LittleEndian>()?;
        let mini_fat_count = c.read_u32::<LittleEndian>()?;
        let xbat_start = c.read_u32::<LittleEndian>()?;
        let xbat_count = c.read_u32::<LittleEndian>()?;
        let difat = c.read_u32_array::<LittleEndian>(DIFAT_IN_HEADER)?;

        Ok(Header {
            sector_size,
            fat_sector_count,
            first_dir_sector,
            mini_fat_start,
            mini_fat_count,
            xbat_start,
            xbat_count,
            difat,
        })
    }
}

#[cfg(test)]
mod test {
    use byteorder::ByteOrder;

    use super::*;
    use crate::cfb::{ENDOFCHAIN, FREESECT, SIGNATURE};

    fn blank_header(shift: u16) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_SIZE];
        data[..8].copy_from_slice(&SIGNATURE);
        LittleEndian::write_u16(&mut data[OFF_SECTOR_SHIFT..], shift);
        LittleEndian::write_u32(&mut data[OFF_FAT_SECTOR_COUNT..], 1);
        LittleEndian::write_u32(&mut data[OFF_FIRST_DIR_SECTOR..], 1);
        LittleEndian::write_u32(&mut data[OFF_MINI_FAT_START..], ENDOFCHAIN);
        LittleEndian::write_u32(&mut data[OFF_XBAT_START..], ENDOFCHAIN);
        for i in 0..DIFAT_IN_HEADER {
            LittleEndian::write_u32(&mut data[OFF_DIFAT + i * 4..], FREESECT);
        }
        LittleEndian::write_u32(&mut data[OFF_DIFAT..], 0);
        data
    }

    #[test]
    fn parse_fields() {
        let header = Header::parse(&blank_header(9)).unwrap();
        assert_eq!(512, header.sector_size);
        assert_eq!(1, header.fat_sector_count);
        assert_eq!(1, header.first_dir_sector);
        assert_eq!(ENDOFCHAIN, header.mini_fat_start);
        assert_eq!(0, header.mini_fat_count);
        assert_eq!(ENDOFCHAIN, header.xbat_start);
        assert_eq!(DIFAT_IN_HEADER, header.difat.len());
        assert_eq!(0, header.difat[0]);
        assert_eq!(FREESECT, header.difat[1]);

        assert_eq!(4096, Header::parse(&blank_header(12)).unwrap().sector_size);
    }

    #[test]
    fn rejects_bad_headers() {
        assert_matches!(
            Err(Error::UnsupportedSectorSize(10)),
            Header::parse(&blank_header(10))
        );
        assert_matches!(
            Err(Error::NotCompoundFile),
            Header::parse(&[0u8; HEADER_SIZE])
        );
        assert_matches!(
            Err(Error::UnexpectedEnd),
            Header::parse(&blank_header(9)[..100])
        );
    }
}
