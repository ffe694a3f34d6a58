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

//! Seekable binary cursors over in-memory buffers.
//!
//! Everything in the compound file and MAPI formats is little-endian, but the
//! byte order is a type parameter (as with `byteorder`'s own traits) so that
//! callers spell it out at each read.

use byteorder::ByteOrder;
use encoding_rs::Encoding;

use super::codepage::decode_ansi;
use super::error::Error;

/// A read cursor over a borrowed byte slice.
///
/// Reads never panic; running off the end of the buffer produces
/// `Error::UnexpectedEnd` and leaves the position unchanged.
#[derive(Clone, Debug)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ByteCursor { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Move to `pos`, clamped to `[0, len]`.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    pub fn skip(&mut self, n: usize) -> Result<(), Error> {
        self.read_bytes(n).map(|_| ())
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], Error> {
        if n > self.remaining() {
            return Err(Error::UnexpectedEnd);
        }

        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16<E: ByteOrder>(&mut self) -> Result<u16, Error> {
        Ok(E::read_u16(self.read_bytes(2)?))
    }

    pub fn read_i16<E: ByteOrder>(&mut self) -> Result<i16, Error> {
        Ok(E::read_i16(self.read_bytes(2)?))
    }

    pub fn read_u32<E: ByteOrder>(&mut self) -> Result<u32, Error> {
        Ok(E::read_u32(self.read_bytes(4)?))
    }

    pub fn read_i32<E: ByteOrder>(&mut self) -> Result<i32, Error> {
        Ok(E::read_i32(self.read_bytes(4)?))
    }

    pub fn read_u64<E: ByteOrder>(&mut self) -> Result<u64, Error> {
        Ok(E::read_u64(self.read_bytes(8)?))
    }

    /// Read `count` consecutive `u32`s.
    ///
    /// The whole array must be present; a short buffer fails without
    /// consuming anything.
    pub fn read_u32_array<E: ByteOrder>(
        &mut self,
        count: usize,
    ) -> Result<Vec<u32>, Error> {
        let byte_len = count.checked_mul(4).ok_or(Error::UnexpectedEnd)?;
        let bytes = self.read_bytes(byte_len)?;
        let mut out = vec![0u32; count];
        E::read_u32_into(bytes, &mut out);
        Ok(out)
    }

    /// Read `byte_len` bytes of text in the given single- or multi-byte
    /// encoding, dropping any trailing NULs.
    pub fn read_fixed_string(
        &mut self,
        byte_len: usize,
        encoding: &'static Encoding,
    ) -> Result<String, Error> {
        Ok(decode_ansi(self.read_bytes(byte_len)?, encoding))
    }

    /// Read `char_count` UTF-16LE code units as text, dropping any trailing
    /// NULs.
    pub fn read_utf16_string(
        &mut self,
        char_count: usize,
    ) -> Result<String, Error> {
        let byte_len =
            char_count.checked_mul(2).ok_or(Error::UnexpectedEnd)?;
        Ok(decode_utf16le(self.read_bytes(byte_len)?))
    }
}

/// Decode UTF-16LE bytes, dropping trailing NULs and any odd final byte.
pub fn decode_utf16le(bytes: &[u8]) -> String {
    let mut units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    while units.last() == Some(&0) {
        units.pop();
    }
    String::from_utf16_lossy(&units)
}

/// A write cursor over a growable buffer.
///
/// Writing past the end grows the backing storage geometrically; `finish()`
/// trims it back to the furthest byte actually written.
#[derive(Clone, Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
    pos: usize,
    len: usize,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ByteWriter {
            buf: vec![0; capacity],
            pos: 0,
            len: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        0 == self.len
    }

    /// Move to `pos`, clamped to the logical length.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.len);
    }

    fn make_room(&mut self, n: usize) -> &mut [u8] {
        let end = self.pos + n;
        if end > self.buf.len() {
            let mut capacity = self.buf.len().max(64);
            while capacity < end {
                capacity *= 2;
            }
            self.buf.resize(capacity, 0);
        }

        let start = self.pos;
        self.pos = end;
        self.len = self.len.max(end);
        &mut self.buf[start..end]
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.make_room(bytes.len()).copy_from_slice(bytes);
    }

    /// Write `n` copies of `byte`.
    pub fn fill(&mut self, byte: u8, n: usize) {
        for b in self.make_room(n) {
            *b = byte;
        }
    }

    pub fn write_u8(&mut self, v: u8) {
        self.make_room(1)[0] = v;
    }

    pub fn write_u16<E: ByteOrder>(&mut self, v: u16) {
        E::write_u16(self.make_room(2), v);
    }

    pub fn write_u32<E: ByteOrder>(&mut self, v: u32) {
        E::write_u32(self.make_room(4), v);
    }

    pub fn write_i32<E: ByteOrder>(&mut self, v: i32) {
        E::write_i32(self.make_room(4), v);
    }

    pub fn write_u64<E: ByteOrder>(&mut self, v: u64) {
        E::write_u64(self.make_room(8), v);
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.buf.truncate(self.len);
        self.buf
    }
}
