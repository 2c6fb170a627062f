//! Split implementation of a [`ReadCursor`] and [`WriteCursor`].

use std::borrow::Cow;

use crate::{Error, Result};

/// ReadCursor is a wrapper around `&[u8]` and its purpose is to:
///
/// * Provide convenient methods such as [read_u16][`ReadCursor::read_u16`], [read_u32][`ReadCursor::read_u32`], etc.
/// * Guarantee that every read is exact-length or fails with [`Error::OutOfBounds`]: no panics, no truncation.
/// * Keep track of the current offset, which may start anywhere with [at][`ReadCursor::at`].
#[derive(Debug, Clone)]
pub struct ReadCursor<'a> {
    inner: &'a [u8],
    pos: usize,
}

impl<'a> ReadCursor<'a> {
    /// Creates a new cursor wrapping the provided underlying in-memory buffer.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { inner: bytes, pos: 0 }
    }

    /// Creates a new cursor positioned at `pos`.
    ///
    /// `pos` may point past the end of the buffer, in which case every read fails.
    pub fn at(bytes: &'a [u8], pos: usize) -> Self {
        Self { inner: bytes, pos }
    }

    /// Returns the size of the remaining bytes.
    pub fn len(&self) -> usize {
        self.inner.len().saturating_sub(self.pos)
    }

    /// Returns `true` if there are no bytes left.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the remaining bytes.
    pub fn remaining(&self) -> &'a [u8] {
        let idx = core::cmp::min(self.pos, self.inner.len());
        &self.inner[idx..]
    }

    /// Returns the current position in the wrapped buffer.
    pub fn pos(&self) -> usize {
        self.pos
    }

    fn check(&self, needed: usize) -> Result<()> {
        let available = self.len();

        // a cursor past the end fails even zero-length reads
        if available < needed || self.pos > self.inner.len() {
            return Err(Error::OutOfBounds {
                offset: self.pos,
                needed,
                available,
            });
        }

        Ok(())
    }

    /// Reads `N` bytes from the underlying in-memory buffer.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut array = [0; N];
        array.copy_from_slice(self.read_slice(N)?);

        Ok(array)
    }

    /// Reads `n` bytes from the underlying in-memory buffer without copying them.
    pub fn read_slice(&mut self, n: usize) -> Result<&'a [u8]> {
        self.check(n)?;

        let bytes = &self.inner[self.pos..self.pos + n];
        self.pos += n;

        Ok(bytes)
    }

    /// Reads the remaining of the underlying in-memory buffer.
    pub fn read_remaining(&mut self) -> &'a [u8] {
        let bytes = self.remaining();
        self.pos = core::cmp::max(self.pos, self.inner.len());

        bytes
    }

    /// Reads `n` bytes and interprets them as an ASCII string. Non-ASCII bytes are replaced.
    pub fn read_fixed_ascii(&mut self, n: usize) -> Result<Cow<'a, str>> {
        let bytes = self.read_slice(n)?;

        if bytes.is_ascii() {
            Ok(String::from_utf8_lossy(bytes))
        } else {
            Ok(Cow::Owned(
                bytes
                    .iter()
                    .map(|&byte| if byte.is_ascii() { char::from(byte) } else { '?' })
                    .collect(),
            ))
        }
    }

    /// Reads 16-bits LE-encoded unsigned integer from the underlying in-memory buffer.
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array::<2>()?))
    }

    /// Reads 32-bits LE-encoded unsigned integer from the underlying in-memory buffer.
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array::<4>()?))
    }

    /// Reads 64-bits LE-encoded unsigned integer from the underlying in-memory buffer.
    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array::<8>()?))
    }
}

/// WriteCursor is a wrapper around `&mut [u8]` used to re-encode fixed-size structures.
///
/// Writes are infallible: callers size the destination from the structure they encode.
#[derive(Debug)]
pub struct WriteCursor<'a> {
    inner: &'a mut [u8],
    pos: usize,
}

impl<'a> WriteCursor<'a> {
    /// Creates a new cursor wrapping the provided the underlying in-memory buffer.
    pub fn new(bytes: &'a mut [u8]) -> Self {
        Self { inner: bytes, pos: 0 }
    }

    /// Returns the current position in the wrapped buffer.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Writes a given slice of bytes into the underlying in-memory buffer.
    ///
    /// # Panics
    ///
    /// Panics on out-of-bounds access.
    #[track_caller]
    pub fn write_slice(&mut self, slice: &[u8]) {
        let n = slice.len();
        self.inner[self.pos..self.pos + n].copy_from_slice(slice);
        self.pos += n;
    }

    /// Writes 16-bits LE-encoded unsigned integer into the underlying in-memory buffer.
    #[track_caller]
    pub fn write_u16(&mut self, value: u16) {
        self.write_slice(&value.to_le_bytes())
    }

    /// Writes 32-bits LE-encoded unsigned integer into the underlying in-memory buffer.
    #[track_caller]
    pub fn write_u32(&mut self, value: u32) {
        self.write_slice(&value.to_le_bytes())
    }

    /// Writes 64-bits LE-encoded unsigned integer into the underlying in-memory buffer.
    #[track_caller]
    pub fn write_u64(&mut self, value: u64) {
        self.write_slice(&value.to_le_bytes())
    }
}
