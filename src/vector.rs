//! NEGOEX vectors: inline `(offset, count)` descriptors pointing at variable-length data
//! elsewhere in the same message.
//!
//! Reading a descriptor and validating the span it references are two separate steps, so a
//! malformed vector does not prevent decoding of its sibling fields.

use core::ops::Range;

use crate::cursor::{ReadCursor, WriteCursor};
use crate::decode::Decode;
use crate::{Error, Result};

/// Size of an encoded vector descriptor: offset (4), count (2), padding (2).
pub const VECTOR_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Vector {
    /// Offset of the first element, relative to the start of the message.
    pub offset: u32,
    /// Number of elements.
    pub count: u16,
    /// Reserved bytes. Read but never checked.
    pub pad: [u8; 2],
}

impl Vector {
    /// Byte span referenced by this vector, or `None` on arithmetic overflow.
    pub fn span(&self, element_size: usize) -> Option<Range<usize>> {
        let start = usize::try_from(self.offset).ok()?;
        let len = usize::from(self.count).checked_mul(element_size)?;

        Some(start..start.checked_add(len)?)
    }

    /// Checks the referenced span against the captured buffer length and returns it.
    pub fn validate(&self, buffer_len: usize, element_size: usize) -> Result<Range<usize>> {
        validate(buffer_len, self.offset, self.count, element_size)
    }

    pub fn to_bytes(&self) -> [u8; VECTOR_SIZE] {
        let mut buf = [0; VECTOR_SIZE];
        let mut dst = WriteCursor::new(&mut buf);

        dst.write_u32(self.offset);
        dst.write_u16(self.count);
        dst.write_slice(&self.pad);

        buf
    }
}

impl<'a> Decode<'a> for Vector {
    fn decode_cursor(src: &mut ReadCursor<'a>) -> Result<Self> {
        ensure_size!(in: src, size: VECTOR_SIZE);

        Ok(Self {
            offset: src.read_u32()?,
            count: src.read_u16()?,
            pad: src.read_array::<2>()?,
        })
    }
}

/// Reads the 8-byte vector descriptor located at `at_offset`.
///
/// Only the descriptor itself is bounds-checked; the referenced span is checked by [`validate`].
pub fn resolve_vector(buffer: &[u8], at_offset: usize) -> Result<Vector> {
    Vector::decode_cursor(&mut ReadCursor::at(buffer, at_offset))
}

/// Fails with [`Error::VectorOutOfRange`] if `count` elements of `element_size` bytes starting at
/// `referenced_offset` would read past `buffer_len`.
pub fn validate(buffer_len: usize, referenced_offset: u32, count: u16, element_size: usize) -> Result<Range<usize>> {
    let vector = Vector {
        offset: referenced_offset,
        count,
        pad: [0; 2],
    };

    match vector.span(element_size) {
        Some(span) if span.end <= buffer_len => Ok(span),
        _ => Err(Error::VectorOutOfRange {
            offset: referenced_offset,
            count,
            element_size,
            buffer_len,
        }),
    }
}
