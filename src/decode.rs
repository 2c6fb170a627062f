use uuid::Uuid;

use crate::{ReadCursor, Result};

/// Fixed-layout record that can be decoded from a binary input.
pub trait Decode<'a>: Sized {
    /// Decodes a record from the start of a binary input.
    fn decode(src: &'a [u8]) -> Result<Self> {
        let mut cursor = ReadCursor::new(src);
        Self::decode_cursor(&mut cursor)
    }

    /// Decodes a record from a cursor.
    fn decode_cursor(src: &mut ReadCursor<'a>) -> Result<Self>;
}

/// NEGOEX GUIDs (auth schemes, conversation ids) are encoded in the mixed-endian Microsoft layout.
impl<'a> Decode<'a> for Uuid {
    fn decode_cursor(src: &mut ReadCursor<'a>) -> Result<Self> {
        Ok(Uuid::from_bytes_le(src.read_array::<16>()?))
    }
}

#[cfg(test)]
mod tests {
    use uuid::uuid;

    use super::*;

    #[test]
    fn decodes_mixed_endian_guid() {
        let raw = [
            0x5c, 0x33, 0x53, 0x0d, 0xea, 0xf9, 0x0d, 0x4d, 0xb2, 0xec, 0x4a, 0xe3, 0x78, 0x6e, 0xc3, 0x08,
        ];

        assert_eq!(
            Uuid::decode(&raw).unwrap(),
            uuid!("0d53335c-f9ea-4d0d-b2ec-4ae3786ec308")
        );
    }

    #[test]
    fn short_guid_is_out_of_bounds() {
        assert!(Uuid::decode(&[0u8; 15]).is_err());
    }
}
