use std::borrow::Cow;

use uuid::Uuid;

use super::{fields, MessageType, HEADER_LEN, SIGNATURE};
use crate::cursor::{ReadCursor, WriteCursor};
use crate::decode::Decode;
use crate::sink::{ByteRange, FieldSink, FieldValue};
use crate::Result;

/// Fixed 40-byte header shared by all NEGOEX messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageHeader {
    pub signature: [u8; 8],
    /// Raw message type. See [`MessageHeader::kind`].
    pub message_type: u32,
    pub sequence_number: u32,
    pub header_length: u32,
    /// Total length of the message, header included.
    pub message_length: u32,
    pub conversation_id: Uuid,
}

impl MessageHeader {
    pub fn new(message_type: MessageType, sequence_number: u32, message_length: u32, conversation_id: Uuid) -> Self {
        Self {
            signature: SIGNATURE,
            message_type: message_type as u32,
            sequence_number,
            header_length: HEADER_LEN as u32,
            message_length,
            conversation_id,
        }
    }

    /// Known message type, or `None` if the raw value is out of range.
    pub fn kind(&self) -> Option<MessageType> {
        MessageType::from_raw(self.message_type)
    }

    pub fn has_valid_signature(&self) -> bool {
        self.signature == SIGNATURE
    }

    /// The signature as ASCII text, non-ASCII bytes shown as `?`.
    pub fn signature_text(&self) -> Cow<'_, str> {
        ReadCursor::new(&self.signature)
            .read_fixed_ascii(SIGNATURE.len())
            .unwrap_or_default()
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0; HEADER_LEN];
        let mut dst = WriteCursor::new(&mut buf);

        dst.write_slice(&self.signature);
        dst.write_u32(self.message_type);
        dst.write_u32(self.sequence_number);
        dst.write_u32(self.header_length);
        dst.write_u32(self.message_length);
        dst.write_slice(&self.conversation_id.to_bytes_le());

        buf
    }

    /// Emits the header fields, `at` being the offset of the header in the sink's coordinates.
    pub(crate) fn emit(&self, sink: &mut dyn FieldSink, at: usize) {
        sink.emit_scalar(
            fields::SIGNATURE,
            FieldValue::Text(self.signature_text()),
            ByteRange::new(at, 8),
        );
        sink.emit_scalar(
            fields::MESSAGE_TYPE,
            FieldValue::Enum {
                value: self.message_type,
                name: self.kind().map(MessageType::name),
            },
            ByteRange::new(at + 8, 4),
        );
        sink.emit_scalar(
            fields::SEQUENCE_NUM,
            FieldValue::U32(self.sequence_number),
            ByteRange::new(at + 12, 4),
        );
        sink.emit_scalar(
            fields::HEADER_LEN,
            FieldValue::U32(self.header_length),
            ByteRange::new(at + 16, 4),
        );
        sink.emit_scalar(
            fields::MESSAGE_LEN,
            FieldValue::U32(self.message_length),
            ByteRange::new(at + 20, 4),
        );
        sink.emit_scalar(
            fields::CONVERSATION_ID,
            FieldValue::Guid(self.conversation_id),
            ByteRange::new(at + 24, 16),
        );
    }
}

impl<'a> Decode<'a> for MessageHeader {
    fn decode_cursor(src: &mut ReadCursor<'a>) -> Result<Self> {
        ensure_size!(in: src, size: HEADER_LEN);

        Ok(Self {
            signature: src.read_array::<8>()?,
            message_type: src.read_u32()?,
            sequence_number: src.read_u32()?,
            header_length: src.read_u32()?,
            message_length: src.read_u32()?,
            conversation_id: Uuid::decode_cursor(src)?,
        })
    }
}
