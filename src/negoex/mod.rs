//! NEGOEX message model and per-category body decoders.
//!
//! Every NEGOEX message starts with the same 40-byte header. The body layout depends on the
//! message type, and variable-length data is referenced through [`Vector`]s whose offsets are
//! relative to the start of the message.

mod alert;
mod exchange;
pub mod fields;
mod header;
mod nego;
mod verify;

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;
use uuid::Uuid;

pub use self::alert::AlertBody;
pub(crate) use self::alert::decode_alert;
pub use self::exchange::ExchangeBody;
pub(crate) use self::exchange::decode_exchange;
pub use self::header::MessageHeader;
pub use self::nego::{Extension, NegoBody};
pub(crate) use self::nego::decode_nego;
pub use self::verify::{Checksum, VerifyBody};
pub(crate) use self::verify::decode_verify;

use self::fields::VectorFields;
use crate::sink::{ByteRange, FieldSink, FieldValue};
use crate::vector::{Vector, VECTOR_SIZE};
use crate::Error;

pub const SIGNATURE: [u8; 8] = *b"NEGOEXTS";
pub const HEADER_LEN: usize = 40;
pub const GUID_SIZE: usize = 16;
pub const RANDOM_SIZE: usize = 32;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
#[repr(u32)]
pub enum MessageType {
    InitiatorNego = 0,
    AcceptorNego = 1,
    InitiatorMetaData = 2,
    AcceptorMetaData = 3,
    Challenge = 4,
    ApRequest = 5,
    Verify = 6,
    Alert = 7,
}

/// Body layout shared by several message types.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MessageCategory {
    Nego,
    Exchange,
    Verify,
    Alert,
}

impl MessageType {
    pub const ALL: [MessageType; 8] = [
        MessageType::InitiatorNego,
        MessageType::AcceptorNego,
        MessageType::InitiatorMetaData,
        MessageType::AcceptorMetaData,
        MessageType::Challenge,
        MessageType::ApRequest,
        MessageType::Verify,
        MessageType::Alert,
    ];

    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::from_u32(raw)
    }

    pub fn name(self) -> &'static str {
        match self {
            MessageType::InitiatorNego => "INITIATOR_NEGO",
            MessageType::AcceptorNego => "ACCEPTOR_NEGO",
            MessageType::InitiatorMetaData => "INITIATOR_META_DATA",
            MessageType::AcceptorMetaData => "ACCEPTOR_META_DATA",
            MessageType::Challenge => "CHALLENGE",
            MessageType::ApRequest => "AP_REQUEST",
            MessageType::Verify => "VERIFY",
            MessageType::Alert => "ALERT",
        }
    }

    pub fn category(self) -> MessageCategory {
        match self {
            MessageType::InitiatorNego | MessageType::AcceptorNego => MessageCategory::Nego,
            MessageType::InitiatorMetaData
            | MessageType::AcceptorMetaData
            | MessageType::Challenge
            | MessageType::ApRequest => MessageCategory::Exchange,
            MessageType::Verify => MessageCategory::Verify,
            MessageType::Alert => MessageCategory::Alert,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
#[repr(u32)]
pub enum ChecksumScheme {
    Rfc3961 = 1,
}

impl ChecksumScheme {
    pub fn name(self) -> &'static str {
        match self {
            ChecksumScheme::Rfc3961 => "rfc3961",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody<'a> {
    Nego(NegoBody<'a>),
    Exchange(ExchangeBody<'a>),
    Verify(VerifyBody<'a>),
    Alert(AlertBody<'a>),
    /// Body of a message with an unknown type, kept as is.
    Unknown(&'a [u8]),
}

/// One decoded NEGOEX message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message<'a> {
    /// Offset of the message in the decoded buffer.
    pub offset: usize,
    pub header: MessageHeader,
    /// `None` if the body could not be decoded.
    pub body: Option<MessageBody<'a>>,
    /// Error that stopped the body decoding.
    pub error: Option<Error>,
}

impl Message<'_> {
    pub fn message_type(&self) -> Option<MessageType> {
        self.header.kind()
    }

    /// Type name, or `None` for unknown types.
    pub fn name(&self) -> Option<&'static str> {
        self.message_type().map(MessageType::name)
    }

    pub fn is_malformed(&self) -> bool {
        self.error.is_some()
    }
}

/// Emits the three descriptor fields of `vector` located at `at`.
pub(crate) fn emit_vector(sink: &mut dyn FieldSink, at: usize, vector: &Vector, fields: &VectorFields) {
    sink.emit_scalar(fields.offset, FieldValue::U32(vector.offset), ByteRange::new(at, 4));
    sink.emit_scalar(fields.count, FieldValue::U16(vector.count), ByteRange::new(at + 4, 2));
    sink.emit_scalar(fields.pad, FieldValue::bytes(&vector.pad), ByteRange::new(at + 6, 2));
}

pub(crate) fn emit_guid(sink: &mut dyn FieldSink, path: &'static str, guid: Uuid, at: usize) {
    sink.emit_scalar(path, FieldValue::Guid(guid), ByteRange::new(at, GUID_SIZE));
}

pub(crate) const fn vector_range(at: usize) -> ByteRange {
    ByteRange::new(at, VECTOR_SIZE)
}
