use num_traits::FromPrimitive;
use uuid::Uuid;

use super::fields::{self, CHECKSUM_VECTOR};
use super::{emit_guid, emit_vector, vector_range, ChecksumScheme, HEADER_LEN};
use crate::cursor::ReadCursor;
use crate::decode::Decode;
use crate::sink::{subtree, within, ByteRange, FieldSink, FieldValue};
use crate::vector::{Vector, VECTOR_SIZE};
use crate::Result;

/// Size of the checksum structure: header length, scheme, type and the checksum vector.
const CHECKSUM_SIZE: usize = 12 + VECTOR_SIZE;

/// VERIFY body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyBody<'a> {
    pub auth_scheme: Uuid,
    pub checksum: Checksum<'a>,
}

/// Location of a checksum. The checksum value is never validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum<'a> {
    pub header_length: u32,
    /// Raw checksum scheme. See [`Checksum::scheme_kind`].
    pub scheme: u32,
    pub checksum_type: u32,
    pub vector: Vector,
    pub value: &'a [u8],
}

impl Checksum<'_> {
    pub fn scheme_kind(&self) -> Option<ChecksumScheme> {
        ChecksumScheme::from_u32(self.scheme)
    }
}

pub(crate) fn decode_verify<'a>(view: &'a [u8], sink: &mut dyn FieldSink) -> Result<VerifyBody<'a>> {
    let mut src = ReadCursor::at(view, HEADER_LEN);

    let auth_scheme_at = src.pos();
    let auth_scheme = Uuid::decode_cursor(&mut src)?;
    emit_guid(sink, fields::AUTH_SCHEME, auth_scheme, auth_scheme_at);

    let checksum_at = src.pos();
    let checksum = subtree(
        sink,
        "Checksum".to_owned(),
        ByteRange::new(checksum_at, CHECKSUM_SIZE),
        |sink| decode_checksum(view, &mut src, sink),
    )?;

    Ok(VerifyBody { auth_scheme, checksum })
}

fn decode_checksum<'a>(view: &'a [u8], src: &mut ReadCursor<'a>, sink: &mut dyn FieldSink) -> Result<Checksum<'a>> {
    let at = src.pos();
    let header_length = src.read_u32()?;
    sink.emit_scalar(fields::HEADER_LEN, FieldValue::U32(header_length), ByteRange::new(at, 4));

    let at = src.pos();
    let scheme = src.read_u32()?;
    sink.emit_scalar(
        fields::CHECKSUM_SCHEME,
        FieldValue::Enum {
            value: scheme,
            name: ChecksumScheme::from_u32(scheme).map(ChecksumScheme::name),
        },
        ByteRange::new(at, 4),
    );

    let at = src.pos();
    let checksum_type = src.read_u32()?;
    sink.emit_scalar(fields::CHECKSUM_TYPE, FieldValue::U32(checksum_type), ByteRange::new(at, 4));

    let at = src.pos();
    let vector = Vector::decode_cursor(src)?;
    let label = format!("Checksum Vector: {} at {}", vector.count, vector.offset);

    let value = within(sink, label, vector_range(at), |sink| {
        emit_vector(sink, at, &vector, &CHECKSUM_VECTOR);

        let span = vector.validate(view.len(), 1)?;
        let value = &view[span.clone()];
        sink.emit_scalar(fields::CHECKSUM, FieldValue::bytes(value), span.into());

        Ok(value)
    })?;

    Ok(Checksum {
        header_length,
        scheme,
        checksum_type,
        vector,
        value,
    })
}
