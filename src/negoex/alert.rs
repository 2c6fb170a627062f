use uuid::Uuid;

use super::{emit_guid, fields, GUID_SIZE, HEADER_LEN};
use crate::cursor::ReadCursor;
use crate::decode::Decode;
use crate::sink::{ByteRange, FieldSink, FieldValue};
use crate::Result;

/// ALERT body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertBody<'a> {
    pub auth_scheme: Uuid,
    /// Opaque status value.
    pub error_code: u32,
    /// Rest of the message.
    pub data: &'a [u8],
}

pub(crate) fn decode_alert<'a>(view: &'a [u8], sink: &mut dyn FieldSink) -> Result<AlertBody<'a>> {
    let mut src = ReadCursor::at(view, HEADER_LEN);
    ensure_size!(in: src, size: GUID_SIZE + 4);

    let at = src.pos();
    let auth_scheme = Uuid::decode_cursor(&mut src)?;
    emit_guid(sink, fields::AUTH_SCHEME, auth_scheme, at);

    let at = src.pos();
    let error_code = src.read_u32()?;
    sink.emit_scalar(fields::ERROR_CODE, FieldValue::U32(error_code), ByteRange::new(at, 4));

    let at = src.pos();
    let data = src.read_remaining();
    if !data.is_empty() {
        sink.emit_scalar(fields::DATA, FieldValue::bytes(data), ByteRange::new(at, data.len()));
    }

    Ok(AlertBody {
        auth_scheme,
        error_code,
        data,
    })
}
