use uuid::Uuid;

use super::fields::{self, EXCHANGE_VECTOR};
use super::{emit_guid, emit_vector, vector_range, HEADER_LEN};
use crate::cursor::ReadCursor;
use crate::decode::Decode;
use crate::pku2u::{ExchangePayload, Pku2u};
use crate::sink::{within, FieldSink};
use crate::vector::Vector;
use crate::Result;

/// INITIATOR_META_DATA, ACCEPTOR_META_DATA, CHALLENGE and AP_REQUEST body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeBody<'a> {
    pub auth_scheme: Uuid,
    pub exchange_vector: Vector,
    pub payload: ExchangePayload<'a>,
}

pub(crate) fn decode_exchange<'a>(
    view: &'a [u8],
    sink: &mut dyn FieldSink,
    pku2u: &Pku2u<'_>,
) -> Result<ExchangeBody<'a>> {
    let mut src = ReadCursor::at(view, HEADER_LEN);

    let auth_scheme_at = src.pos();
    let auth_scheme = Uuid::decode_cursor(&mut src)?;
    emit_guid(sink, fields::AUTH_SCHEME, auth_scheme, auth_scheme_at);

    let at = src.pos();
    let exchange_vector = Vector::decode_cursor(&mut src)?;
    let label = format!("Exchange: {} bytes at {}", exchange_vector.count, exchange_vector.offset);

    let payload = within(sink, label, vector_range(at), |sink| {
        emit_vector(sink, at, &exchange_vector, &EXCHANGE_VECTOR);

        let span = exchange_vector.validate(view.len(), 1)?;

        pku2u.dissect(view, span, sink)
    })?;

    Ok(ExchangeBody {
        auth_scheme,
        exchange_vector,
        payload,
    })
}
