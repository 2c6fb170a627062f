//! PKU2U tokens carried in NEGOEX exchange vectors.
//!
//! An exchange payload starting with `[APPLICATION 0]` constructed is a PKU2U GSS-API token:
//! the mechanism OID and the token id precede the actual AP-REQUEST. Only the framing is walked
//! here; the AP-REQUEST itself is handed to an [`ApRequestDecoder`].

mod ap_req;

use core::ops::Range;

pub use self::ap_req::KerberosApRequestDecoder;
use crate::ber::{self, Class, Identifier, Tag, TlvHeader};
use crate::negoex::fields;
use crate::oids::{decode_oid, OidResolver};
use crate::sink::{ByteRange, Diagnostic, DiagnosticKind, FieldSink, FieldValue, SubtreeHandle};
use crate::{DelegateError, Error, Result};

/// Outer identifier of a PKU2U token: `[APPLICATION 0]`, constructed.
pub const PKU2U_TOKEN_IDENTIFIER: Identifier = Identifier::new(Class::Application, true, 0);

/// Decoder of the AP-REQUEST embedded in a PKU2U token.
pub trait ApRequestDecoder: Send + Sync {
    /// Decodes the AP-REQUEST starting at `start`. `buffer` ends where the exchange vector ends.
    ///
    /// Fields are emitted under `subtree`, which is already open. Returns the number of bytes consumed.
    fn decode_ap_request(
        &self,
        buffer: &[u8],
        start: usize,
        sink: &mut dyn FieldSink,
        subtree: SubtreeHandle,
    ) -> core::result::Result<usize, DelegateError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangePayload<'a> {
    /// Exchange bytes that are not a PKU2U token.
    Opaque(&'a [u8]),
    Pku2u(Pku2uToken<'a>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pku2uToken<'a> {
    /// Dotted mechanism OID, if the first inner value is an OBJECT IDENTIFIER.
    pub mechanism: Option<String>,
    /// Offset of the AP-REQUEST in the message.
    pub ap_request_offset: usize,
    /// Bytes from the AP-REQUEST to the end of the exchange vector.
    pub ap_request: &'a [u8],
    /// Bytes consumed as reported by the delegate, or its failure.
    pub delegate_result: Result<usize>,
}

/// TLV boundaries of a PKU2U token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pku2uLayout {
    pub outer: TlvHeader,
    pub mechanism: TlvHeader,
    pub token_id: TlvHeader,
    /// Offset right after the two skipped inner values.
    pub ap_request_offset: usize,
}

/// Returns `true` if `exchange` starts with the PKU2U token identifier.
///
/// An empty or unreadable identifier is not a candidate.
pub fn is_pku2u_token(exchange: &[u8]) -> bool {
    matches!(ber::read_identifier(exchange, 0), Ok((identifier, _)) if identifier == PKU2U_TOKEN_IDENTIFIER)
}

/// Walks the outer header and the two inner TLVs of a PKU2U token starting at `start`.
///
/// Inner values are skipped using their own declared lengths and never interpreted.
pub fn locate_ap_request(buffer: &[u8], start: usize) -> Result<Pku2uLayout> {
    let outer = ber::read_header(buffer, start)?;

    if outer.identifier != PKU2U_TOKEN_IDENTIFIER {
        return Err(Error::BerMalformed {
            offset: start,
            reason: "not a PKU2U token",
        });
    }

    let (mechanism, token_id_start) = ber::skip_tlv(buffer, outer.content)?;
    let (token_id, ap_request_offset) = ber::skip_tlv(buffer, token_id_start)?;

    Ok(Pku2uLayout {
        outer,
        mechanism,
        token_id,
        ap_request_offset,
    })
}

/// Classifies exchange payloads and runs the PKU2U delegate.
pub(crate) struct Pku2u<'d> {
    pub delegate: &'d dyn ApRequestDecoder,
    pub oids: &'d dyn OidResolver,
}

impl Pku2u<'_> {
    /// Decodes the exchange bytes at `span` of the message `view`.
    ///
    /// BER errors in the token framing are returned. Delegate failures are reported to the sink only.
    pub(crate) fn dissect<'a>(
        &self,
        view: &'a [u8],
        span: Range<usize>,
        sink: &mut dyn FieldSink,
    ) -> Result<ExchangePayload<'a>> {
        let exchange = &view[span.clone()];

        if !is_pku2u_token(exchange) {
            sink.emit_scalar(fields::EXCHANGE, FieldValue::bytes(exchange), span.into());

            return Ok(ExchangePayload::Opaque(exchange));
        }

        // the token cannot extend past its exchange vector
        let buffer = &view[..span.end];
        let layout = locate_ap_request(buffer, span.start)?;

        trace!(?layout, "PKU2U token");

        let handle = sink.begin_subtree("PKU2U".to_owned(), ByteRange::from(span.clone()));

        let mechanism_end = layout.token_id.start;
        let mechanism = self.emit_mechanism(&buffer[layout.mechanism.start..mechanism_end], layout.mechanism, sink);

        sink.emit_scalar(
            fields::PKU2U_ANY,
            FieldValue::bytes(&buffer[layout.token_id.start..layout.ap_request_offset]),
            ByteRange::from(layout.token_id.start..layout.ap_request_offset),
        );

        let ap_request_range = ByteRange::from(layout.ap_request_offset..span.end);
        let delegate_result = match self
            .delegate
            .decode_ap_request(buffer, layout.ap_request_offset, sink, handle)
        {
            Ok(consumed) => {
                trace!(consumed, "AP-REQUEST decoded");

                Ok(consumed)
            }
            Err(err) => {
                warn!(%err, offset = layout.ap_request_offset, "Failed to decode the PKU2U AP-REQUEST");

                let err = Error::from(err);
                sink.diagnostic(Diagnostic::new(DiagnosticKind::DelegateFailure, err.to_string()), ap_request_range);

                Err(err)
            }
        };

        sink.end_subtree(handle);

        Ok(ExchangePayload::Pku2u(Pku2uToken {
            mechanism,
            ap_request_offset: layout.ap_request_offset,
            ap_request: &buffer[layout.ap_request_offset..],
            delegate_result,
        }))
    }

    fn emit_mechanism(&self, tlv: &[u8], header: TlvHeader, sink: &mut dyn FieldSink) -> Option<String> {
        let range = ByteRange::new(header.start, tlv.len());

        let dotted = if header.identifier.is_universal(Tag::ObjectIdentifier as i32) {
            decode_oid(tlv)
        } else {
            None
        };

        match dotted {
            Some(dotted) => {
                let name = self.oids.resolve_oid_name(&dotted);
                sink.emit_scalar(
                    fields::PKU2U_OID,
                    FieldValue::Oid {
                        dotted: dotted.clone(),
                        name,
                    },
                    range,
                );

                Some(dotted)
            }
            None => {
                sink.emit_scalar(fields::PKU2U_OID, FieldValue::bytes(tlv), range);

                None
            }
        }
    }
}
