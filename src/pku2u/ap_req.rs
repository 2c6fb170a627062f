use picky_krb::messages::ApReq;

use super::ApRequestDecoder;
use crate::ber::{self, Class, Identifier};
use crate::negoex::fields;
use crate::sink::{ByteRange, FieldSink, FieldValue, SubtreeHandle};
use crate::DelegateError;

/// [RFC 4120 5.5.1](https://datatracker.ietf.org/doc/html/rfc4120#section-5.5.1): `AP-REQ ::= [APPLICATION 14]`.
const AP_REQ_IDENTIFIER: Identifier = Identifier::new(Class::Application, true, 14);

/// Default AP-REQUEST delegate built on `picky-krb`.
///
/// Emits the protocol version, the message type, the ticket realm and the encryption types
/// of the ticket and of the authenticator. Encrypted parts are never decrypted.
#[derive(Debug, Clone, Copy, Default)]
pub struct KerberosApRequestDecoder;

impl ApRequestDecoder for KerberosApRequestDecoder {
    #[instrument(level = "trace", ret, skip(self, buffer, sink))]
    fn decode_ap_request(
        &self,
        buffer: &[u8],
        start: usize,
        sink: &mut dyn FieldSink,
        subtree: SubtreeHandle,
    ) -> Result<usize, DelegateError> {
        let (header, end) = ber::skip_tlv(buffer, start)?;

        if header.identifier != AP_REQ_IDENTIFIER {
            return Err(DelegateError::Other(format!(
                "expected AP-REQ but found {:?} tag {}",
                header.identifier.class, header.identifier.tag
            )));
        }

        let ap_req: ApReq = picky_asn1_der::from_bytes(&buffer[start..end])?;
        let range = ByteRange::from(start..end);

        let handle = sink.begin_subtree("AP-REQ".to_owned(), range);

        sink.emit_scalar(
            fields::KERBEROS_PVNO,
            FieldValue::Int(integer(&ap_req.0.pvno.0 .0)),
            range,
        );
        sink.emit_scalar(
            fields::KERBEROS_MSG_TYPE,
            FieldValue::Int(integer(&ap_req.0.msg_type.0 .0)),
            range,
        );

        let ticket = &ap_req.0.ticket.0 .0;
        sink.emit_scalar(
            fields::KERBEROS_REALM,
            FieldValue::Text(ticket.realm.0.to_string().into()),
            range,
        );
        sink.emit_scalar(
            fields::KERBEROS_TICKET_ETYPE,
            FieldValue::Int(integer(&ticket.enc_part.0.etype.0 .0)),
            range,
        );
        sink.emit_scalar(
            fields::KERBEROS_AUTHENTICATOR_ETYPE,
            FieldValue::Int(integer(&ap_req.0.authenticator.0.etype.0 .0)),
            range,
        );

        sink.end_subtree(handle);

        Ok(end - start)
    }
}

/// Interprets big-endian two's complement bytes. Only the last 8 bytes are kept.
fn integer(bytes: &[u8]) -> i64 {
    let negative = bytes.first().is_some_and(|byte| byte & 0x80 != 0);
    let skip = bytes.len().saturating_sub(8);

    bytes[skip..]
        .iter()
        .fold(if negative { -1 } else { 0 }, |acc, &byte| (acc << 8) | i64::from(byte))
}
