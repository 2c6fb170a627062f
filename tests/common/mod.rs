#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use negoex::negoex::{HEADER_LEN, SIGNATURE};
use negoex::pku2u::ApRequestDecoder;
use negoex::{DelegateError, FieldSink, MessageHeader, MessageType, SubtreeHandle, Vector};
use tracing_subscriber::EnvFilter;
use uuid::{uuid, Uuid};

pub const KERBEROS_SCHEME: Uuid = uuid!("0d53335c-f9ea-4d0d-b2ec-4ae3786ec308");
pub const PKU2U_SCHEME: Uuid = uuid!("235f69ad-73fb-4dbc-8203-0629e739339b");
pub const CONVERSATION: Uuid = uuid!("e7a3b1c4-5d6f-4a8b-9c0d-1e2f3a4b5c6d");

/// DER encoding of 1.3.6.1.5.2.7.
pub const PKU2U_OID_TLV: [u8; 8] = [0x06, 0x06, 0x2b, 0x06, 0x01, 0x05, 0x02, 0x07];
/// GSS-API token id of an AP-REQ (`01 00`) as found in PKU2U tokens.
pub const TOKEN_ID_TLV: [u8; 2] = [0x01, 0x00];

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn vector(offset: usize, count: usize) -> [u8; 8] {
    Vector {
        offset: offset as u32,
        count: count as u16,
        pad: [0; 2],
    }
    .to_bytes()
}

/// Prepends a header and patches the message length.
fn finish(message_type: u32, sequence_number: u32, body: &[u8]) -> Vec<u8> {
    let message_length = (HEADER_LEN + body.len()) as u32;
    let mut header = MessageHeader::new(MessageType::Alert, sequence_number, message_length, CONVERSATION);
    header.message_type = message_type;

    let mut buf = header.to_bytes().to_vec();
    buf.extend_from_slice(body);
    buf
}

/// INITIATOR_NEGO or ACCEPTOR_NEGO. Auth schemes follow the fixed part, then the extension
/// descriptors, then the extension bytes.
pub fn nego(message_type: MessageType, sequence_number: u32, auth_schemes: &[Uuid], extensions: &[&[u8]]) -> Vec<u8> {
    let auth_schemes_offset = 96;
    let extensions_offset = auth_schemes_offset + auth_schemes.len() * 16;
    let mut data_offset = extensions_offset + extensions.len() * 8;

    let mut body = vec![0x5a; 32];
    body.extend_from_slice(&0u64.to_le_bytes());
    body.extend_from_slice(&vector(auth_schemes_offset, auth_schemes.len()));
    body.extend_from_slice(&vector(extensions_offset, extensions.len()));

    for auth_scheme in auth_schemes {
        body.extend_from_slice(&auth_scheme.to_bytes_le());
    }

    for extension in extensions {
        body.extend_from_slice(&vector(data_offset, extension.len()));
        data_offset += extension.len();
    }

    for extension in extensions {
        body.extend_from_slice(extension);
    }

    finish(message_type as u32, sequence_number, &body)
}

/// Exchange-category message. The exchange bytes start at offset 64.
pub fn exchange(message_type: MessageType, sequence_number: u32, exchange: &[u8]) -> Vec<u8> {
    let mut body = PKU2U_SCHEME.to_bytes_le().to_vec();
    body.extend_from_slice(&vector(64, exchange.len()));
    body.extend_from_slice(exchange);

    finish(message_type as u32, sequence_number, &body)
}

/// VERIFY with an rfc3961 checksum starting at offset 76.
pub fn verify(sequence_number: u32, checksum: &[u8]) -> Vec<u8> {
    let mut body = PKU2U_SCHEME.to_bytes_le().to_vec();
    body.extend_from_slice(&20u32.to_le_bytes());
    body.extend_from_slice(&1u32.to_le_bytes());
    body.extend_from_slice(&16u32.to_le_bytes());
    body.extend_from_slice(&vector(76, checksum.len()));
    body.extend_from_slice(checksum);

    finish(MessageType::Verify as u32, sequence_number, &body)
}

pub fn alert(sequence_number: u32, error_code: u32, data: &[u8]) -> Vec<u8> {
    let mut body = PKU2U_SCHEME.to_bytes_le().to_vec();
    body.extend_from_slice(&error_code.to_le_bytes());
    body.extend_from_slice(data);

    finish(MessageType::Alert as u32, sequence_number, &body)
}

/// Message with a raw type value and an opaque body.
pub fn raw(message_type: u32, sequence_number: u32, body: &[u8]) -> Vec<u8> {
    finish(message_type, sequence_number, body)
}

fn ber_length(len: usize) -> Vec<u8> {
    if len < 0x80 {
        vec![len as u8]
    } else if len <= 0xff {
        vec![0x81, len as u8]
    } else {
        vec![0x82, (len >> 8) as u8, len as u8]
    }
}

/// `[APPLICATION 0] { mechanism OID, token id, ap_req }`.
pub fn pku2u_token(ap_req: &[u8]) -> Vec<u8> {
    let content_len = PKU2U_OID_TLV.len() + TOKEN_ID_TLV.len() + ap_req.len();

    let mut token = vec![0x60];
    token.extend_from_slice(&ber_length(content_len));
    token.extend_from_slice(&PKU2U_OID_TLV);
    token.extend_from_slice(&TOKEN_ID_TLV);
    token.extend_from_slice(ap_req);
    token
}

pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

pub fn has_signature(message: &[u8]) -> bool {
    message.starts_with(&SIGNATURE)
}

/// Delegate that records every call and accepts everything.
#[derive(Debug, Clone, Default)]
pub struct RecordingDelegate {
    pub calls: Arc<Mutex<Vec<(usize, Vec<u8>)>>>,
}

impl RecordingDelegate {
    pub fn calls(&self) -> Vec<(usize, Vec<u8>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ApRequestDecoder for RecordingDelegate {
    fn decode_ap_request(
        &self,
        buffer: &[u8],
        start: usize,
        _sink: &mut dyn FieldSink,
        _subtree: SubtreeHandle,
    ) -> Result<usize, DelegateError> {
        let rest = buffer
            .get(start..)
            .ok_or_else(|| DelegateError::Other(format!("start {} is past the buffer", start)))?;

        self.calls.lock().unwrap().push((start, rest.to_vec()));

        Ok(rest.len())
    }
}
