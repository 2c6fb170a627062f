//! Paths of the fields emitted to a [`FieldSink`](crate::FieldSink).

pub const SIGNATURE: &str = "negoex.message.sig";
pub const MESSAGE_TYPE: &str = "negoex.message.type";
pub const SEQUENCE_NUM: &str = "negoex.message.seq_num";
pub const HEADER_LEN: &str = "negoex.header.len";
pub const MESSAGE_LEN: &str = "negoex.message.len";
pub const CONVERSATION_ID: &str = "negoex.message.conv_id";

pub const RANDOM: &str = "negoex.message.random";
pub const PROTOCOL_VERSION: &str = "negoex.proto_version";
pub const AUTH_SCHEME: &str = "negoex.auth_scheme";
pub const AUTH_SCHEME_VECTOR_OFFSET: &str = "negoex.auth_scheme_array_offset";
pub const AUTH_SCHEME_VECTOR_COUNT: &str = "negoex.auth_scheme_array_count";
pub const AUTH_SCHEME_VECTOR_PAD: &str = "negoex.auth_scheme_array_pad";
pub const EXTENSION: &str = "negoex.extension";
pub const EXTENSION_VECTOR_OFFSET: &str = "negoex.extension_array_offset";
pub const EXTENSION_VECTOR_COUNT: &str = "negoex.extension_array_count";
pub const EXTENSION_VECTOR_PAD: &str = "negoex.extension_pad";

pub const EXCHANGE_VECTOR_OFFSET: &str = "negoex.exchange_vec_offset";
pub const EXCHANGE_VECTOR_COUNT: &str = "negoex.exchange_vec_byte_count";
pub const EXCHANGE_VECTOR_PAD: &str = "negoex.exchange_vec_pad";
pub const EXCHANGE: &str = "negoex.exchange";

pub const CHECKSUM_SCHEME: &str = "negoex.checksum_scheme";
pub const CHECKSUM_TYPE: &str = "negoex.checksum_type";
pub const CHECKSUM_VECTOR_OFFSET: &str = "negoex.checksum_vec_offset";
pub const CHECKSUM_VECTOR_COUNT: &str = "negoex.checksum_vec_count";
pub const CHECKSUM_VECTOR_PAD: &str = "negoex.checksum_pad";
pub const CHECKSUM: &str = "negoex.checksum";

pub const ERROR_CODE: &str = "negoex.errorcode";
pub const DATA: &str = "negoex.data";

pub const PKU2U_OID: &str = "pku2u.oid";
pub const PKU2U_ANY: &str = "pku2u.any";

pub const KERBEROS_PVNO: &str = "kerberos.pvno";
pub const KERBEROS_MSG_TYPE: &str = "kerberos.msg_type";
pub const KERBEROS_REALM: &str = "kerberos.realm";
pub const KERBEROS_TICKET_ETYPE: &str = "kerberos.ticket.etype";
pub const KERBEROS_AUTHENTICATOR_ETYPE: &str = "kerberos.authenticator.etype";

/// Field paths of one vector descriptor.
#[derive(Debug, Clone, Copy)]
pub(crate) struct VectorFields {
    pub offset: &'static str,
    pub count: &'static str,
    pub pad: &'static str,
}

pub(crate) const AUTH_SCHEME_VECTOR: VectorFields = VectorFields {
    offset: AUTH_SCHEME_VECTOR_OFFSET,
    count: AUTH_SCHEME_VECTOR_COUNT,
    pad: AUTH_SCHEME_VECTOR_PAD,
};

pub(crate) const EXTENSION_VECTOR: VectorFields = VectorFields {
    offset: EXTENSION_VECTOR_OFFSET,
    count: EXTENSION_VECTOR_COUNT,
    pad: EXTENSION_VECTOR_PAD,
};

pub(crate) const EXCHANGE_VECTOR: VectorFields = VectorFields {
    offset: EXCHANGE_VECTOR_OFFSET,
    count: EXCHANGE_VECTOR_COUNT,
    pad: EXCHANGE_VECTOR_PAD,
};

pub(crate) const CHECKSUM_VECTOR: VectorFields = VectorFields {
    offset: CHECKSUM_VECTOR_OFFSET,
    count: CHECKSUM_VECTOR_COUNT,
    pad: CHECKSUM_VECTOR_PAD,
};
