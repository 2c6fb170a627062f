//! Object identifier annotation.
//!
//! Names are cosmetic: resolving (or failing to resolve) an OID never changes how a message is decoded.

use ::oid::ObjectIdentifier;
use picky_asn1::wrapper::ObjectIdentifierAsn1;

/// SPNEGO Extended Negotiation Security Mechanism.
pub const NEGOEX: &str = "1.3.6.1.4.1.311.2.2.30";
/// PKU2U GSS-API mechanism.
pub const PKU2U: &str = "1.3.6.1.5.2.7";
pub const KRB5: &str = "1.2.840.113554.1.2.2";
pub const MS_KRB5: &str = "1.2.840.48018.1.2.2";
pub const KRB5_USER_TO_USER: &str = "1.2.840.113554.1.2.2.3";
pub const SPNEGO: &str = "1.3.6.1.5.5.2";

/// Universal, primitive, tag 6.
const OBJECT_IDENTIFIER_TAG: u8 = 0x06;

pub trait OidResolver: Send + Sync {
    /// Returns a human readable name for a dotted OID string.
    fn resolve_oid_name(&self, oid: &str) -> Option<String>;
}

/// Resolver for the mechanisms that show up around NEGOEX.
#[derive(Debug, Clone, Copy, Default)]
pub struct KnownOids;

const KNOWN_OIDS: &[(&str, &str)] = &[
    (NEGOEX, "negoex"),
    (PKU2U, "pku2u"),
    (KRB5, "krb5"),
    (MS_KRB5, "ms-krb5"),
    (KRB5_USER_TO_USER, "krb5-user-to-user"),
    (SPNEGO, "spnego"),
];

impl OidResolver for KnownOids {
    fn resolve_oid_name(&self, oid: &str) -> Option<String> {
        KNOWN_OIDS
            .iter()
            .find(|(dotted, _)| *dotted == oid)
            .map(|(_, name)| (*name).to_owned())
    }
}

/// Decodes a complete DER object identifier TLV into its dotted form.
///
/// Returns `None` for any other universal tag, even if its content would parse as an OID.
pub fn decode_oid(tlv: &[u8]) -> Option<String> {
    if tlv.first() != Some(&OBJECT_IDENTIFIER_TAG) {
        return None;
    }

    let oid: ObjectIdentifierAsn1 = picky_asn1_der::from_bytes(tlv).ok()?;
    let oid: ObjectIdentifier = oid.0;

    Some(oid.into())
}
