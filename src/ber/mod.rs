//! Minimal BER tag-length reader.
//!
//! Only the TLV header grammar is implemented: enough to classify a value, to find where its
//! content starts, and to skip it. Values themselves are never materialized here.


use crate::{Error, Result};

#[repr(u8)]
#[allow(unused)]
pub(crate) enum Pc {
    Primitive = 0x00,
    Construct = 0x20,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Class {
    Universal,
    Application,
    ContextSpecific,
    Private,
}

impl Class {
    const MASK: u8 = 0xC0;

    fn from_identifier(identifier: u8) -> Self {
        match identifier & Self::MASK {
            0x00 => Class::Universal,
            0x40 => Class::Application,
            0x80 => Class::ContextSpecific,
            _ => Class::Private,
        }
    }
}

#[repr(u8)]
#[allow(unused)]
pub(crate) enum Tag {
    Boolean = 0x01,
    Integer = 0x02,
    OctetString = 0x04,
    ObjectIdentifier = 0x06,
    Sequence = 0x10,
}

const TAG_MASK: u8 = 0x1F;
const LENGTH_LONG_FORM: u8 = 0x80;
/// Tag numbers are capped at 28 bits so they always fit into an `i32`.
const MAX_TAG_OCTETS: usize = 4;
const MAX_LENGTH_OCTETS: usize = 4;

/// Decoded BER identifier octet(s).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    pub class: Class,
    pub constructed: bool,
    pub tag: i32,
}

impl Identifier {
    pub const fn new(class: Class, constructed: bool, tag: i32) -> Self {
        Self {
            class,
            constructed,
            tag,
        }
    }

    pub fn is_universal(&self, tag: i32) -> bool {
        self.class == Class::Universal && self.tag == tag
    }
}

/// Decoded BER length octet(s).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Length {
    pub value: u32,
    /// Indefinite-length form (`0x80`). `value` is 0 in that case.
    pub indefinite: bool,
}

/// Identifier and length of a TLV, with the offsets needed to walk over it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TlvHeader {
    pub identifier: Identifier,
    pub length: Length,
    /// Offset of the first identifier octet.
    pub start: usize,
    /// Offset of the first content octet.
    pub content: usize,
}

impl TlvHeader {
    /// Offset right after the TLV content. Fails for indefinite lengths.
    pub fn end(&self) -> Result<usize> {
        if self.length.indefinite {
            return Err(malformed(self.start, "indefinite length cannot be skipped"));
        }

        self.content
            .checked_add(self.length.value as usize)
            .ok_or_else(|| malformed(self.start, "length overflows"))
    }
}

fn malformed(offset: usize, reason: &'static str) -> Error {
    Error::BerMalformed { offset, reason }
}

fn octet_at(buffer: &[u8], offset: usize, reason: &'static str) -> Result<u8> {
    buffer.get(offset).copied().ok_or_else(|| malformed(offset, reason))
}

/// Reads a BER identifier at `offset` and returns it with the offset of the next octet.
pub fn read_identifier(buffer: &[u8], offset: usize) -> Result<(Identifier, usize)> {
    let first = octet_at(buffer, offset, "truncated identifier")?;

    let class = Class::from_identifier(first);
    let constructed = first & Pc::Construct as u8 != 0;
    let mut next = offset + 1;

    let tag = if first & TAG_MASK != TAG_MASK {
        i32::from(first & TAG_MASK)
    } else {
        // high-tag-number form: base-128, most significant group first
        let mut tag: i32 = 0;
        let mut octets = 0;

        loop {
            let octet = octet_at(buffer, next, "truncated high tag number")?;
            next += 1;
            octets += 1;

            if octets > MAX_TAG_OCTETS {
                return Err(malformed(offset, "tag number too large"));
            }

            tag = (tag << 7) | i32::from(octet & 0x7F);

            if octet & 0x80 == 0 {
                break;
            }
        }

        tag
    };

    Ok((
        Identifier {
            class,
            constructed,
            tag,
        },
        next,
    ))
}

/// Reads a BER length at `offset` and returns it with the offset of the next octet.
///
/// Short and long definite forms are supported. The indefinite form is recognized but not resolved.
pub fn read_length(buffer: &[u8], offset: usize) -> Result<(Length, usize)> {
    let first = octet_at(buffer, offset, "truncated length")?;
    let next = offset + 1;

    if first & LENGTH_LONG_FORM == 0 {
        return Ok((
            Length {
                value: u32::from(first),
                indefinite: false,
            },
            next,
        ));
    }

    let octets = usize::from(first & !LENGTH_LONG_FORM);

    if octets == 0 {
        return Ok((
            Length {
                value: 0,
                indefinite: true,
            },
            next,
        ));
    }

    if octets > MAX_LENGTH_OCTETS {
        return Err(malformed(offset, "invalid length of the length"));
    }

    let bytes = buffer
        .get(next..next + octets)
        .ok_or_else(|| malformed(offset, "truncated long-form length"))?;
    let value = bytes.iter().fold(0u32, |acc, &byte| (acc << 8) | u32::from(byte));

    Ok((
        Length {
            value,
            indefinite: false,
        },
        next + octets,
    ))
}

/// Reads a full TLV header (identifier and length) at `offset`.
pub fn read_header(buffer: &[u8], offset: usize) -> Result<TlvHeader> {
    let (identifier, next) = read_identifier(buffer, offset)?;
    let (length, content) = read_length(buffer, next)?;

    Ok(TlvHeader {
        identifier,
        length,
        start: offset,
        content,
    })
}

/// Skips the TLV at `offset` without looking at its content.
///
/// Returns the header and the offset right after the TLV. The content must fit into `buffer`.
pub fn skip_tlv(buffer: &[u8], offset: usize) -> Result<(TlvHeader, usize)> {
    let header = read_header(buffer, offset)?;
    let end = header.end()?;

    if end > buffer.len() {
        return Err(malformed(offset, "value exceeds the buffer"));
    }

    Ok((header, end))
}
