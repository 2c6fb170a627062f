use uuid::Uuid;

use super::fields::{self, AUTH_SCHEME_VECTOR, EXTENSION_VECTOR};
use super::{emit_guid, emit_vector, vector_range, GUID_SIZE, HEADER_LEN, RANDOM_SIZE};
use crate::cursor::ReadCursor;
use crate::decode::Decode;
use crate::sink::{subtree, within, ByteRange, FieldSink, FieldValue};
use crate::vector::{Vector, VECTOR_SIZE};
use crate::Result;

/// INITIATOR_NEGO and ACCEPTOR_NEGO body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegoBody<'a> {
    pub random: [u8; RANDOM_SIZE],
    pub protocol_version: u64,
    pub auth_scheme_vector: Vector,
    pub auth_schemes: Vec<Uuid>,
    pub extension_vector: Vector,
    pub extensions: Vec<Extension<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension<'a> {
    /// Byte vector descriptor of this extension.
    pub vector: Vector,
    pub value: &'a [u8],
}

/// Decodes a Nego body. `view` is the whole message, header included.
///
/// Both vectors are decoded even if the first one is malformed. The first error is returned.
pub(crate) fn decode_nego<'a>(view: &'a [u8], sink: &mut dyn FieldSink) -> Result<NegoBody<'a>> {
    let mut src = ReadCursor::at(view, HEADER_LEN);

    let random_at = src.pos();
    let random = src.read_array::<RANDOM_SIZE>()?;
    sink.emit_scalar(
        fields::RANDOM,
        FieldValue::bytes(&random),
        ByteRange::new(random_at, RANDOM_SIZE),
    );

    let version_at = src.pos();
    let protocol_version = src.read_u64()?;
    sink.emit_scalar(
        fields::PROTOCOL_VERSION,
        FieldValue::U64(protocol_version),
        ByteRange::new(version_at, 8),
    );

    let auth_scheme_at = src.pos();
    let auth_scheme_vector = Vector::decode_cursor(&mut src)?;
    let auth_schemes = decode_auth_schemes(view, auth_scheme_at, &auth_scheme_vector, sink);

    let extension_at = src.pos();
    let extensions = Vector::decode_cursor(&mut src).and_then(|vector| {
        decode_extensions(view, extension_at, &vector, sink).map(|extensions| (vector, extensions))
    });

    let auth_schemes = auth_schemes?;
    let (extension_vector, extensions) = extensions?;

    trace!(
        auth_schemes = auth_schemes.len(),
        extensions = extensions.len(),
        "Decoded Nego body"
    );

    Ok(NegoBody {
        random,
        protocol_version,
        auth_scheme_vector,
        auth_schemes,
        extension_vector,
        extensions,
    })
}

fn decode_auth_schemes(view: &[u8], at: usize, vector: &Vector, sink: &mut dyn FieldSink) -> Result<Vec<Uuid>> {
    let label = format!("AuthSchemes: {} at {}", vector.count, vector.offset);

    within(sink, label, vector_range(at), |sink| {
        emit_vector(sink, at, vector, &AUTH_SCHEME_VECTOR);

        let span = vector.validate(view.len(), GUID_SIZE)?;
        let mut src = ReadCursor::at(view, span.start);

        (0..vector.count)
            .map(|_| -> Result<Uuid> {
                let guid_at = src.pos();
                let auth_scheme = Uuid::decode_cursor(&mut src)?;
                emit_guid(sink, fields::AUTH_SCHEME, auth_scheme, guid_at);

                Ok(auth_scheme)
            })
            .collect()
    })
}

fn decode_extensions<'a>(
    view: &'a [u8],
    at: usize,
    vector: &Vector,
    sink: &mut dyn FieldSink,
) -> Result<Vec<Extension<'a>>> {
    let label = format!("Extensions: {} at {}", vector.count, vector.offset);

    within(sink, label, vector_range(at), |sink| {
        emit_vector(sink, at, vector, &EXTENSION_VECTOR);

        // each element is itself a byte vector descriptor
        let span = vector.validate(view.len(), VECTOR_SIZE)?;
        let mut src = ReadCursor::at(view, span.start);
        let mut extensions = Vec::with_capacity(usize::from(vector.count));

        for _ in 0..vector.count {
            let descriptor_at = src.pos();
            let descriptor = Vector::decode_cursor(&mut src)?;
            let label = format!("Extension: {} bytes at {}", descriptor.count, descriptor.offset);

            let value = subtree(sink, label, vector_range(descriptor_at), |sink| {
                let span = descriptor.validate(view.len(), 1)?;
                let value = &view[span.clone()];
                sink.emit_scalar(fields::EXTENSION, FieldValue::bytes(value), span.into());

                Ok(value)
            })?;

            extensions.push(Extension {
                vector: descriptor,
                value,
            });
        }

        Ok(extensions)
    })
}
