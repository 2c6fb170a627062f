//! The message stream loop.
//!
//! A buffer holds any number of back-to-back NEGOEX messages. Each iteration decodes one
//! header, dispatches the body to its decoder on a view limited to the message, and advances
//! by the declared `message_length`.

use core::cmp::min;
use core::fmt;

use crate::config::{DecoderConfig, RecoveryMode};
use crate::decode::Decode;
use crate::negoex::{
    decode_alert, decode_exchange, decode_nego, decode_verify, fields, Message, MessageBody, MessageCategory,
    MessageHeader, HEADER_LEN, SIGNATURE,
};
use crate::oids::{KnownOids, OidResolver};
use crate::pku2u::{ApRequestDecoder, KerberosApRequestDecoder, Pku2u};
use crate::sink::{ByteRange, Diagnostic, DiagnosticKind, FieldSink, FieldValue, Rebased};
use crate::Error;

/// Why the stream loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// Every byte of the buffer belongs to a decoded message.
    EndOfBuffer,
    /// Fewer than 40 bytes were left. Not an error.
    ShortTail { remaining: usize },
    /// A message could not be decoded.
    Aborted(Error),
    /// [`DecoderConfig::max_messages`] was reached.
    MessageLimit,
}

impl Termination {
    /// Returns `true` if the loop stopped without an error.
    pub fn is_clean(&self) -> bool {
        !matches!(self, Termination::Aborted(_))
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::EndOfBuffer => f.write_str("end of buffer"),
            Termination::ShortTail { remaining } => write!(f, "{} trailing bytes", remaining),
            Termination::Aborted(err) => write!(f, "aborted: {}", err),
            Termination::MessageLimit => f.write_str("message limit reached"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSummary<'a> {
    /// Messages in stream order, including the one that stopped the loop, if any.
    pub messages: Vec<Message<'a>>,
    pub termination: Termination,
    /// Offset at which the loop stopped, never past the end of the buffer.
    ///
    /// A last message declaring more bytes than were captured ends the loop at the buffer end.
    pub end_offset: usize,
}

impl StreamSummary<'_> {
    /// Comma-separated message type names.
    pub fn info(&self) -> String {
        self.messages
            .iter()
            .map(|message| message.name().unwrap_or("Unknown"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn error(&self) -> Option<&Error> {
        match &self.termination {
            Termination::Aborted(err) => Some(err),
            _ => None,
        }
    }
}

enum Step<'a> {
    Advance { message: Message<'a>, next: usize },
    Stop { message: Option<Message<'a>>, error: Error },
}

/// NEGOEX stream decoder.
///
/// Holds no per-buffer state: one decoder can decode any number of buffers, from several threads.
pub struct NegoexDecoder {
    config: DecoderConfig,
    delegate: Box<dyn ApRequestDecoder>,
    oids: Box<dyn OidResolver>,
}

impl fmt::Debug for NegoexDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NegoexDecoder").field("config", &self.config).finish_non_exhaustive()
    }
}

impl Default for NegoexDecoder {
    fn default() -> Self {
        Self::new(DecoderConfig::default())
    }
}

impl NegoexDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            delegate: Box::new(KerberosApRequestDecoder),
            oids: Box::new(KnownOids),
        }
    }

    pub fn with_delegate(self, delegate: Box<dyn ApRequestDecoder>) -> Self {
        Self { delegate, ..self }
    }

    pub fn with_oid_resolver(self, oids: Box<dyn OidResolver>) -> Self {
        Self { oids, ..self }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decodes every message of `buffer`, emitting fields to `sink` as it goes.
    ///
    /// Never fails: errors are reported to the sink and through [`StreamSummary::termination`].
    #[instrument(level = "debug", skip_all, fields(len = buffer.len()))]
    pub fn decode<'a>(&self, buffer: &'a [u8], sink: &mut dyn FieldSink) -> StreamSummary<'a> {
        let mut messages = Vec::new();
        let mut offset = 0;

        let termination = loop {
            if offset >= buffer.len() {
                break Termination::EndOfBuffer;
            }

            let remaining = buffer.len() - offset;
            if remaining < HEADER_LEN {
                break Termination::ShortTail { remaining };
            }

            if self.config.max_messages.is_some_and(|max| messages.len() >= max) {
                break Termination::MessageLimit;
            }

            match self.decode_message(buffer, offset, sink) {
                Step::Advance { message, next } => {
                    trace!(offset, next, message_type = message.header.message_type, "Message decoded");

                    messages.push(message);
                    offset = next;
                }
                Step::Stop { message, error } => {
                    messages.extend(message);

                    if let Some(next) = self.resynchronize(buffer, offset, &error) {
                        warn!(%error, from = offset, to = next, "Resynchronizing NEGOEX stream");

                        sink.diagnostic(
                            Diagnostic::new(
                                DiagnosticKind::Resynchronized,
                                format!("decoding resumed at offset {}", next),
                            ),
                            ByteRange::from(offset..next),
                        );
                        offset = next;

                        continue;
                    }

                    break Termination::Aborted(error);
                }
            }
        };

        debug!(messages = messages.len(), %termination, "NEGOEX stream decoded");

        StreamSummary {
            messages,
            termination,
            end_offset: min(offset, buffer.len()),
        }
    }

    fn resynchronize(&self, buffer: &[u8], offset: usize, error: &Error) -> Option<usize> {
        if self.config.recovery != RecoveryMode::Resynchronize || error.is_fatal() {
            return None;
        }

        find_signature(buffer, offset + SIGNATURE.len())
    }

    /// Decodes the message at `offset`. At least [`HEADER_LEN`] bytes are available.
    fn decode_message<'a>(&self, buffer: &'a [u8], offset: usize, sink: &mut dyn FieldSink) -> Step<'a> {
        let header = match MessageHeader::decode(&buffer[offset..]) {
            Ok(header) => header,
            Err(error) => return Step::Stop { message: None, error },
        };

        let remaining = buffer.len() - offset;
        let captured = min(header.message_length as usize, remaining).max(HEADER_LEN);
        let range = ByteRange::new(offset, captured);

        let label = match header.kind() {
            Some(kind) => format!("NEGOEX {}", kind.name()),
            None => "Unknown NEGOEX message type".to_owned(),
        };

        let handle = sink.begin_subtree(label, range);

        let header_handle = sink.begin_subtree("Header".to_owned(), ByteRange::new(offset, HEADER_LEN));
        header.emit(sink, offset);
        sink.end_subtree(header_handle);

        let step = self.decode_framed(buffer, offset, header, captured, sink);

        if let Step::Stop { error, .. } = &step {
            sink.diagnostic(Diagnostic::malformed_message(error), range);
        }

        sink.end_subtree(handle);

        step
    }

    fn decode_framed<'a>(
        &self,
        buffer: &'a [u8],
        offset: usize,
        header: MessageHeader,
        captured: usize,
        sink: &mut dyn FieldSink,
    ) -> Step<'a> {
        let stop = |error: Error| Step::Stop {
            message: Some(Message {
                offset,
                header,
                body: None,
                error: Some(error.clone()),
            }),
            error,
        };

        if !header.has_valid_signature() {
            warn!(offset, signature = ?header.signature, "Invalid NEGOEX signature");

            sink.diagnostic(
                Diagnostic::new(
                    DiagnosticKind::InvalidSignature,
                    format!("invalid signature: {}", header.signature_text()),
                ),
                ByteRange::new(offset, SIGNATURE.len()),
            );

            if self.config.strict_signature {
                return stop(Error::Framing {
                    offset,
                    message_length: header.message_length,
                    reason: "invalid signature",
                });
            }
        }

        let next = match next_offset(offset, header.message_length) {
            Ok(next) => next,
            Err(error) => return stop(error),
        };

        let view = &buffer[offset..offset + captured];

        let Some(kind) = header.kind() else {
            warn!(offset, message_type = header.message_type, "Unknown NEGOEX message type");

            sink.diagnostic(
                Diagnostic::new(
                    DiagnosticKind::UnknownMessageType,
                    Error::UnknownMessageType(header.message_type).to_string(),
                ),
                ByteRange::new(offset + 8, 4),
            );

            let data = &view[HEADER_LEN..];
            if !data.is_empty() {
                sink.emit_scalar(
                    fields::DATA,
                    FieldValue::bytes(data),
                    ByteRange::new(offset + HEADER_LEN, data.len()),
                );
            }

            if next > buffer.len() {
                return stop(Error::Framing {
                    offset,
                    message_length: header.message_length,
                    reason: "message of unknown type extends past the buffer",
                });
            }

            return Step::Advance {
                message: Message {
                    offset,
                    header,
                    body: Some(MessageBody::Unknown(data)),
                    error: None,
                },
                next,
            };
        };

        let body = {
            let mut sink = Rebased::new(sink, offset);
            let pku2u = Pku2u {
                delegate: self.delegate.as_ref(),
                oids: self.oids.as_ref(),
            };

            match kind.category() {
                MessageCategory::Nego => decode_nego(view, &mut sink).map(MessageBody::Nego),
                MessageCategory::Exchange => decode_exchange(view, &mut sink, &pku2u).map(MessageBody::Exchange),
                MessageCategory::Verify => decode_verify(view, &mut sink).map(MessageBody::Verify),
                MessageCategory::Alert => decode_alert(view, &mut sink).map(MessageBody::Alert),
            }
        };

        match body {
            Ok(body) => Step::Advance {
                message: Message {
                    offset,
                    header,
                    body: Some(body),
                    error: None,
                },
                next,
            },
            Err(error) => {
                warn!(%error, offset, "Malformed NEGOEX {} message", kind.name());

                stop(error)
            }
        }
    }
}

/// Offset of the message following a message of `message_length` bytes at `offset`.
fn next_offset(offset: usize, message_length: u32) -> Result<usize, Error> {
    let framing = |reason| Error::Framing {
        offset,
        message_length,
        reason,
    };

    if message_length == 0 {
        return Err(framing("zero message length"));
    }

    // a shorter message would overlap the next header
    if (message_length as usize) < HEADER_LEN {
        return Err(framing("message length shorter than the header"));
    }

    offset
        .checked_add(message_length as usize)
        .ok_or_else(|| framing("message length overflows"))
}

/// Offset of the first `"NEGOEXTS"` at or after `from`.
fn find_signature(buffer: &[u8], from: usize) -> Option<usize> {
    buffer
        .get(from..)?
        .windows(SIGNATURE.len())
        .position(|window| window == SIGNATURE)
        .map(|position| from + position)
}

/// Decodes `buffer` with the default configuration, delegate and OID resolver.
pub fn decode_stream<'a>(buffer: &'a [u8], sink: &mut dyn FieldSink) -> StreamSummary<'a> {
    NegoexDecoder::default().decode(buffer, sink)
}
