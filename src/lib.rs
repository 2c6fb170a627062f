//! Decoder for NEGOEX (SPNEGO Extended Negotiation) message streams.
//!
//! [`decode_stream`] walks a buffer of back-to-back NEGOEX messages and reports every decoded
//! field to a [`FieldSink`]. Exchange messages carrying a PKU2U token have their AP-REQUEST
//! handed to an [`ApRequestDecoder`](pku2u::ApRequestDecoder).
//!
//! ```
//! use negoex::{decode_stream, RecordingSink, Termination};
//!
//! let mut sink = RecordingSink::new();
//! let summary = decode_stream(&[0u8; 12], &mut sink);
//!
//! assert!(summary.messages.is_empty());
//! assert_eq!(summary.termination, Termination::ShortTail { remaining: 12 });
//! ```

#[macro_use]
extern crate tracing;

#[macro_use]
mod macros;

pub mod ber;
mod config;
mod cursor;
mod decode;
mod error;
pub mod negoex;
pub mod oids;
pub mod pku2u;
mod sink;
mod stream;
pub mod vector;

pub use config::{DecoderConfig, RecoveryMode};
pub use cursor::{ReadCursor, WriteCursor};
pub use decode::Decode;
pub use error::{DelegateError, Error, ErrorKind, Result};
pub use negoex::{Message, MessageBody, MessageHeader, MessageType};
pub use sink::{
    ByteRange, Diagnostic, DiagnosticKind, FieldEvent, FieldSink, FieldValue, RecordingSink, SubtreeHandle,
    TracingSink,
};
pub use stream::{decode_stream, NegoexDecoder, StreamSummary, Termination};
pub use vector::{resolve_vector, validate, Vector};
