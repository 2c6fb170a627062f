use thiserror::Error;

/// The kind of a decoding error. Enables to group errors the way the stream loop reacts to them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A read or a vector span exceeds the captured buffer length.
    OutOfBounds,
    /// Invalid BER identifier or length encoding, or a truncated TLV.
    BerMalformed,
    /// The message type is greater than the maximum known type. Not fatal.
    UnknownMessageType,
    /// Zero or otherwise invalid message length. Fatal to the stream.
    FramingError,
    /// Failure reported by the PKU2U AP-REQUEST delegate. Local to its sub-tree.
    DelegateError,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("not enough bytes at offset {offset}: needed {needed} but only {available} available")]
    OutOfBounds {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error(
        "vector out of range: {count} elements of {element_size} bytes at offset {offset} exceed buffer length {buffer_len}"
    )]
    VectorOutOfRange {
        offset: u32,
        count: u16,
        element_size: usize,
        buffer_len: usize,
    },

    #[error("malformed BER at offset {offset}: {reason}")]
    BerMalformed { offset: usize, reason: &'static str },

    #[error("unknown NEGOEX message type: {0}")]
    UnknownMessageType(u32),

    #[error("invalid framing at offset {offset} (message length {message_length}): {reason}")]
    Framing {
        offset: usize,
        message_length: u32,
        reason: &'static str,
    },

    #[error("PKU2U delegate failed: {0}")]
    Delegate(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::OutOfBounds { .. } | Error::VectorOutOfRange { .. } => ErrorKind::OutOfBounds,
            Error::BerMalformed { .. } => ErrorKind::BerMalformed,
            Error::UnknownMessageType(_) => ErrorKind::UnknownMessageType,
            Error::Framing { .. } => ErrorKind::FramingError,
            Error::Delegate(_) => ErrorKind::DelegateError,
        }
    }

    /// Returns `true` if the stream loop must stop after this error regardless of the recovery mode.
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::FramingError
    }
}

/// Error returned by an [`ApRequestDecoder`](crate::pku2u::ApRequestDecoder).
#[derive(Debug, Error)]
pub enum DelegateError {
    #[error(transparent)]
    Asn1(#[from] picky_asn1_der::Asn1DerError),

    #[error(transparent)]
    Decode(#[from] Error),

    #[error("{0}")]
    Other(String),
}

impl From<DelegateError> for Error {
    fn from(err: DelegateError) -> Self {
        Error::Delegate(err.to_string())
    }
}

pub type Result<T> = core::result::Result<T, Error>;
