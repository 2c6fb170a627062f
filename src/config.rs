/// What the stream loop does after a message body fails to decode.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum RecoveryMode {
    /// Stop at the first malformed message. Its `message_length` may be corrupt too.
    #[default]
    StopOnError,
    /// Scan forward for the next `"NEGOEXTS"` signature and resume there.
    ///
    /// Framing errors still stop the stream.
    Resynchronize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecoderConfig {
    pub recovery: RecoveryMode,
    /// Treat a signature other than `"NEGOEXTS"` as a framing error instead of a diagnostic.
    pub strict_signature: bool,
    /// Stop after this many messages.
    pub max_messages: Option<usize>,
}

impl DecoderConfig {
    pub fn new(recovery: RecoveryMode, strict_signature: bool, max_messages: Option<usize>) -> Self {
        Self {
            recovery,
            strict_signature,
            max_messages,
        }
    }

    pub fn with_recovery(recovery: RecoveryMode) -> Self {
        Self {
            recovery,
            ..Default::default()
        }
    }
}
