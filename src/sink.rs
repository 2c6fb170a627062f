//! Field sink: the consumer of decoded fields and subtrees.
//!
//! Decoders emit in strict depth-first, pre-order, left-to-right order matching the byte layout.

use std::borrow::Cow;
use std::fmt;
use std::ops::Range;

use uuid::Uuid;

use crate::{Error, ErrorKind, Result};

/// A span of bytes in the decoded buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct ByteRange {
    pub offset: usize,
    pub len: usize,
}

impl ByteRange {
    pub const fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    pub const fn end(&self) -> usize {
        self.offset + self.len
    }

    pub const fn shifted(self, base: usize) -> Self {
        Self {
            offset: self.offset + base,
            len: self.len,
        }
    }
}

impl From<Range<usize>> for ByteRange {
    fn from(range: Range<usize>) -> Self {
        Self {
            offset: range.start,
            len: range.end.saturating_sub(range.start),
        }
    }
}

/// Opaque handle identifying an open subtree. Handed out by the sink.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubtreeHandle(usize);

impl SubtreeHandle {
    pub const fn new(id: usize) -> Self {
        Self(id)
    }

    pub const fn id(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue<'a> {
    U16(u16),
    U32(u32),
    U64(u64),
    Int(i64),
    /// Enumerated value with its label, if the value is known.
    Enum {
        value: u32,
        name: Option<&'static str>,
    },
    Guid(Uuid),
    Bytes(Cow<'a, [u8]>),
    Text(Cow<'a, str>),
    Oid {
        dotted: String,
        name: Option<String>,
    },
}

impl<'a> FieldValue<'a> {
    pub fn bytes(bytes: &'a [u8]) -> Self {
        FieldValue::Bytes(Cow::Borrowed(bytes))
    }

    pub fn into_owned(self) -> FieldValue<'static> {
        match self {
            FieldValue::U16(value) => FieldValue::U16(value),
            FieldValue::U32(value) => FieldValue::U32(value),
            FieldValue::U64(value) => FieldValue::U64(value),
            FieldValue::Int(value) => FieldValue::Int(value),
            FieldValue::Enum { value, name } => FieldValue::Enum { value, name },
            FieldValue::Guid(guid) => FieldValue::Guid(guid),
            FieldValue::Bytes(bytes) => FieldValue::Bytes(Cow::Owned(bytes.into_owned())),
            FieldValue::Text(text) => FieldValue::Text(Cow::Owned(text.into_owned())),
            FieldValue::Oid { dotted, name } => FieldValue::Oid { dotted, name },
        }
    }
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::U16(value) => write!(f, "{}", value),
            FieldValue::U32(value) => write!(f, "{}", value),
            FieldValue::U64(value) => write!(f, "{}", value),
            FieldValue::Int(value) => write!(f, "{}", value),
            FieldValue::Enum { value, name: Some(name) } => write!(f, "{} ({})", name, value),
            FieldValue::Enum { value, name: None } => write!(f, "Unknown ({})", value),
            FieldValue::Guid(guid) => write!(f, "{}", guid),
            FieldValue::Bytes(bytes) => {
                for byte in bytes.iter() {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Oid { dotted, name: Some(name) } => write!(f, "{} ({})", dotted, name),
            FieldValue::Oid { dotted, name: None } => f.write_str(dotted),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A field or a vector inside a message could not be decoded.
    FieldError(ErrorKind),
    /// The enclosing message could not be decoded completely.
    MalformedMessage(ErrorKind),
    UnknownMessageType,
    InvalidSignature,
    /// The PKU2U AP-REQUEST delegate failed. Local to the PKU2U subtree.
    DelegateFailure,
    /// Decoding resumed at the next plausible signature after a malformed message.
    Resynchronized,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn field_error(error: &Error) -> Self {
        Self::new(DiagnosticKind::FieldError(error.kind()), error.to_string())
    }

    pub fn malformed_message(error: &Error) -> Self {
        Self::new(DiagnosticKind::MalformedMessage(error.kind()), error.to_string())
    }
}

/// Receiver of decoded fields.
pub trait FieldSink {
    fn emit_scalar(&mut self, path: &'static str, value: FieldValue<'_>, range: ByteRange);

    fn begin_subtree(&mut self, label: String, range: ByteRange) -> SubtreeHandle;

    fn end_subtree(&mut self, handle: SubtreeHandle);

    /// Records a decoding problem. Partial results already emitted stay valid.
    fn diagnostic(&mut self, diagnostic: Diagnostic, range: ByteRange);
}

impl<S: FieldSink + ?Sized> FieldSink for &mut S {
    fn emit_scalar(&mut self, path: &'static str, value: FieldValue<'_>, range: ByteRange) {
        (**self).emit_scalar(path, value, range)
    }

    fn begin_subtree(&mut self, label: String, range: ByteRange) -> SubtreeHandle {
        (**self).begin_subtree(label, range)
    }

    fn end_subtree(&mut self, handle: SubtreeHandle) {
        (**self).end_subtree(handle)
    }

    fn diagnostic(&mut self, diagnostic: Diagnostic, range: ByteRange) {
        (**self).diagnostic(diagnostic, range)
    }
}

/// Opens a subtree, runs `f` inside it and closes it even if `f` fails.
///
/// A failure is recorded as a [`DiagnosticKind::FieldError`] inside the subtree before it is propagated.
pub(crate) fn within<T>(
    sink: &mut dyn FieldSink,
    label: String,
    range: ByteRange,
    f: impl FnOnce(&mut dyn FieldSink) -> Result<T>,
) -> Result<T> {
    let handle = sink.begin_subtree(label, range);
    let result = f(&mut *sink);

    if let Err(err) = &result {
        sink.diagnostic(Diagnostic::field_error(err), range);
    }

    sink.end_subtree(handle);

    result
}

/// Opens a subtree, runs `f` inside it and closes it. Errors are propagated without a diagnostic.
pub(crate) fn subtree<T>(
    sink: &mut dyn FieldSink,
    label: String,
    range: ByteRange,
    f: impl FnOnce(&mut dyn FieldSink) -> Result<T>,
) -> Result<T> {
    let handle = sink.begin_subtree(label, range);
    let result = f(&mut *sink);
    sink.end_subtree(handle);

    result
}

/// Translates message-relative ranges into buffer-absolute ones.
pub(crate) struct Rebased<'s> {
    inner: &'s mut dyn FieldSink,
    base: usize,
}

impl<'s> Rebased<'s> {
    pub(crate) fn new(inner: &'s mut dyn FieldSink, base: usize) -> Self {
        Self { inner, base }
    }
}

impl FieldSink for Rebased<'_> {
    fn emit_scalar(&mut self, path: &'static str, value: FieldValue<'_>, range: ByteRange) {
        self.inner.emit_scalar(path, value, range.shifted(self.base))
    }

    fn begin_subtree(&mut self, label: String, range: ByteRange) -> SubtreeHandle {
        self.inner.begin_subtree(label, range.shifted(self.base))
    }

    fn end_subtree(&mut self, handle: SubtreeHandle) {
        self.inner.end_subtree(handle)
    }

    fn diagnostic(&mut self, diagnostic: Diagnostic, range: ByteRange) {
        self.inner.diagnostic(diagnostic, range.shifted(self.base))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEvent {
    Scalar {
        path: &'static str,
        value: FieldValue<'static>,
        range: ByteRange,
    },
    BeginSubtree {
        handle: SubtreeHandle,
        label: String,
        range: ByteRange,
    },
    EndSubtree {
        handle: SubtreeHandle,
    },
    Diagnostic {
        diagnostic: Diagnostic,
        range: ByteRange,
    },
}

/// Sink that keeps every event in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Vec<FieldEvent>,
    next_handle: usize,
    open: Vec<SubtreeHandle>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[FieldEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<FieldEvent> {
        self.events
    }

    /// Returns `true` if every opened subtree was closed in the right order.
    pub fn is_balanced(&self) -> bool {
        self.open.is_empty()
    }

    /// All values emitted under `path`, in emission order.
    pub fn values<'s>(&'s self, path: &'s str) -> impl Iterator<Item = &'s FieldValue<'static>> + 's {
        self.scalars(path).map(|(value, _)| value)
    }

    /// The first value emitted under `path`.
    pub fn value(&self, path: &str) -> Option<&FieldValue<'static>> {
        self.events.iter().find_map(|event| match event {
            FieldEvent::Scalar {
                path: event_path,
                value,
                ..
            } if *event_path == path => Some(value),
            _ => None,
        })
    }

    /// All `(value, range)` pairs emitted under `path`.
    pub fn scalars<'s>(
        &'s self,
        path: &'s str,
    ) -> impl Iterator<Item = (&'s FieldValue<'static>, ByteRange)> + 's {
        self.events.iter().filter_map(move |event| match event {
            FieldEvent::Scalar {
                path: event_path,
                value,
                range,
            } if *event_path == path => Some((value, *range)),
            _ => None,
        })
    }

    pub fn labels(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                FieldEvent::BeginSubtree { label, .. } => Some(label.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn diagnostics(&self) -> Vec<(&Diagnostic, ByteRange)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                FieldEvent::Diagnostic { diagnostic, range } => Some((diagnostic, *range)),
                _ => None,
            })
            .collect()
    }
}

impl FieldSink for RecordingSink {
    fn emit_scalar(&mut self, path: &'static str, value: FieldValue<'_>, range: ByteRange) {
        self.events.push(FieldEvent::Scalar {
            path,
            value: value.into_owned(),
            range,
        });
    }

    fn begin_subtree(&mut self, label: String, range: ByteRange) -> SubtreeHandle {
        let handle = SubtreeHandle::new(self.next_handle);
        self.next_handle += 1;
        self.open.push(handle);

        self.events.push(FieldEvent::BeginSubtree { handle, label, range });

        handle
    }

    fn end_subtree(&mut self, handle: SubtreeHandle) {
        match self.open.pop() {
            Some(open) if open == handle => {}
            other => warn!(?handle, open = ?other, "Subtree closed out of order"),
        }

        self.events.push(FieldEvent::EndSubtree { handle });
    }

    fn diagnostic(&mut self, diagnostic: Diagnostic, range: ByteRange) {
        self.events.push(FieldEvent::Diagnostic { diagnostic, range });
    }
}

/// Sink that writes every event to the `tracing` subscriber at the `TRACE` level.
#[derive(Debug, Default)]
pub struct TracingSink {
    depth: usize,
    next_handle: usize,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FieldSink for TracingSink {
    fn emit_scalar(&mut self, path: &'static str, value: FieldValue<'_>, range: ByteRange) {
        trace!(depth = self.depth, path, %value, ?range);
    }

    fn begin_subtree(&mut self, label: String, range: ByteRange) -> SubtreeHandle {
        trace!(depth = self.depth, %label, ?range, "begin");

        let handle = SubtreeHandle::new(self.next_handle);
        self.next_handle += 1;
        self.depth += 1;

        handle
    }

    fn end_subtree(&mut self, _handle: SubtreeHandle) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn diagnostic(&mut self, diagnostic: Diagnostic, range: ByteRange) {
        warn!(depth = self.depth, kind = ?diagnostic.kind, message = %diagnostic.message, ?range);
    }
}
