//! Reporting of unsupported or degraded input.
//!
//! Resolution never fails the caller. When something is skipped or
//! degraded, the [`Factory`](crate::Factory) emits a [`Diagnostic`] to its
//! [`DiagnosticSink`]. The default sink forwards to `tracing`.

use std::fmt;

use parking_lot::Mutex;

use crate::codec::CodecId;

/// How noteworthy a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Expected condition (e.g. metadata without an audio track).
    Info,
    /// Input outside the supported set, or configuration that was dropped.
    Warn,
}

/// A single condition reported during resolution or construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// SDP encoding name not supported. Carries the name and fmtp.
    UnsupportedSdp { codec: String, fmtp: String },
    /// Codec id has no implementation in the factory that was asked.
    UnsupportedCodec { codec: CodecId, context: &'static str },
    /// Metadata string or number with no codec mapping.
    UnsupportedMetadata { value: String },
    /// Configuration present but unusable; a bare track was built instead.
    MalformedConfig { codec: CodecId, reason: String },
    /// Metadata entry carries no track.
    AbsentTrack,
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Self::AbsentTrack => Severity::Info,
            _ => Severity::Warn,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedSdp { codec, fmtp } => {
                write!(f, "unsupported SDP codec: {codec} {fmtp}")
            }
            Self::UnsupportedCodec { codec, context } => {
                write!(f, "unsupported codec for {context}: {codec}")
            }
            Self::UnsupportedMetadata { value } => write!(f, "unsupported metadata codec: {value}"),
            Self::MalformedConfig { codec, reason } => {
                write!(f, "malformed {codec} configuration: {reason}")
            }
            Self::AbsentTrack => write!(f, "metadata has no matching track"),
        }
    }
}

/// Destination for [`Diagnostic`]s.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing` at the matching level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        match diagnostic.severity() {
            Severity::Info => tracing::info!(%diagnostic, "media factory"),
            Severity::Warn => tracing::warn!(%diagnostic, "media factory"),
        }
    }
}

/// Collects diagnostics in memory, for tests and for callers that surface
/// them elsewhere (e.g. a session's error report).
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.entries.lock())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl DiagnosticSink for MemorySink {
    fn report(&self, diagnostic: Diagnostic) {
        self.entries.lock().push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_track_is_info() {
        assert_eq!(Diagnostic::AbsentTrack.severity(), Severity::Info);
        assert_eq!(
            Diagnostic::UnsupportedMetadata { value: "1".into() }.severity(),
            Severity::Warn
        );
    }

    #[test]
    fn memory_sink_collects_and_drains() {
        let sink = MemorySink::new();
        sink.report(Diagnostic::AbsentTrack);
        assert_eq!(sink.entries(), vec![Diagnostic::AbsentTrack]);
        assert_eq!(sink.take().len(), 1);
        assert!(sink.is_empty());
    }
}
