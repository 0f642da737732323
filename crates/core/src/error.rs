//! Error types for the media factory library.

use std::fmt;

/// Errors raised by the low-level decoders in this crate.
///
/// The [`Factory`](crate::Factory) itself never surfaces these to callers:
/// it reports them through a [`DiagnosticSink`](crate::DiagnosticSink) and
/// degrades to a bare track or `None`. They are returned directly by the
/// building blocks ([`decode`](crate::decode), RTP depacketizers) so that
/// callers using those pieces on their own can see what went wrong.
///
/// - **Config**: [`Base64`](Self::Base64), [`Hex`](Self::Hex),
///   [`ConfigLength`](Self::ConfigLength).
/// - **RTP**: [`PacketTooShort`](Self::PacketTooShort),
///   [`UnsupportedVersion`](Self::UnsupportedVersion),
///   [`Fragment`](Self::Fragment).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A parameter set was not valid base64.
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// An AudioSpecificConfig string was not valid hex.
    #[error("hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Decoded configuration has the wrong size.
    #[error("configuration length {actual}, expected {expected}")]
    ConfigLength { expected: usize, actual: usize },

    /// RTP packet (or payload) shorter than its headers claim.
    #[error("packet too short: {len} bytes, need {needed}")]
    PacketTooShort { len: usize, needed: usize },

    /// RTP version field was not 2 (RFC 3550 §5.1).
    #[error("unsupported RTP version {0}")]
    UnsupportedVersion(u8),

    /// Fragmented NAL unit could not be reassembled.
    #[error("fragmentation error: {0}")]
    Fragment(FragmentErrorKind),
}

/// Specific kind of fragmentation failure in FU-A / H.265 FU reassembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentErrorKind {
    /// A middle or end fragment arrived with no start fragment buffered.
    MissingStart,
    /// Sequence number gap inside a fragmented unit.
    SequenceGap,
}

impl fmt::Display for FragmentErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStart => write!(f, "fragment without start"),
            Self::SequenceGap => write!(f, "sequence gap inside fragmented unit"),
        }
    }
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
