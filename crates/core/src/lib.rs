//! Codec factory for a streaming media server.
//!
//! Resolves SDP media descriptions and RTMP metadata into [`Track`]s and
//! builds the RTP packetizers, RTP depacketizers and RTMP muxers for them.
//! See [`Factory`].

pub mod attribute;
pub mod codec;
pub mod decode;
pub mod diagnostics;
pub mod error;
pub mod factory;
pub mod frame;
pub mod metadata;
pub mod rtmp;
pub mod rtp;
pub mod sdp;
pub mod ssrc;
pub mod track;

pub use codec::{CodecId, TrackType};
pub use diagnostics::{Diagnostic, DiagnosticSink, MemorySink, Severity, TracingSink};
pub use error::{Error, Result};
pub use factory::{Factory, FactoryConfig};
pub use frame::Frame;
pub use metadata::AmfValue;
pub use rtmp::{RtmpEncoder, RtmpPacket};
pub use rtp::{EncoderParams, RtpDecoder, RtpEncoder, RtpPacket};
pub use sdp::{SdpMedia, SdpTrack};
pub use ssrc::{CounterSsrc, ProcessSsrc, RandomSsrc, SsrcSource};
pub use track::{AacTrack, H264Track, H265Track, Track};
