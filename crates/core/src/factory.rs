//! Track resolution and codec construction.
//!
//! The [`Factory`] turns protocol descriptors into [`Track`]s and builds the
//! RTP and RTMP codecs for them:
//!
//! ```text
//! SdpMedia ──resolve_track_from_attributes──▶ Track ──decoder_for_track──▶ RtpDecoder
//!     │                                         │
//!     └──────────encoder_for_stream─────────────┼──────────────────────────▶ RtpEncoder
//!                                               └──muxer_for_track────────▶ RtmpEncoder
//! AmfValue ──codec_id_from_metadata──▶ CodecId ──track_from_codec_id──▶ Track
//! ```
//!
//! None of these calls fail the caller. Unsupported codecs give `None`;
//! unusable configuration gives a bare track. Both are reported to the
//! factory's [`DiagnosticSink`].

use std::sync::Arc;

use parking_lot::RwLock;

use crate::attribute::{H265_SPS_PPS, H265_VPS_SPS_PPS, find_aac_config, find_field};
use crate::codec::{CodecId, TrackType};
use crate::decode::{decode_aac_config, decode_base64};
use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::metadata::{self, AmfValue, Lookup};
use crate::rtmp::RtmpEncoder;
use crate::rtmp::aac::AacRtmpEncoder;
use crate::rtmp::h264::H264RtmpEncoder;
use crate::rtp::aac::{AacRtpDecoder, AacRtpEncoder};
use crate::rtp::h264::{H264RtpDecoder, H264RtpEncoder};
use crate::rtp::h265::{H265RtpDecoder, H265RtpEncoder};
use crate::rtp::{EncoderParams, MAX_PACKET_LEN, RtpDecoder, RtpEncoder};
use crate::sdp::SdpMedia;
use crate::ssrc::{ProcessSsrc, SsrcSource};
use crate::track::{AacTrack, H264Track, H265Track, Track};

/// Default maximum RTP packet size for audio streams.
pub const DEFAULT_AUDIO_MTU: usize = 600;
/// Default maximum RTP packet size for video streams.
pub const DEFAULT_VIDEO_MTU: usize = 1400;

/// Settings read by the factory on every encoder construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryConfig {
    /// Maximum RTP packet size (header included) for audio encoders.
    pub audio_mtu: usize,
    /// Maximum RTP packet size (header included) for video encoders.
    pub video_mtu: usize,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            audio_mtu: DEFAULT_AUDIO_MTU,
            video_mtu: DEFAULT_VIDEO_MTU,
        }
    }
}

impl FactoryConfig {
    pub fn with_audio_mtu(mut self, mtu: usize) -> Self {
        self.audio_mtu = mtu;
        self
    }

    pub fn with_video_mtu(mut self, mtu: usize) -> Self {
        self.video_mtu = mtu;
        self
    }

    /// Effective MTU for a track type, capped at [`MAX_PACKET_LEN`].
    pub fn mtu_for(&self, track_type: TrackType) -> usize {
        let mtu = match track_type {
            TrackType::Audio => self.audio_mtu,
            TrackType::Video => self.video_mtu,
        };
        mtu.min(MAX_PACKET_LEN)
    }
}

/// Resolves tracks and constructs codecs.
///
/// Cheap to clone; clones share configuration, SSRC source and sink.
/// Safe to use from any number of threads.
#[derive(Clone)]
pub struct Factory {
    config: Arc<RwLock<FactoryConfig>>,
    ssrc: Arc<dyn SsrcSource>,
    sink: Arc<dyn DiagnosticSink>,
}

impl Default for Factory {
    fn default() -> Self {
        Self::new(FactoryConfig::default())
    }
}

impl Factory {
    /// Factory using the process-wide SSRC counter and `tracing` diagnostics.
    pub fn new(config: FactoryConfig) -> Self {
        Self::with_parts(config, Arc::new(ProcessSsrc), Arc::new(TracingSink))
    }

    pub fn with_parts(
        config: FactoryConfig,
        ssrc: Arc<dyn SsrcSource>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            ssrc,
            sink,
        }
    }

    pub fn config(&self) -> FactoryConfig {
        self.config.read().clone()
    }

    /// Replace the configuration. Encoders built afterwards use it;
    /// existing encoders keep the values they were built with.
    pub fn update_config(&self, config: FactoryConfig) {
        tracing::info!(
            audio_mtu = config.audio_mtu,
            video_mtu = config.video_mtu,
            "factory config updated"
        );
        *self.config.write() = config;
    }

    fn report(&self, diagnostic: Diagnostic) {
        self.sink.report(diagnostic);
    }

    // --- Track resolution ---

    /// Build a track from an SDP media description.
    ///
    /// Returns `None` for encoding names other than `mpeg4-generic`, `h264`
    /// and `h265`. Missing or malformed configuration yields a bare track.
    pub fn resolve_track_from_attributes(&self, media: &dyn SdpMedia) -> Option<Track> {
        let fmtp = media.fmtp();
        match media.codec_id() {
            CodecId::Aac => Some(self.aac_from_fmtp(fmtp).into()),
            CodecId::H264 => Some(self.h264_from_fmtp(fmtp).into()),
            CodecId::H265 => Some(self.h265_from_fmtp(fmtp).into()),
            CodecId::Invalid => {
                self.report(Diagnostic::UnsupportedSdp {
                    codec: media.codec_name().to_string(),
                    fmtp: fmtp.to_string(),
                });
                None
            }
        }
    }

    fn aac_from_fmtp(&self, fmtp: &str) -> AacTrack {
        let value = find_aac_config(fmtp);
        if value.is_empty() {
            tracing::debug!("no AAC config in fmtp; waiting for ADTS");
            return AacTrack::new();
        }
        match decode_aac_config(value) {
            Ok(config) => AacTrack::with_config(config),
            Err(e) => {
                self.report(Diagnostic::MalformedConfig {
                    codec: CodecId::Aac,
                    reason: format!("config={value}: {e}"),
                });
                AacTrack::new()
            }
        }
    }

    fn h264_from_fmtp(&self, fmtp: &str) -> H264Track {
        let sprop = find_field(fmtp, Some("sprop-parameter-sets="), None);
        if sprop.is_empty() {
            return H264Track::new();
        }
        let sps = find_field(sprop, None, Some(","));
        let mut pps = find_field(sprop, Some(","), None);
        if let Some(stripped) = pps.strip_suffix(';') {
            pps = stripped;
        }
        // Parameters following sprop-parameter-sets, or extra PPS entries.
        if let Some(end) = pps.find([';', ',']) {
            pps = &pps[..end];
        }

        match (decode_base64(sps), decode_base64(pps)) {
            (Ok(sps), Ok(pps)) if !sps.is_empty() && !pps.is_empty() => {
                H264Track::with_parameter_sets(sps, pps)
            }
            (sps, pps) => {
                let reason = match (sps.err(), pps.err()) {
                    (Some(e), _) | (None, Some(e)) => e.to_string(),
                    (None, None) => "empty parameter set".to_string(),
                };
                self.report(Diagnostic::MalformedConfig {
                    codec: CodecId::H264,
                    reason: format!("sprop-parameter-sets={sprop}: {reason}"),
                });
                H264Track::new()
            }
        }
    }

    fn h265_from_fmtp(&self, fmtp: &str) -> H265Track {
        let (vps, sps, pps) = if let Some(caps) = H265_VPS_SPS_PPS.captures(fmtp) {
            (caps.fields[0], caps.fields[1], caps.fields[2])
        } else if let Some(caps) = H265_SPS_PPS.captures(fmtp) {
            ("", caps.fields[0], caps.fields[1])
        } else {
            return H265Track::new();
        };

        let decoded = decode_base64(vps)
            .and_then(|vps| Ok((vps, decode_base64(sps)?, decode_base64(pps)?)));
        match decoded {
            Ok((vps, sps, pps)) => H265Track::with_parameter_sets(vps, sps, pps),
            Err(e) => {
                self.report(Diagnostic::MalformedConfig {
                    codec: CodecId::H265,
                    reason: e.to_string(),
                });
                H265Track::new()
            }
        }
    }

    /// Bare track for a codec id; `None` for [`CodecId::Invalid`].
    pub fn track_from_codec_id(&self, codec: CodecId) -> Option<Track> {
        match codec {
            CodecId::H264 => Some(H264Track::new().into()),
            CodecId::H265 => Some(H265Track::new().into()),
            CodecId::Aac => Some(AacTrack::new().into()),
            CodecId::Invalid => {
                self.report(Diagnostic::UnsupportedCodec {
                    codec,
                    context: "track",
                });
                None
            }
        }
    }

    // --- RTMP metadata ---

    /// Codec named by an `onMetaData` `videocodecid`/`audiocodecid` value.
    pub fn codec_id_from_metadata(&self, value: &AmfValue) -> CodecId {
        match metadata::lookup(value) {
            Lookup::Codec(codec) => codec,
            Lookup::UnknownString(s) => {
                self.report(Diagnostic::UnsupportedMetadata { value: s });
                CodecId::Invalid
            }
            Lookup::UnknownNumber(n) => {
                self.report(Diagnostic::UnsupportedMetadata {
                    value: n.to_string(),
                });
                CodecId::Invalid
            }
            Lookup::Absent => {
                self.report(Diagnostic::AbsentTrack);
                CodecId::Invalid
            }
        }
    }

    /// Metadata value advertising `codec`: `"avc1"`, `"mp4a"` or null.
    ///
    /// H.265 has no entry and maps to null, so it does not round-trip
    /// through [`codec_id_from_metadata`](Self::codec_id_from_metadata).
    pub fn metadata_from_codec_id(codec: CodecId) -> AmfValue {
        metadata::metadata_from_codec_id(codec)
    }

    pub fn track_from_metadata(&self, value: &AmfValue) -> Option<Track> {
        match self.codec_id_from_metadata(value) {
            CodecId::Invalid => None,
            codec => self.track_from_codec_id(codec),
        }
    }

    // --- RTP ---

    /// Build the RTP packetizer for an outgoing stream.
    ///
    /// Every call draws a fresh SSRC. The interleaved channel is
    /// `2 * track type` (audio 0, video 2).
    pub fn encoder_for_stream(&self, media: &dyn SdpMedia) -> Option<Box<dyn RtpEncoder>> {
        let codec = media.codec_id();
        if codec == CodecId::Invalid {
            self.report(Diagnostic::UnsupportedCodec {
                codec,
                context: "RTP encoder",
            });
            return None;
        }

        let track_type = media.track_type();
        let params = EncoderParams {
            ssrc: self.ssrc.next_ssrc(),
            mtu: self.config.read().mtu_for(track_type),
            sample_rate: media.sample_rate(),
            payload_type: media.payload_type(),
            interleaved: track_type.interleaved(),
        };
        tracing::debug!(
            %codec,
            ssrc = format_args!("{:#010X}", params.ssrc),
            mtu = params.mtu,
            pt = params.payload_type,
            interleaved = params.interleaved,
            "RTP encoder created"
        );

        Some(match codec {
            CodecId::H264 => Box::new(H264RtpEncoder::new(params)),
            CodecId::H265 => Box::new(H265RtpEncoder::new(params)),
            CodecId::Aac => Box::new(AacRtpEncoder::new(params)),
            CodecId::Invalid => return None,
        })
    }

    /// Build the RTP depacketizer for a track. The AAC decoder keeps its
    /// own copy of the track for the AudioSpecificConfig.
    pub fn decoder_for_track(&self, track: &Track) -> Option<Box<dyn RtpDecoder>> {
        Some(match track {
            Track::H264(_) => Box::new(H264RtpDecoder::new()),
            Track::H265(_) => Box::new(H265RtpDecoder::new()),
            Track::Aac(aac) => Box::new(AacRtpDecoder::new(aac.clone())),
        })
    }

    /// RTP depacketizer from a bare codec id.
    pub fn decoder_for_codec_id(&self, codec: CodecId) -> Option<Box<dyn RtpDecoder>> {
        let track = self.track_from_codec_id(codec)?;
        self.decoder_for_track(&track)
    }

    // --- RTMP ---

    /// Build the RTMP muxer for a track. Only H.264 and AAC are supported.
    pub fn muxer_for_track(&self, track: &Track) -> Option<Box<dyn RtmpEncoder>> {
        match track {
            Track::H264(h264) => Some(Box::new(H264RtmpEncoder::new(h264.clone()))),
            Track::Aac(aac) => Some(Box::new(AacRtmpEncoder::new(aac.clone()))),
            Track::H265(_) => {
                self.report(Diagnostic::UnsupportedCodec {
                    codec: CodecId::H265,
                    context: "RTMP muxer",
                });
                None
            }
        }
    }
}
