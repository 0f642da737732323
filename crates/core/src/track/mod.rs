//! Stream descriptions ("tracks").
//!
//! A [`Track`] holds the codec configuration a packetizer, depacketizer or
//! muxer needs to handle one media stream:
//!
//! | Variant | Configuration | Source |
//! |---------|---------------|--------|
//! | [`H264Track`] | SPS, PPS | `sprop-parameter-sets` (RFC 6184 §8.1) |
//! | [`H265Track`] | VPS, SPS, PPS | `sprop-vps/sps/pps` (RFC 7798 §7.1) |
//! | [`AacTrack`] | 2-byte AudioSpecificConfig | `config=` (RFC 3640 §4.1) |
//!
//! Every variant can be built *bare*, without configuration. Bare tracks are
//! used when the descriptor does not carry (usable) configuration; the
//! codecs built from them pick it up in-band from the media itself.
//!
//! Tracks are plain values: configuration is fixed at construction and the
//! codec never changes.

pub mod aac;
pub mod h264;
pub mod h265;

pub use aac::AacTrack;
pub use h264::H264Track;
pub use h265::H265Track;

use crate::codec::{CodecId, TrackType};

/// 90 kHz RTP clock for video (RFC 6184 §8.1, RFC 7798 §7.1).
pub const VIDEO_CLOCK_RATE: u32 = 90_000;

/// Optional video timing hints. All zero when unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTiming {
    pub width: u32,
    pub height: u32,
    pub fps: f32,
}

impl FrameTiming {
    pub fn is_known(&self) -> bool {
        self.width != 0 && self.height != 0
    }
}

/// Codec-specific stream description.
#[derive(Debug, Clone, PartialEq)]
pub enum Track {
    H264(H264Track),
    H265(H265Track),
    Aac(AacTrack),
}

impl Track {
    pub fn codec_id(&self) -> CodecId {
        match self {
            Self::H264(_) => CodecId::H264,
            Self::H265(_) => CodecId::H265,
            Self::Aac(_) => CodecId::Aac,
        }
    }

    pub fn track_type(&self) -> TrackType {
        match self {
            Self::H264(_) | Self::H265(_) => TrackType::Video,
            Self::Aac(_) => TrackType::Audio,
        }
    }

    /// Whether all configuration needed to decode/mux the stream is present.
    pub fn is_ready(&self) -> bool {
        match self {
            Self::H264(t) => t.is_ready(),
            Self::H265(t) => t.is_ready(),
            Self::Aac(t) => t.is_ready(),
        }
    }

    /// Media clock rate. For AAC this is the sampling rate from the
    /// AudioSpecificConfig, `None` if the track is bare.
    pub fn clock_rate(&self) -> Option<u32> {
        match self {
            Self::H264(_) | Self::H265(_) => Some(VIDEO_CLOCK_RATE),
            Self::Aac(t) => t.sample_rate(),
        }
    }
}

impl From<H264Track> for Track {
    fn from(track: H264Track) -> Self {
        Self::H264(track)
    }
}

impl From<H265Track> for Track {
    fn from(track: H265Track) -> Self {
        Self::H265(track)
    }
}

impl From<AacTrack> for Track {
    fn from(track: AacTrack) -> Self {
        Self::Aac(track)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_ids_follow_variant() {
        assert_eq!(Track::from(H264Track::new()).codec_id(), CodecId::H264);
        assert_eq!(Track::from(H265Track::new()).codec_id(), CodecId::H265);
        assert_eq!(Track::from(AacTrack::new()).codec_id(), CodecId::Aac);
    }

    #[test]
    fn bare_tracks_not_ready() {
        assert!(!Track::from(H264Track::new()).is_ready());
        assert!(!Track::from(H265Track::new()).is_ready());
        assert!(!Track::from(AacTrack::new()).is_ready());
    }

    #[test]
    fn clock_rates() {
        assert_eq!(Track::from(H264Track::new()).clock_rate(), Some(90_000));
        assert_eq!(Track::from(AacTrack::new()).clock_rate(), None);
        assert_eq!(
            Track::from(AacTrack::with_config([0x11, 0x90])).clock_rate(),
            Some(48_000)
        );
    }
}
