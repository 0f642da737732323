//! Codec identifiers and track kinds.

use std::fmt;

/// Media codecs this crate knows how to build tracks and codecs for.
///
/// [`Invalid`](Self::Invalid) is the explicit "unsupported / absent" value
/// and never describes a real stream. New codecs are added here and then
/// in each factory `match`, which the compiler keeps exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecId {
    H264,
    H265,
    Aac,
    Invalid,
}

impl CodecId {
    /// Map an SDP `a=rtpmap` encoding name to a codec (case-insensitive).
    ///
    /// ```
    /// use media_factory::CodecId;
    ///
    /// assert_eq!(CodecId::from_sdp_name("H264"), CodecId::H264);
    /// assert_eq!(CodecId::from_sdp_name("MPEG4-GENERIC"), CodecId::Aac);
    /// assert_eq!(CodecId::from_sdp_name("PCMU"), CodecId::Invalid);
    /// ```
    pub fn from_sdp_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("h264") {
            Self::H264
        } else if name.eq_ignore_ascii_case("h265") {
            Self::H265
        } else if name.eq_ignore_ascii_case("mpeg4-generic") {
            Self::Aac
        } else {
            Self::Invalid
        }
    }

    pub fn is_valid(self) -> bool {
        self != Self::Invalid
    }

    /// Track kind carried by this codec, `None` for `Invalid`.
    pub fn track_type(self) -> Option<TrackType> {
        match self {
            Self::H264 | Self::H265 => Some(TrackType::Video),
            Self::Aac => Some(TrackType::Audio),
            Self::Invalid => None,
        }
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::H264 => write!(f, "H264"),
            Self::H265 => write!(f, "H265"),
            Self::Aac => write!(f, "AAC"),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}

/// Media kind of a track.
///
/// The discriminant is the track index used to derive the RTSP interleaved
/// channel (`2 * index`): audio on channel 0, video on channel 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TrackType {
    Audio = 0,
    Video = 1,
}

impl TrackType {
    /// RTP interleaved channel for this kind (RFC 2326 §10.12).
    pub fn interleaved(self) -> u8 {
        2 * self as u8
    }

    /// Parse the media token of an SDP `m=` line.
    pub fn from_media(media: &str) -> Option<Self> {
        match media {
            "audio" => Some(Self::Audio),
            "video" => Some(Self::Video),
            _ => None,
        }
    }
}

impl fmt::Display for TrackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Audio => write!(f, "audio"),
            Self::Video => write!(f, "video"),
        }
    }
}
