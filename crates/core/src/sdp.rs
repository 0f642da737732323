//! Attribute extraction from a single SDP media section (RFC 8866 §5.14).
//!
//! Only the lines the factory needs are read:
//!
//! ```text
//! m=audio 0 RTP/AVP 97                                  ← media kind, payload type
//! a=rtpmap:97 mpeg4-generic/44100/2                     ← codec, clock rate, channels
//! a=fmtp:97 streamtype=5;mode=AAC-hbr;config=1210;...  ← format parameters
//! ```
//!
//! Session-level parsing (origin, timing, bundling, multiple formats per
//! section) belongs to the session layer that owns the full description.

use crate::codec::{CodecId, TrackType};

/// Read-only view of one negotiated media stream.
///
/// Implemented by the session layer's media description type; [`SdpTrack`]
/// is the value type this crate provides.
pub trait SdpMedia {
    /// Encoding name from `a=rtpmap` (e.g. `H264`, `mpeg4-generic`).
    fn codec_name(&self) -> &str;

    /// Full `a=fmtp:` value, including the leading payload type.
    fn fmtp(&self) -> &str;

    fn payload_type(&self) -> u8;

    /// RTP clock rate from `a=rtpmap`.
    fn sample_rate(&self) -> u32;

    fn track_type(&self) -> TrackType;

    fn codec_id(&self) -> CodecId {
        CodecId::from_sdp_name(self.codec_name())
    }
}

/// Attributes of one SDP media section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdpTrack {
    pub codec_name: String,
    pub fmtp: String,
    pub payload_type: u8,
    pub sample_rate: u32,
    pub channels: Option<u8>,
    pub track_type: TrackType,
}

impl SdpTrack {
    pub fn new(
        track_type: TrackType,
        payload_type: u8,
        codec_name: &str,
        sample_rate: u32,
        fmtp: &str,
    ) -> Self {
        Self {
            codec_name: codec_name.to_string(),
            fmtp: fmtp.to_string(),
            payload_type,
            sample_rate,
            channels: None,
            track_type,
        }
    }

    /// Extract attributes from the lines of one media section.
    ///
    /// The first payload type on the `m=` line selects which `a=rtpmap` and
    /// `a=fmtp` lines apply. Returns `None` without an `m=audio`/`m=video`
    /// line.
    ///
    /// ```
    /// use media_factory::sdp::SdpTrack;
    /// use media_factory::TrackType;
    ///
    /// let section = "m=video 0 RTP/AVP 96\r\n\
    ///                a=rtpmap:96 H264/90000\r\n\
    ///                a=fmtp:96 packetization-mode=1\r\n";
    /// let track = SdpTrack::parse(section).unwrap();
    /// assert_eq!(track.track_type, TrackType::Video);
    /// assert_eq!(track.codec_name, "H264");
    /// assert_eq!(track.fmtp, "96 packetization-mode=1");
    /// ```
    pub fn parse(section: &str) -> Option<Self> {
        let mut lines = section.lines().map(str::trim).filter(|l| !l.is_empty());

        let media = lines.find_map(|l| l.strip_prefix("m="))?;
        let mut fields = media.split_whitespace();
        let track_type = TrackType::from_media(fields.next()?)?;
        let payload_type: u8 = fields.nth(2)?.parse().ok()?;

        let mut track = Self::new(track_type, payload_type, "", 0, "");
        for line in lines {
            if let Some(rtpmap) = line.strip_prefix("a=rtpmap:") {
                let Some((pt, encoding)) = rtpmap.split_once(' ') else {
                    continue;
                };
                if pt.trim().parse::<u8>().ok() != Some(payload_type) {
                    continue;
                }
                let mut parts = encoding.trim().split('/');
                track.codec_name = parts.next().unwrap_or_default().to_string();
                track.sample_rate = parts.next().and_then(|r| r.parse().ok()).unwrap_or(0);
                track.channels = parts.next().and_then(|c| c.parse().ok());
            } else if let Some(fmtp) = line.strip_prefix("a=fmtp:") {
                let pt = fmtp.split_whitespace().next().and_then(|p| p.parse::<u8>().ok());
                if pt == Some(payload_type) {
                    track.fmtp = fmtp.to_string();
                }
            }
        }

        tracing::debug!(
            codec = %track.codec_name,
            pt = track.payload_type,
            rate = track.sample_rate,
            kind = %track.track_type,
            "SDP media section parsed"
        );

        Some(track)
    }
}

impl SdpMedia for SdpTrack {
    fn codec_name(&self) -> &str {
        &self.codec_name
    }

    fn fmtp(&self) -> &str {
        &self.fmtp
    }

    fn payload_type(&self) -> u8 {
        self.payload_type
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn track_type(&self) -> TrackType {
        self.track_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aac_section() {
        let section = "m=audio 0 RTP/AVP 97\r\n\
                       a=rtpmap:97 mpeg4-generic/44100/2\r\n\
                       a=fmtp:97 streamtype=5;profile-level-id=1;mode=AAC-hbr;sizelength=13;indexlength=3;indexdeltalength=3;config=1210\r\n\
                       a=control:trackID=1\r\n";
        let track = SdpTrack::parse(section).expect("media section");
        assert_eq!(track.track_type, TrackType::Audio);
        assert_eq!(track.payload_type, 97);
        assert_eq!(track.sample_rate, 44100);
        assert_eq!(track.channels, Some(2));
        assert_eq!(track.codec_id(), CodecId::Aac);
        assert!(track.fmtp.ends_with("config=1210"));
    }

    #[test]
    fn ignores_attributes_for_other_payload_types() {
        let section = "m=video 0 RTP/AVP 96 98\n\
                       a=rtpmap:98 H265/90000\n\
                       a=fmtp:98 sprop-sps=QgE=\n\
                       a=rtpmap:96 H264/90000\n";
        let track = SdpTrack::parse(section).expect("media section");
        assert_eq!(track.codec_name, "H264");
        assert_eq!(track.fmtp, "");
    }

    #[test]
    fn rejects_sections_without_media_line() {
        assert!(SdpTrack::parse("a=rtpmap:96 H264/90000").is_none());
        assert!(SdpTrack::parse("m=application 9 UDP/DTLS/SCTP 5000").is_none());
        assert!(SdpTrack::parse("m=video 0 RTP/AVP").is_none());
    }

    #[test]
    fn static_payload_type_without_rtpmap() {
        let track = SdpTrack::parse("m=audio 0 RTP/AVP 0").expect("media section");
        assert_eq!(track.codec_name, "");
        assert_eq!(track.codec_id(), CodecId::Invalid);
    }
}
