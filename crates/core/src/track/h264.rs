use base64::prelude::{BASE64_STANDARD, Engine as _};

use super::FrameTiming;

/// NAL unit types used for configuration (ITU-T H.264 Table 7-1).
pub const NAL_SPS: u8 = 7;
pub const NAL_PPS: u8 = 8;
pub const NAL_IDR: u8 = 5;

/// H.264 stream description.
///
/// SPS and PPS are raw NAL units without start codes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct H264Track {
    sps: Option<Vec<u8>>,
    pps: Option<Vec<u8>>,
    timing: FrameTiming,
}

impl H264Track {
    /// Bare track; parameter sets arrive in-band.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track with out-of-band parameter sets and zeroed timing.
    pub fn with_parameter_sets(sps: Vec<u8>, pps: Vec<u8>) -> Self {
        Self::with_timing(sps, pps, FrameTiming::default())
    }

    pub fn with_timing(sps: Vec<u8>, pps: Vec<u8>, timing: FrameTiming) -> Self {
        Self {
            sps: Some(sps).filter(|s| !s.is_empty()),
            pps: Some(pps).filter(|p| !p.is_empty()),
            timing,
        }
    }

    pub fn sps(&self) -> Option<&[u8]> {
        self.sps.as_deref()
    }

    pub fn pps(&self) -> Option<&[u8]> {
        self.pps.as_deref()
    }

    pub fn timing(&self) -> FrameTiming {
        self.timing
    }

    pub fn is_ready(&self) -> bool {
        self.sps.is_some() && self.pps.is_some()
    }

    /// `profile-level-id` (RFC 6184 §8.1): SPS bytes 1–3 as hex.
    pub fn profile_level_id(&self) -> Option<String> {
        let sps = self.sps.as_deref()?;
        if sps.len() < 4 {
            return None;
        }
        Some(format!("{:02x}{:02x}{:02x}", sps[1], sps[2], sps[3]))
    }

    /// `sprop-parameter-sets` value: `base64(SPS),base64(PPS)`.
    pub fn sprop_parameter_sets(&self) -> Option<String> {
        let sps = self.sps.as_deref()?;
        let pps = self.pps.as_deref()?;
        Some(format!(
            "{},{}",
            BASE64_STANDARD.encode(sps),
            BASE64_STANDARD.encode(pps)
        ))
    }
}
