use base64::prelude::{BASE64_STANDARD, Engine as _};

use super::FrameTiming;

/// NAL unit types used for configuration (ITU-T H.265 Table 7-1).
pub const NAL_VPS: u8 = 32;
pub const NAL_SPS: u8 = 33;
pub const NAL_PPS: u8 = 34;

/// H.265 NAL type lives in bits 1..6 of the first header byte.
pub fn nal_type(header: u8) -> u8 {
    (header >> 1) & 0x3f
}

/// H.265 (HEVC) stream description.
///
/// Some senders omit `sprop-vps`; such tracks carry SPS/PPS only and report
/// an empty VPS until one arrives in-band.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct H265Track {
    vps: Option<Vec<u8>>,
    sps: Option<Vec<u8>>,
    pps: Option<Vec<u8>>,
    timing: FrameTiming,
}

impl H265Track {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track with out-of-band parameter sets. An empty `vps` is recorded as
    /// absent.
    pub fn with_parameter_sets(vps: Vec<u8>, sps: Vec<u8>, pps: Vec<u8>) -> Self {
        Self {
            vps: Some(vps).filter(|v| !v.is_empty()),
            sps: Some(sps).filter(|s| !s.is_empty()),
            pps: Some(pps).filter(|p| !p.is_empty()),
            timing: FrameTiming::default(),
        }
    }

    /// VPS bytes, empty when the sender did not provide one.
    pub fn vps(&self) -> &[u8] {
        self.vps.as_deref().unwrap_or_default()
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
        self.vps.is_some() && self.sps.is_some() && self.pps.is_some()
    }

    /// fmtp parameters in RFC 7798 §7.1 form, VPS omitted when absent.
    pub fn sprop(&self) -> Option<String> {
        let sps = self.sps.as_deref()?;
        let pps = self.pps.as_deref()?;
        let mut out = String::new();
        if let Some(vps) = self.vps.as_deref() {
            out.push_str(&format!("sprop-vps={}; ", BASE64_STANDARD.encode(vps)));
        }
        out.push_str(&format!(
            "sprop-sps={}; sprop-pps={}",
            BASE64_STANDARD.encode(sps),
            BASE64_STANDARD.encode(pps)
        ));
        Some(out)
    }
}
