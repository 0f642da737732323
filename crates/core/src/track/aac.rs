//! AAC track and AudioSpecificConfig / ADTS helpers (ISO/IEC 14496-3).
//!
//! ```text
//! AudioSpecificConfig (2 bytes, the only form we accept):
//!   audioObjectType         5 bits
//!   samplingFrequencyIndex  4 bits
//!   channelConfiguration    4 bits
//!   GASpecificConfig        3 bits
//! ```

/// Sampling rates indexed by `samplingFrequencyIndex`.
const SAMPLE_RATES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

pub const ADTS_HEADER_LEN: usize = 7;

/// AAC stream description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AacTrack {
    config: Option<[u8; 2]>,
}

impl AacTrack {
    /// Bare track; configuration comes from ADTS headers later.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: [u8; 2]) -> Self {
        Self {
            config: Some(config),
        }
    }

    pub fn config(&self) -> Option<[u8; 2]> {
        self.config
    }

    pub fn is_ready(&self) -> bool {
        self.config.is_some()
    }

    /// The config as written in `config=` (upper-case hex).
    pub fn config_hex(&self) -> Option<String> {
        self.config.map(hex::encode_upper)
    }

    pub fn object_type(&self) -> Option<u8> {
        self.config.map(|c| c[0] >> 3)
    }

    pub fn sample_rate(&self) -> Option<u32> {
        let c = self.config?;
        let index = ((c[0] & 0x07) << 1) | (c[1] >> 7);
        SAMPLE_RATES.get(index as usize).copied()
    }

    pub fn channels(&self) -> Option<u8> {
        self.config.map(|c| (c[1] >> 3) & 0x0f)
    }
}

/// Build a 7-byte ADTS header (no CRC) for a raw AAC frame of
/// `payload_len` bytes.
pub fn adts_header(config: [u8; 2], payload_len: usize) -> [u8; ADTS_HEADER_LEN] {
    let object_type = config[0] >> 3;
    let freq_index = ((config[0] & 0x07) << 1) | (config[1] >> 7);
    let channels = (config[1] >> 3) & 0x0f;
    let profile = object_type.saturating_sub(1) & 0x03;
    let frame_len = (payload_len + ADTS_HEADER_LEN) & 0x1fff;

    [
        0xff,
        0xf1,
        (profile << 6) | (freq_index << 2) | (channels >> 2),
        ((channels & 0x03) << 6) | (frame_len >> 11) as u8,
        (frame_len >> 3) as u8,
        (((frame_len & 0x07) as u8) << 5) | 0x1f,
        0xfc,
    ]
}

/// Whether `data` starts with an ADTS sync word.
pub fn is_adts(data: &[u8]) -> bool {
    data.len() >= ADTS_HEADER_LEN && data[0] == 0xff && data[1] & 0xf0 == 0xf0
}

/// Length of the ADTS header at the start of `data`: 7 bytes, or 9 when
/// `protection_absent` is 0 and a CRC follows. `None` if `data` is not
/// ADTS or is shorter than its header.
pub fn adts_header_len(data: &[u8]) -> Option<usize> {
    if !is_adts(data) {
        return None;
    }
    let len = if data[1] & 0x01 == 0 {
        ADTS_HEADER_LEN + 2
    } else {
        ADTS_HEADER_LEN
    };
    (data.len() >= len).then_some(len)
}

/// Raw AAC frame with any ADTS header (and CRC) removed.
pub fn strip_adts(data: &[u8]) -> &[u8] {
    &data[adts_header_len(data).unwrap_or(0)..]
}

/// Recover the AudioSpecificConfig carried by an ADTS header.
pub fn config_from_adts(data: &[u8]) -> Option<[u8; 2]> {
    if !is_adts(data) {
        return None;
    }
    let object_type = ((data[2] >> 6) & 0x03) + 1;
    let freq_index = (data[2] >> 2) & 0x0f;
    let channels = ((data[2] & 0x01) << 2) | (data[3] >> 6);
    Some([
        (object_type << 3) | (freq_index >> 1),
        ((freq_index & 0x01) << 7) | (channels << 3),
    ])
}
