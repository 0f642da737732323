//! Media frames exchanged with the codecs, and Annex B helpers.

use crate::codec::CodecId;

/// 4-byte Annex B start code.
pub const START_CODE: [u8; 4] = [0, 0, 0, 1];

/// One access unit (video) or one raw AAC frame (audio).
///
/// Video data is Annex B (start-code delimited). Audio data is a raw AAC
/// frame, optionally preceded by an ADTS header. Timestamps are in
/// milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub codec: CodecId,
    pub dts: u32,
    pub pts: u32,
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(codec: CodecId, dts: u32, data: Vec<u8>) -> Self {
        Self {
            codec,
            dts,
            pts: dts,
            data,
        }
    }

    /// Build an Annex B frame from raw NAL units.
    pub fn from_nal_units<'a>(
        codec: CodecId,
        dts: u32,
        nals: impl IntoIterator<Item = &'a [u8]>,
    ) -> Self {
        let mut data = Vec::new();
        for nal in nals {
            data.extend_from_slice(&START_CODE);
            data.extend_from_slice(nal);
        }
        Self::new(codec, dts, data)
    }
}

/// Extract NAL units from an Annex B bitstream.
///
/// Scans for start codes (both 4-byte `00 00 00 01` and 3-byte
/// `00 00 01`) and returns the NAL data between them, excluding the start
/// codes themselves. The start code length is tracked per NAL so mixed
/// 3-byte and 4-byte start codes split correctly.
pub fn split_annex_b(data: &[u8]) -> Vec<&[u8]> {
    let mut nal_units = Vec::new();
    let mut i = 0usize;

    // (nal_data_start_index, start_code_length)
    let mut start_entries: Vec<(usize, usize)> = Vec::new();

    while i < data.len() {
        if i + 3 < data.len() && data[i..i + 4] == START_CODE {
            start_entries.push((i + 4, 4));
            i += 4;
        } else if i + 2 < data.len() && data[i..i + 3] == [0, 0, 1] {
            start_entries.push((i + 3, 3));
            i += 3;
        } else {
            i += 1;
        }
    }

    for (idx, &(start, _)) in start_entries.iter().enumerate() {
        let end = match start_entries.get(idx + 1) {
            Some(&(next_start, next_sc_len)) => next_start - next_sc_len,
            None => data.len(),
        };
        if start < end {
            nal_units.push(&data[start..end]);
        }
    }

    nal_units
}
