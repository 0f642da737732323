//! AAC over RTP, `mpeg4-generic` AAC-hbr mode (RFC 3640 §3.3.6).
//!
//! ```text
//! +---------+-----------+-----------+---------------+
//! | AU-headers-length | AU-header | ... | AU data ... |
//! +---------+-----------+-----------+---------------+
//!   16 bits   AU-size(13) | AU-Index(3)
//! ```
//!
//! `sizelength=13; indexlength=3; indexdeltalength=3` are the values this
//! module writes and expects.

use super::{EncoderParams, RtpDecoder, RtpEncoder, RtpHeader, RtpPacket, RtpPacketView, ms_from_rtp};
use crate::codec::CodecId;
use crate::error::{Error, FragmentErrorKind, Result};
use crate::frame::Frame;
use crate::track::AacTrack;
use crate::track::aac::{ADTS_HEADER_LEN, adts_header, strip_adts};

/// Samples per AAC frame.
const SAMPLES_PER_FRAME: u32 = 1024;
/// AU-size field is 13 bits.
const MAX_AU_SIZE: usize = 0x1fff;

/// AAC RTP packetizer. One access unit per packet, fragmented when it
/// exceeds the MTU.
#[derive(Debug)]
pub struct AacRtpEncoder {
    header: RtpHeader,
    params: EncoderParams,
}

impl AacRtpEncoder {
    pub fn new(params: EncoderParams) -> Self {
        Self {
            header: RtpHeader::new(params.payload_type, params.ssrc),
            params,
        }
    }
}

impl RtpEncoder for AacRtpEncoder {
    fn codec_id(&self) -> CodecId {
        CodecId::Aac
    }

    fn params(&self) -> &EncoderParams {
        &self.params
    }

    fn input_frame(&mut self, frame: &Frame) -> Vec<RtpPacket> {
        let raw = strip_adts(&frame.data);
        if raw.is_empty() || raw.len() > MAX_AU_SIZE {
            tracing::debug!(size = raw.len(), "AAC frame dropped: size out of AU-size range");
            return Vec::new();
        }

        let timestamp = self.params.rtp_timestamp(frame.dts);
        let au_size = (raw.len() as u16) << 3;
        let au_prefix = [0x00, 0x10, (au_size >> 8) as u8, au_size as u8];
        let max_fragment = self.params.max_payload() - au_prefix.len();
        let interleaved = self.params.interleaved;

        let mut packets = Vec::new();
        let mut chunks = raw.chunks(max_fragment).peekable();
        while let Some(chunk) = chunks.next() {
            let last = chunks.peek().is_none();
            let data = self.header.packet(last, timestamp, &[&au_prefix, chunk]);
            packets.push(RtpPacket { interleaved, data });
        }
        packets
    }

    fn next_sequence(&self) -> u16 {
        self.header.sequence()
    }
}

/// AAC RTP depacketizer.
///
/// Holds a copy of the track: its AudioSpecificConfig provides the clock
/// rate and the ADTS header prepended to every output frame. Frames from a
/// bare track are emitted raw.
#[derive(Debug)]
pub struct AacRtpDecoder {
    track: AacTrack,
    clock_rate: u32,
    fragment: Option<Fragment>,
    /// Timestamp of an AU whose fragments are dropped after a gap.
    discard_timestamp: Option<u32>,
}

/// An AU being reassembled. All fragments share the RTP timestamp and
/// AU-size of the first one and arrive with consecutive sequence numbers.
#[derive(Debug)]
struct Fragment {
    data: Vec<u8>,
    size: usize,
    timestamp: u32,
    last_seq: u16,
}

impl AacRtpDecoder {
    /// Clock rate assumed when the track carries no configuration.
    pub const FALLBACK_CLOCK_RATE: u32 = 44_100;

    pub fn new(track: AacTrack) -> Self {
        let clock_rate = track.sample_rate().unwrap_or(Self::FALLBACK_CLOCK_RATE);
        Self {
            track,
            clock_rate,
            fragment: None,
            discard_timestamp: None,
        }
    }

    fn frame(&self, au: &[u8], timestamp: u32) -> Frame {
        let data = match self.track.config() {
            Some(config) => {
                let mut data = Vec::with_capacity(ADTS_HEADER_LEN + au.len());
                data.extend_from_slice(&adts_header(config, au.len()));
                data.extend_from_slice(au);
                data
            }
            None => au.to_vec(),
        };
        Frame::new(CodecId::Aac, ms_from_rtp(timestamp, self.clock_rate), data)
    }

    fn drop_fragment(&mut self, reason: &str) {
        if let Some(stale) = self.fragment.take() {
            tracing::debug!(
                buffered = stale.data.len(),
                expected = stale.size,
                timestamp = stale.timestamp,
                reason,
                "incomplete AAC fragment discarded"
            );
        }
    }

    /// One fragment of an AU larger than the packet.
    fn input_fragment(
        &mut self,
        view: &RtpPacketView<'_>,
        size: usize,
        chunk: &[u8],
    ) -> Result<Vec<Frame>> {
        if self.discard_timestamp == Some(view.timestamp) {
            tracing::trace!(seq = view.sequence, "AAC fragment of a broken AU dropped");
            return Ok(Vec::new());
        }
        self.discard_timestamp = None;

        let continues = self
            .fragment
            .as_ref()
            .is_some_and(|f| f.timestamp == view.timestamp && f.size == size);
        if !continues {
            self.drop_fragment("new access unit");
            self.fragment = Some(Fragment {
                data: Vec::with_capacity(size),
                size,
                timestamp: view.timestamp,
                last_seq: view.sequence.wrapping_sub(1),
            });
        }
        let Some(fragment) = self.fragment.as_mut() else {
            return Ok(Vec::new());
        };
        if fragment.last_seq.wrapping_add(1) != view.sequence {
            self.drop_fragment("sequence gap");
            self.discard_timestamp = Some(view.timestamp);
            return Err(Error::Fragment(FragmentErrorKind::SequenceGap));
        }
        fragment.data.extend_from_slice(chunk);
        fragment.last_seq = view.sequence;
        if fragment.data.len() < size && !view.marker {
            return Ok(Vec::new());
        }
        let Some(fragment) = self.fragment.take() else {
            return Ok(Vec::new());
        };
        if fragment.data.len() != size {
            return Err(Error::PacketTooShort {
                len: fragment.data.len(),
                needed: size,
            });
        }
        Ok(vec![self.frame(&fragment.data, fragment.timestamp)])
    }
}

impl RtpDecoder for AacRtpDecoder {
    fn codec_id(&self) -> CodecId {
        CodecId::Aac
    }

    fn input_rtp(&mut self, packet: &[u8]) -> Result<Vec<Frame>> {
        let view = RtpPacketView::parse(packet)?;
        let payload = view.payload;
        if payload.len() < 2 {
            return Err(Error::PacketTooShort {
                len: payload.len(),
                needed: 2,
            });
        }

        let headers_bits = u16::from_be_bytes([payload[0], payload[1]]) as usize;
        let headers_len = headers_bits.div_ceil(8);
        let header_count = headers_bits / 16;
        if payload.len() < 2 + headers_len {
            return Err(Error::PacketTooShort {
                len: payload.len(),
                needed: 2 + headers_len,
            });
        }

        let headers = &payload[2..2 + headers_len];
        let mut data = &payload[2 + headers_len..];

        // A single AU larger than this packet's data is a fragment.
        if header_count == 1 {
            let size = (u16::from_be_bytes([headers[0], headers[1]]) >> 3) as usize;
            if size > data.len() {
                return self.input_fragment(&view, size, data);
            }
        }
        self.drop_fragment("unfragmented access unit");

        let mut frames = Vec::new();
        for i in 0..header_count {
            let size = (u16::from_be_bytes([headers[i * 2], headers[i * 2 + 1]]) >> 3) as usize;
            if size > data.len() {
                return Err(Error::PacketTooShort {
                    len: data.len(),
                    needed: size,
                });
            }
            let timestamp = view.timestamp.wrapping_add(i as u32 * SAMPLES_PER_FRAME);
            frames.push(self.frame(&data[..size], timestamp));
            data = &data[size..];
        }

        Ok(frames)
    }
}
