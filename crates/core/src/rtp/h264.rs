//! H.264 RTP payload format (RFC 6184).
//!
//! Packetization uses two modes:
//!
//! - **Single NAL Unit** (§5.6): NALs that fit within the MTU are sent
//!   as-is in a single RTP packet (12-byte header + NAL bytes).
//!
//! - **FU-A Fragmentation** (§5.8): NALs exceeding the MTU are split
//!   across multiple RTP packets. Each fragment carries a 2-byte FU
//!   header (FU indicator + FU header) before the NAL payload:
//!
//!   ```text
//!   FU indicator:  [F|NRI|Type=28]     (1 byte)
//!   FU header:     [S|E|R|NAL_Type]    (1 byte)
//!   Fragment data: [...]               (up to MTU - 2 bytes)
//!   ```
//!
//! The depacketizer additionally accepts STAP-A aggregation (§5.7.1) and
//! emits one Annex B frame per NAL unit.

use super::{EncoderParams, RtpDecoder, RtpEncoder, RtpHeader, RtpPacket, RtpPacketView, ms_from_rtp};
use crate::codec::CodecId;
use crate::error::{Error, FragmentErrorKind, Result};
use crate::frame::{Frame, START_CODE, split_annex_b};
use crate::track::VIDEO_CLOCK_RATE;

const NAL_STAP_A: u8 = 24;
const NAL_FU_A: u8 = 28;

/// H.264 RTP packetizer.
#[derive(Debug)]
pub struct H264RtpEncoder {
    header: RtpHeader,
    params: EncoderParams,
}

impl H264RtpEncoder {
    pub fn new(params: EncoderParams) -> Self {
        Self {
            header: RtpHeader::new(params.payload_type, params.ssrc),
            params,
        }
    }

    /// Packetize a single NAL unit into one or more RTP packets.
    fn packetize_nal(&mut self, nal_unit: &[u8], timestamp: u32, is_last_nal: bool) -> Vec<RtpPacket> {
        let mut packets = Vec::new();
        if nal_unit.is_empty() {
            return packets;
        }
        let max_payload = self.params.max_payload();
        let interleaved = self.params.interleaved;

        if nal_unit.len() <= max_payload {
            let data = self.header.packet(is_last_nal, timestamp, &[nal_unit]);
            packets.push(RtpPacket { interleaved, data });
            return packets;
        }

        let nal_header = nal_unit[0];
        let nal_type = nal_header & 0x1f;
        // FU indicator: F and NRI from original NAL, type = 28 (FU-A)
        let fu_indicator = (nal_header & 0xe0) | NAL_FU_A;
        let payload = &nal_unit[1..];
        let max_fragment = max_payload - 2;

        let mut chunks = payload.chunks(max_fragment).peekable();
        let mut first = true;
        while let Some(chunk) = chunks.next() {
            let last_fragment = chunks.peek().is_none();
            let start_bit = if first { 0x80 } else { 0x00 };
            let end_bit = if last_fragment { 0x40 } else { 0x00 };
            let fu_header = start_bit | end_bit | nal_type;

            let marker = is_last_nal && last_fragment;
            let data = self
                .header
                .packet(marker, timestamp, &[&[fu_indicator, fu_header], chunk]);
            packets.push(RtpPacket { interleaved, data });
            first = false;
        }

        tracing::trace!(
            nal_type,
            nal_size = nal_unit.len(),
            fragments = packets.len(),
            "FU-A fragmented NAL unit"
        );

        packets
    }
}

impl RtpEncoder for H264RtpEncoder {
    fn codec_id(&self) -> CodecId {
        CodecId::H264
    }

    fn params(&self) -> &EncoderParams {
        &self.params
    }

    fn input_frame(&mut self, frame: &Frame) -> Vec<RtpPacket> {
        let timestamp = self.params.rtp_timestamp(frame.pts);
        let nal_units = split_annex_b(&frame.data);
        let mut packets = Vec::new();

        for (i, nal) in nal_units.iter().enumerate() {
            let is_last = i == nal_units.len() - 1;
            packets.append(&mut self.packetize_nal(nal, timestamp, is_last));
        }

        tracing::trace!(
            nal_count = nal_units.len(),
            rtp_packets = packets.len(),
            frame_bytes = frame.data.len(),
            seq = self.header.sequence(),
            ts = timestamp,
            "frame packetized"
        );

        packets
    }

    fn next_sequence(&self) -> u16 {
        self.header.sequence()
    }
}

/// H.264 RTP depacketizer.
///
/// Stateless with respect to the track; the only state is the FU-A
/// reassembly buffer.
#[derive(Debug, Default)]
pub struct H264RtpDecoder {
    fragment: Option<Fragment>,
}

#[derive(Debug)]
struct Fragment {
    data: Vec<u8>,
    last_seq: u16,
}

impl H264RtpDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn frame(nal: &[u8], timestamp: u32) -> Frame {
        let mut data = Vec::with_capacity(START_CODE.len() + nal.len());
        data.extend_from_slice(&START_CODE);
        data.extend_from_slice(nal);
        Frame::new(CodecId::H264, ms_from_rtp(timestamp, VIDEO_CLOCK_RATE), data)
    }

    fn fu_a(&mut self, view: &RtpPacketView<'_>) -> Result<Vec<Frame>> {
        let payload = view.payload;
        if payload.len() < 3 {
            return Err(Error::PacketTooShort {
                len: payload.len(),
                needed: 3,
            });
        }
        let (fu_indicator, fu_header) = (payload[0], payload[1]);
        let start = fu_header & 0x80 != 0;
        let end = fu_header & 0x40 != 0;

        if start {
            let mut data = Vec::with_capacity(payload.len() * 4);
            data.push((fu_indicator & 0xe0) | (fu_header & 0x1f));
            data.extend_from_slice(&payload[2..]);
            self.fragment = Some(Fragment {
                data,
                last_seq: view.sequence,
            });
        } else {
            let Some(fragment) = self.fragment.as_mut() else {
                return Err(Error::Fragment(FragmentErrorKind::MissingStart));
            };
            if fragment.last_seq.wrapping_add(1) != view.sequence {
                self.fragment = None;
                return Err(Error::Fragment(FragmentErrorKind::SequenceGap));
            }
            fragment.data.extend_from_slice(&payload[2..]);
            fragment.last_seq = view.sequence;
        }

        if end {
            if let Some(fragment) = self.fragment.take() {
                return Ok(vec![Self::frame(&fragment.data, view.timestamp)]);
            }
        }
        Ok(Vec::new())
    }
}

impl RtpDecoder for H264RtpDecoder {
    fn codec_id(&self) -> CodecId {
        CodecId::H264
    }

    fn input_rtp(&mut self, packet: &[u8]) -> Result<Vec<Frame>> {
        let view = RtpPacketView::parse(packet)?;
        let Some(&first) = view.payload.first() else {
            return Ok(Vec::new());
        };

        match first & 0x1f {
            1..=23 => Ok(vec![Self::frame(view.payload, view.timestamp)]),
            NAL_STAP_A => split_aggregate(&view.payload[1..])
                .map(|nals| nals.into_iter().map(|n| Self::frame(n, view.timestamp)).collect()),
            NAL_FU_A => self.fu_a(&view),
            other => {
                tracing::trace!(nal_type = other, "unsupported H.264 RTP payload type dropped");
                Ok(Vec::new())
            }
        }
    }
}

/// Split an aggregation payload (`size:u16, nal` repeated) into NAL units.
pub(crate) fn split_aggregate(mut data: &[u8]) -> Result<Vec<&[u8]>> {
    let mut nals = Vec::new();
    while data.len() >= 2 {
        let size = u16::from_be_bytes([data[0], data[1]]) as usize;
        let rest = &data[2..];
        if size > rest.len() {
            return Err(Error::PacketTooShort {
                len: rest.len(),
                needed: size,
            });
        }
        if size > 0 {
            nals.push(&rest[..size]);
        }
        data = &rest[size..];
    }
    Ok(nals)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_encoder(mtu: usize) -> H264RtpEncoder {
        H264RtpEncoder::new(EncoderParams {
            ssrc: 0xAABBCCDD,
            mtu,
            sample_rate: 90_000,
            payload_type: 96,
            interleaved: 2,
        })
    }

    #[test]
    fn small_nal_single_packet() {
        let mut p = make_encoder(1400);
        let packets = p.packetize_nal(&[0x65, 0xAA, 0xBB, 0xCC], 0, true);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].data.len(), 12 + 4);
        assert_eq!(packets[0].data[1] & 0x80, 0x80); // marker bit
        assert_eq!(packets[0].interleaved, 2);
    }

    #[test]
    fn large_nal_fragmented() {
        let mut p = make_encoder(1400);
        let mut nal = vec![0x65];
        nal.extend(vec![0xAA; 1900]);
        let packets = p.packetize_nal(&nal, 0, true);
        assert!(packets.len() > 1);

        assert_eq!(packets[0].data[12] & 0x1f, 28); // FU-A type
        assert_eq!(packets[0].data[13] & 0x80, 0x80); // Start bit
        assert!(packets.iter().all(|p| p.data.len() <= 1400));

        let last = &packets.last().unwrap().data;
        assert_eq!(last[13] & 0x40, 0x40); // End bit
        assert_eq!(last[1] & 0x80, 0x80); // Marker bit
    }

    #[test]
    fn marker_only_on_last_nal_of_frame() {
        let mut p = make_encoder(1400);
        let sps: &[u8] = &[0x67, 0x42, 0x00, 0x1e];
        let idr: &[u8] = &[0x65, 0x88, 0x00];
        let frame = Frame::from_nal_units(CodecId::H264, 40, [sps, idr]);
        let packets = p.input_frame(&frame);
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].data[1] & 0x80, 0);
        assert_eq!(packets[1].data[1] & 0x80, 0x80);
        let view = packets[1].view().unwrap();
        assert_eq!(view.timestamp, 3600);
        assert_eq!(view.sequence, 1);
        assert_eq!(p.next_sequence(), 2);
    }

    #[test]
    fn fu_a_round_trip() {
        let mut encoder = make_encoder(200);
        let mut decoder = H264RtpDecoder::new();
        let mut nal = vec![0x65];
        nal.extend((0..1000).map(|i| i as u8));
        let frame = Frame::from_nal_units(CodecId::H264, 80, [nal.as_slice()]);

        let mut frames = Vec::new();
        for packet in encoder.input_frame(&frame) {
            frames.extend(decoder.input_rtp(&packet.data).unwrap());
        }
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, frame.data);
        assert_eq!(frames[0].dts, 80);
    }

    #[test]
    fn stap_a_splits_into_frames() {
        let mut packet = vec![0x80, 0x60, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1];
        packet.push(0x78); // STAP-A, NRI=3
        packet.extend_from_slice(&[0, 2, 0x67, 0x42]);
        packet.extend_from_slice(&[0, 2, 0x68, 0xce]);
        let frames = H264RtpDecoder::new().input_rtp(&packet).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].data, vec![0, 0, 0, 1, 0x67, 0x42]);
        assert_eq!(frames[1].data, vec![0, 0, 0, 1, 0x68, 0xce]);
    }

    #[test]
    fn fragment_without_start_is_error() {
        let packet = [0x80, 0x60, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0x7c, 0x45, 0xAA];
        assert!(matches!(
            H264RtpDecoder::new().input_rtp(&packet),
            Err(Error::Fragment(FragmentErrorKind::MissingStart))
        ));
    }

    #[test]
    fn sequence_gap_drops_fragment() {
        let mut decoder = H264RtpDecoder::new();
        let start = [0x80, 0x60, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0x7c, 0x85, 0xAA];
        let end = [0x80, 0xE0, 0, 3, 0, 0, 0, 0, 0, 0, 0, 1, 0x7c, 0x45, 0xBB];
        assert!(decoder.input_rtp(&start).unwrap().is_empty());
        assert!(matches!(
            decoder.input_rtp(&end),
            Err(Error::Fragment(FragmentErrorKind::SequenceGap))
        ));
    }
}
