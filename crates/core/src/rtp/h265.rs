//! H.265 (HEVC) RTP payload format (RFC 7798).
//!
//! Key differences from H.264 (RFC 6184):
//!
//! - **2-byte NAL unit header** (vs 1-byte in H.264).
//!   The NAL type is in bits 1..6 of the first byte.
//!
//! - **FU header format** (§4.4.3): a 2-byte payload header with type 49,
//!   then a 1-byte FU header with a 6-bit NAL type field.
//!
//!   ```text
//!   PayloadHdr:    [F|Type=49|LayerId|TID]   (2 bytes)
//!   FU header:     [S|E|FuType]              (1 byte)
//!   ```
//!
//! - **Aggregation Packets** (§4.4.2) use type 48.

use super::h264::split_aggregate;
use super::{EncoderParams, RtpDecoder, RtpEncoder, RtpHeader, RtpPacket, RtpPacketView, ms_from_rtp};
use crate::codec::CodecId;
use crate::error::{Error, FragmentErrorKind, Result};
use crate::frame::{Frame, START_CODE, split_annex_b};
use crate::track::VIDEO_CLOCK_RATE;
use crate::track::h265::nal_type;

const NAL_AP: u8 = 48;
const NAL_FU: u8 = 49;

/// H.265 RTP packetizer.
#[derive(Debug)]
pub struct H265RtpEncoder {
    header: RtpHeader,
    params: EncoderParams,
}

impl H265RtpEncoder {
    pub fn new(params: EncoderParams) -> Self {
        Self {
            header: RtpHeader::new(params.payload_type, params.ssrc),
            params,
        }
    }

    fn packetize_nal(&mut self, nal_unit: &[u8], timestamp: u32, is_last_nal: bool) -> Vec<RtpPacket> {
        let mut packets = Vec::new();
        if nal_unit.len() < 2 {
            return packets;
        }
        let max_payload = self.params.max_payload();
        let interleaved = self.params.interleaved;

        if nal_unit.len() <= max_payload {
            let data = self.header.packet(is_last_nal, timestamp, &[nal_unit]);
            packets.push(RtpPacket { interleaved, data });
            return packets;
        }

        let fu_type = nal_type(nal_unit[0]);
        let payload_header = [(nal_unit[0] & 0x81) | (NAL_FU << 1), nal_unit[1]];
        let max_fragment = max_payload - 3;

        let mut chunks = nal_unit[2..].chunks(max_fragment).peekable();
        let mut first = true;
        while let Some(chunk) = chunks.next() {
            let last_fragment = chunks.peek().is_none();
            let start_bit = if first { 0x80 } else { 0x00 };
            let end_bit = if last_fragment { 0x40 } else { 0x00 };
            let fu_header = start_bit | end_bit | fu_type;

            let data = self.header.packet(
                is_last_nal && last_fragment,
                timestamp,
                &[&payload_header, &[fu_header], chunk],
            );
            packets.push(RtpPacket { interleaved, data });
            first = false;
        }

        tracing::trace!(
            fu_type,
            nal_size = nal_unit.len(),
            fragments = packets.len(),
            "H.265 FU fragmented NAL unit"
        );

        packets
    }
}

impl RtpEncoder for H265RtpEncoder {
    fn codec_id(&self) -> CodecId {
        CodecId::H265
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
        packets
    }

    fn next_sequence(&self) -> u16 {
        self.header.sequence()
    }
}

/// H.265 RTP depacketizer.
#[derive(Debug, Default)]
pub struct H265RtpDecoder {
    fragment: Vec<u8>,
    last_seq: Option<u16>,
}

impl H265RtpDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn frame(nal: &[u8], timestamp: u32) -> Frame {
        let mut data = Vec::with_capacity(START_CODE.len() + nal.len());
        data.extend_from_slice(&START_CODE);
        data.extend_from_slice(nal);
        Frame::new(CodecId::H265, ms_from_rtp(timestamp, VIDEO_CLOCK_RATE), data)
    }

    fn fu(&mut self, view: &RtpPacketView<'_>) -> Result<Vec<Frame>> {
        let payload = view.payload;
        if payload.len() < 4 {
            return Err(Error::PacketTooShort {
                len: payload.len(),
                needed: 4,
            });
        }
        let fu_header = payload[2];
        let start = fu_header & 0x80 != 0;
        let end = fu_header & 0x40 != 0;

        if start {
            self.fragment.clear();
            self.fragment
                .push((payload[0] & 0x81) | ((fu_header & 0x3f) << 1));
            self.fragment.push(payload[1]);
        } else {
            match self.last_seq {
                None => return Err(Error::Fragment(FragmentErrorKind::MissingStart)),
                Some(seq) if seq.wrapping_add(1) != view.sequence => {
                    self.last_seq = None;
                    return Err(Error::Fragment(FragmentErrorKind::SequenceGap));
                }
                Some(_) => {}
            }
        }
        self.fragment.extend_from_slice(&payload[3..]);
        self.last_seq = Some(view.sequence);

        if end {
            self.last_seq = None;
            let nal = std::mem::take(&mut self.fragment);
            return Ok(vec![Self::frame(&nal, view.timestamp)]);
        }
        Ok(Vec::new())
    }
}

impl RtpDecoder for H265RtpDecoder {
    fn codec_id(&self) -> CodecId {
        CodecId::H265
    }

    fn input_rtp(&mut self, packet: &[u8]) -> Result<Vec<Frame>> {
        let view = RtpPacketView::parse(packet)?;
        if view.payload.len() < 2 {
            return Ok(Vec::new());
        }

        match nal_type(view.payload[0]) {
            NAL_AP => split_aggregate(&view.payload[2..])
                .map(|nals| nals.into_iter().map(|n| Self::frame(n, view.timestamp)).collect()),
            NAL_FU => self.fu(&view),
            0..NAL_AP => Ok(vec![Self::frame(view.payload, view.timestamp)]),
            other => {
                tracing::trace!(nal_type = other, "unsupported H.265 RTP payload type dropped");
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::h265::{NAL_PPS, NAL_SPS};

    fn make_encoder(mtu: usize) -> H265RtpEncoder {
        H265RtpEncoder::new(EncoderParams {
            ssrc: 0x10000001,
            mtu,
            sample_rate: 90_000,
            payload_type: 96,
            interleaved: 2,
        })
    }

    #[test]
    fn small_nals_single_packets() {
        let mut encoder = make_encoder(1400);
        let sps: &[u8] = &[0x42, 0x01, 0x01];
        let pps: &[u8] = &[0x44, 0x01, 0xc0];
        let packets = encoder.input_frame(&Frame::from_nal_units(CodecId::H265, 0, [sps, pps]));
        assert_eq!(packets.len(), 2);
        assert_eq!(nal_type(packets[0].data[12]), NAL_SPS);
        assert_eq!(nal_type(packets[1].data[12]), NAL_PPS);
        assert_eq!(packets[1].data[1] & 0x80, 0x80);
    }

    #[test]
    fn fu_round_trip() {
        let mut encoder = make_encoder(300);
        let mut decoder = H265RtpDecoder::new();
        let mut nal = vec![0x26, 0x01]; // IDR_W_RADL
        nal.extend((0..2000).map(|i| (i % 251) as u8));
        let frame = Frame::from_nal_units(CodecId::H265, 40, [nal.as_slice()]);

        let packets = encoder.input_frame(&frame);
        assert!(packets.len() > 1);
        assert_eq!(nal_type(packets[0].data[12]), NAL_FU);
        assert_eq!(packets[0].data[14] & 0x80, 0x80);

        let mut frames = Vec::new();
        for packet in &packets {
            frames.extend(decoder.input_rtp(&packet.data).unwrap());
        }
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, frame.data);
        assert_eq!(frames[0].codec, CodecId::H265);
    }

    #[test]
    fn aggregation_packet() {
        let mut packet = vec![0x80, 0x60, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1];
        packet.extend_from_slice(&[0x60, 0x01]); // AP
        packet.extend_from_slice(&[0, 2, 0x40, 0x01]);
        packet.extend_from_slice(&[0, 3, 0x42, 0x01, 0x01]);
        let frames = H265RtpDecoder::new().input_rtp(&packet).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].data, vec![0, 0, 0, 1, 0x42, 0x01, 0x01]);
    }

    #[test]
    fn continuation_without_start_is_error() {
        let packet = [0x80, 0x60, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0x62, 0x01, 0x13, 0xAA];
        assert!(matches!(
            H265RtpDecoder::new().input_rtp(&packet),
            Err(Error::Fragment(FragmentErrorKind::MissingStart))
        ));
    }
}
