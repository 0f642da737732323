//! RTP packetizers and depacketizers.
//!
//! The [`Factory`](crate::Factory) builds one [`RtpEncoder`] per outgoing
//! stream and one [`RtpDecoder`] per incoming track.
//!
//! ## RTP overview (RFC 3550)
//!
//! Each encoded frame is split into one or more RTP packets. Every RTP
//! packet carries a 12-byte fixed header ([`header::RtpHeader`]) with:
//!
//! - **Sequence number** (16-bit, wrapping) for reordering and loss detection.
//! - **Timestamp** (32-bit) in the codec clock (90 kHz video, sample rate audio).
//! - **SSRC** (32-bit) identifying the sender.
//! - **Marker bit**, set on the last packet of an access unit (frame).
//!
//! ## Supported codecs
//!
//! | Codec | Module | RFC |
//! |-------|--------|-----|
//! | H.264 | [`h264`] | [RFC 6184](https://tools.ietf.org/html/rfc6184) |
//! | H.265 | [`h265`] | [RFC 7798](https://tools.ietf.org/html/rfc7798) |
//! | AAC   | [`aac`]  | [RFC 3640](https://tools.ietf.org/html/rfc3640) |

pub mod aac;
pub mod h264;
pub mod h265;
pub mod header;

use crate::codec::CodecId;
use crate::error::Result;
use crate::frame::Frame;

pub use header::{RTP_HEADER_LEN, RtpHeader, RtpPacketView};

/// Parameters every encoder is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderParams {
    pub ssrc: u32,
    /// Maximum RTP packet size, header included.
    pub mtu: usize,
    /// RTP clock rate.
    pub sample_rate: u32,
    pub payload_type: u8,
    /// RTSP interleaved channel (RFC 2326 §10.12).
    pub interleaved: u8,
}

/// Largest RTP packet the 16-bit interleaved length field can carry.
pub const MAX_PACKET_LEN: usize = u16::MAX as usize;

impl EncoderParams {
    /// Largest payload that fits in one packet. The MTU is capped at
    /// [`MAX_PACKET_LEN`]; the payload never drops below 16 bytes so
    /// fragmentation always makes progress.
    pub fn max_payload(&self) -> usize {
        self.mtu
            .min(MAX_PACKET_LEN)
            .saturating_sub(RTP_HEADER_LEN)
            .max(16)
    }

    /// Convert a millisecond timestamp to the RTP clock.
    pub fn rtp_timestamp(&self, ms: u32) -> u32 {
        (u64::from(ms) * u64::from(self.sample_rate) / 1000) as u32
    }
}

/// A complete RTP packet (header + payload) and its interleaved channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpPacket {
    pub interleaved: u8,
    pub data: Vec<u8>,
}

impl RtpPacket {
    pub fn view(&self) -> Result<RtpPacketView<'_>> {
        RtpPacketView::parse(&self.data)
    }

    /// RTSP TCP framing: `$`, channel, 16-bit length, packet.
    pub fn to_interleaved(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.data.len());
        out.push(b'$');
        out.push(self.interleaved);
        out.extend_from_slice(&(self.data.len() as u16).to_be_bytes());
        out.extend_from_slice(&self.data);
        out
    }
}

/// Codec-specific RTP packetizer bound to one SSRC.
pub trait RtpEncoder: Send {
    fn codec_id(&self) -> CodecId;

    fn params(&self) -> &EncoderParams;

    /// Packetize one frame. Returns complete RTP packets in send order.
    fn input_frame(&mut self, frame: &Frame) -> Vec<RtpPacket>;

    /// Sequence number the next packet will carry (for `RTP-Info`).
    fn next_sequence(&self) -> u16;
}

/// Codec-specific RTP depacketizer.
pub trait RtpDecoder: Send {
    fn codec_id(&self) -> CodecId;

    /// Feed one RTP packet; returns the frames it completed.
    ///
    /// An `Err` only concerns this packet; the decoder stays usable.
    fn input_rtp(&mut self, packet: &[u8]) -> Result<Vec<Frame>>;
}

/// Millisecond timestamp from an RTP timestamp.
pub(crate) fn ms_from_rtp(timestamp: u32, clock_rate: u32) -> u32 {
    if clock_rate == 0 {
        return 0;
    }
    (u64::from(timestamp) * 1000 / u64::from(clock_rate)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaved_framing() {
        let packet = RtpPacket {
            interleaved: 2,
            data: vec![0x80, 0x60, 0, 1],
        };
        assert_eq!(
            packet.to_interleaved(),
            vec![b'$', 2, 0, 4, 0x80, 0x60, 0, 1]
        );
    }

    #[test]
    fn timestamp_conversion() {
        let params = EncoderParams {
            ssrc: 1,
            mtu: 1400,
            sample_rate: 90_000,
            payload_type: 96,
            interleaved: 2,
        };
        assert_eq!(params.rtp_timestamp(40), 3600);
        assert_eq!(ms_from_rtp(3600, 90_000), 40);
        assert_eq!(params.max_payload(), 1388);
    }

    #[test]
    fn oversized_mtu_capped_at_interleaved_limit() {
        let params = EncoderParams {
            ssrc: 1,
            mtu: 70_000,
            sample_rate: 90_000,
            payload_type: 96,
            interleaved: 2,
        };
        assert_eq!(params.max_payload(), MAX_PACKET_LEN - RTP_HEADER_LEN);

        let mut encoder = h264::H264RtpEncoder::new(params);
        let nal: Vec<u8> = std::iter::once(0x65).chain(std::iter::repeat_n(0xab, 66_000)).collect();
        let frame = Frame::from_nal_units(CodecId::H264, 0, [nal.as_slice()]);
        let packets = encoder.input_frame(&frame);
        assert_eq!(packets.len(), 2);
        for packet in &packets {
            assert!(packet.data.len() <= MAX_PACKET_LEN);
            let framed = packet.to_interleaved();
            let len = u16::from_be_bytes([framed[2], framed[3]]) as usize;
            assert_eq!(len, packet.data.len());
        }
    }
}
