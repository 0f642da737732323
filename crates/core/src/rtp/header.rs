use crate::error::{Error, Result};

pub const RTP_HEADER_LEN: usize = 12;

/// Generic RTP fixed header builder (RFC 3550 §5.1).
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |V=2|P|X|  CC   |M|     PT      |       Sequence Number         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                           Timestamp                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                             SSRC                              |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// Shared by all encoders. Version is always 2; padding, extension and
/// CSRC count are always 0. The sequence number wraps at 16 bits.
#[derive(Debug)]
pub struct RtpHeader {
    /// RTP payload type (7-bit, RFC 3551).
    pub pt: u8,
    /// Synchronization source identifier (RFC 3550 §8.1).
    pub ssrc: u32,
    sequence: u16,
}

impl RtpHeader {
    pub fn new(pt: u8, ssrc: u32) -> Self {
        tracing::debug!(
            pt,
            ssrc = format_args!("{:#010X}", ssrc),
            "RTP header state created"
        );
        Self {
            pt,
            ssrc,
            sequence: 0,
        }
    }

    /// Current sequence number (before the next [`write`](Self::write) call).
    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    /// Serialize a 12-byte RTP fixed header and advance the sequence number.
    ///
    /// The `marker` bit signals the last packet of a frame.
    pub fn write(&mut self, marker: bool, timestamp: u32) -> [u8; RTP_HEADER_LEN] {
        let first_byte: u8 = 2 << 6;
        let second_byte: u8 = ((marker as u8) << 7) | (self.pt & 0x7f);

        let mut header = [0u8; RTP_HEADER_LEN];
        header[0] = first_byte;
        header[1] = second_byte;
        header[2..4].copy_from_slice(&self.sequence.to_be_bytes());
        header[4..8].copy_from_slice(&timestamp.to_be_bytes());
        header[8..12].copy_from_slice(&self.ssrc.to_be_bytes());

        self.sequence = self.sequence.wrapping_add(1);
        header
    }

    /// Header followed by the given payload pieces, as one packet.
    pub fn packet(&mut self, marker: bool, timestamp: u32, parts: &[&[u8]]) -> Vec<u8> {
        let len = RTP_HEADER_LEN + parts.iter().map(|p| p.len()).sum::<usize>();
        let mut packet = Vec::with_capacity(len);
        packet.extend_from_slice(&self.write(marker, timestamp));
        for part in parts {
            packet.extend_from_slice(part);
        }
        packet
    }
}

/// Borrowed view of a received RTP packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtpPacketView<'a> {
    pub marker: bool,
    pub payload_type: u8,
    pub sequence: u16,
    pub timestamp: u32,
    pub ssrc: u32,
    /// Payload with CSRCs, header extension and padding removed.
    pub payload: &'a [u8],
}

impl<'a> RtpPacketView<'a> {
    pub fn parse(buf: &'a [u8]) -> Result<Self> {
        if buf.len() < RTP_HEADER_LEN {
            return Err(Error::PacketTooShort {
                len: buf.len(),
                needed: RTP_HEADER_LEN,
            });
        }
        let version = buf[0] >> 6;
        if version != 2 {
            return Err(Error::UnsupportedVersion(version));
        }
        let padding = buf[0] & 0x20 != 0;
        let extension = buf[0] & 0x10 != 0;
        let csrc_count = (buf[0] & 0x0f) as usize;

        let mut offset = RTP_HEADER_LEN + csrc_count * 4;
        if extension {
            if buf.len() < offset + 4 {
                return Err(Error::PacketTooShort {
                    len: buf.len(),
                    needed: offset + 4,
                });
            }
            let words = u16::from_be_bytes([buf[offset + 2], buf[offset + 3]]) as usize;
            offset += 4 + words * 4;
        }

        let mut end = buf.len();
        if padding {
            end = end.saturating_sub(buf[buf.len() - 1] as usize);
        }
        if offset > end {
            return Err(Error::PacketTooShort {
                len: buf.len(),
                needed: offset,
            });
        }

        Ok(Self {
            marker: buf[1] & 0x80 != 0,
            payload_type: buf[1] & 0x7f,
            sequence: u16::from_be_bytes([buf[2], buf[3]]),
            timestamp: u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]),
            ssrc: u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]),
            payload: &buf[offset..end],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_header() -> RtpHeader {
        RtpHeader::new(96, 0xAABBCCDD)
    }

    #[test]
    fn version_is_2() {
        let mut h = make_header();
        let buf = h.write(false, 0);
        assert_eq!(buf[0] >> 6, 2);
    }

    #[test]
    fn marker_bit() {
        let mut h = make_header();
        let no_marker = h.write(false, 0);
        assert_eq!(no_marker[1] & 0x80, 0);

        let with_marker = h.write(true, 0);
        assert_eq!(with_marker[1] & 0x80, 0x80);
    }

    #[test]
    fn sequence_wraps() {
        let mut h = make_header();
        h.sequence = u16::MAX;
        let buf = h.write(false, 0);
        let seq = u16::from_be_bytes([buf[2], buf[3]]);
        assert_eq!(seq, u16::MAX);
        assert_eq!(h.sequence(), 0);
    }

    #[test]
    fn parse_written_packet() {
        let mut h = make_header();
        let packet = h.packet(true, 3600, &[&[1, 2], &[3]]);
        let view = RtpPacketView::parse(&packet).unwrap();
        assert!(view.marker);
        assert_eq!(view.payload_type, 96);
        assert_eq!(view.sequence, 0);
        assert_eq!(view.timestamp, 3600);
        assert_eq!(view.ssrc, 0xAABBCCDD);
        assert_eq!(view.payload, &[1, 2, 3]);
    }

    #[test]
    fn parse_skips_csrc_extension_and_padding() {
        let mut packet = vec![0xB1, 0x60, 0, 5, 0, 0, 0, 9, 0, 0, 0, 1];
        packet.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]); // one CSRC
        packet.extend_from_slice(&[0xBE, 0xDE, 0x00, 0x01, 1, 2, 3, 4]); // extension
        packet.extend_from_slice(&[0x65, 0x01]);
        packet.extend_from_slice(&[0, 0, 3]); // padding
        let view = RtpPacketView::parse(&packet).unwrap();
        assert_eq!(view.payload, &[0x65, 0x01]);
    }

    #[test]
    fn parse_rejects_short_and_wrong_version() {
        assert!(matches!(
            RtpPacketView::parse(&[0x80, 0x60]),
            Err(Error::PacketTooShort { len: 2, needed: 12 })
        ));
        assert!(matches!(
            RtpPacketView::parse(&[0x40; 12]),
            Err(Error::UnsupportedVersion(1))
        ));
    }
}
