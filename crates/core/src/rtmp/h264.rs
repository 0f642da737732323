use super::{RtmpEncoder, RtmpPacket, TagType};
use crate::codec::CodecId;
use crate::frame::{Frame, split_annex_b};
use crate::metadata::{AmfValue, metadata_from_codec_id};
use crate::track::H264Track;
use crate::track::h264::{NAL_IDR, NAL_PPS, NAL_SPS};

/// Access unit delimiter; not carried in FLV.
const NAL_AUD: u8 = 9;
/// FLV CodecID for AVC.
const FLV_CODEC_AVC: u8 = 7;

/// H.264 RTMP muxer.
#[derive(Debug)]
pub struct H264RtmpEncoder {
    track: H264Track,
    sps: Option<Vec<u8>>,
    pps: Option<Vec<u8>>,
    header_sent: bool,
}

impl H264RtmpEncoder {
    pub fn new(track: H264Track) -> Self {
        Self {
            sps: track.sps().map(<[u8]>::to_vec),
            pps: track.pps().map(<[u8]>::to_vec),
            track,
            header_sent: false,
        }
    }

    fn capture(slot: &mut Option<Vec<u8>>, nal: &[u8], header_sent: &mut bool) {
        if slot.as_deref() != Some(nal) {
            *slot = Some(nal.to_vec());
            *header_sent = false;
            tracing::debug!(nal_type = nal[0] & 0x1f, size = nal.len(), "H.264 parameter set captured");
        }
    }
}

/// `AVCDecoderConfigurationRecord` (ISO/IEC 14496-15 §5.2.4.1), one SPS
/// and one PPS, 4-byte NAL lengths.
pub fn avc_decoder_configuration_record(sps: &[u8], pps: &[u8]) -> Vec<u8> {
    let mut record = Vec::with_capacity(11 + sps.len() + pps.len());
    record.push(1);
    record.push(sps.get(1).copied().unwrap_or(66));
    record.push(sps.get(2).copied().unwrap_or(0));
    record.push(sps.get(3).copied().unwrap_or(31));
    record.push(0xff); // reserved | lengthSizeMinusOne = 3
    record.push(0xe1); // reserved | numOfSequenceParameterSets = 1
    record.extend_from_slice(&(sps.len() as u16).to_be_bytes());
    record.extend_from_slice(sps);
    record.push(1);
    record.extend_from_slice(&(pps.len() as u16).to_be_bytes());
    record.extend_from_slice(pps);
    record
}

impl RtmpEncoder for H264RtmpEncoder {
    fn codec_id(&self) -> CodecId {
        CodecId::H264
    }

    fn sequence_header(&self) -> Option<RtmpPacket> {
        let sps = self.sps.as_deref()?;
        let pps = self.pps.as_deref()?;
        let mut data = vec![0x10 | FLV_CODEC_AVC, 0, 0, 0, 0];
        data.extend(avc_decoder_configuration_record(sps, pps));
        Some(RtmpPacket {
            tag_type: TagType::Video,
            timestamp: 0,
            data,
        })
    }

    fn input_frame(&mut self, frame: &Frame) -> Vec<RtmpPacket> {
        let mut packets = Vec::new();
        let mut keyframe = false;
        let mut avcc = Vec::with_capacity(frame.data.len() + 16);

        for nal in split_annex_b(&frame.data) {
            match nal[0] & 0x1f {
                NAL_SPS => Self::capture(&mut self.sps, nal, &mut self.header_sent),
                NAL_PPS => Self::capture(&mut self.pps, nal, &mut self.header_sent),
                NAL_AUD => {}
                nal_type => {
                    keyframe |= nal_type == NAL_IDR;
                    avcc.extend_from_slice(&(nal.len() as u32).to_be_bytes());
                    avcc.extend_from_slice(nal);
                }
            }
        }

        if !self.header_sent {
            match self.sequence_header() {
                Some(mut header) => {
                    header.timestamp = frame.dts;
                    packets.push(header);
                    self.header_sent = true;
                }
                None => {
                    tracing::trace!(dts = frame.dts, "H.264 frame dropped: SPS/PPS not known yet");
                    return packets;
                }
            }
        }

        if avcc.is_empty() {
            return packets;
        }

        let frame_type = if keyframe { 0x10 } else { 0x20 };
        let cts = frame.pts.wrapping_sub(frame.dts) & 0x00ff_ffff;
        let mut data = Vec::with_capacity(5 + avcc.len());
        data.push(frame_type | FLV_CODEC_AVC);
        data.push(1);
        data.extend_from_slice(&cts.to_be_bytes()[1..]);
        data.extend(avcc);
        packets.push(RtmpPacket {
            tag_type: TagType::Video,
            timestamp: frame.dts,
            data,
        });
        packets
    }

    fn metadata(&self) -> Vec<(&'static str, AmfValue)> {
        let mut entries = vec![("videocodecid", metadata_from_codec_id(CodecId::H264))];
        let timing = self.track.timing();
        if timing.is_known() {
            entries.push(("width", AmfValue::Number(f64::from(timing.width))));
            entries.push(("height", AmfValue::Number(f64::from(timing.height))));
        }
        if timing.fps > 0.0 {
            entries.push(("framerate", AmfValue::Number(f64::from(timing.fps))));
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPS: &[u8] = &[0x67, 0x42, 0x00, 0x1e, 0xda];
    const PPS: &[u8] = &[0x68, 0xce, 0x38, 0x80];

    #[test]
    fn configured_track_sends_header_first() {
        let mut muxer = H264RtmpEncoder::new(H264Track::with_parameter_sets(SPS.to_vec(), PPS.to_vec()));
        let idr: &[u8] = &[0x65, 0x88, 0x84];
        let packets = muxer.input_frame(&Frame::from_nal_units(CodecId::H264, 40, [idr]));
        assert_eq!(packets.len(), 2);
        assert!(packets[0].is_sequence_header());
        assert_eq!(packets[0].data[0], 0x17);
        assert_eq!(&packets[0].data[5..9], &[1, 0x42, 0x00, 0x1e]);

        assert_eq!(packets[1].data[0], 0x17);
        assert_eq!(packets[1].data[1], 1);
        assert_eq!(&packets[1].data[5..9], &[0, 0, 0, 3]);
        assert_eq!(&packets[1].data[9..], idr);
        assert_eq!(packets[1].timestamp, 40);
    }

    #[test]
    fn bare_track_captures_config_in_band() {
        let mut muxer = H264RtmpEncoder::new(H264Track::new());
        let slice: &[u8] = &[0x41, 0x9a];
        assert!(muxer
            .input_frame(&Frame::from_nal_units(CodecId::H264, 0, [slice]))
            .is_empty());

        let idr: &[u8] = &[0x65, 0x88];
        let packets = muxer.input_frame(&Frame::from_nal_units(CodecId::H264, 40, [SPS, PPS, idr]));
        assert_eq!(packets.len(), 2);
        assert!(packets[0].is_sequence_header());

        let packets = muxer.input_frame(&Frame::from_nal_units(CodecId::H264, 80, [slice]));
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].data[0], 0x27);
    }

    #[test]
    fn changed_sps_resends_header() {
        let mut muxer = H264RtmpEncoder::new(H264Track::with_parameter_sets(SPS.to_vec(), PPS.to_vec()));
        let idr: &[u8] = &[0x65, 0x88];
        muxer.input_frame(&Frame::from_nal_units(CodecId::H264, 0, [idr]));
        let new_sps: &[u8] = &[0x67, 0x64, 0x00, 0x28];
        let packets = muxer.input_frame(&Frame::from_nal_units(CodecId::H264, 40, [new_sps, PPS, idr]));
        assert_eq!(packets.len(), 2);
        assert_eq!(&packets[0].data[6..9], &[0x64, 0x00, 0x28]);
    }

    #[test]
    fn metadata_advertises_avc1() {
        let muxer = H264RtmpEncoder::new(H264Track::new());
        assert_eq!(
            muxer.metadata(),
            vec![("videocodecid", AmfValue::String("avc1".into()))]
        );
    }
}
