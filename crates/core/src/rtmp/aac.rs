use super::{RtmpEncoder, RtmpPacket, TagType};
use crate::codec::CodecId;
use crate::frame::Frame;
use crate::metadata::{AmfValue, metadata_from_codec_id};
use crate::track::AacTrack;
use crate::track::aac::{config_from_adts, strip_adts};

/// AAC RTMP muxer.
#[derive(Debug)]
pub struct AacRtmpEncoder {
    track: AacTrack,
    header_sent: bool,
}

impl AacRtmpEncoder {
    pub fn new(track: AacTrack) -> Self {
        Self {
            track,
            header_sent: false,
        }
    }

    /// FLV SoundFormat=10 (AAC), SoundRate=3, SoundSize=1; SoundType from
    /// the channel count.
    fn flags(&self) -> u8 {
        let stereo = self.track.channels().is_none_or(|c| c != 1);
        0xa0 | (3 << 2) | (1 << 1) | u8::from(stereo)
    }
}

impl RtmpEncoder for AacRtmpEncoder {
    fn codec_id(&self) -> CodecId {
        CodecId::Aac
    }

    fn sequence_header(&self) -> Option<RtmpPacket> {
        let config = self.track.config()?;
        Some(RtmpPacket {
            tag_type: TagType::Audio,
            timestamp: 0,
            data: vec![self.flags(), 0, config[0], config[1]],
        })
    }

    fn input_frame(&mut self, frame: &Frame) -> Vec<RtmpPacket> {
        let mut packets = Vec::new();
        if let Some(config) = config_from_adts(&frame.data) {
            if self.track.config() != Some(config) {
                tracing::debug!(config = %hex::encode(config), "AAC config captured from ADTS");
                self.track = AacTrack::with_config(config);
                self.header_sent = false;
            }
        }
        let raw = strip_adts(&frame.data);

        if !self.header_sent {
            match self.sequence_header() {
                Some(mut header) => {
                    header.timestamp = frame.dts;
                    packets.push(header);
                    self.header_sent = true;
                }
                None => {
                    tracing::trace!(dts = frame.dts, "AAC frame dropped: no AudioSpecificConfig yet");
                    return packets;
                }
            }
        }

        if raw.is_empty() {
            return packets;
        }
        let mut data = Vec::with_capacity(2 + raw.len());
        data.push(self.flags());
        data.push(1);
        data.extend_from_slice(raw);
        packets.push(RtmpPacket {
            tag_type: TagType::Audio,
            timestamp: frame.dts,
            data,
        });
        packets
    }

    fn metadata(&self) -> Vec<(&'static str, AmfValue)> {
        let mut entries = vec![("audiocodecid", metadata_from_codec_id(CodecId::Aac))];
        if let Some(rate) = self.track.sample_rate() {
            entries.push(("audiosamplerate", AmfValue::Number(f64::from(rate))));
        }
        if let Some(channels) = self.track.channels() {
            entries.push(("stereo", AmfValue::Boolean(channels > 1)));
        }
        entries
    }
}
