//! RTMP muxers: frames to FLV audio/video tag bodies.
//!
//! Each [`RtmpEncoder`] first emits a *sequence header* carrying the codec
//! configuration, then one tag body per frame:
//!
//! | Codec | Sequence header | Frame |
//! |-------|-----------------|-------|
//! | H.264 | `AVCDecoderConfigurationRecord` (AVCPacketType 0) | AVCC NAL units (AVCPacketType 1) |
//! | AAC   | AudioSpecificConfig (AACPacketType 0) | raw AAC frame (AACPacketType 1) |
//!
//! Configuration not present on the track is captured from the frames
//! (SPS/PPS NAL units, ADTS headers). Frames that arrive before any
//! configuration is known are dropped.

pub mod aac;
pub mod h264;

use crate::codec::CodecId;
use crate::frame::Frame;
use crate::metadata::AmfValue;

/// FLV tag type (FLV v10.1 §E.4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TagType {
    Audio = 8,
    Video = 9,
}

/// One FLV tag body with its timestamp in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtmpPacket {
    pub tag_type: TagType,
    pub timestamp: u32,
    pub data: Vec<u8>,
}

impl RtmpPacket {
    /// Whether the body is a codec sequence header.
    pub fn is_sequence_header(&self) -> bool {
        self.data.len() >= 2 && self.data[1] == 0
    }
}

/// Codec-specific RTMP muxer bound to one track.
pub trait RtmpEncoder: Send {
    fn codec_id(&self) -> CodecId;

    /// Sequence header for the current configuration, if known.
    fn sequence_header(&self) -> Option<RtmpPacket>;

    /// Mux one frame. The sequence header is emitted ahead of the first
    /// frame and again whenever the configuration changes.
    fn input_frame(&mut self, frame: &Frame) -> Vec<RtmpPacket>;

    /// `onMetaData` entries describing this track.
    fn metadata(&self) -> Vec<(&'static str, AmfValue)>;
}
