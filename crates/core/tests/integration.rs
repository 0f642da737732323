//! End-to-end checks through the public `Factory` API: SDP in, codecs out,
//! frames through RTP and RTMP.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use media_factory::{
    AmfValue, CodecId, CounterSsrc, Diagnostic, Factory, FactoryConfig, Frame, MemorySink, SdpMedia, SdpTrack,
    Track, TrackType,
};

const SDP_VIDEO: &str = "m=video 0 RTP/AVP 96\r\n\
a=rtpmap:96 H264/90000\r\n\
a=fmtp:96 packetization-mode=1;profile-level-id=42001E;sprop-parameter-sets=Z0IAHg==,aM44gA==\r\n\
a=control:trackID=0\r\n";

const SDP_AUDIO: &str = "m=audio 0 RTP/AVP 97\r\n\
a=rtpmap:97 MPEG4-GENERIC/44100/2\r\n\
a=fmtp:97 streamtype=5;profile-level-id=1;mode=AAC-hbr;sizelength=13;indexlength=3;indexdeltalength=3;config=1210\r\n";

const SDP_H265: &str = "m=video 0 RTP/AVP 98\n\
a=rtpmap:98 H265/90000\n\
a=fmtp:98 sprop-vps=QAE=; sprop-sps=QgE=; sprop-pps=RAE=\n";

fn factory_with_sink() -> (Factory, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let factory = Factory::with_parts(FactoryConfig::default(), Arc::new(CounterSsrc::default()), sink.clone());
    (factory, sink)
}

#[test]
fn sdp_sections_resolve_to_ready_tracks() {
    let (factory, sink) = factory_with_sink();

    let video = SdpTrack::parse(SDP_VIDEO).expect("video section");
    let track = factory.resolve_track_from_attributes(&video).expect("h264 track");
    assert_eq!(track.codec_id(), CodecId::H264);
    assert_eq!(track.track_type(), TrackType::Video);
    assert!(track.is_ready());

    let audio = SdpTrack::parse(SDP_AUDIO).expect("audio section");
    let Some(Track::Aac(aac)) = factory.resolve_track_from_attributes(&audio) else {
        panic!("expected AAC track");
    };
    assert_eq!(aac.config(), Some([0x12, 0x10]));
    assert_eq!(aac.sample_rate(), Some(44_100));
    assert_eq!(aac.channels(), Some(2));

    let h265 = SdpTrack::parse(SDP_H265).expect("h265 section");
    let track = factory.resolve_track_from_attributes(&h265).expect("h265 track");
    assert_eq!(track.codec_id(), CodecId::H265);
    assert!(track.is_ready());

    assert!(sink.is_empty());
}

#[test]
fn every_resolved_track_has_a_decoder() {
    let (factory, _) = factory_with_sink();
    for section in [SDP_VIDEO, SDP_AUDIO, SDP_H265] {
        let media = SdpTrack::parse(section).unwrap();
        let track = factory.resolve_track_from_attributes(&media).unwrap();
        let decoder = factory.decoder_for_track(&track).unwrap();
        assert_eq!(decoder.codec_id(), track.codec_id());
    }
}

#[test]
fn h264_frame_through_rtp_and_back() {
    let (factory, _) = factory_with_sink();
    let media = SdpTrack::parse(SDP_VIDEO).unwrap();
    let track = factory.resolve_track_from_attributes(&media).unwrap();

    let mut encoder = factory.encoder_for_stream(&media).unwrap();
    let mut decoder = factory.decoder_for_track(&track).unwrap();

    let idr: Vec<u8> = std::iter::once(0x65).chain((0..4000).map(|i| i as u8)).collect();
    let frame = Frame::from_nal_units(CodecId::H264, 40, [idr.as_slice()]);
    let packets = encoder.input_frame(&frame);
    assert!(packets.len() > 1);
    assert!(packets.iter().all(|p| p.data.len() <= FactoryConfig::default().video_mtu));

    let mut frames = Vec::new();
    for packet in &packets {
        assert_eq!(packet.interleaved, 2);
        frames.extend(decoder.input_rtp(&packet.data).unwrap());
    }
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].data, frame.data);
    assert_eq!(frames[0].dts, 40);
}

#[test]
fn aac_frame_through_rtp_and_rtmp() {
    let (factory, _) = factory_with_sink();
    let media = SdpTrack::parse(SDP_AUDIO).unwrap();
    let track = factory.resolve_track_from_attributes(&media).unwrap();

    let mut encoder = factory.encoder_for_stream(&media).unwrap();
    let mut decoder = factory.decoder_for_track(&track).unwrap();
    let mut muxer = factory.muxer_for_track(&track).unwrap();

    let packets = encoder.input_frame(&Frame::new(CodecId::Aac, 100, vec![0x21; 64]));
    assert_eq!(packets.len(), 1);
    assert_eq!(packets[0].interleaved, 0);

    let frames = decoder.input_rtp(&packets[0].data).unwrap();
    assert_eq!(frames.len(), 1);

    let tags = muxer.input_frame(&frames[0]);
    assert_eq!(tags.len(), 2);
    assert!(tags[0].is_sequence_header());
    assert_eq!(&tags[0].data[2..], &[0x12, 0x10]);
    assert_eq!(&tags[1].data[2..], &[0x21; 64][..]);
}

#[test]
fn rtmp_metadata_round_trip() {
    let (factory, sink) = factory_with_sink();
    for codec in [CodecId::H264, CodecId::Aac] {
        let track = factory.track_from_codec_id(codec).unwrap();
        let muxer = factory.muxer_for_track(&track).unwrap();
        let metadata = muxer.metadata();
        let (_, value) = &metadata[0];
        assert_eq!(factory.codec_id_from_metadata(value), codec);
        assert_eq!(factory.track_from_metadata(value), Some(track));
    }
    assert!(sink.is_empty());

    assert_eq!(Factory::metadata_from_codec_id(CodecId::H265), AmfValue::Null);
    assert_eq!(factory.codec_id_from_metadata(&AmfValue::Null), CodecId::Invalid);
    assert_eq!(sink.take(), vec![Diagnostic::AbsentTrack]);
}

#[test]
fn h265_has_rtp_codecs_but_no_muxer() {
    let (factory, sink) = factory_with_sink();
    let media = SdpTrack::parse(SDP_H265).unwrap();
    let track = factory.resolve_track_from_attributes(&media).unwrap();

    assert!(factory.encoder_for_stream(&media).is_some());
    assert!(factory.decoder_for_track(&track).is_some());
    assert!(factory.muxer_for_track(&track).is_none());
    assert_eq!(sink.entries().len(), 1);
}

#[test]
fn unsupported_media_is_soft_failure() {
    let (factory, sink) = factory_with_sink();
    let pcmu = SdpTrack::new(TrackType::Audio, 0, "PCMU", 8000, "");
    assert!(factory.resolve_track_from_attributes(&pcmu).is_none());
    assert!(factory.encoder_for_stream(&pcmu).is_none());
    assert!(factory.decoder_for_codec_id(pcmu.codec_id()).is_none());
    assert_eq!(sink.entries().len(), 3);
}

#[test]
fn ssrcs_are_sequential_per_source() {
    let (factory, _) = factory_with_sink();
    let media = SdpTrack::parse(SDP_VIDEO).unwrap();
    let ssrcs: Vec<u32> = (0..3)
        .map(|_| factory.encoder_for_stream(&media).unwrap().params().ssrc)
        .collect();
    assert_eq!(ssrcs, vec![0x1000_0001, 0x1000_0002, 0x1000_0003]);
}

#[test]
fn concurrent_encoder_construction_yields_distinct_ssrcs() {
    let factory = Arc::new(Factory::default());
    let media = Arc::new(SdpTrack::parse(SDP_AUDIO).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let factory = Arc::clone(&factory);
            let media = Arc::clone(&media);
            thread::spawn(move || {
                (0..250)
                    .map(|_| factory.encoder_for_stream(media.as_ref()).unwrap().params().ssrc)
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for ssrc in handle.join().unwrap() {
            assert!(seen.insert(ssrc), "duplicate ssrc {ssrc:#x}");
        }
    }
    assert_eq!(seen.len(), 2000);
}

#[test]
fn config_update_applies_to_new_encoders_only() {
    let (factory, _) = factory_with_sink();
    let media = SdpTrack::parse(SDP_AUDIO).unwrap();
    let before = factory.encoder_for_stream(&media).unwrap();

    factory.update_config(FactoryConfig::default().with_audio_mtu(300));
    let after = factory.encoder_for_stream(&media).unwrap();

    assert_eq!(before.params().mtu, 600);
    assert_eq!(after.params().mtu, 300);
    assert_eq!(factory.config().audio_mtu, 300);
}
