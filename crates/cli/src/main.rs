use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use media_factory::{Factory, FactoryConfig, SdpMedia, SdpTrack, Track, TrackType};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "media-probe",
    about = "Resolve SDP media sections into tracks and report available codecs"
)]
struct Args {
    /// SDP file; every `m=` section in it is probed
    #[arg(long, short, conflicts_with = "codec")]
    sdp: Option<PathBuf>,

    /// Encoding name, as in `a=rtpmap` (e.g. H264, mpeg4-generic)
    #[arg(long, requires = "kind")]
    codec: Option<String>,

    /// `a=fmtp` value, including the leading payload type
    #[arg(long, default_value = "")]
    fmtp: String,

    /// Media kind: audio or video
    #[arg(long)]
    kind: Option<String>,

    #[arg(long, default_value_t = 96)]
    payload_type: u8,

    #[arg(long, default_value_t = 90_000)]
    sample_rate: u32,

    /// Maximum RTP packet size for audio
    #[arg(long, default_value_t = FactoryConfig::default().audio_mtu)]
    audio_mtu: usize,

    /// Maximum RTP packet size for video
    #[arg(long, default_value_t = FactoryConfig::default().video_mtu)]
    video_mtu: usize,
}

/// `RUST_LOG` directives, or warnings and errors only.
fn env_filter(directives: Option<&str>) -> EnvFilter {
    EnvFilter::new(directives.unwrap_or("warn"))
}

fn media_sections(sdp: &str) -> Vec<&str> {
    let mut starts: Vec<usize> = sdp
        .match_indices("m=")
        .map(|(i, _)| i)
        .filter(|&i| i == 0 || sdp.as_bytes()[i - 1] == b'\n')
        .collect();
    starts.push(sdp.len());
    starts.windows(2).map(|w| &sdp[w[0]..w[1]]).collect()
}

fn probe(factory: &Factory, media: &SdpTrack) {
    println!(
        "{} pt={} {}/{}",
        media.track_type(),
        media.payload_type(),
        media.codec_name(),
        media.sample_rate()
    );

    let Some(track) = factory.resolve_track_from_attributes(media) else {
        println!("  unsupported");
        return;
    };

    match &track {
        Track::H264(h264) => {
            println!("  ready: {}", track.is_ready());
            if let Some(id) = h264.profile_level_id() {
                println!("  profile-level-id: {id}");
            }
        }
        Track::H265(h265) => {
            println!("  ready: {}", track.is_ready());
            println!("  vps: {} bytes", h265.vps().len());
        }
        Track::Aac(aac) => {
            println!("  ready: {}", track.is_ready());
            if let (Some(rate), Some(channels)) = (aac.sample_rate(), aac.channels()) {
                println!("  {rate} Hz, {channels} ch");
            }
        }
    }

    if let Some(encoder) = factory.encoder_for_stream(media) {
        let params = encoder.params();
        println!(
            "  rtp encoder: ssrc={:#010x} mtu={} interleaved={}",
            params.ssrc, params.mtu, params.interleaved
        );
    }
    println!(
        "  rtp decoder: {}",
        if factory.decoder_for_track(&track).is_some() { "yes" } else { "no" }
    );
    match factory.muxer_for_track(&track) {
        Some(muxer) => {
            let metadata = muxer.metadata();
            let fields: Vec<String> = metadata.iter().map(|(k, v)| format!("{k}={v}")).collect();
            println!("  rtmp muxer: {}", fields.join(" "));
        }
        None => println!("  rtmp muxer: no"),
    }
}

fn main() -> ExitCode {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(directives.as_deref()))
        .init();

    let args = Args::parse();

    let config = FactoryConfig::default()
        .with_audio_mtu(args.audio_mtu)
        .with_video_mtu(args.video_mtu);
    tracing::debug!(
        audio_mtu = config.audio_mtu,
        video_mtu = config.video_mtu,
        "factory configured"
    );
    let factory = Factory::new(config);

    let tracks = if let Some(path) = &args.sdp {
        let sdp = match fs::read_to_string(path) {
            Ok(sdp) => sdp,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to read SDP file");
                return ExitCode::FAILURE;
            }
        };
        media_sections(&sdp)
            .into_iter()
            .filter_map(SdpTrack::parse)
            .collect()
    } else if let Some(codec) = &args.codec {
        let kind = args.kind.as_deref().and_then(TrackType::from_media);
        let Some(kind) = kind else {
            eprintln!("--kind must be audio or video");
            return ExitCode::FAILURE;
        };
        vec![SdpTrack::new(kind, args.payload_type, codec, args.sample_rate, &args.fmtp)]
    } else {
        eprintln!("Either --sdp or --codec is required");
        return ExitCode::FAILURE;
    };

    if tracks.is_empty() {
        tracing::warn!("no audio or video media sections found");
        return ExitCode::FAILURE;
    }
    for track in &tracks {
        probe(&factory, track);
    }
    ExitCode::SUCCESS
}
