//! rowvid command line: encode videos into pixel rows, list what the store
//! holds, and play videos back as ASCII in the terminal.
//!
//! The binary runs against the in-process store, so `play --seed` encodes
//! the synthetic source first; pointing at a persistent backend only needs
//! another [`rowvid_store::RowStore`] impl wired in here.

mod ingest;
mod render;
mod source;

use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rowvid_playback::{PlaybackEvent, Session};
use rowvid_protocol::config::{EncoderConfig, PlaybackConfig};
use rowvid_protocol::record::Mode;
use rowvid_protocol::types::VideoId;
use rowvid_store::{MemoryRowStore, WriterConfig};

use ingest::run_encode_job;
use render::ascii_frame;
use source::SyntheticSource;

#[derive(Parser)]
#[command(name = "rowvid", version, about = "Pixel-row video encoding and playback")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode a video source into pixel rows.
    Encode(EncodeArgs),
    /// Play an encoded video as ASCII frames.
    Play(PlayArgs),
    /// List encoded videos.
    List,
}

#[derive(Args)]
struct EncodeArgs {
    /// Source video URL; doubles as the video id.
    url: String,
    #[arg(long, default_value_t = 160)]
    target_width: u32,
    #[arg(long, default_value_t = 90)]
    target_height: u32,
    /// binary, grayscale, or color.
    #[arg(long, default_value = "binary")]
    mode: Mode,
    /// Luminance threshold for binary mode.
    #[arg(long, default_value_t = 128)]
    threshold: u8,
    /// Stop encoding past this many seconds of video.
    #[arg(long, default_value_t = 10)]
    max_duration_secs: u32,
    /// Frames generated by the synthetic source.
    #[arg(long, default_value_t = 300)]
    source_frames: u64,
    /// Frame rate of the synthetic source.
    #[arg(long, default_value_t = 30.0)]
    source_fps: f64,
}

impl EncodeArgs {
    fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig {
            url: self.url.clone(),
            target_width: self.target_width,
            target_height: self.target_height,
            mode: self.mode,
            threshold: self.threshold,
            max_duration_secs: self.max_duration_secs,
        }
    }

    /// Source at twice the target resolution so the encoder's resize runs.
    fn synthetic_source(&self) -> SyntheticSource {
        SyntheticSource::new(
            self.target_width * 2,
            self.target_height * 2,
            self.source_fps,
            self.source_frames,
        )
    }
}

#[derive(Args)]
struct PlayArgs {
    /// Video id (the URL it was encoded under).
    url: String,
    #[arg(long, default_value_t = 30)]
    fps: u32,
    #[arg(long, default_value_t = 64)]
    cache_capacity: usize,
    #[arg(long, default_value_t = 5000)]
    query_timeout_ms: u64,
    /// Stop after this many rendered frames instead of looping forever.
    #[arg(long)]
    max_frames: Option<u64>,
    /// Encode the synthetic source under this id before playing.
    #[arg(long)]
    seed: bool,
    /// Encoding options used with --seed.
    #[command(flatten)]
    seed_encode: SeedEncodeArgs,
}

#[derive(Args)]
struct SeedEncodeArgs {
    #[arg(long, default_value_t = 80)]
    seed_width: u32,
    #[arg(long, default_value_t = 45)]
    seed_height: u32,
    #[arg(long, default_value = "grayscale")]
    seed_mode: Mode,
    #[arg(long, default_value_t = 90)]
    seed_frames: u64,
}

impl PlayArgs {
    fn playback_config(&self) -> PlaybackConfig {
        PlaybackConfig {
            fps: self.fps,
            cache_capacity: self.cache_capacity,
            query_timeout: Duration::from_millis(self.query_timeout_ms),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let store = MemoryRowStore::new();

    match cli.command {
        Command::Encode(args) => {
            let mut source = args.synthetic_source();
            let report = run_encode_job(
                &store,
                &mut source,
                args.encoder_config(),
                WriterConfig::default(),
            )
            .await?;
            println!(
                "encoded {} as {} frames / {} rows",
                report.video_id, report.frames_encoded, report.rows_written
            );
        }

        Command::Play(args) => {
            if args.seed {
                let config = EncoderConfig {
                    target_width: args.seed_encode.seed_width,
                    target_height: args.seed_encode.seed_height,
                    mode: args.seed_encode.seed_mode,
                    ..EncoderConfig::for_url(&args.url)
                };
                let mut source = SyntheticSource::new(
                    config.target_width * 2,
                    config.target_height * 2,
                    30.0,
                    args.seed_encode.seed_frames,
                );
                run_encode_job(&store, &mut source, config, WriterConfig::default())
                    .await
                    .context("seeding the store")?;
            }
            play(store, args).await?;
        }

        Command::List => {
            let session = Session::connect(store)
                .await
                .context("connecting to store")?;
            let videos = session.list_videos().await.context("listing videos")?;
            if videos.is_empty() {
                println!("no videos encoded");
            }
            for video in videos {
                println!("{video}");
            }
        }
    }

    Ok(())
}

/// Drive a playback controller, printing every delivered frame until the
/// frame budget runs out or the store fails.
async fn play(store: MemoryRowStore, args: PlayArgs) -> anyhow::Result<()> {
    let video_id = VideoId::from(args.url.as_str());
    let config = args.playback_config();

    let session = Session::connect(store)
        .await
        .context("connecting to store")?;
    let mut controller = session.start_playback(config);
    controller.load(video_id);

    let mut rendered = 0u64;
    while let Some(event) = controller.recv_event().await {
        match event {
            PlaybackEvent::MetadataLoaded(meta) => {
                tracing::info!(
                    video_id = %meta.video_id,
                    width = meta.width,
                    height = meta.height,
                    total_frames = meta.total_frames,
                    mode = %meta.mode,
                    "playing"
                );
            }
            PlaybackEvent::FrameReady {
                frame_id, frame, ..
            } => {
                print!("{}", ascii_frame(&frame));
                println!("-- frame {frame_id}");
                rendered += 1;
                if rendered == 1 {
                    // Frame 0 renders paused; start the clock from there.
                    controller.play();
                }
                if args.max_frames.is_some_and(|max| rendered >= max) {
                    break;
                }
            }
            PlaybackEvent::StateChanged(state) => {
                tracing::debug!(?state, "playback state");
            }
            PlaybackEvent::StoreFailed(e) => {
                controller.stop();
                return Err(e).context("playback aborted on store failure");
            }
        }
    }

    controller.stop();
    Ok(())
}
