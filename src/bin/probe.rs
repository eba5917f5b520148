//! Inspection CLI for talking-head.
//!
//! Prints the device classification, and replays viseme payloads against a
//! simulated audio clock so the per-frame output can be inspected without a
//! renderer. Frame output goes to stdout as JSON lines; logs go to stderr.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use talking_head::lipsync::{BlendShapeRig, ManualClock, MouthRegion, RegionWarpCanvas};
use talking_head::viseme::{VisemePayload, VisemeScheme, phonemes_to_timeline};
use talking_head::{
    Avatar, AvatarConfig, DeviceProfile, DriverCommand, FrameDriver, MouthSurface,
    PerformanceTier, PlaybackEvent, VisemeTimeline,
};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Inspect device classification and lip-sync output.
#[derive(Parser)]
#[command(name = "talking-head-probe", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Detect the host and print its tier and render settings.
    Device {
        /// Requested pixel ratio, clamped to the tier cap.
        #[arg(long)]
        pixel_ratio: Option<f32>,
    },

    /// Print the effective configuration as TOML.
    Config,

    /// Replay a viseme payload and print one JSON line per frame.
    Replay {
        /// Viseme payload JSON file.
        payload: PathBuf,

        /// Simulated frame rate.
        #[arg(long, default_value_t = 30)]
        fps: u32,

        /// Viseme code space of the payload.
        #[arg(long, value_enum)]
        scheme: Option<SchemeArg>,

        /// Force a tier instead of detecting one.
        #[arg(long, value_enum)]
        tier: Option<TierArg>,

        /// Avatar image to warp; frames are written to `--frames-dir`.
        #[arg(long, requires = "frames_dir")]
        image: Option<PathBuf>,

        /// Directory for warped PNG frames.
        #[arg(long)]
        frames_dir: Option<PathBuf>,

        /// Drive the frame loop in real time instead of stepping.
        #[arg(long, conflicts_with = "image")]
        realtime: bool,
    },

    /// Estimate a viseme timeline from ARPABET phonemes.
    Phonemes {
        /// Space-separated phonemes, e.g. "HH AH0 L OW1".
        phonemes: String,

        /// Speech rate multiplier.
        #[arg(long, default_value_t = 1.0)]
        rate: f32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemeArg {
    Oculus,
    Azure,
}

impl From<SchemeArg> for VisemeScheme {
    fn from(arg: SchemeArg) -> Self {
        match arg {
            SchemeArg::Oculus => Self::Oculus,
            SchemeArg::Azure => Self::Azure,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum TierArg {
    Low,
    Medium,
    High,
}

impl From<TierArg> for PerformanceTier {
    fn from(arg: TierArg) -> Self {
        match arg {
            TierArg::Low => Self::Low,
            TierArg::Medium => Self::Medium,
            TierArg::High => Self::High,
        }
    }
}

#[derive(Serialize)]
struct FrameLine<T: Serialize> {
    frame: usize,
    time_secs: f64,
    #[serde(flatten)]
    output: T,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("talking_head=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => AvatarConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => {
            let path = AvatarConfig::default_config_path();
            if path.exists() {
                AvatarConfig::from_file(&path)?
            } else {
                AvatarConfig::default()
            }
        }
    };

    match cli.command {
        Command::Device { pixel_ratio } => {
            let requested = pixel_ratio.or(config.render.pixel_ratio_override);
            let profile = DeviceProfile::detect(requested);
            println!("{}", serde_json::to_string_pretty(&profile)?);
            Ok(())
        }
        Command::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        Command::Replay {
            payload,
            fps,
            scheme,
            tier,
            image,
            frames_dir,
            realtime,
        } => {
            if let Some(scheme) = scheme {
                config.lip_sync.scheme = scheme.into();
            }
            let tier = tier.map_or_else(
                || DeviceProfile::detect(config.render.pixel_ratio_override).tier,
                PerformanceTier::from,
            );
            let timeline = load_timeline(&payload, &config)?;
            info!(events = timeline.len(), duration_ms = timeline.total_duration_ms(), %tier, "replaying");

            if realtime {
                return replay_realtime(config, tier, timeline, fps).await;
            }
            match (image.or_else(|| config.render.avatar_image.clone()), frames_dir) {
                (Some(image), Some(dir)) => {
                    std::fs::create_dir_all(&dir)?;
                    let canvas = RegionWarpCanvas::open(&image, MouthRegion::default())?;
                    let avatar = Avatar::new(config, tier, canvas);
                    replay_stepped(avatar, timeline, fps, |canvas, frame| {
                        let path = dir.join(format!("frame_{frame:05}.png"));
                        canvas.save_frame(&path)?;
                        Ok(())
                    })
                }
                _ => {
                    let avatar = Avatar::new(config, tier, BlendShapeRig::new());
                    replay_stepped(avatar, timeline, fps, |_, _| Ok(()))
                }
            }
        }
        Command::Phonemes { phonemes, rate } => {
            let timeline = phonemes_to_timeline(&phonemes, rate);
            println!("{}", serde_json::to_string_pretty(&timeline)?);
            Ok(())
        }
    }
}

fn load_timeline(path: &Path, config: &AvatarConfig) -> anyhow::Result<VisemeTimeline> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading payload {}", path.display()))?;
    let payload = VisemePayload::from_json(&json)?;
    Ok(payload.into_timeline(config.lip_sync.fallback_duration_ms))
}

/// Step a simulated clock through the utterance at `fps`.
fn replay_stepped<S, F>(
    mut avatar: Avatar<S>,
    timeline: VisemeTimeline,
    fps: u32,
    mut on_frame: F,
) -> anyhow::Result<()>
where
    S: MouthSurface,
    F: FnMut(&S, usize) -> anyhow::Result<()>,
{
    let fps = f64::from(fps.max(1));
    let total_secs = timeline.total_duration_ms() / 1000.0;
    let frames = (total_secs * fps).ceil() as usize;

    let clock = ManualClock::new();
    avatar.speak(timeline);
    clock.set_playing(true);
    avatar.on_playback(PlaybackEvent::Play);

    for frame in 0..=frames {
        let time_secs = frame as f64 / fps;
        clock.set_time_secs(time_secs);
        let output = avatar.frame(time_secs, &clock);
        println!(
            "{}",
            serde_json::to_string(&FrameLine {
                frame,
                time_secs,
                output,
            })?
        );
        on_frame(avatar.surface(), frame)?;
    }

    clock.set_playing(false);
    avatar.on_playback(PlaybackEvent::Ended);
    Ok(())
}

/// Run the async frame driver against a wall-clock-backed audio clock.
async fn replay_realtime(
    mut config: AvatarConfig,
    tier: PerformanceTier,
    timeline: VisemeTimeline,
    fps: u32,
) -> anyhow::Result<()> {
    config.lip_sync.frame_rate_hz = fps;
    let total = Duration::from_secs_f64(timeline.total_duration_ms() / 1000.0);

    let clock = ManualClock::new();
    let avatar = Avatar::new(config, tier, BlendShapeRig::new());
    let cancel = CancellationToken::new();
    let (frame_tx, mut frame_rx) = tokio::sync::mpsc::channel(64);
    let (driver, commands) = FrameDriver::new(clock.clone(), avatar, cancel.child_token());
    let task = tokio::spawn(driver.with_frame_sink(frame_tx).run());

    let started = Instant::now();
    let printer = tokio::spawn(async move {
        let mut frame = 0usize;
        while let Some(output) = frame_rx.recv().await {
            let line = FrameLine {
                frame,
                time_secs: started.elapsed().as_secs_f64(),
                output,
            };
            if let Ok(json) = serde_json::to_string(&line) {
                println!("{json}");
            }
            frame += 1;
        }
    });

    commands.send(DriverCommand::Load(timeline)).await?;
    clock.set_playing(true);
    commands
        .send(DriverCommand::Playback(PlaybackEvent::Play))
        .await?;

    let mut ticker = tokio::time::interval(Duration::from_millis(5));
    while started.elapsed() < total {
        ticker.tick().await;
        clock.set_time_secs(started.elapsed().as_secs_f64());
    }

    clock.set_playing(false);
    commands
        .send(DriverCommand::Playback(PlaybackEvent::Ended))
        .await?;
    cancel.cancel();
    let avatar = task.await?;
    printer.await?;
    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        tier = %avatar.tier(),
        "replay finished"
    );
    Ok(())
}
