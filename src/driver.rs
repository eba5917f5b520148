//! Async frame loop for one avatar.
//!
//! The driver owns an [`Avatar`] and the audio clock its lip sync follows.
//! It ticks at the configured frame rate for as long as it runs, since the
//! idle channels never stop; the mouth only moves between `Play` and the
//! next `Pause`, `Ended` or `Stop`. Everything that changes the avatar comes
//! in over one command channel, so a new utterance and its `Play` are always
//! seen in order.
//!
//! # Usage
//!
//! ```ignore
//! let cancel = CancellationToken::new();
//! let (driver, commands) = FrameDriver::new(clock, avatar, cancel.child_token());
//! let task = tokio::spawn(driver.with_frame_sink(frames_tx).run());
//! commands.send(DriverCommand::Load(timeline)).await?;
//! commands.send(DriverCommand::Playback(PlaybackEvent::Play)).await?;
//! ```

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::avatar::{Avatar, FrameOutput};
use crate::lipsync::{AudioClock, MouthSurface, PlaybackEvent};
use crate::viseme::VisemeTimeline;

/// Depth of the command channel.
const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Input to a running [`FrameDriver`].
#[derive(Debug, Clone)]
pub enum DriverCommand {
    /// Replace the utterance. Playback must be restarted with `Play`.
    Load(VisemeTimeline),
    /// Audio element state change.
    Playback(PlaybackEvent),
    /// Ease the expression toward a new target weight.
    Expression(f32),
    /// Start a head nod.
    Nod,
}

enum Step {
    Frame,
    Command(DriverCommand),
    Shutdown,
}

/// Per-avatar frame loop.
pub struct FrameDriver<C, S> {
    clock: C,
    avatar: Avatar<S>,
    commands: mpsc::Receiver<DriverCommand>,
    frames: Option<mpsc::Sender<FrameOutput>>,
    cancel: CancellationToken,
    frame_interval: Duration,
}

impl<C, S> FrameDriver<C, S>
where
    C: AudioClock,
    S: MouthSurface,
{
    /// Create a driver and the sender used to control it.
    ///
    /// The frame rate comes from the avatar's `lip_sync.frame_rate_hz`. The
    /// driver runs until `cancel` is cancelled or every sender is dropped.
    pub fn new(
        clock: C,
        avatar: Avatar<S>,
        cancel: CancellationToken,
    ) -> (Self, mpsc::Sender<DriverCommand>) {
        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let hz = avatar.config().lip_sync.frame_rate_hz.max(1);
        let driver = Self {
            clock,
            avatar,
            commands: rx,
            frames: None,
            cancel,
            frame_interval: Duration::from_secs_f64(1.0 / f64::from(hz)),
        };
        (driver, tx)
    }

    /// Also publish every frame to `tx`.
    ///
    /// Frames are dropped rather than queued when the receiver falls behind.
    #[must_use]
    pub fn with_frame_sink(mut self, tx: mpsc::Sender<FrameOutput>) -> Self {
        self.frames = Some(tx);
        self
    }

    /// Run until cancelled. Returns the avatar with lip sync stopped.
    pub async fn run(mut self) -> Avatar<S> {
        info!(
            interval_ms = self.frame_interval.as_secs_f64() * 1000.0,
            tier = %self.avatar.tier(),
            "frame driver started"
        );
        let started = Instant::now();
        let mut ticker = tokio::time::interval(self.frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let step = tokio::select! {
                _ = self.cancel.cancelled() => Step::Shutdown,
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => Step::Command(cmd),
                    None => Step::Shutdown,
                },
                _ = ticker.tick() => Step::Frame,
            };

            let now_secs = started.elapsed().as_secs_f64();
            match step {
                Step::Shutdown => break,
                Step::Command(DriverCommand::Load(timeline)) => self.avatar.speak(timeline),
                Step::Command(DriverCommand::Playback(event)) => self.avatar.on_playback(event),
                Step::Command(DriverCommand::Expression(target)) => {
                    self.avatar.set_expression(target, now_secs);
                }
                Step::Command(DriverCommand::Nod) => self.avatar.nod(now_secs),
                Step::Frame => {
                    let output = self.avatar.frame(now_secs, &self.clock);
                    self.publish(output);
                }
            }
        }

        self.avatar.on_playback(PlaybackEvent::Stop);
        info!("frame driver stopped");
        self.avatar
    }

    fn publish(&mut self, output: FrameOutput) {
        let Some(tx) = &self.frames else {
            return;
        };
        match tx.try_send(output) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                debug!(mouth = output.mouth_shape_id, "frame sink full; dropping frame");
            }
            Err(TrySendError::Closed(_)) => {
                debug!("frame sink closed");
                self.frames = None;
            }
        }
    }
}
