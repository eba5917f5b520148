//! The audio clock the lip-sync engine reads every frame.
//!
//! The audio element's own position is the only time authority: playback
//! can stall, buffer or be throttled independently of the frame loop, so the
//! engine never keeps a timer of its own.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Playback state transitions reported by the audio element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// Playback started or resumed.
    Play,
    /// Playback paused; may resume.
    Pause,
    /// Playback reached the end of the utterance.
    Ended,
    /// Playback was interrupted by the user or host.
    Stop,
}

/// Read access to an audio element's playback position.
pub trait AudioClock: Send + Sync {
    /// Playback position in seconds from the start of the utterance.
    fn current_time_secs(&self) -> f64;

    /// Whether the element is currently advancing.
    fn is_playing(&self) -> bool;
}

/// A clock whose position is pushed in from outside.
///
/// Hosts that get position updates from a platform audio API (or from
/// `timeupdate` events) write them here; tests and the CLI drive it
/// directly. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    inner: Arc<ManualClockInner>,
}

#[derive(Debug, Default)]
struct ManualClockInner {
    time_bits: AtomicU64,
    playing: AtomicBool,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_time_secs(&self, secs: f64) {
        self.inner.time_bits.store(secs.to_bits(), Ordering::Release);
    }

    pub fn advance(&self, secs: f64) {
        self.set_time_secs(self.current_time_secs() + secs);
    }

    pub fn set_playing(&self, playing: bool) {
        self.inner.playing.store(playing, Ordering::Release);
    }
}

impl AudioClock for ManualClock {
    fn current_time_secs(&self) -> f64 {
        f64::from_bits(self.inner.time_bits.load(Ordering::Acquire))
    }

    fn is_playing(&self) -> bool {
        self.inner.playing.load(Ordering::Acquire)
    }
}
