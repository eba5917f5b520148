//! Viseme-driven lip sync.
//!
//! [`LipSyncEngine`] owns the viseme timeline of the utterance that is
//! currently playing. Every frame it reads the audio clock, resolves the
//! active viseme, maps it to a mouth target and writes it to a
//! [`MouthSurface`]. It only produces frames between `Play` and
//! `Pause`/`Ended`/`Stop`; stopping always returns the mouth to rest.
//!
//! # Usage
//!
//! ```
//! use talking_head::lipsync::{
//!     BlendShapeRig, LipSyncEngine, ManualClock, PlaybackEvent,
//! };
//! use talking_head::viseme::{TimeUnit, VisemeTimeline};
//!
//! let timeline = VisemeTimeline::from_raw(
//!     [(0.0, 1), (0.2, 10), (0.5, 0)],
//!     TimeUnit::Seconds,
//!     150.0,
//! );
//! let mut engine = LipSyncEngine::default();
//! let mut rig = BlendShapeRig::new();
//! let clock = ManualClock::new();
//!
//! engine.load_utterance(timeline, &mut rig);
//! clock.set_playing(true);
//! engine.handle_event(PlaybackEvent::Play, &mut rig);
//!
//! clock.set_time_secs(0.35);
//! let frame = engine.tick(&clock, &mut rig).expect("playing");
//! assert_eq!(frame.target.morph_target, "viseme_aa");
//! ```

pub mod canvas;
pub mod clock;
pub mod surface;

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

pub use canvas::{MouthRegion, RegionWarpCanvas};
pub use clock::{AudioClock, ManualClock, PlaybackEvent};
pub use surface::{BlendShapeRig, MouthSurface};

use crate::config::LipSyncConfig;
use crate::viseme::{MouthShape, MouthTarget, VisemeMapping, VisemeTimeline};

/// Where the engine is in the playback lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Nothing loaded or loaded but not yet started.
    #[default]
    Idle,
    Playing,
    Paused,
    /// Ended or stopped; needs a new `Play` to produce frames again.
    Finished,
}

/// Mouth output for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouthFrame {
    pub target: MouthTarget,
    pub intensity: f32,
    /// Playback position the frame was resolved against.
    pub time_ms: f64,
}

impl MouthFrame {
    /// At-rest mouth.
    pub const NEUTRAL: Self = Self {
        target: MouthTarget::NEUTRAL,
        intensity: 0.0,
        time_ms: 0.0,
    };

    pub fn shape_id(&self) -> u8 {
        self.target.shape_id()
    }

    pub fn shape(&self) -> MouthShape {
        self.target.shape
    }
}

/// Serializable mouth channel for renderers on the far side of a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MouthChannel {
    pub mouth_intensity: f32,
    pub mouth_shape_id: u8,
    pub mouth_shape: MouthShape,
    pub morph_target: &'static str,
}

impl From<&MouthFrame> for MouthChannel {
    fn from(frame: &MouthFrame) -> Self {
        Self {
            mouth_intensity: frame.intensity,
            mouth_shape_id: frame.shape_id(),
            mouth_shape: frame.shape(),
            morph_target: frame.target.morph_target,
        }
    }
}

/// Audio-clock-driven viseme resolver. One per avatar.
#[derive(Debug, Clone, Default)]
pub struct LipSyncEngine {
    mapping: VisemeMapping,
    timeline: VisemeTimeline,
    coarticulation_ms: f64,
    state: PlaybackState,
    /// Unknown ids already reported for this utterance.
    warned_ids: HashSet<i64>,
    last_frame: Option<MouthFrame>,
}

impl LipSyncEngine {
    pub fn new(mapping: VisemeMapping, config: &LipSyncConfig) -> Self {
        let coarticulation_ms = if config.coarticulation_ms.is_finite() {
            config.coarticulation_ms.max(0.0)
        } else {
            0.0
        };
        Self {
            mapping,
            coarticulation_ms,
            ..Self::default()
        }
    }

    /// Replace the current utterance.
    ///
    /// Drops the previous timeline and per-viseme cache and puts the mouth
    /// at rest, so nothing from the old utterance is evaluated against the
    /// new audio clock.
    pub fn load_utterance<S: MouthSurface + ?Sized>(
        &mut self,
        timeline: VisemeTimeline,
        surface: &mut S,
    ) {
        debug!(
            events = timeline.len(),
            duration_ms = timeline.total_duration_ms(),
            "utterance loaded"
        );
        self.timeline = timeline;
        self.warned_ids.clear();
        self.last_frame = None;
        self.state = PlaybackState::Idle;
        surface.reset_mouth();
    }

    /// React to an audio element state change.
    pub fn handle_event<S: MouthSurface + ?Sized>(&mut self, event: PlaybackEvent, surface: &mut S) {
        match event {
            PlaybackEvent::Play => {
                self.state = PlaybackState::Playing;
            }
            PlaybackEvent::Pause => {
                self.state = PlaybackState::Paused;
                self.rest(surface);
            }
            PlaybackEvent::Ended | PlaybackEvent::Stop => {
                self.state = PlaybackState::Finished;
                self.rest(surface);
            }
        }
        debug!(?event, state = ?self.state, "lip-sync playback event");
    }

    /// Drop the utterance entirely and rest the mouth (avatar swap).
    pub fn reset<S: MouthSurface + ?Sized>(&mut self, surface: &mut S) {
        self.load_utterance(VisemeTimeline::default(), surface);
    }

    fn rest<S: MouthSurface + ?Sized>(&mut self, surface: &mut S) {
        self.last_frame = None;
        surface.reset_mouth();
    }

    /// Produce one frame if playback is active.
    ///
    /// Returns `None` (and touches nothing) outside `Playing` or while the
    /// clock reports it is not advancing.
    pub fn tick<C, S>(&mut self, clock: &C, surface: &mut S) -> Option<MouthFrame>
    where
        C: AudioClock + ?Sized,
        S: MouthSurface + ?Sized,
    {
        if self.state != PlaybackState::Playing || !clock.is_playing() {
            return None;
        }
        let current_ms = clock.current_time_secs() * 1000.0;
        let frame = self.resolve(current_ms);
        surface.apply_mouth_shape(&frame.target, frame.intensity);
        self.last_frame = Some(frame);
        Some(frame)
    }

    /// Mouth frame for a playback position, without touching any surface.
    pub fn resolve(&mut self, current_ms: f64) -> MouthFrame {
        let Some(index) = self.timeline.active_index(current_ms) else {
            return MouthFrame {
                time_ms: current_ms,
                ..MouthFrame::NEUTRAL
            };
        };
        let event = self.timeline.events()[index];
        let (target, mut intensity) = self.lookup(event.viseme_id);

        if self.coarticulation_ms > 0.0
            && let Some(next) = self.timeline.next_after(index).copied()
        {
            let remaining = next.time_ms - current_ms;
            if remaining < self.coarticulation_ms {
                let blend = (1.0 - remaining / self.coarticulation_ms).clamp(0.0, 1.0) as f32;
                let (_, next_intensity) = self.lookup(next.viseme_id);
                intensity += (next_intensity - intensity) * blend;
            }
        }

        MouthFrame {
            target,
            intensity,
            time_ms: current_ms,
        }
    }

    fn lookup(&mut self, viseme_id: i64) -> (MouthTarget, f32) {
        let (target, intensity, known) = self.mapping.resolve(viseme_id);
        if !known && self.warned_ids.insert(viseme_id) {
            warn!(
                viseme_id,
                scheme = ?self.mapping.scheme(),
                "unrecognized viseme id; holding mouth neutral"
            );
        }
        (target, intensity)
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Whether the frame loop should be running.
    pub fn is_active(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn timeline(&self) -> &VisemeTimeline {
        &self.timeline
    }

    /// The frame most recently written to a surface, `None` at rest.
    pub fn last_frame(&self) -> Option<MouthFrame> {
        self.last_frame
    }
}
