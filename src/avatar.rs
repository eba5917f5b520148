//! One animated avatar instance.
//!
//! [`Avatar`] owns a full idle controller set, a lip-sync engine and the
//! mouth surface they drive. Nothing is shared between avatars; swapping the
//! model resets every timer and the current utterance.

use serde::Serialize;
use tracing::{debug, info};

use crate::config::AvatarConfig;
use crate::device::PerformanceTier;
use crate::idle::IdleAnimator;
use crate::lipsync::{AudioClock, LipSyncEngine, MouthSurface, PlaybackEvent};
use crate::viseme::{VisemeMapping, VisemePayload, VisemeTimeline};

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameOutput {
    pub eyes_closed: f32,
    pub chest_scale: f32,
    pub expression_weight: f32,
    pub head_nod_angle: f32,
    pub mouth_intensity: f32,
    /// Oculus viseme code of the mouth target, `0` at rest.
    pub mouth_shape_id: u8,
}

pub struct Avatar<S> {
    config: AvatarConfig,
    tier: PerformanceTier,
    idle: IdleAnimator,
    lipsync: LipSyncEngine,
    surface: S,
}

impl<S: MouthSurface> Avatar<S> {
    pub fn new(config: AvatarConfig, tier: PerformanceTier, surface: S) -> Self {
        Self::with_seed(config, tier, surface, rand::random::<u64>())
    }

    /// Build with a fixed blink seed for reproducible output.
    pub fn with_seed(config: AvatarConfig, tier: PerformanceTier, surface: S, seed: u64) -> Self {
        let idle = IdleAnimator::for_tier(config.animation.clone(), tier, seed);
        let lipsync = LipSyncEngine::new(
            VisemeMapping::new(config.lip_sync.scheme),
            &config.lip_sync,
        );
        info!(%tier, scheme = ?config.lip_sync.scheme, "avatar created");
        Self {
            config,
            tier,
            idle,
            lipsync,
            surface,
        }
    }

    /// Queue an utterance. Playback starts with the next `Play` event.
    pub fn speak(&mut self, timeline: VisemeTimeline) {
        self.lipsync.load_utterance(timeline, &mut self.surface);
    }

    /// Queue an utterance from a raw synthesizer payload.
    pub fn speak_payload(&mut self, payload: &VisemePayload) {
        let timeline =
            VisemeTimeline::from_payload(payload, self.config.lip_sync.fallback_duration_ms);
        self.speak(timeline);
    }

    /// Forward an audio element state change to lip sync.
    pub fn on_playback(&mut self, event: PlaybackEvent) {
        self.lipsync.handle_event(event, &mut self.surface);
    }

    /// Advance every controller to `now_secs` and drive the mouth from
    /// `clock`.
    ///
    /// While lip sync is speaking it owns the mouth: if the expression
    /// drives the mouth too, its weight is reported as `0` for the duration.
    /// The expression controller keeps running underneath, so the weight
    /// comes back where it would have been once speech stops. While the
    /// audio clock is stalled (buffering) the last mouth frame is held.
    pub fn frame<C: AudioClock + ?Sized>(&mut self, now_secs: f64, clock: &C) -> FrameOutput {
        let mut pose = self.idle.update(now_secs);
        // A stalled clock produces no new frame; the surface still shows the
        // last one, so report that.
        let mouth = self
            .lipsync
            .tick(clock, &mut self.surface)
            .or_else(|| self.lipsync.last_frame().filter(|_| self.lipsync.is_active()));

        if self.lipsync.is_active() && self.config.animation.expression.drives_mouth {
            pose.expression_weight = 0.0;
        }

        let (mouth_intensity, mouth_shape_id) =
            mouth.map_or((0.0, 0), |m| (m.intensity, m.shape_id()));

        FrameOutput {
            eyes_closed: pose.eyes_closed,
            chest_scale: pose.chest_scale,
            expression_weight: pose.expression_weight,
            head_nod_angle: pose.head_nod_angle,
            mouth_intensity,
            mouth_shape_id,
        }
    }

    pub fn set_expression(&mut self, target: f32, now_secs: f64) {
        self.idle.set_expression(target, now_secs);
    }

    pub fn nod(&mut self, now_secs: f64) {
        self.idle.nod(now_secs);
    }

    /// Replace the model surface. Drops the utterance and all timers.
    ///
    /// Returns the previous surface, left at rest.
    pub fn swap_surface(&mut self, surface: S) -> S {
        self.lipsync.reset(&mut self.surface);
        self.idle.reset();
        let old = std::mem::replace(&mut self.surface, surface);
        self.surface.reset_mouth();
        debug!("avatar model swapped");
        old
    }

    /// Whether lip sync is currently driving the mouth.
    pub fn is_speaking(&self) -> bool {
        self.lipsync.is_active()
    }

    pub fn tier(&self) -> PerformanceTier {
        self.tier
    }

    pub fn config(&self) -> &AvatarConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn idle_mut(&mut self) -> &mut IdleAnimator {
        &mut self.idle
    }

    pub fn lipsync(&self) -> &LipSyncEngine {
        &self.lipsync
    }
}
