//! Idle animation controllers.
//!
//! Four independent per-frame timing machines, each writing to its own
//! target on the model:
//!
//! | Controller | Target | Output |
//! |------------|--------|--------|
//! | [`BreathingController`] | chest/torso | uniform scale ≈ `[0.97, 1.03]` |
//! | [`BlinkController`] | eyelids | `eyes_closed ∈ [0, 1]` |
//! | [`ExpressionController`] | face blend | `expression_weight ∈ [0, 1]` |
//! | [`HeadNodController`] | head pitch | angle in radians |
//!
//! [`IdleAnimator`] bundles one of each for a single avatar instance.

pub mod blink;
pub mod breathing;
pub mod easing;
pub mod expression;
pub mod head_nod;

use serde::Serialize;

pub use blink::BlinkController;
pub use breathing::{BreathingController, breathing_scale};
pub use expression::ExpressionController;
pub use head_nod::HeadNodController;

use crate::config::AnimationConfig;
use crate::device::PerformanceTier;

/// Idle channel values for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IdlePose {
    pub chest_scale: f32,
    pub eyes_closed: f32,
    pub expression_weight: f32,
    pub head_nod_angle: f32,
}

impl Default for IdlePose {
    fn default() -> Self {
        Self {
            chest_scale: 1.0,
            eyes_closed: 0.0,
            expression_weight: 0.0,
            head_nod_angle: 0.0,
        }
    }
}

/// The idle controller set owned by one avatar.
#[derive(Debug, Clone)]
pub struct IdleAnimator {
    config: AnimationConfig,
    breathing: BreathingController,
    blink: BlinkController,
    expression: ExpressionController,
    head_nod: HeadNodController,
}

impl IdleAnimator {
    pub fn new(config: AnimationConfig) -> Self {
        let blink = BlinkController::new(config.blinking.clone());
        Self::with_blink(config, blink)
    }

    /// Build with a fixed blink seed for reproducible output.
    pub fn with_seed(config: AnimationConfig, seed: u64) -> Self {
        let blink = BlinkController::with_seed(config.blinking.clone(), seed);
        Self::with_blink(config, blink)
    }

    /// Apply tier gating: `Low` devices skip the per-frame torso rescale.
    pub fn for_tier(mut config: AnimationConfig, tier: PerformanceTier, seed: u64) -> Self {
        if tier == PerformanceTier::Low {
            config.breathing.enabled = false;
        }
        Self::with_seed(config, seed)
    }

    fn with_blink(config: AnimationConfig, blink: BlinkController) -> Self {
        Self {
            breathing: BreathingController::new(config.breathing.clone()),
            blink,
            expression: ExpressionController::new(),
            head_nod: HeadNodController::new(),
            config,
        }
    }

    /// Poll every controller once.
    pub fn update(&mut self, now_secs: f64) -> IdlePose {
        IdlePose {
            chest_scale: self.breathing.update(now_secs),
            eyes_closed: self.blink.update(now_secs),
            expression_weight: self.expression.update(now_secs),
            head_nod_angle: self.head_nod.update(now_secs),
        }
    }

    /// Start an expression transition with the configured default duration.
    pub fn set_expression(&mut self, target: f32, now_secs: f64) {
        let duration = self.config.expression.default_duration_secs;
        self.expression.trigger_at(target, duration, now_secs);
    }

    /// Start a nod with the configured defaults.
    pub fn nod(&mut self, now_secs: f64) {
        let nod = &self.config.head_nod;
        self.head_nod
            .trigger_at(nod.duration_secs, nod.max_angle_rad, now_secs);
    }

    pub fn expression_mut(&mut self) -> &mut ExpressionController {
        &mut self.expression
    }

    pub fn head_nod_mut(&mut self) -> &mut HeadNodController {
        &mut self.head_nod
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    /// Drop all timers, e.g. when the avatar model is swapped.
    pub fn reset(&mut self) {
        self.blink.reset();
        self.expression.reset();
        self.head_nod.reset();
    }
}
