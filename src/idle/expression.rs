//! Eased target/current expression interpolator.

use super::easing::{ease_in_out_cubic, lerp};

/// Default transition length in seconds.
pub const DEFAULT_DURATION_SECS: f32 = 0.5;

/// Drives one expression weight (smile, brow raise, mouth-open, ...) toward a
/// target with a cubic ease-in-out.
///
/// Re-triggering mid-transition starts from the value last returned by
/// [`update`](Self::update), so there is never a visible snap.
#[derive(Debug, Clone, Default)]
pub struct ExpressionController {
    target_value: f64,
    current_value: f64,
    start_value: f64,
    duration_secs: f64,
    /// `None` when triggered without a clock; bound by the next update.
    start_time: Option<f64>,
    is_animating: bool,
}

impl ExpressionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a transition to `target`; the start time is taken from the next
    /// [`update`](Self::update).
    pub fn trigger(&mut self, target: f32, duration_secs: f32) {
        self.arm(target, duration_secs, None);
    }

    /// Arm a transition to `target` starting at `now_secs`.
    pub fn trigger_at(&mut self, target: f32, duration_secs: f32, now_secs: f64) {
        self.arm(target, duration_secs, Some(now_secs));
    }

    fn arm(&mut self, target: f32, duration_secs: f32, start: Option<f64>) {
        let target = if target.is_nan() { 0.0 } else { target };
        self.target_value = f64::from(target.clamp(0.0, 1.0));
        self.start_value = self.current_value;
        self.duration_secs = f64::from(duration_secs);
        self.start_time = start;
        self.is_animating = true;
    }

    /// Advance to `now_secs` and return the current weight.
    pub fn update(&mut self, now_secs: f64) -> f32 {
        if !self.is_animating {
            return self.current_value as f32;
        }

        let start = *self.start_time.get_or_insert(now_secs);
        let progress = if self.duration_secs > 0.0 {
            ((now_secs - start) / self.duration_secs).clamp(0.0, 1.0)
        } else {
            1.0
        };

        if progress >= 1.0 {
            self.current_value = self.target_value;
            self.is_animating = false;
        } else {
            self.current_value = lerp(
                self.start_value,
                self.target_value,
                ease_in_out_cubic(progress),
            );
        }
        self.current_value as f32
    }

    /// Last computed weight, without advancing.
    pub fn current(&self) -> f32 {
        self.current_value as f32
    }

    pub fn target(&self) -> f32 {
        self.target_value as f32
    }

    pub fn is_animating(&self) -> bool {
        self.is_animating
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
