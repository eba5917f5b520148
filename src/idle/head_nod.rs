//! Triggered one-shot head nod.

use std::f64::consts::PI;

/// Default nod length in seconds.
pub const DEFAULT_DURATION_SECS: f32 = 1.0;
/// Default peak pitch in radians.
pub const DEFAULT_MAX_ANGLE_RAD: f32 = 0.3;

/// A single down-and-back nod: `sin(progress · π) · max_angle`.
///
/// Triggering while a nod is running restarts it; nods are never queued.
#[derive(Debug, Clone, Default)]
pub struct HeadNodController {
    is_nodding: bool,
    nod_start_time: Option<f64>,
    nod_duration_secs: f64,
    max_angle_rad: f64,
}

impl HeadNodController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a nod at the next update.
    pub fn trigger(&mut self, duration_secs: f32, max_angle_rad: f32) {
        self.arm(duration_secs, max_angle_rad, None);
    }

    /// Begin a nod at `now_secs`.
    pub fn trigger_at(&mut self, duration_secs: f32, max_angle_rad: f32, now_secs: f64) {
        self.arm(duration_secs, max_angle_rad, Some(now_secs));
    }

    fn arm(&mut self, duration_secs: f32, max_angle_rad: f32, start: Option<f64>) {
        self.is_nodding = true;
        self.nod_start_time = start;
        self.nod_duration_secs = f64::from(duration_secs);
        self.max_angle_rad = f64::from(max_angle_rad);
    }

    /// Pitch angle in radians for `now_secs`; `0.0` when idle.
    pub fn update(&mut self, now_secs: f64) -> f32 {
        if !self.is_nodding {
            return 0.0;
        }
        let start = *self.nod_start_time.get_or_insert(now_secs);
        if self.nod_duration_secs <= 0.0 {
            self.is_nodding = false;
            return 0.0;
        }

        let progress = (now_secs - start) / self.nod_duration_secs;
        if progress >= 1.0 {
            self.is_nodding = false;
            return 0.0;
        }
        if progress <= 0.0 {
            return 0.0;
        }
        ((progress * PI).sin() * self.max_angle_rad) as f32
    }

    pub fn is_nodding(&self) -> bool {
        self.is_nodding
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
