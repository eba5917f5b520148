//! Continuous chest/torso breathing oscillator.

use std::f64::consts::TAU;

use crate::config::BreathingConfig;

/// Default seconds per breath.
pub const DEFAULT_PERIOD_SECS: f32 = 4.0;
/// Default peak deviation from a 1.0 scale.
pub const DEFAULT_AMPLITUDE: f32 = 0.03;

/// Uniform scale multiplier at `time_secs`: `1 + sin(2πt / period) · amplitude`.
///
/// Pure and restartable; a non-positive or non-finite period yields `1.0`.
#[must_use]
pub fn breathing_scale(time_secs: f64, period_secs: f32, amplitude: f32) -> f32 {
    if !(period_secs.is_finite() && period_secs > 0.0) || !time_secs.is_finite() {
        return 1.0;
    }
    let phase = TAU * time_secs / f64::from(period_secs);
    (1.0 + phase.sin() * f64::from(amplitude)) as f32
}

/// Config-bound wrapper around [`breathing_scale`].
#[derive(Debug, Clone, Default)]
pub struct BreathingController {
    config: BreathingConfig,
}

impl BreathingController {
    pub fn new(config: BreathingConfig) -> Self {
        Self { config }
    }

    /// Scale for this frame; `1.0` when disabled.
    pub fn update(&self, now_secs: f64) -> f32 {
        if !self.config.enabled {
            return 1.0;
        }
        breathing_scale(now_secs, self.config.period_secs, self.config.amplitude)
    }

    pub fn config(&self) -> &BreathingConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_within_amplitude_band() {
        for i in 0..2_000 {
            let t = f64::from(i) * 0.013;
            let s = breathing_scale(t, DEFAULT_PERIOD_SECS, DEFAULT_AMPLITUDE);
            assert!(s >= 1.0 - DEFAULT_AMPLITUDE - 1e-6, "t={t} s={s}");
            assert!(s <= 1.0 + DEFAULT_AMPLITUDE + 1e-6, "t={t} s={s}");
        }
    }

    #[test]
    fn is_periodic() {
        for i in 0..200 {
            let t = f64::from(i) * 0.037;
            let a = breathing_scale(t, 4.0, 0.03);
            let b = breathing_scale(t + 4.0, 4.0, 0.03);
            assert!((a - b).abs() < 1e-6, "t={t}");
        }
    }

    #[test]
    fn peaks_at_quarter_period() {
        let s = breathing_scale(1.0, 4.0, 0.03);
        assert!((s - 1.03).abs() < 1e-6);
        let s = breathing_scale(3.0, 4.0, 0.03);
        assert!((s - 0.97).abs() < 1e-6);
        assert!((breathing_scale(0.0, 4.0, 0.03) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn degenerate_period_is_neutral() {
        assert_eq!(breathing_scale(1.3, 0.0, 0.03), 1.0);
        assert_eq!(breathing_scale(1.3, -2.0, 0.03), 1.0);
        assert_eq!(breathing_scale(f64::NAN, 4.0, 0.03), 1.0);
    }

    #[test]
    fn disabled_controller_is_neutral() {
        let controller = BreathingController::new(BreathingConfig {
            enabled: false,
            ..BreathingConfig::default()
        });
        assert_eq!(controller.update(1.0), 1.0);
    }
}
