//! Randomized-interval blink state machine.
//!
//! `Open → Blinking → Open`, forever. The gap between blinks is redrawn
//! uniformly from `[min_interval, max_interval]` every cycle, which is what
//! keeps the cadence from looking mechanical. The random source is a seeded
//! [`StdRng`]; [`BlinkController::reset`] reseeds it, so a reset controller
//! replays exactly what a freshly built one would.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::easing::ease_in_out_cubic;
use crate::config::BlinkingConfig;

/// Blink controller. One per avatar.
#[derive(Debug, Clone)]
pub struct BlinkController {
    config: BlinkingConfig,
    seed: u64,
    rng: StdRng,
    /// `None` until the first update anchors the cadence to the caller's clock.
    last_blink_time: Option<f64>,
    next_blink_delay: f64,
    is_blinking: bool,
    blink_start_time: f64,
}

impl BlinkController {
    /// Controller with an entropy-drawn seed.
    pub fn new(config: BlinkingConfig) -> Self {
        Self::with_seed(config, rand::random::<u64>())
    }

    /// Controller with a fixed seed, for reproducible cadence.
    pub fn with_seed(config: BlinkingConfig, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let next_blink_delay = draw_delay(&config, &mut rng);
        Self {
            config,
            seed,
            rng,
            last_blink_time: None,
            next_blink_delay,
            is_blinking: false,
            blink_start_time: 0.0,
        }
    }

    /// Advance to `now_secs` and return the `eyes_closed` weight in `[0, 1]`.
    ///
    /// Only deltas are compared, so any monotonically non-decreasing clock
    /// works.
    pub fn update(&mut self, now_secs: f64) -> f32 {
        if !self.config.enabled {
            return 0.0;
        }

        let last = *self.last_blink_time.get_or_insert(now_secs);
        if !self.is_blinking && now_secs - last >= self.next_blink_delay {
            self.is_blinking = true;
            self.blink_start_time = now_secs;
            self.last_blink_time = Some(now_secs);
            self.next_blink_delay = draw_delay(&self.config, &mut self.rng);
        }

        if !self.is_blinking {
            return 0.0;
        }

        let duration = finite_secs(
            self.config.duration_secs,
            BlinkingConfig::default().duration_secs,
        );
        let progress = if duration > 0.0 {
            ((now_secs - self.blink_start_time) / duration).max(0.0)
        } else {
            1.0
        };

        if progress >= 1.0 {
            self.is_blinking = false;
            return 0.0;
        }

        let closed = if progress < 0.5 {
            ease_in_out_cubic(progress * 2.0)
        } else {
            ease_in_out_cubic((1.0 - progress) * 2.0)
        };
        closed as f32
    }

    /// Whether a blink is in progress.
    pub fn is_blinking(&self) -> bool {
        self.is_blinking
    }

    /// Seconds until the next blink may start, measured from the last one.
    pub fn next_blink_delay(&self) -> f64 {
        self.next_blink_delay
    }

    /// Return to the freshly constructed state (same seed).
    pub fn reset(&mut self) {
        *self = Self::with_seed(self.config.clone(), self.seed);
    }
}

/// Config value in seconds, or `fallback` when it is not a finite number.
fn finite_secs(value: f32, fallback: f32) -> f64 {
    f64::from(if value.is_finite() { value } else { fallback })
}

fn draw_delay(config: &BlinkingConfig, rng: &mut StdRng) -> f64 {
    let defaults = BlinkingConfig::default();
    let a = finite_secs(config.min_interval_secs, defaults.min_interval_secs).max(0.0);
    let b = finite_secs(config.max_interval_secs, defaults.max_interval_secs).max(0.0);
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if hi - lo <= f64::EPSILON {
        lo
    } else {
        rng.gen_range(lo..=hi)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    const FRAME: f64 = 1.0 / 60.0;

    /// Poll at 60 fps for `secs` and return every sample.
    fn simulate(controller: &mut BlinkController, secs: f64) -> Vec<f32> {
        let frames = (secs / FRAME) as usize;
        (0..frames)
            .map(|i| controller.update(i as f64 * FRAME))
            .collect()
    }

    /// Count blinks as rising edges out of zero.
    fn count_blinks(trace: &[f32]) -> usize {
        trace
            .windows(2)
            .filter(|w| w[0] == 0.0 && w[1] > 0.0)
            .count()
    }

    #[test]
    fn starts_open() {
        let mut c = BlinkController::with_seed(BlinkingConfig::default(), 7);
        assert_eq!(c.update(0.0), 0.0);
        assert_eq!(c.update(1.0), 0.0);
        assert!(!c.is_blinking());
    }

    #[test]
    fn delay_is_drawn_from_interval() {
        for seed in 0..50 {
            let c = BlinkController::with_seed(BlinkingConfig::default(), seed);
            assert!((2.0..=5.0).contains(&c.next_blink_delay()));
        }
    }

    #[test]
    fn blink_closes_then_reopens() {
        let config = BlinkingConfig {
            min_interval_secs: 1.0,
            max_interval_secs: 1.0,
            ..BlinkingConfig::default()
        };
        let mut c = BlinkController::with_seed(config, 1);
        assert_eq!(c.update(0.0), 0.0);

        // Fires exactly at the delay; progress 0 is fully open.
        assert_eq!(c.update(1.0), 0.0);
        assert!(c.is_blinking());

        let closing = c.update(1.0375);
        assert!(closing > 0.0 && closing < 1.0);

        let mid = c.update(1.075);
        assert!((mid - 1.0).abs() < 1e-4, "mid-blink should be fully closed, got {mid}");

        assert_eq!(c.update(1.2), 0.0);
        assert!(!c.is_blinking());
    }

    #[test]
    fn non_finite_config_falls_back_to_defaults() {
        let config: crate::config::AnimationConfig = toml::from_str(
            "[blinking]\nmin_interval_secs = nan\nmax_interval_secs = inf\nduration_secs = inf\n",
        )
        .unwrap();
        let mut c = BlinkController::with_seed(config.blinking, 3);
        assert!((2.0..=5.0).contains(&c.next_blink_delay()));

        let trace = simulate(&mut c, 30.0);
        assert!(count_blinks(&trace) > 0);
        assert!(trace.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn cadence_matches_average_interval() {
        let mut c = BlinkController::with_seed(BlinkingConfig::default(), 42);
        let window = 600.0;
        let trace = simulate(&mut c, window);
        let blinks = count_blinks(&trace) as f64;
        let expected = window / 3.5;
        assert!(
            (blinks - expected).abs() / expected < 0.2,
            "expected ~{expected} blinks, got {blinks}"
        );
    }

    #[test]
    fn blinks_never_overlap() {
        let mut c = BlinkController::with_seed(BlinkingConfig::default(), 9);
        let trace = simulate(&mut c, 120.0);
        // Every closed stretch is shorter than one blink plus a frame, so it
        // must have returned to exactly zero before the next one.
        let max_run = (0.15 / FRAME).ceil() as usize + 1;
        let mut run = 0;
        for v in &trace {
            assert!((0.0..=1.0).contains(v));
            if *v > 0.0 {
                run += 1;
                assert!(run <= max_run, "blink ran for {run} frames");
            } else {
                run = 0;
            }
        }
        assert!(count_blinks(&trace) > 10);
    }

    #[test]
    fn same_seed_same_trace() {
        let mut a = BlinkController::with_seed(BlinkingConfig::default(), 1234);
        let mut b = BlinkController::with_seed(BlinkingConfig::default(), 1234);
        assert_eq!(simulate(&mut a, 30.0), simulate(&mut b, 30.0));
    }

    #[test]
    fn reset_matches_fresh_controller() {
        let mut used = BlinkController::with_seed(BlinkingConfig::default(), 77);
        let _ = simulate(&mut used, 20.0);
        used.reset();

        let mut fresh = BlinkController::with_seed(BlinkingConfig::default(), 77);
        for t in [0.0, 2.5, 3.0, 4.2, 5.01, 6.0] {
            assert_eq!(used.update(t), fresh.update(t), "t={t}");
        }
    }

    #[test]
    fn repeated_time_is_stable() {
        let mut c = BlinkController::with_seed(BlinkingConfig::default(), 3);
        let _ = c.update(0.0);
        let a = c.update(0.5);
        let b = c.update(0.5);
        assert_eq!(a, b);
    }

    #[test]
    fn disabled_never_blinks() {
        let config = BlinkingConfig {
            enabled: false,
            ..BlinkingConfig::default()
        };
        let mut c = BlinkController::with_seed(config, 5);
        assert!(simulate(&mut c, 30.0).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn inverted_interval_is_tolerated() {
        let config = BlinkingConfig {
            min_interval_secs: 5.0,
            max_interval_secs: 2.0,
            ..BlinkingConfig::default()
        };
        let c = BlinkController::with_seed(config, 11);
        assert!((2.0..=5.0).contains(&c.next_blink_delay()));
    }
}
