//! Per-tier render quality budgets.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::tier::PerformanceTier;

/// Pixel ratio ceiling for [`PerformanceTier::High`].
pub const HIGH_TIER_MAX_PIXEL_RATIO: f32 = 2.0;
/// Pixel ratio ceiling for every other tier.
pub const DEFAULT_MAX_PIXEL_RATIO: f32 = 1.5;

/// Render surface settings handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Tier these settings were derived from.
    pub tier: PerformanceTier,
    /// Whether shadow casting is enabled.
    pub shadows_enabled: bool,
    /// Shadow map edge length in texels.
    pub shadow_map_size: u32,
    /// Whether MSAA/antialiasing is requested.
    pub antialias_enabled: bool,
    /// Effective device pixel ratio after clamping.
    pub pixel_ratio: f32,
    /// Maximum number of dynamic lights.
    pub max_lights: u32,
    /// Whether screen-space ambient occlusion is enabled.
    pub ambient_occlusion_enabled: bool,
}

impl PerformanceConfig {
    /// Quality constants for `tier` with the pixel ratio clamped to the tier cap.
    ///
    /// `pixel_ratio` is the physical device ratio; it is clamped to
    /// `[1.0, cap]`. Non-finite or non-positive values fall back to 1.0.
    #[must_use]
    pub fn for_tier(tier: PerformanceTier, pixel_ratio: f32) -> Self {
        let physical = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            pixel_ratio
        } else {
            1.0
        };
        let mut config = Self::base(tier);
        config.pixel_ratio = physical.clamp(1.0, max_pixel_ratio(tier));
        config
    }

    /// Apply an explicit pixel ratio request, still bounded by the tier cap.
    ///
    /// Requests below 1.0 are honoured (callers may deliberately render at
    /// reduced resolution); invalid requests are ignored.
    #[must_use]
    pub fn with_pixel_ratio_override(mut self, requested: f32) -> Self {
        if requested.is_finite() && requested > 0.0 {
            self.pixel_ratio = requested.min(max_pixel_ratio(self.tier));
        }
        self
    }

    fn base(tier: PerformanceTier) -> Self {
        match tier {
            PerformanceTier::Low => Self {
                tier,
                shadows_enabled: false,
                shadow_map_size: 512,
                antialias_enabled: false,
                pixel_ratio: 1.0,
                max_lights: 2,
                ambient_occlusion_enabled: false,
            },
            PerformanceTier::Medium => Self {
                tier,
                shadows_enabled: true,
                shadow_map_size: 1024,
                antialias_enabled: true,
                pixel_ratio: 1.0,
                max_lights: 4,
                ambient_occlusion_enabled: false,
            },
            PerformanceTier::High => Self {
                tier,
                shadows_enabled: true,
                shadow_map_size: 2048,
                antialias_enabled: true,
                pixel_ratio: 1.0,
                max_lights: 8,
                ambient_occlusion_enabled: true,
            },
        }
    }
}

/// Pixel ratio ceiling for a tier.
#[must_use]
pub fn max_pixel_ratio(tier: PerformanceTier) -> f32 {
    match tier {
        PerformanceTier::High => HIGH_TIER_MAX_PIXEL_RATIO,
        PerformanceTier::Low | PerformanceTier::Medium => DEFAULT_MAX_PIXEL_RATIO,
    }
}

/// Build the render config for `tier` (detected when `None`).
///
/// The device is detected at most once per call, and only when either the tier
/// or the pixel ratio has to come from the host.
#[must_use]
pub fn performance_config(
    tier: Option<PerformanceTier>,
    pixel_ratio_override: Option<f32>,
) -> PerformanceConfig {
    let needs_detect = tier.is_none() || pixel_ratio_override.is_none();
    let info = needs_detect.then(super::detect_device_info);

    let tier = tier.unwrap_or_else(|| super::calculate_performance_tier(info.as_ref()));
    let physical = info
        .as_ref()
        .map_or(super::detect::DEFAULT_PIXEL_RATIO, |i| i.device_pixel_ratio);

    let mut config = PerformanceConfig::for_tier(tier, physical);
    if let Some(requested) = pixel_ratio_override {
        config = config.with_pixel_ratio_override(requested);
    }
    debug!(%tier, pixel_ratio = config.pixel_ratio, "performance config resolved");
    config
}
