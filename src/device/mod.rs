//! Device capability classification.
//!
//! Runs once per session: [`DeviceProfile::detect`] snapshots the host,
//! classifies it into a [`PerformanceTier`] and derives the matching
//! [`PerformanceConfig`]. Downstream code reads the cached profile instead
//! of re-probing every frame.

pub mod detect;
pub mod performance;
pub mod tier;

use serde::{Deserialize, Serialize};
use tracing::info;

pub use detect::detect_device_info;
pub use performance::{PerformanceConfig, performance_config};
pub use tier::{PerformanceTier, calculate_performance_tier};

/// Read-only snapshot of the host's hardware signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Total system memory in GB.
    pub memory_gb: f32,
    /// Logical CPU cores.
    pub logical_cores: u32,
    /// Coarse GPU vendor (`nvidia`, `apple`, ...), empty when unknown.
    pub gpu_vendor: String,
    /// Full GPU renderer string, empty when unknown.
    pub gpu_renderer: String,
    /// Phone/tablet class device.
    pub is_mobile: bool,
    /// Primary input is touch.
    pub is_touch: bool,
    /// Physical-to-logical pixel ratio of the display.
    pub device_pixel_ratio: f32,
    /// Host identification string.
    pub user_agent: String,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            memory_gb: detect::DEFAULT_MEMORY_GB,
            logical_cores: detect::DEFAULT_LOGICAL_CORES,
            gpu_vendor: String::new(),
            gpu_renderer: String::new(),
            is_mobile: false,
            is_touch: false,
            device_pixel_ratio: detect::DEFAULT_PIXEL_RATIO,
            user_agent: String::new(),
        }
    }
}

/// Session-scoped classification result.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceProfile {
    /// The snapshot the tier was computed from.
    pub info: DeviceInfo,
    /// Derived tier.
    pub tier: PerformanceTier,
    /// Render budgets for the tier.
    pub config: PerformanceConfig,
}

impl DeviceProfile {
    /// Detect the host and classify it.
    pub fn detect(pixel_ratio_override: Option<f32>) -> Self {
        Self::from_info(detect_device_info(), pixel_ratio_override)
    }

    /// Classify an already-captured snapshot.
    pub fn from_info(info: DeviceInfo, pixel_ratio_override: Option<f32>) -> Self {
        let tier = calculate_performance_tier(Some(&info));
        let mut config = PerformanceConfig::for_tier(tier, info.device_pixel_ratio);
        if let Some(requested) = pixel_ratio_override {
            config = config.with_pixel_ratio_override(requested);
        }
        info!(
            %tier,
            memory_gb = info.memory_gb,
            cores = info.logical_cores,
            pixel_ratio = config.pixel_ratio,
            "device profile classified"
        );
        Self { info, tier, config }
    }
}
