//! Rule-based performance tier classification.
//!
//! The classifier is deliberately conservative: anything that looks weak or
//! software-rendered is `Low`, only clearly capable hardware is `High`, and
//! everything in between (including unrecognised GPUs) lands on `Medium`.
//!
//! # Examples
//!
//! ```
//! use talking_head::device::{DeviceInfo, PerformanceTier, calculate_performance_tier};
//!
//! let info = DeviceInfo {
//!     memory_gb: 16.0,
//!     logical_cores: 16,
//!     gpu_renderer: "NVIDIA GeForce RTX 4080".into(),
//!     ..DeviceInfo::default()
//! };
//! assert_eq!(calculate_performance_tier(Some(&info)), PerformanceTier::High);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use super::DeviceInfo;

// ---------------------------------------------------------------------------
// PerformanceTier enum
// ---------------------------------------------------------------------------

/// Coarse performance class used to gate rendering and animation cost.
///
/// Variants are ordered from least to most capable, so derived `Ord` lets
/// callers write `tier >= PerformanceTier::Medium`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceTier {
    /// Weak, mobile-class or software-rendered hardware.
    Low,
    /// The safe middle ground.
    #[default]
    Medium,
    /// Plenty of memory, cores and a capable GPU.
    High,
}

impl fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// GPU pattern tables
// ---------------------------------------------------------------------------

/// Memory below this (GB) is always `Low`.
pub const LOW_MEMORY_GB: f32 = 4.0;
/// Cores below this are always `Low`.
pub const LOW_CORES: u32 = 4;
/// Memory required (GB) for `High`.
pub const HIGH_MEMORY_GB: f32 = 8.0;
/// Cores required for `High`.
pub const HIGH_CORES: u32 = 8;

/// Renderer substrings that indicate a software rasterizer or a weak
/// integrated/mobile GPU. Matched case-insensitively.
static LOW_END_GPU_PATTERNS: &[&str] = &[
    "swiftshader",
    "llvmpipe",
    "softpipe",
    "software",
    "microsoft basic render",
    "mali-4",
    "mali-t",
    "adreno 3",
    "adreno 4",
    "powervr sgx",
    "intel hd graphics 3000",
    "intel hd graphics 4000",
    "intel(r) hd graphics",
];

/// Renderer substrings for discrete and Apple-silicon GPUs.
static HIGH_END_GPU_PATTERNS: &[&str] = &[
    "nvidia",
    "geforce",
    "rtx",
    "radeon rx",
    "amd radeon pro",
    "apple m",
    "apple gpu",
];

fn matches_any(renderer: &str, patterns: &[&str]) -> bool {
    let renderer = renderer.trim().to_lowercase();
    if renderer.is_empty() {
        return false;
    }
    patterns.iter().any(|p| renderer.contains(p))
}

/// Whether the renderer string is on the low-end denylist.
#[must_use]
pub fn is_low_end_gpu(renderer: &str) -> bool {
    matches_any(renderer, LOW_END_GPU_PATTERNS)
}

/// Whether the renderer string is on the discrete/Apple-silicon allowlist.
#[must_use]
pub fn is_high_end_gpu(renderer: &str) -> bool {
    matches_any(renderer, HIGH_END_GPU_PATTERNS)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Classify a device snapshot into a [`PerformanceTier`].
///
/// Passing `None` detects the current host via
/// [`detect_device_info`](super::detect_device_info).
#[must_use]
pub fn calculate_performance_tier(info: Option<&DeviceInfo>) -> PerformanceTier {
    match info {
        Some(info) => classify(info),
        None => classify(&super::detect_device_info()),
    }
}

fn classify(info: &DeviceInfo) -> PerformanceTier {
    if info.memory_gb < LOW_MEMORY_GB
        || info.logical_cores < LOW_CORES
        || is_low_end_gpu(&info.gpu_renderer)
    {
        return PerformanceTier::Low;
    }

    if info.memory_gb >= HIGH_MEMORY_GB
        && info.logical_cores >= HIGH_CORES
        && (is_high_end_gpu(&info.gpu_renderer) || !info.is_mobile)
    {
        return PerformanceTier::High;
    }

    PerformanceTier::Medium
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn device(memory_gb: f32, logical_cores: u32, gpu: &str, is_mobile: bool) -> DeviceInfo {
        DeviceInfo {
            memory_gb,
            logical_cores,
            gpu_renderer: gpu.to_owned(),
            is_mobile,
            ..DeviceInfo::default()
        }
    }

    // ── PerformanceTier enum ──────────────────────────────────

    #[test]
    fn test_tier_ordering() {
        assert!(PerformanceTier::Low < PerformanceTier::Medium);
        assert!(PerformanceTier::Medium < PerformanceTier::High);
    }

    #[test]
    fn test_tier_display() {
        assert_eq!(PerformanceTier::Low.to_string(), "low");
        assert_eq!(PerformanceTier::Medium.to_string(), "medium");
        assert_eq!(PerformanceTier::High.to_string(), "high");
    }

    #[test]
    fn test_tier_serializes_lowercase() {
        let json = serde_json::to_string(&PerformanceTier::High).unwrap();
        assert_eq!(json, "\"high\"");
        let parsed: PerformanceTier = serde_json::from_str("\"low\"").unwrap();
        assert_eq!(parsed, PerformanceTier::Low);
    }

    // ── Pattern matching ──────────────────────────────────────

    #[test]
    fn test_low_end_patterns_case_insensitive() {
        assert!(is_low_end_gpu("Google SwiftShader"));
        assert!(is_low_end_gpu("llvmpipe (LLVM 15.0.7, 256 bits)"));
        assert!(is_low_end_gpu("Mali-T880"));
        assert!(is_low_end_gpu("Intel(R) HD Graphics 520"));
        assert!(!is_low_end_gpu("NVIDIA GeForce RTX 3060"));
        assert!(!is_low_end_gpu(""));
    }

    #[test]
    fn test_high_end_patterns() {
        assert!(is_high_end_gpu("NVIDIA RTX"));
        assert!(is_high_end_gpu("Apple M2 Max"));
        assert!(is_high_end_gpu("AMD Radeon RX 6800"));
        assert!(!is_high_end_gpu("Mali-G78"));
        assert!(!is_high_end_gpu(""));
    }

    // ── classification ────────────────────────────────────────

    #[test]
    fn test_weak_device_is_low() {
        let info = device(2.0, 2, "", false);
        assert_eq!(calculate_performance_tier(Some(&info)), PerformanceTier::Low);
    }

    #[test]
    fn test_low_memory_alone_is_low() {
        let info = device(3.5, 16, "NVIDIA GeForce RTX 4090", false);
        assert_eq!(calculate_performance_tier(Some(&info)), PerformanceTier::Low);
    }

    #[test]
    fn test_software_renderer_is_low_even_on_big_machine() {
        let info = device(64.0, 32, "Google SwiftShader", false);
        assert_eq!(calculate_performance_tier(Some(&info)), PerformanceTier::Low);
    }

    #[test]
    fn test_discrete_desktop_is_high() {
        let info = device(16.0, 16, "NVIDIA RTX", false);
        assert_eq!(calculate_performance_tier(Some(&info)), PerformanceTier::High);
    }

    #[test]
    fn test_mid_device_is_medium() {
        let info = device(6.0, 6, "", false);
        assert_eq!(
            calculate_performance_tier(Some(&info)),
            PerformanceTier::Medium
        );
    }

    #[test]
    fn test_unknown_gpu_on_mobile_is_medium() {
        let info = device(8.0, 8, "Mali-G710", true);
        assert_eq!(
            calculate_performance_tier(Some(&info)),
            PerformanceTier::Medium
        );
    }

    #[test]
    fn test_apple_silicon_mobile_is_high() {
        let info = device(8.0, 8, "Apple GPU", true);
        assert_eq!(calculate_performance_tier(Some(&info)), PerformanceTier::High);
    }

    #[test]
    fn test_unknown_gpu_on_desktop_is_high() {
        let info = device(8.0, 8, "Mystery Accelerator", false);
        assert_eq!(calculate_performance_tier(Some(&info)), PerformanceTier::High);
    }

    #[test]
    fn test_defaults_classify_as_medium() {
        assert_eq!(
            calculate_performance_tier(Some(&DeviceInfo::default())),
            PerformanceTier::Medium
        );
    }

    #[test]
    fn test_detected_device_classifies_without_panicking() {
        let tier = calculate_performance_tier(None);
        assert!(tier >= PerformanceTier::Low && tier <= PerformanceTier::High);
    }
}
