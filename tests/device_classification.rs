//! Integration tests for device classification and render budgets.

use talking_head::device::performance::max_pixel_ratio;
use talking_head::device::{calculate_performance_tier, performance_config};
use talking_head::{DeviceInfo, DeviceProfile, PerformanceConfig, PerformanceTier};

fn device(memory_gb: f32, logical_cores: u32, gpu: &str, is_mobile: bool) -> DeviceInfo {
    DeviceInfo {
        memory_gb,
        logical_cores,
        gpu_renderer: gpu.to_owned(),
        is_mobile,
        ..DeviceInfo::default()
    }
}

#[test]
fn classifier_examples() {
    let cases = [
        (device(2.0, 8, "", false), PerformanceTier::Low),
        (device(16.0, 8, "NVIDIA GeForce RTX 3080", false), PerformanceTier::High),
        (device(8.0, 8, "Mali-T880", true), PerformanceTier::Low),
        (device(6.0, 6, "", false), PerformanceTier::Medium),
        (device(16.0, 16, "Google SwiftShader", false), PerformanceTier::Low),
    ];
    for (info, expected) in cases {
        assert_eq!(
            calculate_performance_tier(Some(&info)),
            expected,
            "{info:?}"
        );
    }
}

#[test]
fn budgets_never_shrink_with_tier() {
    let tiers = [
        PerformanceTier::Low,
        PerformanceTier::Medium,
        PerformanceTier::High,
    ];
    let configs: Vec<PerformanceConfig> = tiers
        .iter()
        .map(|t| PerformanceConfig::for_tier(*t, 3.0))
        .collect();
    for pair in configs.windows(2) {
        assert!(pair[0].shadow_map_size <= pair[1].shadow_map_size);
        assert!(pair[0].max_lights <= pair[1].max_lights);
        assert!(pair[0].pixel_ratio <= pair[1].pixel_ratio);
    }
}

#[test]
fn pixel_ratio_is_always_within_tier_cap() {
    for tier in [
        PerformanceTier::Low,
        PerformanceTier::Medium,
        PerformanceTier::High,
    ] {
        for physical in [0.5, 1.0, 1.25, 2.0, 3.0, f32::NAN] {
            let config = PerformanceConfig::for_tier(tier, physical);
            assert!(config.pixel_ratio >= 1.0);
            assert!(config.pixel_ratio <= max_pixel_ratio(tier));
        }
    }
}

#[test]
fn explicit_tier_and_ratio_skip_detection_inputs() {
    let config = performance_config(Some(PerformanceTier::Low), Some(3.0));
    assert_eq!(config.tier, PerformanceTier::Low);
    assert!((config.pixel_ratio - 1.5).abs() < f32::EPSILON);
    assert!(!config.shadows_enabled);
}

#[test]
fn profile_serializes_for_the_renderer() {
    let profile = DeviceProfile::from_info(device(32.0, 12, "Apple M2 Max", false), None);
    let json = serde_json::to_value(&profile).expect("serialize");
    assert_eq!(json["tier"], "high");
    assert_eq!(json["config"]["shadow_map_size"], 2048);
    assert_eq!(json["config"]["ambient_occlusion_enabled"], true);
}
