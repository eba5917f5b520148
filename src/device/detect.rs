//! Best-effort host hardware probing.
//!
//! Keep this dependency-free: rely on `/proc`, `sysctl` and friends where
//! available, and fall back to neutral defaults everywhere else. Nothing in
//! here returns an error.

use std::process::Command;

use tracing::{debug, warn};

use super::DeviceInfo;

/// Memory assumed when the platform does not report it.
pub const DEFAULT_MEMORY_GB: f32 = 4.0;
/// Core count assumed when the platform does not report it.
pub const DEFAULT_LOGICAL_CORES: u32 = 4;
/// Pixel ratio assumed for headless or unknown displays.
pub const DEFAULT_PIXEL_RATIO: f32 = 1.0;

const ENV_MEMORY_GB: &str = "TALKING_HEAD_MEMORY_GB";
const ENV_CORES: &str = "TALKING_HEAD_CORES";
const ENV_GPU: &str = "TALKING_HEAD_GPU";
const ENV_PIXEL_RATIO: &str = "TALKING_HEAD_PIXEL_RATIO";
const ENV_MOBILE: &str = "TALKING_HEAD_MOBILE";

/// Take a one-off snapshot of the host's capabilities.
///
/// Environment overrides win over detected values so embedding hosts (a
/// browser shell, a mobile wrapper, a test harness) can inject the signals
/// they know better.
pub fn detect_device_info() -> DeviceInfo {
    let memory_gb = env_parse::<f32>(ENV_MEMORY_GB)
        .filter(|gb| gb.is_finite() && *gb > 0.0)
        .or_else(|| {
            detect_total_memory_bytes()
                .map(nominal_memory_gb)
                .filter(|gb| *gb > 0.0)
        })
        .unwrap_or(DEFAULT_MEMORY_GB);

    let logical_cores = env_parse::<u32>(ENV_CORES)
        .filter(|c| *c > 0)
        .or_else(detect_logical_cores)
        .unwrap_or(DEFAULT_LOGICAL_CORES);

    let gpu_renderer = std::env::var(ENV_GPU)
        .ok()
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .or_else(detect_gpu)
        .unwrap_or_default();
    let gpu_vendor = vendor_from_renderer(&gpu_renderer).to_owned();

    let is_mobile = env_parse::<bool>(ENV_MOBILE)
        .unwrap_or(cfg!(any(target_os = "android", target_os = "ios")));

    let device_pixel_ratio = env_parse::<f32>(ENV_PIXEL_RATIO)
        .filter(|r| r.is_finite() && *r > 0.0)
        .unwrap_or(DEFAULT_PIXEL_RATIO);

    let info = DeviceInfo {
        memory_gb,
        logical_cores,
        gpu_vendor,
        gpu_renderer,
        is_mobile,
        is_touch: is_mobile,
        device_pixel_ratio,
        user_agent: format!(
            "{}/{} talking-head/{}",
            std::env::consts::OS,
            std::env::consts::ARCH,
            env!("CARGO_PKG_VERSION")
        ),
    };
    debug!(
        memory_gb = info.memory_gb,
        cores = info.logical_cores,
        gpu = %info.gpu_renderer,
        mobile = info.is_mobile,
        "device info detected"
    );
    info
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable device override");
            None
        }
    }
}

/// Installed memory in whole GB.
///
/// The kernel reports what is left after firmware and GPU carve-outs, so an
/// 8 GB machine shows up as ~7.7 GB. Rounding up restores the nominal size
/// the tier thresholds are written against.
fn nominal_memory_gb(bytes: u64) -> f32 {
    (bytes as f64 / (1024.0 * 1024.0 * 1024.0)).ceil() as f32
}

fn run_cmd(args: &[&str]) -> Option<String> {
    let (program, rest) = args.split_first()?;
    let out = Command::new(program).args(rest).output().ok()?;
    if !out.status.success() {
        return None;
    }
    let s = String::from_utf8(out.stdout).ok()?;
    let trimmed = s.trim().to_owned();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn detect_total_memory_bytes() -> Option<u64> {
    if cfg!(target_os = "macos") {
        let s = run_cmd(&["sysctl", "-n", "hw.memsize"])?;
        return s.parse::<u64>().ok();
    }
    if cfg!(target_os = "linux") {
        let content = std::fs::read_to_string("/proc/meminfo").ok()?;
        return parse_meminfo_total(&content);
    }
    None
}

/// Extract `MemTotal` (kB) from `/proc/meminfo` content, in bytes.
fn parse_meminfo_total(content: &str) -> Option<u64> {
    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("MemTotal:") {
            let parts = rest.split_whitespace().collect::<Vec<_>>();
            if !parts.is_empty()
                && let Ok(kb) = parts[0].parse::<u64>()
            {
                return Some(kb.saturating_mul(1024));
            }
        }
    }
    None
}

fn detect_logical_cores() -> Option<u32> {
    std::thread::available_parallelism()
        .ok()
        .and_then(|n| u32::try_from(n.get()).ok())
        .or_else(|| {
            if cfg!(target_os = "linux") {
                let content = std::fs::read_to_string("/proc/cpuinfo").ok()?;
                parse_cpuinfo_processors(&content)
            } else {
                None
            }
        })
}

/// Count `processor` entries in `/proc/cpuinfo` content.
fn parse_cpuinfo_processors(content: &str) -> Option<u32> {
    let count = content
        .lines()
        .filter(|line| {
            line.split(':')
                .next()
                .is_some_and(|key| key.trim() == "processor")
        })
        .count();
    u32::try_from(count).ok().filter(|n| *n > 0)
}

fn detect_gpu() -> Option<String> {
    if cfg!(target_os = "macos") {
        return run_cmd(&["system_profiler", "SPDisplaysDataType"])
            .and_then(|s| parse_chipset_model(&s));
    }
    if cfg!(target_os = "linux") {
        if let Ok(version) = std::fs::read_to_string("/proc/driver/nvidia/version") {
            return version
                .lines()
                .next()
                .map(|l| format!("NVIDIA {}", l.trim()));
        }
    }
    None
}

/// Pull the `Chipset Model:` line out of `system_profiler` output.
fn parse_chipset_model(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        line.trim()
            .strip_prefix("Chipset Model:")
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
    })
}

/// Coarse vendor name from a renderer string.
pub(crate) fn vendor_from_renderer(renderer: &str) -> &'static str {
    let r = renderer.to_lowercase();
    if r.contains("nvidia") || r.contains("geforce") || r.contains("rtx") {
        "nvidia"
    } else if r.contains("amd") || r.contains("radeon") {
        "amd"
    } else if r.contains("apple") {
        "apple"
    } else if r.contains("intel") {
        "intel"
    } else if r.contains("mali") || r.contains("arm") {
        "arm"
    } else if r.contains("adreno") || r.contains("qualcomm") {
        "qualcomm"
    } else if r.is_empty() {
        ""
    } else {
        "unknown"
    }
}
