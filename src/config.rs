//! Configuration types for avatar animation.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::viseme::VisemeScheme;

/// Top-level configuration for one avatar.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    /// Idle animation settings.
    pub animation: AnimationConfig,
    /// Lip-sync settings.
    pub lip_sync: LipSyncConfig,
    /// Render surface settings.
    pub render: RenderConfig,
}

/// Idle animation settings, supplied once per avatar.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Chest/torso breathing oscillator.
    pub breathing: BreathingConfig,
    /// Randomized blinking.
    pub blinking: BlinkingConfig,
    /// Expression interpolator defaults.
    pub expression: ExpressionConfig,
    /// Head-nod one-shot defaults.
    pub head_nod: HeadNodConfig,
}

/// Breathing oscillator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreathingConfig {
    /// Whether breathing is applied.
    pub enabled: bool,
    /// Seconds per full breath cycle.
    pub period_secs: f32,
    /// Peak scale deviation from 1.0.
    pub amplitude: f32,
}

impl Default for BreathingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            period_secs: 4.0,
            amplitude: 0.03,
        }
    }
}

/// Blink state machine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkingConfig {
    /// Whether blinking is applied.
    pub enabled: bool,
    /// Shortest gap between blinks, in seconds.
    pub min_interval_secs: f32,
    /// Longest gap between blinks, in seconds.
    pub max_interval_secs: f32,
    /// Length of one close-and-open blink, in seconds.
    pub duration_secs: f32,
}

impl Default for BlinkingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_interval_secs: 2.0,
            max_interval_secs: 5.0,
            duration_secs: 0.15,
        }
    }
}

/// Expression interpolator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpressionConfig {
    /// Transition length used when a caller does not pass one.
    pub default_duration_secs: f32,
    /// The expression weight shapes the mouth, so it is held at 0 while
    /// lip sync is speaking.
    pub drives_mouth: bool,
}

impl Default for ExpressionConfig {
    fn default() -> Self {
        Self {
            default_duration_secs: 0.5,
            drives_mouth: true,
        }
    }
}

/// Head-nod configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadNodConfig {
    /// Length of one nod, in seconds.
    pub duration_secs: f32,
    /// Peak pitch angle, in radians.
    pub max_angle_rad: f32,
}

impl Default for HeadNodConfig {
    fn default() -> Self {
        Self {
            duration_secs: 1.0,
            max_angle_rad: 0.3,
        }
    }
}

/// Lip-sync configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LipSyncConfig {
    /// Code space of incoming viseme ids.
    pub scheme: VisemeScheme,
    /// Duration assigned to the final viseme of an utterance, in milliseconds.
    pub fallback_duration_ms: f64,
    /// Blend window toward the next viseme, in milliseconds (0 disables).
    pub coarticulation_ms: f64,
    /// Target frame rate of the frame driver.
    pub frame_rate_hz: u32,
}

impl Default for LipSyncConfig {
    fn default() -> Self {
        Self {
            scheme: VisemeScheme::Oculus,
            fallback_duration_ms: 150.0,
            coarticulation_ms: 0.0,
            frame_rate_hz: 60,
        }
    }
}

/// Render surface configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Explicit pixel ratio request; clamped to the tier cap.
    pub pixel_ratio_override: Option<f32>,
    /// Base avatar image for the 2D region-warp backend.
    pub avatar_image: Option<PathBuf>,
}

impl AvatarConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::AnimationError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::AnimationError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/talking-head/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("talking-head").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("talking-head")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/talking-head-config/config.toml")
        }
    }
}
