//! Talking-head: real-time animation for a speaking avatar.
//!
//! This crate drives the per-frame motion of a talking avatar: idle
//! behaviours that run continuously, and a mouth that follows synthesized
//! speech.
//!
//! # Architecture
//!
//! - **Device**: classifies the host once per session into a
//!   [`PerformanceTier`] and derives render settings from it
//! - **Idle**: breathing, blinking, expression easing and head nods, each
//!   polled with the frame clock
//! - **Viseme**: maps synthesizer viseme codes to mouth targets and builds
//!   sorted timelines from viseme payloads
//! - **Lip sync**: resolves the active viseme against the audio element's
//!   playback position and writes it to a [`MouthSurface`] (blend-shape rig
//!   or 2D region warp)
//! - **Avatar**: one instance of all of the above, producing a
//!   [`FrameOutput`] per frame
//! - **Driver**: the async frame loop that ticks one avatar and publishes its
//!   frames

pub mod avatar;
pub mod config;
pub mod device;
pub mod driver;
pub mod error;
pub mod idle;
pub mod lipsync;
pub mod viseme;

pub use avatar::{Avatar, FrameOutput};
pub use config::AvatarConfig;
pub use device::{DeviceInfo, DeviceProfile, PerformanceConfig, PerformanceTier};
pub use driver::{DriverCommand, FrameDriver};
pub use error::{AnimationError, Result};
pub use lipsync::{AudioClock, LipSyncEngine, MouthSurface, PlaybackEvent};
pub use viseme::{VisemeMapping, VisemeTimeline};
