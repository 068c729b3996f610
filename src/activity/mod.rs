//! Idle-time and playback detection.
//!
//! The sensor combines one idle clock with any number of playback probes and
//! degrades every failure to the answer that still allows blanking: zero idle
//! means "not idle enough", a failed probe means "not playing".

pub mod sensor;
#[cfg(windows)]
pub mod win32;

pub use sensor::{ActivitySample, ActivitySensor, IdleClock, PlaybackProbe};
