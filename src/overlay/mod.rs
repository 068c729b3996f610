//! Full-screen blanking surfaces, one per enabled monitor.

pub mod config;
pub mod manager;
#[cfg(windows)]
pub mod window;

pub use config::{OverlayConfig, OverlayState};
pub use manager::{InputVerdict, OverlayManager, ShowOutcome, SurfaceBackend};
#[cfg(windows)]
pub use window::Win32Surfaces;
