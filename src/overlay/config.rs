use std::time::Instant;

use crate::monitor::MonitorDescriptor;

/// Parameters needed to create a single blanking surface on a specific monitor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverlayConfig {
    /// Enumeration index of the target monitor.
    pub monitor_index: usize,
    /// X coordinate of the target monitor's top-left corner.
    pub x: i32,
    /// Y coordinate of the target monitor's top-left corner.
    pub y: i32,
    /// Width of the target monitor in pixels.
    pub width: i32,
    /// Height of the target monitor in pixels.
    pub height: i32,
}

impl From<&MonitorDescriptor> for OverlayConfig {
    fn from(mon: &MonitorDescriptor) -> Self {
        Self {
            monitor_index: mon.index,
            x: mon.info.x,
            y: mon.info.y,
            width: mon.info.width,
            height: mon.info.height,
        }
    }
}

/// A live blanking surface on one monitor.
#[derive(Clone, Debug)]
pub struct OverlayState<H> {
    /// Enumeration index of the monitor it covers.
    pub monitor_index: usize,
    /// Backend handle of the surface.
    pub handle: H,
    /// When the surface appeared; input before the grace window is ignored.
    pub created_at: Instant,
}
