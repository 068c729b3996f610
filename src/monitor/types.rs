/// Information about a connected display monitor, as reported by the platform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonitorInfo {
    /// Device name reported by Windows (e.g. `\\.\DISPLAY1`).
    pub name: String,
    /// X coordinate of the monitor's top-left corner in virtual-screen space.
    pub x: i32,
    /// Y coordinate of the monitor's top-left corner in virtual-screen space.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
    /// Whether this is the primary display.
    pub primary: bool,
    /// Raw `HMONITOR` handle stored as an opaque integer.
    pub hmonitor: isize,
}

/// A monitor in enumeration order, joined with its configured enable flag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonitorDescriptor {
    /// Position in the enumeration; the key into `Config::monitor_enabled`.
    pub index: usize,
    pub info: MonitorInfo,
    /// Whether blanking covers this monitor.
    pub enabled: bool,
}

impl MonitorDescriptor {
    /// Human-readable label, e.g. `DISPLAY1 (1)`.
    pub fn label(&self) -> String {
        if self.info.name.is_empty() {
            format!("Monitor {}", self.index + 1)
        } else {
            let clean = self.info.name.replace("\\\\.\\", "");
            format!("{} ({})", clean, self.index + 1)
        }
    }
}
