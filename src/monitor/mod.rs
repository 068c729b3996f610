//! Display enumeration and the ordered monitor list used for blanking.

#[cfg(windows)]
pub mod enumerate;
pub mod registry;
pub mod types;

#[cfg(windows)]
pub use enumerate::Win32Displays;
pub use registry::{DisplayEnumerator, MonitorRegistry};
pub use types::{MonitorDescriptor, MonitorInfo};
