//! Win32 runtime: controller window, message loop, tray icon and startup
//! registration.

mod runtime;
mod startup;
mod tray;

pub use runtime::{DaemonOptions, run_daemon};
pub use startup::sync_startup_registration;
pub use tray::{TrayIcon, TraySink};
