//! oled-sentinel - blanks idle displays to protect OLED panels from burn-in.
//!
//! The decision core (`activity`, `monitor`, `overlay`, `blanking`, `app`)
//! is platform-neutral; the Win32 runtime and the settings window live in
//! `platform` and `ui`.

pub mod activity;
pub mod app;
pub mod blanking;
pub mod config;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod notify;
pub mod overlay;
#[cfg(windows)]
pub mod platform;
pub mod settings;
#[cfg(windows)]
pub mod ui;

pub use app::App;
pub use config::Config;
pub use error::SentinelError;
