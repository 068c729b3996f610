//! Settings window, run as its own process (`oled-sentinel settings`).
//!
//! The window only edits the config file; the daemon notices the new
//! modification time and applies it on its next poll.

mod components;
mod monitor_list;
mod settings;

use std::path::PathBuf;

use anyhow::Result;
use gpui::{AppContext, Application, Bounds, TitlebarOptions, WindowBounds, WindowOptions, px, size};
use tracing::{error, info};

pub use settings::SettingsView;

/// Open the settings window and block until it is closed.
pub fn run_settings(config_path: PathBuf) -> Result<()> {
    let view = SettingsView::load(config_path)?;
    info!("Opening settings for {} monitor(s)", view.monitor_count());

    Application::new().run(move |cx: &mut gpui::App| {
        cx.on_window_closed(|cx| {
            if cx.windows().is_empty() {
                cx.quit();
            }
        })
        .detach();

        let bounds = Bounds::centered(None, size(px(560.0), px(760.0)), cx);
        let opened = cx.open_window(
            WindowOptions {
                titlebar: Some(TitlebarOptions {
                    title: Some("OLED Sentinel Settings".into()),
                    ..Default::default()
                }),
                window_bounds: Some(WindowBounds::Windowed(bounds)),
                ..Default::default()
            },
            |_, cx| cx.new(move |_| view),
        );
        if let Err(e) = opened {
            error!("Failed to open settings window: {:#}", e);
            cx.quit();
        }
    });
    Ok(())
}
