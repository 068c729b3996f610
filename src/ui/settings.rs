use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Result;
use gpui::prelude::*;
use gpui::{Bounds, FontWeight, Pixels, div, px, rgb};
use tracing::{info, warn};

use crate::monitor::Win32Displays;
use crate::settings::SettingsDraft;
use crate::ui::components::{button, setting_row, timeout_slider};
use crate::ui::monitor_list::monitor_list;

#[derive(Debug, Clone, PartialEq)]
enum Status {
    Unchanged,
    Saved,
    Failed(String),
}

/// Settings window root: the draft plus transient view state.
pub struct SettingsView {
    pub(crate) draft: SettingsDraft<Win32Displays>,
    status: Status,
    /// Window-space bounds of the timeout track, captured each frame.
    pub(crate) track_bounds: Rc<Cell<Option<Bounds<Pixels>>>>,
}

impl SettingsView {
    /// Read the config file (or defaults) and enumerate monitors.
    pub fn load(config_path: PathBuf) -> Result<Self> {
        Ok(Self {
            draft: SettingsDraft::load(config_path, Win32Displays)?,
            status: Status::Unchanged,
            track_bounds: Rc::new(Cell::new(None)),
        })
    }

    pub fn monitor_count(&self) -> usize {
        self.draft.monitors().len()
    }

    /// Run an edit on the draft and clear any stale save status.
    pub(crate) fn edit(&mut self, f: impl FnOnce(&mut SettingsDraft<Win32Displays>)) {
        f(&mut self.draft);
        self.status = Status::Unchanged;
    }

    fn save(&mut self) {
        match self.draft.save() {
            Ok(()) => {
                info!("Settings saved to {}", self.draft.path().display());
                self.status = Status::Saved;
            }
            Err(e) => {
                warn!("{:#}", e);
                self.status = Status::Failed(format!("{e:#}"));
            }
        }
    }

    fn status_line(&self) -> (String, u32) {
        match &self.status {
            Status::Failed(reason) => (format!("Save failed: {reason}"), 0xbf616a),
            Status::Saved => (
                "Saved. The running daemon applies it within a few seconds.".to_string(),
                0x7fc8a9,
            ),
            Status::Unchanged if self.draft.is_dirty() => {
                ("Unsaved changes".to_string(), 0xebcb8b)
            }
            Status::Unchanged => (
                format!("Editing {}", self.draft.path().display()),
                0x666666,
            ),
        }
    }
}

fn section_title(title: &'static str) -> impl IntoElement {
    div()
        .w_full()
        .max_w(px(500.0))
        .text_lg()
        .font_weight(FontWeight::MEDIUM)
        .text_color(rgb(0xcccccc))
        .child(title)
}

impl Render for SettingsView {
    fn render(
        &mut self,
        _window: &mut gpui::Window,
        cx: &mut gpui::Context<Self>,
    ) -> impl IntoElement {
        let config = self.draft.config();
        let slider = timeout_slider(config.idle_timeout_seconds, &self.track_bounds, cx);
        let monitors = monitor_list(self.draft.monitors(), cx);

        let behaviour = div()
            .flex()
            .flex_col()
            .w_full()
            .max_w(px(500.0))
            .child(setting_row(
                "Pause while media plays",
                "Skip blanking while video or audio keeps the display on",
                config.suppress_during_playback,
                cx.listener(|this, _, _window, cx| {
                    this.edit(SettingsDraft::toggle_suppression);
                    cx.notify();
                }),
            ))
            .child(setting_row(
                "Start with Windows",
                "Launch the blanking daemon at logon",
                config.start_with_windows,
                cx.listener(|this, _, _window, cx| {
                    this.edit(SettingsDraft::toggle_startup);
                    cx.notify();
                }),
            ))
            .child(setting_row(
                "Debug logging",
                "Log every tick decision",
                config.debug,
                cx.listener(|this, _, _window, cx| {
                    this.edit(SettingsDraft::toggle_debug);
                    cx.notify();
                }),
            ));

        let dirty = self.draft.is_dirty();
        let (status, status_color) = self.status_line();
        let footer = div()
            .flex()
            .items_center()
            .justify_between()
            .gap_3()
            .w_full()
            .max_w(px(500.0))
            .child(
                div()
                    .flex_grow()
                    .text_sm()
                    .text_color(rgb(status_color))
                    .child(status),
            )
            .child(
                div()
                    .flex()
                    .gap_2()
                    .child(button(
                        "Revert",
                        false,
                        dirty,
                        cx.listener(|this, _, _window, cx| {
                            this.edit(SettingsDraft::revert);
                            cx.notify();
                        }),
                    ))
                    .child(button(
                        "Save",
                        true,
                        dirty,
                        cx.listener(|this, _, _window, cx| {
                            this.save();
                            cx.notify();
                        }),
                    )),
            );

        let sep = || div().w_full().max_w(px(500.0)).h(px(1.0)).bg(rgb(0x2a2a2a));

        div()
            .flex()
            .flex_col()
            .items_center()
            .gap_5()
            .size_full()
            .p_6()
            .bg(rgb(0x0b0b0b))
            .child(
                div()
                    .flex()
                    .flex_col()
                    .items_center()
                    .gap_1()
                    .child(
                        div()
                            .text_2xl()
                            .font_weight(FontWeight::BOLD)
                            .text_color(rgb(0xffffff))
                            .child("OLED Sentinel"),
                    )
                    .child(
                        div()
                            .text_sm()
                            .text_color(rgb(0x888888))
                            .child("Blank idle displays before they burn in"),
                    ),
            )
            .child(sep())
            .child(slider)
            .child(sep())
            .child(section_title("Monitors"))
            .child(monitors)
            .child(sep())
            .child(section_title("Behaviour"))
            .child(behaviour)
            .child(sep())
            .child(footer)
    }
}
