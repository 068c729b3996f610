use gpui::prelude::*;
use gpui::{FontWeight, MouseButton, div, px, rgb};

use crate::monitor::MonitorDescriptor;
use crate::ui::components::checkbox;
use crate::ui::settings::SettingsView;

/// One row per connected monitor; clicking a row (or its box) flips whether
/// that monitor is blanked.
pub fn monitor_list(
    monitors: &[MonitorDescriptor],
    cx: &mut gpui::Context<SettingsView>,
) -> impl IntoElement + use<> {
    let mut list = div().flex().flex_col().gap_2().w_full().max_w(px(500.0));

    if monitors.is_empty() {
        return list.child(
            div()
                .text_sm()
                .text_color(rgb(0xd08770))
                .child("No monitors detected. Saved flags are kept as they are."),
        );
    }

    for mon in monitors {
        let index = mon.index;
        let enabled = mon.enabled;

        let mut detail = format!(
            "{}x{} at ({}, {})",
            mon.info.width, mon.info.height, mon.info.x, mon.info.y
        );
        if mon.info.primary {
            detail.push_str(" · primary");
        }

        let row = div()
            .flex()
            .items_center()
            .gap_3()
            .px_4()
            .py_3()
            .w_full()
            .rounded(px(8.0))
            .bg(rgb(0x1a1a1a))
            .border_1()
            .border_color(if enabled {
                rgb(0x3f6f5c)
            } else {
                rgb(0x2e2e2e)
            })
            .cursor_pointer()
            .on_mouse_down(
                MouseButton::Left,
                cx.listener(move |this, _, _window, cx| {
                    this.edit(|draft| draft.toggle_monitor(index));
                    cx.notify();
                }),
            )
            .child(checkbox(
                enabled,
                cx.listener(move |this, _, _window, cx| {
                    this.edit(|draft| draft.toggle_monitor(index));
                    cx.notify();
                }),
            ))
            .child(
                div()
                    .flex()
                    .flex_col()
                    .flex_grow()
                    .gap(px(2.0))
                    .child(
                        div()
                            .font_weight(FontWeight::MEDIUM)
                            .text_color(rgb(0xffffff))
                            .child(mon.label()),
                    )
                    .child(div().text_sm().text_color(rgb(0x808080)).child(detail)),
            )
            .child(
                div()
                    .text_sm()
                    .text_color(if enabled {
                        rgb(0x7fc8a9)
                    } else {
                        rgb(0x666666)
                    })
                    .child(if enabled { "blanked" } else { "left on" }),
            );

        list = list.child(row);
    }

    list
}
