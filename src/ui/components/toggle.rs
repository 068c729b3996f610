use gpui::prelude::*;
use gpui::{FontWeight, MouseButton, SharedString, div, px, rgb};

use super::ACCENT;

/// Square check mark used by the monitor rows.
///
/// Stops propagation so the row's own click handler does not toggle twice.
pub fn checkbox(
    checked: bool,
    on_click: impl Fn(&bool, &mut gpui::Window, &mut gpui::App) + 'static,
) -> impl IntoElement {
    div()
        .flex()
        .flex_none()
        .items_center()
        .justify_center()
        .size(px(20.0))
        .rounded(px(4.0))
        .border_1()
        .border_color(if checked { rgb(ACCENT) } else { rgb(0x5a5a5a) })
        .bg(if checked { rgb(ACCENT) } else { rgb(0x202020) })
        .cursor_pointer()
        .on_mouse_down(MouseButton::Left, move |_, window, cx| {
            cx.stop_propagation();
            on_click(&checked, window, cx);
        })
        .when(checked, |this| {
            this.child(div().text_sm().text_color(rgb(0x000000)).child("✓"))
        })
}

/// A titled settings line with an on/off switch on the right.
pub fn setting_row(
    title: impl Into<SharedString>,
    detail: impl Into<SharedString>,
    on: bool,
    on_click: impl Fn(&bool, &mut gpui::Window, &mut gpui::App) + 'static,
) -> impl IntoElement {
    div()
        .flex()
        .items_center()
        .justify_between()
        .gap_4()
        .w_full()
        .py_2()
        .child(
            div()
                .flex()
                .flex_col()
                .gap(px(2.0))
                .child(
                    div()
                        .font_weight(FontWeight::MEDIUM)
                        .text_color(rgb(0xeeeeee))
                        .child(title.into()),
                )
                .child(
                    div()
                        .text_sm()
                        .text_color(rgb(0x808080))
                        .child(detail.into()),
                ),
        )
        .child(switch(on, on_click))
}

fn switch(
    on: bool,
    on_click: impl Fn(&bool, &mut gpui::Window, &mut gpui::App) + 'static,
) -> impl IntoElement {
    div()
        .flex()
        .flex_none()
        .items_center()
        .w(px(40.0))
        .h(px(22.0))
        .rounded_full()
        .bg(if on { rgb(ACCENT) } else { rgb(0x303030) })
        .cursor_pointer()
        .on_mouse_down(MouseButton::Left, move |_, window, cx| {
            on_click(&on, window, cx);
        })
        .child(
            div()
                .size(px(16.0))
                .rounded_full()
                .bg(if on { rgb(0x000000) } else { rgb(0xbbbbbb) })
                .ml(px(if on { 21.0 } else { 3.0 })),
        )
}
