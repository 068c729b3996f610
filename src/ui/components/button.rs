use gpui::prelude::*;
use gpui::{MouseButton, SharedString, div, px, rgb};

use super::ACCENT;

/// Footer button. A disabled button renders dimmed and ignores clicks.
pub fn button(
    label: impl Into<SharedString>,
    primary: bool,
    enabled: bool,
    on_click: impl Fn(&gpui::MouseDownEvent, &mut gpui::Window, &mut gpui::App) + 'static,
) -> impl IntoElement {
    let (bg, fg) = match (primary, enabled) {
        (_, false) => (rgb(0x1c1c1c), rgb(0x555555)),
        (true, true) => (rgb(ACCENT), rgb(0x000000)),
        (false, true) => (rgb(0x2a2a2a), rgb(0xdddddd)),
    };

    div()
        .px_4()
        .py_2()
        .rounded(px(6.0))
        .bg(bg)
        .text_color(fg)
        .text_sm()
        .child(label.into())
        .when(enabled, |this| {
            this.cursor_pointer()
                .on_mouse_down(MouseButton::Left, on_click)
        })
}
