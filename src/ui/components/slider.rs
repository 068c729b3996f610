use std::cell::Cell;
use std::rc::Rc;

use gpui::prelude::*;
use gpui::{Bounds, FontWeight, MouseButton, Pixels, div, px, rgb};

use super::ACCENT;
use crate::config::IDLE_TIMEOUT_RANGE;
use crate::ui::settings::SettingsView;

/// Width of the slider track in pixels.
const TRACK_WIDTH: f32 = 400.0;

/// Snap granularity of the track, in seconds.
const STEP_SECONDS: u64 = 5;

/// Preset buttons, in minutes.
const PRESETS: [u64; 6] = [1, 5, 10, 15, 30, 60];

/// Idle timeout section: value badge, draggable track and preset buttons.
pub fn timeout_slider(
    seconds: u64,
    track_bounds: &Rc<Cell<Option<Bounds<Pixels>>>>,
    cx: &mut gpui::Context<SettingsView>,
) -> impl IntoElement + use<> {
    let knob = fraction_from_timeout(seconds) * TRACK_WIDTH;
    let (min, max) = IDLE_TIMEOUT_RANGE;

    let mut presets = div().flex().gap_2().mt_1();
    for minutes in PRESETS {
        presets = presets.child(preset(minutes, seconds, cx));
    }

    div()
        .flex()
        .flex_col()
        .gap_2()
        .w_full()
        .max_w(px(500.0))
        .child(
            div()
                .flex()
                .items_center()
                .justify_between()
                .child(
                    div()
                        .font_weight(FontWeight::MEDIUM)
                        .text_color(rgb(0xcccccc))
                        .child("Blank after"),
                )
                .child(
                    div()
                        .px_3()
                        .py_1()
                        .rounded(px(6.0))
                        .bg(rgb(0x2a2a2a))
                        .font_weight(FontWeight::BOLD)
                        .text_color(rgb(ACCENT))
                        .child(format_timeout(seconds)),
                ),
        )
        .child(
            div()
                .flex()
                .items_center()
                .gap_3()
                .child(
                    div()
                        .text_sm()
                        .text_color(rgb(0x666666))
                        .child(format_timeout(min)),
                )
                .child(track(knob, track_bounds, cx))
                .child(
                    div()
                        .text_sm()
                        .text_color(rgb(0x666666))
                        .child(format_timeout(max)),
                ),
        )
        .child(presets)
}

/// Draggable track. The wrapper records the track's window-space bounds on
/// every prepaint so mouse positions can be mapped onto it.
fn track(
    knob: f32,
    track_bounds: &Rc<Cell<Option<Bounds<Pixels>>>>,
    cx: &mut gpui::Context<SettingsView>,
) -> impl IntoElement + use<> {
    div()
        .on_children_prepainted({
            let cell = track_bounds.clone();
            move |bounds, _window, _cx| {
                if let Some(b) = bounds.first() {
                    cell.set(Some(*b));
                }
            }
        })
        .child(
            div()
                .relative()
                .w(px(TRACK_WIDTH))
                .h(px(28.0))
                .cursor_pointer()
                .on_mouse_down(
                    MouseButton::Left,
                    cx.listener(|this, ev: &gpui::MouseDownEvent, _window, cx| {
                        if let Some(secs) = timeout_from_mouse(ev.position.x, &this.track_bounds)
                        {
                            this.edit(|draft| draft.set_timeout(secs));
                            cx.notify();
                        }
                    }),
                )
                .on_mouse_move(cx.listener(|this, ev: &gpui::MouseMoveEvent, _window, cx| {
                    if ev.pressed_button != Some(MouseButton::Left) {
                        return;
                    }
                    if let Some(secs) = timeout_from_mouse(ev.position.x, &this.track_bounds)
                        && secs != this.draft.config().idle_timeout_seconds
                    {
                        this.edit(|draft| draft.set_timeout(secs));
                        cx.notify();
                    }
                }))
                .child(
                    div()
                        .absolute()
                        .left(px(0.0))
                        .top(px(11.0))
                        .w(px(TRACK_WIDTH))
                        .h(px(6.0))
                        .rounded(px(3.0))
                        .bg(rgb(0x333333)),
                )
                .child(
                    div()
                        .absolute()
                        .left(px(0.0))
                        .top(px(11.0))
                        .w(px(knob))
                        .h(px(6.0))
                        .rounded(px(3.0))
                        .bg(rgb(ACCENT)),
                )
                .child(
                    div()
                        .absolute()
                        .left(px(knob - 8.0))
                        .top(px(6.0))
                        .size(px(16.0))
                        .rounded_full()
                        .bg(rgb(0xffffff))
                        .border_2()
                        .border_color(rgb(ACCENT)),
                ),
        )
}

fn preset(
    minutes: u64,
    current: u64,
    cx: &mut gpui::Context<SettingsView>,
) -> impl IntoElement + use<> {
    let seconds = minutes * 60;
    let selected = current == seconds;

    div()
        .px_3()
        .py_1()
        .rounded(px(6.0))
        .bg(if selected { rgb(ACCENT) } else { rgb(0x2a2a2a) })
        .text_sm()
        .text_color(if selected { rgb(0x000000) } else { rgb(0x888888) })
        .cursor_pointer()
        .on_mouse_down(
            MouseButton::Left,
            cx.listener(move |this, _, _window, cx| {
                this.edit(|draft| draft.set_timeout(seconds));
                cx.notify();
            }),
        )
        .child(format!("{minutes} min"))
}

fn timeout_from_mouse(
    mouse_x: Pixels,
    track_bounds: &Rc<Cell<Option<Bounds<Pixels>>>>,
) -> Option<u64> {
    let bounds = track_bounds.get()?;
    let origin: f32 = bounds.origin.x.into();
    let width: f32 = bounds.size.width.into();
    if width <= 0.0 {
        return None;
    }
    let x: f32 = mouse_x.into();
    Some(timeout_from_fraction((x - origin) / width))
}

/// Map a position along the track to a timeout, snapped to [`STEP_SECONDS`].
pub(crate) fn timeout_from_fraction(fraction: f32) -> u64 {
    let (min, max) = IDLE_TIMEOUT_RANGE;
    let raw = min as f32 + fraction.clamp(0.0, 1.0) * (max - min) as f32;
    let snapped = (raw / STEP_SECONDS as f32).round() as u64 * STEP_SECONDS;
    snapped.clamp(min, max)
}

fn fraction_from_timeout(seconds: u64) -> f32 {
    let (min, max) = IDLE_TIMEOUT_RANGE;
    (seconds.clamp(min, max) - min) as f32 / (max - min) as f32
}

/// `45 s`, `5 min`, `2 min 30 s`.
pub(crate) fn format_timeout(seconds: u64) -> String {
    match (seconds / 60, seconds % 60) {
        (0, s) => format!("{s} s"),
        (m, 0) => format!("{m} min"),
        (m, s) => format!("{m} min {s} s"),
    }
}
