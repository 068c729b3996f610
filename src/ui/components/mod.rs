mod button;
mod slider;
mod toggle;

pub use button::button;
pub use slider::timeout_slider;
pub use toggle::{checkbox, setting_row};

/// Highlight colour shared by every control.
const ACCENT: u32 = 0x7fc8a9;
