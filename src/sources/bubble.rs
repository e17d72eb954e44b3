//! Guidance for rendering theme-adaptive chat bubbles.

use serde_json::{json, Value};

use crate::clock::Clock;

/// Instructions the host injects so generated bubbles follow the active theme.
pub const BUBBLE_TIP: &str = "When producing rich chat bubbles, do not hard-code colours. \
Use the CSS custom properties of the active theme, for example var(--primary-bg), \
var(--secondary-bg), var(--primary-text), var(--highlight-text) and var(--border-color), \
so the bubble follows the user's light or dark mode. Keep backgrounds translucent \
where possible so the chat wallpaper stays visible, and avoid fixed widths that break \
on narrow sidebars.";

const PURPOSE: &str = "Theme-adaptive bubble styling guidance";

pub fn collect(clock: &Clock) -> Value {
    let (timestamp, display_time) = clock.stamp();
    json!({
        "timestamp": timestamp,
        "displayTime": display_time,
        "content": BUBBLE_TIP,
        "purpose": PURPOSE,
    })
}
