//! # touch
//!
//! Tap routing. Pure: geometry in, action out. The engine applies the
//! action (selection change, forced refresh, haptic pulse, immediate frame).

use crate::layout::ViewGeometry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchAction {
    /// Tap landed somewhere inert, or on the already-selected city.
    None,
    SwitchCity(usize),
}

/// Every tap re-derives the button rect from current geometry, so hit
/// testing survives surface resizes without any cached state.
pub fn route_tap(geom: &ViewGeometry, selected_city: usize, x: f32, y: f32) -> TouchAction {
    let button = geom.city_toggle_rect();
    if !button.contains(x, y) {
        return TouchAction::None;
    }

    let tapped = if x < button.x + button.w / 2.0 { 0 } else { 1 };
    if tapped == selected_city {
        TouchAction::None
    } else {
        TouchAction::SwitchCity(tapped)
    }
}

/// Haptic feedback on city switch. Hosts without a vibrator use [`NoopHaptics`].
pub trait Haptics: Send {
    fn pulse(&self, millis: u64);
}

pub struct NoopHaptics;

impl Haptics for NoopHaptics {
    fn pulse(&self, _millis: u64) {}
}
