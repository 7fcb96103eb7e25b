//! # layout
//!
//! View geometry derived from the surface size. Both the scene composer and
//! the touch router read panel rects from here, so what gets drawn and what
//! gets hit-tested can never drift apart.

use crate::canvas::Rect;

pub const TOP_BAR_HEIGHT: f32 = 120.0;
pub const TOP_MARGIN: f32 = 60.0;
pub const COMPASS_HEIGHT: f32 = 80.0;
pub const BOTTOM_BAR_HEIGHT: f32 = 120.0;
pub const WEATHER_PANEL_HEIGHT: f32 = 500.0;
pub const CITY_TOGGLE_WIDTH: f32 = 120.0;
pub const CITY_TOGGLE_HEIGHT: f32 = 40.0;

/// Vertical offset of the weather panel title row; the toggle button rides
/// on the same line.
pub const WEATHER_TEXT_OFFSET_Y: f32 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewGeometry {
    pub width: f32,
    pub height: f32,
    pub center_x: f32,
    pub center_y: f32,
    pub radar_radius: f32,
}

impl ViewGeometry {
    pub fn new(width: u32, height: u32) -> Self {
        let w = width as f32;
        let h = height as f32;
        Self {
            width: w,
            height: h,
            center_x: w / 2.0,
            center_y: h / 2.0,
            radar_radius: w.min(h) * 0.25,
        }
    }

    /// Compass ribbon strip under the top bar, 80 % of the width, centered.
    pub fn compass_rect(&self) -> Rect {
        let w = self.width * 0.8;
        Rect::new(
            self.center_x - w / 2.0,
            TOP_BAR_HEIGHT + TOP_MARGIN + 20.0,
            w,
            COMPASS_HEIGHT,
        )
    }

    /// Mission panel fills the space between the compass strip and the top
    /// of the radar dial, 85 % of the width.
    pub fn mission_panel_rect(&self) -> Rect {
        let compass = self.compass_rect();
        let top = compass.bottom() + 40.0;
        let radar_top = self.center_y - self.radar_radius - 60.0;
        let w = self.width * 0.85;
        Rect::new(self.center_x - w / 2.0, top, w, radar_top - top - 20.0)
    }

    /// Weather panel sits below the radar dial and its label.
    pub fn weather_panel_rect(&self) -> Rect {
        let w = self.width * 0.75;
        let y = self.center_y + self.radar_radius + 80.0 + 40.0;
        Rect::new(self.center_x - w / 2.0, y, w, WEATHER_PANEL_HEIGHT)
    }

    /// City toggle button on the far right of the weather panel title row.
    /// The touch router hit-tests this exact rect.
    pub fn city_toggle_rect(&self) -> Rect {
        let panel = self.weather_panel_rect();
        Rect::new(
            panel.right() - CITY_TOGGLE_WIDTH - 20.0,
            panel.y + WEATHER_TEXT_OFFSET_Y,
            CITY_TOGGLE_WIDTH,
            CITY_TOGGLE_HEIGHT,
        )
    }
}
