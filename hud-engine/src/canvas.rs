//! # canvas
//!
//! Backend-agnostic drawing layer. The scene composer records a [`Frame`]
//! (a flat display list of [`DrawCmd`]s); a [`Surface`] implementation turns
//! it into pixels. Nothing in here touches a GPU or a window system, which is
//! what lets the whole engine run headless in tests and the simulator.

use thiserror::Error;

// ── Color ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with a replacement alpha channel.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    // Fixed HUD palette
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const BACKGROUND: Color = Color::rgb(0x00, 0x10, 0x0c);
    pub const NEON_GREEN: Color = Color::rgb(0x00, 0xff, 0x88);
    pub const NEON_TEAL: Color = Color::rgb(0x00, 0xd4, 0xff);
    pub const HUD_TEXT: Color = Color::rgb(0xbd, 0xee, 0xea);
    pub const RED_ALERT: Color = Color::rgb(0xff, 0x44, 0x44);
    pub const AMBER: Color = Color::rgb(0xff, 0xaa, 0x00);
    pub const PANEL_LIGHT: Color = Color::rgb(0x1a, 0x20, 0x28);
    pub const PANEL_DARK: Color = Color::rgb(0x0d, 0x11, 0x17);
    pub const METAL_LIGHT: Color = Color::rgb(0x2a, 0x35, 0x42);
    pub const METAL_DARK: Color = Color::rgb(0x0a, 0x0e, 0x12);
    pub const RIM_LIGHT: Color = Color::rgb(0x25, 0x2d, 0x38);
    pub const RIM_DARK: Color = Color::rgb(0x0f, 0x14, 0x19);
    pub const SCREEN_DARK: Color = Color::rgb(0x00, 0x0a, 0x08);
    pub const PANEL_EDGE: Color = Color::rgb(0x15, 0x1a, 0x21);
}

// ── Geometry ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.w / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.h / 2.0
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

// ── Brushes ───────────────────────────────────────────────────────────────────

/// Paint source for fills and strokes. Gradient stops are (offset, color)
/// with offsets in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub enum Brush {
    Solid(Color),
    Linear {
        start: (f32, f32),
        end: (f32, f32),
        stops: Vec<(f32, Color)>,
    },
    Radial {
        center: (f32, f32),
        radius: f32,
        stops: Vec<(f32, Color)>,
    },
    /// Angular gradient around a center, used by the radar sweep.
    Sweep {
        center: (f32, f32),
        stops: Vec<(f32, Color)>,
    },
}

impl Brush {
    pub fn solid(color: Color) -> Self {
        Brush::Solid(color)
    }

    pub fn linear(start: (f32, f32), end: (f32, f32), from: Color, to: Color) -> Self {
        Brush::Linear { start, end, stops: vec![(0.0, from), (1.0, to)] }
    }

    pub fn radial(center: (f32, f32), radius: f32, from: Color, to: Color) -> Self {
        Brush::Radial { center, radius, stops: vec![(0.0, from), (1.0, to)] }
    }
}

/// Bitmap assets the surface is expected to have loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitmapId {
    TopoMap,
}

// ── Display list ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    FillRect { rect: Rect, brush: Brush },
    StrokeRect { rect: Rect, brush: Brush, width: f32 },
    FillRoundRect { rect: Rect, radius: f32, brush: Brush },
    StrokeRoundRect { rect: Rect, radius: f32, brush: Brush, width: f32 },
    FillCircle { cx: f32, cy: f32, radius: f32, brush: Brush, blur: Option<f32> },
    StrokeCircle { cx: f32, cy: f32, radius: f32, brush: Brush, width: f32 },
    Line { x1: f32, y1: f32, x2: f32, y2: f32, brush: Brush, width: f32 },
    Text { text: String, x: f32, y: f32, size: f32, color: Color, align: Align },
    Blit { id: BitmapId, dest: Rect, tint: Option<Color>, alpha: u8 },
    PushClip { rect: Rect },
    /// Rotation in degrees around a pivot; paired with PopTransform.
    PushRotate { degrees: f32, cx: f32, cy: f32 },
    PopClip,
    PopTransform,
}

/// One frame's worth of recorded draw commands, in paint order.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    cmds: Vec<DrawCmd>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cmd: DrawCmd) {
        self.cmds.push(cmd);
    }

    pub fn cmds(&self) -> &[DrawCmd] {
        &self.cmds
    }

    pub fn len(&self) -> usize {
        self.cmds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    pub fn fill_rect(&mut self, rect: Rect, brush: Brush) {
        self.push(DrawCmd::FillRect { rect, brush });
    }

    pub fn stroke_rect(&mut self, rect: Rect, brush: Brush, width: f32) {
        self.push(DrawCmd::StrokeRect { rect, brush, width });
    }

    pub fn fill_round_rect(&mut self, rect: Rect, radius: f32, brush: Brush) {
        self.push(DrawCmd::FillRoundRect { rect, radius, brush });
    }

    pub fn stroke_round_rect(&mut self, rect: Rect, radius: f32, brush: Brush, width: f32) {
        self.push(DrawCmd::StrokeRoundRect { rect, radius, brush, width });
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, brush: Brush) {
        self.push(DrawCmd::FillCircle { cx, cy, radius, brush, blur: None });
    }

    pub fn fill_circle_blurred(&mut self, cx: f32, cy: f32, radius: f32, brush: Brush, blur: f32) {
        self.push(DrawCmd::FillCircle { cx, cy, radius, brush, blur: Some(blur) });
    }

    pub fn stroke_circle(&mut self, cx: f32, cy: f32, radius: f32, brush: Brush, width: f32) {
        self.push(DrawCmd::StrokeCircle { cx, cy, radius, brush, width });
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, brush: Brush, width: f32) {
        self.push(DrawCmd::Line { x1, y1, x2, y2, brush, width });
    }

    pub fn text(&mut self, text: impl Into<String>, x: f32, y: f32, size: f32, color: Color, align: Align) {
        self.push(DrawCmd::Text { text: text.into(), x, y, size, color, align });
    }

    pub fn blit(&mut self, id: BitmapId, dest: Rect, tint: Option<Color>, alpha: u8) {
        self.push(DrawCmd::Blit { id, dest, tint, alpha });
    }

    /// Record `f` inside a clip region; the clip is popped on exit so clip
    /// pushes and pops always balance.
    pub fn with_clip(&mut self, rect: Rect, f: impl FnOnce(&mut Frame)) {
        self.push(DrawCmd::PushClip { rect });
        f(self);
        self.push(DrawCmd::PopClip);
    }

    /// Record `f` under a rotation about (cx, cy), popped on exit.
    pub fn with_rotation(&mut self, degrees: f32, cx: f32, cy: f32, f: impl FnOnce(&mut Frame)) {
        self.push(DrawCmd::PushRotate { degrees, cx, cy });
        f(self);
        self.push(DrawCmd::PopTransform);
    }
}

// ── Text measurement ──────────────────────────────────────────────────────────

pub trait TextMeasurer: Send {
    /// Width in pixels of `text` at the given font size.
    fn measure(&self, text: &str, size: f32) -> f32;
}

/// The HUD font is monospace; advance is a fixed fraction of the font size.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonoMeasurer;

impl MonoMeasurer {
    pub const ADVANCE: f32 = 0.6;
}

impl TextMeasurer for MonoMeasurer {
    fn measure(&self, text: &str, size: f32) -> f32 {
        text.chars().count() as f32 * size * Self::ADVANCE
    }
}

/// Greedy truncation: drop the last character and append an ellipsis until
/// the result fits. Text that already fits is returned unchanged.
pub fn truncate_to_fit(
    text: &str,
    max_width: f32,
    size: f32,
    measurer: &dyn TextMeasurer,
) -> String {
    if measurer.measure(text, size) <= max_width {
        return text.to_string();
    }

    let mut truncated: Vec<char> = text.chars().collect();
    while !truncated.is_empty() {
        let candidate: String = truncated.iter().collect::<String>() + "...";
        if measurer.measure(&candidate, size) <= max_width {
            return candidate;
        }
        truncated.pop();
    }
    "...".to_string()
}

// ── Surface ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("surface unavailable: {0}")]
    Unavailable(String),
    #[error("present failed: {0}")]
    Present(String),
}

/// Where frames go. A failed present abandons the frame; the render loop
/// logs and keeps ticking.
pub trait Surface: Send {
    fn present(&mut self, frame: &Frame) -> Result<(), SurfaceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_measurer_scales_with_char_count() {
        let m = MonoMeasurer;
        assert_eq!(m.measure("", 20.0), 0.0);
        assert_eq!(m.measure("abcd", 20.0), 4.0 * 20.0 * 0.6);
        // char count, not byte count
        assert_eq!(m.measure("°°", 10.0), 2.0 * 10.0 * 0.6);
    }

    #[test]
    fn truncate_returns_fitting_text_unchanged() {
        let m = MonoMeasurer;
        let text = "SHORT";
        let width = m.measure(text, 30.0);
        assert_eq!(truncate_to_fit(text, width, 30.0, &m), "SHORT");
    }

    #[test]
    fn truncate_appends_ellipsis_and_fits() {
        let m = MonoMeasurer;
        let text = "infiltrate the compound before dawn";
        for max in [120.0, 200.0, 350.0] {
            let out = truncate_to_fit(text, max, 30.0, &m);
            assert!(out.ends_with("..."), "got {out:?}");
            assert!(m.measure(&out, 30.0) <= max);
        }
    }

    #[test]
    fn clip_and_rotation_scopes_balance() {
        let mut frame = Frame::new();
        frame.with_clip(Rect::new(0.0, 0.0, 10.0, 10.0), |f| {
            f.with_rotation(45.0, 5.0, 5.0, |f| {
                f.fill_rect(Rect::new(1.0, 1.0, 2.0, 2.0), Brush::solid(Color::BLACK));
            });
        });

        let mut depth = 0i32;
        for cmd in frame.cmds() {
            match cmd {
                DrawCmd::PushClip { .. } | DrawCmd::PushRotate { .. } => depth += 1,
                DrawCmd::PopClip | DrawCmd::PopTransform => depth -= 1,
                _ => {}
            }
            assert!(depth >= 0);
        }
        assert_eq!(depth, 0);
    }

    #[test]
    fn rect_hit_test_includes_edges() {
        let r = Rect::new(10.0, 20.0, 120.0, 40.0);
        assert!(r.contains(10.0, 20.0));
        assert!(r.contains(130.0, 60.0));
        assert!(!r.contains(9.9, 30.0));
        assert!(!r.contains(50.0, 60.1));
    }
}
