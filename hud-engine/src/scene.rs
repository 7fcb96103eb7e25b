//! # scene
//!
//! Scene composition: turns one frame's inputs (clock sample, heading,
//! network status, cache readouts, geometry) into a recorded [`Frame`].
//! Composition is pure — the same inputs always produce the same display
//! list — except for the boot/live state machine, which this module owns.
//!
//! ## Boot sequence
//! Visibility gained after more than the configured inactive gap (or for the
//! first time) enters `Booting`; every booting frame draws the four init
//! lines and returns early. Once the boot timer crosses its duration the
//! state flips to `Live` and that same frame renders the full scene.

use std::time::{Duration, Instant};

use tracing::info;

use crate::canvas::{
    truncate_to_fit, Align, BitmapId, Brush, Color, Frame, Rect, TextMeasurer,
};
use crate::clock::{to_12_hour, ClockSample};
use crate::compass::cardinal_of;
use crate::layout::{
    ViewGeometry, BOTTOM_BAR_HEIGHT, TOP_BAR_HEIGHT, TOP_MARGIN, WEATHER_TEXT_OFFSET_Y,
};
use crate::missions::{due_label, is_outdated, MissionList};
use crate::net::{signal_quality_text, NetworkStatus};
use crate::weather::WeatherReadout;

const BOOT_LINES: [&str; 4] = [
    "INITIALIZING FOURTH ECHELON SYSTEMS...",
    "ESTABLISHING SECURE UPLINK...",
    "CALIBRATING SENSORS...",
    "TACTICAL OVERVIEW ONLINE...",
];

#[derive(Debug, Clone, Copy)]
pub enum SceneState {
    Booting { since: Instant },
    Live,
}

/// Everything a frame is composed from. Gathered by the engine at the top of
/// each tick; immutable from then on.
pub struct FrameInputs<'a> {
    /// Monotonic frame time, drives the boot timer.
    pub now: Instant,
    /// Epoch ms, drives animation phases and due-date math.
    pub now_ms: i64,
    pub clock: ClockSample,
    pub heading: f32,
    pub network: NetworkStatus,
    pub weather: WeatherReadout,
    pub missions: Option<&'a MissionList>,
    pub selected_city: usize,
}

pub struct SceneComposer {
    state: SceneState,
    last_visible_at: Option<Instant>,
    boot_duration: Duration,
    min_inactive: Duration,
    mission_outdated: Duration,
}

impl SceneComposer {
    pub fn new(boot_duration: Duration, min_inactive: Duration, mission_outdated: Duration) -> Self {
        Self {
            state: SceneState::Live,
            last_visible_at: None,
            boot_duration,
            min_inactive,
            mission_outdated,
        }
    }

    /// Visibility gained: boot if the display has never been shown, or was
    /// hidden for longer than the inactive gap. A shorter gap resumes live.
    pub fn on_visibility_gained(&mut self, now: Instant) {
        let rebooting = match self.last_visible_at {
            Some(hidden_at) => now.duration_since(hidden_at) > self.min_inactive,
            None => true,
        };
        if rebooting {
            info!("entering boot sequence");
            self.state = SceneState::Booting { since: now };
        }
    }

    pub fn on_visibility_lost(&mut self, now: Instant) {
        self.last_visible_at = Some(now);
    }

    /// True while the boot overlay still has time left. Does not flip state;
    /// `compose` does that so the transition lands on a rendered frame.
    pub fn is_booting(&self, now: Instant) -> bool {
        match self.state {
            SceneState::Booting { since } => now.duration_since(since) < self.boot_duration,
            SceneState::Live => false,
        }
    }

    pub fn compose(
        &mut self,
        geom: &ViewGeometry,
        inputs: &FrameInputs<'_>,
        measurer: &dyn TextMeasurer,
    ) -> Frame {
        let mut frame = Frame::new();
        frame.fill_rect(
            Rect::new(0.0, 0.0, geom.width, geom.height),
            Brush::solid(Color::BACKGROUND),
        );

        if let SceneState::Booting { since } = self.state {
            let elapsed = inputs.now.duration_since(since);
            if elapsed < self.boot_duration {
                let progress = elapsed.as_secs_f32() / self.boot_duration.as_secs_f32();
                draw_boot_overlay(&mut frame, geom, progress);
                return frame;
            }
            info!("boot sequence complete, going live");
            self.state = SceneState::Live;
        }

        draw_parallax_background(&mut frame, geom, inputs.now_ms);
        draw_topo_layer(&mut frame, geom, inputs.now_ms);
        draw_grid_overlay(&mut frame, geom, inputs.now_ms);
        draw_top_bar(&mut frame, geom, &inputs.clock);
        draw_radar_dial(&mut frame, geom, &inputs.clock, inputs.now_ms);
        draw_weather_panel(&mut frame, geom, inputs, measurer);
        draw_compass_ribbon(&mut frame, geom, inputs.heading);
        self.draw_mission_panel(&mut frame, geom, inputs, measurer);
        draw_signal_hud(&mut frame, geom, inputs.network);
        draw_bottom_bar(&mut frame, geom);
        draw_corner_brackets(&mut frame, geom);
        draw_scanlines(&mut frame, geom, inputs.now_ms);
        frame
    }

    fn draw_mission_panel(
        &self,
        frame: &mut Frame,
        geom: &ViewGeometry,
        inputs: &FrameInputs<'_>,
        measurer: &dyn TextMeasurer,
    ) {
        let rect = geom.mission_panel_rect();
        let list = match inputs.missions {
            None => return draw_mission_placeholder(frame, rect, "No active missions"),
            Some(list) => list,
        };
        if is_outdated(list, inputs.now_ms, self.mission_outdated) {
            return draw_mission_placeholder(frame, rect, "Active Missions (data outdated)");
        }
        if list.tasks.is_empty() {
            return draw_mission_placeholder(frame, rect, "No active missions");
        }
        draw_mission_rows(frame, rect, list, inputs.now_ms, measurer);
    }
}

// ── Boot overlay ──────────────────────────────────────────────────────────────

fn draw_boot_overlay(frame: &mut Frame, geom: &ViewGeometry, progress: f32) {
    let fade = (200.0 * (1.0 - progress)) as u8;
    frame.fill_rect(
        Rect::new(0.0, 0.0, geom.width, geom.height),
        Brush::solid(Color::BLACK.with_alpha(fade)),
    );

    let shown = ((BOOT_LINES.len() as f32 * progress) as usize).max(1);
    let y_start = geom.center_y - 80.0;
    for (i, line) in BOOT_LINES.iter().enumerate().take(shown) {
        let alpha = (255.0 * (progress - i as f32 * 0.25).clamp(0.0, 1.0)) as u8;
        frame.text(
            *line,
            geom.center_x - 380.0,
            y_start + i as f32 * 60.0,
            42.0,
            Color::NEON_GREEN.with_alpha(alpha),
            Align::Left,
        );
    }
}

// ── Background layers ─────────────────────────────────────────────────────────

fn draw_parallax_background(frame: &mut Frame, geom: &ViewGeometry, now_ms: i64) {
    let t = now_ms as f64;
    let layer1 = ((t / 5000.0).sin() * 80.0) as f32;
    let layer2 = ((t / 3500.0).cos() * 120.0) as f32;
    let layer3 = ((t / 2000.0 + 2.0).sin() * 150.0) as f32;

    // Slow-panning base gradient
    frame.fill_rect(
        Rect::new(layer1 * 0.3, layer2 * 0.2, geom.width, geom.height),
        Brush::linear(
            (0.0, 0.0),
            (0.0, geom.height),
            Color::BACKGROUND,
            Color::SCREEN_DARK,
        ),
    );

    // Drifting diagonal texture wash
    frame.fill_rect(
        Rect::new(0.0, 0.0, geom.width, geom.height),
        Brush::Linear {
            start: (layer2, layer3),
            end: (geom.width + layer2, geom.height + layer3),
            stops: vec![
                (0.0, Color::NEON_GREEN.with_alpha(0x10)),
                (0.5, Color::TRANSPARENT),
                (1.0, Color::NEON_TEAL.with_alpha(0x10)),
            ],
        },
    );

    // Pulsing depth rings around the radar
    for i in 1..=3 {
        let radius = geom.radar_radius * 1.5 + i as f32 * 80.0;
        let pulse = ((t / 3000.0 + i as f64 * 0.8).sin() * 0.3 + 0.7) as f32;
        frame.stroke_circle(
            geom.center_x,
            geom.center_y,
            radius,
            Brush::solid(Color::NEON_GREEN.with_alpha((30.0 * pulse) as u8)),
            1.0,
        );
    }
}

fn draw_topo_layer(frame: &mut Frame, geom: &ViewGeometry, now_ms: i64) {
    let t = now_ms as f64;
    let off_x = ((t / 15000.0).sin() * 20.0) as f32;
    let off_y = ((t / 17000.0).cos() * 15.0) as f32;

    let w = geom.width * 1.5;
    let h = geom.height * 1.5;
    let dest = Rect::new(
        (geom.width - w) / 2.0 + off_x,
        (geom.height - h) / 2.0 + off_y,
        w,
        h,
    );
    let tint = Some(Color::NEON_GREEN.with_alpha(0x20));
    frame.blit(BitmapId::TopoMap, dest, tint, 30);
    // Second tiled copy so the drift never exposes a bare edge.
    frame.blit(
        BitmapId::TopoMap,
        Rect::new(dest.x + w, dest.y, w, h),
        tint,
        30,
    );
}

fn draw_grid_overlay(frame: &mut Frame, geom: &ViewGeometry, now_ms: i64) {
    let grid_size = 100.0f32;
    let grid_offset = ((now_ms % 30_000) as f32 / 30_000.0) * 60.0;
    let grid_brush = Brush::solid(Color::NEON_GREEN.with_alpha(15));

    let mut x = -(grid_offset % grid_size);
    while x < geom.width {
        frame.line(x, 0.0, x, geom.height, grid_brush.clone(), 1.0);
        x += grid_size;
    }
    let mut y = -(grid_offset % grid_size);
    while y < geom.height {
        frame.line(0.0, y, geom.width, y, grid_brush.clone(), 1.0);
        y += grid_size;
    }

    // 20 s cycle: 10 s top-to-bottom sweep, 10 s dark.
    let cycle_ms = now_ms % 20_000;
    if cycle_ms < 10_000 {
        let scan_y = (cycle_ms as f32 / 10_000.0) * geom.height;
        frame.line(
            0.0,
            scan_y,
            geom.width,
            scan_y,
            Brush::Linear {
                start: (0.0, scan_y),
                end: (geom.width, scan_y),
                stops: vec![
                    (0.0, Color::TRANSPARENT),
                    (0.5, Color::NEON_GREEN.with_alpha(40)),
                    (1.0, Color::TRANSPARENT),
                ],
            },
            1.5,
        );
    }
}

// ── Chrome ────────────────────────────────────────────────────────────────────

fn draw_panel(frame: &mut Frame, rect: Rect, with_rivets: bool) {
    frame.fill_round_rect(
        rect,
        8.0,
        Brush::linear(
            (rect.x, rect.y),
            (rect.x, rect.bottom()),
            Color::PANEL_LIGHT,
            Color::PANEL_DARK,
        ),
    );
    frame.stroke_round_rect(rect, 8.0, Brush::solid(Color::NEON_GREEN.with_alpha(50)), 1.0);

    if with_rivets {
        let r = 2.0;
        let inset = r + 4.0;
        let positions = [
            (rect.x + inset, rect.y + inset),
            (rect.right() - inset, rect.y + inset),
            (rect.x + inset, rect.bottom() - inset),
            (rect.right() - inset, rect.bottom() - inset),
        ];
        for (cx, cy) in positions {
            frame.fill_circle(
                cx,
                cy,
                r,
                Brush::radial((cx, cy), r, Color::METAL_LIGHT, Color::METAL_DARK),
            );
        }
    }
}

fn draw_top_bar(frame: &mut Frame, geom: &ViewGeometry, clock: &ClockSample) {
    frame.fill_rect(
        Rect::new(0.0, 0.0, geom.width, TOP_BAR_HEIGHT),
        Brush::linear((0.0, 0.0), (0.0, TOP_BAR_HEIGHT), Color::PANEL_DARK, Color::TRANSPARENT),
    );

    draw_panel(frame, Rect::new(24.0, 24.0 + TOP_MARGIN, 320.0, 72.0), true);
    frame.text(
        "● FOURTH ECHELON",
        50.0,
        50.0 + TOP_MARGIN,
        18.0,
        Color::NEON_GREEN,
        Align::Left,
    );
    frame.text(
        "STRATEGIC MISSION INTERFACE",
        50.0,
        70.0 + TOP_MARGIN,
        14.0,
        Color::NEON_TEAL,
        Align::Left,
    );

    let right_panel_w = 280.0;
    draw_panel(
        frame,
        Rect::new(geom.width - right_panel_w - 24.0, 24.0 + TOP_MARGIN, right_panel_w, 72.0),
        true,
    );

    let (hour12, am_pm) = to_12_hour(clock.hour);
    frame.text(
        format!("{:02}:{:02}:{:02} {}", hour12, clock.minute, clock.second, am_pm),
        geom.width - 40.0,
        55.0 + TOP_MARGIN,
        20.0,
        Color::NEON_GREEN,
        Align::Right,
    );
    frame.text(
        format!("{:02}/{:02}/{}", clock.day, clock.month, clock.year),
        geom.width - 40.0,
        75.0 + TOP_MARGIN,
        14.0,
        Color::NEON_TEAL,
        Align::Right,
    );
}

fn draw_bottom_bar(frame: &mut Frame, geom: &ViewGeometry) {
    let h = geom.height;
    frame.fill_rect(
        Rect::new(0.0, h - BOTTOM_BAR_HEIGHT, geom.width, BOTTOM_BAR_HEIGHT),
        Brush::linear((0.0, h - BOTTOM_BAR_HEIGHT), (0.0, h), Color::TRANSPARENT, Color::PANEL_DARK),
    );
    draw_panel(frame, Rect::new(24.0, h - 96.0, geom.width - 48.0, 72.0), true);

    frame.text("● SYSTEM OPERATIONAL", 50.0, h - 70.0, 14.0, Color::NEON_GREEN, Align::Left);
    frame.text(
        "LAT 38.8977° N / LONG 77.0365° W",
        50.0,
        h - 50.0,
        12.0,
        Color::NEON_TEAL,
        Align::Left,
    );
    frame.text(
        "SECURITY CLEARANCE",
        geom.width - 50.0,
        h - 70.0,
        12.0,
        Color::NEON_TEAL,
        Align::Right,
    );
    frame.text(
        "LEVEL 5 - CLASSIFIED",
        geom.width - 50.0,
        h - 50.0,
        14.0,
        Color::NEON_GREEN,
        Align::Right,
    );
}

fn draw_corner_brackets(frame: &mut Frame, geom: &ViewGeometry) {
    let size = 64.0;
    let brush = Brush::solid(Color::NEON_GREEN.with_alpha(100));
    let w = geom.width;
    let h = geom.height;

    frame.line(20.0, 20.0, 20.0, 20.0 + size, brush.clone(), 2.0);
    frame.line(20.0, 20.0, 20.0 + size, 20.0, brush.clone(), 2.0);
    frame.line(w - 20.0, 20.0, w - 20.0 - size, 20.0, brush.clone(), 2.0);
    frame.line(w - 20.0, 20.0, w - 20.0, 20.0 + size, brush.clone(), 2.0);
    frame.line(20.0, h - 20.0, 20.0, h - 20.0 - size, brush.clone(), 2.0);
    frame.line(20.0, h - 20.0, 20.0 + size, h - 20.0, brush.clone(), 2.0);
    frame.line(w - 20.0, h - 20.0, w - 20.0 - size, h - 20.0, brush.clone(), 2.0);
    frame.line(w - 20.0, h - 20.0, w - 20.0, h - 20.0 - size, brush, 2.0);

    for (cx, cy) in [(16.0, 16.0), (w - 16.0, 16.0), (16.0, h - 16.0), (w - 16.0, h - 16.0)] {
        frame.fill_circle(
            cx,
            cy,
            4.0,
            Brush::radial((cx, cy), 4.0, Color::METAL_LIGHT, Color::METAL_DARK),
        );
    }
}

fn draw_scanlines(frame: &mut Frame, geom: &ViewGeometry, now_ms: i64) {
    let spacing = 40.0f32;
    let brush = Brush::solid(Color::NEON_GREEN.with_alpha(2));
    let phase = ((now_ms / 200) % geom.height as i64) as f32;

    let mut y = phase;
    while y < geom.height {
        frame.fill_rect(Rect::new(0.0, y, geom.width, 2.0), brush.clone());
        y += spacing;
    }
    // Wrapped rows above the phase line keep coverage seamless.
    let mut y = phase - geom.height;
    while y < 0.0 {
        frame.fill_rect(Rect::new(0.0, y, geom.width, 2.0), brush.clone());
        y += spacing;
    }
}

// ── Radar dial ────────────────────────────────────────────────────────────────

fn draw_radar_dial(frame: &mut Frame, geom: &ViewGeometry, clock: &ClockSample, now_ms: i64) {
    let cx = geom.center_x;
    let cy = geom.center_y;
    let r = geom.radar_radius;

    let smooth_seconds = clock.second as f32 + clock.millisecond as f32 / 1000.0;
    let sweep_angle = smooth_seconds * 6.0;
    let minute_angle = clock.minute as f32 * 6.0;
    let hour_angle = (clock.hour % 12) as f32 * 30.0 + clock.minute as f32 * 0.5;

    // Mounting shadow
    frame.fill_circle_blurred(
        cx,
        cy,
        r + 48.0,
        Brush::radial((cx, cy), r + 48.0, Color::rgba(0, 0, 0, 0x60), Color::TRANSPARENT),
        20.0,
    );

    // Bezel, rim, recess, screen stack
    frame.fill_circle(
        cx,
        cy,
        r + 24.0,
        Brush::radial((cx * 0.7, cy * 0.7), r + 24.0, Color::PANEL_LIGHT, Color::BLACK),
    );
    frame.stroke_circle(cx, cy, r + 24.0, Brush::solid(Color::PANEL_LIGHT), 2.0);
    frame.fill_circle(
        cx,
        cy,
        r + 16.0,
        Brush::radial((cx * 0.8, cy * 0.8), r + 16.0, Color::RIM_LIGHT, Color::RIM_DARK),
    );

    // Engraved tick marks every 30°
    for i in 0..12 {
        let angle = i as f32 * 30.0;
        let rad = angle.to_radians();
        let tx = cx + rad.cos() * (r + 12.0);
        let ty = cy + rad.sin() * (r + 12.0);
        frame.with_rotation(angle, tx, ty, |f| {
            f.fill_rect(
                Rect::new(tx - 0.5, ty - 6.0, 1.0, 12.0),
                Brush::solid(Color::NEON_GREEN.with_alpha(80)),
            );
        });
    }

    frame.fill_circle(
        cx,
        cy,
        r + 8.0,
        Brush::linear(
            (cx - r - 8.0, cy - r - 8.0),
            (cx + r + 8.0, cy + r + 8.0),
            Color::METAL_DARK,
            Color::BLACK,
        ),
    );
    frame.stroke_circle(cx, cy, r + 8.0, Brush::solid(Color::NEON_GREEN.with_alpha(20)), 1.0);
    frame.fill_circle(
        cx,
        cy,
        r,
        Brush::radial((cx * 0.9, cy * 0.9), r, Color::NEON_GREEN.with_alpha(0x20), Color::SCREEN_DARK),
    );

    // Range rings at quarter radii
    for i in 1..=3 {
        frame.stroke_circle(
            cx,
            cy,
            r * i as f32 / 4.0,
            Brush::solid(Color::NEON_GREEN.with_alpha(60)),
            1.0,
        );
    }

    // Crosshair, faded toward the rim
    let cross = |start: (f32, f32), end: (f32, f32)| Brush::Linear {
        start,
        end,
        stops: vec![
            (0.0, Color::TRANSPARENT),
            (0.5, Color::NEON_GREEN.with_alpha(80)),
            (1.0, Color::TRANSPARENT),
        ],
    };
    frame.line(cx, cy - r, cx, cy + r, cross((cx, cy - r), (cx, cy + r)), 1.0);
    frame.line(cx - r, cy, cx + r, cy, cross((cx - r, cy), (cx + r, cy)), 1.0);

    // Rotating sweep wedge
    frame.with_rotation(sweep_angle, cx, cy, |f| {
        f.fill_circle(
            cx,
            cy,
            r,
            Brush::Sweep {
                center: (cx, cy),
                stops: vec![
                    (0.0, Color::TRANSPARENT),
                    (0.1, Color::NEON_GREEN.with_alpha(150)),
                    (0.2, Color::TRANSPARENT),
                ],
            },
        );
    });

    let pulse = ((now_ms as f64 / 500.0).sin() * 0.5 + 0.5) as f32;

    // Pulsing center
    frame.fill_circle(
        cx,
        cy,
        16.0 * pulse,
        Brush::solid(Color::NEON_GREEN.with_alpha((100.0 * pulse) as u8)),
    );
    frame.fill_circle(cx, cy, 8.0, Brush::solid(Color::NEON_GREEN.with_alpha(200)));

    // Hour blip: red dot at half radius
    let hour_rad = (hour_angle - 90.0).to_radians();
    let hx = cx + hour_rad.cos() * (r * 0.5);
    let hy = cy + hour_rad.sin() * (r * 0.5);
    frame.fill_circle(
        hx,
        hy,
        4.0 * (0.5 + pulse * 0.5),
        Brush::solid(Color::RED_ALERT.with_alpha((200.0 * pulse) as u8)),
    );
    frame.stroke_circle(
        hx,
        hy,
        12.0 * pulse,
        Brush::solid(Color::RED_ALERT.with_alpha((100.0 * pulse) as u8)),
        2.0,
    );

    // Minute blip: teal dot with ripple at three-quarter radius
    let min_rad = (minute_angle - 90.0).to_radians();
    let mx = cx + min_rad.cos() * (r * 0.75);
    let my = cy + min_rad.sin() * (r * 0.75);
    draw_animated_blip(frame, mx, my, pulse);

    // Glass glare
    frame.fill_circle(
        cx,
        cy,
        r,
        Brush::radial((cx * 0.7, cy * 0.7), r, Color::WHITE.with_alpha(0x10), Color::TRANSPARENT),
    );

    // Mounting screws on the cardinal axes
    for i in 0..4 {
        let rad = (i as f32 * 90.0).to_radians();
        draw_screw(frame, cx + rad.cos() * (r + 20.0), cy + rad.sin() * (r + 20.0));
    }
    // Brackets on the diagonals
    for i in 0..4 {
        let angle = 45.0 + i as f32 * 90.0;
        let rad = angle.to_radians();
        draw_mounting_bracket(frame, cx + rad.cos() * (r + 22.0), cy + rad.sin() * (r + 22.0), angle);
    }

    draw_label_panel(frame, cx, cy + r + 80.0, "TACTICAL OVERVIEW");
}

fn draw_animated_blip(frame: &mut Frame, x: f32, y: f32, pulse: f32) {
    frame.fill_circle(
        x,
        y,
        4.0 * (0.5 + pulse * 0.5),
        Brush::solid(Color::NEON_TEAL.with_alpha((200.0 * pulse) as u8)),
    );
    frame.stroke_circle(
        x,
        y,
        12.0 * pulse,
        Brush::solid(Color::NEON_TEAL.with_alpha((100.0 * pulse) as u8)),
        2.0,
    );
    frame.stroke_circle(
        x,
        y,
        20.0 * pulse,
        Brush::solid(Color::NEON_TEAL.with_alpha((50.0 * pulse) as u8)),
        1.0,
    );
}

fn draw_screw(frame: &mut Frame, x: f32, y: f32) {
    frame.fill_circle(x, y, 8.0, Brush::radial((x, y), 8.0, Color::METAL_LIGHT, Color::METAL_DARK));
    frame.with_rotation(45.0, x, y, |f| {
        f.line(x - 4.0, y, x + 4.0, y, Brush::solid(Color::BLACK), 1.5);
    });
    frame.stroke_circle(x, y, 8.0, Brush::solid(Color::PANEL_EDGE), 0.5);
}

fn draw_mounting_bracket(frame: &mut Frame, x: f32, y: f32, angle: f32) {
    frame.with_rotation(angle, x, y, |f| {
        let rect = Rect::new(x - 16.0, y - 2.0, 32.0, 4.0);
        f.fill_rect(
            rect,
            Brush::linear((x - 16.0, y), (x + 16.0, y), Color::PANEL_LIGHT, Color::PANEL_DARK),
        );
        f.stroke_rect(rect, Brush::solid(Color::METAL_DARK), 0.5);
    });
}

fn draw_label_panel(frame: &mut Frame, x: f32, y: f32, text: &str) {
    let rect = Rect::new(x - 100.0, y - 20.0, 200.0, 40.0);
    frame.fill_round_rect(
        rect,
        8.0,
        Brush::linear((rect.x, rect.y), (rect.right(), rect.bottom()), Color::PANEL_LIGHT, Color::PANEL_DARK),
    );
    frame.stroke_round_rect(rect, 8.0, Brush::solid(Color::NEON_GREEN.with_alpha(50)), 1.0);
    frame.text(text, x, y + 5.0, 14.0, Color::NEON_GREEN.with_alpha(200), Align::Center);
}

// ── Compass ribbon ────────────────────────────────────────────────────────────

const COMPASS_POINTS: [(&str, f32); 8] = [
    ("N", 0.0),
    ("NE", 45.0),
    ("E", 90.0),
    ("SE", 135.0),
    ("S", 180.0),
    ("SW", 225.0),
    ("W", 270.0),
    ("NW", 315.0),
];

fn draw_compass_ribbon(frame: &mut Frame, geom: &ViewGeometry, heading: f32) {
    let rect = geom.compass_rect();
    draw_panel(frame, rect, false);

    let inner = Rect::new(rect.x + 10.0, rect.y + 10.0, rect.w - 20.0, rect.h - 20.0);
    frame.fill_rect(inner, Brush::solid(Color::SCREEN_DARK.with_alpha(0xcc)));

    let pixels_per_degree = inner.w / 360.0;
    let cx = geom.center_x;

    frame.with_clip(inner, |f| {
        // Three repeats of the ring guarantee coverage across the wrap.
        for repeat in -1..=1 {
            for (label, base_angle) in COMPASS_POINTS {
                let relative = base_angle + repeat as f32 * 360.0 - heading;
                let x = cx + relative * pixels_per_degree;
                if x < rect.x - 60.0 || x > rect.right() + 60.0 {
                    continue;
                }

                let color = match label {
                    "N" => Color::RED_ALERT,
                    "E" | "S" | "W" => Color::NEON_GREEN,
                    _ => Color::NEON_TEAL,
                };
                let marker_h = if label.len() == 1 { 20.0 } else { 12.0 };
                f.fill_rect(
                    Rect::new(x - 1.0, rect.y + 15.0, 2.0, marker_h),
                    Brush::solid(color),
                );
                f.text(label, x, rect.y + 55.0, 16.0, color.with_alpha(200), Align::Center);
            }
        }
    });

    // Fixed center tick: the lubber line
    frame.line(
        cx,
        rect.y + 10.0,
        cx,
        rect.bottom() - 10.0,
        Brush::solid(Color::RED_ALERT),
        2.0,
    );

    // Digital readout
    draw_panel(frame, Rect::new(rect.right() + 20.0, rect.y + 20.0, 80.0, 40.0), true);
    frame.text(
        format!("{}°", heading as i32),
        rect.right() + 60.0,
        rect.y + 35.0,
        16.0,
        Color::NEON_GREEN,
        Align::Center,
    );
    frame.text(
        cardinal_of(heading),
        rect.right() + 60.0,
        rect.y + 52.0,
        12.0,
        Color::NEON_GREEN,
        Align::Center,
    );
}

// ── Weather panel ─────────────────────────────────────────────────────────────

fn draw_weather_panel(
    frame: &mut Frame,
    geom: &ViewGeometry,
    inputs: &FrameInputs<'_>,
    measurer: &dyn TextMeasurer,
) {
    let panel = geom.weather_panel_rect();
    draw_panel(frame, panel, true);

    // Shared with the toggle-button rect the touch router hit-tests.
    let text_offset_y = WEATHER_TEXT_OFFSET_Y;
    let city_name = inputs
        .weather
        .snapshot
        .as_ref()
        .map(|s| s.location.as_str())
        .unwrap_or("LOCAL");
    frame.text(
        format!("● WEATHER CONDITIONS: {city_name}"),
        panel.x + 20.0,
        panel.y + 30.0 + text_offset_y,
        32.0,
        Color::NEON_GREEN,
        Align::Left,
    );

    draw_city_toggle(frame, geom, inputs.selected_city);

    // Exactly one body: offline banner, loading placeholder, or the grid.
    if !inputs.network.is_connected() || inputs.weather.error.is_some() {
        frame.text(
            crate::weather::UPLINK_OFFLINE,
            panel.center_x(),
            panel.center_y(),
            20.0,
            Color::RED_ALERT,
            Align::Center,
        );
        frame.text(
            "No internet connection",
            panel.center_x(),
            panel.center_y() + 40.0,
            16.0,
            Color::HUD_TEXT,
            Align::Center,
        );
        return;
    }

    let snapshot = match &inputs.weather.snapshot {
        None => {
            frame.text(
                "Loading weather data...",
                panel.center_x(),
                panel.center_y(),
                20.0,
                Color::HUD_TEXT,
                Align::Center,
            );
            return;
        }
        Some(s) => s,
    };

    let updated = match inputs.weather.age_minutes {
        Some(minutes) => format!("{minutes}m ago"),
        None => "Just now".to_string(),
    };
    frame.text(
        format!("Src: OPWR | Upd: {updated}"),
        panel.right() - 30.0,
        panel.bottom() - 25.0,
        22.0,
        Color::NEON_TEAL,
        Align::Right,
    );

    let aqi_text = match snapshot.aqi {
        1 => "Good",
        2 => "Fair",
        3 => "Moderate",
        4 => "Poor",
        5 => "Very Poor",
        _ => "Unknown",
    };
    let aqi_color = match snapshot.aqi {
        4 | 5 => Color::RED_ALERT,
        3 => Color::AMBER,
        _ => Color::NEON_GREEN,
    };

    let column_w = panel.w / 2.0 - 60.0;
    let col1_x = panel.x + 40.0;
    let col2_x = panel.x + panel.w / 2.0 + 40.0;
    let line_spacing = (panel.h - 120.0) / 6.0;
    let start_y = panel.y + 100.0 + text_offset_y;

    let col1: [(&str, String); 5] = [
        ("Temp:", format!("{}°C", snapshot.temperature)),
        ("Sky:", snapshot.condition.clone()),
        ("Feel:", format!("{}°C", snapshot.feels_like)),
        ("Range:", format!("{}° / {}°", snapshot.temp_low, snapshot.temp_high)),
        ("Wind:", format!("{} {} km/h", snapshot.wind_direction, snapshot.wind_speed)),
    ];
    for (i, (label, value)) in col1.iter().enumerate() {
        draw_weather_field(
            frame,
            col1_x,
            start_y + i as f32 * line_spacing,
            column_w,
            label,
            value,
            Color::NEON_GREEN,
            measurer,
        );
    }

    let col2: [(&str, String, Color); 3] = [
        ("Humidity:", format!("{}%", snapshot.humidity), Color::NEON_GREEN),
        ("Pressure:", format!("{}mb", snapshot.pressure), Color::NEON_GREEN),
        ("AQI:", format!("{aqi_text}, {}", snapshot.aqi), aqi_color),
    ];
    for (i, (label, value, color)) in col2.iter().enumerate() {
        draw_weather_field(
            frame,
            col2_x,
            start_y + i as f32 * line_spacing,
            column_w,
            label,
            value,
            *color,
            measurer,
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_weather_field(
    frame: &mut Frame,
    x: f32,
    y: f32,
    column_w: f32,
    label: &str,
    value: &str,
    value_color: Color,
    measurer: &dyn TextMeasurer,
) {
    let label_size = 32.0;
    let value_size = 28.0;

    frame.text(label, x, y, label_size, Color::NEON_TEAL, Align::Left);

    let label_w = measurer.measure(label, label_size);
    let max_value_w = column_w - label_w - 16.0;
    let display = truncate_to_fit(value, max_value_w, value_size, measurer);
    frame.text(display, x + label_w + 8.0, y, value_size, value_color, Align::Left);
}

fn draw_city_toggle(frame: &mut Frame, geom: &ViewGeometry, selected: usize) {
    let rect = geom.city_toggle_rect();

    frame.fill_round_rect(
        rect,
        10.0,
        Brush::linear(
            (rect.x, rect.y),
            (rect.x, rect.bottom()),
            Color::PANEL_LIGHT.with_alpha(0xcc),
            Color::PANEL_DARK.with_alpha(0xcc),
        ),
    );
    frame.stroke_round_rect(rect, 10.0, Brush::solid(Color::NEON_TEAL.with_alpha(180)), 2.0);

    // Glow under the active half
    let half_w = rect.w / 2.0;
    let highlight = if selected == 0 {
        Rect::new(rect.x + 3.0, rect.y + 3.0, half_w - 6.0, rect.h - 6.0)
    } else {
        Rect::new(rect.x + half_w + 3.0, rect.y + 3.0, half_w - 6.0, rect.h - 6.0)
    };
    frame.fill_round_rect(highlight, 8.0, Brush::solid(Color::NEON_GREEN.with_alpha(40)));

    let active = Color::NEON_GREEN;
    let inactive = Color::NEON_TEAL.with_alpha(150);
    let text_y = rect.y + rect.h / 2.0 + 6.0;
    frame.text(
        crate::config::CITIES[0].code,
        rect.x + rect.w / 4.0,
        text_y,
        16.0,
        if selected == 0 { active } else { inactive },
        Align::Center,
    );
    frame.text(
        crate::config::CITIES[1].code,
        rect.x + 3.0 * rect.w / 4.0,
        text_y,
        16.0,
        if selected == 1 { active } else { inactive },
        Align::Center,
    );

    // Divider
    frame.fill_rect(
        Rect::new(rect.x + half_w - 0.75, rect.y + 8.0, 1.5, rect.h - 16.0),
        Brush::solid(Color::NEON_TEAL.with_alpha(100)),
    );

    // Active-side indicator
    let indicator_x = if selected == 0 {
        rect.x + rect.w / 4.0
    } else {
        rect.x + 3.0 * rect.w / 4.0
    };
    frame.text("▲", indicator_x, rect.bottom() - 2.0, 10.0, Color::NEON_GREEN, Align::Center);
}

// ── Mission panel ─────────────────────────────────────────────────────────────

fn draw_mission_placeholder(frame: &mut Frame, rect: Rect, message: &str) {
    draw_panel(frame, rect, true);
    frame.text(
        "● ACTIVE MISSIONS",
        rect.x + 20.0,
        rect.y + 35.0,
        32.0,
        Color::NEON_GREEN,
        Align::Left,
    );
    frame.text(
        message,
        rect.center_x(),
        rect.center_y(),
        26.0,
        Color::HUD_TEXT,
        Align::Center,
    );
}

fn draw_mission_rows(
    frame: &mut Frame,
    rect: Rect,
    list: &MissionList,
    now_ms: i64,
    measurer: &dyn TextMeasurer,
) {
    draw_panel(frame, rect, true);
    frame.text(
        "● ACTIVE MISSIONS",
        rect.x + 30.0,
        rect.y + 50.0,
        32.0,
        Color::NEON_GREEN,
        Align::Left,
    );

    let task_start_y = rect.y + 95.0;
    let task_spacing = 65.0;
    let task_text_size = 30.0;
    let available = rect.h - 125.0;
    let max_tasks = ((available / task_spacing) as usize).max(1);
    let shown = list.tasks.len().min(max_tasks);

    for (i, task) in list.tasks.iter().take(shown).enumerate() {
        let task_y = task_start_y + i as f32 * task_spacing;

        frame.text("▪", rect.x + 30.0, task_y, task_text_size, Color::NEON_TEAL, Align::Left);

        let max_text_w = rect.w - 180.0;
        let display = truncate_to_fit(&task.text, max_text_w, task_text_size, measurer);
        frame.text(display, rect.x + 65.0, task_y, task_text_size, Color::HUD_TEXT, Align::Left);

        if let Some(due_at) = task.due_at_ms {
            frame.text(
                due_label(due_at, now_ms),
                rect.right() - 30.0,
                task_y - 8.0,
                22.0,
                Color::RED_ALERT,
                Align::Right,
            );
        }

        if let Some((done, total)) = task.subtasks {
            frame.text(
                format!("({done}/{total})"),
                rect.x + 65.0,
                task_y + 24.0,
                11.0,
                Color::NEON_TEAL,
                Align::Left,
            );
        }
    }

    if list.tasks.len() > shown {
        let remaining = list.tasks.len() - shown;
        frame.text(
            format!("+{remaining} more missions..."),
            rect.right() - 20.0,
            rect.bottom() - 20.0,
            22.0,
            Color::NEON_TEAL,
            Align::Right,
        );
    }
}

// ── Signal HUD ────────────────────────────────────────────────────────────────

fn draw_signal_hud(frame: &mut Frame, geom: &ViewGeometry, network: NetworkStatus) {
    let panel_w = 200.0;
    let panel_h = 70.0;
    let x = geom.width - panel_w - 24.0;
    let start_y = geom.center_y - panel_h;

    let defense = Rect::new(x, start_y, panel_w, panel_h);
    let signal = Rect::new(x, start_y + panel_h + 12.0, panel_w, panel_h);

    // DEFENSE: green status dot, wifi signal percentage
    draw_panel(frame, defense, true);
    let dot_x = defense.x + 30.0;
    let dot_y = defense.center_y();
    frame.fill_circle(dot_x, dot_y, 20.0, Brush::solid(Color::NEON_GREEN.with_alpha(50)));
    frame.fill_circle(dot_x, dot_y, 16.0, Brush::solid(Color::NEON_GREEN.with_alpha(100)));
    frame.fill_circle(dot_x, dot_y, 8.0, Brush::solid(Color::NEON_GREEN));
    frame.text("DEFENSE", defense.x + 50.0, defense.y + 25.0, 12.0, Color::NEON_TEAL, Align::Left);
    frame.text(
        format!("{}%", network.wifi_signal),
        defense.x + 50.0,
        defense.y + 50.0,
        16.0,
        Color::NEON_GREEN,
        Align::Left,
    );

    // SIGNAL: concentric rings, quality bucket
    draw_panel(frame, signal, true);
    let ring_x = signal.x + 30.0;
    let ring_y = signal.center_y();
    frame.fill_circle(ring_x, ring_y, 20.0, Brush::solid(Color::NEON_TEAL.with_alpha(50)));
    frame.fill_circle(ring_x, ring_y, 16.0, Brush::solid(Color::NEON_TEAL.with_alpha(100)));
    for i in 1..=3 {
        frame.stroke_circle(
            ring_x,
            ring_y,
            4.0 + i as f32 * 2.0,
            Brush::solid(Color::NEON_TEAL),
            2.0,
        );
    }
    frame.text("SIGNAL", signal.x + 50.0, signal.y + 25.0, 12.0, Color::NEON_TEAL, Align::Left);
    frame.text(
        signal_quality_text(network.wifi_signal),
        signal.x + 50.0,
        signal.y + 50.0,
        16.0,
        Color::NEON_TEAL,
        Align::Left,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DrawCmd, MonoMeasurer};
    use crate::missions::Task;
    use crate::net::NetworkKind;
    use crate::weather::WeatherSnapshot;

    const DAY_MS: i64 = 86_400_000;

    fn composer() -> SceneComposer {
        SceneComposer::new(
            Duration::from_millis(3000),
            Duration::from_secs(1800),
            Duration::from_millis(DAY_MS as u64),
        )
    }

    fn geom() -> ViewGeometry {
        ViewGeometry::new(1080, 2280)
    }

    fn wifi() -> NetworkStatus {
        NetworkStatus { kind: NetworkKind::Wifi, wifi_signal: 85 }
    }

    fn clock_sample() -> ClockSample {
        ClockSample { hour: 14, minute: 30, second: 45, millisecond: 250, day: 30, month: 8, year: 2026 }
    }

    fn snapshot(temp: i32, aqi: u8) -> WeatherSnapshot {
        WeatherSnapshot {
            temperature: temp,
            condition: "Clear".to_string(),
            feels_like: temp - 2,
            temp_low: temp - 5,
            temp_high: temp + 3,
            wind_speed: 10,
            wind_direction: "NW".to_string(),
            humidity: 55,
            pressure: 1012.0,
            aqi,
            fetched_at: Instant::now(),
            location: "Brampton".to_string(),
        }
    }

    fn inputs_at<'a>(now: Instant, missions: Option<&'a MissionList>) -> FrameInputs<'a> {
        FrameInputs {
            now,
            now_ms: 1_756_500_000_000,
            clock: clock_sample(),
            heading: 135.0,
            network: wifi(),
            weather: WeatherReadout {
                snapshot: Some(snapshot(22, 1)),
                error: None,
                age_minutes: Some(3),
            },
            missions,
            selected_city: 0,
        }
    }

    fn texts(frame: &Frame) -> Vec<(String, Color)> {
        frame
            .cmds()
            .iter()
            .filter_map(|c| match c {
                DrawCmd::Text { text, color, .. } => Some((text.clone(), *color)),
                _ => None,
            })
            .collect()
    }

    fn has_text(frame: &Frame, needle: &str) -> bool {
        texts(frame).iter().any(|(t, _)| t.contains(needle))
    }

    #[test]
    fn first_visibility_boots() {
        let mut scene = composer();
        let t0 = Instant::now();
        scene.on_visibility_gained(t0);
        assert!(scene.is_booting(t0));

        let frame = scene.compose(&geom(), &inputs_at(t0 + Duration::from_millis(500), None), &MonoMeasurer);
        assert!(has_text(&frame, "INITIALIZING FOURTH ECHELON SYSTEMS..."));
        // Boot frames return early: no live layers.
        assert!(!has_text(&frame, "TACTICAL OVERVIEW"));
        assert!(!has_text(&frame, "ACTIVE MISSIONS"));
    }

    #[test]
    fn boot_flips_live_on_the_deadline_frame() {
        let mut scene = composer();
        let t0 = Instant::now();
        scene.on_visibility_gained(t0);

        let frame = scene.compose(&geom(), &inputs_at(t0 + Duration::from_millis(2999), None), &MonoMeasurer);
        assert!(!has_text(&frame, "TACTICAL OVERVIEW"));

        let frame = scene.compose(&geom(), &inputs_at(t0 + Duration::from_millis(3000), None), &MonoMeasurer);
        assert!(has_text(&frame, "TACTICAL OVERVIEW"), "deadline frame renders live");
        assert!(!scene.is_booting(t0 + Duration::from_millis(3000)));
    }

    #[test]
    fn boot_lines_reveal_with_progress() {
        let mut scene = composer();
        let t0 = Instant::now();
        scene.on_visibility_gained(t0);

        let early = scene.compose(&geom(), &inputs_at(t0 + Duration::from_millis(100), None), &MonoMeasurer);
        let late = scene.compose(&geom(), &inputs_at(t0 + Duration::from_millis(2900), None), &MonoMeasurer);
        assert!(texts(&early).len() < texts(&late).len());
        assert!(has_text(&late, "CALIBRATING SENSORS..."));
        // The reveal gate floors at 3 lines for progress < 1.0; the fourth
        // line never draws before the state flips live.
        assert!(!has_text(&late, "TACTICAL OVERVIEW ONLINE..."));
    }

    #[test]
    fn short_invisibility_resumes_without_boot() {
        let mut scene = composer();
        let t0 = Instant::now();
        scene.on_visibility_gained(t0);
        // Finish booting.
        scene.compose(&geom(), &inputs_at(t0 + Duration::from_secs(4), None), &MonoMeasurer);

        let hidden_at = t0 + Duration::from_secs(10);
        scene.on_visibility_lost(hidden_at);
        scene.on_visibility_gained(hidden_at + Duration::from_secs(29 * 60 + 59));
        assert!(!scene.is_booting(hidden_at + Duration::from_secs(29 * 60 + 59)));
    }

    #[test]
    fn long_invisibility_reboots() {
        let mut scene = composer();
        let t0 = Instant::now();
        scene.on_visibility_gained(t0);
        scene.compose(&geom(), &inputs_at(t0 + Duration::from_secs(4), None), &MonoMeasurer);

        let hidden_at = t0 + Duration::from_secs(10);
        scene.on_visibility_lost(hidden_at);
        let back = hidden_at + Duration::from_secs(30 * 60 + 1);
        scene.on_visibility_gained(back);
        assert!(scene.is_booting(back));
    }

    #[test]
    fn live_frame_is_deterministic_for_same_inputs() {
        let mut scene = composer();
        let t0 = Instant::now();
        scene.on_visibility_gained(t0);
        let now = t0 + Duration::from_secs(5);

        let a = scene.compose(&geom(), &inputs_at(now, None), &MonoMeasurer);
        let b = scene.compose(&geom(), &inputs_at(now, None), &MonoMeasurer);
        assert_eq!(a.cmds(), b.cmds());
    }

    fn live_scene() -> (SceneComposer, Instant) {
        let mut scene = composer();
        let t0 = Instant::now();
        scene.on_visibility_gained(t0);
        let now = t0 + Duration::from_secs(5);
        scene.compose(&geom(), &inputs_at(now, None), &MonoMeasurer);
        (scene, now)
    }

    #[test]
    fn weather_grid_renders_values_and_aqi_color() {
        let (mut scene, now) = live_scene();
        let frame = scene.compose(&geom(), &inputs_at(now, None), &MonoMeasurer);

        assert!(has_text(&frame, "22°C"));
        assert!(has_text(&frame, "Clear"));
        assert!(has_text(&frame, "● WEATHER CONDITIONS: Brampton"));
        assert!(has_text(&frame, "Src: OPWR | Upd: 3m ago"));
        assert!(!has_text(&frame, crate::weather::UPLINK_OFFLINE));
        assert!(!has_text(&frame, "Loading weather data..."));

        let aqi = texts(&frame).into_iter().find(|(t, _)| t == "Good, 1").unwrap();
        assert_eq!(aqi.1, Color::NEON_GREEN);
    }

    #[test]
    fn aqi_colors_follow_band() {
        let (mut scene, now) = live_scene();
        for (aqi, color) in [(2, Color::NEON_GREEN), (3, Color::AMBER), (4, Color::RED_ALERT), (5, Color::RED_ALERT)] {
            let mut inputs = inputs_at(now, None);
            inputs.weather.snapshot = Some(snapshot(20, aqi));
            let frame = scene.compose(&geom(), &inputs, &MonoMeasurer);
            let found = texts(&frame)
                .into_iter()
                .find(|(t, _)| t.ends_with(&format!(", {aqi}")))
                .unwrap();
            assert_eq!(found.1, color, "aqi {aqi}");
        }
    }

    #[test]
    fn weather_title_row_shares_the_toggle_offset() {
        let (mut scene, now) = live_scene();
        let frame = scene.compose(&geom(), &inputs_at(now, None), &MonoMeasurer);
        let panel = geom().weather_panel_rect();

        let title_y = frame
            .cmds()
            .iter()
            .find_map(|c| match c {
                DrawCmd::Text { text, y, .. } if text.starts_with("● WEATHER CONDITIONS") => {
                    Some(*y)
                }
                _ => None,
            })
            .expect("title row present");
        assert_eq!(title_y, panel.y + 30.0 + crate::layout::WEATHER_TEXT_OFFSET_Y);
        assert_eq!(geom().city_toggle_rect().y, panel.y + crate::layout::WEATHER_TEXT_OFFSET_Y);
    }

    #[test]
    fn disconnected_shows_offline_banner_only() {
        let (mut scene, now) = live_scene();
        let mut inputs = inputs_at(now, None);
        inputs.network = NetworkStatus::disconnected();
        let frame = scene.compose(&geom(), &inputs, &MonoMeasurer);

        assert!(has_text(&frame, crate::weather::UPLINK_OFFLINE));
        assert!(has_text(&frame, "No internet connection"));
        assert!(!has_text(&frame, "Temp:"));
        assert!(!has_text(&frame, "Loading weather data..."));
    }

    #[test]
    fn fetch_error_shows_banner_over_stale_snapshot() {
        let (mut scene, now) = live_scene();
        let mut inputs = inputs_at(now, None);
        inputs.weather.error = Some(crate::weather::UPLINK_OFFLINE.to_string());
        let frame = scene.compose(&geom(), &inputs, &MonoMeasurer);
        assert!(has_text(&frame, crate::weather::UPLINK_OFFLINE));
        assert!(!has_text(&frame, "Temp:"));
    }

    #[test]
    fn no_snapshot_shows_loading_placeholder() {
        let (mut scene, now) = live_scene();
        let mut inputs = inputs_at(now, None);
        inputs.weather = WeatherReadout::default();
        let frame = scene.compose(&geom(), &inputs, &MonoMeasurer);
        assert!(has_text(&frame, "Loading weather data..."));
        assert!(has_text(&frame, "● WEATHER CONDITIONS: LOCAL"));
        assert!(!has_text(&frame, crate::weather::UPLINK_OFFLINE));
    }

    fn mission_list(timestamp_ms: i64, n: usize) -> MissionList {
        MissionList {
            list_name: "Ops".to_string(),
            tasks: (0..n)
                .map(|i| Task {
                    text: format!("Task number {i} with a reasonably long description"),
                    due_at_ms: Some(timestamp_ms + 2 * DAY_MS),
                    subtasks: if i % 2 == 0 { Some((1, 3)) } else { None },
                })
                .collect(),
            timestamp_ms,
        }
    }

    #[test]
    fn missing_missions_render_placeholder() {
        let (mut scene, now) = live_scene();
        let frame = scene.compose(&geom(), &inputs_at(now, None), &MonoMeasurer);
        assert!(has_text(&frame, "No active missions"));
    }

    #[test]
    fn outdated_missions_render_outdated_placeholder() {
        let (mut scene, now) = live_scene();
        let inputs = inputs_at(now, None);
        let list = mission_list(inputs.now_ms - DAY_MS - 1, 3);
        let mut inputs = inputs_at(now, Some(&list));
        inputs.now_ms = list.timestamp_ms + DAY_MS + 1;
        let frame = scene.compose(&geom(), &inputs, &MonoMeasurer);
        assert!(has_text(&frame, "Active Missions (data outdated)"));
        assert!(!has_text(&frame, "Task number 0"));
    }

    #[test]
    fn exactly_day_old_missions_still_render() {
        let (mut scene, now) = live_scene();
        let base = inputs_at(now, None);
        let list = mission_list(base.now_ms - DAY_MS, 2);
        let inputs = inputs_at(now, Some(&list));
        let frame = scene.compose(&geom(), &inputs, &MonoMeasurer);
        assert!(has_text(&frame, "Task number 0"));
        assert!(!has_text(&frame, "(data outdated)"));
    }

    #[test]
    fn overflowing_tasks_get_count_footer() {
        let (mut scene, now) = live_scene();
        let base = inputs_at(now, None);
        let list = mission_list(base.now_ms, 40);
        let inputs = inputs_at(now, Some(&list));
        let frame = scene.compose(&geom(), &inputs, &MonoMeasurer);

        let footer = texts(&frame)
            .into_iter()
            .find(|(t, _)| t.ends_with("more missions..."))
            .expect("footer present");
        assert!(footer.0.starts_with('+'));
        // Row budget: floor((panel height - 125) / 65), min 1.
        let rect = geom().mission_panel_rect();
        let max_rows = (((rect.h - 125.0) / 65.0) as usize).max(1);
        let shown = texts(&frame).iter().filter(|(t, _)| t.starts_with("Task number")).count();
        assert_eq!(shown, max_rows);
        assert!(has_text(&frame, &format!("+{} more missions...", 40 - max_rows)));
    }

    #[test]
    fn long_task_text_is_truncated_to_fit() {
        let (mut scene, now) = live_scene();
        let base = inputs_at(now, None);
        let mut list = mission_list(base.now_ms, 1);
        list.tasks[0].text = "X".repeat(400);
        let inputs = inputs_at(now, Some(&list));
        let frame = scene.compose(&geom(), &inputs, &MonoMeasurer);

        let row = texts(&frame).into_iter().find(|(t, _)| t.starts_with('X')).unwrap();
        assert!(row.0.ends_with("..."));
        let max_w = geom().mission_panel_rect().w - 180.0;
        assert!(MonoMeasurer.measure(&row.0, 30.0) <= max_w);
    }

    #[test]
    fn signal_hud_shows_quality_bucket() {
        let (mut scene, now) = live_scene();
        let frame = scene.compose(&geom(), &inputs_at(now, None), &MonoMeasurer);
        assert!(has_text(&frame, "DEFENSE"));
        assert!(has_text(&frame, "85%"));
        assert!(has_text(&frame, "EXCELLENT"));
    }

    #[test]
    fn compass_ribbon_readout_matches_heading() {
        let (mut scene, now) = live_scene();
        let frame = scene.compose(&geom(), &inputs_at(now, None), &MonoMeasurer);
        assert!(has_text(&frame, "135°"));
        assert!(has_text(&frame, "SE"));
    }

    #[test]
    fn top_bar_formats_time_and_date() {
        let (mut scene, now) = live_scene();
        let frame = scene.compose(&geom(), &inputs_at(now, None), &MonoMeasurer);
        assert!(has_text(&frame, "02:30:45 PM"));
        assert!(has_text(&frame, "30/08/2026"));
    }
}
