//! # compass
//!
//! Heading estimation from raw accelerometer + magnetometer vectors.
//!
//! The host pushes sensor samples through the engine event channel; this
//! module throttles them to one accepted sample per 100 ms (one shared clock
//! for both sensor kinds), rebuilds the rotation matrix from the
//! gravity/magnetic pair, and low-pass filters the resulting yaw along the
//! shortest arc so a 359° → 1° crossing never swings the needle through 180°.

use std::time::{Duration, Instant};

use tracing::trace;

/// Smoothing factor: 20% of each new reading folds into the display heading.
const SMOOTHING_ALPHA: f32 = 0.2;

/// Below this magnitude the horizontal component of the field is unusable
/// (freefall, or magnetic vector parallel to gravity).
const MIN_HORIZONTAL_NORM: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorKind {
    Accel,
    Magnetic,
}

pub struct HeadingEstimator {
    accel: [f32; 3],
    magnetic: [f32; 3],
    heading: f32,
    last_accepted: Option<Instant>,
    throttle: Duration,
}

impl HeadingEstimator {
    pub fn new(throttle: Duration) -> Self {
        Self {
            accel: [0.0; 3],
            magnetic: [0.0; 3],
            heading: 0.0,
            last_accepted: None,
            throttle,
        }
    }

    /// Smoothed display heading in [0, 360).
    pub fn current_heading(&self) -> f32 {
        self.heading
    }

    /// Feed one raw sensor vector. Samples arriving within the throttle
    /// window of the last accepted one (of either kind) are dropped.
    pub fn on_vector_sample(&mut self, kind: VectorKind, vector: [f32; 3], at: Instant) {
        if let Some(last) = self.last_accepted {
            if at.duration_since(last) < self.throttle {
                return;
            }
        }
        self.last_accepted = Some(at);

        match kind {
            VectorKind::Accel => self.accel = vector,
            VectorKind::Magnetic => self.magnetic = vector,
        }

        if is_zero(&self.accel) || is_zero(&self.magnetic) {
            return;
        }

        if let Some(raw) = yaw_degrees(self.accel, self.magnetic) {
            let delta = shortest_arc(raw - self.heading);
            self.heading = (self.heading + SMOOTHING_ALPHA * delta).rem_euclid(360.0);
            trace!(raw, heading = self.heading, "heading updated");
        }
    }
}

fn is_zero(v: &[f32; 3]) -> bool {
    v.iter().all(|c| *c == 0.0)
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn normalize(v: [f32; 3]) -> Option<[f32; 3]> {
    let n = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if n < MIN_HORIZONTAL_NORM {
        return None;
    }
    Some([v[0] / n, v[1] / n, v[2] / n])
}

/// Rotation-matrix yaw from a gravity/magnetic vector pair, in compass
/// degrees [0, 360). Returns None for degenerate geometry.
fn yaw_degrees(accel: [f32; 3], magnetic: [f32; 3]) -> Option<f32> {
    // East axis: field × gravity. Vanishes when the two are parallel.
    let h = normalize(cross(magnetic, accel))?;
    let a = normalize(accel)?;
    // Horizontal north axis completes the orthonormal frame.
    let m = cross(a, h);

    let yaw = h[1].atan2(m[1]).to_degrees();
    Some(yaw.rem_euclid(360.0))
}

/// Signed equivalent of `delta` in (-180, 180].
fn shortest_arc(delta: f32) -> f32 {
    (delta + 540.0).rem_euclid(360.0) - 180.0
}

/// Map a heading to its 8-point cardinal label. Sectors are 45° wide with
/// boundaries at 22.5° + 45k, closed on the lower bound (22.5° is NE).
pub fn cardinal_of(heading: f32) -> &'static str {
    const LABELS: [&'static str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    let h = heading.rem_euclid(360.0);
    let idx = (((h + 22.5) / 45.0).floor() as usize) % 8;
    LABELS[idx]
}
