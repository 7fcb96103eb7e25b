//! # clock
//!
//! Wall-clock sampling. The scene is a pure function of a [`ClockSample`]
//! taken once at the top of each frame, so a frame never sees the second
//! roll over mid-draw.

use chrono::{Datelike, Local, Timelike, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSample {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub millisecond: u32,
    pub day: u32,
    pub month: u32,
    pub year: i32,
}

pub trait Clock: Send {
    fn sample(&self) -> ClockSample;
    /// Epoch milliseconds, used for animation phases and due-date math.
    fn now_ms(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn sample(&self) -> ClockSample {
        let now = Local::now();
        ClockSample {
            hour: now.hour(),
            minute: now.minute(),
            second: now.second(),
            millisecond: now.timestamp_subsec_millis(),
            day: now.day(),
            month: now.month(),
            year: now.year(),
        }
    }

    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// 24-hour to 12-hour conversion for the top bar readout.
pub fn to_12_hour(hour24: u32) -> (u32, &'static str) {
    match hour24 {
        0 => (12, "AM"),
        h if h < 12 => (h, "AM"),
        12 => (12, "PM"),
        h => (h - 12, "PM"),
    }
}
