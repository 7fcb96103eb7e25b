//! # config
//!
//! Engine configuration. Every knob has a hard-coded default matching the
//! shipped display behavior and can be overridden through `HUD_*` env vars.

use std::path::PathBuf;
use std::time::Duration;

/// A city the weather panel can be pointed at. Two fixed records are
/// compiled in; the toggle button switches between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CityRecord {
    /// Full name shown in the panel title
    pub name: &'static str,
    /// Three-letter code shown on the toggle button
    pub code: &'static str,
    pub lat: f64,
    pub lon: f64,
}

pub const CITIES: [CityRecord; 2] = [
    CityRecord { name: "Brampton", code: "BRM", lat: 43.7315, lon: -79.7624 },
    CityRecord { name: "Amritsar", code: "ASR", lat: 31.6340, lon: 74.8723 },
];

pub struct HudConfig {
    /// Delay between scheduled frames (default 16 ms ≈ 60 fps)
    pub frame_delay: Duration,
    /// Length of the boot overlay animation (default 3000 ms)
    pub boot_duration: Duration,
    /// Invisible-gap threshold that re-triggers the boot sequence (default 30 min)
    pub min_inactive: Duration,
    /// Weather snapshot age beyond which a refresh is issued (default 30 min)
    pub weather_refresh: Duration,
    /// Mission feed re-read interval (default 1 h)
    pub mission_reuse: Duration,
    /// Mission data older than this renders the outdated placeholder (default 24 h)
    pub mission_outdated: Duration,
    /// Minimum spacing between accepted sensor samples (default 100 ms)
    pub compass_throttle: Duration,
    /// OpenWeatherMap API key (HUD_WEATHER_API_KEY)
    pub weather_api_key: String,
    /// Mission feed files, tried in order; first readable one wins
    pub mission_paths: Vec<PathBuf>,
}

impl Default for HudConfig {
    fn default() -> Self {
        Self {
            frame_delay: Duration::from_millis(
                env_u64("HUD_FRAME_DELAY_MS", 16),
            ),
            boot_duration: Duration::from_millis(
                env_u64("HUD_BOOT_DURATION_MS", 3_000),
            ),
            min_inactive: Duration::from_secs(
                env_u64("HUD_MIN_INACTIVE_SECS", 30 * 60),
            ),
            weather_refresh: Duration::from_secs(
                env_u64("HUD_WEATHER_REFRESH_SECS", 30 * 60),
            ),
            mission_reuse: Duration::from_secs(
                env_u64("HUD_MISSION_REUSE_SECS", 60 * 60),
            ),
            mission_outdated: Duration::from_secs(
                env_u64("HUD_MISSION_OUTDATED_SECS", 24 * 60 * 60),
            ),
            compass_throttle: Duration::from_millis(
                env_u64("HUD_COMPASS_THROTTLE_MS", 100),
            ),
            weather_api_key: std::env::var("HUD_WEATHER_API_KEY")
                .unwrap_or_default(),
            mission_paths: mission_paths_from_env(),
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Provider export, direct feed file, legacy public-directory file.
/// HUD_MISSION_FILE prepends a path ahead of the defaults.
fn mission_paths_from_env() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(p) = std::env::var("HUD_MISSION_FILE") {
        paths.push(PathBuf::from(p));
    }
    paths.push(PathBuf::from("/var/lib/taskfeed/tasks_provider.json"));
    paths.push(PathBuf::from("/var/lib/taskfeed/wallpaper_tasks.json"));
    paths.push(PathBuf::from("/srv/public/documents/taskapp_wallpaper_data.json"));
    paths
}
