//! # weather
//!
//! OpenWeatherMap-backed weather cache.
//!
//! ## Architecture
//! The cache is shared between the render task (reads, refresh checks) and
//! short-lived fetch tasks (writes). An `AtomicBool` compare-exchange
//! guarantees at most one fetch in flight no matter how many frames ask for
//! one; the snapshot record is replaced wholesale under a single `RwLock`
//! write so readers never see a half-updated mix of two fetches.
//!
//! ## City switching
//! Fetches are tagged with the city index they were issued for. A completed
//! fetch whose tag no longer matches the current selection is discarded and
//! the in-flight task immediately re-fetches for the new city, so a slow
//! response for the old city can never overwrite the new city's panel.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::compass::cardinal_of;
use crate::config::{CityRecord, CITIES};

/// Banner text shown in the weather panel while fetches are failing.
pub const UPLINK_OFFLINE: &str = "WEATHER SATELLITE UPLINK OFFLINE";

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("malformed response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("missing field: {0}")]
    MissingField(&'static str),
}

/// The two raw JSON documents a fetch produces: current conditions and
/// air quality. Parsing stays in the engine so fetchers stay dumb pipes.
#[derive(Debug, Clone)]
pub struct WeatherDocs {
    pub conditions: String,
    pub air_quality: String,
}

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait WeatherFetcher: Send + Sync + 'static {
    fn fetch(&self, city: CityRecord) -> BoxFuture<'_, Result<WeatherDocs, WeatherError>>;
}

// ── Snapshot ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct WeatherSnapshot {
    pub temperature: i32,
    pub condition: String,
    pub feels_like: i32,
    pub temp_low: i32,
    pub temp_high: i32,
    pub wind_speed: i32,
    /// 8-point octant derived from wind.deg
    pub wind_direction: String,
    pub humidity: i32,
    pub pressure: f64,
    /// Air-quality index 1–5
    pub aqi: u8,
    pub fetched_at: Instant,
    pub location: String,
}

/// Parse the two provider documents into a snapshot. Field paths are fixed
/// by the OpenWeatherMap response shape.
pub fn parse_snapshot(
    docs: &WeatherDocs,
    location: &str,
) -> Result<WeatherSnapshot, WeatherError> {
    let w: Value = serde_json::from_str(&docs.conditions)?;
    let a: Value = serde_json::from_str(&docs.air_quality)?;

    let main = &w["main"];
    let condition = w["weather"][0]["main"]
        .as_str()
        .ok_or(WeatherError::MissingField("weather[0].main"))?
        .to_string();
    // wind.deg is absent in calm conditions; the provider documents 0 there.
    let wind_deg = w["wind"]["deg"].as_f64().unwrap_or(0.0);
    let aqi = a["list"][0]["main"]["aqi"]
        .as_i64()
        .ok_or(WeatherError::MissingField("list[0].main.aqi"))? as u8;

    Ok(WeatherSnapshot {
        temperature: req_f64(main, "temp", "main.temp")? as i32,
        condition,
        feels_like: req_f64(main, "feels_like", "main.feels_like")? as i32,
        temp_low: req_f64(main, "temp_min", "main.temp_min")? as i32,
        temp_high: req_f64(main, "temp_max", "main.temp_max")? as i32,
        wind_speed: req_f64(&w["wind"], "speed", "wind.speed")? as i32,
        wind_direction: wind_octant(wind_deg).to_string(),
        humidity: req_f64(main, "humidity", "main.humidity")? as i32,
        pressure: req_f64(main, "pressure", "main.pressure")?,
        aqi,
        fetched_at: Instant::now(),
        location: location.to_string(),
    })
}

fn req_f64(obj: &Value, key: &str, path: &'static str) -> Result<f64, WeatherError> {
    obj[key].as_f64().ok_or(WeatherError::MissingField(path))
}

/// Wind octant shares the compass sector table (22.5° + 45k boundaries).
pub fn wind_octant(degrees: f64) -> &'static str {
    cardinal_of(degrees as f32)
}

// ── Cache ─────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Inner {
    snapshot: Option<WeatherSnapshot>,
    last_error: Option<String>,
}

struct Shared {
    inner: RwLock<Inner>,
    in_flight: AtomicBool,
    selected: AtomicUsize,
    fetcher: Box<dyn WeatherFetcher>,
}

/// What the scene composer sees each frame.
#[derive(Debug, Clone, Default)]
pub struct WeatherReadout {
    pub snapshot: Option<WeatherSnapshot>,
    pub error: Option<String>,
    /// Whole minutes since the snapshot was fetched.
    pub age_minutes: Option<u64>,
}

#[derive(Clone)]
pub struct WeatherCache {
    shared: Arc<Shared>,
    refresh_window: Duration,
}

impl WeatherCache {
    pub fn new(fetcher: Box<dyn WeatherFetcher>, refresh_window: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: RwLock::new(Inner::default()),
                in_flight: AtomicBool::new(false),
                selected: AtomicUsize::new(0),
                fetcher,
            }),
            refresh_window,
        }
    }

    pub fn selected_city(&self) -> usize {
        self.shared.selected.load(Ordering::Acquire)
    }

    pub fn select_city(&self, idx: usize) {
        self.shared.selected.store(idx % CITIES.len(), Ordering::Release);
    }

    pub fn fetch_in_flight(&self) -> bool {
        self.shared.in_flight.load(Ordering::Acquire)
    }

    /// Per-frame refresh check: issues a fetch iff there is no snapshot yet
    /// or the one we have is older than the refresh window, and nothing is
    /// already in flight. Returns immediately; the fetch runs spawned.
    pub async fn ensure_fresh(&self) {
        let needs = {
            let inner = self.shared.inner.read().await;
            match &inner.snapshot {
                Some(s) => s.fetched_at.elapsed() > self.refresh_window,
                None => true,
            }
        };
        if needs {
            self.request_fetch();
        }
    }

    /// City switch path: bypasses the age gate. If a fetch is already in
    /// flight its result will be tag-checked and re-issued as needed.
    pub fn force_refresh(&self) {
        self.request_fetch();
    }

    pub async fn readout(&self) -> WeatherReadout {
        let inner = self.shared.inner.read().await;
        WeatherReadout {
            age_minutes: inner
                .snapshot
                .as_ref()
                .map(|s| s.fetched_at.elapsed().as_secs() / 60),
            snapshot: inner.snapshot.clone(),
            error: inner.last_error.clone(),
        }
    }

    fn request_fetch(&self) {
        let claimed = self
            .shared
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if !claimed {
            return;
        }

        let shared = self.shared.clone();
        tokio::spawn(async move {
            loop {
                let city_idx = shared.selected.load(Ordering::Acquire);
                let city = CITIES[city_idx];
                debug!(city = city.code, "fetching weather");
                let result = shared.fetcher.fetch(city).await;

                let mut inner = shared.inner.write().await;
                // Tag check happens under the write lock: a switch that lands
                // between the fetch completing and the lock being granted must
                // not record the old city's snapshot. Drop it and go again.
                if shared.selected.load(Ordering::Acquire) != city_idx {
                    debug!(city = city.code, "discarding fetch for deselected city");
                    continue;
                }
                match result.and_then(|docs| parse_snapshot(&docs, city.name)) {
                    Ok(snapshot) => {
                        info!(
                            city = city.code,
                            temp = snapshot.temperature,
                            aqi = snapshot.aqi,
                            "weather updated"
                        );
                        inner.snapshot = Some(snapshot);
                        inner.last_error = None;
                    }
                    Err(e) => {
                        warn!(city = city.code, error = %e, "weather fetch failed");
                        inner.last_error = Some(UPLINK_OFFLINE.to_string());
                    }
                }
                break;
            }
            shared.in_flight.store(false, Ordering::Release);
        });
    }
}

// ── HTTP fetcher ──────────────────────────────────────────────────────────────

/// Real OpenWeatherMap fetcher used by the binary wiring.
pub struct OpenWeatherFetcher {
    client: reqwest::Client,
    api_key: String,
}

impl OpenWeatherFetcher {
    pub fn new(api_key: String) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| WeatherError::Fetch(e.to_string()))?;
        Ok(Self { client, api_key })
    }

    async fn get_text(&self, url: String) -> Result<String, WeatherError> {
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WeatherError::Fetch(e.to_string()))?
            .error_for_status()
            .map_err(|e| WeatherError::Fetch(e.to_string()))?;
        resp.text().await.map_err(|e| WeatherError::Fetch(e.to_string()))
    }
}

impl WeatherFetcher for OpenWeatherFetcher {
    fn fetch(&self, city: CityRecord) -> BoxFuture<'_, Result<WeatherDocs, WeatherError>> {
        Box::pin(async move {
            let conditions = self
                .get_text(format!(
                    "https://api.openweathermap.org/data/2.5/weather?lat={}&lon={}&units=metric&appid={}",
                    city.lat, city.lon, self.api_key
                ))
                .await?;
            let air_quality = self
                .get_text(format!(
                    "https://api.openweathermap.org/data/2.5/air_pollution?lat={}&lon={}&appid={}",
                    city.lat, city.lon, self.api_key
                ))
                .await?;
            Ok(WeatherDocs { conditions, air_quality })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn sample_docs(temp: f64) -> WeatherDocs {
        WeatherDocs {
            conditions: format!(
                r#"{{"main":{{"temp":{temp},"feels_like":19.2,"temp_min":14.1,"temp_max":24.9,
                    "humidity":62,"pressure":1013.2}},
                    "weather":[{{"main":"Clear"}}],
                    "wind":{{"speed":12.7,"deg":200.0}}}}"#
            ),
            air_quality: r#"{"list":[{"main":{"aqi":2}}]}"#.to_string(),
        }
    }

    #[test]
    fn parse_extracts_fixed_fields() {
        let snap = parse_snapshot(&sample_docs(21.6), "Brampton").unwrap();
        assert_eq!(snap.temperature, 21);
        assert_eq!(snap.condition, "Clear");
        assert_eq!(snap.feels_like, 19);
        assert_eq!(snap.temp_low, 14);
        assert_eq!(snap.temp_high, 24);
        assert_eq!(snap.wind_speed, 12);
        // 200° falls in the S sector; SW starts at 202.5°.
        assert_eq!(snap.wind_direction, "S");
        assert_eq!(snap.humidity, 62);
        assert_eq!(snap.pressure, 1013.2);
        assert_eq!(snap.aqi, 2);
        assert_eq!(snap.location, "Brampton");
    }

    #[test]
    fn parse_missing_field_errors() {
        let docs = WeatherDocs {
            conditions: r#"{"main":{}}"#.to_string(),
            air_quality: r#"{"list":[{"main":{"aqi":1}}]}"#.to_string(),
        };
        match parse_snapshot(&docs, "X") {
            Err(WeatherError::MissingField(path)) => assert_eq!(path, "weather[0].main"),
            other => panic!("expected missing field, got {other:?}"),
        }
    }

    #[test]
    fn calm_wind_defaults_north() {
        let docs = WeatherDocs {
            conditions: r#"{"main":{"temp":1.0,"feels_like":1.0,"temp_min":1.0,"temp_max":1.0,
                "humidity":50,"pressure":1000.0},
                "weather":[{"main":"Mist"}],"wind":{"speed":0.0}}"#
                .to_string(),
            air_quality: r#"{"list":[{"main":{"aqi":1}}]}"#.to_string(),
        };
        let snap = parse_snapshot(&docs, "X").unwrap();
        assert_eq!(snap.wind_direction, "N");
    }

    #[test]
    fn octant_boundaries() {
        assert_eq!(wind_octant(0.0), "N");
        assert_eq!(wind_octant(22.5), "NE");
        assert_eq!(wind_octant(200.0), "S");
        assert_eq!(wind_octant(202.5), "SW");
        assert_eq!(wind_octant(337.5), "N");
        assert_eq!(wind_octant(292.5), "NW");
    }

    struct CountingFetcher {
        calls: Arc<AtomicUsize>,
        delay: Duration,
        fail_after: usize,
    }

    impl WeatherFetcher for CountingFetcher {
        fn fetch(&self, city: CityRecord) -> BoxFuture<'_, Result<WeatherDocs, WeatherError>> {
            let calls = self.calls.clone();
            let delay = self.delay;
            let fail_after = self.fail_after;
            Box::pin(async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                tokio::time::sleep(delay).await;
                if n > fail_after {
                    return Err(WeatherError::Fetch(format!("synthetic outage for {}", city.code)));
                }
                Ok(sample_docs(city.lat))
            })
        }
    }

    struct StalledFetcher {
        calls: Arc<AtomicUsize>,
    }

    impl WeatherFetcher for StalledFetcher {
        fn fetch(&self, _city: CityRecord) -> BoxFuture<'_, Result<WeatherDocs, WeatherError>> {
            let calls = self.calls.clone();
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                std::future::pending::<()>().await;
                unreachable!()
            })
        }
    }

    async fn wait_idle(cache: &WeatherCache) {
        while cache.fetch_in_flight() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn concurrent_refresh_checks_issue_one_fetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = WeatherCache::new(
            Box::new(StalledFetcher { calls: calls.clone() }),
            Duration::from_secs(1800),
        );

        cache.ensure_fresh().await;
        cache.ensure_fresh().await;
        cache.force_refresh();
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.fetch_in_flight());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn completed_fetch_populates_snapshot() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = WeatherCache::new(
            Box::new(CountingFetcher {
                calls: calls.clone(),
                delay: Duration::from_millis(50),
                fail_after: usize::MAX,
            }),
            Duration::from_secs(1800),
        );

        cache.ensure_fresh().await;
        wait_idle(&cache).await;

        let readout = cache.readout().await;
        let snap = readout.snapshot.unwrap();
        assert_eq!(snap.location, "Brampton");
        assert!(readout.error.is_none());
        assert_eq!(readout.age_minutes, Some(0));

        // Fresh snapshot: another check must not refetch.
        cache.ensure_fresh().await;
        wait_idle(&cache).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn mid_flight_city_switch_discards_stale_result() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = WeatherCache::new(
            Box::new(CountingFetcher {
                calls: calls.clone(),
                delay: Duration::from_millis(50),
                fail_after: usize::MAX,
            }),
            Duration::from_secs(1800),
        );

        cache.ensure_fresh().await;
        // Let the fetch task claim city 0 and start waiting on its response.
        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.select_city(1);
        wait_idle(&cache).await;

        let readout = cache.readout().await;
        assert_eq!(readout.snapshot.unwrap().location, "Amritsar");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn switch_landing_before_the_write_is_still_discarded() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = WeatherCache::new(
            Box::new(CountingFetcher {
                calls: calls.clone(),
                delay: Duration::from_millis(50),
                fail_after: usize::MAX,
            }),
            Duration::from_secs(1800),
        );

        cache.ensure_fresh().await;
        // Hold a read guard so the fetch task ends up parked on the write
        // lock with the city-0 response already in hand, then switch cities
        // before releasing it.
        let guard = cache.shared.inner.read().await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        cache.select_city(1);
        drop(guard);
        wait_idle(&cache).await;

        let readout = cache.readout().await;
        assert_eq!(readout.snapshot.unwrap().location, "Amritsar");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn failed_fetch_keeps_old_snapshot_and_flags_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = WeatherCache::new(
            Box::new(CountingFetcher {
                calls: calls.clone(),
                delay: Duration::from_millis(10),
                fail_after: 1,
            }),
            Duration::from_secs(1800),
        );

        cache.ensure_fresh().await;
        wait_idle(&cache).await;
        assert!(cache.readout().await.snapshot.is_some());

        cache.force_refresh();
        wait_idle(&cache).await;

        let readout = cache.readout().await;
        assert!(readout.snapshot.is_some(), "old snapshot must survive");
        assert_eq!(readout.error.as_deref(), Some(UPLINK_OFFLINE));
    }
}
