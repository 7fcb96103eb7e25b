//! main.rs — HUD engine simulator entry point
//!
//! Runs the real render loop against fully synthetic collaborators:
//!   1. Sensor feeder: accelerometer + magnetometer samples at 50 Hz with a
//!      slowly rotating synthetic heading
//!   2. Weather: canned OpenWeatherMap-shaped documents with jittered values
//!   3. Missions: a feed file written to a temp path at startup
//!   4. Taps: one city-toggle tap halfway through the run
//!
//! All errors are logged and the run continues; the loop stops only when the
//! scripted duration elapses and the surface is torn down.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use rand::Rng;
use tokio::sync::mpsc;
use tracing::info;

use hud_engine::canvas::{Frame, MonoMeasurer, Surface, SurfaceError};
use hud_engine::clock::SystemClock;
use hud_engine::compass::VectorKind;
use hud_engine::config::{CityRecord, HudConfig};
use hud_engine::engine::{Collaborators, Event, HudEngine};
use hud_engine::layout::ViewGeometry;
use hud_engine::missions::{FileMissionSource, MissionSource};
use hud_engine::net::{FixedProbe, NetworkKind, NetworkStatus};
use hud_engine::scheduler::run_render_loop;
use hud_engine::touch::NoopHaptics;
use hud_engine::weather::{BoxFuture, WeatherDocs, WeatherError, WeatherFetcher};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "hud-sim", about = "Headless HUD engine exerciser")]
struct Args {
    /// Run length in seconds
    #[arg(long, default_value = "20")]
    duration: u64,
    /// Surface width in pixels
    #[arg(long, default_value = "1080")]
    width: u32,
    /// Surface height in pixels
    #[arg(long, default_value = "2280")]
    height: u32,
    /// Target frame rate
    #[arg(long, default_value = "60")]
    fps: u32,
    #[arg(long, value_enum, default_value = "sweep")]
    scenario: Scenario,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scenario {
    /// Heading sweeps a full circle, weather and missions healthy
    Sweep,
    /// Every weather fetch fails, exercising the offline banner path
    Offline,
    /// No mission feed file exists, exercising the placeholder path
    NoMissions,
}

// ── Synthetic collaborators ───────────────────────────────────────────────────

struct CountingSurface {
    frames: Arc<AtomicUsize>,
    commands: Arc<AtomicUsize>,
}

impl Surface for CountingSurface {
    fn present(&mut self, frame: &Frame) -> Result<(), SurfaceError> {
        self.frames.fetch_add(1, Ordering::SeqCst);
        self.commands.fetch_add(frame.cmds().len(), Ordering::SeqCst);
        Ok(())
    }
}

struct CannedWeather {
    fail: bool,
}

impl WeatherFetcher for CannedWeather {
    fn fetch(&self, city: CityRecord) -> BoxFuture<'_, Result<WeatherDocs, WeatherError>> {
        let fail = self.fail;
        Box::pin(async move {
            if fail {
                return Err(WeatherError::Fetch("scripted outage".to_string()));
            }
            let mut rng = rand::thread_rng();
            let temp: f64 = rng.gen_range(18.0..28.0);
            let wind: f64 = rng.gen_range(2.0..9.0);
            let conditions = serde_json::json!({
                "main": {
                    "temp": temp,
                    "feels_like": temp - 1.5,
                    "temp_min": temp - 4.0,
                    "temp_max": temp + 3.0,
                    "humidity": rng.gen_range(30..80),
                    "pressure": 1008.0 + rng.gen_range(-6.0..6.0),
                },
                "weather": [{ "main": "Clear" }],
                "wind": { "speed": wind, "deg": rng.gen_range(0.0..360.0) },
                "name": city.name,
            });
            let air_quality = serde_json::json!({
                "list": [{ "main": { "aqi": rng.gen_range(1..=3) } }]
            });
            Ok(WeatherDocs {
                conditions: conditions.to_string(),
                air_quality: air_quality.to_string(),
            })
        })
    }
}

fn write_mission_feed(now_ms: i64) -> anyhow::Result<PathBuf> {
    let path = std::env::temp_dir().join("hud_sim_tasks.json");
    let feed = serde_json::json!({
        "list_name": "Field Ops",
        "timestamp": now_ms,
        "tasks": [
            { "text": "Recalibrate perimeter sensors", "dueDate": now_ms + 3 * 3_600_000 },
            { "text": "Rotate uplink credentials", "dueDate": now_ms + 2 * 86_400_000,
              "hasSubtasks": true, "completedSubtasks": 1, "totalSubtasks": 4 },
            { "text": "Archive last week's sweep logs" },
            { "text": "Inventory check, depot B", "dueDate": now_ms + 9 * 86_400_000 },
        ],
    });
    std::fs::write(&path, serde_json::to_string_pretty(&feed)?)?;
    Ok(path)
}

// ── Scripted input tasks ──────────────────────────────────────────────────────

/// Feeds a rotating heading at 50 Hz. The synthetic field pair yields a yaw
/// that tracks `theta`, so the compass ribbon sweeps the full circle over the
/// run.
async fn feed_sensors(tx: mpsc::Sender<Event>, duration: Duration) {
    let start = Instant::now();
    let mut interval = tokio::time::interval(Duration::from_millis(20));
    while start.elapsed() < duration {
        interval.tick().await;
        let theta = (start.elapsed().as_secs_f32() / duration.as_secs_f32()) * 360.0;
        let rad = theta.to_radians();
        let at = Instant::now();
        let accel = Event::SensorSample {
            kind: VectorKind::Accel,
            vector: [0.0, 0.0, 9.81],
            at,
        };
        let mag = Event::SensorSample {
            kind: VectorKind::Magnetic,
            vector: [-rad.sin() * 30.0, rad.cos() * 30.0, -20.0],
            at,
        };
        if tx.send(accel).await.is_err() || tx.send(mag).await.is_err() {
            return;
        }
    }
}

/// One tap on the far half of the city toggle at the midpoint of the run.
async fn feed_taps(tx: mpsc::Sender<Event>, geom: ViewGeometry, duration: Duration) {
    tokio::time::sleep(duration / 2).await;
    let button = geom.city_toggle_rect();
    let _ = tx
        .send(Event::Tap {
            x: button.right() - 10.0,
            y: button.center_y(),
        })
        .await;
}

// ── Main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hud_sim=info,hud_engine=info".into()),
        )
        .init();

    let args = Args::parse();
    let duration = Duration::from_secs(args.duration);

    info!(
        "🛰  HUD simulator starting — {}x{} @ {} fps, {:?} scenario, {}s",
        args.width, args.height, args.fps, args.scenario, args.duration
    );

    let mut cfg = HudConfig::default();
    cfg.frame_delay = Duration::from_millis(1000 / args.fps.max(1) as u64);

    let mission_sources: Vec<Box<dyn MissionSource>> = match args.scenario {
        Scenario::NoMissions => vec![],
        _ => {
            let now_ms = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)?
                .as_millis() as i64;
            let path = write_mission_feed(now_ms)?;
            info!(path = %path.display(), "mission feed written");
            vec![Box::new(FileMissionSource::new("sim-feed", path))]
        }
    };

    let frames = Arc::new(AtomicUsize::new(0));
    let commands = Arc::new(AtomicUsize::new(0));

    let engine = HudEngine::new(
        &cfg,
        Collaborators {
            clock: Box::new(SystemClock),
            measurer: Box::new(MonoMeasurer),
            surface: Box::new(CountingSurface {
                frames: frames.clone(),
                commands: commands.clone(),
            }),
            haptics: Box::new(NoopHaptics),
            probe: Arc::new(FixedProbe(NetworkStatus {
                kind: NetworkKind::Wifi,
                wifi_signal: 85,
            })),
            fetcher: Box::new(CannedWeather {
                fail: args.scenario == Scenario::Offline,
            }),
            mission_sources,
        },
    );

    let (tx, rx) = mpsc::channel(256);
    let loop_task = tokio::spawn(run_render_loop(engine, rx, cfg.frame_delay));

    tx.send(Event::SurfaceChanged { width: args.width, height: args.height }).await?;
    tx.send(Event::VisibilityChanged(true)).await?;
    tx.send(Event::TaskFeedUpdated).await?;

    let geom = ViewGeometry::new(args.width, args.height);
    let sensor_task = tokio::spawn(feed_sensors(tx.clone(), duration));
    let tap_task = tokio::spawn(feed_taps(tx.clone(), geom, duration));

    tokio::time::sleep(duration).await;
    tx.send(Event::SurfaceDestroyed).await?;
    loop_task.await?;
    sensor_task.await?;
    tap_task.await?;

    let total_frames = frames.load(Ordering::SeqCst);
    let total_cmds = commands.load(Ordering::SeqCst);
    info!(
        "✅ run complete — {} frames in {}s ({:.1} fps), {} draw commands ({:.0}/frame)",
        total_frames,
        args.duration,
        total_frames as f64 / args.duration as f64,
        total_cmds,
        total_cmds as f64 / total_frames.max(1) as f64,
    );

    Ok(())
}
