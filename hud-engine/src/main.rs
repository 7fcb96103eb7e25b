use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use hud_engine::canvas::{Frame, MonoMeasurer, Surface, SurfaceError};
use hud_engine::clock::SystemClock;
use hud_engine::config::HudConfig;
use hud_engine::engine::{Collaborators, Event, HudEngine};
use hud_engine::missions::FileMissionSource;
use hud_engine::net::{FixedProbe, NetworkKind, NetworkStatus};
use hud_engine::scheduler::run_render_loop;
use hud_engine::touch::NoopHaptics;
use hud_engine::weather::OpenWeatherFetcher;

// ─── Headless Surface ─────────────────────────────────────────────────────────

/// Discards frames after logging a heartbeat. A real host replaces this with
/// a surface that rasterises the display list.
struct LogSurface {
    frames: u64,
}

impl Surface for LogSurface {
    fn present(&mut self, frame: &Frame) -> Result<(), SurfaceError> {
        self.frames += 1;
        if self.frames % 600 == 0 {
            debug!(frames = self.frames, commands = frame.cmds().len(), "presented");
        }
        Ok(())
    }
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hud_engine=info".into()),
        )
        .init();

    info!("📡 HUD Display Engine starting...");

    let cfg = HudConfig::default();
    if cfg.weather_api_key.is_empty() {
        warn!("HUD_WEATHER_API_KEY not set, weather uplink will stay offline");
    }

    let fetcher = OpenWeatherFetcher::new(cfg.weather_api_key.clone())?;
    let mission_sources = cfg
        .mission_paths
        .iter()
        .map(|p| {
            Box::new(FileMissionSource::new(p.display().to_string(), p.clone()))
                as Box<dyn hud_engine::missions::MissionSource>
        })
        .collect();

    let engine = HudEngine::new(
        &cfg,
        Collaborators {
            clock: Box::new(SystemClock),
            measurer: Box::new(MonoMeasurer),
            surface: Box::new(LogSurface { frames: 0 }),
            haptics: Box::new(NoopHaptics),
            probe: Arc::new(FixedProbe(NetworkStatus {
                kind: NetworkKind::Wifi,
                wifi_signal: 85,
            })),
            fetcher: Box::new(fetcher),
            mission_sources,
        },
    );

    let frame_delay = cfg.frame_delay;
    let (tx, rx) = mpsc::channel(256);
    let loop_task = tokio::spawn(run_render_loop(engine, rx, frame_delay));

    let width = env_u32("HUD_SURFACE_WIDTH", 1080);
    let height = env_u32("HUD_SURFACE_HEIGHT", 2280);
    tx.send(Event::SurfaceChanged { width, height }).await?;
    tx.send(Event::VisibilityChanged(true)).await?;
    info!(width, height, "🚀 surface up, rendering");

    tokio::signal::ctrl_c().await?;
    info!("signal received, tearing down surface");
    tx.send(Event::SurfaceDestroyed).await?;
    loop_task.await?;

    Ok(())
}
