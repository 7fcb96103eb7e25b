//! # engine
//!
//! Event dispatch and frame production. `HudEngine` owns every piece of
//! mutable display state; the scheduler drives it from a single task, so
//! handlers here are plain `&mut self` methods with no locking.
//!
//! No event and no collaborator failure terminates the loop. The only way
//! out is `SurfaceDestroyed`.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::canvas::{Surface, TextMeasurer};
use crate::clock::Clock;
use crate::compass::{HeadingEstimator, VectorKind};
use crate::config::{HudConfig, CITIES};
use crate::layout::ViewGeometry;
use crate::missions::{MissionCache, MissionSource};
use crate::net::{ConnectivityProbe, NetworkMonitor};
use crate::scene::{FrameInputs, SceneComposer};
use crate::touch::{route_tap, Haptics, TouchAction};
use crate::weather::{WeatherCache, WeatherFetcher, WeatherReadout};

/// Everything the host feeds into the engine, in arrival order.
#[derive(Debug, Clone)]
pub enum Event {
    SurfaceChanged { width: u32, height: u32 },
    VisibilityChanged(bool),
    SurfaceDestroyed,
    SensorSample { kind: VectorKind, vector: [f32; 3], at: Instant },
    ConnectivityChanged,
    TaskFeedUpdated,
    Tap { x: f32, y: f32 },
}

/// What the scheduler should do after an event is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Continue,
    VisibilityChanged(bool),
    /// Render one immediate out-of-band frame.
    RenderNow,
    Shutdown,
}

/// Host-provided collaborators, all behind traits so the simulator and the
/// tests can run the engine fully synthetic.
pub struct Collaborators {
    pub clock: Box<dyn Clock>,
    pub measurer: Box<dyn TextMeasurer>,
    pub surface: Box<dyn Surface>,
    pub haptics: Box<dyn Haptics>,
    pub probe: Arc<dyn ConnectivityProbe>,
    pub fetcher: Box<dyn WeatherFetcher>,
    pub mission_sources: Vec<Box<dyn MissionSource>>,
}

pub struct HudEngine {
    scene: SceneComposer,
    compass: HeadingEstimator,
    weather: WeatherCache,
    missions: MissionCache,
    network: NetworkMonitor,
    geometry: ViewGeometry,
    clock: Box<dyn Clock>,
    measurer: Box<dyn TextMeasurer>,
    surface: Box<dyn Surface>,
    haptics: Box<dyn Haptics>,
    frames_rendered: u64,
}

impl HudEngine {
    pub fn new(cfg: &HudConfig, parts: Collaborators) -> Self {
        Self {
            scene: SceneComposer::new(cfg.boot_duration, cfg.min_inactive, cfg.mission_outdated),
            compass: HeadingEstimator::new(cfg.compass_throttle),
            weather: WeatherCache::new(parts.fetcher, cfg.weather_refresh),
            missions: MissionCache::new(parts.mission_sources, cfg.mission_reuse),
            network: NetworkMonitor::new(parts.probe),
            geometry: ViewGeometry::new(1, 1),
            clock: parts.clock,
            measurer: parts.measurer,
            surface: parts.surface,
            haptics: parts.haptics,
            frames_rendered: 0,
        }
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn selected_city(&self) -> usize {
        self.weather.selected_city()
    }

    pub fn geometry(&self) -> ViewGeometry {
        self.geometry
    }

    pub fn handle_event(&mut self, event: Event, now: Instant) -> EventOutcome {
        match event {
            Event::SurfaceChanged { width, height } => {
                self.geometry = ViewGeometry::new(width, height);
                debug!(width, height, "surface changed");
                EventOutcome::Continue
            }
            Event::VisibilityChanged(true) => {
                self.scene.on_visibility_gained(now);
                EventOutcome::VisibilityChanged(true)
            }
            Event::VisibilityChanged(false) => {
                self.scene.on_visibility_lost(now);
                EventOutcome::VisibilityChanged(false)
            }
            Event::SurfaceDestroyed => {
                self.scene.on_visibility_lost(now);
                info!("surface destroyed, shutting down");
                EventOutcome::Shutdown
            }
            Event::SensorSample { kind, vector, at } => {
                self.compass.on_vector_sample(kind, vector, at);
                EventOutcome::Continue
            }
            Event::ConnectivityChanged => {
                self.network.refresh();
                EventOutcome::RenderNow
            }
            Event::TaskFeedUpdated => {
                debug!("task feed updated, invalidating mission cache");
                self.missions.invalidate();
                EventOutcome::RenderNow
            }
            Event::Tap { x, y } => self.handle_tap(x, y),
        }
    }

    fn handle_tap(&mut self, x: f32, y: f32) -> EventOutcome {
        match route_tap(&self.geometry, self.weather.selected_city(), x, y) {
            TouchAction::None => EventOutcome::Continue,
            TouchAction::SwitchCity(idx) => {
                info!(city = CITIES[idx].code, "city switched");
                self.weather.select_city(idx);
                self.weather.force_refresh();
                self.haptics.pulse(30);
                EventOutcome::RenderNow
            }
        }
    }

    /// Compose and present one frame. Booting frames skip the cache refresh
    /// checks; a failed present abandons the frame and keeps the loop alive.
    pub async fn render_frame(&mut self, now: Instant) {
        let booting = self.scene.is_booting(now);

        let (network, weather, missions) = if booting {
            (self.network.current(), WeatherReadout::default(), None)
        } else {
            let network = self.network.refresh();
            if network.is_connected() {
                self.weather.ensure_fresh().await;
            }
            let weather = self.weather.readout().await;
            let missions = self.missions.read().cloned();
            (network, weather, missions)
        };

        let inputs = FrameInputs {
            now,
            now_ms: self.clock.now_ms(),
            clock: self.clock.sample(),
            heading: self.compass.current_heading(),
            network,
            weather,
            missions: missions.as_ref(),
            selected_city: self.weather.selected_city(),
        };

        let frame = self.scene.compose(&self.geometry, &inputs, self.measurer.as_ref());
        self.frames_rendered += 1;

        if let Err(e) = self.surface.present(&frame) {
            warn!(error = %e, "present failed, frame abandoned");
        }
    }
}
