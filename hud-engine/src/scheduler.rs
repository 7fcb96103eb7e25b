//! # scheduler
//!
//! The single render task. Owns the [`HudEngine`] and a channel of host
//! events, and interleaves the two with `select!`.
//!
//! ## Invariants
//! - While visible, the frame timer is re-armed relative to the end of the
//!   previous frame, never accumulated. A slow frame delays the next one
//!   instead of producing a burst of catch-up frames.
//! - While invisible, no timer is armed at all; the task parks on the event
//!   channel and wakes only for host input.
//! - `RenderNow` outcomes produce one immediate extra frame without
//!   disturbing the armed timer. They are ignored while invisible.

use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::info;

use crate::engine::{Event, EventOutcome, HudEngine};

/// Drives the engine until the surface is destroyed or the event channel
/// closes. Intended to run as its own spawned task.
pub async fn run_render_loop(
    mut engine: HudEngine,
    mut events: mpsc::Receiver<Event>,
    frame_delay: Duration,
) {
    info!(frame_delay_ms = frame_delay.as_millis() as u64, "render loop started");
    let mut visible = false;

    loop {
        if !visible {
            let Some(event) = events.recv().await else { break };
            match engine.handle_event(event, Instant::now()) {
                EventOutcome::VisibilityChanged(v) => visible = v,
                EventOutcome::Shutdown => break,
                EventOutcome::Continue | EventOutcome::RenderNow => {}
            }
            continue;
        }

        let sleep = tokio::time::sleep(frame_delay);
        tokio::pin!(sleep);

        // One armed timer per scheduled frame. Events that arrive before it
        // fires are handled without resetting it.
        loop {
            tokio::select! {
                _ = &mut sleep => {
                    engine.render_frame(Instant::now()).await;
                    break;
                }
                event = events.recv() => {
                    let Some(event) = event else { return };
                    match engine.handle_event(event, Instant::now()) {
                        EventOutcome::Continue => {}
                        EventOutcome::RenderNow => {
                            engine.render_frame(Instant::now()).await;
                        }
                        EventOutcome::VisibilityChanged(v) => {
                            visible = v;
                            if !v {
                                break;
                            }
                        }
                        EventOutcome::Shutdown => return,
                    }
                }
            }
        }
    }

    info!(frames = engine.frames_rendered(), "render loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::canvas::{Frame, MonoMeasurer, Surface, SurfaceError};
    use crate::clock::{Clock, ClockSample};
    use crate::config::{CityRecord, HudConfig};
    use crate::engine::Collaborators;
    use crate::net::{FixedProbe, NetworkStatus};
    use crate::touch::NoopHaptics;
    use crate::weather::{BoxFuture, WeatherDocs, WeatherError, WeatherFetcher};

    struct CountingSurface(Arc<AtomicUsize>);

    impl Surface for CountingSurface {
        fn present(&mut self, _frame: &Frame) -> Result<(), SurfaceError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FixedClock;

    impl Clock for FixedClock {
        fn sample(&self) -> ClockSample {
            ClockSample { hour: 12, minute: 0, second: 0, millisecond: 0, day: 1, month: 6, year: 2026 }
        }
        fn now_ms(&self) -> i64 {
            1_780_000_000_000
        }
    }

    struct OfflineFetcher;

    impl WeatherFetcher for OfflineFetcher {
        fn fetch(&self, _city: CityRecord) -> BoxFuture<'_, Result<WeatherDocs, WeatherError>> {
            Box::pin(async { Err(WeatherError::Fetch("unreachable".to_string())) })
        }
    }

    fn engine(frames: Arc<AtomicUsize>) -> HudEngine {
        let cfg = HudConfig::default();
        HudEngine::new(
            &cfg,
            Collaborators {
                clock: Box::new(FixedClock),
                measurer: Box::new(MonoMeasurer),
                surface: Box::new(CountingSurface(frames)),
                haptics: Box::new(NoopHaptics),
                probe: Arc::new(FixedProbe(NetworkStatus::disconnected())),
                fetcher: Box::new(OfflineFetcher),
                mission_sources: vec![],
            },
        )
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn frames_flow_only_while_visible() {
        let frames = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel(64);
        let task = tokio::spawn(run_render_loop(engine(frames.clone()), rx, Duration::from_millis(16)));

        tx.send(Event::SurfaceChanged { width: 1080, height: 2280 }).await.unwrap();
        // Invisible: time passes, no frames.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(frames.load(Ordering::SeqCst), 0);

        tx.send(Event::VisibilityChanged(true)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(160)).await;
        let while_visible = frames.load(Ordering::SeqCst);
        assert!(while_visible >= 8, "expected ~10 frames, got {while_visible}");

        tx.send(Event::VisibilityChanged(false)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
        let at_hide = frames.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(frames.load(Ordering::SeqCst), at_hide);

        tx.send(Event::SurfaceDestroyed).await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn render_now_produces_an_extra_frame_between_ticks() {
        let frames = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel(64);
        let task = tokio::spawn(run_render_loop(engine(frames.clone()), rx, Duration::from_secs(1)));

        tx.send(Event::SurfaceChanged { width: 1080, height: 2280 }).await.unwrap();
        tx.send(Event::VisibilityChanged(true)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(frames.load(Ordering::SeqCst), 0);

        // Connectivity change requests an out-of-band frame well before the
        // one-second timer fires.
        tx.send(Event::ConnectivityChanged).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(frames.load(Ordering::SeqCst), 1);

        tx.send(Event::SurfaceDestroyed).await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn render_now_is_ignored_while_invisible() {
        let frames = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel(64);
        let task = tokio::spawn(run_render_loop(engine(frames.clone()), rx, Duration::from_millis(16)));

        tx.send(Event::SurfaceChanged { width: 1080, height: 2280 }).await.unwrap();
        tx.send(Event::TaskFeedUpdated).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(frames.load(Ordering::SeqCst), 0);

        drop(tx);
        task.await.unwrap();
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn channel_close_stops_the_loop() {
        let frames = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel(4);
        let task = tokio::spawn(run_render_loop(engine(frames), rx, Duration::from_millis(16)));

        tx.send(Event::VisibilityChanged(true)).await.unwrap();
        drop(tx);
        task.await.unwrap();
    }
}
