//! # hud-engine
//!
//! Headless render engine for the tactical HUD display: a clock-driven radar
//! dial, compass ribbon, live weather panel and mission task list composed
//! into a display list each frame and handed to a pluggable [`canvas::Surface`].
//!
//! ## Architecture
//! One Tokio task owns all mutable engine state and runs the frame loop
//! ([`scheduler::run_render_loop`]). Host integrations (sensors, connectivity,
//! touch, surface lifecycle) feed it through an mpsc [`engine::Event`] channel.
//! Weather fetches run as separate spawned tasks and publish back through the
//! cache's shared lock; everything else is single-owner, no locking.
//!
//! ## Invariants
//! - The render loop never terminates on its own: draw errors, fetch errors
//!   and missing data all degrade to placeholder states and keep ticking.
//! - No frames are produced while the surface is invisible.

pub mod canvas;
pub mod clock;
pub mod compass;
pub mod config;
pub mod engine;
pub mod layout;
pub mod missions;
pub mod net;
pub mod scene;
pub mod scheduler;
pub mod touch;
pub mod weather;
