//! # net
//!
//! Connectivity monitoring. The probe is a trait so the simulator and tests
//! can script transport changes; the real binary wires in whatever the host
//! platform exposes. A probe failure degrades to Disconnected, it never
//! becomes an error the render loop has to care about.

use std::sync::Arc;

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkKind {
    Wifi,
    Mobile,
    Other,
    Disconnected,
}

impl NetworkKind {
    pub fn label(&self) -> &'static str {
        match self {
            NetworkKind::Wifi => "WIFI",
            NetworkKind::Mobile => "MOBILE",
            NetworkKind::Other => "OTHER",
            NetworkKind::Disconnected => "DISCONNECTED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkStatus {
    pub kind: NetworkKind,
    /// Wifi signal level 0–100; zero for non-wifi transports.
    pub wifi_signal: u8,
}

impl NetworkStatus {
    pub fn disconnected() -> Self {
        Self { kind: NetworkKind::Disconnected, wifi_signal: 0 }
    }

    pub fn is_connected(&self) -> bool {
        self.kind != NetworkKind::Disconnected
    }
}

pub trait ConnectivityProbe: Send + Sync {
    /// Current transport and signal level. Implementations report
    /// Disconnected on any internal failure rather than erroring.
    fn status(&self) -> NetworkStatus;
}

/// Probe with a fixed answer, for the simulator and for hosts without a
/// queryable network stack.
pub struct FixedProbe(pub NetworkStatus);

impl ConnectivityProbe for FixedProbe {
    fn status(&self) -> NetworkStatus {
        self.0
    }
}

/// Polls the probe on demand and keeps the last answer for the scene.
pub struct NetworkMonitor {
    probe: Arc<dyn ConnectivityProbe>,
    current: NetworkStatus,
}

impl NetworkMonitor {
    pub fn new(probe: Arc<dyn ConnectivityProbe>) -> Self {
        let current = probe.status();
        Self { probe, current }
    }

    pub fn current(&self) -> NetworkStatus {
        self.current
    }

    /// Re-query the probe; called per frame and on connectivity-changed
    /// events from the host.
    pub fn refresh(&mut self) -> NetworkStatus {
        let status = self.probe.status();
        if status != self.current {
            debug!(kind = status.kind.label(), signal = status.wifi_signal, "network changed");
        }
        self.current = status;
        status
    }
}

/// Signal-strength bucket shown in the SIGNAL HUD panel.
pub fn signal_quality_text(strength: u8) -> &'static str {
    match strength {
        80..=u8::MAX => "EXCELLENT",
        60..=79 => "STRONG",
        40..=59 => "GOOD",
        20..=39 => "WEAK",
        _ => "OFFLINE",
    }
}
