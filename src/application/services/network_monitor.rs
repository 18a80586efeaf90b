//! Network reachability monitor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::entities::NetworkState;
use crate::domain::gateways::ConnectivityProbe;

/// Shared, injectable holder of the online/offline flag.
///
/// The flag is advisory: readers must tolerate a stale `Online` reading that
/// causes one avoidable upstream call. It changes in exactly two ways:
///
/// - a probe, run at most once per cooldown window (or explicitly)
/// - a pessimistic downgrade via [`NetworkMonitor::mark_offline`] when any
///   component sees an upstream call fail
///
/// A downgrade takes effect for every following request immediately; it is
/// lifted only by the next successful probe.
pub struct NetworkMonitor {
    probe: Arc<dyn ConnectivityProbe>,
    cooldown: Duration,
    online: AtomicBool,
    last_probe: Mutex<Option<Instant>>,
}

impl NetworkMonitor {
    /// Creates a monitor that assumes `Online` until told otherwise.
    pub fn new(probe: Arc<dyn ConnectivityProbe>, cooldown: Duration) -> Self {
        Self {
            probe,
            cooldown,
            online: AtomicBool::new(true),
            last_probe: Mutex::new(None),
        }
    }

    /// Current state without probing.
    pub fn state(&self) -> NetworkState {
        NetworkState::from_online(self.online.load(Ordering::Acquire))
    }

    /// Runs the reachability check now, regardless of the cooldown.
    pub async fn probe(&self) -> NetworkState {
        self.record_probe_time();
        self.run_probe().await
    }

    /// Returns whether the network is believed reachable.
    ///
    /// Re-probes first if the cooldown has elapsed since the last probe.
    pub async fn is_available(&self) -> bool {
        self.refresh_if_due().await.is_online()
    }

    /// Probes if the cooldown has elapsed, otherwise returns the current state.
    ///
    /// Only one of several concurrent callers wins the probe slot; the others
    /// read the state as it stands.
    pub async fn refresh_if_due(&self) -> NetworkState {
        if self.claim_probe_slot() {
            self.run_probe().await
        } else {
            self.state()
        }
    }

    /// Pessimistically flips the state to `Offline`.
    ///
    /// Does not touch the probe timestamp: the next scheduled probe still runs
    /// on time and may bring the state back.
    pub fn mark_offline(&self, reason: &str) {
        if self.online.swap(false, Ordering::AcqRel) {
            warn!(reason, "Network marked offline");
            metrics::counter!("network_state_transitions_total", "to" => "offline").increment(1);
        }
    }

    /// Time since the last probe, if one has run.
    pub fn last_probe_age(&self) -> Option<Duration> {
        self.lock_last_probe().map(|at| at.elapsed())
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    async fn run_probe(&self) -> NetworkState {
        let online = match self.probe.check().await {
            Ok(()) => true,
            Err(e) => {
                debug!("Probe failed: {}", e);
                false
            }
        };

        let was_online = self.online.swap(online, Ordering::AcqRel);
        if was_online != online {
            let state = NetworkState::from_online(online);
            info!(%state, "Network state changed");
            metrics::counter!("network_state_transitions_total", "to" => state.as_str())
                .increment(1);
        }

        NetworkState::from_online(online)
    }

    fn claim_probe_slot(&self) -> bool {
        let mut last = self
            .last_probe
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let due = last.is_none_or(|at| at.elapsed() >= self.cooldown);
        if due {
            *last = Some(Instant::now());
        }
        due
    }

    fn record_probe_time(&self) {
        let mut last = self
            .last_probe
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *last = Some(Instant::now());
    }

    fn lock_last_probe(&self) -> Option<Instant> {
        *self
            .last_probe
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
