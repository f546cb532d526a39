//! Process-wide throttle for outbound metadata-service calls.
//!
//! Enforces three limits at once: a cap on calls in flight, a minimum spacing
//! between call starts, and a quota of call starts per sliding time window.
//! Callers that exceed a limit wait; nothing is dropped.

use crate::server::metrics::record_throttle_wait;
use serde::Serialize;
use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::Instant;
use tracing::debug;

/// Configuration for [`RequestThrottle`].
#[derive(Debug, Clone, PartialEq)]
pub struct ThrottleSettings {
    /// When false every call runs immediately.
    pub enabled: bool,
    /// Maximum number of calls running at the same time.
    pub max_concurrent: usize,
    /// Minimum time between two consecutive call starts.
    pub min_interval: Duration,
    /// Maximum number of call starts within `window`.
    pub quota: usize,
    /// Length of the sliding quota window.
    pub window: Duration,
}

impl Default for ThrottleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_concurrent: 1,
            min_interval: Duration::from_millis(1000),
            quota: 60,
            window: Duration::from_secs(60),
        }
    }
}

/// Current throttle statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ThrottleStats {
    pub calls_in_window: usize,
    pub quota: usize,
    pub in_flight: usize,
    pub is_throttled: bool,
}

#[derive(Default)]
struct ThrottleState {
    /// Start times of calls still inside the quota window, oldest first.
    starts: VecDeque<Instant>,
    last_start: Option<Instant>,
}

pub struct RequestThrottle {
    permits: Semaphore,
    state: Mutex<ThrottleState>,
    settings: ThrottleSettings,
}

impl RequestThrottle {
    pub fn new(settings: ThrottleSettings) -> Self {
        let max_concurrent = settings.max_concurrent.max(1);
        Self {
            permits: Semaphore::new(max_concurrent),
            state: Mutex::new(ThrottleState::default()),
            settings: ThrottleSettings {
                max_concurrent,
                quota: settings.quota.max(1),
                ..settings
            },
        }
    }

    /// A throttle that never waits.
    pub fn unlimited() -> Self {
        Self::new(ThrottleSettings {
            enabled: false,
            ..Default::default()
        })
    }

    pub fn settings(&self) -> &ThrottleSettings {
        &self.settings
    }

    fn prune(starts: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while let Some(front) = starts.front() {
            if now.duration_since(*front) >= window {
                starts.pop_front();
            } else {
                break;
            }
        }
    }

    /// How long a call starting at `now` must still wait. Zero means go.
    fn required_wait(&self, state: &ThrottleState, now: Instant) -> Duration {
        let spacing_wait = state
            .last_start
            .map(|last| {
                self.settings
                    .min_interval
                    .saturating_sub(now.duration_since(last))
            })
            .unwrap_or(Duration::ZERO);

        let quota_wait = if state.starts.len() >= self.settings.quota {
            state
                .starts
                .front()
                .map(|oldest| (*oldest + self.settings.window).saturating_duration_since(now))
                .unwrap_or(Duration::ZERO)
        } else {
            Duration::ZERO
        };

        spacing_wait.max(quota_wait)
    }

    /// Waits until a new call may start and records its start time.
    async fn reserve_slot(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                Self::prune(&mut state.starts, now, self.settings.window);

                let wait = self.required_wait(&state, now);
                if wait.is_zero() {
                    state.starts.push_back(now);
                    state.last_start = Some(now);
                    return;
                }
                wait
            };

            debug!("Throttling outbound call for {:?}", wait);
            record_throttle_wait(wait);
            tokio::time::sleep(wait).await;
        }
    }

    /// Runs `call` once the throttle allows it. Calls queue in arrival order.
    pub async fn run<F, T>(&self, call: F) -> T
    where
        F: Future<Output = T>,
    {
        if !self.settings.enabled {
            return call.await;
        }

        // The semaphore is never closed, so acquiring only fails if that changes.
        let _permit = self.permits.acquire().await.ok();
        self.reserve_slot().await;
        call.await
    }

    pub async fn stats(&self) -> ThrottleStats {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        Self::prune(&mut state.starts, now, self.settings.window);

        let in_flight = self.settings.max_concurrent - self.permits.available_permits();
        ThrottleStats {
            calls_in_window: state.starts.len(),
            quota: self.settings.quota,
            in_flight,
            is_throttled: self.settings.enabled && !self.required_wait(&state, now).is_zero(),
        }
    }
}
