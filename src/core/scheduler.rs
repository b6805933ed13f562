// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Timer that drives the housekeeping tick

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::{Housekeeping, TickOutcome};

/// Clears the busy flag when the tick task finishes, even on panic.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs [`Housekeeping::tick`] on a fixed period.
///
/// Each tick runs on its own task. With `skip_if_busy` a tick that would start
/// while the previous one is still awaiting the sensor or the store is dropped;
/// without it ticks may overlap.
pub struct Scheduler {
    engine: Arc<Housekeeping>,
    skip_if_busy: bool,
    busy: Arc<AtomicBool>,
}

impl Scheduler {
    pub fn new(engine: Arc<Housekeeping>, skip_if_busy: bool) -> Self {
        Self {
            engine,
            skip_if_busy,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Tick immediately, then every interval until `shutdown` fires.
    /// The interval is read once here; later changes are not re-armed.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let period = Duration::from_millis(self.engine.interval_ms().await.max(1));
        info!("Starting housekeeping loop (every {:?})", period);

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.trigger();
                }
                _ = shutdown.recv() => {
                    info!("Housekeeping loop shutting down");
                    break;
                }
            }
        }
    }

    /// Start one tick in the background. Returns false if it was skipped.
    pub fn trigger(&self) -> bool {
        let guard = if self.skip_if_busy {
            if self.busy.swap(true, Ordering::AcqRel) {
                warn!("Previous housekeeping tick still running, skipping");
                return false;
            }
            Some(BusyGuard(self.busy.clone()))
        } else {
            None
        };

        let engine = self.engine.clone();
        tokio::spawn(async move {
            let _guard = guard;
            match engine.tick().await {
                TickOutcome::Disabled => debug!("Housekeeping disabled, tick skipped"),
                TickOutcome::SensorUnavailable => debug!("Tick aborted, no sensor data"),
                TickOutcome::Logged { events_emitted, scene_ended, .. } => {
                    debug!("Tick done: {} events, scene ended: {}", events_emitted, scene_ended)
                }
            }
        });

        true
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}
