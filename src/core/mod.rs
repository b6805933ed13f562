//! Core module - housekeeping state, engine, event queue and scheduler

mod engine;
mod scheduler;
mod event_queue;

pub use engine::{EngineSettings, Housekeeping, TickOutcome, HUM_CHANGE_THRESHOLD};
pub use scheduler::Scheduler;
pub use event_queue::{EventQueue, GameEvent, GameEventKind};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::scenes::{SceneId, ScenePatch};
use crate::sensors::SensorReading;

/// Values derived from the latest reading
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SensorInfo {
    pub temp: f64,
    pub humidity: f64,
    pub presence: bool,
    /// True only on the tick where the humidity jump was seen
    pub loyly: bool,
}

impl SensorInfo {
    /// `loyly` is set when humidity rose by strictly more than `threshold`
    /// since `previous_humidity`.
    pub fn derive(reading: &SensorReading, previous_humidity: f64, threshold: f64) -> Self {
        Self {
            temp: reading.data.temp,
            humidity: reading.data.hum,
            presence: reading.presence(),
            loyly: reading.data.hum - previous_humidity > threshold,
        }
    }
}

/// Active scene and its handler-private progress
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneConfig {
    pub id: SceneId,
    pub status: u64,
    pub start_at: Option<DateTime<Utc>>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            id: SceneId::NEUTRAL,
            status: 0,
            start_at: None,
        }
    }
}

/// Housekeeping state owned by the engine.
///
/// Readable everywhere; mutated only through the crate-internal setters so that
/// changing the scene always resets its status.
#[derive(Debug, Clone)]
pub struct HousekeepingState {
    enabled: bool,
    run_count: u64,
    last_run_time: Option<DateTime<Utc>>,
    interval_ms: u64,
    info: SensorInfo,
    scene: SceneConfig,
    events: EventQueue,
}

impl HousekeepingState {
    pub fn new(enabled: bool, interval_ms: u64) -> Self {
        Self {
            enabled,
            run_count: 0,
            last_run_time: None,
            interval_ms,
            info: SensorInfo::default(),
            scene: SceneConfig::default(),
            events: EventQueue::new(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn run_count(&self) -> u64 {
        self.run_count
    }

    pub fn last_run_time(&self) -> Option<DateTime<Utc>> {
        self.last_run_time
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn info(&self) -> &SensorInfo {
        &self.info
    }

    pub fn scene(&self) -> &SceneConfig {
        &self.scene
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn set_interval_ms(&mut self, interval_ms: u64) {
        self.interval_ms = interval_ms;
    }

    pub(crate) fn record_run(&mut self, now: DateTime<Utc>) {
        self.run_count += 1;
        self.last_run_time = Some(now);
    }

    pub(crate) fn set_info(&mut self, info: SensorInfo) {
        self.info = info;
    }

    /// Switch scene; status always restarts at 0. Start time and queue are kept.
    pub(crate) fn set_scene(&mut self, id: SceneId) {
        self.scene.id = id;
        self.scene.status = 0;
    }

    pub(crate) fn set_scene_status(&mut self, status: u64) {
        self.scene.status = status;
    }

    pub(crate) fn set_scene_started_at(&mut self, at: DateTime<Utc>) {
        self.scene.start_at = Some(at);
    }

    /// Status and start time first, then the scene switch.
    pub(crate) fn apply_patch(&mut self, patch: &ScenePatch) {
        if let Some(status) = patch.status {
            self.set_scene_status(status);
        }
        if let Some(at) = patch.started_at {
            self.set_scene_started_at(at);
        }
        if let Some(next) = patch.next_scene {
            self.set_scene(next);
        }
    }

    pub(crate) fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    pub fn status(&self) -> HousekeepingStatus {
        HousekeepingStatus {
            scene: self.scene.id,
            enabled: self.enabled,
            run_count: self.run_count,
            last_run_time: self.last_run_time,
            interval_ms: self.interval_ms,
            info: self.info,
        }
    }
}

/// Snapshot returned by the status endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HousekeepingStatus {
    pub scene: SceneId,
    pub enabled: bool,
    pub run_count: u64,
    pub last_run_time: Option<DateTime<Utc>>,
    pub interval_ms: u64,
    pub info: SensorInfo,
}
