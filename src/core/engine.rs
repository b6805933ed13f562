//! Housekeeping engine - one sensor sample and one scene step per tick

use std::sync::Arc;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{info, warn, error, debug};

use crate::config::HousekeepingConfig;
use crate::db::SensorLogStore;
use crate::scenes::{SceneId, SceneRegistry};
use crate::sensors::SensorSource;
use super::{GameEvent, HousekeepingState, HousekeepingStatus, SceneConfig, SensorInfo};

/// Humidity rise that counts as a löyly throw
pub const HUM_CHANGE_THRESHOLD: f64 = 10.0;

/// Engine settings taken from `[housekeeping]`
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub enabled: bool,
    pub interval_ms: u64,
    pub humidity_change_threshold: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 10_000,
            humidity_change_threshold: HUM_CHANGE_THRESHOLD,
        }
    }
}

impl From<&HousekeepingConfig> for EngineSettings {
    fn from(config: &HousekeepingConfig) -> Self {
        Self {
            enabled: config.enabled,
            interval_ms: config.interval_ms,
            humidity_change_threshold: config.humidity_change_threshold,
        }
    }
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Housekeeping is switched off; nothing changed
    Disabled,
    /// The sensor could not be read; the rest of the tick was skipped
    SensorUnavailable,
    Logged {
        loyly: bool,
        events_emitted: usize,
        scene_ended: bool,
    },
}

/// Owns the housekeeping state and runs the periodic tick
pub struct Housekeeping {
    state: RwLock<HousekeepingState>,
    scenes: SceneRegistry,
    source: Arc<dyn SensorSource>,
    store: Arc<dyn SensorLogStore>,
    humidity_threshold: f64,
}

impl Housekeeping {
    pub fn new(
        source: Arc<dyn SensorSource>,
        store: Arc<dyn SensorLogStore>,
        scenes: SceneRegistry,
        settings: EngineSettings,
    ) -> Self {
        Self {
            state: RwLock::new(HousekeepingState::new(settings.enabled, settings.interval_ms)),
            scenes,
            source,
            store,
            humidity_threshold: settings.humidity_change_threshold,
        }
    }

    pub fn scenes(&self) -> &SceneRegistry {
        &self.scenes
    }

    pub async fn tick(&self) -> TickOutcome {
        self.tick_at(Utc::now()).await
    }

    /// Run one housekeeping pass as of `now`.
    ///
    /// Never fails: sensor and store errors are logged and degrade the tick.
    pub async fn tick_at(&self, now: DateTime<Utc>) -> TickOutcome {
        {
            let mut state = self.state.write().await;
            if !state.enabled() {
                return TickOutcome::Disabled;
            }
            state.record_run(now);
        }

        let reading = match self.source.fetch().await {
            Ok(reading) => reading,
            Err(e) => {
                error!("Failed to fetch sensor data from {}: {}", self.source.name(), e);
                return TickOutcome::SensorUnavailable;
            }
        };

        // Compared against the stored row, not the previous in-memory info.
        let previous_humidity = match self.store.last_humidity() {
            Ok(hum) => hum.unwrap_or(0.0),
            Err(e) => {
                warn!("Failed to read previous humidity, assuming 0: {}", e);
                0.0
            }
        };

        let sensor_info = SensorInfo::derive(&reading, previous_humidity, self.humidity_threshold);
        self.state.write().await.set_info(sensor_info);

        match self.store.log_reading(&reading) {
            Ok(()) => info!(
                "Logged sensor data: temp={}°C, hum={}, status={}, presence={}",
                reading.data.temp, reading.data.hum, reading.data.sauna_status, reading.data.presence
            ),
            Err(e) => error!("Failed to log sensor data: {}", e),
        }

        if sensor_info.loyly {
            info!(
                "Löyly detected: humidity {} -> {}",
                previous_humidity, reading.data.hum
            );
        }

        let (events_emitted, scene_ended) = self.step_scene(now).await;

        TickOutcome::Logged {
            loyly: sensor_info.loyly,
            events_emitted,
            scene_ended,
        }
    }

    async fn step_scene(&self, now: DateTime<Utc>) -> (usize, bool) {
        let mut state = self.state.write().await;

        let scene_id = state.scene().id;
        if scene_id.is_neutral() {
            return (0, false);
        }

        let mut emitted = 0;
        match self.scenes.get(scene_id) {
            Some(handler) => {
                let outcome = handler.handle(&state, now);
                emitted = outcome.events.len();
                state.apply_patch(&outcome.patch);
                state.events_mut().extend(outcome.events);
            }
            None => debug!("No handler for scene {}", scene_id),
        }

        if state.events().has_terminal_due(now) {
            state.set_scene(SceneId::NEUTRAL);
        }

        let ended = state.scene().id.is_neutral();
        if ended {
            info!("Scene {} ended", scene_id);
        }
        (emitted, ended)
    }

    pub async fn status(&self) -> HousekeepingStatus {
        self.state.read().await.status()
    }

    pub async fn is_enabled(&self) -> bool {
        self.state.read().await.enabled()
    }

    pub async fn set_enabled(&self, enabled: bool) {
        self.state.write().await.set_enabled(enabled);
        info!("Housekeeping {}", if enabled { "ENABLED" } else { "DISABLED" });
    }

    /// Flip the enable flag and return the new value
    pub async fn toggle(&self) -> bool {
        let enabled = {
            let mut state = self.state.write().await;
            let enabled = !state.enabled();
            state.set_enabled(enabled);
            enabled
        };
        info!("Housekeeping {}", if enabled { "ENABLED" } else { "DISABLED" });
        enabled
    }

    /// Switch to `id` with a fresh status. Unknown ids are accepted and stay inert.
    pub async fn set_scene(&self, id: SceneId) {
        self.state.write().await.set_scene(id);
        match self.scenes.get(id) {
            Some(handler) => info!("Scene {} ({}) selected", id, handler.name()),
            None if id.is_neutral() => info!("Scene reset to neutral"),
            None => warn!("Scene {} selected but has no handler", id),
        }
    }

    pub async fn scene_config(&self) -> SceneConfig {
        *self.state.read().await.scene()
    }

    pub async fn drain_due_events(&self) -> Vec<GameEvent> {
        self.drain_due_events_at(Utc::now()).await
    }

    /// Remove and return the events due at `now`; each event is returned once.
    pub async fn drain_due_events_at(&self, now: DateTime<Utc>) -> Vec<GameEvent> {
        self.state.write().await.events_mut().drain_due(now)
    }

    /// Queue contents without consuming them
    pub async fn pending_events(&self) -> Vec<GameEvent> {
        self.state.read().await.events().iter().cloned().collect()
    }

    pub async fn interval_ms(&self) -> u64 {
        self.state.read().await.interval_ms()
    }

    /// Only affects the reported value once the scheduler is running.
    pub async fn set_interval_ms(&self, interval_ms: u64) {
        self.state.write().await.set_interval_ms(interval_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GameEventKind;
    use crate::db::Database;
    use crate::sensors::{SensorReading, SequentialSensor};
    use anyhow::{anyhow, bail, Result};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Hands out readings with the given humidities, then fails
    struct Scripted {
        hums: Mutex<VecDeque<Option<f64>>>,
        template: SensorReading,
    }

    impl Scripted {
        fn new(hums: &[Option<f64>]) -> Self {
            Self {
                hums: Mutex::new(hums.iter().copied().collect()),
                template: SequentialSensor::new().next_reading(Utc::now()),
            }
        }
    }

    #[async_trait]
    impl SensorSource for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn fetch(&self) -> Result<SensorReading> {
            match self.hums.lock().unwrap().pop_front().flatten() {
                Some(hum) => {
                    let mut reading = self.template.clone();
                    reading.data.hum = hum;
                    Ok(reading)
                }
                None => bail!("sensor offline"),
            }
        }
    }

    struct BrokenStore;

    impl SensorLogStore for BrokenStore {
        fn last_humidity(&self) -> Result<Option<f64>> {
            Err(anyhow!("connection refused"))
        }

        fn log_reading(&self, _reading: &SensorReading) -> Result<()> {
            Err(anyhow!("connection refused"))
        }
    }

    fn engine_with(hums: &[Option<f64>], store: Arc<dyn SensorLogStore>) -> Housekeeping {
        Housekeeping::new(
            Arc::new(Scripted::new(hums)),
            store,
            SceneRegistry::default(),
            EngineSettings::default(),
        )
    }

    fn memory_store() -> Arc<Database> {
        Arc::new(Database::open_in_memory().unwrap())
    }

    #[tokio::test]
    async fn test_disabled_tick_changes_nothing() {
        let engine = engine_with(&[Some(20.0)], memory_store());
        engine.set_enabled(false).await;
        engine.set_scene(SceneId::new(1)).await;
        let before = engine.status().await;

        assert_eq!(engine.tick().await, TickOutcome::Disabled);

        let after = engine.status().await;
        assert_eq!(after.run_count, before.run_count);
        assert_eq!(after.last_run_time, before.last_run_time);
        assert_eq!(after.info, before.info);
        assert!(engine.pending_events().await.is_empty());
    }

    #[tokio::test]
    async fn test_run_count_counts_failed_ticks() {
        let engine = engine_with(&[Some(20.0), None, Some(25.0), None], Arc::new(BrokenStore));

        for _ in 0..5 {
            engine.tick().await;
        }

        let status = engine.status().await;
        assert_eq!(status.run_count, 5);
        assert!(status.last_run_time.is_some());
    }

    #[tokio::test]
    async fn test_sensor_failure_keeps_previous_info() {
        let store = memory_store();
        let engine = engine_with(&[Some(20.0), None], store.clone());

        engine.tick().await;
        let info = engine.status().await.info;

        assert_eq!(engine.tick().await, TickOutcome::SensorUnavailable);
        assert_eq!(engine.status().await.info, info);
        assert_eq!(store.recent_readings(10).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_store_failure_defaults_previous_humidity() {
        let engine = engine_with(&[Some(10.5)], Arc::new(BrokenStore));

        let outcome = engine.tick().await;

        assert!(matches!(outcome, TickOutcome::Logged { loyly: true, .. }));
        assert_eq!(engine.status().await.info.humidity, 10.5);
    }

    #[tokio::test]
    async fn test_loyly_threshold_boundary() {
        let engine = engine_with(&[Some(20.0), Some(30.0), Some(40.0001)], memory_store());

        engine.tick().await;
        engine.tick().await;
        assert!(!engine.status().await.info.loyly, "a rise of exactly 10 is not a throw");

        engine.tick().await;
        assert!(engine.status().await.info.loyly);
    }

    #[tokio::test]
    async fn test_loyly_is_not_sticky() {
        let engine = engine_with(&[Some(20.0), Some(35.0), Some(36.0)], memory_store());

        engine.tick().await;
        engine.tick().await;
        assert!(engine.status().await.info.loyly);

        engine.tick().await;
        assert!(!engine.status().await.info.loyly);
    }

    #[tokio::test]
    async fn test_unknown_scene_is_inert() {
        let engine = engine_with(&[Some(20.0)], memory_store());
        engine.set_scene(SceneId::UNMAPPED).await;

        let outcome = engine.tick().await;

        assert_eq!(
            outcome,
            TickOutcome::Logged { loyly: true, events_emitted: 0, scene_ended: false }
        );
        assert_eq!(engine.scene_config().await.id, SceneId::UNMAPPED);
        assert!(engine.pending_events().await.is_empty());
    }

    #[tokio::test]
    async fn test_due_terminal_event_forces_neutral() {
        let engine = engine_with(&[Some(20.0), Some(21.0)], memory_store());
        let start = Utc::now();
        engine.set_scene(SceneId::new(2)).await;
        engine.tick_at(start).await;

        let win_at = start + chrono::Duration::seconds(30);
        let outcome = engine.tick_at(win_at).await;

        assert!(matches!(outcome, TickOutcome::Logged { scene_ended: true, .. }));
        assert_eq!(engine.scene_config().await.id, SceneId::NEUTRAL);
        assert_eq!(engine.scene_config().await.status, 0);

        let drained = engine.drain_due_events_at(win_at).await;
        assert!(drained.iter().any(|e| e.kind == GameEventKind::SceneWin));
    }

    #[tokio::test]
    async fn test_game_ends_after_win_was_drained() {
        let engine = engine_with(&[Some(20.0), Some(30.0), Some(40.5)], memory_store());
        let start = Utc::now();
        engine.set_scene(SceneId::new(1)).await;
        engine.tick_at(start).await;

        // The browser picks up the win before the next tick runs.
        let drained = engine.drain_due_events_at(start + chrono::Duration::seconds(301)).await;
        assert!(drained.iter().any(|e| e.kind == GameEventKind::SceneWin));

        let outcome = engine.tick_at(start + chrono::Duration::seconds(305)).await;
        assert!(matches!(outcome, TickOutcome::Logged { scene_ended: true, .. }));
        assert!(engine.scene_config().await.id.is_neutral());

        let outcome = engine.tick_at(start + chrono::Duration::seconds(315)).await;
        assert!(matches!(outcome, TickOutcome::Logged { loyly: true, events_emitted: 0, .. }));
        assert!(engine.scene_config().await.id.is_neutral());
        assert!(engine.pending_events().await.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_and_interval() {
        let engine = engine_with(&[], memory_store());

        assert!(!engine.toggle().await);
        assert!(!engine.is_enabled().await);
        assert!(engine.toggle().await);

        engine.set_interval_ms(2000).await;
        assert_eq!(engine.interval_ms().await, 2000);
    }
}
