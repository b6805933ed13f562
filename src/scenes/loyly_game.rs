// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Löyly throwing game

use chrono::{DateTime, Utc};
use std::time::Duration;

use super::{timed_game, SceneHandler, SceneId, SceneOutcome};
use crate::core::HousekeepingState;

/// Scene 1: players throw löyly on the stove; every detected throw scores.
pub struct LoylyGame {
    duration: Duration,
    grace: Duration,
}

impl LoylyGame {
    pub const ID: SceneId = SceneId::new(1);

    pub fn new(duration: Duration, grace: Duration) -> Self {
        Self { duration, grace }
    }
}

impl SceneHandler for LoylyGame {
    fn id(&self) -> SceneId {
        Self::ID
    }

    fn name(&self) -> &'static str {
        "loyly-game"
    }

    fn handle(&self, state: &HousekeepingState, now: DateTime<Utc>) -> SceneOutcome {
        timed_game(state, now, self.duration, self.duration + self.grace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GameEventKind, SensorInfo};

    fn game() -> LoylyGame {
        LoylyGame::new(Duration::from_secs(300), Duration::from_secs(60))
    }

    fn running_state() -> HousekeepingState {
        let mut state = HousekeepingState::new(true, 10_000);
        state.set_scene(LoylyGame::ID);
        state
    }

    #[test]
    fn test_first_tick_starts_game() {
        let state = running_state();
        let now = Utc::now();

        let outcome = game().handle(&state, now);

        assert_eq!(outcome.events.len(), 2);
        assert_eq!(outcome.events[0].kind, GameEventKind::StartScene);
        assert_eq!(outcome.events[0].run_at, now);
        assert_eq!(outcome.events[1].kind, GameEventKind::SceneWin);
        assert_eq!(outcome.events[1].run_at, now + chrono::Duration::minutes(5));
        assert_eq!(outcome.patch.status, Some(1));
        assert_eq!(outcome.patch.started_at, Some(now));
        assert_eq!(outcome.patch.next_scene, None);
    }

    #[test]
    fn test_loyly_scores_without_clamp() {
        let mut state = running_state();
        let start = Utc::now();
        state.apply_patch(&game().handle(&state, start).patch);
        state.set_info(SensorInfo { temp: 80.0, humidity: 40.0, presence: true, loyly: true });

        for expected in 2..=5 {
            let now = start + chrono::Duration::seconds(expected as i64);
            let outcome = game().handle(&state, now);

            assert_eq!(outcome.events.len(), 1);
            assert_eq!(outcome.events[0].kind, GameEventKind::ThrowLoyly);
            assert_eq!(outcome.patch.status, Some(expected));
            state.apply_patch(&outcome.patch);
        }
        assert_eq!(state.scene().status, 5);
    }

    #[test]
    fn test_status_counts_past_u32() {
        let mut state = running_state();
        let start = Utc::now();
        state.apply_patch(&game().handle(&state, start).patch);
        state.set_scene_status(u64::from(u32::MAX));
        state.set_info(SensorInfo { loyly: true, ..SensorInfo::default() });

        let outcome = game().handle(&state, start + chrono::Duration::seconds(1));
        assert_eq!(outcome.patch.status, Some(u64::from(u32::MAX) + 1));
    }

    #[test]
    fn test_quiet_tick_emits_nothing() {
        let mut state = running_state();
        let start = Utc::now();
        state.apply_patch(&game().handle(&state, start).patch);

        let outcome = game().handle(&state, start + chrono::Duration::seconds(10));
        assert_eq!(outcome, SceneOutcome::none());
    }

    #[test]
    fn test_timeout_returns_to_neutral() {
        let mut state = running_state();
        let start = Utc::now();
        state.apply_patch(&game().handle(&state, start).patch);
        state.set_info(SensorInfo { loyly: true, ..SensorInfo::default() });

        let outcome = game().handle(&state, start + chrono::Duration::seconds(361));

        assert!(outcome.events.is_empty());
        assert_eq!(outcome.patch.next_scene, Some(SceneId::NEUTRAL));

        state.apply_patch(&outcome.patch);
        assert_eq!(state.scene().id, SceneId::NEUTRAL);
        assert_eq!(state.scene().status, 0);
    }

    #[test]
    fn test_ends_with_win_without_grace() {
        let game = LoylyGame::new(Duration::from_secs(300), Duration::ZERO);
        let mut state = running_state();
        let start = Utc::now();
        state.apply_patch(&game.handle(&state, start).patch);
        state.set_info(SensorInfo { loyly: true, ..SensorInfo::default() });

        let before = game.handle(&state, start + chrono::Duration::seconds(299));
        assert_eq!(before.events[0].kind, GameEventKind::ThrowLoyly);

        let at_win = game.handle(&state, start + chrono::Duration::seconds(300));
        assert!(at_win.events.is_empty());
        assert_eq!(at_win.patch.next_scene, Some(SceneId::NEUTRAL));
    }
}
