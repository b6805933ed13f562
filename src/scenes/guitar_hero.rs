// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Rhythm game scene

use chrono::{DateTime, Utc};
use std::time::Duration;

use super::{timed_game, SceneHandler, SceneId, SceneOutcome};
use crate::core::HousekeepingState;

/// Scene 2: short rhythm game; löyly throws during the song are reported to the view.
pub struct GuitarHero {
    duration: Duration,
    grace: Duration,
}

impl GuitarHero {
    pub const ID: SceneId = SceneId::new(2);

    pub fn new(duration: Duration, grace: Duration) -> Self {
        Self { duration, grace }
    }
}

impl SceneHandler for GuitarHero {
    fn id(&self) -> SceneId {
        Self::ID
    }

    fn name(&self) -> &'static str {
        "guitar-hero"
    }

    fn handle(&self, state: &HousekeepingState, now: DateTime<Utc>) -> SceneOutcome {
        timed_game(state, now, self.duration, self.duration + self.grace)
    }
}
