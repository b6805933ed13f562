// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! End-of-game screen

use chrono::{DateTime, Utc};
use std::time::Duration;

use super::{to_chrono, SceneHandler, SceneId, SceneOutcome, ScenePatch};
use crate::core::HousekeepingState;

/// Scene 3: shows the result for a while, then hands back to neutral.
pub struct Outro {
    dwell: Duration,
}

impl Outro {
    pub const ID: SceneId = SceneId::new(3);

    pub fn new(dwell: Duration) -> Self {
        Self { dwell }
    }
}

impl SceneHandler for Outro {
    fn id(&self) -> SceneId {
        Self::ID
    }

    fn name(&self) -> &'static str {
        "outro"
    }

    fn handle(&self, state: &HousekeepingState, now: DateTime<Utc>) -> SceneOutcome {
        let scene = state.scene();

        let (started_at, patch) = if scene.status == 0 {
            (
                now,
                ScenePatch {
                    status: Some(1),
                    started_at: Some(now),
                    next_scene: None,
                },
            )
        } else {
            (scene.start_at.unwrap_or(now), ScenePatch::default())
        };

        if now - started_at > to_chrono(self.dwell) {
            return SceneOutcome::end_scene();
        }

        SceneOutcome {
            events: Vec::new(),
            patch,
        }
    }
}
