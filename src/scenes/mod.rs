// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Scene handlers - per-scene game logic driven by the housekeeping tick
//!
//! Each scene is a [`SceneHandler`] registered under a [`SceneId`]. On every
//! tick with an active scene the engine hands the handler a read-only view of
//! the housekeeping state and applies the returned [`SceneOutcome`]: events are
//! appended to the queue and the [`ScenePatch`] is written back through the
//! engine's own accessors.

mod loyly_game;
mod guitar_hero;
mod outro;

pub use loyly_game::LoylyGame;
pub use guitar_hero::GuitarHero;
pub use outro::Outro;

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::config::SceneTimings;
use crate::core::{GameEvent, GameEventKind, HousekeepingState};

/// Scene identifier; 0 is the neutral "no scene" id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SceneId(i64);

impl SceneId {
    pub const NEUTRAL: SceneId = SceneId(0);

    /// Result of parsing an id with no leading integer. Never registered.
    pub const UNMAPPED: SceneId = SceneId(i64::MIN);

    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(self) -> i64 {
        self.0
    }

    pub fn is_neutral(self) -> bool {
        self == Self::NEUTRAL
    }

    /// Parse the leading integer of `raw` (`" 2abc"` -> 2). Input without one
    /// becomes [`SceneId::UNMAPPED`].
    pub fn parse_lenient(raw: &str) -> Self {
        leading_integer(raw).map_or(Self::UNMAPPED, Self)
    }
}

/// Integer prefix of `raw` after leading whitespace and an optional sign.
/// `None` when there are no digits or the value does not fit an `i64`.
pub fn leading_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let sign_len = usize::from(trimmed.starts_with(['-', '+']));

    let end = trimmed[sign_len..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(trimmed.len(), |i| sign_len + i);

    if end == sign_len {
        return None;
    }
    trimmed[..end].parse().ok()
}

impl From<i64> for SceneId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::UNMAPPED {
            write!(f, "unmapped")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl Serialize for SceneId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if *self == Self::UNMAPPED {
            serializer.serialize_none()
        } else {
            serializer.serialize_i64(self.0)
        }
    }
}

/// State changes a handler asks the engine to make
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenePatch {
    pub status: Option<u64>,
    pub started_at: Option<DateTime<Utc>>,
    /// Switch scene after the other fields are applied; resets status to 0.
    pub next_scene: Option<SceneId>,
}

/// What a handler returns from one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneOutcome {
    pub events: Vec<GameEvent>,
    pub patch: ScenePatch,
}

impl SceneOutcome {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn end_scene() -> Self {
        Self {
            events: Vec::new(),
            patch: ScenePatch {
                next_scene: Some(SceneId::NEUTRAL),
                ..ScenePatch::default()
            },
        }
    }
}

/// Per-scene game logic
pub trait SceneHandler: Send + Sync {
    fn id(&self) -> SceneId;

    /// View name the browser loads for this scene
    fn name(&self) -> &'static str;

    fn handle(&self, state: &HousekeepingState, now: DateTime<Utc>) -> SceneOutcome;
}

// Clamped to a century so `now + d` cannot overflow.
fn to_chrono(duration: Duration) -> chrono::Duration {
    let century = chrono::Duration::days(36_500);
    chrono::Duration::from_std(duration).map_or(century, |d| d.min(century))
}

/// Shared shape of the timed games.
///
/// First call after the scene starts: mark it running and schedule
/// `START_SCENE` now plus `SCENE_WIN` at the end of the game. Afterwards the
/// scene ends as soon as `timeout` has elapsed, whether or not the win event is
/// still queued; otherwise every löyly pulse bumps the status and emits
/// `THROW_LOYLY`.
fn timed_game(
    state: &HousekeepingState,
    now: DateTime<Utc>,
    duration: Duration,
    timeout: Duration,
) -> SceneOutcome {
    let scene = state.scene();

    if scene.status == 0 {
        return SceneOutcome {
            events: vec![
                GameEvent::new(GameEventKind::StartScene, now),
                GameEvent::new(GameEventKind::SceneWin, now + to_chrono(duration)),
            ],
            patch: ScenePatch {
                status: Some(1),
                started_at: Some(now),
                next_scene: None,
            },
        };
    }

    let elapsed = now - scene.start_at.unwrap_or(now);
    if elapsed >= to_chrono(timeout) {
        return SceneOutcome::end_scene();
    }

    if state.info().loyly {
        return SceneOutcome {
            events: vec![GameEvent::new(GameEventKind::ThrowLoyly, now)],
            patch: ScenePatch {
                status: Some(scene.status + 1),
                ..ScenePatch::default()
            },
        };
    }

    SceneOutcome::none()
}

/// Scene id to handler lookup owned by the engine
pub struct SceneRegistry {
    handlers: BTreeMap<SceneId, Box<dyn SceneHandler>>,
}

/// Registry entry as listed to clients
#[derive(Debug, Clone, Serialize)]
pub struct SceneInfo {
    pub id: SceneId,
    pub name: &'static str,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// The installation's scenes with configured timings
    pub fn standard(timings: &SceneTimings) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(LoylyGame::new(timings.loyly_game(), timings.grace())));
        registry.register(Box::new(GuitarHero::new(timings.guitar_hero(), timings.grace())));
        registry.register(Box::new(Outro::new(timings.outro())));
        registry
    }

    /// Register a handler. The neutral id is reserved and ignored.
    pub fn register(&mut self, handler: Box<dyn SceneHandler>) {
        let id = handler.id();
        if id.is_neutral() {
            tracing::warn!("Refusing to register handler '{}' under the neutral id", handler.name());
            return;
        }
        self.handlers.insert(id, handler);
    }

    pub fn get(&self, id: SceneId) -> Option<&dyn SceneHandler> {
        self.handlers.get(&id).map(|h| h.as_ref())
    }

    /// Neutral view first, then every registered scene
    pub fn list(&self) -> Vec<SceneInfo> {
        std::iter::once(SceneInfo {
            id: SceneId::NEUTRAL,
            name: "neutral",
        })
        .chain(self.handlers.values().map(|h| SceneInfo {
            id: h.id(),
            name: h.name(),
        }))
        .collect()
    }
}

impl Default for SceneRegistry {
    fn default() -> Self {
        Self::standard(&SceneTimings::default())
    }
}
