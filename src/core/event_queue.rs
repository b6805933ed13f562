// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Scheduled game events waiting to be picked up by the browser

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event types understood by the scene views
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum GameEventKind {
    StartScene,
    ThrowLoyly,
    SceneWin,
    SceneLoss,
    /// Scene-specific event passed through verbatim
    Other(String),
}

impl GameEventKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::StartScene => "START_SCENE",
            Self::ThrowLoyly => "THROW_LOYLY",
            Self::SceneWin => "SCENE_WIN",
            Self::SceneLoss => "SCENE_LOSS",
            Self::Other(name) => name,
        }
    }

    /// Win and loss end the scene once they are due
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::SceneWin | Self::SceneLoss)
    }
}

impl From<String> for GameEventKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "START_SCENE" => Self::StartScene,
            "THROW_LOYLY" => Self::ThrowLoyly,
            "SCENE_WIN" => Self::SceneWin,
            "SCENE_LOSS" => Self::SceneLoss,
            _ => Self::Other(name),
        }
    }
}

impl From<GameEventKind> for String {
    fn from(kind: GameEventKind) -> Self {
        kind.as_str().to_string()
    }
}

/// A notification that becomes visible once `run_at` has passed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    #[serde(rename = "event_type")]
    pub kind: GameEventKind,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub run_at: DateTime<Utc>,
}

impl GameEvent {
    pub fn new(kind: GameEventKind, run_at: DateTime<Utc>) -> Self {
        Self { kind, run_at }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.run_at <= now
    }
}

/// Insertion-ordered queue; only [`EventQueue::drain_due`] removes events.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Vec<GameEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter()
    }

    /// Remove and return every due event, keeping the rest in order.
    pub fn drain_due(&mut self, now: DateTime<Utc>) -> Vec<GameEvent> {
        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.events)
            .into_iter()
            .partition(|e| e.is_due(now));
        self.events = pending;
        due
    }

    pub fn has_terminal_due(&self, now: DateTime<Utc>) -> bool {
        self.events.iter().any(|e| e.kind.is_terminal() && e.is_due(now))
    }
}

impl Extend<GameEvent> for EventQueue {
    fn extend<I: IntoIterator<Item = GameEvent>>(&mut self, iter: I) {
        self.events.extend(iter);
    }
}
