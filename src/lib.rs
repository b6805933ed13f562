// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Löyly - interactive sauna installation backend
//!
//! Polls a sauna sensor on a fixed period, detects löyly (steam throws) from
//! humidity jumps, drives the active game scene and queues timed events for the
//! browser frontend. A small shop and wellness store sit next to it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Scheduler                            │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                ↓ tick
//! ┌──────────┐   reading   ┌─────────────┐   state    ┌──────────┐
//! │ Sensors  │ ──────────→ │ Housekeeping│ ─────────→ │  Scenes  │
//! │ Manager  │             │   Engine    │ ←───────── │ Registry │
//! └──────────┘             └──────┬──────┘  events +  └──────────┘
//!                                 │         patch
//!                     log reading ↓          ↑ status / drain events
//!                          ┌──────────┐   ┌──────────┐
//!                          │ Database │ ← │ HTTP API │
//!                          └──────────┘   └──────────┘
//! ```

pub mod api;
pub mod config;
pub mod core;
pub mod db;
pub mod scenes;
pub mod sensors;

// Re-exports for convenience
pub use api::AppState;
pub use config::Config;
pub use core::{Housekeeping, Scheduler};
pub use db::Database;
pub use scenes::{SceneId, SceneRegistry};
pub use sensors::{SensorManager, SensorReading, SensorSource};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Display name
pub const NAME: &str = "Löyly";
