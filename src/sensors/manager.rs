// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Sensor manager - selects the configured source and tracks its health

use async_trait::async_trait;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, debug};

use super::{HarviaClient, HttpSensor, RandomSensor, SensorReading, SensorSource, SequentialSensor};
use crate::config::{Config, SourceKind};

/// Health counters for the active source
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorHealth {
    pub source: String,
    pub readings_count: u64,
    pub error_count: u64,
    pub last_error: Option<String>,
    pub last_reading_at: Option<DateTime<Utc>>,
}

/// Wraps the configured source and records every fetch outcome
pub struct SensorManager {
    source: Arc<dyn SensorSource>,
    health: RwLock<SensorHealth>,
}

impl SensorManager {
    pub fn new(source: Arc<dyn SensorSource>) -> Self {
        let health = SensorHealth {
            source: source.name().to_string(),
            ..SensorHealth::default()
        };

        Self {
            source,
            health: RwLock::new(health),
        }
    }

    /// Build the source named by `housekeeping.source`
    pub fn from_config(config: &Config, harvia: &HarviaClient) -> Result<Self> {
        let source: Arc<dyn SensorSource> = match config.housekeeping.source {
            SourceKind::Random => Arc::new(RandomSensor::new()),
            SourceKind::Sequential => Arc::new(SequentialSensor::new()),
            SourceKind::Http => Arc::new(HttpSensor::new(&config.housekeeping.source_url)?),
            SourceKind::Harvia => Arc::new(harvia.clone()),
        };

        info!("Using '{}' sensor source", source.name());
        Ok(Self::new(source))
    }

    pub async fn health(&self) -> SensorHealth {
        self.health.read().await.clone()
    }
}

#[async_trait]
impl SensorSource for SensorManager {
    fn name(&self) -> &str {
        self.source.name()
    }

    async fn fetch(&self) -> Result<SensorReading> {
        let result = self.source.fetch().await;

        let mut health = self.health.write().await;
        match &result {
            Ok(_) => {
                health.readings_count += 1;
                health.last_reading_at = Some(Utc::now());
            }
            Err(e) => {
                health.error_count += 1;
                health.last_error = Some(e.to_string());
                debug!("Read error for {}: {}", self.source.name(), e);
            }
        }

        result
    }
}
