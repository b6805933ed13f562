// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Sensor traits and common types

use async_trait::async_trait;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sauna heater state as reported by the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaunaStatus {
    CoolingDown = 1,
    HeatingUp = 2,
    AtTemperature = 3,
}

impl SaunaStatus {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::CoolingDown),
            2 => Some(Self::HeatingUp),
            3 => Some(Self::AtTemperature),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        self as i64
    }
}

/// Measurements carried by a single sensor reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorData {
    pub heap_size: i64,
    pub rssi: i64,
    pub temp_esp: f64,
    pub target_temp: f64,
    /// 0 = nobody in the sauna, 1 = presence detected
    pub presence: i64,
    pub temp: f64,
    /// 1 = cooling down, 2 = heating up, 3 = at temperature
    pub sauna_status: i64,
    pub battery_load_v: f64,
    pub reset_cnt: i64,
    pub hum: f64,
    pub battery_voltage: f64,
    pub time_to_target: i64,
}

/// A single reading as published by the sauna sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub device_id: String,
    pub shadow_name: String,
    pub sub_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub organization: String,
    pub session_id: String,
    pub data: SensorData,
    /// Kept verbatim as received; never parsed.
    pub timestamp: String,
}

impl SensorReading {
    pub fn presence(&self) -> bool {
        self.data.presence > 0
    }

    pub fn sauna_status(&self) -> Option<SaunaStatus> {
        SaunaStatus::from_code(self.data.sauna_status)
    }
}

/// Wire envelope used by the mock data endpoint: `{success, data}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<SensorReading>,
}

impl SensorEnvelope {
    pub fn ok(reading: SensorReading) -> Self {
        Self {
            success: true,
            data: Some(reading),
        }
    }

    /// Unwrap the reading, rejecting `success: false` and a missing payload.
    pub fn into_reading(self) -> Result<SensorReading, SensorError> {
        if !self.success {
            return Err(SensorError::Rejected);
        }
        self.data.ok_or(SensorError::Malformed("missing data".to_string()))
    }
}

/// Failures while pulling a reading
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("source reported success=false")]
    Rejected,

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("source not configured: {0}")]
    NotConfigured(&'static str),
}

/// Anything the housekeeping loop can pull a reading from
#[async_trait]
pub trait SensorSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Pull the current reading
    async fn fetch(&self) -> Result<SensorReading>;
}
