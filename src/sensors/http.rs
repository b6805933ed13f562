// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Readings pulled from a remote `{success, data}` endpoint

use async_trait::async_trait;
use anyhow::Result;
use std::time::Duration;
use tracing::debug;

use super::{SensorEnvelope, SensorError, SensorReading, SensorSource};

/// Pulls readings from any endpoint speaking the mock data envelope
pub struct HttpSensor {
    client: reqwest::Client,
    url: String,
}

impl HttpSensor {
    pub fn new(url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_envelope(&self) -> Result<SensorEnvelope, SensorError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SensorError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| SensorError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl SensorSource for HttpSensor {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self) -> Result<SensorReading> {
        let reading = self.fetch_envelope().await?.into_reading()?;
        debug!("Fetched reading from {} (session {})", self.url, reading.session_id);
        Ok(reading)
    }
}
