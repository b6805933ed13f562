// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Harvia cloud API client

use async_trait::async_trait;
use anyhow::Result;
use std::time::Duration;
use tracing::debug;

use super::{SensorError, SensorReading, SensorSource};
use crate::config::HarviaConfig;

/// Bearer-authenticated client for the Harvia sauna cloud
#[derive(Clone)]
pub struct HarviaClient {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    device_id: Option<String>,
}

impl HarviaClient {
    pub fn new(config: &HarviaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            device_id: config.device_id.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Latest device data, passed through untouched
    pub async fn latest_data(&self) -> Result<serde_json::Value, SensorError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SensorError::NotConfigured("HARVIA_API_KEY"))?;

        let url = format!("{}/data/latest-data", self.api_url);
        let mut request = self.client.get(&url).bearer_auth(api_key);
        if let Some(device_id) = &self.device_id {
            request = request.query(&[("deviceId", device_id)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SensorError::Status(status.as_u16()));
        }

        let value = response.json().await?;
        debug!("Fetched latest Harvia data");
        Ok(value)
    }
}

#[async_trait]
impl SensorSource for HarviaClient {
    fn name(&self) -> &str {
        "harvia"
    }

    async fn fetch(&self) -> Result<SensorReading> {
        let value = self.latest_data().await?;
        let reading = serde_json::from_value(value)
            .map_err(|e| SensorError::Malformed(e.to_string()))?;
        Ok(reading)
    }
}
