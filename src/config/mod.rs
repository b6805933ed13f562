// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Configuration module

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level
    pub log_level: String,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Housekeeping loop configuration
    pub housekeeping: HousekeepingConfig,

    /// Scene timing configuration
    pub scenes: SceneTimings,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Harvia cloud API configuration
    pub harvia: HarviaConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            server: ServerConfig::default(),
            housekeeping: HousekeepingConfig::default(),
            scenes: SceneTimings::default(),
            database: DatabaseConfig::default(),
            harvia: HarviaConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Apply `PORT`, `HARVIA_API_KEY` and `HARVIA_DEVICE_ID` from the environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(e) => warn!("Invalid PORT value {:?}: {}", port, e),
            }
        }

        if let Some(key) = lookup("HARVIA_API_KEY").filter(|k| !k.is_empty()) {
            self.harvia.api_key = Some(key);
        }

        if let Some(device) = lookup("HARVIA_DEVICE_ID").filter(|d| !d.is_empty()) {
            self.harvia.device_id = Some(device);
        }
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("loyly"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Listen port
    pub port: u16,

    /// CORS preflight cache lifetime
    pub cors_max_age_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_max_age_secs: 3600,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Where the housekeeping loop pulls readings from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// In-process randomized readings
    Random,
    /// In-process deterministic replay with synthetic steam throws
    Sequential,
    /// Any HTTP endpoint returning `{success, data}`
    Http,
    /// Harvia cloud API
    Harvia,
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "sequential" => Ok(Self::Sequential),
            "http" => Ok(Self::Http),
            "harvia" => Ok(Self::Harvia),
            other => Err(format!("unknown sensor source '{}'", other)),
        }
    }
}

/// Housekeeping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HousekeepingConfig {
    /// Start with the loop enabled
    pub enabled: bool,

    /// Tick period in milliseconds
    pub interval_ms: u64,

    /// Humidity rise between two readings that counts as a löyly throw
    pub humidity_change_threshold: f64,

    /// Sensor source
    pub source: SourceKind,

    /// Endpoint for the `http` source
    pub source_url: String,

    /// Skip a tick instead of overlapping a still-running one
    pub skip_if_busy: bool,
}

impl Default for HousekeepingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 10_000,
            humidity_change_threshold: 10.0,
            source: SourceKind::Random,
            source_url: "http://localhost:3000/api/mockdata/sensor".to_string(),
            skip_if_busy: true,
        }
    }
}

/// Scene timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneTimings {
    /// Length of the löyly throwing game
    pub loyly_game_secs: u64,

    /// Length of the rhythm game
    pub guitar_hero_secs: u64,

    /// How long the outro stays up before returning to neutral
    pub outro_secs: u64,

    /// Extra time a timed game keeps running after its win event is due.
    /// 0 ends the game together with the win.
    pub timeout_grace_secs: u64,
}

impl Default for SceneTimings {
    fn default() -> Self {
        Self {
            loyly_game_secs: 300,
            guitar_hero_secs: 30,
            outro_secs: 15,
            timeout_grace_secs: 0,
        }
    }
}

impl SceneTimings {
    pub fn loyly_game(&self) -> Duration {
        Duration::from_secs(self.loyly_game_secs)
    }

    pub fn guitar_hero(&self) -> Duration {
        Duration::from_secs(self.guitar_hero_secs)
    }

    pub fn outro(&self) -> Duration {
        Duration::from_secs(self.outro_secs)
    }

    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.timeout_grace_secs)
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database path
    pub path: PathBuf,

    /// Insert demo products and a demo user into an empty database
    pub seed_demo_data: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/loyly.db"),
            seed_demo_data: true,
        }
    }
}

/// Harvia cloud API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarviaConfig {
    /// API base URL
    pub api_url: String,

    /// Bearer token
    pub api_key: Option<String>,

    /// Device to query
    pub device_id: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for HarviaConfig {
    fn default() -> Self {
        Self {
            api_url: "https://u4830dkpl0.execute-api.eu-central-1.amazonaws.com/prod".to_string(),
            api_key: None,
            device_id: None,
            timeout_secs: 10,
        }
    }
}
