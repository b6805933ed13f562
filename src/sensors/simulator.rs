// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Sensor simulators for demo/testing

use async_trait::async_trait;
use anyhow::Result;
use chrono::{DateTime, Utc};
use rand::prelude::*;
use rand_distr::Normal;
use std::sync::Mutex;

use super::{SaunaStatus, SensorData, SensorReading, SensorSource};

/// Device id reported by the installation's sauna sensor
pub const DEMO_DEVICE_ID: &str = "f3673bfa-d2c5-4571-9268-5dbd7f9272e0";

const TARGET_TEMP: f64 = 80.0;

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn reading_shell(session_id: String, timestamp: String, data: SensorData) -> SensorReading {
    SensorReading {
        device_id: DEMO_DEVICE_ID.to_string(),
        shadow_name: "C1".to_string(),
        sub_id: "C1".to_string(),
        kind: "SaunaSensor".to_string(),
        organization: "ORG/prod:0:1190:1".to_string(),
        session_id,
        data,
        timestamp,
    }
}

/// Randomized readings shaped like the real sauna sensor
pub struct RandomSensor {
    rng: Mutex<StdRng>,
}

impl RandomSensor {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Generate one reading stamped with `now`
    pub fn reading_at(&self, now: DateTime<Utc>) -> SensorReading {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        Self::generate(&mut rng, now)
    }

    /// Generate `count` readings, each 10 seconds older than the previous one
    pub fn batch_at(&self, count: usize, now: DateTime<Utc>) -> Vec<SensorReading> {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        (0..count)
            .map(|i| Self::generate(&mut rng, now - chrono::Duration::seconds(10 * i as i64)))
            .collect()
    }

    fn generate(rng: &mut StdRng, now: DateTime<Utc>) -> SensorReading {
        let status = match rng.gen_range(1..=3) {
            1 => SaunaStatus::CoolingDown,
            2 => SaunaStatus::HeatingUp,
            _ => SaunaStatus::AtTemperature,
        };

        let (temp, presence, time_to_target) = match status {
            SaunaStatus::CoolingDown => (rng.gen_range(70.0..80.0), 0, 0),
            SaunaStatus::HeatingUp => (rng.gen_range(40.0..75.0), 0, rng.gen_range(10..=180)),
            SaunaStatus::AtTemperature => (rng.gen_range(78.0..82.0), rng.gen_range(0..=1), 0),
        };

        let session_start = now.timestamp() - rng.gen_range(0..=3600);

        let data = SensorData {
            heap_size: 85212,
            rssi: rng.gen_range(-70..=-60),
            temp_esp: round_to(rng.gen_range(42.0..46.0), 1),
            target_temp: TARGET_TEMP,
            presence,
            temp: round_to(temp, 2),
            sauna_status: status.code(),
            battery_load_v: round_to(rng.gen_range(10.1..10.2), 3),
            reset_cnt: 2,
            hum: round_to(rng.gen_range(12.0..52.0), 2),
            battery_voltage: round_to(rng.gen_range(10.4..10.5), 3),
            time_to_target,
        };

        reading_shell(
            format!("{}_{}", DEMO_DEVICE_ID, session_start),
            now.timestamp_millis().to_string(),
            data,
        )
    }
}

impl Default for RandomSensor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SensorSource for RandomSensor {
    fn name(&self) -> &str {
        "random"
    }

    async fn fetch(&self) -> Result<SensorReading> {
        Ok(self.reading_at(Utc::now()))
    }
}

struct Sequence {
    step: u64,
    temp: f64,
    steam: f64,
    rng: StdRng,
}

/// Deterministic replay of a heating session with periodic steam throws.
///
/// The sauna warms toward its target temperature while humidity sits at a
/// baseline. Every `throw_every` readings a throw adds `burst` to humidity,
/// which then decays geometrically back toward the baseline.
pub struct SequentialSensor {
    session_id: String,
    baseline_hum: f64,
    burst: f64,
    decay: f64,
    throw_every: u64,
    state: Mutex<Sequence>,
}

impl SequentialSensor {
    pub fn new() -> Self {
        Self::with_profile(15.0, 25.0, 0.6, 6)
    }

    pub fn with_profile(baseline_hum: f64, burst: f64, decay: f64, throw_every: u64) -> Self {
        Self {
            session_id: format!("{}_{}", DEMO_DEVICE_ID, Utc::now().timestamp()),
            baseline_hum,
            burst,
            decay,
            throw_every: throw_every.max(1),
            state: Mutex::new(Sequence {
                step: 0,
                temp: 22.0,
                steam: 0.0,
                rng: StdRng::seed_from_u64(0x10e1),
            }),
        }
    }

    /// Advance the replay by one reading
    pub fn next_reading(&self, now: DateTime<Utc>) -> SensorReading {
        let mut seq = self.state.lock().unwrap_or_else(|e| e.into_inner());

        seq.step += 1;
        seq.temp += (TARGET_TEMP - seq.temp) * 0.15;
        seq.steam *= self.decay;
        if seq.step % self.throw_every == 0 {
            seq.steam += self.burst;
        }

        let jitter = Normal::new(0.0, 0.2).map(|n| seq.rng.sample(n)).unwrap_or(0.0);
        let at_temperature = TARGET_TEMP - seq.temp < 2.0;
        let status = if at_temperature {
            SaunaStatus::AtTemperature
        } else {
            SaunaStatus::HeatingUp
        };
        let time_to_target = if at_temperature {
            0
        } else {
            ((TARGET_TEMP - seq.temp) * 1.5).ceil() as i64
        };

        let data = SensorData {
            heap_size: 85212,
            rssi: -65,
            temp_esp: round_to(42.0 + seq.temp / 40.0, 1),
            target_temp: TARGET_TEMP,
            presence: i64::from(at_temperature),
            temp: round_to(seq.temp + jitter, 2),
            sauna_status: status.code(),
            battery_load_v: 10.15,
            reset_cnt: 2,
            hum: round_to(self.baseline_hum + seq.steam, 2),
            battery_voltage: 10.45,
            time_to_target,
        };

        reading_shell(
            self.session_id.clone(),
            now.timestamp_millis().to_string(),
            data,
        )
    }
}

impl Default for SequentialSensor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SensorSource for SequentialSensor {
    fn name(&self) -> &str {
        "sequential"
    }

    async fn fetch(&self) -> Result<SensorReading> {
        Ok(self.next_reading(Utc::now()))
    }
}
