//! Sensor module - reading types and the sources the housekeeping loop pulls from

mod manager;
mod traits;
mod simulator;
mod http;
mod harvia;

pub use manager::{SensorHealth, SensorManager};
pub use traits::{SaunaStatus, SensorData, SensorEnvelope, SensorError, SensorReading, SensorSource};
pub use simulator::{RandomSensor, SequentialSensor, DEMO_DEVICE_ID};
pub use http::HttpSensor;
pub use harvia::HarviaClient;
