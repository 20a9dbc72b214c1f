//! GPS device configuration

use crate::error::GpsError;
use crate::serial::baud_constant;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// SiRF Star IV cold restart directive
pub const COLD_RESTART_COMMAND: &str = "$PSRF101,0,0,0,0,0,0,12,4*10\r\n";

/// Receiver and pipeline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Serial device path (e.g., "/dev/ttyUSB0")
    pub serial_port: String,

    /// Line speed; the BU-353S4 defaults to 4800
    pub baud_rate: u32,

    /// Command written once after every successful connect
    pub reset_command: String,

    /// Byte ring capacity
    pub buffer_capacity: usize,

    /// A tick only drains the ring once it holds more than this many bytes
    pub drain_threshold: usize,

    /// Maximum bytes per serial read
    pub read_chunk: usize,

    /// Settle time before the first read after a cold restart (milliseconds)
    pub warmup_ms: u64,

    /// Pause between reads (microseconds)
    pub pacing_us: u64,

    /// Weight of a new sample in the position filter
    pub smoothing_weight: f64,

    /// Satellites required for a valid position
    pub min_satellites: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            serial_port: "/dev/ttyUSB0".to_string(),
            baud_rate: 4800,
            reset_command: COLD_RESTART_COMMAND.to_string(),
            buffer_capacity: ring_buffer::DEFAULT_CAPACITY,
            drain_threshold: 64,
            read_chunk: 128,
            warmup_ms: 1000,
            pacing_us: 1,
            smoothing_weight: 0.1,
            min_satellites: 5,
        }
    }
}

impl DeviceConfig {
    /// Warm-up delay as a duration
    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }

    /// Read pacing as a duration
    pub fn pacing(&self) -> Duration {
        Duration::from_micros(self.pacing_us)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<(), GpsError> {
        if self.buffer_capacity == 0 {
            return Err(GpsError::InvalidConfig(
                "buffer_capacity must be > 0".to_string(),
            ));
        }
        // The ring never holds more than its capacity, so a tick would never drain
        if self.drain_threshold >= self.buffer_capacity {
            return Err(GpsError::InvalidConfig(format!(
                "drain_threshold ({}) must be below buffer_capacity ({})",
                self.drain_threshold, self.buffer_capacity
            )));
        }
        if self.read_chunk == 0 {
            return Err(GpsError::InvalidConfig(
                "read_chunk must be > 0".to_string(),
            ));
        }
        if !(self.smoothing_weight > 0.0 && self.smoothing_weight <= 1.0) {
            return Err(GpsError::InvalidConfig(format!(
                "smoothing_weight ({}) must be in (0, 1]",
                self.smoothing_weight
            )));
        }
        baud_constant(self.baud_rate)?;
        Ok(())
    }
}
