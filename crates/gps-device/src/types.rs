//! Published GPS Records

use nmea_decoder::UtcFields;
use serde::{Deserialize, Serialize};

/// Precision UTC time of day
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UtcTime {
    /// hours*3600 + minutes*60 + seconds
    pub whole_seconds: f64,
    /// Fraction of a second in [0, 1)
    pub fraction_seconds: f64,
    /// Offset from the time source (always 0)
    pub offset: f64,
    /// Time code mode (0 = UTC)
    pub mode: i16,
    /// 1 once stamped from a decoded sentence
    pub status: i16,
}

impl UtcTime {
    /// Build a stamp from decoded time-of-day fields
    pub fn from_fields(utc: &UtcFields) -> Self {
        Self {
            whole_seconds: 60.0 * (60.0 * f64::from(utc.hour) + f64::from(utc.min))
                + f64::from(utc.sec),
            // Receiver reports hundredths of a second
            fraction_seconds: f64::from(utc.hsec) / 100.0,
            offset: 0.0,
            mode: 0,
            status: 1,
        }
    }
}

/// Satellite summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GpsSnapshot {
    pub satellite_count: u32,
    pub timestamp: UtcTime,
}

/// Smoothed position with validity flag
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionEstimate {
    /// Decimal degrees, south negative
    pub latitude: f64,
    /// Decimal degrees, west negative
    pub longitude: f64,
    /// Metres above mean sea level
    pub altitude: f64,
    pub valid: bool,
    pub timestamp: UtcTime,
}

/// Outcome of one consumer tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    /// Not enough buffered bytes; the scheduler may idle
    NoWork,
    /// Buffer drained and decoded
    DataProcessed,
}

/// Lifecycle state of the device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceState {
    #[default]
    Stopped,
    Connecting,
    Running,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utc_from_fields() {
        let stamp = UtcTime::from_fields(&UtcFields {
            hour: 12,
            min: 34,
            sec: 56,
            hsec: 78,
        });

        assert_eq!(stamp.whole_seconds, 45296.0);
        assert!((stamp.fraction_seconds - 0.78).abs() < 1e-12);
        assert_eq!(stamp.status, 1);
    }

    #[test]
    fn test_default_stamp_is_unset() {
        assert_eq!(UtcTime::default().status, 0);
        assert!(!PositionEstimate::default().valid);
    }
}
