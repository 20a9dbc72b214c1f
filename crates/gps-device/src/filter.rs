//! Position Smoothing
//!
//! Exponentially weighted smoothing of altitude and decimal-degree position,
//! plus the satellite-count validity rule.

use crate::types::PositionEstimate;
use nmea_decoder::NmeaInfo;

/// Convert `DDDMM.MMMM` (degrees followed by decimal minutes) to decimal
/// degrees. The sign of the input is kept.
pub fn deg_min_to_decimal(value: f64) -> f64 {
    let degrees = (value / 100.0).trunc();
    let minutes = value - degrees * 100.0;
    degrees + minutes / 60.0
}

/// Single-pole exponential smoother
#[derive(Debug, Clone, Copy)]
pub struct ExponentialFilter {
    /// Weight of the new sample (0-1)
    weight: f64,
}

impl ExponentialFilter {
    /// Create a filter; `weight` is clamped to [0, 1]
    pub fn new(weight: f64) -> Self {
        Self {
            weight: weight.clamp(0.0, 1.0),
        }
    }

    /// `weight * sample + (1 - weight) * prior`
    pub fn update(&self, prior: f64, sample: f64) -> f64 {
        self.weight * sample + (1.0 - self.weight) * prior
    }
}

/// Applies decoded fixes to a [`PositionEstimate`]
#[derive(Debug, Clone, Copy)]
pub struct PositionFilter {
    ema: ExponentialFilter,
    min_satellites: u32,
}

impl PositionFilter {
    pub fn new(weight: f64, min_satellites: u32) -> Self {
        Self {
            ema: ExponentialFilter::new(weight),
            min_satellites,
        }
    }

    /// Smooth altitude, latitude, and longitude toward the decoded values
    pub fn update(&self, estimate: &mut PositionEstimate, info: &NmeaInfo) {
        estimate.altitude = self.ema.update(estimate.altitude, info.elevation);
        estimate.latitude = self
            .ema
            .update(estimate.latitude, deg_min_to_decimal(info.latitude));
        estimate.longitude = self
            .ema
            .update(estimate.longitude, deg_min_to_decimal(info.longitude));
    }

    /// A position is valid once enough satellites are reported
    pub fn is_valid(&self, satellite_count: u32) -> bool {
        satellite_count >= self.min_satellites
    }
}
