//! Position route

use axum::{extract::State, Json};
use gps_device::{PositionEstimate, UtcTime};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

/// Smoothed position as served to clients
#[derive(Debug, Serialize)]
pub struct PositionResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub valid: bool,
    /// Seconds since UTC midnight, fraction included
    pub utc_seconds: f64,
    pub timestamp: UtcTime,
}

impl From<PositionEstimate> for PositionResponse {
    fn from(estimate: PositionEstimate) -> Self {
        Self {
            latitude: estimate.latitude,
            longitude: estimate.longitude,
            altitude: estimate.altitude,
            valid: estimate.valid,
            utc_seconds: estimate.timestamp.whole_seconds + estimate.timestamp.fraction_seconds,
            timestamp: estimate.timestamp,
        }
    }
}

/// Get the latest smoothed position
pub async fn get_position(State(state): State<Arc<AppState>>) -> Json<PositionResponse> {
    Json(state.device.position_estimate().into())
}
