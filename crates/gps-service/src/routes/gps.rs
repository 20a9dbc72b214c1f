//! Receiver status route

use axum::{extract::State, Json};
use gps_device::{DeviceState, GpsSnapshot};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

/// Satellite summary plus link details
#[derive(Debug, Serialize)]
pub struct GpsResponse {
    pub state: DeviceState,
    pub serial_port: String,
    pub baud_rate: u32,
    pub buffered_bytes: usize,
    /// Bytes read since the last start
    pub bytes_received: usize,
    pub snapshot: GpsSnapshot,
}

/// Get the satellite snapshot and link state
pub async fn get_gps(State(state): State<Arc<AppState>>) -> Json<GpsResponse> {
    let device = &state.device;
    Json(GpsResponse {
        state: device.state(),
        serial_port: device.serial_port(),
        baud_rate: device.config().baud_rate,
        buffered_bytes: device.buffered_len(),
        bytes_received: device.bytes_received(),
        snapshot: device.gps_snapshot(),
    })
}
