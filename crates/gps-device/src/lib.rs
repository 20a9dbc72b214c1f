//! Serial GPS Receiver Device
//!
//! This crate drives a SiRF Star IV class receiver (e.g. the BU-353S4) over
//! a serial line. A background thread moves raw bytes into a bounded ring;
//! each consumer tick reassembles sentences, decodes them, and smooths the
//! published position.

mod config;
mod device;
mod error;
mod filter;
mod producer;
mod reassembler;
mod serial;
mod types;

pub use config::{DeviceConfig, COLD_RESTART_COMMAND};
pub use device::GpsDevice;
pub use error::GpsError;
pub use filter::{deg_min_to_decimal, ExponentialFilter, PositionFilter};
pub use reassembler::{reassemble, Reassembled};
pub use serial::{baud_constant, Connector, SerialIo, SerialLink, TtyConnector};
pub use types::{DeviceState, GpsSnapshot, PositionEstimate, TickStatus, UtcTime};
