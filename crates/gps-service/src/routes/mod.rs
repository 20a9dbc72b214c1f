pub mod gps;
pub mod position;
