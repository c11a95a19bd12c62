//! Inbound ports (driving side): contracts used by inbound adapters to drive
//! the application.

pub mod control;

pub use control::{ControlCall, ControlHandler, ControlRequest, ControlResponse};
