//! Operator command line.

pub mod command;
pub mod dispatch;
pub mod lifecycle;
pub mod logs;
pub mod output;
pub mod setup;
pub mod status;
