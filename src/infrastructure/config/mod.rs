//! Infrastructure configuration modules.

pub mod logging;
pub mod services;
pub mod settings;

pub use logging::LoggingConfig;
pub use services::ServicesConfig;
pub use settings::Config;
