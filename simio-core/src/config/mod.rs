pub mod io_config;
pub mod logger_config;

pub use io_config::{IoConfig, IoConfigBuilder};
pub use logger_config::LoggerConfig;
