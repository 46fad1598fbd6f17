use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::logger_config::LoggerConfig;
use crate::frontend::Settings;

/// Host settings for the I/O subsystem.
/// Please use [`IoConfigBuilder`] if you want to build it from code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// Ask for every console value through a modal prompt.
    pub use_popup_for_input: bool,
    /// Resolve relative guest paths against the loaded program's directory.
    pub derive_working_directory_from_program: bool,
    /// Path of the loaded guest program.
    pub program_path: Option<PathBuf>,
    /// Minimum spacing between two deliveries to the front end.
    pub flush_interval_ms: u64,
    pub logger_config: Option<LoggerConfig>,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            use_popup_for_input: false,
            derive_working_directory_from_program: false,
            program_path: None,
            flush_interval_ms: 100,
            logger_config: Some(Default::default()),
        }
    }
}

impl IoConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parse io config")
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
        Self::from_toml_str(&s).with_context(|| format!("load {:?}", path))
    }
}

impl Settings for IoConfig {
    fn use_popup_for_input(&self) -> bool {
        self.use_popup_for_input
    }

    fn derive_working_directory_from_program(&self) -> bool {
        self.derive_working_directory_from_program
    }

    fn loaded_program(&self) -> Option<PathBuf> {
        self.program_path.clone()
    }

    fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}

/// `IoConfigBuilder` is a convenience builder to create an `IoConfig` from code.
pub struct IoConfigBuilder {
    config: IoConfig,
}

impl Default for IoConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IoConfigBuilder {
    pub fn new() -> Self {
        Self { config: Default::default() }
    }

    pub fn with_popup_input(mut self, enabled: bool) -> Self {
        self.config.use_popup_for_input = enabled;
        self
    }

    /// Sets the loaded program and resolves relative paths against its directory.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.config.program_path = Some(program.into());
        self.config.derive_working_directory_from_program = true;
        self
    }

    pub fn with_flush_interval_ms(mut self, ms: u64) -> Self {
        self.config.flush_interval_ms = ms;
        self
    }

    pub fn with_logger_config(mut self, logger_config: LoggerConfig) -> Self {
        self.config.logger_config = Some(logger_config);
        self
    }

    /// Retrieves the configuration built
    pub fn get(self) -> IoConfig {
        self.config
    }
}
