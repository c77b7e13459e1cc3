//! CLI runner for common setup and operations.
//!
//! Encapsulates configuration loading, logging initialization, the Tokio
//! runtime and application construction shared by command handlers.

use std::future::Future;

use tokio::runtime::Runtime;
use tracing::info;

use geotrack::app::{AppConfig, TrackerApp};
use geotrack::config::ConfigFile;
use geotrack::logging::{init_logging, LoggingGuard};

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
    runtime: Runtime,
}

impl CliRunner {
    /// Load config, initialize logging and create the runtime.
    ///
    /// # Arguments
    ///
    /// * `debug_mode` - When true, enables debug-level logging regardless of RUST_LOG
    /// * `stdout_logging` - Mirror log output to stdout (long-running commands)
    pub fn new(debug_mode: bool, stdout_logging: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let logging_guard = init_logging(&config.logging.file, stdout_logging, debug_mode)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        let runtime = Runtime::new().map_err(|e| CliError::Runtime(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
            runtime,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("geotrack v{}", geotrack::VERSION);
        info!("geotrack CLI: {} command", command);
    }

    /// Translate the config file into the application config.
    pub fn app_config(&self) -> Result<AppConfig, CliError> {
        Ok(AppConfig::from_config_file(&self.config)?)
    }

    /// Build the application without starting the tracker.
    pub fn open_app(&self) -> Result<TrackerApp, CliError> {
        let config = self.app_config()?;
        // Components that spawn tasks expect to be created inside the runtime.
        let _guard = self.runtime.enter();
        Ok(TrackerApp::open(config)?)
    }

    /// Run a future to completion on the runner's runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}
