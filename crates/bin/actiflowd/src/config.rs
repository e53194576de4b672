//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `actiflow.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use actiflow_adapter_virtual::{VirtualBoard, demo};
use actiflow_app::runner::DEFAULT_QUEUE_CAPACITY;
use actiflow_domain::error::{ActiflowError, UnknownCapabilityError};
use actiflow_domain::graph::ActivityGraph;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Engine tuning.
    pub engine: EngineConfig,
    /// Which activity graph to run.
    pub graph: GraphConfig,
    /// Virtual board setup.
    pub board: BoardConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Engine configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Spacing between reads inside a sampling window, in milliseconds.
    pub sample_poll_ms: u64,
    /// Inputs buffered per instance before producers wait.
    pub queue_capacity: usize,
    /// How often watched sensors are polled, in milliseconds.
    pub feed_interval_ms: u64,
    /// Longest a remote send may hold up an instance, in milliseconds.
    pub send_timeout_ms: u64,
    /// Start the instance as soon as the daemon is up.
    pub autostart: bool,
}

/// Graph source. Without a path the built-in alarm graph runs.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// JSON graph definition.
    pub path: Option<PathBuf>,
}

/// Initial sensor levels of the virtual board.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub levels: BTreeMap<String, f64>,
}

impl Config {
    /// Load configuration from `actiflow.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if
    /// the resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("actiflow.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("ACTIFLOW_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("ACTIFLOW_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("ACTIFLOW_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Some(val) = var("ACTIFLOW_GRAPH") {
            self.graph.path = Some(PathBuf::from(val));
        }
        if let Some(val) = var("ACTIFLOW_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.engine.queue_capacity == 0 {
            return Err(ConfigError::Validation(
                "queue_capacity must be non-zero".to_string(),
            ));
        }
        if self.engine.sample_poll_ms == 0 || self.engine.feed_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "polling intervals must be non-zero".to_string(),
            ));
        }
        if self.engine.send_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "send_timeout_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl EngineConfig {
    #[must_use]
    pub fn sample_poll(&self) -> Duration {
        Duration::from_millis(self.sample_poll_ms)
    }

    #[must_use]
    pub fn feed_interval(&self) -> Duration {
        Duration::from_millis(self.feed_interval_ms)
    }

    #[must_use]
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

impl GraphConfig {
    /// Read the configured graph, or build the built-in one.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not hold a
    /// valid graph definition.
    pub fn load(&self) -> Result<ActivityGraph, ConfigError> {
        let Some(path) = &self.path else {
            return Ok(demo::alarm_graph()?);
        };
        let content = std::fs::read_to_string(path)?;
        Ok(ActivityGraph::from_json(&content)?)
    }
}

impl BoardConfig {
    /// The default virtual board with the configured levels applied.
    ///
    /// # Errors
    ///
    /// Returns an error if a level names a sensor the board does not have.
    pub fn build(&self) -> Result<VirtualBoard, ConfigError> {
        let board = VirtualBoard::default();
        for (name, level) in &self.levels {
            board.set_level(name, *level)?;
        }
        Ok(board)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "actiflowd=info,actiflow_app=info,actiflow_adapter_virtual=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_poll_ms: 100,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            feed_interval_ms: 250,
            send_timeout_ms: 2000,
            autostart: true,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
    /// The graph definition could not be used.
    #[error("invalid graph definition")]
    Graph(#[from] ActiflowError),
    /// A board level names a missing sensor.
    #[error("invalid board configuration")]
    Board(#[from] UnknownCapabilityError),
}
