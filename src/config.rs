//! TOML configuration for the engine's ambient stack: transport port,
//! telemetry sink path, plant defaults, axis count, and log level.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub log_level: LogLevelConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            telemetry: TelemetryConfig::default(),
            engine: EngineConfig::default(),
            log_level: LogLevelConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransportConfig {
    pub port: u16,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { port: 8081 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    pub csv_path: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { csv_path: "telemetry.csv".to_string() }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    pub axis_count: usize,
    pub default_mass: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { axis_count: 2, default_mass: crate::engine::DEFAULT_MASS }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevelConfig {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevelConfig {
    fn default() -> Self {
        LogLevelConfig::Info
    }
}

impl LogLevelConfig {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevelConfig::Trace => "trace",
            LogLevelConfig::Debug => "debug",
            LogLevelConfig::Info => "info",
            LogLevelConfig::Warn => "warn",
            LogLevelConfig::Error => "error",
        }
    }
}

pub fn load_config(path: &str) -> Result<Config, crate::error::ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}
