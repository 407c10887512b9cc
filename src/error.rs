//! Typed error enums for each module boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("invalid planner input: {0}")]
    InvalidInput(String),
    #[error("non-finite value encountered during {0}")]
    NumericalDivergence(&'static str),
    #[error("time-scaling search failed to converge")]
    ConvergenceFailure,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("system fault active, control worker stopping")]
    SystemFault,
    #[error("non-finite error or force on axis {axis}")]
    NonFiniteValue { axis: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum CsvSinkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
