//! Error types for the WSN simulator
//!
//! Node death is an expected runtime condition and never appears here.
//! These errors cover misconfiguration, which is rejected before a
//! simulation starts, and invalid calls on the adaptive control surface.

use thiserror::Error;

use crate::types::NodeId;

/// Top-level error type
#[derive(Debug, Error)]
pub enum WsnError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Deployment error: {0}")]
    Deployment(#[from] DeploymentError),

    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),
}

/// Errors in protocol configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Cluster count must be at least 1, got {0}")]
    InvalidClusterCount(usize),

    #[error("Invalid threshold {name}: {value}")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("Aggregation rate must be in (0, 1], got {0}")]
    InvalidAggregationRate(f64),

    #[error("Aggregation energy must be finite and non-negative, got {0}")]
    InvalidAggregationEnergy(f64),

    #[error("Message size {name} must be positive")]
    ZeroMessageSize { name: &'static str },

    #[error("Setup interval must be at least 1 round")]
    InvalidSetupInterval,

    #[error("Invalid radio constant {name}: {value}")]
    InvalidRadioConstant { name: &'static str, value: f64 },

    #[error("Failed to read configuration: {0}")]
    Io(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Errors in the node population handed to the engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeploymentError {
    #[error("Deployment has no sensors")]
    NoSensors,

    #[error("Non-finite coordinate for sensor {index}: ({x}, {y})")]
    NonFiniteCoordinate { index: usize, x: f64, y: f64 },

    #[error("Initial energy must be finite and positive, got {0}")]
    InvalidInitialEnergy(f64),

    #[error("Invalid placement area: {0}")]
    InvalidArea(String),
}

/// Errors from the adaptive parameter control surface
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("The sink cannot carry cluster parameters")]
    SinkNotAllowed,

    #[error("Invalid threshold {name}: {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
}

/// Result type alias using WsnError
pub type WsnResult<T> = Result<T, WsnError>;
