//! Simulation configuration
//!
//! Loaded from TOML, every field optional:
//!
//! ```toml
//! protocol = "apteen"
//! n_cluster = 5
//! size_control = 128
//! size_data = 4096
//! seed = 7
//!
//! [thresholds]
//! hard = 50.0
//! soft = 2.0
//! count_time = 10
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use wsn_core::{ConfigError, FirstOrderRadio, TeenThresholds};

use crate::types::Protocol;

/// Configuration for the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Which protocol preset to assemble
    pub protocol: Protocol,
    /// Target number of cluster heads per setup phase
    pub n_cluster: usize,
    /// Control message size in bits
    pub size_control: u64,
    /// Data message size in bits
    pub size_data: u64,
    /// Aggregation energy per input bit (J/bit)
    pub energy_agg: f64,
    /// Fraction of the combined payload a head forwards after aggregation
    pub agg_rate: f64,
    /// Rounds between setup phases
    pub setup_interval: u64,
    /// Seed for election and sensing noise; `None` draws one from the OS
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Stop after this many rounds even if sensors remain alive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rounds: Option<u64>,
    /// Keep a [`crate::types::SimEvent`] log
    pub record_events: bool,
    /// Trace every per-node transmission decision
    pub trace_decisions: bool,
    /// Global TEEN defaults
    pub thresholds: TeenThresholds,
    /// Radio model constants
    pub radio: FirstOrderRadio,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::Apteen,
            n_cluster: 5,
            size_control: 128,
            size_data: 4096,
            energy_agg: 5e-9,
            agg_rate: 0.6,
            setup_interval: 1,
            seed: None,
            max_rounds: None,
            record_events: true,
            trace_decisions: false,
            thresholds: TeenThresholds::default(),
            radio: FirstOrderRadio::default(),
        }
    }
}

impl SimConfig {
    /// Default configuration for a protocol
    pub fn for_protocol(protocol: Protocol) -> Self {
        Self {
            protocol,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_cluster == 0 {
            return Err(ConfigError::InvalidClusterCount(self.n_cluster));
        }
        if self.size_control == 0 {
            return Err(ConfigError::ZeroMessageSize {
                name: "size_control",
            });
        }
        if self.size_data == 0 {
            return Err(ConfigError::ZeroMessageSize { name: "size_data" });
        }
        if !self.energy_agg.is_finite() || self.energy_agg < 0.0 {
            return Err(ConfigError::InvalidAggregationEnergy(self.energy_agg));
        }
        if !(self.agg_rate > 0.0 && self.agg_rate <= 1.0) {
            return Err(ConfigError::InvalidAggregationRate(self.agg_rate));
        }
        if self.setup_interval == 0 {
            return Err(ConfigError::InvalidSetupInterval);
        }
        self.thresholds.validate()?;
        self.radio.validate()
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: SimConfig =
            toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
