//! Radio energy model
//!
//! The first-order radio model charges every transmitted or received bit
//! for the electronics, and transmissions additionally for the amplifier.
//! The amplifier term switches from free-space (`d²`) to multipath (`d⁴`)
//! propagation at the crossover distance `d0 = sqrt(eps_fs / eps_mp)`.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Cost function used by every energy-debiting node operation
pub trait EnergyModel: Debug {
    /// Joules spent sending `bits` over `distance` metres
    fn tx_cost(&self, bits: u64, distance: f64) -> f64;

    /// Joules spent receiving `bits`
    fn rx_cost(&self, bits: u64) -> f64;
}

/// First-order radio model constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FirstOrderRadio {
    /// Electronics energy per bit (J/bit)
    pub e_elec: f64,
    /// Free-space amplifier energy (J/bit/m²)
    pub eps_fs: f64,
    /// Multipath amplifier energy (J/bit/m⁴)
    pub eps_mp: f64,
}

impl FirstOrderRadio {
    /// Distance at which the multipath term takes over
    pub fn crossover_distance(&self) -> f64 {
        (self.eps_fs / self.eps_mp).sqrt()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("e_elec", self.e_elec),
            ("eps_fs", self.eps_fs),
            ("eps_mp", self.eps_mp),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidRadioConstant { name, value });
            }
        }
        if self.eps_mp == 0.0 {
            return Err(ConfigError::InvalidRadioConstant {
                name: "eps_mp",
                value: self.eps_mp,
            });
        }
        Ok(())
    }
}

impl Default for FirstOrderRadio {
    fn default() -> Self {
        Self {
            e_elec: 50e-9,
            eps_fs: 10e-12,
            eps_mp: 0.0013e-12,
        }
    }
}

impl EnergyModel for FirstOrderRadio {
    fn tx_cost(&self, bits: u64, distance: f64) -> f64 {
        let bits = bits as f64;
        let amplifier = if distance < self.crossover_distance() {
            self.eps_fs * distance.powi(2)
        } else {
            self.eps_mp * distance.powi(4)
        };
        bits * self.e_elec + bits * amplifier
    }

    fn rx_cost(&self, bits: u64) -> f64 {
        bits as f64 * self.e_elec
    }
}
