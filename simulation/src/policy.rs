//! Transmission policies and threshold presets
//!
//! [`ThresholdGated`] is the TEEN decision rule:
//!
//! 1. Below the hard threshold: stay silent
//! 2. Never transmitted: report
//! 3. Changed by at least the soft threshold since the last report: report
//! 4. Silent for at least the count time: report
//! 5. Otherwise the TDMA slot stays empty

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use wsn_core::{Decision, TeenThresholds, Transmission, TransmissionPolicy};

/// Every alive node reports every round (LEACH)
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysTransmit;

impl TransmissionPolicy for AlwaysTransmit {
    fn name(&self) -> &'static str {
        "always"
    }

    fn should_transmit(&self, _decision: &Decision) -> bool {
        true
    }
}

/// Hard/soft threshold plus count-time reporting (TEEN)
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdGated;

impl TransmissionPolicy for ThresholdGated {
    fn name(&self) -> &'static str {
        "teen"
    }

    fn should_transmit(&self, decision: &Decision) -> bool {
        let t = &decision.thresholds;
        if decision.value < t.hard {
            return false;
        }
        match decision.last_transmission {
            Transmission::Unset => true,
            Transmission::Value(last) => {
                (decision.value - last).abs() >= t.soft
                    || decision.rounds_since_transmission >= t.count_time
            }
        }
    }

    fn announces_parameters(&self) -> bool {
        true
    }
}

/// Named `(HT, ST, TC)` combinations for comparing reporting behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ThresholdPreset {
    /// Reports practically every round
    LeachLike,
    /// Event driven with a very long forced-update period
    TeenLike,
    Conservative,
    Aggressive,
    Balanced,
}

impl ThresholdPreset {
    pub const ALL: [ThresholdPreset; 5] = [
        ThresholdPreset::LeachLike,
        ThresholdPreset::TeenLike,
        ThresholdPreset::Conservative,
        ThresholdPreset::Aggressive,
        ThresholdPreset::Balanced,
    ];

    pub fn thresholds(&self) -> TeenThresholds {
        match self {
            ThresholdPreset::LeachLike => TeenThresholds::new(0.1, 0.1, 1),
            ThresholdPreset::TeenLike => TeenThresholds::new(50.0, 3.0, 1000),
            ThresholdPreset::Conservative => TeenThresholds::new(70.0, 5.0, 20),
            ThresholdPreset::Aggressive => TeenThresholds::new(40.0, 1.0, 5),
            ThresholdPreset::Balanced => TeenThresholds::new(50.0, 2.0, 10),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ThresholdPreset::LeachLike => "LEACH-like",
            ThresholdPreset::TeenLike => "TEEN-like",
            ThresholdPreset::Conservative => "Conservative",
            ThresholdPreset::Aggressive => "Aggressive",
            ThresholdPreset::Balanced => "Balanced",
        }
    }
}

impl fmt::Display for ThresholdPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.thresholds())
    }
}
