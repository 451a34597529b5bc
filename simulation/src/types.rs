//! Core types for the WSN lifetime simulation
//!
//! Protocol selection, the event log and the per-round diagnostics that
//! reporting collaborators read.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use wsn_core::{NodeId, RouteBuilder, TeenThresholds, TransmissionPolicy};
use wsn_routing::{DirectRouter, PrimRouter};

use crate::policy::{AlwaysTransmit, ThresholdGated};

/// Protocol presets assembled from routing and transmission capabilities
///
/// | Protocol    | Head routing | Transmission     |
/// |-------------|--------------|------------------|
/// | `leach`     | single hop   | always           |
/// | `leach-prim`| Prim tree    | always           |
/// | `apteen`    | Prim tree    | TEEN thresholds  |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Protocol {
    Leach,
    LeachPrim,
    #[default]
    Apteen,
}

impl Protocol {
    pub fn router(&self) -> Box<dyn RouteBuilder> {
        match self {
            Protocol::Leach => Box::new(DirectRouter),
            Protocol::LeachPrim | Protocol::Apteen => Box::new(PrimRouter),
        }
    }

    pub fn policy(&self) -> Box<dyn TransmissionPolicy> {
        match self {
            Protocol::Leach | Protocol::LeachPrim => Box::new(AlwaysTransmit),
            Protocol::Apteen => Box::new(ThresholdGated),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Protocol::Leach => "LEACH",
            Protocol::LeachPrim => "LEACH-Prim",
            Protocol::Apteen => "APTEEN",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Events recorded by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// Clusters and routes were rebuilt
    SetupCompleted {
        round: u64,
        heads: usize,
        alive: usize,
    },
    /// Nobody self-elected, so a head was forced into office
    FallbackHeadElected { head: NodeId, round: u64 },
    /// A head pushed its thresholds to its members
    ParametersBroadcast {
        head: NodeId,
        members: usize,
        thresholds: TeenThresholds,
        round: u64,
    },
    /// The sink query replaced the global thresholds
    ParametersUpdated {
        thresholds: TeenThresholds,
        overrides_cleared: usize,
        round: u64,
    },
    ClusterOverrideSet {
        head: NodeId,
        thresholds: TeenThresholds,
        round: u64,
    },
    ClusterOverrideCleared { head: NodeId, round: u64 },
    NodeDied { node: NodeId, round: u64 },
    /// Every sensor is dead
    NetworkExhausted { round: u64 },
}

impl SimEvent {
    pub fn round(&self) -> u64 {
        match self {
            SimEvent::SetupCompleted { round, .. }
            | SimEvent::FallbackHeadElected { round, .. }
            | SimEvent::ParametersBroadcast { round, .. }
            | SimEvent::ParametersUpdated { round, .. }
            | SimEvent::ClusterOverrideSet { round, .. }
            | SimEvent::ClusterOverrideCleared { round, .. }
            | SimEvent::NodeDied { round, .. }
            | SimEvent::NetworkExhausted { round } => *round,
        }
    }
}

/// Diagnostics for one executed round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: u64,
    /// Alive sensors after the round
    pub alive: usize,
    pub cluster_heads: usize,
    /// Sensors that reported this round
    pub transmitting: usize,
    /// Member slots left empty by the transmission policy
    pub empty_slots: usize,
    /// Mean remaining energy over all sensors, dead ones included
    pub average_energy: f64,
    pub energy_spent: f64,
    pub bits_to_sink: u64,
}

/// Lifetime milestones of one run, for side-by-side comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifetimeReport {
    pub label: String,
    /// Round in which the first sensor died
    pub first_death: Option<u64>,
    /// Round in which the last sensor died
    pub last_death: Option<u64>,
}

impl LifetimeReport {
    /// Rounds between first and last death
    pub fn degradation(&self) -> Option<u64> {
        match (self.first_death, self.last_death) {
            (Some(first), Some(last)) => Some(last.saturating_sub(first)),
            _ => None,
        }
    }
}

impl fmt::Display for LifetimeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: Option<u64>| v.map_or_else(|| "-".to_string(), |r| r.to_string());
        write!(
            f,
            "{:<14} first death {:>6}  last death {:>6}  degradation {:>6}",
            self.label,
            show(self.first_death),
            show(self.last_death),
            show(self.degradation())
        )
    }
}
