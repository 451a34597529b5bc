//! Sensor and sink nodes
//!
//! Every energy-debiting operation returns the joules actually spent. A dead
//! node spends nothing, and a debit never takes the budget below zero. The
//! sink is mains-powered: its operations are free and it never dies.

use serde::{Deserialize, Serialize};

use crate::energy::EnergyModel;
use crate::types::{NodeId, Position};

/// A sensor or the sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    position: Position,
    energy: f64,
    energy_max: f64,
    mains_powered: bool,
}

impl Node {
    /// A battery-powered sensor starting with a full budget
    pub fn sensor(id: NodeId, position: Position, energy: f64) -> Self {
        Self {
            id,
            position,
            energy,
            energy_max: energy,
            mains_powered: false,
        }
    }

    /// The sink at `position`
    pub fn sink(position: Position) -> Self {
        Self {
            id: NodeId::SINK,
            position,
            energy: 0.0,
            energy_max: 0.0,
            mains_powered: true,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Remaining energy in joules; always 0 for the sink
    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn energy_max(&self) -> f64 {
        self.energy_max
    }

    /// Remaining energy as a fraction of the budget
    pub fn energy_fraction(&self) -> f64 {
        if self.mains_powered || self.energy_max <= 0.0 {
            return 1.0;
        }
        self.energy / self.energy_max
    }

    pub fn is_sink(&self) -> bool {
        self.mains_powered
    }

    pub fn is_alive(&self) -> bool {
        self.mains_powered || self.energy > 0.0
    }

    pub fn distance_to(&self, other: &Node) -> f64 {
        self.position.distance_to(&other.position)
    }

    /// Replace the energy budget before a run starts
    pub fn reset_energy(&mut self, energy: f64) {
        if self.mains_powered {
            return;
        }
        let energy = energy.max(0.0);
        self.energy = energy;
        self.energy_max = energy;
    }

    /// Send `bits` to a receiver `distance` metres away
    pub fn transmit(&mut self, bits: u64, distance: f64, model: &dyn EnergyModel) -> f64 {
        self.debit(model.tx_cost(bits, distance))
    }

    /// Receive `bits` addressed to this node
    pub fn receive(&mut self, bits: u64, model: &dyn EnergyModel) -> f64 {
        self.debit(model.rx_cost(bits))
    }

    /// Combine `bits` of payload at `energy_per_bit`
    pub fn aggregate(&mut self, bits: u64, energy_per_bit: f64) -> f64 {
        self.debit(bits as f64 * energy_per_bit)
    }

    /// Broadcast `bits` so that every listener within `range` hears it.
    ///
    /// The sender pays once, whatever the number of listeners.
    pub fn broadcast(
        &mut self,
        bits: u64,
        range: f64,
        _fanout: usize,
        model: &dyn EnergyModel,
    ) -> f64 {
        self.debit(model.tx_cost(bits, range))
    }

    /// Listen to a broadcast of `bits`
    pub fn recv_broadcast(&mut self, bits: u64, model: &dyn EnergyModel) -> f64 {
        self.debit(model.rx_cost(bits))
    }

    fn debit(&mut self, cost: f64) -> f64 {
        if self.mains_powered || self.energy <= 0.0 {
            return 0.0;
        }
        let spent = cost.max(0.0).min(self.energy);
        self.energy -= spent;
        spent
    }
}
