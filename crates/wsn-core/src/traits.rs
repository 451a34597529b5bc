//! Capability traits the round engine is assembled from
//!
//! A protocol is a combination of a [`ClusterFormer`], a [`RouteBuilder`]
//! and a [`TransmissionPolicy`]. LEACH uses single-hop routing and always
//! transmits; APTEEN uses the Prim relay tree and gates transmissions on
//! TEEN thresholds.

use std::fmt::Debug;

use rand::RngCore;

use crate::cluster::{Clusters, RoutingTree};
use crate::node::Node;
use crate::types::{NodeId, TeenThresholds, Transmission};

/// Inputs to the cluster-head self-election probability
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElectionContext {
    /// Current round
    pub round: u64,
    /// Desired number of cluster heads
    pub target_heads: usize,
    /// Alive sensors taking part in the election
    pub alive: usize,
}

/// Probability with which an eligible node promotes itself to head
pub trait ElectionThreshold: Debug {
    /// A value in `[0, 1]`
    fn threshold(&self, ctx: &ElectionContext) -> f64;
}

/// What a cluster former sees of the network at setup time
#[derive(Debug, Clone, Copy)]
pub struct FormationInput<'a> {
    pub round: u64,
    pub target_heads: usize,
    /// Alive sensors in stable id order
    pub candidates: &'a [&'a Node],
}

/// Result of one setup-phase cluster formation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Formation {
    pub clusters: Clusters,
    /// Head forced into office because nobody self-elected
    pub fallback: Option<NodeId>,
}

/// Partitions the alive sensors into clusters
pub trait ClusterFormer: Debug {
    /// Build a fresh partition covering every candidate exactly once.
    ///
    /// Must elect at least one head whenever there is a candidate.
    fn form(&mut self, input: &FormationInput<'_>, rng: &mut dyn RngCore) -> Formation;

    /// Forget any rotation state carried between rounds
    fn reset(&mut self) {}
}

/// Connects the elected heads to the sink
pub trait RouteBuilder: Debug {
    fn name(&self) -> &'static str;

    /// Build a tree in which every head in `heads` has a path to `sink`
    fn build(&self, sink: &Node, heads: &[&Node]) -> RoutingTree;
}

/// Produces the value a node senses in a given round
pub trait SensingModel: Debug {
    fn sense(&mut self, node: &Node, round: u64, rng: &mut dyn RngCore) -> f64;
}

/// Everything a transmission decision may depend on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    /// Value sensed this round
    pub value: f64,
    /// Thresholds resolved for the node (cluster override or globals)
    pub thresholds: TeenThresholds,
    pub last_transmission: Transmission,
    pub rounds_since_transmission: u64,
}

/// Decides whether a sensed value is reported this round
///
/// Implementations must be pure: the engine updates tracking state only
/// after an actual transmission.
pub trait TransmissionPolicy: Debug {
    fn name(&self) -> &'static str;

    fn should_transmit(&self, decision: &Decision) -> bool;

    /// Whether heads push thresholds to their members after setup
    fn announces_parameters(&self) -> bool {
        false
    }
}
