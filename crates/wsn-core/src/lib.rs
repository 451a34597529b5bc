//! # WSN Core
//!
//! Core types, traits, and errors for the wireless sensor network lifetime
//! simulator.
//!
//! This crate provides the foundational abstractions that let the round
//! engine assemble a protocol out of independent capabilities: LEACH and
//! APTEEN are the same engine wired with different cluster formers, routers
//! and transmission policies.
//!
//! ## Key Traits
//!
//! - [`EnergyModel`]: Radio cost function used by every node operation
//! - [`ElectionThreshold`]: Cluster-head self-election probability
//! - [`ClusterFormer`]: Partitions alive sensors into clusters each setup phase
//! - [`RouteBuilder`]: Connects cluster heads to the sink
//! - [`SensingModel`]: Produces a sensed value per node and round
//! - [`TransmissionPolicy`]: Decides whether a sensed value is reported
//!
//! ## Key Types
//!
//! - [`NodeId`] / [`Position`]: Node identity and placement
//! - [`Node`]: A sensor or the sink, with its energy budget
//! - [`Clusters`]: Head to ordered members mapping for one round
//! - [`RoutingTree`]: Parent pointers from heads toward the sink
//! - [`TeenThresholds`]: The `(HT, ST, TC)` triple

pub mod cluster;
pub mod energy;
pub mod error;
pub mod node;
pub mod traits;
pub mod types;

// Re-export main types
pub use cluster::*;
pub use energy::*;
pub use error::*;
pub use node::*;
pub use traits::*;
pub use types::*;
