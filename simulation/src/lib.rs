//! # WSN Lifetime Simulation
//!
//! A round-based simulator comparing how long a wireless sensor network
//! survives under LEACH, LEACH-Prim and APTEEN.
//!
//! ## Overview
//!
//! Battery-powered sensors report to a mains-powered sink. Every round:
//!
//! - **Setup**: sensors elect cluster heads with the rotating LEACH
//!   threshold, non-heads join the nearest head, and heads are routed to the
//!   sink either directly or through a Prim minimum spanning tree
//! - **Steady state**: every alive sensor senses a value; members send it to
//!   their head, heads aggregate and forward toward the sink
//! - **TEEN gating** (APTEEN): a sensor only reports when its value crosses
//!   the hard threshold and has moved by the soft threshold, or when the
//!   count time has elapsed since its last report
//!
//! Energy follows the first-order radio model; the simulation ends when the
//! last sensor is exhausted.
//!
//! ## Architecture
//!
//! - **Types** (`types.rs`): protocol presets, events, round diagnostics
//! - **Deployment** (`deployment.rs`): sensor field generators
//! - **Parameters** (`parameters.rs`): global and per-cluster TEEN thresholds
//! - **Simulation** (`simulation.rs`): the round engine and control surface
//! - **Scenarios** (`scenarios.rs`): pre-built comparisons
//!
//! ## Example
//!
//! ```rust,ignore
//! use wsn_simulation::*;
//!
//! let deployment = DeploymentBuilder::new(100)
//!     .with_seed(7)
//!     .uniform_in_square(100.0, SquareAnchor::LeftBottom)?;
//!
//! let mut sim = Simulation::new(&deployment, SimConfig::for_protocol(Protocol::Apteen))?;
//! sim.run_rounds(50);
//!
//! // Tighten reporting across the whole network
//! sim.update_parameters_from_query(Some(60.0), None, None)?;
//! sim.run_to_completion();
//!
//! println!("{}", sim.lifetime_report("APTEEN"));
//! ```

pub mod config;
pub mod deployment;
pub mod parameters;
pub mod policy;
pub mod scenarios;
pub mod sensing;
pub mod simulation;
pub mod types;

// Re-export main types
pub use config::SimConfig;

pub use deployment::{DEFAULT_INITIAL_ENERGY, Deployment, DeploymentBuilder, SquareAnchor};

pub use parameters::ParameterRegistry;

pub use policy::{AlwaysTransmit, ThresholdGated, ThresholdPreset};

pub use sensing::{ConstantSensing, FnSensing, StepEventSensing, SyntheticSensing};

pub use simulation::{NodeTracking, SimStats, Simulation};

pub use types::{LifetimeReport, Protocol, RoundRecord, SimEvent};

// Re-export core types for integration
pub use wsn_core::{NodeId, Position, TeenThresholds, Transmission};
