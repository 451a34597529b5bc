//! # WSN Routing
//!
//! Setup-phase algorithms for the WSN lifetime simulator.
//!
//! Every setup phase the engine first partitions the alive sensors into
//! clusters, then connects the elected cluster heads to the sink. Both steps
//! are rebuilt from scratch each time; nothing survives into the next setup
//! phase except the election rotation state.
//!
//! ## Core Components
//!
//! - [`LeachClusterFormer`]: Probabilistic self-election with round-robin fairness
//! - [`LeachThreshold`]: The classic LEACH election probability
//! - [`FixedProbability`]: A constant election probability
//! - [`DirectRouter`]: Every head reports straight to the sink
//! - [`PrimRouter`]: Heads relay through each other along a Prim tree
//!
//! ## Cluster Formation
//!
//! 1. **ROTATE**: Nodes that already served in the current epoch sit out; once
//!    every alive node has served, the epoch resets
//! 2. **ELECT**: Each eligible node promotes itself with the threshold probability
//! 3. **FALLBACK**: If nobody promoted, the highest-energy candidate is forced in
//! 4. **JOIN**: Every other node joins its nearest head
//!
//! ## Example
//!
//! ```rust,ignore
//! use wsn_core::{ClusterFormer, FormationInput, RouteBuilder};
//! use wsn_routing::{LeachClusterFormer, PrimRouter};
//!
//! let mut former = LeachClusterFormer::new();
//! let formation = former.form(&FormationInput { round, target_heads: 5, candidates: &alive }, &mut rng);
//!
//! let heads: Vec<&Node> = formation.clusters.heads().map(|id| &nodes[id.index()]).collect();
//! let tree = PrimRouter.build(&sink, &heads);
//! ```

pub mod direct;
pub mod leach;
pub mod prim;

// Re-export main types
pub use direct::DirectRouter;
pub use leach::{FixedProbability, LeachClusterFormer, LeachThreshold};
pub use prim::PrimRouter;
