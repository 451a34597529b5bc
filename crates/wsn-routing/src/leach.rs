//! LEACH cluster formation
//!
//! Heads self-elect with probability
//! `T(n) = p / (1 - p * (r mod round(1/p)))` where `p = target / alive`,
//! restricted to nodes that have not served during the current rotation
//! epoch. Remaining nodes join the nearest head.

use std::collections::BTreeSet;

use rand::{Rng, RngCore};
use tracing::{debug, trace};

use wsn_core::{
    ClusterFormer, Clusters, ElectionContext, ElectionThreshold, Formation, FormationInput, Node,
    NodeId,
};

/// The classic LEACH election probability
#[derive(Debug, Clone, Copy, Default)]
pub struct LeachThreshold;

impl ElectionThreshold for LeachThreshold {
    fn threshold(&self, ctx: &ElectionContext) -> f64 {
        if ctx.alive == 0 || ctx.target_heads == 0 {
            return 0.0;
        }
        let p = (ctx.target_heads as f64 / ctx.alive as f64).min(1.0);
        let epoch = (1.0 / p).round().max(1.0) as u64;
        let denominator = 1.0 - p * (ctx.round % epoch) as f64;
        if denominator <= 0.0 {
            return 1.0;
        }
        (p / denominator).clamp(0.0, 1.0)
    }
}

/// A constant election probability, independent of round and population
#[derive(Debug, Clone, Copy)]
pub struct FixedProbability(pub f64);

impl ElectionThreshold for FixedProbability {
    fn threshold(&self, _ctx: &ElectionContext) -> f64 {
        self.0.clamp(0.0, 1.0)
    }
}

/// LEACH cluster former with round-robin head rotation
#[derive(Debug, Clone)]
pub struct LeachClusterFormer<T = LeachThreshold> {
    threshold: T,
    served_in_epoch: BTreeSet<NodeId>,
}

impl LeachClusterFormer {
    pub fn new() -> Self {
        Self::with_threshold(LeachThreshold)
    }
}

impl Default for LeachClusterFormer {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ElectionThreshold> LeachClusterFormer<T> {
    pub fn with_threshold(threshold: T) -> Self {
        Self {
            threshold,
            served_in_epoch: BTreeSet::new(),
        }
    }

    /// Nodes that have already led a cluster in the current epoch
    pub fn served_in_epoch(&self) -> &BTreeSet<NodeId> {
        &self.served_in_epoch
    }

    fn start_epoch_if_exhausted(&mut self, candidates: &[&Node]) {
        self.served_in_epoch
            .retain(|id| candidates.iter().any(|n| n.id() == *id));
        if candidates
            .iter()
            .all(|n| self.served_in_epoch.contains(&n.id()))
        {
            trace!(served = self.served_in_epoch.len(), "Rotation epoch complete");
            self.served_in_epoch.clear();
        }
    }

    /// Highest remaining energy wins; eligible nodes are preferred and ties
    /// go to the lowest id.
    fn fallback_head(&self, candidates: &[&Node]) -> Option<NodeId> {
        let pick = |eligible_only: bool| {
            let mut best: Option<&Node> = None;
            for &node in candidates {
                if eligible_only && self.served_in_epoch.contains(&node.id()) {
                    continue;
                }
                if best.is_none_or(|b| node.energy() > b.energy()) {
                    best = Some(node);
                }
            }
            best.map(|n| n.id())
        };
        pick(true).or_else(|| pick(false))
    }
}

impl<T: ElectionThreshold> ClusterFormer for LeachClusterFormer<T> {
    fn form(&mut self, input: &FormationInput<'_>, rng: &mut dyn RngCore) -> Formation {
        let candidates = input.candidates;
        if candidates.is_empty() {
            return Formation::default();
        }

        self.start_epoch_if_exhausted(candidates);

        let ctx = ElectionContext {
            round: input.round,
            target_heads: input.target_heads,
            alive: candidates.len(),
        };
        let threshold = self.threshold.threshold(&ctx);

        let mut heads: Vec<&Node> = Vec::new();
        for &node in candidates {
            if self.served_in_epoch.contains(&node.id()) {
                continue;
            }
            if rng.random::<f64>() < threshold {
                heads.push(node);
            }
        }

        let mut fallback = None;
        if heads.is_empty() {
            if let Some(id) = self.fallback_head(candidates)
                && let Some(node) = candidates.iter().copied().find(|n| n.id() == id)
            {
                heads.push(node);
                fallback = Some(id);
            }
        }

        let mut clusters = Clusters::new();
        for head in &heads {
            clusters.insert_head(head.id());
            self.served_in_epoch.insert(head.id());
        }

        for node in candidates {
            if clusters.is_head(node.id()) {
                continue;
            }
            let mut nearest: Option<(&Node, f64)> = None;
            for &head in &heads {
                let distance = node.distance_to(head);
                if nearest.is_none_or(|(_, d)| distance < d) {
                    nearest = Some((head, distance));
                }
            }
            if let Some((head, _)) = nearest {
                clusters.assign(node.id(), head.id());
            }
        }

        debug!(
            round = input.round,
            heads = clusters.len(),
            threshold,
            fallback = fallback.is_some(),
            "Clusters formed"
        );

        Formation { clusters, fallback }
    }

    fn reset(&mut self) {
        self.served_in_epoch.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use wsn_core::Position;

    fn grid(n: u32) -> Vec<Node> {
        (1..=n)
            .map(|i| {
                let x = (i % 10) as f64 * 10.0;
                let y = (i / 10) as f64 * 10.0;
                Node::sensor(NodeId(i), Position::new(x, y), 0.5)
            })
            .collect()
    }

    fn ctx(round: u64, target: usize, alive: usize) -> ElectionContext {
        ElectionContext {
            round,
            target_heads: target,
            alive,
        }
    }

    #[test]
    fn test_leach_threshold_formula() {
        let t = LeachThreshold;
        // p = 0.1, epoch of 10 rounds
        assert!((t.threshold(&ctx(0, 10, 100)) - 0.1).abs() < 1e-12);
        assert!((t.threshold(&ctx(5, 10, 100)) - 0.1 / 0.5).abs() < 1e-12);
        assert!((t.threshold(&ctx(9, 10, 100)) - 1.0).abs() < 1e-12);
        assert!((t.threshold(&ctx(10, 10, 100)) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_leach_threshold_degenerate() {
        let t = LeachThreshold;
        assert_eq!(t.threshold(&ctx(3, 5, 0)), 0.0);
        assert_eq!(t.threshold(&ctx(3, 0, 10)), 0.0);
        // More targets than nodes saturates at certainty
        assert_eq!(t.threshold(&ctx(3, 10, 4)), 1.0);
    }

    #[test]
    fn test_partition_covers_all_candidates() {
        let nodes = grid(50);
        let refs: Vec<&Node> = nodes.iter().collect();
        let mut former = LeachClusterFormer::new();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for round in 0..30 {
            let formation = former.form(
                &FormationInput {
                    round,
                    target_heads: 5,
                    candidates: &refs,
                },
                &mut rng,
            );
            let clusters = &formation.clusters;
            assert!(!clusters.is_empty());
            assert_eq!(clusters.covered_count(), nodes.len());
            let members: usize = clusters.iter().map(|(_, m)| m.len()).sum();
            assert_eq!(members + clusters.len(), nodes.len());
        }
    }

    #[test]
    fn test_members_join_nearest_head() {
        let nodes = grid(40);
        let refs: Vec<&Node> = nodes.iter().collect();
        let mut former = LeachClusterFormer::new();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let formation = former.form(
            &FormationInput {
                round: 0,
                target_heads: 4,
                candidates: &refs,
            },
            &mut rng,
        );

        let clusters = formation.clusters;
        let position = |id: NodeId| nodes[(id.0 - 1) as usize].position();
        for (head, members) in clusters.iter() {
            for member in members {
                let own = position(*member).distance_to(&position(head));
                for other in clusters.heads() {
                    assert!(own <= position(*member).distance_to(&position(other)));
                }
            }
        }
    }

    #[test]
    fn test_fallback_picks_highest_energy() {
        let mut nodes = grid(6);
        nodes[3].reset_energy(0.9);
        let refs: Vec<&Node> = nodes.iter().collect();
        let mut former = LeachClusterFormer::with_threshold(FixedProbability(0.0));
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let formation = former.form(
            &FormationInput {
                round: 0,
                target_heads: 2,
                candidates: &refs,
            },
            &mut rng,
        );
        assert_eq!(formation.fallback, Some(NodeId(4)));
        assert_eq!(formation.clusters.heads().collect::<Vec<_>>(), vec![NodeId(4)]);
        assert_eq!(formation.clusters.members(NodeId(4)).len(), 5);
    }

    #[test]
    fn test_fallback_tie_goes_to_lowest_id() {
        let nodes = grid(4);
        let refs: Vec<&Node> = nodes.iter().collect();
        let mut former = LeachClusterFormer::with_threshold(FixedProbability(0.0));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let formation = former.form(
            &FormationInput {
                round: 0,
                target_heads: 1,
                candidates: &refs,
            },
            &mut rng,
        );
        assert_eq!(formation.fallback, Some(NodeId(1)));
    }

    #[test]
    fn test_rotation_epoch() {
        let nodes = grid(4);
        let refs: Vec<&Node> = nodes.iter().collect();
        // Certain election: every eligible node promotes each round
        let mut former = LeachClusterFormer::with_threshold(FixedProbability(1.0));
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let input = |round| FormationInput {
            round,
            target_heads: 1,
            candidates: &refs,
        };

        let first = former.form(&input(0), &mut rng);
        assert_eq!(first.clusters.len(), 4);
        assert_eq!(former.served_in_epoch().len(), 4);

        // Everyone served, so the next round opens a new epoch
        let second = former.form(&input(1), &mut rng);
        assert_eq!(second.clusters.len(), 4);
        assert!(second.fallback.is_none());

        former.reset();
        assert!(former.served_in_epoch().is_empty());
    }

    #[test]
    fn test_served_nodes_sit_out() {
        let nodes = grid(3);
        let refs: Vec<&Node> = nodes.iter().collect();
        let mut former = LeachClusterFormer::with_threshold(FixedProbability(0.0));
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let input = |round| FormationInput {
            round,
            target_heads: 1,
            candidates: &refs,
        };

        let mut seen = Vec::new();
        for round in 0..3 {
            let formation = former.form(&input(round), &mut rng);
            seen.push(formation.fallback.unwrap());
        }
        seen.sort();
        assert_eq!(seen, vec![NodeId(1), NodeId(2), NodeId(3)]);
    }

    #[test]
    fn test_empty_candidates() {
        let mut former = LeachClusterFormer::new();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let formation = former.form(
            &FormationInput {
                round: 0,
                target_heads: 3,
                candidates: &[],
            },
            &mut rng,
        );
        assert!(formation.clusters.is_empty());
        assert!(formation.fallback.is_none());
    }
}
