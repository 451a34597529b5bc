//! Multi-hop head routing over a Prim tree rooted at the sink
//!
//! Starting from the sink alone, the nearest unattached head is repeatedly
//! attached to whichever tree node is closest to it. Ties on both the head
//! picked and the parent chosen go to the earlier entry in `heads`.

use tracing::{debug, trace};

use wsn_core::{Node, NodeId, RouteBuilder, RoutingTree};

/// Heads relay toward the sink along a minimum spanning tree
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimRouter;

impl RouteBuilder for PrimRouter {
    fn name(&self) -> &'static str {
        "prim"
    }

    fn build(&self, sink: &Node, heads: &[&Node]) -> RoutingTree {
        let mut tree = RoutingTree::new();

        // Distance from each head to the tree, and the tree node at that distance
        let mut link: Vec<(f64, NodeId)> = heads
            .iter()
            .map(|h| (h.distance_to(sink), sink.id()))
            .collect();
        let mut attached = vec![false; heads.len()];

        for _ in 0..heads.len() {
            let mut next: Option<usize> = None;
            for (i, (distance, _)) in link.iter().enumerate() {
                if attached[i] {
                    continue;
                }
                if next.is_none_or(|j| *distance < link[j].0) {
                    next = Some(i);
                }
            }
            let Some(i) = next else { break };

            attached[i] = true;
            let (distance, parent) = link[i];
            if !tree.attach(heads[i].id(), parent) {
                continue;
            }
            trace!(head = %heads[i].id(), parent = %parent, distance, "Head attached");

            for (j, other) in heads.iter().enumerate() {
                if attached[j] {
                    continue;
                }
                let d = other.distance_to(heads[i]);
                if d < link[j].0 {
                    link[j] = (d, heads[i].id());
                }
            }
        }

        debug!(
            heads = tree.len(),
            top_level = tree.children_of(sink.id()).len(),
            "Prim tree built"
        );
        tree
    }
}
