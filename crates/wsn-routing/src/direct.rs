//! Single-hop head routing

use tracing::trace;

use wsn_core::{Node, RouteBuilder, RoutingTree};

/// Every cluster head transmits straight to the sink
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectRouter;

impl RouteBuilder for DirectRouter {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn build(&self, sink: &Node, heads: &[&Node]) -> RoutingTree {
        let mut tree = RoutingTree::new();
        for head in heads {
            tree.attach(head.id(), sink.id());
        }
        trace!(heads = tree.len(), "Direct routes built");
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsn_core::{NodeId, Position};

    #[test]
    fn test_every_head_reports_to_sink() {
        let sink = Node::sink(Position::new(50.0, 175.0));
        let heads: Vec<Node> = (1..=4)
            .map(|i| Node::sensor(NodeId(i), Position::new(i as f64 * 20.0, 10.0), 0.5))
            .collect();
        let refs: Vec<&Node> = heads.iter().collect();

        let tree = DirectRouter.build(&sink, &refs);
        assert_eq!(tree.len(), 4);
        for head in &heads {
            assert_eq!(tree.parent_of(head.id()), Some(NodeId::SINK));
            assert_eq!(tree.depth_of(head.id()), Some(1));
        }
        assert_eq!(tree.children_of(NodeId::SINK).len(), 4);
    }

    #[test]
    fn test_no_heads() {
        let sink = Node::sink(Position::default());
        assert!(DirectRouter.build(&sink, &[]).is_empty());
    }
}
