//! Per-round cluster partition and head routing tree
//!
//! Both structures are rebuilt wholesale every setup phase and hold only
//! node identifiers; energy and positions stay with the node table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::NodeId;

/// Mapping from cluster head to its ordered members
///
/// Heads are not listed among their own members. Heads iterate in ascending
/// id order; members keep the order in which they joined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clusters {
    members: BTreeMap<NodeId, Vec<NodeId>>,
    head_of: BTreeMap<NodeId, NodeId>,
}

impl Clusters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `head` as leading an (initially empty) cluster.
    ///
    /// Returns false if the node is already placed in this partition.
    pub fn insert_head(&mut self, head: NodeId) -> bool {
        if self.head_of.contains_key(&head) {
            return false;
        }
        self.members.insert(head, Vec::new());
        self.head_of.insert(head, head);
        true
    }

    /// Add `member` to the cluster led by `head`.
    ///
    /// Returns false if `head` is not a head or `member` is already placed.
    pub fn assign(&mut self, member: NodeId, head: NodeId) -> bool {
        if self.head_of.contains_key(&member) {
            return false;
        }
        let Some(members) = self.members.get_mut(&head) else {
            return false;
        };
        members.push(member);
        self.head_of.insert(member, head);
        true
    }

    pub fn heads(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.members.keys().copied()
    }

    /// Members of `head`'s cluster, empty if `head` leads none
    pub fn members(&self, head: NodeId) -> &[NodeId] {
        self.members.get(&head).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The head leading `node`'s cluster; a head maps to itself
    pub fn head_of(&self, node: NodeId) -> Option<NodeId> {
        self.head_of.get(&node).copied()
    }

    pub fn is_head(&self, node: NodeId) -> bool {
        self.members.contains_key(&node)
    }

    /// Iterate `(head, members)` pairs in head order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &[NodeId])> + '_ {
        self.members.iter().map(|(h, m)| (*h, m.as_slice()))
    }

    /// Number of clusters
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Every node placed in the partition, heads included
    pub fn covered(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.head_of.keys().copied()
    }

    pub fn covered_count(&self) -> usize {
        self.head_of.len()
    }
}

/// Parent pointers connecting cluster heads to the sink
///
/// The sink is the implicit root and never appears as a key. Children of a
/// node keep the order in which they were attached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingTree {
    parent: BTreeMap<NodeId, NodeId>,
    children: BTreeMap<NodeId, Vec<NodeId>>,
    attach_order: Vec<NodeId>,
}

impl RoutingTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `head` below `parent`. Returns false if `head` is already in
    /// the tree, is the sink, or `parent` is not yet attached.
    pub fn attach(&mut self, head: NodeId, parent: NodeId) -> bool {
        if head.is_sink() || self.parent.contains_key(&head) {
            return false;
        }
        if !parent.is_sink() && !self.parent.contains_key(&parent) {
            return false;
        }
        self.parent.insert(head, parent);
        self.children.entry(parent).or_default().push(head);
        self.attach_order.push(head);
        true
    }

    /// Next hop of `head` toward the sink
    pub fn parent_of(&self, head: NodeId) -> Option<NodeId> {
        self.parent.get(&head).copied()
    }

    pub fn children_of(&self, node: NodeId) -> &[NodeId] {
        self.children.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Heads in the order they joined the tree
    pub fn attach_order(&self) -> &[NodeId] {
        &self.attach_order
    }

    pub fn contains(&self, node: NodeId) -> bool {
        node.is_sink() || self.parent.contains_key(&node)
    }

    /// Hop count from `head` to the sink
    pub fn depth_of(&self, head: NodeId) -> Option<usize> {
        let mut current = head;
        let mut depth = 0;
        while !current.is_sink() {
            current = self.parent_of(current)?;
            depth += 1;
        }
        Some(depth)
    }

    /// Number of attached heads
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clusters_partition() {
        let mut clusters = Clusters::new();
        assert!(clusters.insert_head(NodeId(3)));
        assert!(clusters.insert_head(NodeId(1)));
        assert!(clusters.assign(NodeId(2), NodeId(1)));
        assert!(clusters.assign(NodeId(4), NodeId(3)));
        assert!(clusters.assign(NodeId(5), NodeId(1)));

        assert_eq!(clusters.heads().collect::<Vec<_>>(), vec![NodeId(1), NodeId(3)]);
        assert_eq!(clusters.members(NodeId(1)), &[NodeId(2), NodeId(5)]);
        assert_eq!(clusters.head_of(NodeId(4)), Some(NodeId(3)));
        assert_eq!(clusters.head_of(NodeId(3)), Some(NodeId(3)));
        assert_eq!(clusters.covered_count(), 5);
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn test_clusters_reject_duplicates() {
        let mut clusters = Clusters::new();
        clusters.insert_head(NodeId(1));
        assert!(!clusters.insert_head(NodeId(1)));
        assert!(clusters.assign(NodeId(2), NodeId(1)));
        assert!(!clusters.assign(NodeId(2), NodeId(1)));
        assert!(!clusters.assign(NodeId(1), NodeId(1)));
        assert!(!clusters.assign(NodeId(6), NodeId(9)));
        assert!(clusters.members(NodeId(9)).is_empty());
    }

    #[test]
    fn test_routing_tree() {
        let mut tree = RoutingTree::new();
        assert!(tree.attach(NodeId(4), NodeId::SINK));
        assert!(tree.attach(NodeId(2), NodeId(4)));
        assert!(tree.attach(NodeId(7), NodeId(2)));
        assert!(tree.attach(NodeId(9), NodeId::SINK));

        assert_eq!(tree.parent_of(NodeId(7)), Some(NodeId(2)));
        assert_eq!(tree.children_of(NodeId::SINK), &[NodeId(4), NodeId(9)]);
        assert_eq!(tree.depth_of(NodeId(7)), Some(3));
        assert_eq!(tree.depth_of(NodeId(9)), Some(1));
        assert_eq!(tree.attach_order(), &[NodeId(4), NodeId(2), NodeId(7), NodeId(9)]);
    }

    #[test]
    fn test_routing_tree_rejects_invalid_attach() {
        let mut tree = RoutingTree::new();
        assert!(!tree.attach(NodeId::SINK, NodeId::SINK));
        assert!(!tree.attach(NodeId(2), NodeId(5)));
        assert!(tree.attach(NodeId(2), NodeId::SINK));
        assert!(!tree.attach(NodeId(2), NodeId::SINK));
        assert_eq!(tree.depth_of(NodeId(8)), None);
    }
}
