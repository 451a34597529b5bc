//! TEEN parameter registry
//!
//! Owns the global `(HT, ST, TC)` defaults, per-cluster overrides keyed by
//! cluster head, and the set of heads that have announced their current
//! parameters to their members. Members always resolve the live values
//! through their head; the broadcast set records announcement traffic and
//! does not gate what members read.

use std::collections::{BTreeMap, BTreeSet};

use wsn_core::{NodeId, ParameterError, TeenThresholds};

/// Thresholds shared by the engine and the control surface
#[derive(Debug, Clone)]
pub struct ParameterRegistry {
    global: TeenThresholds,
    overrides: BTreeMap<NodeId, TeenThresholds>,
    broadcasted: BTreeSet<NodeId>,
}

impl ParameterRegistry {
    pub fn new(global: TeenThresholds) -> Self {
        Self {
            global,
            overrides: BTreeMap::new(),
            broadcasted: BTreeSet::new(),
        }
    }

    pub fn global(&self) -> TeenThresholds {
        self.global
    }

    /// Replace any subset of the global defaults.
    ///
    /// Validates the merged result before applying it; on error nothing
    /// changes.
    pub fn update_global(
        &mut self,
        hard: Option<f64>,
        soft: Option<f64>,
        count_time: Option<u64>,
    ) -> Result<TeenThresholds, ParameterError> {
        let merged = TeenThresholds {
            hard: hard.unwrap_or(self.global.hard),
            soft: soft.unwrap_or(self.global.soft),
            count_time: count_time.unwrap_or(self.global.count_time),
        };
        check(&merged)?;
        self.global = merged;
        Ok(merged)
    }

    /// Install a per-cluster override and invalidate that head's announcement
    pub fn set_override(
        &mut self,
        head: NodeId,
        thresholds: TeenThresholds,
    ) -> Result<(), ParameterError> {
        if head.is_sink() {
            return Err(ParameterError::SinkNotAllowed);
        }
        check(&thresholds)?;
        self.overrides.insert(head, thresholds);
        self.broadcasted.remove(&head);
        Ok(())
    }

    /// Remove a head's override; returns whether one existed
    pub fn clear_override(&mut self, head: NodeId) -> bool {
        let removed = self.overrides.remove(&head).is_some();
        if removed {
            self.broadcasted.remove(&head);
        }
        removed
    }

    /// Remove every override; returns how many there were
    pub fn clear_overrides(&mut self) -> usize {
        let count = self.overrides.len();
        self.overrides.clear();
        count
    }

    pub fn override_for(&self, head: NodeId) -> Option<TeenThresholds> {
        self.overrides.get(&head).copied()
    }

    pub fn overrides(&self) -> &BTreeMap<NodeId, TeenThresholds> {
        &self.overrides
    }

    /// Thresholds in force for a cluster led by `head`, or the globals for
    /// a node outside any cluster
    pub fn resolve(&self, head: Option<NodeId>) -> TeenThresholds {
        head.and_then(|h| self.override_for(h))
            .unwrap_or(self.global)
    }

    pub fn mark_broadcast(&mut self, head: NodeId) {
        self.broadcasted.insert(head);
    }

    pub fn is_broadcast(&self, head: NodeId) -> bool {
        self.broadcasted.contains(&head)
    }

    /// Forget every announcement; all heads must announce again
    pub fn invalidate_all(&mut self) {
        self.broadcasted.clear();
    }

    pub fn broadcast_count(&self) -> usize {
        self.broadcasted.len()
    }

    pub fn broadcasted(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.broadcasted.iter().copied()
    }
}

fn check(thresholds: &TeenThresholds) -> Result<(), ParameterError> {
    match thresholds.invalid_field() {
        Some((name, value)) => Err(ParameterError::InvalidThreshold { name, value }),
        None => Ok(()),
    }
}
