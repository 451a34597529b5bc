//! Identity, placement and threshold value types

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Identifier of a node in a deployment
///
/// The sink is always `NodeId(0)`; sensors are numbered from 1 in
/// deployment order, which is also the stable iteration order used for
/// tie-breaking throughout the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The sink's identifier
    pub const SINK: NodeId = NodeId(0);

    /// Whether this identifier designates the sink
    pub fn is_sink(self) -> bool {
        self == Self::SINK
    }

    /// Index into a node table where slot 0 holds the sink
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_sink() {
            write!(f, "sink")
        } else {
            write!(f, "n{}", self.0)
        }
    }
}

/// A point in the deployment plane, in metres
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// TEEN reporting thresholds
///
/// - `hard` (HT): minimum sensed value worth reporting at all
/// - `soft` (ST): minimum change since the last report
/// - `count_time` (TC): rounds a node may stay silent before a forced report
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeenThresholds {
    pub hard: f64,
    pub soft: f64,
    pub count_time: u64,
}

impl TeenThresholds {
    pub fn new(hard: f64, soft: f64, count_time: u64) -> Self {
        Self {
            hard,
            soft,
            count_time,
        }
    }

    /// The first field that is negative or non-finite, if any
    pub fn invalid_field(&self) -> Option<(&'static str, f64)> {
        if !self.hard.is_finite() || self.hard < 0.0 {
            return Some(("hard", self.hard));
        }
        if !self.soft.is_finite() || self.soft < 0.0 {
            return Some(("soft", self.soft));
        }
        None
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.invalid_field() {
            Some((name, value)) => Err(ConfigError::InvalidThreshold { name, value }),
            None => Ok(()),
        }
    }
}

impl Default for TeenThresholds {
    fn default() -> Self {
        Self {
            hard: 50.0,
            soft: 2.0,
            count_time: 10,
        }
    }
}

impl fmt::Display for TeenThresholds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HT={}, ST={}, TC={}",
            self.hard, self.soft, self.count_time
        )
    }
}

/// The value a node last reported, if it ever did
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Transmission {
    /// The node has not transmitted yet
    #[default]
    Unset,
    /// Sensed value at the time of the last successful transmission
    Value(f64),
}

impl Transmission {
    pub fn value(&self) -> Option<f64> {
        match self {
            Transmission::Unset => None,
            Transmission::Value(v) => Some(*v),
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Transmission::Value(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId::SINK.to_string(), "sink");
        assert_eq!(NodeId(7).to_string(), "n7");
        assert!(NodeId(0).is_sink());
        assert!(!NodeId(1).is_sink());
    }

    #[test]
    fn test_position_distance() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-12);
        assert_eq!(a.distance_to(&a), 0.0);
        assert!(!Position::new(f64::INFINITY, 0.0).is_finite());
    }

    #[test]
    fn test_thresholds_validation() {
        assert!(TeenThresholds::default().validate().is_ok());
        assert!(TeenThresholds::new(0.0, 0.0, 0).validate().is_ok());

        let err = TeenThresholds::new(-1.0, 2.0, 10).validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidThreshold { name: "hard", .. }));

        let err = TeenThresholds::new(50.0, f64::NAN, 10).validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidThreshold { name: "soft", .. }));
    }

    #[test]
    fn test_transmission_zero_is_not_unset() {
        let t = Transmission::Value(0.0);
        assert!(t.is_set());
        assert_eq!(t.value(), Some(0.0));
        assert_eq!(Transmission::default().value(), None);
    }
}
