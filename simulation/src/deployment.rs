//! Node placement
//!
//! Provides generators for the sensor field:
//! - Square: uniform in a square anchored at its centre or its lower-left corner
//! - Circle: uniform over the area of a disc centred on the origin
//! - Grid: regular row-major lattice, useful for deterministic tests

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use wsn_core::{DeploymentError, Node, NodeId, Position};

/// Default initial sensor energy in joules
pub const DEFAULT_INITIAL_ENERGY: f64 = 0.5;

/// A sink position and the sensors to place around it
#[derive(Debug, Clone, PartialEq)]
pub struct Deployment {
    pub sink: Position,
    pub sensors: Vec<Position>,
    /// Energy every sensor starts with
    pub initial_energy: f64,
}

impl Deployment {
    pub fn new(
        sink: Position,
        sensors: Vec<Position>,
        initial_energy: f64,
    ) -> Result<Self, DeploymentError> {
        let deployment = Self {
            sink,
            sensors,
            initial_energy,
        };
        deployment.validate()?;
        Ok(deployment)
    }

    pub fn validate(&self) -> Result<(), DeploymentError> {
        if self.sensors.is_empty() {
            return Err(DeploymentError::NoSensors);
        }
        if !self.initial_energy.is_finite() || self.initial_energy <= 0.0 {
            return Err(DeploymentError::InvalidInitialEnergy(self.initial_energy));
        }
        if !self.sink.is_finite() {
            return Err(DeploymentError::InvalidArea(format!(
                "sink at {}",
                self.sink
            )));
        }
        for (index, p) in self.sensors.iter().enumerate() {
            if !p.is_finite() {
                return Err(DeploymentError::NonFiniteCoordinate {
                    index,
                    x: p.x,
                    y: p.y,
                });
            }
        }
        Ok(())
    }

    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    /// Node table with the sink in slot 0 and sensors numbered from 1
    pub fn build_nodes(&self) -> Vec<Node> {
        let mut nodes = Vec::with_capacity(self.sensors.len() + 1);
        nodes.push(Node::sink(self.sink));
        for (i, position) in self.sensors.iter().enumerate() {
            nodes.push(Node::sensor(
                NodeId(i as u32 + 1),
                *position,
                self.initial_energy,
            ));
        }
        nodes
    }
}

/// Where a square field sits relative to the origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SquareAnchor {
    /// `[-side/2, side/2]` on both axes
    Centered,
    /// `[0, side]` on both axes
    #[default]
    LeftBottom,
}

/// Builder for creating deployments
///
/// ```rust,ignore
/// let deployment = DeploymentBuilder::new(100)
///     .with_sink(Position::new(50.0, 175.0))
///     .with_seed(7)
///     .uniform_in_square(100.0, SquareAnchor::LeftBottom)?;
/// ```
#[derive(Debug, Clone)]
pub struct DeploymentBuilder {
    count: usize,
    sink: Position,
    initial_energy: f64,
    seed: Option<u64>,
}

impl DeploymentBuilder {
    /// Create a builder for `count` sensors
    pub fn new(count: usize) -> Self {
        Self {
            count,
            sink: Position::new(50.0, 175.0),
            initial_energy: DEFAULT_INITIAL_ENERGY,
            seed: None,
        }
    }

    pub fn with_sink(mut self, sink: Position) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_initial_energy(mut self, energy: f64) -> Self {
        self.initial_energy = energy;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.seed.unwrap_or_else(|| rand::rng().random()))
    }

    /// Uniform placement inside a square of the given side
    pub fn uniform_in_square(
        self,
        side: f64,
        anchor: SquareAnchor,
    ) -> Result<Deployment, DeploymentError> {
        if !side.is_finite() || side <= 0.0 {
            return Err(DeploymentError::InvalidArea(format!("square side {}", side)));
        }
        let (low, high) = match anchor {
            SquareAnchor::Centered => (-side / 2.0, side / 2.0),
            SquareAnchor::LeftBottom => (0.0, side),
        };
        let mut rng = self.rng();
        let sensors = (0..self.count)
            .map(|_| Position::new(rng.random_range(low..high), rng.random_range(low..high)))
            .collect();
        Deployment::new(self.sink, sensors, self.initial_energy)
    }

    /// Uniform placement over the area of a disc centred on the origin
    pub fn uniform_in_circle(self, radius: f64) -> Result<Deployment, DeploymentError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(DeploymentError::InvalidArea(format!("circle radius {}", radius)));
        }
        let mut rng = self.rng();
        let sensors = (0..self.count)
            .map(|_| {
                let r = radius * rng.random::<f64>().sqrt();
                let theta = 2.0 * std::f64::consts::PI * rng.random::<f64>();
                Position::new(r * theta.cos(), r * theta.sin())
            })
            .collect();
        Deployment::new(self.sink, sensors, self.initial_energy)
    }

    /// Row-major lattice starting at the origin
    pub fn grid(self, columns: usize, spacing: f64) -> Result<Deployment, DeploymentError> {
        if columns == 0 || !spacing.is_finite() || spacing <= 0.0 {
            return Err(DeploymentError::InvalidArea(format!(
                "grid of {} columns at {} m",
                columns, spacing
            )));
        }
        let sensors = (0..self.count)
            .map(|i| {
                Position::new(
                    (i % columns) as f64 * spacing,
                    (i / columns) as f64 * spacing,
                )
            })
            .collect();
        Deployment::new(self.sink, sensors, self.initial_energy)
    }
}
