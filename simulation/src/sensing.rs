//! Sensed-value generators
//!
//! The engine asks a [`SensingModel`] for one value per alive sensor per
//! round, before any transmission decision of that round.

use std::fmt;

use rand::RngCore;
use rand_distr::{Distribution, Normal};

use wsn_core::{Node, NodeId, SensingModel};

/// Zero-mean Gaussian noise; `None` unless sigma is positive
fn noise(sigma: f64) -> Option<Normal<f64>> {
    if sigma > 0.0 {
        Normal::new(0.0, sigma).ok()
    } else {
        None
    }
}

fn sample_noise(noise: Option<Normal<f64>>, rng: &mut dyn RngCore) -> f64 {
    noise.map_or(0.0, |n| n.sample(rng))
}

/// Position-dependent baseline shared by the synthetic models
fn baseline(node: &Node, offset: f64, position_scale: f64) -> f64 {
    let p = node.position();
    offset + (p.x + p.y) * position_scale
}

/// Slowly rising field with Gaussian noise
///
/// `max(0, offset + (x + y) * position_scale + trend * round + N(0, sigma))`
#[derive(Debug, Clone, Copy)]
pub struct SyntheticSensing {
    pub offset: f64,
    pub position_scale: f64,
    pub trend: f64,
    noise: Option<Normal<f64>>,
}

impl SyntheticSensing {
    /// Replace the noise standard deviation; zero disables noise
    pub fn with_sigma(mut self, sigma: f64) -> Self {
        self.noise = noise(sigma);
        self
    }
}

impl Default for SyntheticSensing {
    fn default() -> Self {
        Self {
            offset: 30.0,
            position_scale: 0.1,
            trend: 0.5,
            noise: noise(5.0),
        }
    }
}

impl SensingModel for SyntheticSensing {
    fn sense(&mut self, node: &Node, round: u64, rng: &mut dyn RngCore) -> f64 {
        let value = baseline(node, self.offset, self.position_scale)
            + self.trend * round as f64
            + sample_noise(self.noise, rng);
        value.max(0.0)
    }
}

/// Flat field that jumps by `magnitude` from `event_round` onwards
#[derive(Debug, Clone, Copy)]
pub struct StepEventSensing {
    pub event_round: u64,
    pub magnitude: f64,
    pub offset: f64,
    pub position_scale: f64,
    noise: Option<Normal<f64>>,
}

impl StepEventSensing {
    pub fn new(event_round: u64) -> Self {
        Self {
            event_round,
            magnitude: 30.0,
            offset: 30.0,
            position_scale: 0.1,
            noise: noise(3.0),
        }
    }

    /// Replace the noise standard deviation; zero disables noise
    pub fn with_sigma(mut self, sigma: f64) -> Self {
        self.noise = noise(sigma);
        self
    }
}

impl SensingModel for StepEventSensing {
    fn sense(&mut self, node: &Node, round: u64, rng: &mut dyn RngCore) -> f64 {
        let mut value = baseline(node, self.offset, self.position_scale);
        if round >= self.event_round {
            value += self.magnitude;
        }
        (value + sample_noise(self.noise, rng)).max(0.0)
    }
}

/// The same value everywhere, every round
#[derive(Debug, Clone, Copy)]
pub struct ConstantSensing(pub f64);

impl SensingModel for ConstantSensing {
    fn sense(&mut self, _node: &Node, _round: u64, _rng: &mut dyn RngCore) -> f64 {
        self.0
    }
}

/// Values supplied by a closure `(node, round) -> value`
pub struct FnSensing<F> {
    f: F,
}

impl<F> FnSensing<F>
where
    F: FnMut(NodeId, u64) -> f64,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> fmt::Debug for FnSensing<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSensing").finish_non_exhaustive()
    }
}

impl<F> SensingModel for FnSensing<F>
where
    F: FnMut(NodeId, u64) -> f64,
{
    fn sense(&mut self, node: &Node, round: u64, _rng: &mut dyn RngCore) -> f64 {
        (self.f)(node.id(), round)
    }
}
