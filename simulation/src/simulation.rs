//! Round engine for the WSN lifetime simulation
//!
//! Each call to [`Simulation::execute`] advances exactly one round:
//! - Setup phase when due: cluster formation, head routing, join traffic,
//!   and TEEN parameter announcements
//! - Steady-state phase: every alive sensor senses, then data is gathered
//!   recursively from the routing tree toward the sink
//! - Bookkeeping: deaths, per-round diagnostics, lifetime milestones

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, trace};

use wsn_core::{
    ClusterFormer, Clusters, Decision, EnergyModel, FormationInput, Node, NodeId, ParameterError,
    RouteBuilder, RoutingTree, SensingModel, TeenThresholds, Transmission, TransmissionPolicy,
    WsnResult,
};
use wsn_routing::LeachClusterFormer;

use crate::config::SimConfig;
use crate::deployment::Deployment;
use crate::parameters::ParameterRegistry;
use crate::sensing::SyntheticSensing;
use crate::types::{LifetimeReport, RoundRecord, SimEvent};

/// Simulation statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimStats {
    pub rounds: u64,
    pub setup_phases: u64,
    pub fallback_elections: u64,
    /// Member-to-head data transmissions
    pub data_packets: u64,
    pub empty_slots: u64,
    pub parameter_broadcasts: u64,
    pub queries_applied: u64,
    /// Joules spent by all sensors, control traffic included
    pub total_energy_spent: f64,
    pub bits_to_sink: u64,
    pub first_death_round: Option<u64>,
    pub last_death_round: Option<u64>,
}

/// Per-sensor TEEN tracking state
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodeTracking {
    /// Value sensed in the most recent round
    pub last_value: Option<f64>,
    pub last_transmission: Transmission,
    pub rounds_since_transmission: u64,
}

#[derive(Debug, Default)]
struct RoundCounters {
    transmitting: usize,
    data_packets: u64,
    empty_slots: usize,
    bits_to_sink: u64,
}

/// The simulation state
#[derive(Debug)]
pub struct Simulation {
    /// Current round, the logical clock
    pub round: u64,
    /// Configuration
    pub config: SimConfig,
    /// Global event log (when `record_events` is set)
    pub event_log: Vec<SimEvent>,
    /// Statistics
    pub stats: SimStats,
    /// Node table; slot 0 is the sink
    nodes: Vec<Node>,
    alive: Vec<NodeId>,
    clusters: Clusters,
    routes: RoutingTree,
    parameters: ParameterRegistry,
    tracking: Vec<NodeTracking>,
    history: Vec<RoundRecord>,
    last_setup_round: Option<u64>,
    initialized: bool,
    rng: ChaCha8Rng,
    energy_model: Box<dyn EnergyModel>,
    cluster_former: Box<dyn ClusterFormer>,
    router: Box<dyn RouteBuilder>,
    policy: Box<dyn TransmissionPolicy>,
    sensing: Box<dyn SensingModel>,
}

impl Simulation {
    /// Create a new simulation with the given deployment and configuration.
    ///
    /// Routing and transmission policy follow `config.protocol`; the other
    /// capabilities default to LEACH election, the configured first-order
    /// radio and [`SyntheticSensing`].
    pub fn new(deployment: &Deployment, config: SimConfig) -> WsnResult<Self> {
        config.validate()?;
        deployment.validate()?;

        let nodes = deployment.build_nodes();
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        let alive = nodes
            .iter()
            .filter(|n| !n.is_sink() && n.is_alive())
            .map(|n| n.id())
            .collect();

        Ok(Self {
            round: 0,
            event_log: Vec::new(),
            stats: SimStats::default(),
            tracking: vec![NodeTracking::default(); nodes.len()],
            nodes,
            alive,
            clusters: Clusters::new(),
            routes: RoutingTree::new(),
            parameters: ParameterRegistry::new(config.thresholds),
            history: Vec::new(),
            last_setup_round: None,
            initialized: false,
            rng: ChaCha8Rng::seed_from_u64(seed),
            energy_model: Box::new(config.radio),
            cluster_former: Box::new(LeachClusterFormer::new()),
            router: config.protocol.router(),
            policy: config.protocol.policy(),
            sensing: Box::new(SyntheticSensing::default()),
            config,
        })
    }

    /// Replace the sensed-value generator
    pub fn with_sensing(mut self, sensing: impl SensingModel + 'static) -> Self {
        self.sensing = Box::new(sensing);
        self
    }

    pub fn with_energy_model(mut self, model: impl EnergyModel + 'static) -> Self {
        self.energy_model = Box::new(model);
        self
    }

    pub fn with_cluster_former(mut self, former: impl ClusterFormer + 'static) -> Self {
        self.cluster_former = Box::new(former);
        self
    }

    pub fn with_router(mut self, router: impl RouteBuilder + 'static) -> Self {
        self.router = Box::new(router);
        self
    }

    pub fn with_policy(mut self, policy: impl TransmissionPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// One-time pre-round setup; later calls do nothing
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        self.cluster_former.reset();
        info!(
            sensors = self.nodes.len() - 1,
            protocol = %self.config.protocol,
            router = self.router.name(),
            policy = self.policy.name(),
            "Simulation initialized at round 0"
        );
    }

    /// Advance exactly one round.
    ///
    /// Returns the round's diagnostics, or `None` once every sensor is dead.
    pub fn execute(&mut self) -> Option<&RoundRecord> {
        self.initialize();
        if self.alive.is_empty() {
            return None;
        }

        let round = self.round;
        let span = info_span!("round", round);
        let _enter = span.enter();

        let energy_before = self.sensor_energy();
        let mut counters = RoundCounters::default();

        if self.setup_due() {
            self.setup_phase();
        }
        self.steady_state_phase(&mut counters);

        self.round += 1;
        self.refresh_alive(round);

        let energy_spent = (energy_before - self.sensor_energy()).max(0.0);
        let record = RoundRecord {
            round,
            alive: self.alive.len(),
            cluster_heads: self.clusters.len(),
            transmitting: counters.transmitting,
            empty_slots: counters.empty_slots,
            average_energy: self.average_energy(),
            energy_spent,
            bits_to_sink: counters.bits_to_sink,
        };
        debug!(
            alive = record.alive,
            heads = record.cluster_heads,
            transmitting = record.transmitting,
            empty_slots = record.empty_slots,
            energy_spent,
            "Round complete"
        );

        self.stats.rounds += 1;
        self.stats.data_packets += counters.data_packets;
        self.stats.empty_slots += counters.empty_slots as u64;
        self.stats.total_energy_spent += energy_spent;
        self.stats.bits_to_sink += counters.bits_to_sink;
        self.history.push(record);
        self.history.last()
    }

    /// Run until every sensor is dead or `max_rounds` is reached
    pub fn run_to_completion(&mut self) {
        self.initialize();
        while !self.is_finished() && self.within_round_cap() {
            self.execute();
        }
        info!("Simulation complete at round {}", self.round);
        info!("Stats: {:?}", self.stats);
    }

    /// Run for a specific number of rounds, stopping early if the network dies
    pub fn run_rounds(&mut self, rounds: u64) {
        for _ in 0..rounds {
            if self.execute().is_none() {
                break;
            }
        }
    }

    fn within_round_cap(&self) -> bool {
        self.config.max_rounds.is_none_or(|cap| self.round < cap)
    }

    fn setup_due(&self) -> bool {
        let Some(last) = self.last_setup_round else {
            return true;
        };
        self.clusters.is_empty()
            || self.round - last >= self.config.setup_interval
            || self.clusters.heads().any(|h| !self.is_alive(h))
    }

    fn setup_phase(&mut self) {
        let round = self.round;
        // Sensors drained between rounds must not stand for election
        self.refresh_alive(round);

        let formation = {
            let candidates: Vec<&Node> = self
                .alive
                .iter()
                .map(|id| &self.nodes[id.index()])
                .collect();
            self.cluster_former.form(
                &FormationInput {
                    round,
                    target_heads: self.config.n_cluster,
                    candidates: &candidates,
                },
                &mut self.rng,
            )
        };

        self.routes = {
            let heads: Vec<&Node> = formation
                .clusters
                .heads()
                .map(|id| &self.nodes[id.index()])
                .collect();
            self.router.build(&self.nodes[NodeId::SINK.index()], &heads)
        };
        self.clusters = formation.clusters;
        self.last_setup_round = Some(round);
        self.stats.setup_phases += 1;

        if let Some(head) = formation.fallback {
            self.stats.fallback_elections += 1;
            info!(head = %head, "No head self-elected, fallback head forced");
            self.emit_event(SimEvent::FallbackHeadElected { head, round });
        }

        self.exchange_join_messages();

        if self.policy.announces_parameters() {
            self.parameters.invalidate_all();
            let heads: Vec<NodeId> = self.clusters.heads().collect();
            for head in heads {
                self.broadcast_teen_parameters(head);
            }
        }
        self.refresh_alive(round);

        self.emit_event(SimEvent::SetupCompleted {
            round,
            heads: self.clusters.len(),
            alive: self.alive.len(),
        });
    }

    /// Head advertisement, member join requests and their receipt
    fn exchange_join_messages(&mut self) {
        let bits = self.config.size_control;
        let clusters: Vec<(NodeId, Vec<NodeId>)> = self
            .clusters
            .iter()
            .map(|(h, m)| (h, m.to_vec()))
            .collect();

        for (head, members) in clusters {
            let range = self.farthest_member(head, &members);
            self.nodes[head.index()].broadcast(bits, range, members.len(), self.energy_model.as_ref());

            for member in members {
                if !self.is_alive(member) {
                    continue;
                }
                let distance = self.nodes[member.index()].distance_to(&self.nodes[head.index()]);
                let model = self.energy_model.as_ref();
                self.nodes[member.index()].recv_broadcast(bits, model);
                self.nodes[member.index()].transmit(bits, distance, model);
                if self.is_alive(head) {
                    self.nodes[head.index()].receive(bits, model);
                }
            }
        }
    }

    /// Push the thresholds in force for `head`'s cluster to its alive members.
    ///
    /// Each member pays one control receive, the head pays one broadcast at
    /// the range of its farthest member. A head without alive members is
    /// marked as announced at no cost. Returns false if `head` is not an
    /// alive cluster head.
    pub fn broadcast_teen_parameters(&mut self, head: NodeId) -> bool {
        if head.is_sink() || !self.clusters.is_head(head) || !self.is_alive(head) {
            return false;
        }
        let bits = self.config.size_control;
        let members: Vec<NodeId> = self
            .clusters
            .members(head)
            .iter()
            .copied()
            .filter(|m| self.is_alive(*m))
            .collect();

        let model = self.energy_model.as_ref();
        for member in &members {
            self.nodes[member.index()].recv_broadcast(bits, model);
        }
        if !members.is_empty() {
            let range = self.farthest_member(head, &members);
            self.nodes[head.index()].broadcast(bits, range, members.len(), model);
        }

        let thresholds = self.parameters.resolve(Some(head));
        self.parameters.mark_broadcast(head);
        self.stats.parameter_broadcasts += 1;
        trace!(head = %head, members = members.len(), %thresholds, "Parameters broadcast");
        self.emit_event(SimEvent::ParametersBroadcast {
            head,
            members: members.len(),
            thresholds,
            round: self.round,
        });
        self.refresh_alive(self.round);
        true
    }

    fn farthest_member(&self, head: NodeId, members: &[NodeId]) -> f64 {
        let head_node = &self.nodes[head.index()];
        members
            .iter()
            .filter(|m| self.is_alive(**m))
            .map(|m| self.nodes[m.index()].distance_to(head_node))
            .fold(0.0, f64::max)
    }

    fn steady_state_phase(&mut self, counters: &mut RoundCounters) {
        if self.clusters.is_empty() {
            return;
        }

        // All sensing for the round happens before any decision
        let round = self.round;
        for id in &self.alive {
            let value = self
                .sensing
                .sense(&self.nodes[id.index()], round, &mut self.rng);
            let tracking = &mut self.tracking[id.index()];
            tracking.last_value = Some(value);
            tracking.rounds_since_transmission += 1;
        }

        let (bits, _) = self.gather(NodeId::SINK, counters);
        counters.bits_to_sink = bits;
    }

    /// Collect the sub-tree rooted at `head`; returns `(payload_bits, has_data)`
    fn gather(&mut self, head: NodeId, counters: &mut RoundCounters) -> (u64, bool) {
        let at_sink = head.is_sink();
        if !at_sink && !self.is_alive(head) {
            return (0, false);
        }

        let size = self.config.size_data;
        let mut size_not_agg = 0;
        let mut size_agg = 0;
        let mut has_data = false;

        if !at_sink && self.reports(head) {
            self.record_transmission(head, counters);
            size_not_agg += size;
        }

        let members = self.clusters.members(head).to_vec();
        for member in members {
            if !at_sink && !self.is_alive(head) {
                break;
            }
            if !self.is_alive(member) {
                continue;
            }
            if self.reports(member) {
                self.send(member, head, size);
                self.record_transmission(member, counters);
                counters.data_packets += 1;
                size_not_agg += size;
                has_data = true;
            } else {
                counters.empty_slots += 1;
            }
        }

        let children = self.routes.children_of(head).to_vec();
        for child in children {
            if !at_sink && !self.is_alive(head) {
                break;
            }
            let (sub_size, sub_has_data) = self.gather(child, counters);
            if sub_has_data && self.is_alive(child) {
                self.send(child, head, sub_size);
                size_agg += sub_size;
                has_data = true;
            }
        }

        if at_sink {
            return (size_agg, has_data);
        }
        if has_data || size_not_agg > 0 {
            self.nodes[head.index()].aggregate(size_not_agg, self.config.energy_agg);
            let aggregated = (size_not_agg as f64 * self.config.agg_rate).floor() as u64;
            return (aggregated + size_agg, true);
        }
        (0, false)
    }

    /// Sender pays the transmission, an alive receiver pays the reception
    fn send(&mut self, from: NodeId, to: NodeId, bits: u64) {
        let distance = self.nodes[from.index()].distance_to(&self.nodes[to.index()]);
        let model = self.energy_model.as_ref();
        self.nodes[from.index()].transmit(bits, distance, model);
        if self.nodes[to.index()].is_alive() {
            self.nodes[to.index()].receive(bits, model);
        }
    }

    /// Whether `node`'s reading of the current round passes the policy
    fn reports(&self, node: NodeId) -> bool {
        self.tracking[node.index()]
            .last_value
            .is_some_and(|value| self.should_transmit(node, value))
    }

    /// Pure transmission decision for `node` sensing `value`, using the
    /// thresholds currently in force for its cluster
    pub fn should_transmit(&self, node: NodeId, value: f64) -> bool {
        let Some(tracking) = self.tracking(node) else {
            return false;
        };
        let decision = Decision {
            value,
            thresholds: self.get_parameters_for_node(node),
            last_transmission: tracking.last_transmission,
            rounds_since_transmission: tracking.rounds_since_transmission,
        };
        let transmit = self.policy.should_transmit(&decision);
        if self.config.trace_decisions {
            trace!(
                node = %node,
                value,
                since = decision.rounds_since_transmission,
                transmit,
                "Transmission decision"
            );
        }
        transmit
    }

    fn record_transmission(&mut self, node: NodeId, counters: &mut RoundCounters) {
        let tracking = &mut self.tracking[node.index()];
        if let Some(value) = tracking.last_value {
            tracking.last_transmission = Transmission::Value(value);
            tracking.rounds_since_transmission = 0;
            counters.transmitting += 1;
        }
    }

    /// Drop exhausted sensors from the alive list, dating their deaths to `round`
    fn refresh_alive(&mut self, round: u64) {
        let (alive, died): (Vec<NodeId>, Vec<NodeId>) = self
            .alive
            .iter()
            .partition(|id| self.nodes[id.index()].is_alive());
        if died.is_empty() {
            return;
        }
        self.alive = alive;

        for node in died {
            if self.stats.first_death_round.is_none() {
                self.stats.first_death_round = Some(round);
                info!(node = %node, round, "First sensor died");
            }
            self.stats.last_death_round = Some(round);
            debug!(node = %node, "Sensor died");
            self.emit_event(SimEvent::NodeDied { node, round });
        }

        if self.alive.is_empty() {
            info!(round, "Network exhausted");
            self.emit_event(SimEvent::NetworkExhausted { round });
        }
    }

    // ------------------------------------------------------------------
    // Adaptive control surface
    // ------------------------------------------------------------------

    /// Install `(HT, ST, TC)` for the cluster led by `head`.
    ///
    /// The head must announce again at the next setup phase.
    pub fn set_cluster_parameters(
        &mut self,
        head: NodeId,
        hard: f64,
        soft: f64,
        count_time: u64,
    ) -> Result<(), ParameterError> {
        self.check_node(head)?;
        let thresholds = TeenThresholds::new(hard, soft, count_time);
        self.parameters.set_override(head, thresholds)?;
        debug!(head = %head, %thresholds, "Cluster override set");
        self.emit_event(SimEvent::ClusterOverrideSet {
            head,
            thresholds,
            round: self.round,
        });
        Ok(())
    }

    /// Remove `head`'s override, reverting its cluster to the globals
    pub fn clear_cluster_parameters(&mut self, head: NodeId) -> bool {
        let removed = self.parameters.clear_override(head);
        if removed {
            self.emit_event(SimEvent::ClusterOverrideCleared {
                head,
                round: self.round,
            });
        }
        removed
    }

    /// Sink query: update any subset of the global thresholds.
    ///
    /// Drops every cluster override, invalidates every announcement and
    /// charges each alive cluster head one control receive. Members pick up
    /// the new values immediately; heads announce them at the next setup.
    pub fn update_parameters_from_query(
        &mut self,
        hard: Option<f64>,
        soft: Option<f64>,
        count_time: Option<u64>,
    ) -> Result<TeenThresholds, ParameterError> {
        let thresholds = self.parameters.update_global(hard, soft, count_time)?;
        let overrides_cleared = self.parameters.clear_overrides();
        self.parameters.invalidate_all();

        let bits = self.config.size_control;
        let heads: Vec<NodeId> = self.clusters.heads().collect();
        let model = self.energy_model.as_ref();
        let mut spent = 0.0;
        for head in heads {
            spent += self.nodes[head.index()].recv_broadcast(bits, model);
        }
        self.stats.total_energy_spent += spent;
        self.stats.queries_applied += 1;

        info!(%thresholds, overrides_cleared, "Parameters updated from sink query");
        self.emit_event(SimEvent::ParametersUpdated {
            thresholds,
            overrides_cleared,
            round: self.round,
        });
        self.refresh_alive(self.round);
        Ok(thresholds)
    }

    /// Thresholds in force for `node`: its head's override, else the globals
    pub fn get_parameters_for_node(&self, node: NodeId) -> TeenThresholds {
        self.parameters.resolve(self.clusters.head_of(node))
    }

    pub fn global_parameters(&self) -> TeenThresholds {
        self.parameters.global()
    }

    /// Whether `head` has announced its current parameters
    pub fn parameters_broadcasted(&self, head: NodeId) -> bool {
        self.parameters.is_broadcast(head)
    }

    pub fn broadcast_count(&self) -> usize {
        self.parameters.broadcast_count()
    }

    pub fn parameters(&self) -> &ParameterRegistry {
        &self.parameters
    }

    fn check_node(&self, node: NodeId) -> Result<(), ParameterError> {
        if node.is_sink() {
            return Err(ParameterError::SinkNotAllowed);
        }
        if node.index() >= self.nodes.len() {
            return Err(ParameterError::UnknownNode(node));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    /// Alive sensors in id order
    pub fn alive_non_sinks(&self) -> &[NodeId] {
        &self.alive
    }

    pub fn clusters(&self) -> &Clusters {
        &self.clusters
    }

    pub fn routes(&self) -> &RoutingTree {
        &self.routes
    }

    pub fn get_cluster_heads(&self) -> Vec<NodeId> {
        self.clusters.heads().filter(|h| !h.is_sink()).collect()
    }

    pub fn get_cluster_members(&self, head: NodeId) -> &[NodeId] {
        self.clusters.members(head)
    }

    pub fn is_cluster_head(&self, node: NodeId) -> bool {
        self.clusters.is_head(node)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn sink(&self) -> &Node {
        &self.nodes[NodeId::SINK.index()]
    }

    /// Every sensor, dead ones included
    pub fn sensors(&self) -> &[Node] {
        &self.nodes[1..]
    }

    pub fn tracking(&self, id: NodeId) -> Option<&NodeTracking> {
        if id.is_sink() {
            return None;
        }
        self.tracking.get(id.index())
    }

    /// Whether `node` reported in the most recent round
    pub fn is_transmitting(&self, node: NodeId) -> bool {
        self.is_alive(node)
            && self
                .tracking(node)
                .is_some_and(|t| t.last_transmission.is_set() && t.rounds_since_transmission == 0)
    }

    pub fn is_alive(&self, node: NodeId) -> bool {
        self.nodes.get(node.index()).is_some_and(Node::is_alive)
    }

    /// Mean remaining energy over all sensors
    pub fn average_energy(&self) -> f64 {
        let sensors = self.sensors();
        sensors.iter().map(Node::energy).sum::<f64>() / sensors.len() as f64
    }

    fn sensor_energy(&self) -> f64 {
        self.sensors().iter().map(Node::energy).sum()
    }

    pub fn history(&self) -> &[RoundRecord] {
        &self.history
    }

    pub fn is_finished(&self) -> bool {
        self.alive.is_empty()
    }

    pub fn lifetime_report(&self, label: impl Into<String>) -> LifetimeReport {
        LifetimeReport {
            label: label.into(),
            first_death: self.stats.first_death_round,
            last_death: if self.is_finished() {
                self.stats.last_death_round
            } else {
                None
            },
        }
    }

    fn emit_event(&mut self, event: SimEvent) {
        trace!("Event: {:?}", event);
        if self.config.record_events {
            self.event_log.push(event);
        }
    }

    /// Get a summary of the current state
    pub fn state_summary(&self) -> String {
        format!(
            "Round {}: {}/{} alive, {} heads, avg energy {:.4} J, {} bits to sink",
            self.round,
            self.alive.len(),
            self.nodes.len() - 1,
            self.clusters.len(),
            self.average_energy(),
            self.stats.bits_to_sink
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::deployment::{DeploymentBuilder, SquareAnchor};
    use crate::sensing::ConstantSensing;
    use crate::types::Protocol;

    fn field(count: usize) -> Deployment {
        DeploymentBuilder::new(count)
            .with_seed(11)
            .uniform_in_square(100.0, SquareAnchor::LeftBottom)
            .unwrap()
    }

    fn config(protocol: Protocol) -> SimConfig {
        SimConfig {
            protocol,
            seed: Some(5),
            ..Default::default()
        }
    }

    #[test]
    fn test_simulation_creation() {
        let sim = Simulation::new(&field(20), config(Protocol::Apteen)).unwrap();
        assert_eq!(sim.round, 0);
        assert_eq!(sim.alive_non_sinks().len(), 20);
        assert_eq!(sim.sensors().len(), 20);
        assert!(sim.sink().is_sink());
        assert!(sim.clusters().is_empty());
        assert!(!sim.is_finished());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad = SimConfig {
            n_cluster: 0,
            ..Default::default()
        };
        assert!(Simulation::new(&field(5), bad).is_err());
    }

    #[test]
    fn test_execute_forms_clusters() {
        let mut sim = Simulation::new(&field(30), config(Protocol::LeachPrim)).unwrap();
        let record = sim.execute().unwrap().clone();

        assert_eq!(record.round, 0);
        assert_eq!(sim.round, 1);
        assert!(record.cluster_heads >= 1);
        assert_eq!(sim.clusters().covered_count(), 30);
        assert_eq!(sim.routes().len(), sim.clusters().len());
        assert!(record.energy_spent > 0.0);
        assert!(matches!(sim.event_log[0], SimEvent::SetupCompleted { round: 0, .. }));
    }

    #[test]
    fn test_leach_everyone_reports() {
        let mut sim = Simulation::new(&field(25), config(Protocol::Leach)).unwrap();
        let record = sim.execute().unwrap().clone();
        assert_eq!(record.transmitting, 25);
        assert_eq!(record.empty_slots, 0);
        assert_eq!(sim.stats.data_packets, 25 - record.cluster_heads as u64);

        // Every head sends straight to the sink
        assert!(sim.clusters().heads().all(|h| sim.routes().parent_of(h) == Some(NodeId::SINK)));
        assert!(record.bits_to_sink > 0);
        assert!(record.bits_to_sink <= 25 * 4096);
    }

    #[test]
    fn test_silent_below_hard_threshold() {
        let mut sim = Simulation::new(&field(20), config(Protocol::Apteen))
            .unwrap()
            .with_sensing(ConstantSensing(10.0));
        sim.run_rounds(5);

        assert_eq!(sim.stats.data_packets, 0);
        assert_eq!(sim.stats.bits_to_sink, 0);
        assert!(sim.stats.empty_slots > 0);
        assert!(sim.history().iter().all(|r| r.transmitting == 0));
    }

    #[test]
    fn test_count_time_forces_report() {
        let cfg = SimConfig {
            thresholds: TeenThresholds::new(50.0, 100.0, 3),
            ..config(Protocol::Apteen)
        };
        let mut sim = Simulation::new(&field(10), cfg)
            .unwrap()
            .with_sensing(ConstantSensing(60.0));
        sim.run_rounds(7);

        let transmitting: Vec<usize> = sim.history().iter().map(|r| r.transmitting).collect();
        assert_eq!(transmitting, vec![10, 0, 0, 10, 0, 0, 10]);
    }

    #[test]
    fn test_teen_heads_announce_each_setup() {
        let mut sim = Simulation::new(&field(30), config(Protocol::Apteen)).unwrap();
        sim.execute();
        let heads = sim.get_cluster_heads();
        assert!(!heads.is_empty());
        assert!(heads.iter().all(|h| sim.parameters_broadcasted(*h)));
        assert_eq!(sim.broadcast_count(), heads.len());

        let mut leach = Simulation::new(&field(30), config(Protocol::Leach)).unwrap();
        leach.execute();
        assert_eq!(leach.broadcast_count(), 0);
    }

    #[test]
    fn test_cluster_override_precedence() {
        let mut sim = Simulation::new(&field(30), config(Protocol::Apteen)).unwrap();
        sim.execute();
        let (head, member) = sim
            .clusters()
            .iter()
            .find_map(|(h, m)| m.first().map(|m| (h, *m)))
            .unwrap();

        sim.set_cluster_parameters(head, 20.0, 1.0, 4).unwrap();
        assert!(!sim.parameters_broadcasted(head));
        assert_eq!(sim.get_parameters_for_node(member), TeenThresholds::new(20.0, 1.0, 4));
        assert_eq!(sim.get_parameters_for_node(head), TeenThresholds::new(20.0, 1.0, 4));

        assert!(sim.clear_cluster_parameters(head));
        assert_eq!(sim.get_parameters_for_node(member), sim.global_parameters());
    }

    #[test]
    fn test_cluster_override_errors() {
        let mut sim = Simulation::new(&field(5), config(Protocol::Apteen)).unwrap();
        assert_eq!(
            sim.set_cluster_parameters(NodeId::SINK, 10.0, 1.0, 1),
            Err(ParameterError::SinkNotAllowed)
        );
        assert_eq!(
            sim.set_cluster_parameters(NodeId(99), 10.0, 1.0, 1),
            Err(ParameterError::UnknownNode(NodeId(99)))
        );
        assert!(matches!(
            sim.set_cluster_parameters(NodeId(1), -1.0, 1.0, 1),
            Err(ParameterError::InvalidThreshold { name: "hard", .. })
        ));
    }

    #[test]
    fn test_query_resets_overrides_and_charges_heads() {
        let mut sim = Simulation::new(&field(30), config(Protocol::Apteen)).unwrap();
        sim.execute();
        let head = sim.get_cluster_heads()[0];
        sim.set_cluster_parameters(head, 20.0, 1.0, 4).unwrap();

        let before = sim.node(head).unwrap().energy();
        let updated = sim
            .update_parameters_from_query(Some(70.0), None, Some(6))
            .unwrap();

        assert_eq!(updated, TeenThresholds::new(70.0, 2.0, 6));
        assert_eq!(sim.global_parameters(), updated);
        assert!(sim.parameters().overrides().is_empty());
        assert_eq!(sim.broadcast_count(), 0);
        assert_eq!(sim.get_parameters_for_node(head), updated);
        assert!(sim.node(head).unwrap().energy() < before);
        assert_eq!(sim.stats.queries_applied, 1);
        assert!(matches!(
            sim.event_log.last(),
            Some(SimEvent::ParametersUpdated { overrides_cleared: 1, .. })
        ));
    }

    /// First-order radio whose receptions drain a full battery while armed
    #[derive(Debug)]
    struct ArmedRadio {
        radio: wsn_core::FirstOrderRadio,
        armed: Rc<Cell<bool>>,
    }

    impl EnergyModel for ArmedRadio {
        fn tx_cost(&self, bits: u64, distance: f64) -> f64 {
            self.radio.tx_cost(bits, distance)
        }

        fn rx_cost(&self, bits: u64) -> f64 {
            if self.armed.get() { 1.0 } else { self.radio.rx_cost(bits) }
        }
    }

    fn armed_simulation(count: usize) -> (Simulation, Rc<Cell<bool>>) {
        let armed = Rc::new(Cell::new(false));
        let sim = Simulation::new(&field(count), config(Protocol::Apteen))
            .unwrap()
            .with_energy_model(ArmedRadio {
                radio: Default::default(),
                armed: Rc::clone(&armed),
            });
        (sim, armed)
    }

    #[test]
    fn test_query_deaths_leave_alive_list() {
        let (mut sim, armed) = armed_simulation(30);
        sim.execute();
        let heads = sim.get_cluster_heads();
        assert!(!heads.is_empty());

        armed.set(true);
        sim.update_parameters_from_query(Some(60.0), None, None).unwrap();
        armed.set(false);

        for head in &heads {
            assert!(!sim.is_alive(*head));
            assert!(!sim.alive_non_sinks().contains(head));
        }
        assert!(sim.alive_non_sinks().iter().all(|id| sim.is_alive(*id)));
        assert_eq!(sim.alive_non_sinks().len(), 30 - heads.len());
        assert_eq!(sim.stats.first_death_round, Some(1));
        let deaths = sim
            .event_log
            .iter()
            .filter(|e| matches!(e, SimEvent::NodeDied { round: 1, .. }))
            .count();
        assert_eq!(deaths, heads.len());

        sim.execute();
        assert!(sim.get_cluster_heads().iter().all(|h| sim.is_alive(*h)));
        assert!(sim.clusters().covered().all(|id| !heads.contains(&id)));
        assert_eq!(sim.clusters().covered_count(), 30 - heads.len());
    }

    #[test]
    fn test_broadcast_deaths_leave_alive_list() {
        let (mut sim, armed) = armed_simulation(30);
        sim.execute();
        let head = sim
            .get_cluster_heads()
            .into_iter()
            .find(|h| !sim.get_cluster_members(*h).is_empty())
            .unwrap();
        let members = sim.get_cluster_members(head).to_vec();

        armed.set(true);
        assert!(sim.broadcast_teen_parameters(head));
        armed.set(false);

        for member in &members {
            assert!(!sim.alive_non_sinks().contains(member));
        }
        assert!(sim.alive_non_sinks().contains(&head));
        assert_eq!(sim.alive_non_sinks().len(), 30 - members.len());

        sim.execute();
        assert!(sim.clusters().covered().all(|id| !members.contains(&id)));
    }

    #[test]
    fn test_invalid_query_changes_nothing() {
        let mut sim = Simulation::new(&field(10), config(Protocol::Apteen)).unwrap();
        assert!(sim.update_parameters_from_query(None, Some(-1.0), None).is_err());
        assert_eq!(sim.global_parameters(), TeenThresholds::default());
        assert_eq!(sim.stats.queries_applied, 0);
    }

    #[test]
    fn test_runs_to_exhaustion() {
        let deployment = DeploymentBuilder::new(15)
            .with_seed(3)
            .with_initial_energy(0.02)
            .uniform_in_square(100.0, SquareAnchor::LeftBottom)
            .unwrap();
        let mut sim = Simulation::new(&deployment, config(Protocol::Leach)).unwrap();
        sim.run_to_completion();

        assert!(sim.is_finished());
        assert!(sim.execute().is_none());
        let report = sim.lifetime_report("LEACH");
        let first = report.first_death.unwrap();
        let last = report.last_death.unwrap();
        assert!(first <= last);
        assert_eq!(last + 1, sim.round);
        assert!(matches!(sim.event_log.last(), Some(SimEvent::NetworkExhausted { .. })));
        assert!(sim.sensors().iter().all(|n| !n.is_alive()));
    }

    #[test]
    fn test_max_rounds_cap() {
        let cfg = SimConfig {
            max_rounds: Some(4),
            ..config(Protocol::LeachPrim)
        };
        let mut sim = Simulation::new(&field(10), cfg).unwrap();
        sim.run_to_completion();
        assert_eq!(sim.round, 4);
        assert_eq!(sim.history().len(), 4);
        assert_eq!(sim.lifetime_report("capped").last_death, None);
    }

    #[test]
    fn test_setup_interval_keeps_clusters() {
        let cfg = SimConfig {
            setup_interval: 5,
            ..config(Protocol::LeachPrim)
        };
        let mut sim = Simulation::new(&field(30), cfg).unwrap();
        sim.run_rounds(3);
        assert_eq!(sim.stats.setup_phases, 1);
        sim.run_rounds(3);
        assert_eq!(sim.stats.setup_phases, 2);
    }

    #[test]
    fn test_same_seed_same_history() {
        let run = || {
            let mut sim = Simulation::new(&field(40), config(Protocol::Apteen)).unwrap();
            sim.run_rounds(30);
            sim.history().to_vec()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_event_recording_can_be_disabled() {
        let cfg = SimConfig {
            record_events: false,
            ..config(Protocol::Apteen)
        };
        let mut sim = Simulation::new(&field(10), cfg).unwrap();
        sim.run_rounds(3);
        assert!(sim.event_log.is_empty());
    }

    #[test]
    fn test_should_transmit_is_pure() {
        let mut sim = Simulation::new(&field(10), config(Protocol::Apteen))
            .unwrap()
            .with_sensing(ConstantSensing(55.0));
        let node = NodeId(3);
        assert!(!sim.should_transmit(node, 49.999));
        assert!(sim.should_transmit(node, 50.0));
        assert_eq!(sim.tracking(node).unwrap().last_transmission, Transmission::Unset);

        sim.execute();
        let tracking = *sim.tracking(node).unwrap();
        assert_eq!(tracking.last_transmission, Transmission::Value(55.0));
        assert!(!sim.should_transmit(node, 56.9));
        assert!(sim.should_transmit(node, 57.0));
        assert_eq!(*sim.tracking(node).unwrap(), tracking);
        assert!(!sim.should_transmit(NodeId::SINK, 100.0));
    }

    #[test]
    fn test_state_summary() {
        let mut sim = Simulation::new(&field(10), config(Protocol::Leach)).unwrap();
        sim.execute();
        let summary = sim.state_summary();
        assert!(summary.starts_with("Round 1: 10/10 alive"));
    }
}
