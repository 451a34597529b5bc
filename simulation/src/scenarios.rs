//! Pre-defined simulation scenarios
//!
//! Each scenario prints a walkthrough to stdout and returns what it ran so
//! callers and tests can inspect the outcome.

use tracing::info;

use wsn_core::{NodeId, WsnResult};

use crate::config::SimConfig;
use crate::deployment::Deployment;
use crate::policy::ThresholdPreset;
use crate::simulation::Simulation;
use crate::types::{LifetimeReport, Protocol, SimEvent};

/// Rounds between progress lines
const PROGRESS_EVERY: u64 = 100;

/// Run one protocol until the network is exhausted, printing progress
pub fn run_protocol(deployment: &Deployment, config: SimConfig) -> WsnResult<Simulation> {
    info!("=== Running {} ===", config.protocol);

    let mut sim = Simulation::new(deployment, config)?;
    sim.initialize();
    println!("{}", sim.state_summary());

    while !sim.is_finished() && sim.config.max_rounds.is_none_or(|cap| sim.round < cap) {
        sim.execute();
        if sim.round.is_multiple_of(PROGRESS_EVERY) {
            println!("{}", sim.state_summary());
        }
    }

    print_stats(&sim);
    Ok(sim)
}

/// Print the final statistics block
pub fn print_stats(sim: &Simulation) {
    let s = &sim.stats;
    println!("\n=== Final Statistics ({}) ===", sim.config.protocol);
    println!("  Rounds executed: {}", s.rounds);
    println!("  Setup phases: {}", s.setup_phases);
    println!("  Fallback elections: {}", s.fallback_elections);
    println!("  Data packets: {}", s.data_packets);
    println!("  Empty slots: {}", s.empty_slots);
    println!("  Parameter broadcasts: {}", s.parameter_broadcasts);
    println!("  Energy spent: {:.4} J", s.total_energy_spent);
    println!("  Bits to sink: {}", s.bits_to_sink);
    println!("  {}", sim.lifetime_report(sim.config.protocol.name()));
}

/// Run every protocol on the same deployment and seed
pub fn run_comparison(deployment: &Deployment, base: &SimConfig) -> WsnResult<Vec<LifetimeReport>> {
    info!("=== Running Protocol Comparison ===");

    let mut reports = Vec::new();
    for protocol in [Protocol::Leach, Protocol::LeachPrim, Protocol::Apteen] {
        let config = SimConfig {
            protocol,
            ..base.clone()
        };
        let mut sim = Simulation::new(deployment, config)?;
        sim.run_to_completion();
        reports.push(sim.lifetime_report(protocol.name()));
    }

    print_reports("Protocol lifetimes", &reports);
    Ok(reports)
}

/// Run APTEEN under each threshold preset, then once with per-cluster
/// overrides assigned to the first round's heads
pub fn run_preset_comparison(
    deployment: &Deployment,
    base: &SimConfig,
) -> WsnResult<Vec<LifetimeReport>> {
    info!("=== Running Threshold Preset Comparison ===");

    let mut reports = Vec::new();
    for preset in ThresholdPreset::ALL {
        let config = SimConfig {
            protocol: Protocol::Apteen,
            thresholds: preset.thresholds(),
            ..base.clone()
        };
        let mut sim = Simulation::new(deployment, config)?;
        sim.run_to_completion();
        println!("  {:<14} {} data packets", preset.label(), sim.stats.data_packets);
        reports.push(sim.lifetime_report(preset.label()));
    }

    let mut sim = Simulation::new(
        deployment,
        SimConfig {
            protocol: Protocol::Apteen,
            ..base.clone()
        },
    )?;
    sim.execute();
    let assigned = assign_cluster_presets(&mut sim)?;
    println!("  Adaptive: {} clusters with their own thresholds", assigned);
    sim.run_to_completion();
    reports.push(sim.lifetime_report("Adaptive"));

    print_reports("Preset lifetimes", &reports);
    Ok(reports)
}

/// Give the current heads sensitive, economical and balanced thresholds in turn
fn assign_cluster_presets(sim: &mut Simulation) -> WsnResult<usize> {
    let cycle = [
        ThresholdPreset::Aggressive,
        ThresholdPreset::Conservative,
        ThresholdPreset::Balanced,
    ];
    let heads = sim.get_cluster_heads();
    for (head, preset) in heads.iter().zip(cycle.iter().cycle()) {
        let t = preset.thresholds();
        sim.set_cluster_parameters(*head, t.hard, t.soft, t.count_time)?;
    }
    Ok(heads.len())
}

fn print_reports(title: &str, reports: &[LifetimeReport]) {
    println!("\n=== {} ===", title);
    for report in reports {
        println!("  {}", report);
    }
}

/// Walk through global parameters, per-cluster overrides and a sink query
pub fn run_parameter_walkthrough(deployment: &Deployment, base: &SimConfig) -> WsnResult<Simulation> {
    info!("=== Running Parameter Walkthrough ===");

    let mut sim = Simulation::new(
        deployment,
        SimConfig {
            protocol: Protocol::Apteen,
            ..base.clone()
        },
    )?;

    println!("\n--- Step 1: Global parameters ---");
    println!("  {}", sim.global_parameters());

    println!("\n--- Step 2: First setup phase ---");
    sim.execute();
    let heads = sim.get_cluster_heads();
    println!("  {}", sim.state_summary());
    println!("  {} heads announced their parameters", sim.broadcast_count());

    println!("\n--- Step 3: Per-cluster overrides ---");
    let presets = [ThresholdPreset::Aggressive, ThresholdPreset::Conservative];
    for (head, preset) in heads.iter().zip(presets) {
        let t = preset.thresholds();
        sim.set_cluster_parameters(*head, t.hard, t.soft, t.count_time)?;
        println!("  Cluster {} ({}): {}", head, preset.label(), t);
        describe_members(&sim, *head);
    }
    if let Some(head) = heads.get(presets.len()) {
        println!("  Cluster {} (global):", head);
        describe_members(&sim, *head);
    }

    sim.run_rounds(10);
    println!("  {}", sim.state_summary());

    println!("\n--- Step 4: Sink query raises the hard threshold ---");
    let updated = sim.update_parameters_from_query(Some(60.0), None, Some(15))?;
    println!("  New globals: {}", updated);
    println!("  Overrides left: {}", sim.parameters().overrides().len());
    println!("  Heads still announced: {}", sim.broadcast_count());

    sim.run_rounds(10);
    println!("  {}", sim.state_summary());
    println!("  {} heads announced the new parameters", sim.broadcast_count());

    println!("\n=== Event Log ===");
    let notable = sim
        .event_log
        .iter()
        .filter(|e| !matches!(e, SimEvent::ParametersBroadcast { .. } | SimEvent::SetupCompleted { .. }));
    for event in notable {
        println!("  {:?}", event);
    }

    Ok(sim)
}

fn describe_members(sim: &Simulation, head: NodeId) {
    for member in sim.get_cluster_members(head).iter().take(2) {
        println!("    member {}: {}", member, sim.get_parameters_for_node(*member));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployment::{DeploymentBuilder, SquareAnchor};

    fn small_field() -> Deployment {
        DeploymentBuilder::new(20)
            .with_seed(8)
            .with_initial_energy(0.05)
            .uniform_in_square(100.0, SquareAnchor::LeftBottom)
            .unwrap()
    }

    fn base() -> SimConfig {
        SimConfig {
            seed: Some(2),
            record_events: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_run_protocol_exhausts_network() {
        let sim = run_protocol(&small_field(), SimConfig {
            protocol: Protocol::LeachPrim,
            ..base()
        })
        .unwrap();
        assert!(sim.is_finished());
    }

    #[test]
    fn test_comparison_reports_every_protocol() {
        let reports = run_comparison(&small_field(), &base()).unwrap();
        let labels: Vec<&str> = reports.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["LEACH", "LEACH-Prim", "APTEEN"]);
        assert!(reports.iter().all(|r| r.last_death.is_some()));
    }

    #[test]
    fn test_preset_comparison_includes_adaptive() {
        let reports = run_preset_comparison(&small_field(), &base()).unwrap();
        assert_eq!(reports.len(), ThresholdPreset::ALL.len() + 1);
        assert_eq!(reports.last().unwrap().label, "Adaptive");
    }

    #[test]
    fn test_parameter_walkthrough() {
        let sim = run_parameter_walkthrough(&small_field(), &SimConfig {
            seed: Some(2),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(sim.global_parameters().hard, 60.0);
        assert_eq!(sim.stats.queries_applied, 1);
        assert!(sim.parameters().overrides().is_empty());
    }
}
