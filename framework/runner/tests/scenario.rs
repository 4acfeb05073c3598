mod common;

use std::time::Duration;

use common::{constant_stats, slack_proportional_stats, StubEngine};
use csl_tunnel_runner::prelude::*;
use pretty_assertions::assert_eq;

#[test]
fn coordinated_scenario_configures_both_nodes() -> anyhow::Result<()> {
    let mut engine = StubEngine::new(slack_proportional_stats);

    let outcome = ScenarioRunner::default().run(
        &mut engine,
        SweepParameter::new(20, 50),
        ListeningMode::Coordinated,
    )?;

    assert_eq!(SweepParameter::new(20, 50), outcome.parameter);
    assert_eq!(StatsSample::new(690, 59310), outcome.sample);

    assert_eq!(
        vec!["csl accuracy 20", "csl uncertainty 50"],
        engine.commands_for(1)
    );
    assert_eq!(
        vec![
            "pollperiod 240000",
            "csl timeout 240",
            "csl period 1000000",
            "radio stats clear",
            "radio stats"
        ],
        engine.commands_for(2)
    );
    Ok(())
}

#[test]
fn polling_scenario_uses_short_poll_period() -> anyhow::Result<()> {
    let mut engine = StubEngine::new(constant_stats);

    ScenarioRunner::default().run(
        &mut engine,
        SweepParameter::new(1, 10),
        ListeningMode::Polling,
    )?;

    assert_eq!(
        vec!["pollperiod 1000", "radio stats clear", "radio stats"],
        engine.commands_for(2)
    );
    Ok(())
}

#[test]
fn ideal_parameter_is_sent_to_the_device() -> anyhow::Result<()> {
    let mut engine = StubEngine::new(constant_stats);

    ScenarioRunner::default().run(&mut engine, SweepParameter::IDEAL, ListeningMode::Coordinated)?;

    assert_eq!(
        vec!["csl accuracy 0", "csl uncertainty 0"],
        engine.commands_for(1)
    );
    Ok(())
}

#[test]
fn scenario_advances_warm_up_twice_then_the_window() -> anyhow::Result<()> {
    let mut engine = StubEngine::new(constant_stats);

    ScenarioRunner::default().run(
        &mut engine,
        SweepParameter::new(1, 1),
        ListeningMode::Coordinated,
    )?;

    assert_eq!(Duration::from_secs(80), engine.simulated);
    Ok(())
}

#[test]
fn nodes_are_removed_after_success() -> anyhow::Result<()> {
    let mut engine = StubEngine::new(constant_stats);

    ScenarioRunner::default().run(
        &mut engine,
        SweepParameter::new(1, 1),
        ListeningMode::Coordinated,
    )?;

    assert!(engine.live_nodes.is_empty());
    assert_eq!(vec![2, 1], engine.deleted_nodes);
    Ok(())
}

#[test]
fn split_topology_fails_and_still_removes_nodes() {
    let mut engine = StubEngine::new(constant_stats);
    engine.split_on_scenario = Some(1);

    let err = ScenarioRunner::default()
        .run(
            &mut engine,
            SweepParameter::new(1, 1),
            ListeningMode::Coordinated,
        )
        .unwrap_err();

    assert!(err.downcast_ref::<TopologyError>().is_some());
    assert!(engine.live_nodes.is_empty());
    // Stats are never touched once the topology is known to be wrong.
    assert!(!engine.commands_for(2).contains(&"radio stats clear"));
}

#[test]
fn extraction_failure_propagates_unchanged() {
    let mut engine = StubEngine::new(constant_stats);
    engine.stats_override = Some(vec!["Rx Time: 1.234s".to_string()]);

    let err = ScenarioRunner::default()
        .run(
            &mut engine,
            SweepParameter::new(1, 1),
            ListeningMode::Coordinated,
        )
        .unwrap_err();

    assert_eq!(
        Some(&StatsError::MissingField {
            label: SLEEP_TIME_LABEL
        }),
        err.downcast_ref::<StatsError>()
    );
    assert!(engine.live_nodes.is_empty());
}

#[test]
fn custom_geometry_and_timing() -> anyhow::Result<()> {
    let mut engine = StubEngine::new(constant_stats);
    let config = ScenarioConfig {
        warm_up: Duration::from_secs(5),
        measurement_window: Duration::from_secs(30),
        csl_period_us: 500_000,
        ..Default::default()
    };

    ScenarioRunner::new(config).run(
        &mut engine,
        SweepParameter::new(1, 1),
        ListeningMode::Coordinated,
    )?;

    assert_eq!(Duration::from_secs(40), engine.simulated);
    assert!(engine.commands_for(2).contains(&"csl period 500000"));
    Ok(())
}
