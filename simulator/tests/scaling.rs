use flowsim::{FlowFragment, FlowSimulation, SimulationConfig};
use flowsim_core::{Instant, Simulation};

const EPS: f64 = 1e-6;

const CONSERVATIVE_MACHINE: &str = r#"
machines:
  - name: m
    cpu:
      capacity: 1000.0
      governor:
        type: conservative
        step: 200.0
      power:
        type: linear
        max: 350.0
        idle: 200.0
"#;

#[test]
fn conservative_governor_shapes_capacity_and_power() {
    let config = SimulationConfig::from_yaml(CONSERVATIVE_MACHINE).unwrap();
    let mut simulation = FlowSimulation::new(Simulation::new(), config).unwrap();

    // asks for 900/s for one nominal second
    simulation
        .add_workload(0, vec![FlowFragment::new(1_000, 900.0)])
        .unwrap();

    simulation.run();

    // the governor had stepped down to 800 before the work arrived, so
    // 900 units of work ran at 800/s
    assert_eq!(simulation.time(), Instant::from_nanos(1_125_000_000));

    let source = simulation.machines()[0].source;
    let engine = simulation.engine();
    let context = engine.borrow().scaling_context(source).unwrap();
    assert!((context.target - 800.0).abs() < EPS);
    assert!(context.last_utilization.abs() < EPS);

    let monitoring = simulation.monitoring();
    let monitoring = monitoring.borrow();
    let series = monitoring.series("cpu-m").unwrap();
    let powers: Vec<f64> = series.points().iter().filter_map(|p| p.power).collect();
    assert_eq!(powers.len(), series.points().len());
    // saturated while the work ran, idle draw before and after
    assert!(powers.iter().any(|&p| (p - 350.0).abs() < EPS));
    assert!((powers.last().unwrap() - 200.0).abs() < EPS);

    // the sink's service ratio was capped by the stepped-down capacity
    let task = monitoring.series("task-0").unwrap();
    assert!(task
        .points()
        .iter()
        .any(|p| (p.utilization - 800.0 / 900.0).abs() < EPS));
}

const PERFORMANCE_MACHINE: &str = r#"
machines:
  - name: m
    cpu:
      capacity: 1000.0
      governor:
        type: performance
      power:
        type: constant
        power: 200.0
"#;

#[test]
fn performance_governor_pins_capacity_at_the_ceiling() {
    let config = SimulationConfig::from_yaml(PERFORMANCE_MACHINE).unwrap();
    let mut simulation = FlowSimulation::new(Simulation::new(), config).unwrap();

    simulation
        .add_workload(0, vec![FlowFragment::new(2_000, 1_000.0)])
        .unwrap();

    simulation.run();

    assert_eq!(simulation.time(), Instant::from_secs(2));

    let source = simulation.machines()[0].source;
    let engine = simulation.engine();
    let context = engine.borrow().scaling_context(source).unwrap();
    assert!((context.target - 1_000.0).abs() < EPS);

    let monitoring = simulation.monitoring();
    let monitoring = monitoring.borrow();
    let series = monitoring.series("cpu-m").unwrap();
    for point in series.points() {
        assert_eq!(point.power, Some(200.0));
    }
}

#[test]
fn portfolio_trials_run_independently() {
    let mut launcher = flowsim::PortfolioLauncher::default();
    for _ in 0..2 {
        let config = SimulationConfig::from_yaml(PERFORMANCE_MACHINE).unwrap();
        let mut simulation = FlowSimulation::new(Simulation::new(), config).unwrap();
        simulation
            .add_workload(0, vec![FlowFragment::new(1_000, 500.0)])
            .unwrap();
        launcher.add_simulation(simulation);
    }

    let finished = launcher.run_simulations();
    assert_eq!(finished.len(), 2);
    for simulation in &finished {
        assert_eq!(simulation.time(), Instant::from_secs(1));
    }
}
