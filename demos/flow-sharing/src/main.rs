use std::io::Write;

use env_logger::Builder;

use flowsim::{FlowFragment, FlowSimulation, SimulationConfig};
use flowsim_core::Simulation;

const CONFIG: &str = r#"
machines:
  - name: shared
    cpu:
      capacity: 3200.0
      sharing: max-min-fair
      governor:
        type: conservative
        step: 400.0
      power:
        type: linear
        max: 350.0
        idle: 200.0
  - name: exclusive
    cpu:
      capacity: 3200.0
      sharing: exclusive
      governor:
        type: performance
      power:
        type: asymptotic
        max: 350.0
        idle: 200.0
        param: 0.3
"#;

fn main() {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let config = SimulationConfig::from_yaml(CONFIG).expect("invalid demo config");
    let mut simulation =
        FlowSimulation::new(Simulation::new(), config).expect("cannot build simulation");

    // the shared machine splits its cores fairly between two tasks
    simulation
        .add_workload(
            0,
            vec![
                FlowFragment::new(4_000, 2_400.0),
                FlowFragment::new(2_000, 800.0),
            ],
        )
        .expect("cannot attach workload");
    simulation
        .add_workload(0, vec![FlowFragment::new(3_000, 2_000.0)])
        .expect("cannot attach workload");

    // the exclusive machine runs one task at a time, in arrival order
    simulation
        .add_workload(1, vec![FlowFragment::new(3_000, 2_400.0)])
        .expect("cannot attach workload");
    simulation
        .add_workload(1, vec![FlowFragment::new(2_000, 3_200.0)])
        .expect("cannot attach workload");

    simulation.run();

    let horizon = simulation.time().as_secs_f64();
    println!("simulated {:.3}s, {} events", horizon, simulation.event_count());

    let monitoring = simulation.monitoring();
    let monitoring = monitoring.borrow();
    for name in ["cpu-shared", "cpu-exclusive"] {
        let series = monitoring.series(name).expect("missing series");
        let peak_power = series
            .points()
            .iter()
            .filter_map(|p| p.power)
            .fold(0.0f64, f64::max);
        println!(
            "{}: mean utilization {:.3}, peak power {:.1} W, {} samples",
            name,
            series.mean_utilization(horizon),
            peak_power,
            series.points().len(),
        );
    }
}
