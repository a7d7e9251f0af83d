//! Top-level wiring: a kernel, a flow engine and the machines from a
//! config, with a run loop and a summary.

use std::cell::RefCell;
use std::rc::Rc;

use sugars::{rc, refcell};

use flowsim_core::{Instant, Simulation};

use crate::config::sim_config::{GroupMachineConfig, SimulationConfig};
use crate::error::{ConfigError, FlowError};
use crate::flow::{FlowEngine, FlowFragment, NodeId};
use crate::machine::{build_machine, Machine, MachineConfig};
use crate::monitoring::Monitoring;

pub struct FlowSimulation {
    sim: Simulation,

    engine: Rc<RefCell<FlowEngine>>,
    monitoring: Rc<RefCell<Monitoring>>,

    machines: Vec<Machine>,
    task_cnt: u64,
}

unsafe impl Send for FlowSimulation {}

impl FlowSimulation {
    pub fn new(mut sim: Simulation, config: SimulationConfig) -> Result<FlowSimulation, ConfigError> {
        config.validate()?;

        let monitoring = rc!(refcell!(Monitoring::new()));

        let engine_ctx = sim.create_context("flow-engine");
        let engine = rc!(refcell!(FlowEngine::with_monitoring(
            engine_ctx,
            monitoring.clone()
        )));
        sim.add_handler("flow-engine", engine.clone());

        let mut simulation = FlowSimulation {
            sim,
            engine,
            monitoring,
            machines: Vec::new(),
            task_cnt: 0,
        };

        simulation.build_machines(config.machines)?;

        Ok(simulation)
    }

    fn build_machines(&mut self, groups: Vec<GroupMachineConfig>) -> Result<(), ConfigError> {
        for group in groups {
            if group.count.unwrap_or(1) == 1 {
                self.build_machine(MachineConfig::from_group_config(&group, None))?;
            } else {
                for i in 0..group.count.unwrap() {
                    self.build_machine(MachineConfig::from_group_config(&group, Some(i)))?;
                }
            }
        }
        Ok(())
    }

    fn build_machine(&mut self, config: MachineConfig) -> Result<(), ConfigError> {
        let machine = build_machine(&mut self.engine.borrow_mut(), &config)
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
        self.machines.push(machine);
        Ok(())
    }

    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    pub fn engine(&self) -> Rc<RefCell<FlowEngine>> {
        self.engine.clone()
    }

    pub fn monitoring(&self) -> Rc<RefCell<Monitoring>> {
        self.monitoring.clone()
    }

    /// Attach a fragment-driven workload to a machine's multiplexer.
    /// Returns the sink node it runs on.
    pub fn add_workload(
        &mut self,
        machine_index: usize,
        fragments: Vec<FlowFragment>,
    ) -> Result<NodeId, FlowError> {
        let mux = self.machines[machine_index].mux;
        let name = format!("task-{}", self.task_cnt);
        self.task_cnt += 1;

        let mut engine = self.engine.borrow_mut();
        let sink = engine.add_sink(&name);
        engine.connect(mux, sink)?;
        engine.push_fragments(sink, fragments)?;
        Ok(sink)
    }

    pub fn time(&self) -> Instant {
        self.sim.time()
    }

    pub fn event_count(&self) -> u64 {
        self.sim.event_count()
    }

    /// Drain the simulation and log a short summary.
    pub fn run(&mut self) {
        let t = std::time::Instant::now();

        self.sim.step_until_no_events();

        let elapsed = t.elapsed().as_secs_f64();
        log::info!(
            target: "simulation",
            "finished at {:.3}s simulated, {} events in {:.3}s wall ({:.0} events/s)",
            self.sim.time().as_secs_f64(),
            self.sim.event_count(),
            elapsed,
            self.sim.event_count() as f64 / elapsed.max(f64::MIN_POSITIVE),
        );
    }

    /// Advance the simulation to `limit`, firing everything due on the
    /// way, then stop there.
    pub fn run_until(&mut self, limit: Instant) {
        self.sim.step_until_time(limit);
    }
}
