//! Running independent simulation trials in parallel.
//!
//! Simulations share no mutable state, so a portfolio of trials (e.g.
//! repeated runs over a parameter grid) may fan out over OS threads.
//! This is the only parallelism in the system; within one simulation
//! everything stays single-threaded and deterministic.

use crate::simulation::FlowSimulation;

#[derive(Default)]
pub struct PortfolioLauncher {
    pub simulations: Vec<FlowSimulation>,
}

impl PortfolioLauncher {
    pub fn add_simulation(&mut self, simulation: FlowSimulation) {
        self.simulations.push(simulation);
    }

    /// Run every trial to completion on its own thread and hand the
    /// finished simulations back for inspection.
    pub fn run_simulations(self) -> Vec<FlowSimulation> {
        let mut threads = Vec::new();
        for mut simulation in self.simulations.into_iter() {
            threads.push(std::thread::spawn(move || {
                simulation.run();
                simulation
            }));
        }

        threads
            .into_iter()
            .map(|thread| thread.join().unwrap())
            .collect()
    }
}
