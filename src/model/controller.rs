use super::config::SimulationConfig;
use super::content::CSV_HEADER;
use super::error::SimError;
use super::sim::Simulation;
use itertools::Itertools;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::iter;
use tracing::{info, warn};

// Owns the simulation across calls.
// All randomness comes from the one rng here,
// so a seeded Controller is fully reproducible.
pub struct Controller {
    rng: StdRng,
    sim: Option<Simulation>,
    conf: Option<SimulationConfig>,
}

// Run up to `n` rounds; `keep_going` is checked
// after each round and stops the run before the next one
fn run_rounds<F>(sim: &mut Simulation, conf: &SimulationConfig, rng: &mut StdRng, n: usize, mut keep_going: F)
    where F: FnMut(&Simulation) -> bool {
    for _ in 0..n {
        sim.step(conf, rng);
        if !keep_going(sim) {
            info!(rounds_done = sim.rounds_done, "run stopped early");
            break;
        }
    }
}

impl Controller {
    pub fn new(seed: u64) -> Controller {
        Controller::with_rng(SeedableRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: StdRng) -> Controller {
        Controller {
            rng: rng,
            sim: None,
            conf: None,
        }
    }

    // Discard any existing run, build a new
    // population and run the configured rounds
    pub fn start(&mut self, conf: SimulationConfig) -> &Simulation {
        self.start_until(conf, |_| true)
    }

    pub fn start_until<F>(&mut self, conf: SimulationConfig, keep_going: F) -> &Simulation
        where F: FnMut(&Simulation) -> bool {
        info!(population = conf.population, rounds = conf.rounds, "starting simulation");
        self.sim = None;
        let mut sim = Simulation::new(&conf, &mut self.rng);
        run_rounds(&mut sim, &conf, &mut self.rng, conf.rounds, keep_going);
        self.conf = Some(conf);
        self.sim.get_or_insert(sim)
    }

    // Run more rounds with the same Agents and configuration
    pub fn extend(&mut self, n: usize) -> Result<&Simulation, SimError> {
        self.extend_until(n, |_| true)
    }

    pub fn extend_until<F>(&mut self, n: usize, keep_going: F) -> Result<&Simulation, SimError>
        where F: FnMut(&Simulation) -> bool {
        let sim = self.sim.as_mut().ok_or(SimError::NotInitialized)?;
        let conf = self.conf.as_ref().ok_or(SimError::MissingConfig)?;
        info!(rounds = n, rounds_done = sim.rounds_done, "extending simulation");
        run_rounds(sim, conf, &mut self.rng, n, keep_going);
        Ok(&*sim)
    }

    // Header plus one line per post
    pub fn export_rows(&self) -> Result<String, SimError> {
        match &self.sim {
            Some(sim) if !sim.posts.is_empty() => {
                let rows = sim.posts.iter().map(|p| p.to_csv_row());
                Ok(iter::once(CSV_HEADER.to_string()).chain(rows).join("\n"))
            },
            _ => {
                warn!("no posts to export");
                Err(SimError::EmptyExport)
            }
        }
    }

    pub fn state(&self) -> Option<&Simulation> {
        self.sim.as_ref()
    }

    pub fn config(&self) -> Option<&SimulationConfig> {
        self.conf.as_ref()
    }

    pub fn reset(&mut self) {
        self.sim = None;
        self.conf = None;
    }
}
