use feedsim::config::{self, Config};
use feedsim::control::{Command, Commander};
use feedsim::model::Controller;
use feedsim::rec::Recorder;
use pbr::ProgressBar;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::error::Error;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

static CONFIG_PATH: &str = "config.yaml";

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let conf_path = Path::new(CONFIG_PATH);
    let conf = config::load_config(conf_path)?;
    let seed = conf.seed.unwrap_or_default();
    let mut ctrl = Controller::new(seed);

    // Separate rng for picking which
    // Agents to record, so recording
    // doesn't change the run itself
    let mut rng: StdRng = SeedableRng::seed_from_u64(seed);

    if conf.command {
        run_commands(&conf, &mut ctrl, &mut rng)?;
    } else {
        run_batch(&conf, conf_path, &mut ctrl, &mut rng)?;
    }
    Ok(())
}

fn run_batch(conf: &Config, conf_path: &Path, ctrl: &mut Controller, rng: &mut StdRng) -> Result<(), Box<dyn Error>> {
    let mut pb = ProgressBar::new(conf.simulation.rounds as u64);
    let sim = ctrl.start_until(conf.simulation.clone(), |_| {
        pb.inc();
        true
    });
    pb.finish();

    if let Some(best) = sim.best_post() {
        info!(round = best.round, agent = best.agent_id, reward = best.reward, "best post");
    }

    if conf.debug {
        let mut recorder = Recorder::new(sim, rng);
        recorder.record_new(sim);
        recorder.save(ctrl, conf, conf_path)?;
    }
    Ok(())
}

fn run_commands(conf: &Config, ctrl: &mut Controller, rng: &mut StdRng) -> Result<(), Box<dyn Error>> {
    let mut commander = Commander::new(&conf.redis_host)?;
    commander.set_loading()?;
    commander.reset()?;
    commander.set_ready()?;

    let mut recorder: Option<Recorder> = None;
    loop {
        let command = commander.wait_for_command()?;
        commander.set_running()?;
        match command {
            Command::Start => {
                commander.clear_state()?;
                let sim = ctrl.start(conf.simulation.clone());
                let mut rec = Recorder::new(sim, rng);
                rec.record_new(sim);
                for round in 0..rec.len() {
                    rec.sync(round, &conf.redis_host)?;
                }
                recorder = Some(rec);
            },
            Command::Extend(n) => {
                match (ctrl.extend(n), recorder.as_mut()) {
                    (Ok(sim), Some(rec)) => {
                        let synced = rec.len();
                        rec.record_new(sim);
                        for round in synced..rec.len() {
                            rec.sync(round, &conf.redis_host)?;
                        }
                    },
                    (Ok(_), None) => warn!("extended without a recorder"),
                    (Err(err), _) => warn!(error = %err, "could not extend"),
                }
            },
            Command::Export => {
                match ctrl.export_rows() {
                    Ok(csv) => commander.publish_csv(&csv)?,
                    Err(err) => warn!(error = %err, "could not export"),
                }
            },
            Command::Reset => {
                ctrl.reset();
                recorder = None;
                commander.reset()?;
            }
        }
        commander.set_ready()?;
    }
}
