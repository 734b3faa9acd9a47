use super::model::SimulationConfig;
use rand::Rng;
use serde::Deserialize;
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not open config: {0}")]
    Io(#[from] std::io::Error),

    #[error("error while reading yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid value for {0}: {1:?}")]
    Env(&'static str, String),
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "UPPERCASE")]
pub struct Config {
    #[serde(default)]
    pub simulation: SimulationConfig,

    // Overrides the simulation's round count
    #[serde(default)]
    pub steps: Option<usize>,

    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub command: bool,

    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default = "default_redis_host")]
    pub redis_host: String,
}

fn default_redis_host() -> String {
    "redis://127.0.0.1/1".to_string()
}

fn env_parse<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(val) => val.parse().map(Some).map_err(|_| ConfigError::Env(var, val)),
        Err(_) => Ok(None),
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut conf: Config = serde_yaml::from_reader(reader)?;
    apply_env(&mut conf)?;
    apply_steps(&mut conf);

    // No seed given: pick one so
    // the run can still be reproduced
    if conf.seed.is_none() {
        let mut rng = rand::thread_rng();
        conf.seed = Some(rng.gen());
    }

    info!(?conf, "loaded config");
    Ok(conf)
}

fn apply_env(conf: &mut Config) -> Result<(), ConfigError> {
    if let Some(steps) = env_parse("STEPS")? {
        conf.steps = Some(steps);
    }
    if let Some(seed) = env_parse("SEED")? {
        conf.seed = Some(seed);
    }
    if let Ok(debug) = env::var("DEBUG") {
        conf.debug = debug == "1";
    }
    if let Ok(command) = env::var("COMMAND") {
        conf.command = command == "1";
    }
    Ok(())
}

fn apply_steps(conf: &mut Config) {
    if let Some(steps) = conf.steps {
        conf.simulation.rounds = steps;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml() {
        let yaml = "
SIMULATION:
  POPULATION: 30
  ROUNDS: 12
  PLATFORM_BOOSTS: [0.1, 0, 0, -0.2, 0, 0]
  AUDIENCE:
    HOMOPHILY: 0.5
  MIX:
    NORMAL: 100
    JOKER: 0
    TROLL: 0
    INTELLECTUAL: 0
    JOURNALIST: 0
SEED: 7
";
        let conf: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(conf.seed, Some(7));
        assert!(!conf.command);
        assert_eq!(conf.simulation.population, 30);
        assert_eq!(conf.simulation.rounds, 12);
        assert_eq!(conf.simulation.platform_boosts[3], -0.2);
        assert_eq!(conf.simulation.audience.homophily, 0.5);

        // Unspecified fields keep their defaults
        let defaults = SimulationConfig::default();
        assert_eq!(conf.simulation.audience.polar_coupling, defaults.audience.polar_coupling);
        assert_eq!(conf.simulation.vibe, defaults.vibe);
        assert_eq!(conf.simulation.mix.joker, 0.);
    }

    #[test]
    fn test_steps_override_rounds() {
        let yaml = "
SIMULATION:
  ROUNDS: 12
STEPS: 40
";
        let mut conf: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(conf.steps, Some(40));
        apply_steps(&mut conf);
        assert_eq!(conf.simulation.rounds, 40);

        let mut conf: Config = serde_yaml::from_str("SEED: 1").unwrap();
        apply_steps(&mut conf);
        assert_eq!(conf.simulation.rounds, SimulationConfig::default().rounds);
    }
}
