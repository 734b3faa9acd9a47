use super::model::{self, Simulation, Controller, AgentId, RoundSummary, SimError};
use super::config::Config;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde_json::{json, Value};
use std::fs;
use std::io;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use redis::Commands;
use tracing::info;

static TOP_POSTS: usize = 10;

pub struct Recorder {
    history: Vec<Value>,
    sample: Vec<AgentId>,
}

impl Recorder {
    // Follows a fixed random sample of Agents
    pub fn new(sim: &Simulation, rng: &mut StdRng) -> Recorder {
        let sample_size = (0.2 * sim.agents.len() as f32) as usize;
        let sample: Vec<AgentId> = sim.agents
            .choose_multiple(rng, sample_size)
            .map(|a| a.id)
            .collect();

        Recorder {
            history: Vec::new(),
            sample: sample,
        }
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn record(&mut self, sim: &Simulation, summary: &RoundSummary) {
        let sample: Vec<Value> = self.sample.iter()
            .map(|id| &sim.agents[*id])
            .map(|a| {
                json!({
                    "id": a.id,
                    "type": a.user_type,
                    "strategy": a.strategy,
                    "vibe_propensity": a.vibe_propensity,
                    "followers": a.followers,
                })
            })
            .collect();

        // Top posts of the round
        let top_posts: Vec<Value> = sim.round_posts(summary.round).iter()
            .sorted_by(|a, b| b.reward.partial_cmp(&a.reward).unwrap_or(std::cmp::Ordering::Equal))
            .take(TOP_POSTS)
            .map(|p| json!(p))
            .collect();

        let value = json!({
            "round": summary.round,
            "summary": summary,
            "reference": sim.reference,
            "reward_ma": sim.series.reward_ma.last(),
            "bait_flags_ma": sim.series.bait_flags_ma.last(),
            "best": sim.best_post(),
            "sample": sample,
            "top_posts": top_posts,
        });
        self.history.push(value);
    }

    // Catch up on any rounds not yet recorded
    pub fn record_new(&mut self, sim: &Simulation) {
        for round in self.history.len()..sim.rounds_done {
            let summary = model::summarize(round, sim.round_posts(round));
            self.record(sim, &summary);
        }
    }

    pub fn save(&self, ctrl: &Controller, conf: &Config, conf_path: &Path) -> io::Result<PathBuf> {
        let now: DateTime<Utc> = Utc::now();
        let now_str = now.format("%Y.%m.%d.%H.%M.%S").to_string();
        let results = json!({
            "history": self.history,
            "meta": {
                "seed": conf.seed,
                "rounds": ctrl.state().map(|s| s.rounds_done),
                "population": conf.simulation.population,
            }
        })
        .to_string();

        let dir = format!("runs/{}", now_str);
        let path = Path::new(&dir);
        fs::create_dir_all(path)?;
        fs::write(path.join("output.json"), results)?;

        match ctrl.export_rows() {
            Ok(csv) => fs::write(path.join("posts.csv"), csv)?,
            Err(SimError::EmptyExport) => info!("no posts, skipping csv"),
            Err(err) => return Err(io::Error::new(io::ErrorKind::Other, err.to_string())),
        }

        let run_path = Path::new(&now_str);
        let latest_path = Path::new("runs/latest");
        if fs::symlink_metadata(latest_path).is_ok() {
            fs::remove_file(latest_path)?;
        }
        symlink(run_path, latest_path)?;

        fs::copy(conf_path, path.join("config.yaml"))?;
        info!(path = ?path, "wrote output");
        Ok(path.to_path_buf())
    }

    pub fn sync(&self, round: usize, redis_host: &str) -> redis::RedisResult<()> {
        match self.history.get(round) {
            None => (),
            Some(snapshot) => {
                let client = redis::Client::open(redis_host)?;
                let mut con = client.get_connection()?;

                let state_serialized = snapshot.to_string();
                let _: () = con.rpush("state:history", state_serialized)?;
                let _: () = con.set("state:step", format!("{:?}", round))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::model::SimulationConfig;

    #[test]
    fn test_record_new() {
        let mut conf = SimulationConfig::default();
        conf.population = 20;
        conf.rounds = 3;
        let mut ctrl = Controller::new(0);
        let mut rng: StdRng = rand::SeedableRng::seed_from_u64(0);

        let sim = ctrl.start(conf);
        let mut recorder = Recorder::new(sim, &mut rng);
        recorder.record_new(sim);
        assert_eq!(recorder.len(), 3);

        let sim = ctrl.extend(2).unwrap();
        recorder.record_new(sim);
        assert_eq!(recorder.len(), 5);
        assert_eq!(recorder.history[4]["round"], 4);
        assert_eq!(recorder.history[4]["sample"].as_array().map(|s| s.len()), Some(4));
        assert!(recorder.history[4]["top_posts"].as_array().map_or(false, |p| p.len() == 10));
    }
}
