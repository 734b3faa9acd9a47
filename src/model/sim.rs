use super::agent::{self, Agent};
use super::config::SimulationConfig;
use super::content::Post;
use super::engagement;
use super::series::{self, RoundSummary, Series};
use super::util::{self, Reactions};
use rand::rngs::StdRng;
use serde::{Serialize, Deserialize};
use tracing::debug;

// Weight on the previous reference value
static REFERENCE_ALPHA: f32 = 0.98;

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct Simulation {
    // Agents in population order,
    // which is also their processing order
    pub agents: Vec<Agent>,

    // Every post so far, in round then agent order
    pub posts: Vec<Post>,

    // Slow-moving EWMA of reward, used to scale
    // learning and follower gains. Updated after
    // every post, so agent order matters.
    pub reference: f32,

    pub rounds_done: usize,
    pub series: Series,
}

impl Simulation {
    pub fn new(conf: &SimulationConfig, rng: &mut StdRng) -> Simulation {
        Simulation {
            agents: agent::build_population(conf, rng),
            posts: Vec::new(),
            reference: 1.,
            rounds_done: 0,
            series: Series::new(conf.ma_window),
        }
    }

    pub fn step(&mut self, conf: &SimulationConfig, rng: &mut StdRng) -> RoundSummary {
        let round = self.rounds_done;
        let start = self.posts.len();
        let base_weights = Reactions::from_row_slice(&conf.reaction_weights);

        let mut n_penalized = 0;
        for agent in &mut self.agents {
            let (post, penalized) = run_agent(agent, round, &mut self.reference, &base_weights, conf, rng);
            if penalized {
                n_penalized += 1;
            }
            self.posts.push(post);
        }

        let summary = series::summarize(round, &self.posts[start..]);
        self.series.push(&summary);
        self.rounds_done += 1;

        debug!(
            round = round,
            reward = summary.reward,
            bait_flags = summary.bait_flags,
            penalized = n_penalized,
            reference = self.reference,
            "round complete");
        summary
    }

    pub fn round_posts(&self, round: usize) -> &[Post] {
        let n = self.agents.len();
        let start = (round * n).min(self.posts.len());
        let end = (start + n).min(self.posts.len());
        &self.posts[start..end]
    }

    pub fn best_post(&self) -> Option<&Post> {
        self.series.best.as_ref()
    }
}

// One Agent's full pipeline for a round:
// post, audience, reward, learning, followers.
// Returns the post and whether the bait penalty kicked in.
fn run_agent(agent: &mut Agent, round: usize, reference: &mut f32, base_weights: &Reactions, conf: &SimulationConfig, rng: &mut StdRng) -> (Post, bool) {
    let generated = agent.produce(rng);
    let vibe = agent.decide_vibe(rng);
    let effective = engagement::effective_attributes(&generated, vibe, conf);

    let reach = engagement::reach_budget(&effective, agent.followers, vibe, conf, rng);
    let eng = engagement::simulate_impressions(&effective, vibe, agent.followers, reach, conf, rng);

    let utility = agent.user_type.profile().utility;
    let reward = engagement::reward(&eng, agent.reaction_pref, base_weights, &utility);

    let post = Post {
        round: round,
        agent_id: agent.id,
        user_type: agent.user_type,
        vibe: vibe,
        followers: agent.followers,
        attributes: generated,
        reactions: eng.reactions,
        bait_flags: eng.bait_flags,
        comments: eng.comments,
        reward: reward,
    };

    *reference = util::ewma(reward.max(1.), *reference, REFERENCE_ALPHA);
    agent.learn(&generated, vibe, reward, *reference, conf.learning_rate);
    agent.update_followers(&eng, reward, *reference, conf.bait_ratio_threshold, &conf.followers);

    (post, eng.penalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::config::TypeMix;
    use super::super::user_type::UserType;
    use rand::SeedableRng;

    fn small_conf() -> SimulationConfig {
        let mut conf = SimulationConfig::default();
        conf.population = 10;
        conf.reach_min = 10;
        conf.reach_max = 40;
        conf
    }

    #[test]
    fn test_step() {
        let mut rng: StdRng = SeedableRng::seed_from_u64(0);
        let conf = small_conf();
        let mut sim = Simulation::new(&conf, &mut rng);
        let summary = sim.step(&conf, &mut rng);
        assert_eq!(summary.n_posts, 10);
        assert_eq!(sim.rounds_done, 1);
        assert_eq!(sim.posts.len(), 10);
        assert!(sim.reference >= 1.);

        sim.step(&conf, &mut rng);
        let second = sim.round_posts(1);
        assert_eq!(second.len(), 10);
        assert!(second.iter().all(|p| p.round == 1));
        for (i, p) in second.iter().enumerate() {
            assert_eq!(p.agent_id, i);
        }
    }

    #[test]
    fn test_bounds_hold_over_many_rounds() {
        let mut rng: StdRng = SeedableRng::seed_from_u64(1);
        let conf = small_conf();
        let mut sim = Simulation::new(&conf, &mut rng);
        for _ in 0..500 {
            sim.step(&conf, &mut rng);
            for a in &sim.agents {
                assert!(a.strategy.iter().all(|v| *v >= 0. && *v <= 1.));
                assert!(a.vibe_propensity >= 0. && a.vibe_propensity <= 1.);
                assert!(a.reaction_pref >= 0. && a.reaction_pref <= 1.);
            }
        }
        for p in &sim.posts {
            let e = engagement::effective_attributes(&p.attributes, p.vibe, &conf);
            let probs = engagement::base_reaction_probs(&e);
            assert!(probs.iter().all(|v| *v >= 0. && *v <= 1.));
            assert!(probs.sum() <= 1. + 1e-5);
            let p_flag = engagement::bait_flag_prob(&e, p.vibe, &conf);
            let p_comment = engagement::comment_prob(&e, p.vibe, &conf);
            assert!(p_flag >= 0. && p_flag <= 1.);
            assert!(p_comment >= 0. && p_comment <= 1.);
        }
    }

    #[test]
    fn test_summaries_match_log() {
        let mut rng: StdRng = SeedableRng::seed_from_u64(2);
        let conf = small_conf();
        let mut sim = Simulation::new(&conf, &mut rng);
        for _ in 0..12 {
            sim.step(&conf, &mut rng);
        }
        let rebuilt = Series::from_posts(&sim.posts, conf.ma_window);
        assert_eq!(rebuilt, sim.series);
    }

    #[test]
    fn test_bait_penalty_disabled() {
        let mut rng: StdRng = SeedableRng::seed_from_u64(3);
        let mut conf = small_conf();
        conf.platform_boosts = [0.; 6];
        conf.bait_ratio_threshold = 1.;
        let base_weights = Reactions::from_row_slice(&conf.reaction_weights);
        let mut sim = Simulation::new(&conf, &mut rng);
        let mut reference = sim.reference;
        let mut penalized = 0;
        for round in 0..30 {
            for agent in &mut sim.agents {
                let (_, p) = run_agent(agent, round, &mut reference, &base_weights, &conf, &mut rng);
                if p {
                    penalized += 1;
                }
            }
        }

        // Only possible when early flags
        // outrun reactions and comments
        assert!(penalized < 30);
    }

    #[test]
    fn test_normal_agents_vibe() {
        let mut rng: StdRng = SeedableRng::seed_from_u64(4);
        let mut conf = small_conf();
        conf.population = 200;
        conf.vibe_base_rate = 0.4;
        conf.mix = TypeMix {
            normal: 100.,
            joker: 0.,
            troll: 0.,
            intellectual: 0.,
            journalist: 0.,
        };
        let mut sim = Simulation::new(&conf, &mut rng);
        assert!(sim.agents.iter().all(|a| a.user_type == UserType::Normal));

        for _ in 0..20 {
            sim.step(&conf, &mut rng);
        }
        assert!(sim.posts.iter().any(|p| p.vibe));

        // Tone use tracks the learned propensity
        let propensity = util::mean(
            &sim.agents.iter().map(|a| a.vibe_propensity).collect::<Vec<f32>>());
        let summary = sim.step(&conf, &mut rng);
        assert!((summary.vibe_rate - propensity).abs() < 0.15);
    }
}
