use super::config::{SimulationConfig, FollowerConfig};
use super::content::Reaction;
use super::engagement::Engagement;
use super::user_type::{UserType, MixDistribution};
use super::util::{self, Attributes};
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Serialize, Deserialize};

pub type AgentId = usize;

// Noise for initial strategies, tone propensity
// and generated content, respectively
static STRATEGY_SIGMA: f32 = 0.08;
static VIBE_SIGMA: f32 = 0.15;
static PRODUCE_SIGMA: f32 = 0.12;

// Content is mostly strategy, partly type
static STRATEGY_WEIGHT: f32 = 0.85;

// Per-round reversion towards the type baseline
static STRATEGY_REVERSION: f32 = 0.03;
static VIBE_REVERSION: f32 = 0.05;

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct Agent {
    pub id: AgentId,
    pub user_type: UserType,

    // Current posting tendency, one per attribute
    pub strategy: Attributes,

    // Learned probability of using the vibe tag
    pub vibe_propensity: f32,

    // How much the Agent cares about reactions
    // as opposed to comments. Fixed.
    pub reaction_pref: f32,

    pub followers: u32,
}

// Build the initial population,
// Agent ids are their index
pub fn build_population(conf: &SimulationConfig, rng: &mut StdRng) -> Vec<Agent> {
    let mix = MixDistribution::new(&conf.mix);
    (0..conf.population)
        .map(|i| {
            let typ = mix.sample(rng);
            Agent::new(i, typ, conf, rng)
        })
        .collect()
}

impl Agent {
    pub fn new(id: AgentId, user_type: UserType, conf: &SimulationConfig, rng: &mut StdRng) -> Agent {
        let profile = user_type.profile();
        let strategy = profile.bias.map(|b| util::normal_p_mu(b, STRATEGY_SIGMA, rng));
        let vibe_propensity = util::normal_p_mu(
            user_type.initial_vibe_rate(conf.vibe_base_rate), VIBE_SIGMA, rng);
        let reaction_pref = rng.gen_range(0.5f32, 0.9f32);

        let mean = conf.followers.initial_mean;
        let followers = util::normal(mean, mean * 0.5, rng).round().max(0.) as u32;

        Agent {
            id: id,
            user_type: user_type,
            strategy: strategy,
            vibe_propensity: vibe_propensity,
            reaction_pref: reaction_pref,
            followers: followers,
        }
    }

    // Agent produces something around their
    // current strategy, pulled a bit towards their type
    pub fn produce(&self, rng: &mut StdRng) -> Attributes {
        let bias = self.user_type.profile().bias;
        self.strategy.zip_map(&bias, |s, b| {
            let mu = STRATEGY_WEIGHT * s + (1. - STRATEGY_WEIGHT) * b;
            util::normal_p_mu(mu, PRODUCE_SIGMA, rng)
        })
    }

    pub fn decide_vibe(&self, rng: &mut StdRng) -> bool {
        if !self.user_type.can_vibe() {
            return false;
        }
        rng.gen::<f32>() < self.vibe_propensity
    }

    // Move strategy towards (or away from) what was just
    // posted depending on how it did relative to the reference scale
    pub fn learn(&mut self, posted: &Attributes, vibe: bool, reward: f32, reference: f32, learning_rate: f32) {
        let adjustment = learning_signal(reward, reference);
        let step = learning_rate * adjustment;
        let profile = self.user_type.profile();

        self.strategy = self.strategy.zip_map(posted, |s, p| util::clamp_p(s + step * (p - s)));
        self.strategy = self.strategy.zip_map(&profile.bias, |s, b| {
            util::clamp_p((1. - STRATEGY_REVERSION) * s + STRATEGY_REVERSION * b)
        });

        if self.user_type.can_vibe() {
            let target = if vibe { 1. } else { 0. };
            let p = util::clamp_p(self.vibe_propensity + step * (target - self.vibe_propensity));
            self.vibe_propensity = util::clamp_p(
                (1. - VIBE_REVERSION) * p + VIBE_REVERSION * profile.vibe_base);
        }
    }

    // Gain followers for well-received posts,
    // lose them for heavily flagged ones
    pub fn update_followers(&mut self, engagement: &Engagement, reward: f32, reference: f32, bait_ratio_threshold: f32, conf: &FollowerConfig) {
        let bait_ratio = engagement.bait_ratio();
        let gain = if reward > conf.gain_threshold * reference {
            let strong_agree = engagement.reactions[Reaction::StrongAgree.idx()] as f32;
            let agree = engagement.reactions[Reaction::Agree.idx()] as f32;
            conf.gain_rate * (2. * strong_agree + agree + 0.2 * engagement.comments as f32)
        } else {
            0.
        };
        let loss = conf.loss_rate * f32::max(0., bait_ratio - bait_ratio_threshold) * 10.;
        let followers = self.followers as i64 + (gain - loss).round() as i64;
        self.followers = followers.max(0) as u32;
    }
}

// In -1 to 1; positive when the reward
// beats half the reference scale
pub fn learning_signal(reward: f32, reference: f32) -> f32 {
    let reference = reference.max(1.);
    ((reward - 0.5 * reference) / (0.75 * reference)).tanh()
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::config::TypeMix;
    use rand::SeedableRng;

    fn engagement(reactions: [u32; 5], bait_flags: u32, comments: u32) -> Engagement {
        Engagement {
            reactions: reactions,
            bait_flags: bait_flags,
            comments: comments,
            penalized: false,
        }
    }

    #[test]
    fn test_build_population() {
        let mut rng: StdRng = SeedableRng::seed_from_u64(0);
        let mut conf = SimulationConfig::default();
        conf.population = 200;
        let agents = build_population(&conf, &mut rng);
        assert_eq!(agents.len(), 200);
        for (i, a) in agents.iter().enumerate() {
            assert_eq!(a.id, i);
            assert!(a.strategy.iter().all(|v| *v >= 0. && *v <= 1.));
            assert!(a.vibe_propensity >= 0. && a.vibe_propensity <= 1.);
            assert!(a.reaction_pref >= 0.5 && a.reaction_pref <= 0.9);
        }

        conf.population = 0;
        assert!(build_population(&conf, &mut rng).is_empty());
    }

    #[test]
    fn test_normal_only_mix() {
        let mut rng: StdRng = SeedableRng::seed_from_u64(1);
        let mut conf = SimulationConfig::default();
        conf.mix = TypeMix {
            normal: 100.,
            joker: 0.,
            troll: 0.,
            intellectual: 0.,
            journalist: 0.,
        };
        let agents = build_population(&conf, &mut rng);
        assert!(agents.iter().all(|a| a.user_type == UserType::Normal));
    }

    #[test]
    fn test_trolls_never_vibe() {
        let mut rng: StdRng = SeedableRng::seed_from_u64(2);
        let conf = SimulationConfig::default();
        let mut troll = Agent::new(0, UserType::Troll, &conf, &mut rng);
        troll.vibe_propensity = 1.;
        for _ in 0..100 {
            assert!(!troll.decide_vibe(&mut rng));
        }

        // Learning leaves their propensity alone
        let posted = troll.produce(&mut rng);
        troll.learn(&posted, false, 10., 1., 0.5);
        assert_eq!(troll.vibe_propensity, 1.);
    }

    #[test]
    fn test_learning_signal() {
        assert!(learning_signal(10., 1.) > 0.9);
        assert_eq!(learning_signal(0.5, 1.), 0.);
        assert!(learning_signal(0., 1.) < 0.);
        assert!(learning_signal(0., 1.) >= -1.);
    }

    #[test]
    fn test_learn_moves_towards_rewarded_content() {
        let mut rng: StdRng = SeedableRng::seed_from_u64(3);
        let conf = SimulationConfig::default();
        let mut agent = Agent::new(0, UserType::Intellectual, &conf, &mut rng);
        agent.strategy = Attributes::repeat(0.5);
        let posted = Attributes::repeat(1.);
        agent.learn(&posted, true, 100., 1., 0.5);
        assert!(agent.strategy.iter().all(|v| *v > 0.5 && *v <= 1.));

        // Poor reward pushes away
        agent.strategy = Attributes::repeat(0.5);
        agent.learn(&posted, true, 0., 1., 0.5);
        let bias = UserType::Intellectual.profile().bias;
        for i in 0..6 {
            let reverted = 0.97 * 0.5 + 0.03 * bias[i];
            assert!(agent.strategy[i] <= reverted + 1e-6);
        }
    }

    #[test]
    fn test_followers_never_negative() {
        let mut rng: StdRng = SeedableRng::seed_from_u64(4);
        let conf = SimulationConfig::default();
        let mut agent = Agent::new(0, UserType::Troll, &conf, &mut rng);
        agent.followers = 3;

        // Nothing but bait flags
        let eng = engagement([0, 0, 0, 0, 0], 50, 0);
        agent.update_followers(&eng, 0., 1., 0.1, &conf.followers);
        assert_eq!(agent.followers, 0);
    }

    #[test]
    fn test_followers_bait_loss() {
        let mut rng: StdRng = SeedableRng::seed_from_u64(6);
        let conf = SimulationConfig::default();
        let mut agent = Agent::new(0, UserType::Troll, &conf, &mut rng);
        agent.followers = 100;

        // Ratio 4 / 10 = 0.4, so 2.0 * 0.05 * 10 = 1 lost
        let eng = engagement([2, 2, 2, 0, 0], 4, 4);
        agent.update_followers(&eng, 0., 1., 0.35, &conf.followers);
        assert_eq!(agent.followers, 99);

        // Under the threshold: nothing lost
        let eng = engagement([2, 2, 2, 0, 0], 3, 4);
        agent.update_followers(&eng, 0., 1., 0.35, &conf.followers);
        assert_eq!(agent.followers, 99);

        // 10 flags, 10 interactions: 2.0 * 0.65 * 10 = 13 lost
        let eng = engagement([5, 0, 0, 0, 0], 10, 5);
        agent.update_followers(&eng, 0., 1., 0.35, &conf.followers);
        assert_eq!(agent.followers, 86);
    }

    #[test]
    fn test_followers_gain() {
        let mut rng: StdRng = SeedableRng::seed_from_u64(5);
        let conf = SimulationConfig::default();
        let mut agent = Agent::new(0, UserType::Normal, &conf, &mut rng);
        agent.followers = 10;

        let eng = engagement([40, 20, 0, 0, 0], 0, 10);
        agent.update_followers(&eng, 50., 1., 0.35, &conf.followers);

        // 0.05 * (80 + 20 + 2)
        assert_eq!(agent.followers, 15);

        // Reward under the threshold: no gain
        agent.update_followers(&eng, 0.5, 1., 0.35, &conf.followers);
        assert_eq!(agent.followers, 15);
    }
}
