use super::user_type::UserType;
use serde::{Serialize, Deserialize};

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[serde(rename_all = "UPPERCASE", default)]
pub struct SimulationConfig {
    pub population: usize,
    pub rounds: usize,

    // How strongly engagement pulls
    // an Agent's strategy towards what they posted
    pub learning_rate: f32,

    // Once the ratio of bait flags to interactions
    // on a post exceeds this, the audience
    // penalizes the rest of that post's impressions
    pub bait_ratio_threshold: f32,

    // Multiplier on reaction and comment
    // probabilities once the penalty kicks in
    pub bait_penalty: f32,

    // Bounds for the base number of impressions
    pub reach_min: u32,
    pub reach_max: u32,

    // How much follower count expands reach
    pub follower_reach_factor: f32,

    // Base utility of each reaction level,
    // strong agree to strong disagree
    pub reaction_weights: [f32; 5],

    // Platform boost per attribute, -1 to 1
    pub platform_boosts: [f32; 6],

    // Base probability that
    // Normal agents adopt the vibe tag
    pub vibe_base_rate: f32,

    // Window for rolling averages
    pub ma_window: usize,

    // See below
    pub vibe: VibeConfig,
    pub followers: FollowerConfig,
    pub audience: AudienceConfig,
    pub mix: TypeMix,
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[serde(rename_all = "UPPERCASE", default)]
pub struct VibeConfig {
    pub humor_penalty: f32,
    pub controversy_penalty: f32,
    pub insight_boost: f32,
    pub comment_boost: f32,
    pub reach_boost: f32,

    // Multiplier (<1) on the bait flag
    // probability of vibe-tagged posts
    pub flag_protection: f32,
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[serde(rename_all = "UPPERCASE", default)]
pub struct FollowerConfig {
    // Reward must exceed this multiple
    // of the reference scale to gain followers
    pub gain_threshold: f32,
    pub gain_rate: f32,
    pub loss_rate: f32,
    pub initial_mean: f32,
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[serde(rename_all = "UPPERCASE", default)]
pub struct AudienceConfig {
    // Size of the non-follower audience,
    // sets the local/global impression split
    pub global_audience: f32,

    // How much local (follower) impressions
    // skew towards agreement
    pub homophily: f32,

    // Past this many impressions a post
    // is mostly seen by non-followers
    pub virality_threshold: u32,
    pub local_floor: f32,

    // How much one extreme reaction
    // feeds the opposite extreme
    pub polar_coupling: f32,
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[serde(rename_all = "UPPERCASE", default)]
pub struct TypeMix {
    pub normal: f32,
    pub joker: f32,
    pub troll: f32,
    pub intellectual: f32,
    pub journalist: f32,
}

impl TypeMix {
    pub fn weight(&self, typ: UserType) -> f32 {
        match typ {
            UserType::Normal => self.normal,
            UserType::Joker => self.joker,
            UserType::Troll => self.troll,
            UserType::Intellectual => self.intellectual,
            UserType::Journalist => self.journalist,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> SimulationConfig {
        SimulationConfig {
            population: 100,
            rounds: 50,
            learning_rate: 0.1,
            bait_ratio_threshold: 0.35,
            bait_penalty: 0.5,
            reach_min: 20,
            reach_max: 120,
            follower_reach_factor: 0.25,
            reaction_weights: [1.0, 0.6, 0.1, 0.2, 0.3],
            platform_boosts: [0.; 6],
            vibe_base_rate: 0.2,
            ma_window: 5,
            vibe: VibeConfig::default(),
            followers: FollowerConfig::default(),
            audience: AudienceConfig::default(),
            mix: TypeMix::default(),
        }
    }
}

impl Default for VibeConfig {
    fn default() -> VibeConfig {
        VibeConfig {
            humor_penalty: 0.2,
            controversy_penalty: 0.3,
            insight_boost: 0.2,
            comment_boost: 0.15,
            reach_boost: 0.1,
            flag_protection: 0.6,
        }
    }
}

impl Default for FollowerConfig {
    fn default() -> FollowerConfig {
        FollowerConfig {
            gain_threshold: 1.0,
            gain_rate: 0.05,
            loss_rate: 2.0,
            initial_mean: 100.,
        }
    }
}

impl Default for AudienceConfig {
    fn default() -> AudienceConfig {
        AudienceConfig {
            global_audience: 500.,
            homophily: 0.3,
            virality_threshold: 150,
            local_floor: 0.1,
            polar_coupling: 0.1,
        }
    }
}

impl Default for TypeMix {
    fn default() -> TypeMix {
        TypeMix {
            normal: 60.,
            joker: 10.,
            troll: 10.,
            intellectual: 10.,
            journalist: 10.,
        }
    }
}
