use super::config::TypeMix;
use super::util::{Attributes, Reactions};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

#[derive(Display, EnumIter, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, Clone, Copy)]
pub enum UserType {
    Normal,
    Joker,
    Troll,
    Intellectual,
    Journalist,
}

// Fixed, per-type constants
#[derive(Debug, Clone, Copy)]
pub struct Profile {
    // Baseline posting tendency per attribute.
    // Strategies are initialized around this
    // and slowly revert back to it.
    pub bias: Attributes,

    // How much this type values each reaction level
    pub utility: Reactions,

    // Tone adoption rate the propensity reverts to
    pub vibe_base: f32,
}

// Normal users revert towards this
// rather than the configured base rate
static NORMAL_VIBE_REVERSION: f32 = 0.05;

impl UserType {
    pub fn profile(self) -> Profile {
        // Attribute order: humor, insight, controversy, bait, news, dunk
        // Reaction order: strong agree, agree, not sure, disagree, strong disagree
        match self {
            UserType::Normal => Profile {
                bias: Attributes::new(0.35, 0.3, 0.2, 0.15, 0.25, 0.15),
                utility: Reactions::new(1.0, 0.8, 0.2, 0.1, 0.05),
                vibe_base: NORMAL_VIBE_REVERSION,
            },
            UserType::Joker => Profile {
                bias: Attributes::new(0.8, 0.15, 0.25, 0.3, 0.1, 0.35),
                utility: Reactions::new(1.0, 0.9, 0.3, 0.3, 0.2),
                vibe_base: 0.,
            },
            UserType::Troll => Profile {
                bias: Attributes::new(0.3, 0.05, 0.8, 0.7, 0.1, 0.75),
                utility: Reactions::new(0.3, 0.2, 0.5, 0.9, 1.2),
                vibe_base: 0.,
            },
            UserType::Intellectual => Profile {
                bias: Attributes::new(0.2, 0.85, 0.3, 0.05, 0.4, 0.15),
                utility: Reactions::new(1.2, 1.0, 0.4, 0.2, 0.0),
                vibe_base: 0.6,
            },
            UserType::Journalist => Profile {
                bias: Attributes::new(0.15, 0.5, 0.35, 0.15, 0.85, 0.1),
                utility: Reactions::new(1.0, 1.0, 0.5, 0.3, 0.1),
                vibe_base: 0.4,
            },
        }
    }

    // Jokers and Trolls never post with the vibe tag
    pub fn can_vibe(self) -> bool {
        match self {
            UserType::Joker | UserType::Troll => false,
            _ => true,
        }
    }

    // Starting tone adoption rate; Normal users
    // start from the configured base rate
    pub fn initial_vibe_rate(self, base_rate: f32) -> f32 {
        match self {
            UserType::Normal => base_rate,
            _ => self.profile().vibe_base,
        }
    }
}

// Weighted choice over user types.
// Weights need not sum to anything.
pub struct MixDistribution {
    types: Vec<UserType>,
    index: Option<WeightedIndex<f32>>,
}

impl MixDistribution {
    pub fn new(mix: &TypeMix) -> MixDistribution {
        let types: Vec<UserType> = UserType::iter().collect();
        let weights: Vec<f32> = types.iter().map(|t| mix.weight(*t).max(0.)).collect();

        // No valid weights, e.g. all zero:
        // everyone is Normal
        let index = WeightedIndex::new(&weights).ok();
        MixDistribution { types, index }
    }
}

impl Distribution<UserType> for MixDistribution {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> UserType {
        match &self.index {
            Some(index) => self.types[index.sample(rng)],
            None => UserType::Normal,
        }
    }
}
