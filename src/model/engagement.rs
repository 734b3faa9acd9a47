use super::config::{SimulationConfig, AudienceConfig};
use super::content::{Attribute, Reaction, ReactionCounts};
use super::util::{self, Attributes, Reactions, clamp_p};
use rand::rngs::StdRng;
use rand::Rng;
use tracing::trace;

static MIN_REACH: f32 = 5.;

// Weights of each attribute towards reach,
// in attribute order
static REACH_WEIGHTS: [f32; 6] = [0.8, 0.6, 0.4, 0.8, 0.5, 0.3];

// What the audience did with a single post
#[derive(Debug, Clone, PartialEq)]
pub struct Engagement {
    pub reactions: ReactionCounts,
    pub bait_flags: u32,
    pub comments: u32,

    // Whether the bait penalty kicked in
    // at some point during the post's impressions
    pub penalized: bool,
}

impl Engagement {
    pub fn new() -> Engagement {
        Engagement {
            reactions: [0; 5],
            bait_flags: 0,
            comments: 0,
            penalized: false,
        }
    }

    pub fn n_reactions(&self) -> u32 {
        self.reactions.iter().sum()
    }

    // Reactions and comments; flags
    // are measured against these
    pub fn interactions(&self) -> u32 {
        self.n_reactions() + self.comments
    }

    pub fn reaction_ratio(&self, reaction: Reaction) -> f32 {
        self.reactions[reaction.idx()] as f32 / self.n_reactions().max(1) as f32
    }

    pub fn bait_ratio(&self) -> f32 {
        self.bait_flags as f32 / self.interactions().max(1) as f32
    }

    // Switch on the bait penalty once the flag ratio
    // passes the threshold. True only when it just switched on.
    pub fn escalate(&mut self, threshold: f32) -> bool {
        if !self.penalized && self.bait_ratio() > threshold {
            self.penalized = true;
            true
        } else {
            false
        }
    }

    fn counts(&self) -> Reactions {
        Reactions::from_iterator(self.reactions.iter().map(|c| *c as f32))
    }
}

fn attr(attrs: &Attributes, a: Attribute) -> f32 {
    attrs[a.idx()]
}

// Apply the vibe tag and platform boosts.
// These drive the audience but are never logged.
pub fn effective_attributes(generated: &Attributes, vibe: bool, conf: &SimulationConfig) -> Attributes {
    let mut attrs = *generated;
    if vibe {
        let humor = Attribute::Humor.idx();
        let controversy = Attribute::Controversy.idx();
        let insight = Attribute::Insight.idx();
        attrs[humor] = clamp_p(attrs[humor] * (1. - conf.vibe.humor_penalty));
        attrs[controversy] = clamp_p(attrs[controversy] * (1. - conf.vibe.controversy_penalty));
        attrs[insight] = clamp_p(attrs[insight] * (1. + conf.vibe.insight_boost));
    }
    let boosts = Attributes::from_row_slice(&conf.platform_boosts);
    attrs.zip_map(&boosts, |a, b| clamp_p(a * (1. + b)))
}

// How many impressions a post gets
pub fn reach_budget(effective: &Attributes, followers: u32, vibe: bool, conf: &SimulationConfig, rng: &mut StdRng) -> u32 {
    let hi = conf.reach_max.max(conf.reach_min);
    let base = rng.gen_range(conf.reach_min, hi + 1) as f32;
    let score = effective.dot(&Attributes::from_row_slice(&REACH_WEIGHTS));
    let mut reach = base * (0.3 + 2. * score);
    reach *= 1. + conf.follower_reach_factor * (1. + followers as f32).log10();
    if vibe {
        reach *= 1. + conf.vibe.reach_boost;
    }
    reach.floor().max(MIN_REACH) as u32
}

pub fn base_reaction_probs(e: &Attributes) -> Reactions {
    let humor = attr(e, Attribute::Humor);
    let insight = attr(e, Attribute::Insight);
    let controversy = attr(e, Attribute::Controversy);
    let bait = attr(e, Attribute::Bait);
    let news = attr(e, Attribute::News);
    let dunk = attr(e, Attribute::Dunk);

    let pos = 0.45 * insight + 0.35 * humor + 0.35 * dunk;
    let neg = 0.35 * controversy + 0.3 * bait + 0.15 * dunk;
    let amb = 0.3 * controversy + 0.15 * news;

    let probs = Reactions::new(
        clamp_p(0.03 + 0.55 * pos),
        clamp_p(0.06 + 0.5 * (0.4 * humor + 0.5 * insight + 0.3 * news)),
        clamp_p(0.02 + 0.35 * amb - 0.05 * insight),
        clamp_p(0.02 + 0.45 * controversy + 0.05 * bait - 0.05 * insight),
        clamp_p(0.01 + 0.3 * neg));
    util::renormalize(&probs)
}

pub fn bait_flag_prob(e: &Attributes, vibe: bool, conf: &SimulationConfig) -> f32 {
    let p = clamp_p(0.01
        + 0.1 * attr(e, Attribute::Bait)
        + 0.08 * attr(e, Attribute::Controversy)
        + 0.06 * attr(e, Attribute::Dunk));
    if vibe {
        clamp_p(p * conf.vibe.flag_protection)
    } else {
        p
    }
}

pub fn comment_prob(e: &Attributes, vibe: bool, conf: &SimulationConfig) -> f32 {
    let hi = 0.4 * attr(e, Attribute::Controversy)
        + 0.35 * attr(e, Attribute::Bait)
        + 0.3 * attr(e, Attribute::Dunk);
    let med = (attr(e, Attribute::Humor) + attr(e, Attribute::Insight) + attr(e, Attribute::News)) / 3. * 0.18;
    let p = clamp_p(0.03 + hi + med);
    if vibe {
        clamp_p(p * (1. + conf.vibe.comment_boost))
    } else {
        p
    }
}

// Probability that the nth impression
// goes to a follower rather than the wider audience
pub fn local_share(followers: u32, impression: u32, conf: &AudienceConfig) -> f32 {
    let f = followers as f32;
    let share = clamp_p(f / (f + conf.global_audience).max(1.));
    if impression > conf.virality_threshold {
        share.min(f32::max(conf.local_floor, 0.3 * share))
    } else {
        share
    }
}

// Reaction probabilities for a single impression,
// given the post's base probabilities and the reactions so far
pub fn impression_probs(base: &Reactions, local: bool, so_far: &Engagement, conf: &SimulationConfig) -> Reactions {
    let mut probs = *base;
    if local {
        let h = conf.audience.homophily;
        let skew = Reactions::new(1. + h, 1. + 0.6 * h, 1., 1. - 0.7 * h, 1. - h);
        probs = util::renormalize(&probs.component_mul(&skew).map(clamp_p));
    }

    let polar = conf.audience.polar_coupling;
    let sa = Reaction::StrongAgree.idx();
    let sd = Reaction::StrongDisagree.idx();
    probs[sd] += polar * so_far.reaction_ratio(Reaction::StrongAgree);
    probs[sa] += polar * so_far.reaction_ratio(Reaction::StrongDisagree);
    probs = util::renormalize(&probs.map(clamp_p));

    if so_far.penalized {
        probs *= conf.bait_penalty;
    }
    probs
}

// Pick at most one reaction; the
// leftover probability is no reaction
fn sample_reaction(probs: &Reactions, rng: &mut StdRng) -> Option<usize> {
    let roll: f32 = rng.gen();
    let mut acc = 0f32;
    for (i, p) in probs.iter().enumerate() {
        acc += *p;
        if roll < acc {
            return Some(i);
        }
    }
    None
}

// Run every impression of a post
pub fn simulate_impressions(effective: &Attributes, vibe: bool, followers: u32, reach: u32, conf: &SimulationConfig, rng: &mut StdRng) -> Engagement {
    let base = base_reaction_probs(effective);
    let p_flag = bait_flag_prob(effective, vibe, conf);
    let p_comment = comment_prob(effective, vibe, conf);

    let mut eng = Engagement::new();
    for i in 0..reach {
        let local = rng.gen::<f32>() < local_share(followers, i, &conf.audience);
        let probs = impression_probs(&base, local, &eng, conf);
        let p_comment = if eng.penalized {
            p_comment * conf.bait_penalty
        } else {
            p_comment
        };

        if rng.gen::<f32>() < p_flag {
            eng.bait_flags += 1;
        }
        if let Some(r) = sample_reaction(&probs, rng) {
            eng.reactions[r] += 1;
        }
        if rng.gen::<f32>() < p_comment {
            eng.comments += 1;
        }

        // Penalty sticks for the rest of this post
        if eng.escalate(conf.bait_ratio_threshold) {
            trace!(impression = i, flags = eng.bait_flags, "bait penalty triggered");
        }
    }
    eng
}

// Blend of globally-weighted and type-weighted reactions,
// then blended with comments by the Agent's preference
pub fn reward(eng: &Engagement, reaction_pref: f32, base_weights: &Reactions, utility: &Reactions) -> f32 {
    let counts = eng.counts();
    let reaction_reward = 0.5 * base_weights.dot(&counts) + 0.5 * utility.dot(&counts);
    reaction_pref * reaction_reward + (1. - reaction_pref) * eng.comments as f32
}
