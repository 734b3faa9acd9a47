use super::content::Post;
use super::user_type::UserType;
use super::util::{self, Attributes};
use fnv::FnvHashMap;
use itertools::Itertools;
use serde::{Serialize, Deserialize};
use strum::IntoEnumIterator;

// Means over one type's posts in a round
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct TypeSummary {
    pub n_posts: usize,
    pub attributes: Attributes,
    pub followers: f32,
    pub vibe_rate: f32,
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct RoundSummary {
    pub round: usize,
    pub n_posts: usize,
    pub reward: f32,
    pub bait_flags: f32,
    pub attributes: Attributes,
    pub followers: f32,
    pub total_followers: u64,
    pub vibe_rate: f32,
    pub by_type: FnvHashMap<UserType, TypeSummary>,

    // Highest reward post of the round,
    // earliest wins ties
    pub best: Option<Post>,
}

fn summarize_type(posts: &[&Post]) -> TypeSummary {
    let n = posts.len().max(1) as f32;
    let attributes = posts.iter()
        .fold(Attributes::zeros(), |acc, p| acc + p.attributes) / n;
    let followers = posts.iter().map(|p| p.followers as f32).sum::<f32>() / n;
    let vibe_rate = posts.iter().filter(|p| p.vibe).count() as f32 / n;
    TypeSummary {
        n_posts: posts.len(),
        attributes: attributes,
        followers: followers,
        vibe_rate: vibe_rate,
    }
}

// Reduce one round's posts.
// Uses only the post records so it can be
// recomputed from an exported log.
pub fn summarize(round: usize, posts: &[Post]) -> RoundSummary {
    let all: Vec<&Post> = posts.iter().collect();
    let overall = summarize_type(&all);

    let rewards: Vec<f32> = posts.iter().map(|p| p.reward).collect();
    let flags: Vec<f32> = posts.iter().map(|p| p.bait_flags as f32).collect();

    let by_type = UserType::iter()
        .map(|t| {
            let of_type: Vec<&Post> = posts.iter().filter(|p| p.user_type == t).collect();
            (t, summarize_type(&of_type))
        })
        .collect();

    let best = posts.iter().fold(None, |best: Option<&Post>, p| match best {
        Some(b) if b.reward >= p.reward => Some(b),
        _ => Some(p),
    });

    RoundSummary {
        round: round,
        n_posts: posts.len(),
        reward: util::mean(&rewards),
        bait_flags: util::mean(&flags),
        attributes: overall.attributes,
        followers: overall.followers,
        total_followers: posts.iter().map(|p| p.followers as u64).sum(),
        vibe_rate: overall.vibe_rate,
        by_type: by_type,
        best: best.cloned(),
    }
}

// Per-round series over a whole run
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct Series {
    pub reward: Vec<f32>,
    pub reward_ma: Vec<f32>,
    pub bait_flags: Vec<f32>,
    pub bait_flags_ma: Vec<f32>,
    pub attributes: Vec<Attributes>,
    pub followers: Vec<f32>,
    pub total_followers: Vec<u64>,
    pub vibe_rate: Vec<f32>,
    pub type_attributes: FnvHashMap<UserType, Vec<Attributes>>,
    pub type_followers: FnvHashMap<UserType, Vec<f32>>,
    pub type_vibe_rate: FnvHashMap<UserType, Vec<f32>>,

    // Highest reward post across the run,
    // earliest wins ties
    pub best: Option<Post>,

    window: usize,
}

fn per_type<T>() -> FnvHashMap<UserType, Vec<T>> {
    UserType::iter().map(|t| (t, Vec::new())).collect()
}

fn rolling_mean(vals: &[f32], window: usize) -> f32 {
    let start = vals.len().saturating_sub(window);
    util::mean(&vals[start..])
}

impl Series {
    pub fn new(window: usize) -> Series {
        Series {
            reward: Vec::new(),
            reward_ma: Vec::new(),
            bait_flags: Vec::new(),
            bait_flags_ma: Vec::new(),
            attributes: Vec::new(),
            followers: Vec::new(),
            total_followers: Vec::new(),
            vibe_rate: Vec::new(),
            type_attributes: per_type(),
            type_followers: per_type(),
            type_vibe_rate: per_type(),
            best: None,
            window: window.max(1),
        }
    }

    // Rebuild from a post log,
    // which must be ordered by round
    pub fn from_posts(posts: &[Post], window: usize) -> Series {
        let mut series = Series::new(window);
        for (round, group) in &posts.iter().group_by(|p| p.round) {
            let round_posts: Vec<Post> = group.cloned().collect();
            series.push(&summarize(round, &round_posts));
        }
        series
    }

    pub fn len(&self) -> usize {
        self.reward.len()
    }

    pub fn push(&mut self, summary: &RoundSummary) {
        self.reward.push(summary.reward);
        self.reward_ma.push(rolling_mean(&self.reward, self.window));
        self.bait_flags.push(summary.bait_flags);
        self.bait_flags_ma.push(rolling_mean(&self.bait_flags, self.window));
        self.attributes.push(summary.attributes);
        self.followers.push(summary.followers);
        self.total_followers.push(summary.total_followers);
        self.vibe_rate.push(summary.vibe_rate);

        for (typ, ts) in summary.by_type.iter() {
            self.type_attributes.entry(*typ).or_insert_with(Vec::new).push(ts.attributes);
            self.type_followers.entry(*typ).or_insert_with(Vec::new).push(ts.followers);
            self.type_vibe_rate.entry(*typ).or_insert_with(Vec::new).push(ts.vibe_rate);
        }

        if let Some(post) = &summary.best {
            let better = match &self.best {
                Some(best) => post.reward > best.reward,
                None => true,
            };
            if better {
                self.best = Some(post.clone());
            }
        }
    }
}
