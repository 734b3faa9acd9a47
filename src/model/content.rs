use super::agent::AgentId;
use super::user_type::UserType;
use super::util::Attributes;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

// Indices into `Attributes`
#[derive(Display, EnumIter, PartialEq, Debug, Clone, Copy)]
pub enum Attribute {
    Humor,
    Insight,
    Controversy,
    Bait,
    News,
    Dunk,
}

impl Attribute {
    pub fn idx(self) -> usize {
        self as usize
    }
}

// Indices into `Reactions` and reaction counts
#[derive(Display, EnumIter, PartialEq, Debug, Clone, Copy)]
pub enum Reaction {
    StrongAgree,
    Agree,
    NotSure,
    Disagree,
    StrongDisagree,
}

impl Reaction {
    pub fn idx(self) -> usize {
        self as usize
    }
}

pub type ReactionCounts = [u32; 5];

pub static CSV_HEADER: &str = "round,agent_id,user_type,vibe,followers,\
humor,insight,controversy,bait,news,dunk,\
strong_agree,agree,not_sure,disagree,strong_disagree,\
bait_flags,comments,reward";

// What one Agent posted in one round
// and how the audience responded.
// `attributes` are the generated values,
// before vibe and platform boosts.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct Post {
    pub round: usize,
    pub agent_id: AgentId,
    pub user_type: UserType,
    pub vibe: bool,
    pub followers: u32,
    pub attributes: Attributes,
    pub reactions: ReactionCounts,
    pub bait_flags: u32,
    pub comments: u32,
    pub reward: f32,
}

impl Post {
    pub fn to_csv_row(&self) -> String {
        let head = vec![
            self.round.to_string(),
            self.agent_id.to_string(),
            format!("\"{}\"", self.user_type),
            self.vibe.to_string(),
            self.followers.to_string(),
        ];
        let attrs = self.attributes.iter().map(|v| v.to_string());
        let reactions = self.reactions.iter().map(|v| v.to_string());
        let tail = vec![
            self.bait_flags.to_string(),
            self.comments.to_string(),
            self.reward.to_string(),
        ];
        head.into_iter()
            .chain(attrs)
            .chain(reactions)
            .chain(tail)
            .join(",")
    }

    pub fn n_reactions(&self) -> u32 {
        self.reactions.iter().sum()
    }
}
