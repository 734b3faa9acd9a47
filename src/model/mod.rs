mod sim;
mod util;
mod agent;
mod error;
mod series;
mod config;
mod content;
mod user_type;
mod engagement;
mod controller;

pub use self::sim::Simulation;
pub use self::error::SimError;
pub use self::controller::Controller;
pub use self::agent::{Agent, AgentId};
pub use self::user_type::{UserType, Profile};
pub use self::util::{Attributes, Reactions};
pub use self::engagement::Engagement;
pub use self::series::{Series, RoundSummary, TypeSummary, summarize};
pub use self::content::{Post, Attribute, Reaction, CSV_HEADER};
pub use self::config::{SimulationConfig, VibeConfig, FollowerConfig, AudienceConfig, TypeMix};
