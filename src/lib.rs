pub mod advisor;
pub mod calculation;
mod card_count;
pub mod count;
mod error;
pub mod simulation;
pub mod strategy;

use serde_enum_str::{Deserialize_enum_str, Serialize_enum_str};
use strum_macros::EnumIter;

pub use advisor::{Recommendation, StrategyDecisionMaker};
pub use calculation::{EngineConfig, EvResult, MonteCarloEvEngine};
pub use card_count::CardCount;
pub use count::{BetRecommendation, CountTracker, ShoeStatus};
pub use error::{Error, Result};
pub use simulation::{hand::evaluate, shoe::ShoeState, Rank};

/// House rules. The dealer always stands on soft 17 and there is no surrender;
/// the rest is configurable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub number_of_decks: u8,
    /// Double after split.
    pub allow_das: bool,
    /// Split aces receive one card only unless this is set.
    pub hit_split_aces: bool,
}

impl Default for Rule {
    fn default() -> Self {
        Rule {
            number_of_decks: 8,
            allow_das: false,
            hit_split_aces: false,
        }
    }
}

/// A player action. `Display` and `FromStr` use the variant name, e.g. `"Split"`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    Serialize_enum_str,
    Deserialize_enum_str,
)]
pub enum Action {
    Hit,
    Stand,
    Double,
    Split,
}
