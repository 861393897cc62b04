use thiserror::Error;

use crate::simulation::Rank;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The shoe has no card of this rank left. The shoe is left unmodified.
    #[error("No more {rank} cards left in shoe")]
    Depletion { rank: Rank },
    #[error("Invalid rank token: {token:?}")]
    InvalidRank { token: String },
    #[error("Invalid hand: {reason}")]
    InvalidHand { reason: String },
    #[error("Shoe snapshot exhausted before the playout could finish")]
    SimulationExhausted,
    #[error("At least one trial per action is required")]
    NoTrials,
    #[error("Time budget ran out before any trial finished")]
    TimeBudgetExceeded,
}

impl Error {
    pub(crate) fn invalid_hand(reason: impl Into<String>) -> Self {
        Error::InvalidHand {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
