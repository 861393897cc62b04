use serde::Serialize;

use crate::simulation::{shoe::ShoeState, Rank, CARDS_PER_DECK};

/// Decks remaining never goes below this, so the true count stays bounded near
/// the end of the shoe.
pub const MIN_DECKS_REMAINING: f64 = 0.25;

/// Hi-Lo counts derived from a shoe. Nothing is cached: every value is
/// recomputed from the shoe it borrows.
#[derive(Debug, Clone, Copy)]
pub struct CountTracker<'a> {
    shoe: &'a ShoeState,
}

impl<'a> CountTracker<'a> {
    pub fn new(shoe: &'a ShoeState) -> Self {
        Self { shoe }
    }

    pub fn running_count(&self) -> i32 {
        self.shoe.dealt_history().iter().map(|rank| rank.hi_lo()).sum()
    }

    pub fn decks_remaining(&self) -> f64 {
        (self.shoe.remaining_count() as f64 / CARDS_PER_DECK as f64).max(MIN_DECKS_REMAINING)
    }

    pub fn true_count(&self) -> f64 {
        self.running_count() as f64 / self.decks_remaining()
    }

    /// Fraction of the shoe already dealt.
    pub fn penetration(&self) -> f64 {
        let initial = self.shoe.initial_count();
        if initial == 0 {
            return 0.0;
        }
        self.shoe.dealt_history().len() as f64 / initial as f64
    }

    pub fn betting_recommendation(&self) -> BetRecommendation {
        BetRecommendation::from_true_count(self.true_count())
    }

    pub fn status(&self) -> ShoeStatus {
        ShoeStatus {
            running_count: self.running_count(),
            true_count: self.true_count(),
            remaining_cards: self.shoe.remaining_count(),
            decks_remaining: self.decks_remaining(),
            penetration: self.penetration(),
            card_counts: self.shoe.rank_counts().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShoeStatus {
    pub running_count: i32,
    pub true_count: f64,
    pub remaining_cards: u16,
    pub decks_remaining: f64,
    pub penetration: f64,
    pub card_counts: Vec<(Rank, u16)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BetRecommendation {
    /// True count of 3 or more.
    Increase,
    /// True count of 1 or more.
    Normal,
    Minimum,
}

impl BetRecommendation {
    pub fn from_true_count(true_count: f64) -> Self {
        if true_count >= 3.0 {
            BetRecommendation::Increase
        } else if true_count >= 1.0 {
            BetRecommendation::Normal
        } else {
            BetRecommendation::Minimum
        }
    }
}

impl std::fmt::Display for BetRecommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            BetRecommendation::Increase => "High count - increase bet",
            BetRecommendation::Normal => "Positive count - normal bet",
            BetRecommendation::Minimum => "Neutral or negative count - minimum bet",
        };
        write!(f, "{}", text)
    }
}
