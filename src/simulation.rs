pub mod dealer;
pub mod hand;
pub mod shoe;

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;

use crate::Error;

pub const NUMBER_OF_RANKS: usize = 13;
pub const CARDS_PER_DECK: u16 = 52;
pub const CARDS_PER_RANK_PER_DECK: u16 = 4;

/// Blackjack value of each rank, in declaration order. Ace is stored as 1.
static RANK_TO_BLACKJACK_VALUE: [u8; NUMBER_OF_RANKS] = [2, 3, 4, 5, 6, 7, 8, 9, 10, 10, 10, 10, 1];

/// A card label as it appears on the table. Ten, Jack, Queen and King share the
/// blackjack value 10 but are still different labels, so a Ten and a King are
/// not a pair.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Serialize, Deserialize,
)]
pub enum Rank {
    #[serde(rename = "2")]
    Two = 0,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "6")]
    Six,
    #[serde(rename = "7")]
    Seven,
    #[serde(rename = "8")]
    Eight,
    #[serde(rename = "9")]
    Nine,
    #[serde(rename = "10")]
    Ten,
    #[serde(rename = "J")]
    Jack,
    #[serde(rename = "Q")]
    Queen,
    #[serde(rename = "K")]
    King,
    #[serde(rename = "A")]
    Ace,
}

impl Rank {
    pub fn index(self) -> usize {
        self as usize
    }

    /// Value in [1, 10]. Ace is 1 here; hand evaluation promotes it to 11.
    pub fn blackjack_value(self) -> u8 {
        RANK_TO_BLACKJACK_VALUE[self.index()]
    }

    /// Hi-Lo tag of this rank.
    pub fn hi_lo(self) -> i32 {
        match self.blackjack_value() {
            2..=6 => 1,
            7..=9 => 0,
            _ => -1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
        }
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Rank {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rank = match s.trim().to_ascii_uppercase().as_str() {
            "2" => Rank::Two,
            "3" => Rank::Three,
            "4" => Rank::Four,
            "5" => Rank::Five,
            "6" => Rank::Six,
            "7" => Rank::Seven,
            "8" => Rank::Eight,
            "9" => Rank::Nine,
            "10" | "T" => Rank::Ten,
            "J" => Rank::Jack,
            "Q" => Rank::Queen,
            "K" => Rank::King,
            "A" => Rank::Ace,
            _ => {
                return Err(Error::InvalidRank {
                    token: s.to_string(),
                })
            }
        };
        Ok(rank)
    }
}

/// Parses a whitespace or comma separated list of rank tokens, e.g. `"10 6"` or `"A,K"`.
pub fn parse_ranks(tokens: &str) -> Result<Vec<Rank>, Error> {
    tokens
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(Rank::from_str)
        .collect()
}
