use strum::IntoEnumIterator;
use tracing::info;

use super::{Rank, CARDS_PER_DECK, CARDS_PER_RANK_PER_DECK, NUMBER_OF_RANKS};
use crate::{CardCount, Error, Result};

/// Represents the shoe on the real table: what is left in it, and every card
/// dealt from it since the last shuffle, in table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoeState {
    number_of_decks: u8,
    counts: [u16; NUMBER_OF_RANKS],
    dealt_history: Vec<Rank>,
}

impl ShoeState {
    /// Creates a full shoe.
    pub fn new(number_of_decks: u8) -> ShoeState {
        ShoeState {
            number_of_decks,
            counts: [number_of_decks as u16 * CARDS_PER_RANK_PER_DECK; NUMBER_OF_RANKS],
            dealt_history: Vec::with_capacity(number_of_decks as usize * CARDS_PER_DECK as usize),
        }
    }

    /// Records a card dealt on the table. Fails without touching the shoe if no
    /// card of this rank is left.
    pub fn deal(&mut self, rank: Rank) -> Result<()> {
        let count = &mut self.counts[rank.index()];
        if *count == 0 {
            return Err(Error::Depletion { rank });
        }
        *count -= 1;
        self.dealt_history.push(rank);
        Ok(())
    }

    /// Deals several cards at once. Either every card is dealt, in order, or
    /// the shoe is left untouched and the first rank that runs short is
    /// reported.
    pub fn deal_all(&mut self, ranks: &[Rank]) -> Result<()> {
        let mut needed = [0u16; NUMBER_OF_RANKS];
        for &rank in ranks {
            needed[rank.index()] += 1;
            if needed[rank.index()] > self.counts[rank.index()] {
                return Err(Error::Depletion { rank });
            }
        }
        for &rank in ranks {
            self.counts[rank.index()] -= 1;
            self.dealt_history.push(rank);
        }
        Ok(())
    }

    /// Parses a rank token such as `"10"`, `"K"` or `"a"` and deals it.
    pub fn deal_token(&mut self, token: &str) -> Result<Rank> {
        let rank: Rank = token.parse()?;
        self.deal(rank)?;
        Ok(rank)
    }

    /// Returns every card to the shoe (i.e., a shuffle), possibly with a new
    /// number of decks.
    pub fn reset(&mut self, number_of_decks: u8) {
        info!(
            number_of_decks,
            dealt = self.dealt_history.len(),
            "shoe reset"
        );
        *self = ShoeState::new(number_of_decks);
    }

    pub fn number_of_decks(&self) -> u8 {
        self.number_of_decks
    }

    pub fn initial_count(&self) -> u16 {
        self.number_of_decks as u16 * CARDS_PER_DECK
    }

    pub fn remaining_count(&self) -> u16 {
        self.counts.iter().sum()
    }

    pub fn remaining_of(&self, rank: Rank) -> u16 {
        self.counts[rank.index()]
    }

    pub fn dealt_history(&self) -> &[Rank] {
        &self.dealt_history
    }

    /// Remaining count per rank label, in table label order.
    pub fn rank_counts(&self) -> impl Iterator<Item = (Rank, u16)> + '_ {
        Rank::iter().map(move |rank| (rank, self.counts[rank.index()]))
    }

    /// Collapses the remaining cards into blackjack value buckets for sampling.
    pub fn snapshot(&self) -> CardCount {
        let mut counts = [0u16; 10];
        for rank in Rank::iter() {
            counts[(rank.blackjack_value() - 1) as usize] += self.counts[rank.index()];
        }
        CardCount::new(&counts)
    }
}

impl Default for ShoeState {
    fn default() -> Self {
        ShoeState::new(8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn is_conserved(shoe: &ShoeState) -> bool {
        shoe.remaining_count() as usize + shoe.dealt_history().len()
            == shoe.initial_count() as usize
    }

    #[test]
    fn new_shoe_is_full() {
        let shoe = ShoeState::new(8);
        assert_eq!(shoe.remaining_count(), 416);
        assert!(shoe.dealt_history().is_empty());
        for (_, count) in shoe.rank_counts() {
            assert_eq!(count, 32);
        }
        assert_eq!(shoe.snapshot(), CardCount::with_number_of_decks(8));
    }

    #[test]
    fn deal_records_history_in_order() {
        let mut shoe = ShoeState::new(1);
        shoe.deal(Rank::King).unwrap();
        shoe.deal(Rank::Two).unwrap();
        assert_eq!(shoe.deal_token("a").unwrap(), Rank::Ace);
        assert_eq!(shoe.dealt_history(), &[Rank::King, Rank::Two, Rank::Ace]);
        assert_eq!(shoe.remaining_of(Rank::King), 3);
        assert_eq!(shoe.snapshot()[10], 15);
        assert_eq!(shoe.snapshot()[1], 3);
        assert!(is_conserved(&shoe));
    }

    #[test]
    fn depleted_rank_leaves_shoe_unchanged() {
        let mut shoe = ShoeState::new(1);
        for _ in 0..4 {
            shoe.deal(Rank::Ace).unwrap();
        }
        shoe.deal(Rank::Seven).unwrap();
        let before = shoe.clone();

        assert_eq!(
            shoe.deal(Rank::Ace),
            Err(Error::Depletion { rank: Rank::Ace })
        );
        assert_eq!(shoe, before);
    }

    #[test]
    fn invalid_token_leaves_shoe_unchanged() {
        let mut shoe = ShoeState::new(2);
        shoe.deal(Rank::Five).unwrap();
        let before = shoe.clone();
        assert!(matches!(
            shoe.deal_token("Z"),
            Err(Error::InvalidRank { .. })
        ));
        assert_eq!(shoe, before);
    }

    #[test]
    fn batch_deal_is_all_or_nothing() {
        let mut shoe = ShoeState::new(1);
        shoe.deal_all(&[Rank::King, Rank::Seven]).unwrap();
        assert_eq!(shoe.dealt_history(), &[Rank::King, Rank::Seven]);

        for _ in 0..2 {
            shoe.deal(Rank::Ace).unwrap();
        }
        let before = shoe.clone();
        assert_eq!(
            shoe.deal_all(&[Rank::Two, Rank::Ace, Rank::Ace, Rank::Ace]),
            Err(Error::Depletion { rank: Rank::Ace })
        );
        assert_eq!(shoe, before);
    }

    #[test]
    fn ten_valued_labels_deplete_separately() {
        let mut shoe = ShoeState::new(1);
        for _ in 0..4 {
            shoe.deal(Rank::King).unwrap();
        }
        assert!(shoe.deal(Rank::King).is_err());
        assert!(shoe.deal(Rank::Queen).is_ok());
        assert_eq!(shoe.snapshot()[10], 11);
    }

    #[test]
    fn reset_restores_full_composition() {
        let mut shoe = ShoeState::new(8);
        shoe.deal(Rank::Three).unwrap();
        shoe.deal(Rank::Ten).unwrap();
        shoe.reset(6);
        assert_eq!(shoe, ShoeState::new(6));
        assert_eq!(shoe.remaining_count(), 312);
    }

    proptest! {
        #[test]
        fn cards_are_conserved(ops in prop::collection::vec(0usize..15, 0..600)) {
            let ranks: Vec<Rank> = Rank::iter().collect();
            let mut shoe = ShoeState::new(2);
            for op in ops {
                if op < NUMBER_OF_RANKS {
                    let _ = shoe.deal(ranks[op]);
                } else if op == NUMBER_OF_RANKS {
                    shoe.reset(2);
                }
                prop_assert!(is_conserved(&shoe));
                prop_assert_eq!(shoe.snapshot().get_total(), shoe.remaining_count());
            }
        }
    }
}
