use std::ops::Index;

use rand::Rng;
use serde::Serialize;

/// The numbers of each card value (from 1 to 10 inclusive, Ace stored as 1) left
/// in a shoe.
///
/// This is the only state a trial needs: it is `Copy`, so a trial takes its own
/// snapshot by value and draws from it without touching the real shoe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct CardCount {
    counts: [u16; 10],
    total: u16,
}

impl CardCount {
    pub fn new(counts: &[u16; 10]) -> CardCount {
        CardCount {
            counts: *counts,
            total: counts.iter().sum(),
        }
    }

    pub fn with_number_of_decks(number_of_decks: u8) -> CardCount {
        let mut counts = [number_of_decks as u16 * 4; 10];
        counts[9] = number_of_decks as u16 * 16;
        Self::new(&counts)
    }

    /// Remove a card of given card value. Returns false and leaves the counts
    /// untouched if there is no such card left.
    pub fn remove_card(&mut self, card_value: u8) -> bool {
        let index = (card_value - 1) as usize;
        if self.counts[index] == 0 {
            return false;
        }
        self.counts[index] -= 1;
        self.total -= 1;
        true
    }

    pub fn get_total(&self) -> u16 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Draws one card weighted by the remaining counts and removes it. Returns
    /// None if nothing is left.
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<u8> {
        if self.total == 0 {
            return None;
        }

        let mut pick = rng.gen_range(0..self.total);
        for (index, &count) in self.counts.iter().enumerate() {
            if pick < count {
                self.counts[index] -= 1;
                self.total -= 1;
                return Some(index as u8 + 1);
            }
            pick -= count;
        }

        None
    }
}

impl Index<u8> for CardCount {
    type Output = u16;
    fn index(&self, index: u8) -> &Self::Output {
        &self.counts[(index - 1) as usize]
    }
}
