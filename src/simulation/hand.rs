use serde::Serialize;

use super::Rank;

/// Running value of a hand, kept as the hard total with every Ace counted as 1.
/// One Ace is promoted to 11 when that does not bust the hand.
///
/// Totals saturate instead of overflowing, so an absurdly long card list is
/// still reported as bust.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HandValue {
    hard_total: u16,
    has_ace: bool,
    number_of_cards: u16,
}

impl HandValue {
    pub fn new() -> HandValue {
        Default::default()
    }

    pub fn from_values(values: &[u8]) -> HandValue {
        let mut hand = HandValue::new();
        for &value in values {
            hand.add_card(value);
        }
        hand
    }

    pub fn from_ranks(cards: &[Rank]) -> HandValue {
        let mut hand = HandValue::new();
        for card in cards {
            hand.add_card(card.blackjack_value());
        }
        hand
    }

    /// Adds a card of blackjack value in [1, 10]; 1 stands for Ace.
    pub fn add_card(&mut self, card_value: u8) {
        self.hard_total = self.hard_total.saturating_add(card_value as u16);
        self.has_ace |= card_value == 1;
        self.number_of_cards = self.number_of_cards.saturating_add(1);
    }

    pub fn total(&self) -> u16 {
        if self.is_soft() {
            self.hard_total + 10
        } else {
            self.hard_total
        }
    }

    pub fn is_soft(&self) -> bool {
        self.has_ace && self.hard_total <= 11
    }

    pub fn bust(&self) -> bool {
        self.hard_total > 21
    }

    pub fn number_of_cards(&self) -> u16 {
        self.number_of_cards
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct HandEvaluation {
    pub total: u16,
    pub is_soft: bool,
    pub is_pair: bool,
}

/// Evaluates a list of table cards.
pub fn evaluate(cards: &[Rank]) -> HandEvaluation {
    let value = HandValue::from_ranks(cards);
    HandEvaluation {
        total: value.total(),
        is_soft: value.is_soft(),
        is_pair: is_pair(cards),
    }
}

/// Exactly two cards with the same label. Ten and King are not a pair.
pub fn is_pair(cards: &[Rank]) -> bool {
    cards.len() == 2 && cards[0] == cards[1]
}
