use crate::{
    simulation::{
        hand::{is_pair, HandValue},
        Rank,
    },
    Action, CardCount, Rule,
};

/// Decides how a hand continues inside a simulated trial, once the action being
/// evaluated has been applied. It only ever hits or stands.
pub trait ContinuationStrategy {
    /// Returns `Action::Hit` or `Action::Stand`.
    fn next(&self, hand: &HandValue, dealer_up_card: u8, snapshot: &CardCount) -> Action;

    /// Whether a two-card hand would be doubled if doubling were allowed. Only
    /// consulted for split hands when double after split is on.
    fn should_double(&self, hand: &HandValue, dealer_up_card: u8, snapshot: &CardCount) -> bool;
}

/// (decision, decision when doubling is not allowed)
type ChartEntry = (Action, Action);

const H: ChartEntry = (Action::Hit, Action::Hit);
const S: ChartEntry = (Action::Stand, Action::Stand);
const P: ChartEntry = (Action::Split, Action::Split);
const DH: ChartEntry = (Action::Double, Action::Hit);
const DS: ChartEntry = (Action::Double, Action::Stand);

/// Multi-deck basic strategy for a dealer standing on soft 17, without
/// surrender. Columns are indexed by dealer up card value minus one, so the
/// first column is the Ace.
#[derive(Debug, Clone)]
pub struct BasicStrategy {
    hard_charts: [[ChartEntry; 10]; 14],
    soft_charts: [[ChartEntry; 10]; 9],
    pair_charts: [[ChartEntry; 10]; 10],
}

impl BasicStrategy {
    pub fn new(rule: &Rule) -> BasicStrategy {
        let hard_charts = [
            [H, H, H, H, H, H, H, H, H, H], // 5
            [H, H, H, H, H, H, H, H, H, H],
            [H, H, H, H, H, H, H, H, H, H],
            [H, H, H, H, H, H, H, H, H, H],
            [H, H, DH, DH, DH, DH, H, H, H, H],
            [H, DH, DH, DH, DH, DH, DH, DH, DH, H],
            [H, DH, DH, DH, DH, DH, DH, DH, DH, DH],
            [H, H, H, S, S, S, H, H, H, H],
            [H, S, S, S, S, S, H, H, H, H],
            [H, S, S, S, S, S, H, H, H, H],
            [H, S, S, S, S, S, H, H, H, H],
            [H, S, S, S, S, S, H, H, H, H],
            [S, S, S, S, S, S, S, S, S, S], // 17
            [S, S, S, S, S, S, S, S, S, S], // 18, 18+
        ];
        let soft_charts = [
            [H, H, H, H, DH, DH, H, H, H, H], // Soft 13
            [H, H, H, H, DH, DH, H, H, H, H],
            [H, H, H, DH, DH, DH, H, H, H, H],
            [H, H, H, DH, DH, DH, H, H, H, H],
            [H, H, DH, DH, DH, DH, H, H, H, H],
            [H, S, DS, DS, DS, DS, S, S, H, H],
            [S, S, S, S, S, S, S, S, S, S],
            [S, S, S, S, S, S, S, S, S, S],
            [S, S, S, S, S, S, S, S, S, S], // Soft 21
        ];
        let pair_charts = if rule.allow_das {
            [
                [P, P, P, P, P, P, P, P, P, P], // Double Ace
                [H, P, P, P, P, P, P, H, H, H], // Double 2
                [H, P, P, P, P, P, P, H, H, H],
                [H, H, H, H, P, P, H, H, H, H],
                [H, DH, DH, DH, DH, DH, DH, DH, DH, H],
                [H, P, P, P, P, P, H, H, H, H],
                [H, P, P, P, P, P, P, H, H, H],
                [P, P, P, P, P, P, P, P, P, P],
                [S, P, P, P, P, P, S, P, P, S],
                [S, S, S, S, S, S, S, S, S, S], // Double 10
            ]
        } else {
            [
                [P, P, P, P, P, P, P, P, P, P], // Double Ace
                [H, H, H, P, P, P, P, H, H, H], // Double 2
                [H, H, H, P, P, P, P, H, H, H],
                [H, H, H, H, H, H, H, H, H, H],
                [H, DH, DH, DH, DH, DH, DH, DH, DH, H],
                [H, P, P, P, P, P, H, H, H, H],
                [H, P, P, P, P, P, P, H, H, H],
                [P, P, P, P, P, P, P, P, P, P],
                [S, P, P, P, P, P, S, P, P, S],
                [S, S, S, S, S, S, S, S, S, S], // Double 10
            ]
        };

        BasicStrategy {
            hard_charts,
            soft_charts,
            pair_charts,
        }
    }

    fn lookup(&self, hand: &HandValue, dealer_up_card: u8) -> ChartEntry {
        let col = (dealer_up_card - 1) as usize;
        let total = hand.total();
        if hand.is_soft() {
            if total <= 12 {
                return H;
            }
            return self.soft_charts[(total - 13) as usize][col];
        }

        let row = {
            if total <= 5 {
                0
            } else if total >= 18 {
                13
            } else {
                total - 5
            }
        } as usize;
        self.hard_charts[row][col]
    }

    /// Chart advice for the opening hand, including Double and Split, adjusted
    /// by the Hi-Lo index plays.
    pub fn chart_action(&self, cards: &[Rank], dealer_up_card: Rank, true_count: f64) -> Action {
        let up = dealer_up_card.blackjack_value();
        let col = (up - 1) as usize;
        let tc = true_count.round() as i32;
        let can_double = cards.len() == 2;

        if is_pair(cards) {
            let pair_value = cards[0].blackjack_value();
            if pair_value == 10 && (up == 5 || up == 6) && tc >= 5 {
                return Action::Split;
            }
            let entry = self.pair_charts[(pair_value - 1) as usize][col];
            return if can_double { entry.0 } else { entry.1 };
        }

        let hand = HandValue::from_ranks(cards);
        if !hand.is_soft() {
            if let Some(action) = index_play(hand.total(), up, tc) {
                return action;
            }
        }

        let entry = self.lookup(&hand, up);
        if can_double {
            entry.0
        } else {
            entry.1
        }
    }
}

/// Hi-Lo deviations from the hard chart.
fn index_play(total: u16, dealer_up_card: u8, tc: i32) -> Option<Action> {
    let stand_if = |stand: bool| {
        if stand {
            Action::Stand
        } else {
            Action::Hit
        }
    };
    match (total, dealer_up_card) {
        (16, 10) => Some(stand_if(tc >= 0)),
        (15, 10) => Some(stand_if(tc >= 4)),
        (12, 2) => Some(stand_if(tc >= 3)),
        (12, 3) => Some(stand_if(tc >= 2)),
        (13, 2) => Some(stand_if(tc > -1)),
        (13, 3) => Some(stand_if(tc > -2)),
        _ => None,
    }
}

impl Default for BasicStrategy {
    fn default() -> Self {
        BasicStrategy::new(&Rule::default())
    }
}

impl ContinuationStrategy for BasicStrategy {
    fn next(&self, hand: &HandValue, dealer_up_card: u8, _: &CardCount) -> Action {
        if hand.total() >= 21 {
            return Action::Stand;
        }
        self.lookup(hand, dealer_up_card).1
    }

    fn should_double(&self, hand: &HandValue, dealer_up_card: u8, _: &CardCount) -> bool {
        hand.number_of_cards() == 2 && self.lookup(hand, dealer_up_card).0 == Action::Double
    }
}
