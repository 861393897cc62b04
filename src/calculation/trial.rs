use rand::Rng;

use crate::{
    simulation::{dealer::playout, hand::HandValue},
    strategy::ContinuationStrategy,
    Action, CardCount, Error, Result, Rule,
};

/// Everything a single trial needs besides its snapshot and random source.
pub(super) struct TrialSetup<'a, S> {
    pub rule: &'a Rule,
    pub strategy: &'a S,
    pub hand: HandValue,
    /// Blackjack value of the paired card, if the hand is a pair.
    pub pair_value: Option<u8>,
    pub dealer_up_card: u8,
}

impl<'a, S: ContinuationStrategy> TrialSetup<'a, S> {
    /// Plays one trial of `action` against `snapshot` and returns the profit in
    /// units of the original bet.
    pub fn play<R: Rng + ?Sized>(
        &self,
        action: Action,
        snapshot: &mut CardCount,
        rng: &mut R,
    ) -> Result<i32> {
        match action {
            Action::Stand => {
                let dealer_total = self.dealer_plays(snapshot, rng)?;
                Ok(settle(self.hand.total(), dealer_total))
            }
            Action::Hit => {
                let mut hand = self.hand;
                hand.add_card(draw(snapshot, rng)?);
                if hand.bust() {
                    return Ok(-1);
                }
                self.continue_playing(&mut hand, snapshot, rng)?;
                if hand.bust() {
                    return Ok(-1);
                }
                let dealer_total = self.dealer_plays(snapshot, rng)?;
                Ok(settle(hand.total(), dealer_total))
            }
            Action::Double => {
                let mut hand = self.hand;
                hand.add_card(draw(snapshot, rng)?);
                if hand.bust() {
                    return Ok(-2);
                }
                let dealer_total = self.dealer_plays(snapshot, rng)?;
                Ok(2 * settle(hand.total(), dealer_total))
            }
            Action::Split => self.play_split(snapshot, rng),
        }
    }

    fn play_split<R: Rng + ?Sized>(&self, snapshot: &mut CardCount, rng: &mut R) -> Result<i32> {
        let pair_value = self
            .pair_value
            .ok_or_else(|| Error::invalid_hand("only a pair can be split"))?;

        // Both hands draw from the same snapshot, first hand first, so the
        // second hand and the dealer see what the first hand took.
        let mut groups = [(HandValue::new(), 1); 2];
        for (hand, wager) in groups.iter_mut() {
            hand.add_card(pair_value);
            hand.add_card(draw(snapshot, rng)?);

            if pair_value == 1 && !self.rule.hit_split_aces {
                continue;
            }
            if self.rule.allow_das
                && self
                    .strategy
                    .should_double(hand, self.dealer_up_card, snapshot)
            {
                hand.add_card(draw(snapshot, rng)?);
                *wager = 2;
                continue;
            }
            self.continue_playing(hand, snapshot, rng)?;
        }

        if groups.iter().all(|(hand, _)| hand.bust()) {
            return Ok(groups.iter().map(|(_, wager)| -wager).sum());
        }

        let dealer_total = self.dealer_plays(snapshot, rng)?;
        Ok(groups
            .iter()
            .map(|(hand, wager)| wager * settle(hand.total(), dealer_total))
            .sum())
    }

    /// Hits until the strategy stands or the hand busts.
    fn continue_playing<R: Rng + ?Sized>(
        &self,
        hand: &mut HandValue,
        snapshot: &mut CardCount,
        rng: &mut R,
    ) -> Result<()> {
        while !hand.bust() {
            match self.strategy.next(hand, self.dealer_up_card, snapshot) {
                Action::Hit => hand.add_card(draw(snapshot, rng)?),
                _ => break,
            }
        }
        Ok(())
    }

    fn dealer_plays<R: Rng + ?Sized>(&self, snapshot: &mut CardCount, rng: &mut R) -> Result<u16> {
        playout(
            HandValue::from_values(&[self.dealer_up_card]),
            snapshot,
            rng,
        )
    }
}

fn draw<R: Rng + ?Sized>(snapshot: &mut CardCount, rng: &mut R) -> Result<u8> {
    snapshot.draw(rng).ok_or(Error::SimulationExhausted)
}

/// Profit of a one-unit bet with both hands finished.
fn settle(player_total: u16, dealer_total: u16) -> i32 {
    if player_total > 21 {
        -1
    } else if dealer_total > 21 || player_total > dealer_total {
        1
    } else if player_total < dealer_total {
        -1
    } else {
        0
    }
}
