use rand::Rng;

use super::hand::HandValue;
use crate::{CardCount, Error, Result};

/// The dealer stands on any 17, soft or hard.
pub const DEALER_STANDS_ON: u16 = 17;

/// Plays the dealer hand out against a trial snapshot and returns the final
/// total, which may be above 21.
///
/// Starting from the up card alone, the first draw is the hole card. Every
/// draw removes a card from `snapshot`; the real shoe is never involved. Fails
/// if the snapshot runs out while the dealer still has to draw.
pub fn playout<R: Rng + ?Sized>(
    dealer_hand: HandValue,
    snapshot: &mut CardCount,
    rng: &mut R,
) -> Result<u16> {
    let mut dealer_hand = dealer_hand;
    while dealer_hand.total() < DEALER_STANDS_ON {
        let card = snapshot.draw(rng).ok_or(Error::SimulationExhausted)?;
        dealer_hand.add_card(card);
    }
    Ok(dealer_hand.total())
}
