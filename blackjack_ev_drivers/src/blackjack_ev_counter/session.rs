use std::fmt::Write;

use blackjack_ev::{
    simulation::parse_ranks, CountTracker, EngineConfig, Error, Rank, Recommendation, Result,
    Rule, ShoeState, StrategyDecisionMaker,
};
use rand_chacha::ChaCha8Rng;

pub enum Reply {
    Text(String),
    Quit,
}

/// One shoe followed card by card from stdin.
pub struct Session {
    shoe: ShoeState,
    decision_maker: StrategyDecisionMaker,
    rng: ChaCha8Rng,
}

impl Session {
    pub fn new(rule: Rule, config: EngineConfig, rng: ChaCha8Rng) -> Self {
        Session {
            shoe: ShoeState::new(rule.number_of_decks),
            decision_maker: StrategyDecisionMaker::new(rule, config),
            rng,
        }
    }

    pub fn execute(&mut self, line: &str) -> Result<Reply> {
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        let reply = match command.to_ascii_lowercase().as_str() {
            "" => String::new(),
            "quit" | "exit" => return Ok(Reply::Quit),
            "status" => self.status_text(),
            "reset" => {
                self.shoe.reset(self.shoe.number_of_decks());
                format!("Shoe reset to {} decks", self.shoe.number_of_decks())
            }
            "hand" => self.recommend(rest)?,
            _ => {
                let dealt = parse_ranks(line)?;
                self.shoe.deal_all(&dealt)?;
                let tracker = CountTracker::new(&self.shoe);
                format!(
                    "Dealt {}. Running count {}, true count {:.2}",
                    join(&dealt),
                    tracker.running_count(),
                    tracker.true_count()
                )
            }
        };
        Ok(Reply::Text(reply))
    }

    fn status_text(&self) -> String {
        let status = self.decision_maker.status(&self.shoe);
        let mut text = format!(
            "Running count: {}\nTrue count: {:.2}\n\
             Remaining cards: {} ({:.2} decks)\nPenetration: {:.1}%\nBet: {}\n",
            status.running_count,
            status.true_count,
            status.remaining_cards,
            status.decks_remaining,
            status.penetration * 100.0,
            CountTracker::new(&self.shoe).betting_recommendation(),
        );
        for (rank, count) in &status.card_counts {
            let _ = write!(text, " {}:{}", rank, count);
        }
        text
    }

    /// `<cards> vs <up card>`, e.g. `10 6 vs 7`.
    fn recommend(&mut self, arguments: &str) -> Result<String> {
        let (hand, up) = arguments
            .split_once("vs")
            .ok_or_else(|| Error::InvalidHand {
                reason: String::from("expected `hand <cards> vs <up card>`"),
            })?;
        let hand = parse_ranks(hand)?;
        let dealer_up_card: Rank = up.trim().parse()?;

        let recommendation =
            self.decision_maker
                .recommend(&hand, dealer_up_card, &self.shoe, &mut self.rng)?;
        Ok(format_recommendation(&hand, dealer_up_card, &recommendation))
    }
}

fn join(cards: &[Rank]) -> String {
    cards
        .iter()
        .map(|card| card.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_recommendation(
    hand: &[Rank],
    dealer_up_card: Rank,
    recommendation: &Recommendation,
) -> String {
    let mut text = format!("{} vs {}\n", join(hand), dealer_up_card);
    for (action, estimate) in &recommendation.evs.estimates {
        match estimate.ev {
            Some(ev) => {
                let _ = write!(text, "  {:<6} {:+.4}", action, ev);
            }
            None => {
                let _ = write!(text, "  {:<6} n/a", action);
            }
        }
        if estimate.discarded > 0 {
            let _ = write!(text, " ({} trials discarded)", estimate.discarded);
        }
        text.push('\n');
    }
    let _ = write!(
        text,
        "Best: {}  Chart: {}",
        recommendation.optimal_action, recommendation.chart_action
    );
    text
}
