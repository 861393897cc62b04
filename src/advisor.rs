use rand::Rng;
use serde::Serialize;

use crate::{
    calculation::{EngineConfig, EvResult, MonteCarloEvEngine},
    count::{CountTracker, ShoeStatus},
    simulation::{hand::is_pair, shoe::ShoeState, Rank},
    Action, Result, Rule,
};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Recommendation {
    pub evs: EvResult,
    /// Action with the best simulated EV.
    pub optimal_action: Action,
    /// Basic strategy with Hi-Lo index plays at the current true count.
    pub chart_action: Action,
}

/// Front door for a table: counts from the shoe and EV-based advice for a hand.
#[derive(Debug, Clone)]
pub struct StrategyDecisionMaker {
    engine: MonteCarloEvEngine,
}

impl StrategyDecisionMaker {
    pub fn new(rule: Rule, config: EngineConfig) -> Self {
        StrategyDecisionMaker {
            engine: MonteCarloEvEngine::new(rule, config),
        }
    }

    pub fn engine(&self) -> &MonteCarloEvEngine {
        &self.engine
    }

    pub fn status(&self, shoe: &ShoeState) -> ShoeStatus {
        CountTracker::new(shoe).status()
    }

    /// Simulates every legal action for `hand` and returns the best one next to
    /// the chart play.
    pub fn recommend<R: Rng + ?Sized>(
        &self,
        hand: &[Rank],
        dealer_up_card: Rank,
        shoe: &ShoeState,
        rng: &mut R,
    ) -> Result<Recommendation> {
        let candidate_actions = candidate_actions(hand);
        let evs = self.engine.evaluate(
            hand,
            dealer_up_card,
            shoe,
            &candidate_actions,
            self.engine.config().trials,
            rng,
        )?;

        let true_count = CountTracker::new(shoe).true_count();
        let chart_action = self
            .engine
            .strategy()
            .chart_action(hand, dealer_up_card, true_count);

        Ok(Recommendation {
            optimal_action: evs.best,
            chart_action,
            evs,
        })
    }
}

fn candidate_actions(hand: &[Rank]) -> Vec<Action> {
    let mut actions = vec![Action::Stand, Action::Hit];
    if hand.len() == 2 {
        actions.push(Action::Double);
    }
    if is_pair(hand) {
        actions.push(Action::Split);
    }
    actions
}
