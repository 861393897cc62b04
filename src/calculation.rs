mod trial;

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, warn};

use self::trial::TrialSetup;
use crate::{
    simulation::{
        hand::{is_pair, HandValue},
        shoe::ShoeState,
        Rank,
    },
    strategy::{BasicStrategy, ContinuationStrategy},
    Action, CardCount, Error, Result, Rule,
};

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Trials per candidate action.
    pub trials: u32,
    /// 0 means one thread per available core.
    pub number_of_threads: usize,
    /// Trials are grouped into chunks of this size, each with its own random
    /// stream, so results do not depend on the number of threads.
    pub trials_per_chunk: u32,
    /// EVs closer than this to the best one count as a tie.
    pub tie_epsilon: f64,
    /// Ties go to the action listed first.
    pub tie_break_priority: Vec<Action>,
    /// Stop starting new trials after this long. The estimate from the trials
    /// that did run is still a valid mean.
    pub time_budget: Option<Duration>,
    /// Remove the player's cards and the dealer up card from the snapshot,
    /// for callers that have not dealt them into the shoe.
    pub remove_visible_cards: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            trials: 10_000,
            number_of_threads: 0,
            trials_per_chunk: 1_000,
            tie_epsilon: 0.001,
            tie_break_priority: vec![Action::Split, Action::Double, Action::Hit, Action::Stand],
            time_budget: None,
            remove_visible_cards: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ActionEstimate {
    /// Mean profit per unit bet, or None if no trial finished.
    pub ev: Option<f64>,
    /// Trials that finished and were averaged.
    pub samples: u32,
    /// Trials thrown away because the snapshot ran out.
    pub discarded: u32,
    /// Trials never started because the time budget ran out.
    pub skipped: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EvResult {
    pub estimates: BTreeMap<Action, ActionEstimate>,
    pub best: Action,
}

impl EvResult {
    pub fn ev(&self, action: Action) -> Option<f64> {
        self.estimates.get(&action).and_then(|estimate| estimate.ev)
    }

    pub fn total_discarded(&self) -> u32 {
        self.estimates.values().map(|estimate| estimate.discarded).sum()
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Tally {
    profit: i64,
    samples: u32,
    discarded: u32,
    skipped: u32,
}

impl std::ops::AddAssign for Tally {
    fn add_assign(&mut self, rhs: Self) {
        self.profit += rhs.profit;
        self.samples += rhs.samples;
        self.discarded += rhs.discarded;
        self.skipped += rhs.skipped;
    }
}

/// Estimates the EV of each action by playing the hand out many times against
/// copies of the shoe composition.
#[derive(Debug, Clone)]
pub struct MonteCarloEvEngine<S = BasicStrategy> {
    rule: Rule,
    config: EngineConfig,
    strategy: S,
}

impl MonteCarloEvEngine<BasicStrategy> {
    pub fn new(rule: Rule, config: EngineConfig) -> Self {
        let strategy = BasicStrategy::new(&rule);
        Self::with_strategy(rule, config, strategy)
    }
}

impl<S: ContinuationStrategy + Sync> MonteCarloEvEngine<S> {
    pub fn with_strategy(rule: Rule, config: EngineConfig, strategy: S) -> Self {
        MonteCarloEvEngine {
            rule,
            config,
            strategy,
        }
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Runs `trials` trials of every candidate action. `trials` must be
    /// positive.
    ///
    /// `rng` is only used to seed the per-chunk random streams, so the same
    /// seed gives the same result whatever the number of threads.
    pub fn evaluate<R: Rng + ?Sized>(
        &self,
        hand: &[Rank],
        dealer_up_card: Rank,
        shoe: &ShoeState,
        candidate_actions: &[Action],
        trials: u32,
        rng: &mut R,
    ) -> Result<EvResult> {
        validate_actions(hand, candidate_actions)?;
        if trials == 0 {
            return Err(Error::NoTrials);
        }

        let mut snapshot = shoe.snapshot();
        if self.config.remove_visible_cards {
            for card in hand.iter().chain(std::iter::once(&dealer_up_card)) {
                if !snapshot.remove_card(card.blackjack_value()) {
                    return Err(Error::invalid_hand(format!(
                        "card {} is not in the shoe",
                        card
                    )));
                }
            }
        }

        let setup = TrialSetup {
            rule: &self.rule,
            strategy: &self.strategy,
            hand: HandValue::from_ranks(hand),
            pair_value: if is_pair(hand) {
                Some(hand[0].blackjack_value())
            } else {
                None
            },
            dealer_up_card: dealer_up_card.blackjack_value(),
        };
        let base_seed: u64 = rng.gen();
        let deadline = self.config.time_budget.map(|budget| Instant::now() + budget);

        let mut estimates = BTreeMap::new();
        for &action in candidate_actions {
            if estimates.contains_key(&action) {
                continue;
            }
            let tally = self.run_trials(&setup, action, snapshot, trials, base_seed, deadline);
            if tally.discarded > 0 {
                warn!(
                    %action,
                    discarded = tally.discarded,
                    samples = tally.samples,
                    "trials discarded because the snapshot ran out"
                );
            }
            let ev = if tally.samples > 0 {
                Some(tally.profit as f64 / tally.samples as f64)
            } else {
                None
            };
            debug!(%action, ?ev, samples = tally.samples, "action evaluated");
            estimates.insert(
                action,
                ActionEstimate {
                    ev,
                    samples: tally.samples,
                    discarded: tally.discarded,
                    skipped: tally.skipped,
                },
            );
        }

        let best = match pick_best(
            &estimates,
            self.config.tie_epsilon,
            &self.config.tie_break_priority,
        ) {
            Some(best) => best,
            None if estimates.values().any(|estimate| estimate.skipped > 0) => {
                return Err(Error::TimeBudgetExceeded)
            }
            None => return Err(Error::SimulationExhausted),
        };

        Ok(EvResult { estimates, best })
    }

    fn number_of_threads(&self) -> usize {
        if self.config.number_of_threads == 0 {
            match std::thread::available_parallelism() {
                Ok(n) => n.get(),
                Err(_) => 1,
            }
        } else {
            self.config.number_of_threads
        }
    }

    fn run_trials(
        &self,
        setup: &TrialSetup<'_, S>,
        action: Action,
        snapshot: CardCount,
        trials: u32,
        base_seed: u64,
        deadline: Option<Instant>,
    ) -> Tally {
        let chunk_size = self.config.trials_per_chunk.max(1);
        let number_of_chunks = trials.div_ceil(chunk_size);
        if number_of_chunks == 0 {
            return Tally::default();
        }

        let number_of_threads = self.number_of_threads().min(number_of_chunks as usize);
        let mut dispatched_chunks: Vec<Vec<u32>> = vec![Vec::new(); number_of_threads];
        for chunk_index in 0..number_of_chunks {
            dispatched_chunks[chunk_index as usize % number_of_threads].push(chunk_index);
        }

        let run_chunks = |chunks: &[u32]| {
            let mut tally = Tally::default();
            for &chunk_index in chunks {
                let first = chunk_index * chunk_size;
                let count = chunk_size.min(trials - first);
                let mut rng = ChaCha8Rng::seed_from_u64(base_seed);
                rng.set_stream(((action as u64) << 32) | chunk_index as u64);
                tally += run_chunk(setup, action, snapshot, count, &mut rng, deadline);
            }
            tally
        };

        let run_chunks = &run_chunks;
        std::thread::scope(|scope| {
            let threads: Vec<_> = dispatched_chunks[1..]
                .iter()
                .map(|chunks| scope.spawn(move || run_chunks(chunks.as_slice())))
                .collect();

            let mut tally = run_chunks(dispatched_chunks[0].as_slice());
            for thread in threads {
                match thread.join() {
                    Ok(thread_tally) => tally += thread_tally,
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            }
            tally
        })
    }
}

fn run_chunk<S: ContinuationStrategy>(
    setup: &TrialSetup<'_, S>,
    action: Action,
    snapshot: CardCount,
    count: u32,
    rng: &mut ChaCha8Rng,
    deadline: Option<Instant>,
) -> Tally {
    let mut tally = Tally::default();
    for trial_index in 0..count {
        if let Some(deadline) = deadline {
            if trial_index % 64 == 0 && Instant::now() >= deadline {
                tally.skipped = count - trial_index;
                break;
            }
        }

        let mut trial_snapshot = snapshot;
        match setup.play(action, &mut trial_snapshot, rng) {
            Ok(profit) => {
                tally.profit += profit as i64;
                tally.samples += 1;
            }
            Err(error) => {
                debug!(%action, %error, "trial discarded");
                tally.discarded += 1;
            }
        }
    }
    tally
}

fn validate_actions(hand: &[Rank], candidate_actions: &[Action]) -> Result<()> {
    if hand.len() < 2 {
        return Err(Error::invalid_hand("a hand needs at least two cards"));
    }
    // Totals saturate, so an absurdly long hand is bust rather than an overflow.
    if HandValue::from_ranks(hand).bust() {
        return Err(Error::invalid_hand("the hand is already bust"));
    }
    if candidate_actions.is_empty() {
        return Err(Error::invalid_hand("no action to evaluate"));
    }
    for action in candidate_actions {
        match action {
            Action::Double if hand.len() != 2 => {
                return Err(Error::invalid_hand(
                    "double is only allowed on the first two cards",
                ));
            }
            Action::Split if !is_pair(hand) => {
                return Err(Error::invalid_hand(
                    "split is only allowed on two cards of the same rank",
                ));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Highest EV wins; EVs within `epsilon` of the best are settled by `priority`,
/// then by EV.
fn pick_best(
    estimates: &BTreeMap<Action, ActionEstimate>,
    epsilon: f64,
    priority: &[Action],
) -> Option<Action> {
    let max_ev = estimates
        .values()
        .filter_map(|estimate| estimate.ev)
        .fold(f64::NEG_INFINITY, f64::max);
    if max_ev == f64::NEG_INFINITY {
        return None;
    }

    let rank_of = |action: &Action| {
        priority
            .iter()
            .position(|candidate| candidate == action)
            .unwrap_or(priority.len())
    };
    estimates
        .iter()
        .filter_map(|(action, estimate)| estimate.ev.map(|ev| (*action, ev)))
        .filter(|(_, ev)| *ev >= max_ev - epsilon)
        .min_by(|(a, a_ev), (b, b_ev)| {
            rank_of(a)
                .cmp(&rank_of(b))
                .then(b_ev.total_cmp(a_ev))
        })
        .map(|(action, _)| action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use Rank::*;

    const ALL_ACTIONS: [Action; 4] = [Action::Stand, Action::Hit, Action::Double, Action::Split];

    fn engine(trials: u32) -> MonteCarloEvEngine {
        MonteCarloEvEngine::new(
            Rule::default(),
            EngineConfig {
                trials,
                ..Default::default()
            },
        )
    }

    fn seeded(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    /// A shoe dealt down to the given ranks.
    fn shoe_with(number_of_decks: u8, keep: &[(Rank, u16)]) -> ShoeState {
        let mut shoe = ShoeState::new(number_of_decks);
        let ranks: Vec<Rank> = shoe.rank_counts().map(|(rank, _)| rank).collect();
        for rank in ranks {
            let left = keep
                .iter()
                .find(|(kept, _)| *kept == rank)
                .map_or(0, |(_, n)| *n);
            while shoe.remaining_of(rank) > left {
                shoe.deal(rank).unwrap();
            }
        }
        shoe
    }

    fn estimate(ev: f64) -> ActionEstimate {
        ActionEstimate {
            ev: Some(ev),
            samples: 1,
            ..Default::default()
        }
    }

    #[test]
    fn hard_sixteen_against_seven_should_hit() {
        let shoe = ShoeState::new(8);
        let result = engine(20_000)
            .evaluate(
                &[Ten, Six],
                Seven,
                &shoe,
                &[Action::Hit, Action::Stand],
                20_000,
                &mut seeded(2024),
            )
            .unwrap();
        assert!(result.ev(Action::Hit).unwrap() > result.ev(Action::Stand).unwrap());
        assert_eq!(result.best, Action::Hit);
        assert_eq!(result.estimates[&Action::Hit].samples, 20_000);
        assert_eq!(result.total_discarded(), 0);
    }

    #[test]
    fn double_responds_to_removed_high_cards() {
        let fresh = ShoeState::new(8);
        let low_cards: Vec<(Rank, u16)> = [Two, Three, Four, Five, Six, Seven, Eight, Nine]
            .into_iter()
            .map(|rank| (rank, 32))
            .collect();
        let depleted = shoe_with(8, &low_cards);

        let engine = engine(20_000);
        let fresh_ev = engine
            .evaluate(&[Five, Six], Six, &fresh, &[Action::Double], 20_000, &mut seeded(7))
            .unwrap()
            .ev(Action::Double)
            .unwrap();
        let depleted_ev = engine
            .evaluate(&[Five, Six], Six, &depleted, &[Action::Double], 20_000, &mut seeded(7))
            .unwrap()
            .ev(Action::Double)
            .unwrap();
        // Without tens or aces the 11 can no longer draw to 21, while the
        // dealer's 6 draws to a made hand far more often.
        assert!(depleted_ev < fresh_ev - 0.2);
    }

    #[test]
    fn same_seed_same_result_regardless_of_threads() {
        let shoe = ShoeState::new(8);
        let run = |number_of_threads| {
            MonteCarloEvEngine::new(
                Rule::default(),
                EngineConfig {
                    number_of_threads,
                    trials_per_chunk: 250,
                    ..Default::default()
                },
            )
            .evaluate(&[Eight, Eight], Ten, &shoe, &ALL_ACTIONS, 3_000, &mut seeded(99))
            .unwrap()
        };
        assert_eq!(run(1), run(4));
    }

    #[test]
    fn spread_shrinks_with_more_trials() {
        let shoe = ShoeState::new(8);
        let engine = engine(0);
        let spread = |trials| {
            let evs: Vec<f64> = (0..8)
                .map(|seed| {
                    let mut rng = seeded(seed);
                    engine
                        .evaluate(&[Ten, Six], Seven, &shoe, &[Action::Stand], trials, &mut rng)
                        .unwrap()
                        .ev(Action::Stand)
                        .unwrap()
                })
                .collect();
            let mean = evs.iter().sum::<f64>() / evs.len() as f64;
            (evs.iter().map(|ev| (ev - mean).powi(2)).sum::<f64>() / evs.len() as f64).sqrt()
        };
        assert!(spread(50_000) < spread(1_000));
    }

    #[test]
    fn real_shoe_is_not_touched() {
        let mut shoe = ShoeState::new(8);
        shoe.deal(Ten).unwrap();
        shoe.deal(Six).unwrap();
        let before = shoe.clone();
        engine(1_000)
            .evaluate(&[Ten, Six], Seven, &shoe, &ALL_ACTIONS[..3], 1_000, &mut seeded(3))
            .unwrap();
        assert_eq!(shoe, before);
    }

    #[test]
    fn split_needs_a_pair_of_identical_labels() {
        let shoe = ShoeState::new(8);
        let result = engine(100).evaluate(
            &[Ten, King],
            Six,
            &shoe,
            &[Action::Split],
            100,
            &mut seeded(1),
        );
        assert!(matches!(result, Err(Error::InvalidHand { .. })));

        let result = engine(100).evaluate(
            &[King, King],
            Six,
            &shoe,
            &[Action::Split],
            100,
            &mut seeded(1),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn malformed_hands_are_rejected() {
        let shoe = ShoeState::new(8);
        let engine = engine(10);
        let mut rng = seeded(1);
        for (hand, actions) in [
            (vec![Ten], vec![Action::Stand]),
            (vec![Ten, Six, Nine], vec![Action::Stand]),
            (vec![Two, Three, Four], vec![Action::Double]),
            (vec![Ten, Six], vec![]),
            (vec![King; 26], vec![Action::Stand]),
            (vec![Ace; 300], vec![Action::Hit]),
        ] {
            assert!(matches!(
                engine.evaluate(&hand, Seven, &shoe, &actions, 10, &mut rng),
                Err(Error::InvalidHand { .. })
            ));
        }
    }

    #[test]
    fn exhausted_trials_are_discarded_and_counted() {
        // Dealer 7 with 7, 7 and 2 left ends on 16 with nothing to draw.
        let shoe = shoe_with(1, &[(Seven, 2), (Two, 1)]);
        let result = engine(200).evaluate(
            &[Ten, Eight],
            Seven,
            &shoe,
            &[Action::Stand],
            200,
            &mut seeded(5),
        );
        assert_eq!(result, Err(Error::SimulationExhausted));
    }

    #[test]
    fn partial_exhaustion_keeps_a_valid_mean() {
        // Hitting 16 either busts on the ten, or makes 18 on the two and
        // leaves the dealer's 2 with only the ten.
        let shoe = shoe_with(1, &[(Ten, 1), (Two, 1)]);
        let result = engine(500)
            .evaluate(&[Ten, Six], Two, &shoe, &[Action::Hit], 500, &mut seeded(6))
            .unwrap();
        let estimate = result.estimates[&Action::Hit];
        assert_eq!(estimate.samples + estimate.discarded, 500);
        assert!(estimate.samples > 0 && estimate.discarded > 0);
        assert_eq!(estimate.ev, Some(-1.0));
    }

    #[test]
    fn visible_cards_can_be_removed_from_the_snapshot() {
        let mut shoe = ShoeState::new(1);
        while shoe.remaining_of(Ace) > 0 {
            shoe.deal(Ace).unwrap();
        }
        let engine = MonteCarloEvEngine::new(
            Rule::default(),
            EngineConfig {
                remove_visible_cards: true,
                ..Default::default()
            },
        );
        let mut rng = seeded(1);
        let result = engine.evaluate(&[Ace, Six], Seven, &shoe, &[Action::Stand], 10, &mut rng);
        assert!(matches!(result, Err(Error::InvalidHand { .. })));
        assert!(engine
            .evaluate(&[Ten, Six], Seven, &shoe, &[Action::Stand], 10, &mut seeded(1))
            .is_ok());
    }

    #[test]
    fn time_budget_still_returns_an_estimate() {
        let shoe = ShoeState::new(8);
        let engine = MonteCarloEvEngine::new(
            Rule::default(),
            EngineConfig {
                time_budget: Some(Duration::from_secs(60)),
                ..Default::default()
            },
        );
        let result = engine
            .evaluate(&[Ten, Six], Seven, &shoe, &[Action::Stand], 2_000, &mut seeded(4))
            .unwrap();
        assert_eq!(result.estimates[&Action::Stand].samples, 2_000);
        assert_eq!(result.estimates[&Action::Stand].skipped, 0);

        let engine = MonteCarloEvEngine::new(
            Rule::default(),
            EngineConfig {
                time_budget: Some(Duration::ZERO),
                ..Default::default()
            },
        );
        let mut rng = seeded(4);
        let result = engine.evaluate(&[Ten, Six], Seven, &shoe, &[Action::Stand], 2_000, &mut rng);
        assert_eq!(result, Err(Error::TimeBudgetExceeded));
    }

    #[test]
    fn zero_trials_are_rejected() {
        let shoe = ShoeState::new(8);
        let mut rng = seeded(8);
        let result = engine(0).evaluate(&[Ten, Six], Seven, &shoe, &[Action::Stand], 0, &mut rng);
        assert_eq!(result, Err(Error::NoTrials));
    }

    #[test]
    fn ties_follow_priority() {
        let priority = EngineConfig::default().tie_break_priority;
        let mut estimates = BTreeMap::new();
        estimates.insert(Action::Stand, estimate(0.1000));
        estimates.insert(Action::Hit, estimate(0.1005));
        estimates.insert(Action::Double, estimate(0.0500));
        assert_eq!(pick_best(&estimates, 0.001, &priority), Some(Action::Hit));

        estimates.insert(Action::Double, estimate(0.0995));
        assert_eq!(pick_best(&estimates, 0.001, &priority), Some(Action::Double));

        let stand_first = [Action::Stand, Action::Hit, Action::Double, Action::Split];
        assert_eq!(pick_best(&estimates, 0.001, &stand_first), Some(Action::Stand));
        assert_eq!(pick_best(&estimates, 0.0, &stand_first), Some(Action::Hit));
    }

    #[test]
    fn missing_estimates_are_skipped() {
        let mut estimates = BTreeMap::new();
        estimates.insert(Action::Split, ActionEstimate::default());
        estimates.insert(Action::Stand, estimate(-0.2));
        assert_eq!(pick_best(&estimates, 0.001, &[Action::Split]), Some(Action::Stand));
        assert_eq!(pick_best(&BTreeMap::new(), 0.001, &[]), None);
    }
}
