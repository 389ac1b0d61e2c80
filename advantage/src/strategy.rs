//! Decision pipeline: surrender deviations, split handling, playing
//! deviations, baseline lookup. `decide` is a pure function of its
//! inputs: no randomness, no clock, no I/O.

pub mod deviations;
pub mod lookup;
pub mod tables;

use crate::hand::Hand;
use crate::state::CountSnapshot;
use crate::{Action, Card, Rules};

pub use deviations::{Deviation, DeviationIndex, Direction, Trigger};
pub use lookup::{BaselineAction, BundleMetadata, StrategyBundle, StrategyTable};

/// The outcome of one decision, with the counterfactual baseline kept
/// alongside so ablation logging can compare the two.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionResult {
    pub action: Action,
    pub baseline_action: Action,
    pub deviation_id: Option<String>,
    pub true_count: f64,
}

impl DecisionResult {
    pub fn deviated(&self) -> bool {
        self.action != self.baseline_action
    }
}

/// Strategy engine. Owns the baseline table and deviation index; both
/// are immutable after construction.
pub struct StrategyEngine {
    rules: Rules,
    table: StrategyTable,
    deviations: DeviationIndex,
    // Confidence buffer subtracted from the observed true count before
    // threshold comparison. Note the asymmetry: this raises the bar for
    // AT_OR_ABOVE deviations but lowers it for BELOW ones.
    deviation_margin: f64,
}

impl StrategyEngine {
    /// Engine with the built-in table matching the soft-17 rule and the
    /// standard Illustrious 18 + Fab 4 deviations.
    pub fn new(rules: Rules) -> StrategyEngine {
        StrategyEngine {
            rules,
            table: tables::builtin_table_for(rules.dealer_stands_soft_17),
            deviations: DeviationIndex::standard(),
            deviation_margin: 0.0,
        }
    }

    /// Engine over a caller-supplied table and deviation set.
    pub fn with_parts(
        rules: Rules,
        table: StrategyTable,
        deviations: DeviationIndex,
    ) -> StrategyEngine {
        StrategyEngine {
            rules,
            table,
            deviations,
            deviation_margin: 0.0,
        }
    }

    pub fn with_deviation_margin(mut self, margin: f64) -> StrategyEngine {
        self.deviation_margin = margin;
        self
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Decides the play for this hand. Always returns a valid action;
    /// table gaps fall back to the hand-coded default chart and illegal
    /// actions degrade per `validate_action`.
    pub fn decide(
        &self,
        hand: &Hand,
        dealer_up: Card,
        snapshot: CountSnapshot,
        use_deviations: bool,
    ) -> DecisionResult {
        let true_count = snapshot.true_count;

        // Baseline is computed unconditionally so the counterfactual is
        // always available to the flight recorder.
        let baseline_action = self.baseline(hand, dealer_up);

        if !use_deviations {
            return DecisionResult {
                action: baseline_action,
                baseline_action,
                deviation_id: None,
                true_count,
            };
        }

        let adjusted_tc = true_count - self.deviation_margin;

        // Surrender deviations only apply to an untouched two-card hand.
        if self.rules.surrender_allowed && hand.num_cards() == 2 {
            if let Some((action, id)) = self.deviations.check(hand, dealer_up, adjusted_tc, true) {
                return DecisionResult {
                    action: self.validate_action(action, hand),
                    baseline_action,
                    deviation_id: Some(id.to_string()),
                    true_count,
                };
            }
        }

        // Pairs: a split-resulting deviation outranks the baseline, and
        // a baseline SPLIT short-circuits the general deviation pass.
        if hand.is_pair() {
            if let Some((action, id)) = self.deviations.check(hand, dealer_up, adjusted_tc, false) {
                if action == Action::Split {
                    return DecisionResult {
                        action: Action::Split,
                        baseline_action,
                        deviation_id: Some(id.to_string()),
                        true_count,
                    };
                }
            }
            if baseline_action == Action::Split {
                return DecisionResult {
                    action: Action::Split,
                    baseline_action,
                    deviation_id: None,
                    true_count,
                };
            }
        }

        // General playing deviations (surrender entries are excluded by
        // the index; they were handled above).
        if let Some((action, id)) = self.deviations.check(hand, dealer_up, adjusted_tc, false) {
            return DecisionResult {
                action: self.validate_action(action, hand),
                baseline_action,
                deviation_id: Some(id.to_string()),
                true_count,
            };
        }

        DecisionResult {
            action: baseline_action,
            baseline_action,
            deviation_id: None,
            true_count,
        }
    }

    fn baseline(&self, hand: &Hand, dealer_up: Card) -> Action {
        let action = self
            .table
            .lookup(hand, dealer_up, &self.rules)
            .unwrap_or_else(|| lookup::default_chart_action(hand, dealer_up));
        self.validate_action(action, hand)
    }

    /// Degrades actions that are not legal for the hand as dealt:
    /// DOUBLE past two cards, SPLIT on a non-pair, SURRENDER past the
    /// initial decision or at a table without surrender.
    fn validate_action(&self, action: Action, hand: &Hand) -> Action {
        match action {
            Action::Double if hand.num_cards() > 2 => Action::Hit,
            Action::Split if !hand.is_pair() => Action::Hit,
            Action::Surrender if hand.num_cards() > 2 || !self.rules.surrender_allowed => {
                Action::Hit
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Rank, Suit};
    use crate::state::StateManager;

    fn hand2(a: Rank, b: Rank) -> Hand {
        Hand::new(Card::new(a, Suit::Spades), Card::new(b, Suit::Hearts)).unwrap()
    }

    fn up(rank: Rank) -> Card {
        Card::new(rank, Suit::Diamonds)
    }

    fn snapshot_with_tc(true_count: f64) -> CountSnapshot {
        CountSnapshot {
            running_count: 0,
            cards_seen: 0,
            cards_remaining: 312,
            decks_remaining: 6.0,
            true_count,
            penetration: 0.0,
        }
    }

    fn engine() -> StrategyEngine {
        StrategyEngine::new(Rules::vegas_strip())
    }

    #[test]
    fn decide_is_pure() {
        let engine = engine();
        let hand = hand2(Rank::Ten, Rank::Six);
        let snap = StateManager::new(&Rules::vegas_strip()).snapshot();
        let a = engine.decide(&hand, up(Rank::Ten), snap, true);
        let b = engine.decide(&hand, up(Rank::Ten), snap, true);
        assert_eq!(a, b);
    }

    #[test]
    fn deviations_off_returns_baseline_with_no_id() {
        let engine = engine();
        let hand = hand2(Rank::Ten, Rank::Six);
        let result = engine.decide(&hand, up(Rank::Ten), snapshot_with_tc(5.0), false);
        assert_eq!(result.action, result.baseline_action);
        assert_eq!(result.deviation_id, None);
        assert!(!result.deviated());
    }

    #[test]
    fn sixteen_v_ten_deviates_to_stand_at_zero() {
        let engine = engine();
        let hand = hand2(Rank::Ten, Rank::Six);

        let at_zero = engine.decide(&hand, up(Rank::Ten), snapshot_with_tc(0.0), true);
        assert_eq!(at_zero.action, Action::Stand);
        assert_eq!(at_zero.baseline_action, Action::Hit);
        assert_eq!(at_zero.deviation_id.as_deref(), Some("ILL_16v10"));
        assert!(at_zero.deviated());

        let negative = engine.decide(&hand, up(Rank::Ten), snapshot_with_tc(-1.0), true);
        assert_eq!(negative.action, Action::Hit);
        assert_eq!(negative.deviation_id, None);
    }

    #[test]
    fn fab_four_surrender_beats_playing_deviations() {
        let engine = engine();
        let hand = hand2(Rank::Ten, Rank::Five);
        let result = engine.decide(&hand, up(Rank::Ten), snapshot_with_tc(0.0), true);
        assert_eq!(result.action, Action::Surrender);
        assert_eq!(result.deviation_id.as_deref(), Some("FAB_15v10"));

        // Without surrender the Fab 4 step is skipped entirely and the
        // playing deviation takes over at its own index.
        let mut rules = Rules::vegas_strip();
        rules.surrender_allowed = false;
        let engine = StrategyEngine::new(rules);
        let at_four = engine.decide(&hand, up(Rank::Ten), snapshot_with_tc(4.0), true);
        assert_eq!(at_four.action, Action::Stand);
        assert_eq!(at_four.deviation_id.as_deref(), Some("ILL_15v10"));
    }

    #[test]
    fn surrender_deviation_needs_two_cards() {
        let engine = engine();
        let three_card_15 = hand2(Rank::Five, Rank::Five)
            .add_card(Card::new(Rank::Five, Suit::Clubs))
            .unwrap();
        let result = engine.decide(&three_card_15, up(Rank::Ten), snapshot_with_tc(2.0), true);
        assert_ne!(result.action, Action::Surrender);
    }

    #[test]
    fn baseline_split_returned_for_pairs() {
        let engine = engine();
        let eights = hand2(Rank::Eight, Rank::Eight);
        let result = engine.decide(&eights, up(Rank::Ten), snapshot_with_tc(0.0), true);
        assert_eq!(result.action, Action::Split);
        assert_eq!(result.deviation_id, None);
    }

    #[test]
    fn split_deviation_outranks_baseline_stand() {
        let engine = engine();
        let tens = hand2(Rank::Ten, Rank::Ten);

        let calm = engine.decide(&tens, up(Rank::Ace), snapshot_with_tc(3.0), true);
        assert_eq!(calm.action, Action::Stand);

        let hot = engine.decide(&tens, up(Rank::Ace), snapshot_with_tc(6.0), true);
        assert_eq!(hot.action, Action::Split);
        assert_eq!(hot.deviation_id.as_deref(), Some("ILL_20vA"));
    }

    #[test]
    fn margin_raises_the_bar_for_at_or_above() {
        let engine = StrategyEngine::new(Rules::vegas_strip()).with_deviation_margin(1.0);
        let hand = hand2(Rank::Ten, Rank::Six);

        // ILL_16v10 has index 0; with margin 1 it needs TC >= 1.
        let at_zero = engine.decide(&hand, up(Rank::Ten), snapshot_with_tc(0.0), true);
        assert_eq!(at_zero.action, Action::Hit);
        let at_one = engine.decide(&hand, up(Rank::Ten), snapshot_with_tc(1.0), true);
        assert_eq!(at_one.action, Action::Stand);
    }

    #[test]
    fn margin_loosens_below_deviations() {
        // Documented asymmetry: subtracting the margin from the observed
        // count makes BELOW deviations easier to trigger.
        let engine = StrategyEngine::new(Rules::vegas_strip()).with_deviation_margin(1.0);
        let hand = hand2(Rank::Ten, Rank::Three);

        // ILL_13v2 hits below -1; with margin 1 it already fires at -0.5.
        let result = engine.decide(&hand, up(Rank::Two), snapshot_with_tc(-0.5), true);
        assert_eq!(result.action, Action::Hit);
        assert_eq!(result.deviation_id.as_deref(), Some("ILL_13v2"));
    }

    #[test]
    fn double_degrades_to_hit_past_two_cards() {
        let engine = engine();
        let eleven = hand2(Rank::Four, Rank::Five)
            .add_card(Card::new(Rank::Two, Suit::Clubs))
            .unwrap();
        let result = engine.decide(&eleven, up(Rank::Ace), snapshot_with_tc(2.0), true);
        // ILL_11vA says DOUBLE at TC >= 1, but three cards cannot double.
        assert_eq!(result.action, Action::Hit);
    }

    #[test]
    fn h17_engine_surrenders_seventeen_v_ace() {
        let mut rules = Rules::vegas_strip();
        rules.dealer_stands_soft_17 = false;
        let engine = StrategyEngine::new(rules);
        let seventeen = hand2(Rank::Ten, Rank::Seven);
        let snap = snapshot_with_tc(0.0);

        assert_eq!(engine.decide(&seventeen, up(Rank::Ace), snap, true).action, Action::Surrender);

        let s17 = StrategyEngine::new(Rules::vegas_strip());
        assert_eq!(s17.decide(&seventeen, up(Rank::Ace), snap, true).action, Action::Stand);
    }
}
