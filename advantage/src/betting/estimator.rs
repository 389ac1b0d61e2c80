//! Advantage estimation. The production path is a rule-adjusted linear
//! map from true count to player edge; the exact effect-of-removal
//! estimator exists to benchmark how far the linear model drifts as the
//! shoe runs out.

use crate::error::EngineError;
use crate::{DoubleRestriction, Rules};

/// Advantage gain per unit of true count.
pub const TC_SLOPE: f64 = 0.005;

/// House edge of the reference game: six decks, S17, DAS, late
/// surrender, 3:2.
pub const BASE_EDGE_S17_DAS: f64 = 0.004;

/// Per-unit payoff variance of a blackjack hand.
pub const BLACKJACK_VARIANCE: f64 = 1.26;

/// Linear advantage model: `advantage = slope * true_count - baseline_edge`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdvantageModel {
    pub slope: f64,
    pub baseline_edge: f64,
}

impl Default for AdvantageModel {
    fn default() -> Self {
        AdvantageModel {
            slope: TC_SLOPE,
            baseline_edge: BASE_EDGE_S17_DAS,
        }
    }
}

impl AdvantageModel {
    /// Builds the model for a specific table. Each unfavorable rule adds
    /// to the baseline edge; betting with the reference edge on a worse
    /// table overestimates the player's advantage.
    pub fn from_rules(rules: &Rules) -> AdvantageModel {
        let mut baseline = BASE_EDGE_S17_DAS;
        if !rules.dealer_stands_soft_17 {
            baseline += 0.0022;
        }
        if rules.blackjack_payout < 1.4 {
            baseline += 0.0139;
        }
        if !rules.double_after_split {
            baseline += 0.0014;
        }
        if !rules.surrender_allowed {
            baseline += 0.0008;
        }
        match rules.double_restrictions {
            DoubleRestriction::TenElevenOnly => baseline += 0.0018,
            DoubleRestriction::NineTenElevenOnly => baseline += 0.0009,
            DoubleRestriction::AnyTwo => {}
        }
        AdvantageModel {
            slope: TC_SLOPE,
            baseline_edge: baseline,
        }
    }

    pub fn advantage(&self, true_count: f64) -> f64 {
        self.slope * true_count - self.baseline_edge
    }

    /// True count at which the player breaks even.
    pub fn breakeven_count(&self) -> f64 {
        self.baseline_edge / self.slope
    }

    /// True count below which the expected edge drops under
    /// `min_advantage`; the natural wong-out threshold.
    pub fn wong_out_threshold(&self, min_advantage: f64) -> f64 {
        (min_advantage + self.baseline_edge) / self.slope
    }
}

/// Linear estimator with the optional deck-count correction.
#[derive(Debug, Clone, Copy)]
pub struct EvEstimator {
    model: AdvantageModel,
    deck_adjustment: bool,
}

impl EvEstimator {
    pub fn from_rules(rules: &Rules) -> EvEstimator {
        EvEstimator {
            model: AdvantageModel::from_rules(rules),
            deck_adjustment: true,
        }
    }

    pub fn with_model(model: AdvantageModel) -> EvEstimator {
        EvEstimator {
            model,
            deck_adjustment: true,
        }
    }

    pub fn without_deck_adjustment(mut self) -> EvEstimator {
        self.deck_adjustment = false;
        self
    }

    pub fn model(&self) -> AdvantageModel {
        self.model
    }

    pub fn advantage(&self, true_count: f64, num_decks: u8) -> f64 {
        let base = self.model.advantage(true_count);
        if self.deck_adjustment {
            let deck_factor = 6.0 / num_decks as f64;
            base * (1.0 + (deck_factor - 1.0) * 0.1)
        } else {
            base
        }
    }

    pub fn ev_per_hand(&self, true_count: f64, bet: f64, num_decks: u8) -> f64 {
        bet * self.advantage(true_count, num_decks)
    }

    pub fn breakeven_count(&self) -> f64 {
        self.model.breakeven_count()
    }
}

/// Fractional Kelly sizing over the blackjack variance.
#[derive(Debug, Clone, Copy)]
pub struct KellyCalculator {
    kelly_fraction: f64,
    variance: f64,
}

impl KellyCalculator {
    /// `kelly_fraction` must sit in (0, 1]; half-Kelly (0.5) halves both
    /// growth and variance and is the defensive default.
    pub fn new(kelly_fraction: f64) -> Result<KellyCalculator, EngineError> {
        if !(kelly_fraction > 0.0 && kelly_fraction <= 1.0) {
            return Err(EngineError::InvalidRules(format!(
                "kelly_fraction {} outside (0, 1]",
                kelly_fraction
            )));
        }
        Ok(KellyCalculator {
            kelly_fraction,
            variance: BLACKJACK_VARIANCE,
        })
    }

    pub fn kelly_fraction(&self) -> f64 {
        self.kelly_fraction
    }

    /// Fraction of bankroll to wager; zero without an edge.
    pub fn bet_fraction(&self, advantage: f64) -> f64 {
        if advantage <= 0.0 {
            return 0.0;
        }
        self.kelly_fraction * advantage / self.variance
    }

    /// Rough risk-of-ruin figure for a fixed betting fraction. Exact for
    /// neither regime; the point is the shape: under-betting decays the
    /// risk, over-betting the optimal fraction grows it toward certainty.
    pub fn risk_of_ruin(&self, advantage: f64, bet_fraction: f64) -> f64 {
        if advantage <= 0.0 {
            return 1.0;
        }
        if bet_fraction <= 0.0 {
            return 0.0;
        }
        let optimal = advantage / self.variance;
        if bet_fraction <= optimal {
            (1.0 - advantage).powf(1.0 / bet_fraction)
        } else {
            (bet_fraction / optimal - 1.0).min(1.0)
        }
    }
}

/// Effect-of-removal coefficients in percentage points, indexed by point
/// value 2..=11 (tens collapsed, Aces at 11).
pub const EOR_BY_VALUE: [f64; 10] = [
    0.38, 0.44, 0.55, 0.69, 0.46, 0.28, 0.00, -0.18, -0.51, -0.61,
];

/// Composition-exact advantage estimator. Research-only: benchmarks the
/// linear model against the residual shoe and motivates the defensive
/// penetration cutoff.
#[derive(Debug, Clone, Copy)]
pub struct ExactCountEstimator {
    baseline_edge: f64,
    num_decks: u8,
}

impl ExactCountEstimator {
    pub fn from_rules(rules: &Rules) -> ExactCountEstimator {
        ExactCountEstimator {
            baseline_edge: AdvantageModel::from_rules(rules).baseline_edge,
            num_decks: rules.num_decks,
        }
    }

    /// Advantage from the remaining composition: EoR-weighted deviation
    /// of each value bucket from its pro-rata expectation.
    pub fn advantage(&self, remaining_by_value: &[usize; 10]) -> f64 {
        let total_cards = self.num_decks as f64 * 52.0;
        let per_rank = 4.0 * self.num_decks as f64;
        let total_remaining: usize = remaining_by_value.iter().sum();
        if total_remaining == 0 {
            return -self.baseline_edge;
        }

        let shoe_fraction = total_remaining as f64 / total_cards;
        let mut eor_sum = 0.0;
        for (i, &actual) in remaining_by_value.iter().enumerate() {
            let fresh = if i == 8 { 4.0 * per_rank } else { per_rank };
            let expected = fresh * shoe_fraction;
            eor_sum += EOR_BY_VALUE[i] * (expected - actual as f64);
        }

        (eor_sum / total_remaining as f64) / 100.0 - self.baseline_edge
    }

    /// Exact vs. linear comparison for one shoe state.
    pub fn compare_to_hilo(
        &self,
        remaining_by_value: &[usize; 10],
        hilo_true_count: f64,
    ) -> ModelComparison {
        let exact = self.advantage(remaining_by_value);
        let linear = TC_SLOPE * hilo_true_count - self.baseline_edge;
        ModelComparison {
            exact_advantage: exact,
            linear_advantage: linear,
            error: linear - exact,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelComparison {
    pub exact_advantage: f64,
    pub linear_advantage: f64,
    pub error: f64,
}
