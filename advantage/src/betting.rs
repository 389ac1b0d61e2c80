//! Wager sizing. Maps count state and bankroll to a bet through the
//! rule-adjusted advantage model and fractional Kelly, with the
//! defensive cutoffs applied in a fixed order.

pub mod estimator;

use crate::error::EngineError;
use crate::Rules;

pub use estimator::{
    AdvantageModel, EvEstimator, ExactCountEstimator, KellyCalculator, ModelComparison,
    BLACKJACK_VARIANCE, EOR_BY_VALUE,
};

/// Betting configuration. Limits default from the table rules; the
/// spread cap and penetration cutoff are engine-side safety rails.
#[derive(Debug, Clone, Copy)]
pub struct BettingConfig {
    pub kelly_fraction: f64,
    pub table_min: f64,
    pub table_max: f64,
    pub max_spread: f64,
    pub flat_betting: bool,
    /// Beyond this penetration the linear model's error is too large to
    /// trust, so count-driven sizing shuts off.
    pub max_betting_penetration: f64,
}

impl BettingConfig {
    pub fn from_rules(rules: &Rules) -> BettingConfig {
        BettingConfig {
            kelly_fraction: 0.5,
            table_min: rules.table_min,
            table_max: rules.table_max,
            max_spread: 12.0,
            flat_betting: false,
            max_betting_penetration: 0.85,
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.kelly_fraction > 0.0 && self.kelly_fraction <= 1.0) {
            return Err(EngineError::InvalidRules(format!(
                "kelly_fraction {} outside (0, 1]",
                self.kelly_fraction
            )));
        }
        if self.table_min <= 0.0 || self.table_max < self.table_min {
            return Err(EngineError::InvalidRules(format!(
                "betting limits {}..{} are not an increasing positive range",
                self.table_min, self.table_max
            )));
        }
        if self.max_spread < 1.0 {
            return Err(EngineError::InvalidRules(format!(
                "max_spread {} below 1",
                self.max_spread
            )));
        }
        Ok(())
    }
}

/// Betting engine. Owns its configuration; returns a valid non-negative
/// amount for every input, with zero signalling bankruptcy.
pub struct BettingEngine {
    config: BettingConfig,
    estimator: EvEstimator,
    kelly: KellyCalculator,
    num_decks: u8,
}

impl BettingEngine {
    pub fn new(config: BettingConfig, rules: &Rules) -> Result<BettingEngine, EngineError> {
        config.validate()?;
        Ok(BettingEngine {
            config,
            estimator: EvEstimator::from_rules(rules),
            kelly: KellyCalculator::new(config.kelly_fraction)?,
            num_decks: rules.num_decks,
        })
    }

    pub fn config(&self) -> &BettingConfig {
        &self.config
    }

    /// Computes the wager for the next hand.
    ///
    /// Order matters: bankroll floor, flat mode, penetration cutoff,
    /// advantage, Kelly fraction, table clamp, spread cap, bankroll cap.
    pub fn compute_bet(&self, true_count: f64, bankroll: f64, penetration: f64) -> f64 {
        let min = self.config.table_min;
        if bankroll < min {
            return 0.0;
        }
        if self.config.flat_betting {
            return min;
        }
        if penetration > self.config.max_betting_penetration {
            return min;
        }

        let advantage = self.estimator.advantage(true_count, self.num_decks);
        let fraction = self.kelly.bet_fraction(advantage);

        let mut bet = bankroll * fraction;
        bet = bet.clamp(min, self.config.table_max);
        bet = bet.min(min * self.config.max_spread);
        bet = bet.min(bankroll);

        // The clamps cannot push a positive-advantage bet under the
        // table minimum while bankroll covers it, but keep the floor
        // explicit for user-supplied spreads below 1.
        if advantage > 0.0 && bet < min {
            return min;
        }
        (bet * 100.0).round() / 100.0
    }

    pub fn advantage(&self, true_count: f64) -> f64 {
        self.estimator.advantage(true_count, self.num_decks)
    }

    /// True iff the model gives the player an edge at this count.
    pub fn should_bet(&self, true_count: f64) -> bool {
        self.advantage(true_count) > 0.0
    }

    /// True iff the count has fallen below the wong-out threshold.
    pub fn should_wong_out(&self, true_count: f64, threshold: f64) -> bool {
        true_count < threshold
    }

    pub fn breakeven_count(&self) -> f64 {
        self.estimator.breakeven_count()
    }

    /// Bet spread in units of the table minimum, independent of
    /// bankroll: one unit below breakeven, one extra unit per count.
    pub fn bet_units(&self, true_count: f64) -> f64 {
        let breakeven = self.breakeven_count();
        if true_count <= breakeven {
            return 1.0;
        }
        (1.0 + (true_count - breakeven)).min(self.config.max_spread)
    }
}
