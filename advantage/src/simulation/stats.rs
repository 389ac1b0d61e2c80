//! Run statistics. The driver owns one `RunningStats` and feeds it a
//! settled `HandStats` per hand; the post-run summary derives every
//! reported figure from the accumulated state.

use std::collections::BTreeMap;

use serde_enum_str::{Deserialize_enum_str, Serialize_enum_str};

use crate::Action;

/// Hand outcome in wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize_enum_str, Deserialize_enum_str)]
pub enum Outcome {
    #[serde(rename = "WIN")]
    Win,
    #[serde(rename = "LOSS")]
    Loss,
    #[serde(rename = "PUSH")]
    Push,
    #[serde(rename = "BLACKJACK")]
    Blackjack,
    #[serde(rename = "SURRENDER")]
    Surrender,
    #[serde(rename = "BUST")]
    Bust,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Win => "WIN",
            Outcome::Loss => "LOSS",
            Outcome::Push => "PUSH",
            Outcome::Blackjack => "BLACKJACK",
            Outcome::Surrender => "SURRENDER",
            Outcome::Bust => "BUST",
        }
    }

    pub fn all() -> [Outcome; 6] {
        [
            Outcome::Win,
            Outcome::Loss,
            Outcome::Push,
            Outcome::Blackjack,
            Outcome::Surrender,
            Outcome::Bust,
        ]
    }

    /// Wins and blackjacks count toward the reported win rate.
    pub fn is_win(&self) -> bool {
        matches!(self, Outcome::Win | Outcome::Blackjack)
    }
}

/// One settled hand.
#[derive(Debug, Clone)]
pub struct HandStats {
    pub outcome: Outcome,
    pub bet: f64,
    pub payout: f64,
    pub net: f64,
    pub actions: Vec<Action>,
    pub true_count_at_start: f64,
}

/// Per-bucket EV aggregation keyed by the floored true count.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BucketStats {
    pub hands: u64,
    pub net: f64,
    pub wagered: f64,
}

impl BucketStats {
    pub fn ev_percent(&self) -> f64 {
        if self.wagered == 0.0 {
            0.0
        } else {
            self.net / self.wagered * 100.0
        }
    }
}

/// Rolling accumulation over a run. Buckets live in a BTreeMap so every
/// traversal is in count order and the reported summary is stable.
#[derive(Debug, Default)]
pub struct RunningStats {
    hands_played: u64,
    hands_skipped: u64,
    total_wagered: f64,
    net_profit: f64,
    outcome_counts: BTreeMap<Outcome, u64>,
    // Per-hand net/bet ratios for the standard error.
    ev_samples: Vec<f64>,
    by_true_count: BTreeMap<i32, BucketStats>,
    peak_bankroll: f64,
    max_drawdown: f64,
}

impl RunningStats {
    pub fn new(starting_bankroll: f64) -> RunningStats {
        RunningStats {
            peak_bankroll: starting_bankroll,
            ..RunningStats::default()
        }
    }

    pub fn record_hand(&mut self, hand: &HandStats, bankroll_after: f64) {
        self.hands_played += 1;
        self.total_wagered += hand.bet;
        self.net_profit += hand.net;
        *self.outcome_counts.entry(hand.outcome).or_insert(0) += 1;
        if hand.bet > 0.0 {
            self.ev_samples.push(hand.net / hand.bet);
        }

        let bucket = hand.true_count_at_start.floor() as i32;
        let entry = self.by_true_count.entry(bucket.clamp(-10, 10)).or_default();
        entry.hands += 1;
        entry.net += hand.net;
        entry.wagered += hand.bet;

        if bankroll_after > self.peak_bankroll {
            self.peak_bankroll = bankroll_after;
        }
        let drawdown = self.peak_bankroll - bankroll_after;
        if drawdown > self.max_drawdown {
            self.max_drawdown = drawdown;
        }
    }

    pub fn record_skip(&mut self) {
        self.hands_skipped += 1;
    }

    pub fn hands_played(&self) -> u64 {
        self.hands_played
    }

    pub fn finish(self, final_bankroll: f64) -> SimulationResult {
        let n = self.ev_samples.len();
        let standard_error = if n > 1 {
            let mean = self.ev_samples.iter().sum::<f64>() / n as f64;
            let variance = self
                .ev_samples
                .iter()
                .map(|s| (s - mean) * (s - mean))
                .sum::<f64>()
                / (n as f64 - 1.0);
            variance.sqrt() / (n as f64).sqrt()
        } else {
            0.0
        };

        let wins = Outcome::all()
            .iter()
            .filter(|o| o.is_win())
            .map(|o| self.outcome_counts.get(o).copied().unwrap_or(0))
            .sum::<u64>();

        SimulationResult {
            hands_played: self.hands_played,
            hands_skipped: self.hands_skipped,
            total_wagered: self.total_wagered,
            net_profit: self.net_profit,
            ev_percent: if self.total_wagered > 0.0 {
                self.net_profit / self.total_wagered * 100.0
            } else {
                0.0
            },
            standard_error,
            win_rate: if self.hands_played > 0 {
                wins as f64 / self.hands_played as f64
            } else {
                0.0
            },
            average_bet: if self.hands_played > 0 {
                self.total_wagered / self.hands_played as f64
            } else {
                0.0
            },
            final_bankroll,
            max_drawdown: self.max_drawdown,
            outcome_counts: self.outcome_counts,
            by_true_count: self.by_true_count,
        }
    }
}

/// Post-run aggregate handed to reporting sinks.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub hands_played: u64,
    pub hands_skipped: u64,
    pub total_wagered: f64,
    pub net_profit: f64,
    pub ev_percent: f64,
    pub standard_error: f64,
    pub win_rate: f64,
    pub average_bet: f64,
    pub final_bankroll: f64,
    pub max_drawdown: f64,
    pub outcome_counts: BTreeMap<Outcome, u64>,
    pub by_true_count: BTreeMap<i32, BucketStats>,
}

impl SimulationResult {
    pub fn outcome_count(&self, outcome: Outcome) -> u64 {
        self.outcome_counts.get(&outcome).copied().unwrap_or(0)
    }
}
