//! Counting state. Observes physically revealed cards and derives the
//! running count, true count and shoe penetration. Knows nothing about
//! roles: callers observe dealer hole cards at the moment they are shown.

use crate::card::Card;
use crate::{Rules, CARDS_PER_DECK};

/// Decks-remaining floor. Keeps the true-count ratio from diverging at
/// the very back of the shoe.
const MIN_DECKS_REMAINING: f64 = 0.5;

/// Immutable snapshot of the count state, passed by value everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountSnapshot {
    pub running_count: i32,
    pub cards_seen: usize,
    pub cards_remaining: usize,
    pub decks_remaining: f64,
    pub true_count: f64,
    pub penetration: f64,
}

/// Hi-Lo state manager. The running count reflects only cards passed to
/// `observe`, never cards inferred or predicted.
#[derive(Debug, Clone)]
pub struct StateManager {
    total_cards: usize,
    running_count: i32,
    cards_seen: usize,
    // Observed tally bucketed by point value: index 0 is value 2, index 9
    // is the Ace bucket (value 11). Tens collapse into one bucket.
    observed_by_value: [usize; 10],
}

impl StateManager {
    pub fn new(rules: &Rules) -> StateManager {
        StateManager {
            total_cards: rules.total_cards(),
            running_count: 0,
            cards_seen: 0,
            observed_by_value: [0; 10],
        }
    }

    /// Counts one revealed card. Must be called exactly once per card
    /// physically shown, and never for burned cards.
    pub fn observe(&mut self, card: Card) {
        self.running_count += card.hilo_tag();
        self.cards_seen += 1;
        self.observed_by_value[(card.value() - 2) as usize] += 1;
    }

    pub fn observe_many(&mut self, cards: &[Card]) {
        for card in cards {
            self.observe(*card);
        }
    }

    pub fn snapshot(&self) -> CountSnapshot {
        let cards_remaining = self.total_cards.saturating_sub(self.cards_seen);
        let decks_remaining =
            (cards_remaining as f64 / CARDS_PER_DECK as f64).max(MIN_DECKS_REMAINING);
        CountSnapshot {
            running_count: self.running_count,
            cards_seen: self.cards_seen,
            cards_remaining,
            decks_remaining,
            true_count: self.running_count as f64 / decks_remaining,
            penetration: self.cards_seen as f64 / self.total_cards as f64,
        }
    }

    /// Starts a fresh count. A non-zero `burn_count` models late entry:
    /// the player has seen none of the burned cards (running count stays
    /// zero) but the shoe is honestly depleted for true-count purposes.
    pub fn reset(&mut self, burn_count: usize) {
        self.running_count = 0;
        self.cards_seen = burn_count;
        self.observed_by_value = [0; 10];
    }

    pub fn running_count(&self) -> i32 {
        self.running_count
    }

    pub fn cards_seen(&self) -> usize {
        self.cards_seen
    }

    /// True once the cut card position for the given rules has passed.
    pub fn is_shuffle_due(&self, rules: &Rules) -> bool {
        self.cards_seen >= rules.cut_card_position()
    }

    /// Remaining cards per point value (2..=11, tens collapsed, Aces at
    /// 11), derived from the fresh-shoe composition minus the observed
    /// tally. Input to the exact effect-of-removal estimator only.
    pub fn remaining_by_value(&self) -> [usize; 10] {
        let num_decks = self.total_cards / CARDS_PER_DECK;
        let per_rank = 4 * num_decks;
        let mut remaining = [0usize; 10];
        for (i, slot) in remaining.iter_mut().enumerate() {
            // Bucket 10 (index 8) holds four ranks: T, J, Q, K.
            let fresh = if i == 8 { 4 * per_rank } else { per_rank };
            *slot = fresh.saturating_sub(self.observed_by_value[i]);
        }
        remaining
    }
}
