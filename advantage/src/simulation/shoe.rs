//! The dealing shoe. One seeded PRNG per shoe instance so that a driver
//! run is reproducible end to end; shuffling is the Fisher–Yates walk
//! provided by `SliceRandom`.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use strum::IntoEnumIterator;

use crate::card::{Card, Rank, Suit};
use crate::error::EngineError;
use crate::CARDS_PER_DECK;

#[derive(Debug)]
pub struct Shoe {
    cards: Vec<Card>,
    current_index: usize,
    rng: StdRng,
}

impl Shoe {
    /// Builds a shoe of `num_decks * 52` cards, shuffled with the given
    /// seed. Every rank/suit combination appears once per deck.
    pub fn new(num_decks: u8, seed: u64) -> Shoe {
        let mut cards = Vec::with_capacity(num_decks as usize * CARDS_PER_DECK);
        for _ in 0..num_decks {
            for suit in Suit::iter() {
                for rank in Rank::iter() {
                    cards.push(Card::new(rank, suit));
                }
            }
        }
        let mut shoe = Shoe {
            cards,
            current_index: 0,
            rng: StdRng::seed_from_u64(seed),
        };
        shoe.shuffle();
        shoe
    }

    /// Re-shuffles the full shoe and resets the pointer. The RNG stream
    /// continues; it is not reseeded.
    pub fn shuffle(&mut self) {
        self.cards.shuffle(&mut self.rng);
        self.current_index = 0;
    }

    /// Deals the next card. An empty shoe is a driver bug: the cut card
    /// check must reshuffle long before the last card.
    pub fn deal(&mut self) -> Result<Card, EngineError> {
        if self.current_index >= self.cards.len() {
            return Err(EngineError::EmptyShoe);
        }
        let card = self.cards[self.current_index];
        self.current_index += 1;
        Ok(card)
    }

    /// Advances the pointer without exposing the cards. Models burned
    /// cards on late entry; the state manager never observes them.
    pub fn burn(&mut self, n: usize) {
        self.current_index = (self.current_index + n).min(self.cards.len());
    }

    /// Pointer-based cut card check.
    pub fn needs_shuffle(&self, cut_penetration: f64) -> bool {
        let cut = (self.cards.len() as f64 * cut_penetration) as usize;
        self.current_index >= cut
    }

    pub fn cards_dealt(&self) -> usize {
        self.current_index
    }

    pub fn cards_remaining(&self) -> usize {
        self.cards.len() - self.current_index
    }

    pub fn total_cards(&self) -> usize {
        self.cards.len()
    }

    /// Uniform draw in `0..=max`, from the shoe's own RNG so the whole
    /// driver shares one seeded stream.
    pub fn random_burn_count(&mut self, max: usize) -> usize {
        use rand::Rng;
        if max == 0 {
            return 0;
        }
        self.rng.gen_range(0..=max)
    }
}
