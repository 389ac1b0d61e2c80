use crate::card::Card;
use crate::error::EngineError;
use crate::HandClass;

/// A player or dealer hand. The total, softness and pair flags are fixed
/// at construction; adding a card produces a new hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hand {
    cards: Vec<Card>,
    total: u8,
    is_soft: bool,
    is_pair: bool,
}

impl Hand {
    /// Builds a hand from dealt cards. Aces start at 11 and are reduced
    /// to 1 one at a time while the total would bust.
    ///
    /// Rejects hands that cannot occur at a table: fewer than two cards,
    /// or a total outside [2, 31].
    pub fn from_cards(cards: Vec<Card>) -> Result<Hand, EngineError> {
        if cards.len() < 2 {
            return Err(EngineError::InvalidHand(format!(
                "hand needs at least two cards, got {}",
                cards.len()
            )));
        }

        let mut total: u16 = cards.iter().map(|c| c.value() as u16).sum();
        let mut aces_as_eleven = cards.iter().filter(|c| c.is_ace()).count();
        while total > 21 && aces_as_eleven > 0 {
            total -= 10;
            aces_as_eleven -= 1;
        }
        let is_soft = aces_as_eleven > 0 && total <= 21;
        let is_pair = cards.len() == 2 && cards[0].rank == cards[1].rank;

        if !(2..=31).contains(&total) {
            return Err(EngineError::InvalidHand(format!(
                "hand total {} outside [2, 31]",
                total
            )));
        }

        Ok(Hand {
            cards,
            total: total as u8,
            is_soft,
            is_pair,
        })
    }

    pub fn new(first: Card, second: Card) -> Result<Hand, EngineError> {
        Hand::from_cards(vec![first, second])
    }

    /// Returns a new hand with one more card.
    pub fn add_card(&self, card: Card) -> Result<Hand, EngineError> {
        let mut cards = self.cards.clone();
        cards.push(card);
        Hand::from_cards(cards)
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn num_cards(&self) -> usize {
        self.cards.len()
    }

    pub fn total(&self) -> u8 {
        self.total
    }

    pub fn is_soft(&self) -> bool {
        self.is_soft
    }

    pub fn is_pair(&self) -> bool {
        self.is_pair
    }

    /// Classification for strategy lookup. Pair wins over soft so that
    /// A,A classifies as a pair, not a soft 12.
    pub fn classification(&self) -> HandClass {
        if self.is_pair {
            HandClass::Pair
        } else if self.is_soft {
            HandClass::Soft
        } else {
            HandClass::Hard
        }
    }

    /// Value used for pair lookups: the single-card value, Aces as 11.
    /// Callers must check `is_pair` first.
    pub fn pair_value(&self) -> u8 {
        debug_assert!(self.is_pair);
        self.cards[0].value()
    }

    /// Value keyed by classification: pair value for pairs, total otherwise.
    pub fn class_value(&self) -> u8 {
        if self.is_pair {
            self.pair_value()
        } else {
            self.total
        }
    }

    pub fn is_blackjack(&self) -> bool {
        self.cards.len() == 2 && self.total == 21
    }

    pub fn is_busted(&self) -> bool {
        self.total > 21
    }
}

impl std::fmt::Display for Hand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, card) in self.cards.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", card)?;
        }
        write!(f, " = {}{}", self.total, if self.is_soft { " (soft)" } else { "" })
    }
}
