use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;

/// Represents a card rank. The discriminant is the face value, with the
/// court cards and Ace above 10 so that every rank stays distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum Rank {
    Two = 2,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    /// Blackjack point value: 2-10 face value, court cards 10, Ace 11
    /// before any soft adjustment.
    pub fn blackjack_value(&self) -> u8 {
        match self {
            Rank::Jack | Rank::Queen | Rank::King => 10,
            Rank::Ace => 11,
            other => *other as u8,
        }
    }

    /// Hi-Lo counting tag: +1 for 2-6, 0 for 7-9, -1 for tens and Aces.
    pub fn hilo_tag(&self) -> i32 {
        match self.blackjack_value() {
            2..=6 => 1,
            7..=9 => 0,
            _ => -1,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Rank::Two => '2',
            Rank::Three => '3',
            Rank::Four => '4',
            Rank::Five => '5',
            Rank::Six => '6',
            Rank::Seven => '7',
            Rank::Eight => '8',
            Rank::Nine => '9',
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
            Rank::Ace => 'A',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum Suit {
    Diamonds,
    Clubs,
    Hearts,
    Spades,
}

impl Suit {
    pub fn symbol(&self) -> char {
        match self {
            Suit::Diamonds => 'D',
            Suit::Clubs => 'C',
            Suit::Hearts => 'H',
            Suit::Spades => 'S',
        }
    }
}

/// Represents a card in the real world with a rank and a suit.
/// Cheap to copy and hashable so it can key observation tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Card {
        Card { rank, suit }
    }

    /// Blackjack point value of this card (Ace counted as 11 here; the
    /// soft reduction belongs to `Hand`).
    pub fn value(&self) -> u8 {
        self.rank.blackjack_value()
    }

    pub fn hilo_tag(&self) -> i32 {
        self.rank.hilo_tag()
    }

    pub fn is_ace(&self) -> bool {
        self.rank == Rank::Ace
    }

    pub fn is_ten_value(&self) -> bool {
        self.rank.blackjack_value() == 10
    }

    /// Dealer up-card value used by strategy keys, 2..=11 with Ace at 11.
    pub fn up_value(&self) -> u8 {
        self.rank.blackjack_value()
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.rank.symbol(), self.suit.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn blackjack_values_match_rank() {
        assert_eq!(Card::new(Rank::Two, Suit::Spades).value(), 2);
        assert_eq!(Card::new(Rank::Nine, Suit::Hearts).value(), 9);
        assert_eq!(Card::new(Rank::Ten, Suit::Clubs).value(), 10);
        assert_eq!(Card::new(Rank::Jack, Suit::Clubs).value(), 10);
        assert_eq!(Card::new(Rank::Queen, Suit::Diamonds).value(), 10);
        assert_eq!(Card::new(Rank::King, Suit::Spades).value(), 10);
        assert_eq!(Card::new(Rank::Ace, Suit::Spades).value(), 11);
    }

    #[test]
    fn hilo_tags_cover_every_rank() {
        for rank in Rank::iter() {
            let tag = rank.hilo_tag();
            assert!(tag >= -1 && tag <= 1);
            match rank.blackjack_value() {
                2..=6 => assert_eq!(tag, 1),
                7..=9 => assert_eq!(tag, 0),
                _ => assert_eq!(tag, -1),
            }
        }
    }

    #[test]
    fn full_deck_tags_sum_to_zero() {
        let mut sum = 0;
        for suit in Suit::iter() {
            for rank in Rank::iter() {
                sum += Card::new(rank, suit).hilo_tag();
            }
        }
        assert_eq!(sum, 0);
    }

    #[test]
    fn display_renders_rank_then_suit() {
        let card = Card::new(Rank::Ten, Suit::Spades);
        assert_eq!(card.to_string(), "TS");
        assert_eq!(Card::new(Rank::Ace, Suit::Diamonds).to_string(), "AD");
    }
}
