pub mod betting;
pub mod card;
pub mod error;
pub mod hand;
pub mod simulation;
pub mod state;
pub mod strategy;

use serde::{Deserialize, Serialize};
use serde_enum_str::{Deserialize_enum_str, Serialize_enum_str};

pub use card::{Card, Rank, Suit};
pub use error::EngineError;
pub use hand::Hand;
pub use state::{CountSnapshot, StateManager};

/// A player action. The serialized form is the uppercased name exactly,
/// which is also the wire form used by trace records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_enum_str, Deserialize_enum_str)]
pub enum Action {
    #[serde(rename = "STAND")]
    Stand,
    #[serde(rename = "HIT")]
    Hit,
    #[serde(rename = "DOUBLE")]
    Double,
    #[serde(rename = "SPLIT")]
    Split,
    #[serde(rename = "SURRENDER")]
    Surrender,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Stand => "STAND",
            Action::Hit => "HIT",
            Action::Double => "DOUBLE",
            Action::Split => "SPLIT",
            Action::Surrender => "SURRENDER",
        }
    }
}

/// Hand classification used to key strategy tables and deviation indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_enum_str, Deserialize_enum_str)]
pub enum HandClass {
    #[serde(rename = "HARD")]
    Hard,
    #[serde(rename = "SOFT")]
    Soft,
    #[serde(rename = "PAIR")]
    Pair,
}

impl HandClass {
    /// One-letter tag used in composite lookup keys (`H_16:10`).
    pub fn tag(&self) -> char {
        match self {
            HandClass::Hard => 'H',
            HandClass::Soft => 'S',
            HandClass::Pair => 'P',
        }
    }
}

/// Which two-card totals may be doubled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_enum_str, Deserialize_enum_str)]
pub enum DoubleRestriction {
    AnyTwo,
    NineTenElevenOnly,
    TenElevenOnly,
}

impl DoubleRestriction {
    pub fn permits(&self, total: u8) -> bool {
        match self {
            DoubleRestriction::AnyTwo => true,
            DoubleRestriction::NineTenElevenOnly => (9..=11).contains(&total),
            DoubleRestriction::TenElevenOnly => (10..=11).contains(&total),
        }
    }
}

/// Table rules affecting strategy selection and edge. `max_splits`,
/// `resplit_aces` and `hit_split_aces` are carried for completeness but
/// the single-split driver never reads them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rules {
    pub num_decks: u8,
    pub penetration: f64,
    pub dealer_stands_soft_17: bool,
    pub double_after_split: bool,
    pub surrender_allowed: bool,
    pub double_restrictions: DoubleRestriction,
    pub blackjack_payout: f64,
    pub table_min: f64,
    pub table_max: f64,
    pub max_splits: u8,
    pub resplit_aces: bool,
    pub hit_split_aces: bool,
    pub dealer_peeks: bool,
}

pub const CARDS_PER_DECK: usize = 52;

impl Rules {
    pub fn total_cards(&self) -> usize {
        self.num_decks as usize * CARDS_PER_DECK
    }

    /// Number of cards dealt before the shuffle is due.
    pub fn cut_card_position(&self) -> usize {
        (self.total_cards() as f64 * self.penetration) as usize
    }

    /// Rejects rule bundles the engine cannot price: deck counts outside
    /// 1..=8, penetration outside (0, 1], non-positive or inverted table
    /// limits, payout at or below even money.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(1..=8).contains(&self.num_decks) {
            return Err(EngineError::InvalidRules(format!(
                "num_decks {} outside 1..=8",
                self.num_decks
            )));
        }
        if !(self.penetration > 0.0 && self.penetration <= 1.0) {
            return Err(EngineError::InvalidRules(format!(
                "penetration {} outside (0, 1]",
                self.penetration
            )));
        }
        if self.table_min <= 0.0 || self.table_max < self.table_min {
            return Err(EngineError::InvalidRules(format!(
                "table limits {}..{} are not an increasing positive range",
                self.table_min, self.table_max
            )));
        }
        if self.blackjack_payout <= 1.0 {
            return Err(EngineError::InvalidRules(format!(
                "blackjack payout {} must exceed even money",
                self.blackjack_payout
            )));
        }
        Ok(())
    }

    /// Six-deck S17 with DAS and late surrender, 3:2.
    pub fn vegas_strip() -> Rules {
        Rules {
            num_decks: 6,
            penetration: 0.75,
            dealer_stands_soft_17: true,
            double_after_split: true,
            surrender_allowed: true,
            double_restrictions: DoubleRestriction::AnyTwo,
            blackjack_payout: 1.5,
            table_min: 10.0,
            table_max: 1000.0,
            max_splits: 3,
            resplit_aces: false,
            hit_split_aces: false,
            dealer_peeks: true,
        }
    }

    /// Double-deck H17 without surrender.
    pub fn vegas_downtown() -> Rules {
        Rules {
            num_decks: 2,
            dealer_stands_soft_17: false,
            surrender_allowed: false,
            ..Rules::vegas_strip()
        }
    }

    /// Eight-deck S17 shoe game.
    pub fn atlantic_city() -> Rules {
        Rules {
            num_decks: 8,
            ..Rules::vegas_strip()
        }
    }
}

impl Default for Rules {
    fn default() -> Self {
        Rules::vegas_strip()
    }
}

impl std::fmt::Display for Rules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}D {} {} {} BJ {}:1",
            self.num_decks,
            if self.dealer_stands_soft_17 { "S17" } else { "H17" },
            if self.double_after_split { "DAS" } else { "NDAS" },
            if self.surrender_allowed { "LS" } else { "NS" },
            self.blackjack_payout,
        )
    }
}
