//! Count-based deviations from baseline play. Deviations are data, not
//! code: the standard Illustrious 18 and Fab 4 sets load at startup and
//! a user-supplied JSON set goes through the same interface.

use std::collections::HashMap;

use serde::Deserialize;
use serde_enum_str::{Deserialize_enum_str, Serialize_enum_str};

use crate::hand::Hand;
use crate::{Action, Card, HandClass};

/// Which side of the threshold fires the deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_enum_str, Deserialize_enum_str)]
pub enum Direction {
    #[serde(rename = "AT_OR_ABOVE")]
    AtOrAbove,
    #[serde(rename = "BELOW")]
    Below,
}

/// The hand/dealer situation a deviation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    pub class: HandClass,
    pub value: u8,
    pub dealer_up: u8,
}

/// A single index play. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct Deviation {
    pub id: String,
    pub trigger: Trigger,
    pub threshold: f64,
    pub direction: Direction,
    pub action: Action,
    pub priority: i32,
}

impl Deviation {
    fn new(
        id: &str,
        class: HandClass,
        value: u8,
        dealer_up: u8,
        threshold: f64,
        direction: Direction,
        action: Action,
        priority: i32,
    ) -> Deviation {
        Deviation {
            id: id.to_string(),
            trigger: Trigger { class, value, dealer_up },
            threshold,
            direction,
            action,
            priority,
        }
    }

    /// True when the (margin-adjusted) true count satisfies the rule.
    pub fn is_triggered(&self, true_count: f64) -> bool {
        match self.direction {
            Direction::AtOrAbove => true_count >= self.threshold,
            Direction::Below => true_count < self.threshold,
        }
    }
}

/// On-wire form of a deviation record.
#[derive(Debug, Deserialize)]
struct RawDeviation {
    id: String,
    trigger: RawTrigger,
    rule: RawRule,
    #[serde(default)]
    priority: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct RawTrigger {
    #[serde(rename = "type")]
    class: HandClass,
    value: u8,
    dealer: u8,
}

#[derive(Debug, Deserialize)]
struct RawRule {
    threshold: f64,
    direction: Direction,
    action: Action,
}

/// Priority-indexed deviation collection.
pub struct DeviationIndex {
    deviations: Vec<Deviation>,
    // Composite key to positions in `deviations`, each bucket sorted by
    // descending priority so the first firing entry wins.
    index: HashMap<(HandClass, u8, u8), Vec<usize>>,
    skipped_on_load: usize,
}

impl DeviationIndex {
    pub fn new(deviations: Vec<Deviation>) -> DeviationIndex {
        let mut engine = DeviationIndex {
            deviations,
            index: HashMap::new(),
            skipped_on_load: 0,
        };
        engine.rebuild_index();
        engine
    }

    /// The Illustrious 18 playing deviations plus the Fab 4 surrenders.
    pub fn standard() -> DeviationIndex {
        let mut deviations = illustrious_18();
        deviations.extend(fab_four());
        DeviationIndex::new(deviations)
    }

    /// Loads a user-supplied set from the JSON list format. Malformed
    /// entries are skipped with a warning; the remainder is accepted.
    pub fn from_json(json: &str) -> Result<DeviationIndex, serde_json::Error> {
        let raw: Vec<serde_json::Value> = serde_json::from_str(json)?;
        let mut deviations = Vec::with_capacity(raw.len());
        let mut skipped = 0usize;
        for (i, value) in raw.into_iter().enumerate() {
            match serde_json::from_value::<RawDeviation>(value) {
                Ok(record) => deviations.push(Deviation {
                    id: record.id,
                    trigger: Trigger {
                        class: record.trigger.class,
                        value: record.trigger.value,
                        dealer_up: record.trigger.dealer,
                    },
                    threshold: record.rule.threshold,
                    direction: record.rule.direction,
                    action: record.rule.action,
                    priority: record.priority.unwrap_or(i as i32),
                }),
                Err(e) => {
                    eprintln!("warning: skipping malformed deviation at index {}: {}", i, e);
                    skipped += 1;
                }
            }
        }
        let mut engine = DeviationIndex::new(deviations);
        engine.skipped_on_load = skipped;
        Ok(engine)
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (pos, dev) in self.deviations.iter().enumerate() {
            let key = (dev.trigger.class, dev.trigger.value, dev.trigger.dealer_up);
            self.index.entry(key).or_default().push(pos);
        }
        for bucket in self.index.values_mut() {
            bucket.sort_by_key(|&pos| std::cmp::Reverse(self.deviations[pos].priority));
        }
    }

    /// Checks the index for this hand situation against the given true
    /// count. With `restrict_to_surrender`, only SURRENDER-resulting
    /// entries are considered; without it, SURRENDER entries are skipped
    /// (the engine handles them in its dedicated surrender step).
    pub fn check(
        &self,
        hand: &Hand,
        dealer_up: Card,
        true_count: f64,
        restrict_to_surrender: bool,
    ) -> Option<(Action, &str)> {
        let key = (
            hand.classification(),
            hand.class_value(),
            dealer_up.up_value(),
        );
        let bucket = self.index.get(&key)?;
        for &pos in bucket {
            let dev = &self.deviations[pos];
            if (dev.action == Action::Surrender) != restrict_to_surrender {
                continue;
            }
            if dev.is_triggered(true_count) {
                return Some((dev.action, dev.id.as_str()));
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.deviations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deviations.is_empty()
    }

    pub fn skipped_on_load(&self) -> usize {
        self.skipped_on_load
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.deviations.iter().map(|d| d.id.as_str())
    }
}

/// The Illustrious 18 playing deviations (Hi-Lo indices).
pub fn illustrious_18() -> Vec<Deviation> {
    use Action::*;
    use Direction::*;
    use HandClass::*;
    vec![
        Deviation::new("ILL_16v10", Hard, 16, 10, 0.0, AtOrAbove, Stand, 1),
        Deviation::new("ILL_15v10", Hard, 15, 10, 4.0, AtOrAbove, Stand, 2),
        Deviation::new("ILL_20vA", Pair, 10, 11, 6.0, AtOrAbove, Split, 3),
        Deviation::new("ILL_10v10", Hard, 10, 10, 4.0, AtOrAbove, Double, 4),
        Deviation::new("ILL_12v3", Hard, 12, 3, 2.0, AtOrAbove, Stand, 5),
        Deviation::new("ILL_12v2", Hard, 12, 2, 3.0, AtOrAbove, Stand, 6),
        Deviation::new("ILL_11vA", Hard, 11, 11, 1.0, AtOrAbove, Double, 7),
        Deviation::new("ILL_9v2", Hard, 9, 2, 1.0, AtOrAbove, Double, 8),
        Deviation::new("ILL_10vA", Hard, 10, 11, 4.0, AtOrAbove, Double, 9),
        Deviation::new("ILL_9v7", Hard, 9, 7, 3.0, AtOrAbove, Double, 10),
        Deviation::new("ILL_16v9", Hard, 16, 9, 5.0, AtOrAbove, Stand, 11),
        Deviation::new("ILL_13v2", Hard, 13, 2, -1.0, Below, Hit, 12),
        Deviation::new("ILL_12v4", Hard, 12, 4, 0.0, Below, Hit, 13),
        Deviation::new("ILL_12v5", Hard, 12, 5, -2.0, Below, Hit, 14),
        Deviation::new("ILL_12v6", Hard, 12, 6, -1.0, Below, Hit, 15),
        Deviation::new("ILL_13v3", Hard, 13, 3, -2.0, Below, Hit, 16),
    ]
}

/// The Fab 4 surrender deviations.
pub fn fab_four() -> Vec<Deviation> {
    use Action::Surrender;
    use Direction::AtOrAbove;
    use HandClass::Hard;
    vec![
        Deviation::new("FAB_15v10", Hard, 15, 10, 0.0, AtOrAbove, Surrender, 100),
        Deviation::new("FAB_15vA", Hard, 15, 11, 1.0, AtOrAbove, Surrender, 101),
        Deviation::new("FAB_14v10", Hard, 14, 10, 3.0, AtOrAbove, Surrender, 102),
        Deviation::new("FAB_15v9", Hard, 15, 9, 2.0, AtOrAbove, Surrender, 103),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Rank, Suit};

    fn hand2(a: Rank, b: Rank) -> Hand {
        Hand::new(Card::new(a, Suit::Spades), Card::new(b, Suit::Hearts)).unwrap()
    }

    fn up(rank: Rank) -> Card {
        Card::new(rank, Suit::Diamonds)
    }

    #[test]
    fn standard_set_has_stable_ids() {
        let index = DeviationIndex::standard();
        assert_eq!(index.len(), 20);
        let ids: Vec<&str> = index.ids().collect();
        assert!(ids.contains(&"ILL_16v10"));
        assert!(ids.contains(&"FAB_15v10"));
    }

    #[test]
    fn sixteen_v_ten_fires_at_zero_not_below() {
        let index = DeviationIndex::standard();
        let hand = hand2(Rank::Ten, Rank::Six);

        let fired = index.check(&hand, up(Rank::Ten), 0.0, false);
        assert_eq!(fired, Some((Action::Stand, "ILL_16v10")));
        assert_eq!(index.check(&hand, up(Rank::Ten), -0.01, false), None);
    }

    #[test]
    fn below_deviations_fire_under_threshold() {
        let index = DeviationIndex::standard();
        let hand = hand2(Rank::Ten, Rank::Three);

        // 13 v 2 hits below -1.
        assert_eq!(index.check(&hand, up(Rank::Two), -1.5, false), Some((Action::Hit, "ILL_13v2")));
        assert_eq!(index.check(&hand, up(Rank::Two), -1.0, false), None);
        assert_eq!(index.check(&hand, up(Rank::Two), 2.0, false), None);
    }

    #[test]
    fn surrender_restriction_partitions_the_index() {
        let index = DeviationIndex::standard();
        let fifteen = hand2(Rank::Ten, Rank::Five);

        // 15 v 10 at TC 0: surrender-only sees FAB_15v10, the general
        // pass skips it; ILL_15v10 needs TC 4.
        assert_eq!(
            index.check(&fifteen, up(Rank::Ten), 0.0, true),
            Some((Action::Surrender, "FAB_15v10"))
        );
        assert_eq!(index.check(&fifteen, up(Rank::Ten), 0.0, false), None);
        assert_eq!(
            index.check(&fifteen, up(Rank::Ten), 4.0, false),
            Some((Action::Stand, "ILL_15v10"))
        );
    }

    #[test]
    fn pair_trigger_uses_pair_value() {
        let index = DeviationIndex::standard();
        let tens = hand2(Rank::Ten, Rank::Ten);
        assert_eq!(
            index.check(&tens, up(Rank::Ace), 6.0, false),
            Some((Action::Split, "ILL_20vA"))
        );
        // Hard 20 built from other cards does not match the pair trigger.
        let twenty = hand2(Rank::Ten, Rank::Six).add_card(Card::new(Rank::Four, Suit::Clubs)).unwrap();
        assert_eq!(index.check(&twenty, up(Rank::Ace), 6.0, false), None);
    }

    #[test]
    fn priority_orders_same_key_entries() {
        let mut deviations = illustrious_18();
        deviations.push(Deviation::new(
            "CUSTOM_16v10",
            HandClass::Hard,
            16,
            10,
            0.0,
            Direction::AtOrAbove,
            Action::Surrender,
            50,
        ));
        let index = DeviationIndex::new(deviations);
        let hand = hand2(Rank::Ten, Rank::Six);

        // The custom surrender outranks ILL_16v10 in its own lane and
        // never leaks into the general pass.
        assert_eq!(
            index.check(&hand, up(Rank::Ten), 0.0, true),
            Some((Action::Surrender, "CUSTOM_16v10"))
        );
        assert_eq!(
            index.check(&hand, up(Rank::Ten), 0.0, false),
            Some((Action::Stand, "ILL_16v10"))
        );
    }

    #[test]
    fn malformed_json_entries_are_skipped() {
        let json = r#"[
            {"id": "OK_12v4", "trigger": {"type": "HARD", "value": 12, "dealer": 4},
             "rule": {"threshold": 0.0, "direction": "BELOW", "action": "HIT"}},
            {"id": "BROKEN", "trigger": {"type": "HARD", "value": 12}},
            {"id": "BAD_DIR", "trigger": {"type": "HARD", "value": 12, "dealer": 5},
             "rule": {"threshold": 0.0, "direction": "SIDEWAYS", "action": "HIT"}}
        ]"#;
        let index = DeviationIndex::from_json(json).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.skipped_on_load(), 2);
        assert_eq!(index.ids().next(), Some("OK_12v4"));
    }
}
