//! Built-in baseline table bundles. Two charts ship with the engine:
//! six-deck S17 DAS and six-deck H17 DAS. Both are plain data in the
//! bundle format, so external bundles loaded from JSON go through the
//! exact same parsing path.

use std::collections::HashMap;

use super::lookup::{BundleMetadata, StrategyBundle, StrategyTable};

/// Dealer up-card columns, left to right: 2 through 10, then Ace.
const DEALER_UPS: [u8; 10] = [2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

fn insert_row(tables: &mut HashMap<String, String>, key_prefix: &str, row: [&str; 10]) {
    for (dealer, token) in DEALER_UPS.iter().zip(row.iter()) {
        tables.insert(format!("{}:{:02}", key_prefix, dealer), token.to_string());
    }
}

fn hard_row(tables: &mut HashMap<String, String>, total: u8, row: [&str; 10]) {
    insert_row(tables, &format!("H_{}", total), row);
}

fn soft_row(tables: &mut HashMap<String, String>, total: u8, row: [&str; 10]) {
    insert_row(tables, &format!("S_{}", total), row);
}

fn pair_row(tables: &mut HashMap<String, String>, value: u8, row: [&str; 10]) {
    insert_row(tables, &format!("P_{:02}", value), row);
}

fn s17_das_tables() -> HashMap<String, String> {
    let mut t = HashMap::new();

    // Hard totals. Surrender is left to the deviation layer, so the
    // stiff rows carry HIT against big cards rather than Rh.
    hard_row(&mut t, 5, ["HIT"; 10]);
    hard_row(&mut t, 6, ["HIT"; 10]);
    hard_row(&mut t, 7, ["HIT"; 10]);
    hard_row(&mut t, 8, ["HIT"; 10]);
    hard_row(&mut t, 9, ["HIT", "Dh", "Dh", "Dh", "Dh", "HIT", "HIT", "HIT", "HIT", "HIT"]);
    hard_row(&mut t, 10, ["Dh", "Dh", "Dh", "Dh", "Dh", "Dh", "Dh", "Dh", "HIT", "HIT"]);
    hard_row(&mut t, 11, ["Dh"; 10]);
    hard_row(&mut t, 12, ["HIT", "HIT", "STAND", "STAND", "STAND", "HIT", "HIT", "HIT", "HIT", "HIT"]);
    for total in 13..=16 {
        hard_row(&mut t, total, ["STAND", "STAND", "STAND", "STAND", "STAND", "HIT", "HIT", "HIT", "HIT", "HIT"]);
    }
    for total in 17..=21 {
        hard_row(&mut t, total, ["STAND"; 10]);
    }

    // Soft totals.
    soft_row(&mut t, 13, ["HIT", "HIT", "HIT", "Dh", "Dh", "HIT", "HIT", "HIT", "HIT", "HIT"]);
    soft_row(&mut t, 14, ["HIT", "HIT", "HIT", "Dh", "Dh", "HIT", "HIT", "HIT", "HIT", "HIT"]);
    soft_row(&mut t, 15, ["HIT", "HIT", "Dh", "Dh", "Dh", "HIT", "HIT", "HIT", "HIT", "HIT"]);
    soft_row(&mut t, 16, ["HIT", "HIT", "Dh", "Dh", "Dh", "HIT", "HIT", "HIT", "HIT", "HIT"]);
    soft_row(&mut t, 17, ["HIT", "Dh", "Dh", "Dh", "Dh", "HIT", "HIT", "HIT", "HIT", "HIT"]);
    soft_row(&mut t, 18, ["Ds", "Ds", "Ds", "Ds", "Ds", "STAND", "STAND", "HIT", "HIT", "HIT"]);
    soft_row(&mut t, 19, ["STAND", "STAND", "STAND", "STAND", "Ds", "STAND", "STAND", "STAND", "STAND", "STAND"]);
    soft_row(&mut t, 20, ["STAND"; 10]);
    soft_row(&mut t, 21, ["STAND"; 10]);

    // Pairs. The 2s/3s against small cards and 4s/6s edge columns are
    // only worth splitting when the split hands can still double.
    pair_row(&mut t, 2, ["Ph", "Ph", "SPLIT", "SPLIT", "SPLIT", "SPLIT", "HIT", "HIT", "HIT", "HIT"]);
    pair_row(&mut t, 3, ["Ph", "Ph", "SPLIT", "SPLIT", "SPLIT", "SPLIT", "HIT", "HIT", "HIT", "HIT"]);
    pair_row(&mut t, 4, ["HIT", "HIT", "HIT", "Ph", "Ph", "HIT", "HIT", "HIT", "HIT", "HIT"]);
    pair_row(&mut t, 5, ["Dh", "Dh", "Dh", "Dh", "Dh", "Dh", "Dh", "Dh", "HIT", "HIT"]);
    pair_row(&mut t, 6, ["Ph", "SPLIT", "SPLIT", "SPLIT", "SPLIT", "HIT", "HIT", "HIT", "HIT", "HIT"]);
    pair_row(&mut t, 7, ["SPLIT", "SPLIT", "SPLIT", "SPLIT", "SPLIT", "SPLIT", "HIT", "HIT", "HIT", "HIT"]);
    pair_row(&mut t, 8, ["SPLIT"; 10]);
    pair_row(&mut t, 9, ["SPLIT", "SPLIT", "SPLIT", "SPLIT", "SPLIT", "STAND", "SPLIT", "SPLIT", "STAND", "STAND"]);
    pair_row(&mut t, 10, ["STAND"; 10]);
    pair_row(&mut t, 11, ["SPLIT"; 10]);

    t
}

/// Six-deck, dealer stands on soft 17, double after split allowed.
pub fn s17_das_bundle() -> StrategyBundle {
    StrategyBundle {
        metadata: BundleMetadata {
            rules: "S17_DAS_6D".to_string(),
            description: "6-deck, dealer stands on soft 17, double after split allowed".to_string(),
        },
        tables: s17_das_tables(),
    }
}

/// Six-deck, dealer hits soft 17, double after split allowed. Starts
/// from the S17 chart and applies the H17-specific plays: surrender
/// hard 17 and hard 15 against the Ace, double soft 18 against 2.
pub fn h17_das_bundle() -> StrategyBundle {
    let mut tables = s17_das_tables();
    tables.insert("H_17:11".to_string(), "Rs".to_string());
    tables.insert("H_15:11".to_string(), "Rh".to_string());
    tables.insert("S_18:02".to_string(), "Dh".to_string());
    StrategyBundle {
        metadata: BundleMetadata {
            rules: "H17_DAS_6D".to_string(),
            description: "6-deck, dealer hits soft 17, double after split allowed".to_string(),
        },
        tables,
    }
}

pub fn s17_das_table() -> StrategyTable {
    StrategyTable::from_bundle(&s17_das_bundle()).expect("built-in S17 bundle must parse")
}

pub fn h17_das_table() -> StrategyTable {
    StrategyTable::from_bundle(&h17_das_bundle()).expect("built-in H17 bundle must parse")
}

/// Picks the built-in table matching the soft-17 rule.
pub fn builtin_table_for(dealer_stands_soft_17: bool) -> StrategyTable {
    if dealer_stands_soft_17 {
        s17_das_table()
    } else {
        h17_das_table()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Card, Rank, Suit};
    use crate::hand::Hand;
    use crate::{Action, Rules};

    fn hand2(a: Rank, b: Rank) -> Hand {
        Hand::new(Card::new(a, Suit::Spades), Card::new(b, Suit::Hearts)).unwrap()
    }

    fn up(rank: Rank) -> Card {
        Card::new(rank, Suit::Diamonds)
    }

    #[test]
    fn bundles_parse_and_cover_all_rows() {
        let s17 = s17_das_table();
        let h17 = h17_das_table();
        // 17 hard rows + 9 soft rows + 10 pair rows, 10 dealer columns each.
        assert_eq!(s17.len(), 360);
        assert_eq!(h17.len(), 360);
        assert_eq!(s17.rule_tag(), "S17_DAS_6D");
        assert_eq!(h17.rule_tag(), "H17_DAS_6D");
    }

    #[test]
    fn s17_core_plays() {
        let table = s17_das_table();
        let rules = Rules::vegas_strip();
        assert_eq!(table.lookup(&hand2(Rank::Ten, Rank::Seven), up(Rank::Ten), &rules), Some(Action::Stand));
        assert_eq!(table.lookup(&hand2(Rank::Ten, Rank::Six), up(Rank::Ten), &rules), Some(Action::Hit));
        assert_eq!(table.lookup(&hand2(Rank::Eight, Rank::Eight), up(Rank::Ten), &rules), Some(Action::Split));
        assert_eq!(table.lookup(&hand2(Rank::Ace, Rank::Ace), up(Rank::Ten), &rules), Some(Action::Split));
        assert_eq!(table.lookup(&hand2(Rank::Six, Rank::Five), up(Rank::Ace), &rules), Some(Action::Double));
        assert_eq!(table.lookup(&hand2(Rank::Five, Rank::Five), up(Rank::Six), &rules), Some(Action::Double));
        assert_eq!(table.lookup(&hand2(Rank::Ace, Rank::Seven), up(Rank::Three), &rules), Some(Action::Double));
        assert_eq!(table.lookup(&hand2(Rank::Ace, Rank::Seven), up(Rank::Nine), &rules), Some(Action::Hit));
        assert_eq!(table.lookup(&hand2(Rank::Nine, Rank::Nine), up(Rank::Seven), &rules), Some(Action::Stand));
        assert_eq!(table.lookup(&hand2(Rank::Ten, Rank::Ten), up(Rank::Six), &rules), Some(Action::Stand));
    }

    #[test]
    fn h17_diverges_only_where_documented() {
        let mut rules = Rules::vegas_strip();
        rules.dealer_stands_soft_17 = false;
        let h17 = h17_das_table();

        assert_eq!(h17.lookup(&hand2(Rank::Ten, Rank::Seven), up(Rank::Ace), &rules), Some(Action::Surrender));
        assert_eq!(h17.lookup(&hand2(Rank::Ten, Rank::Five), up(Rank::Ace), &rules), Some(Action::Surrender));
        assert_eq!(h17.lookup(&hand2(Rank::Ace, Rank::Seven), up(Rank::Two), &rules), Some(Action::Double));

        // Everything else matches the S17 chart.
        let s17 = s17_das_table();
        assert_eq!(
            s17.lookup(&hand2(Rank::Ten, Rank::Six), up(Rank::Ten), &rules),
            h17.lookup(&hand2(Rank::Ten, Rank::Six), up(Rank::Ten), &rules)
        );
    }

    #[test]
    fn s17_has_no_surrender_tokens() {
        let table = s17_das_table();
        let rules = Rules::vegas_strip();
        for total in [14u8, 15, 16] {
            let hand = match total {
                14 => hand2(Rank::Ten, Rank::Four),
                15 => hand2(Rank::Ten, Rank::Five),
                _ => hand2(Rank::Ten, Rank::Six),
            };
            for dealer in [Rank::Nine, Rank::Ten, Rank::Ace] {
                assert_ne!(
                    table.lookup(&hand, up(dealer), &rules),
                    Some(Action::Surrender),
                    "baseline surrender belongs to the deviation layer"
                );
            }
        }
    }
}
