//! Baseline strategy lookup. Tables are data: a bundle maps composite
//! string keys (`H_16:10`, `S_18:09`, `P_08:10`) to action tokens, where
//! a token is either a direct action or a conditional pair resolved
//! against the table rules at lookup time.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::hand::Hand;
use crate::{Action, Card, HandClass, Rules};

/// A resolved table entry. Conditional entries carry the fallback that
/// applies when the primary action is not legal under the current rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineAction {
    Direct(Action),
    Conditional { primary: Action, fallback: Action },
}

impl BaselineAction {
    /// Parses an action token. Direct tokens are the uppercase action
    /// names; conditional tokens are the two-letter chart shorthands.
    pub fn parse(token: &str) -> Option<BaselineAction> {
        let conditional = |primary, fallback| Some(BaselineAction::Conditional { primary, fallback });
        match token {
            "Dh" => conditional(Action::Double, Action::Hit),
            "Ds" => conditional(Action::Double, Action::Stand),
            "Rh" => conditional(Action::Surrender, Action::Hit),
            "Rs" => conditional(Action::Surrender, Action::Stand),
            "Rp" => conditional(Action::Surrender, Action::Split),
            "Ph" => conditional(Action::Split, Action::Hit),
            "Pd" => conditional(Action::Split, Action::Double),
            direct => direct.parse::<Action>().ok().map(BaselineAction::Direct),
        }
    }

    /// Resolves the entry to a concrete action for this hand under these
    /// rules. The engine applies its own degradation pass afterwards, so
    /// a single level of fallback is enough here.
    pub fn resolve(&self, hand: &Hand, rules: &Rules) -> Action {
        match *self {
            BaselineAction::Direct(action) => action,
            BaselineAction::Conditional { primary, fallback } => {
                let legal = match primary {
                    Action::Double => {
                        hand.num_cards() == 2 && rules.double_restrictions.permits(hand.total())
                    }
                    Action::Surrender => rules.surrender_allowed && hand.num_cards() == 2,
                    // Ph / Pd: the split is worth taking only when the
                    // new hands can still be doubled.
                    Action::Split => rules.double_after_split,
                    _ => true,
                };
                if legal {
                    primary
                } else {
                    fallback
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BundleMetadata {
    pub rules: String,
    pub description: String,
}

/// On-disk form of a strategy table: metadata plus the raw token map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyBundle {
    pub metadata: BundleMetadata,
    pub tables: HashMap<String, String>,
}

impl StrategyBundle {
    pub fn from_json(json: &str) -> Result<StrategyBundle, EngineError> {
        serde_json::from_str(json).map_err(|e| EngineError::MalformedBundle(e.to_string()))
    }
}

/// O(1) baseline lookup over a parsed bundle.
pub struct StrategyTable {
    entries: HashMap<String, BaselineAction>,
    rule_tag: String,
    // Missing keys are reported once each; the driver loop would
    // otherwise repeat the same warning thousands of times per run.
    warned_missing: Mutex<std::collections::BTreeSet<String>>,
}

impl StrategyTable {
    /// Parses every token in the bundle. An unknown token rejects the
    /// whole bundle: a chart that cannot be read must not be half-used.
    pub fn from_bundle(bundle: &StrategyBundle) -> Result<StrategyTable, EngineError> {
        let mut entries = HashMap::with_capacity(bundle.tables.len());
        for (key, token) in &bundle.tables {
            let parsed =
                BaselineAction::parse(token).ok_or_else(|| EngineError::UnknownActionToken {
                    key: key.clone(),
                    token: token.clone(),
                })?;
            entries.insert(key.clone(), parsed);
        }
        Ok(StrategyTable {
            entries,
            rule_tag: bundle.metadata.rules.clone(),
            warned_missing: Mutex::new(std::collections::BTreeSet::new()),
        })
    }

    pub fn rule_tag(&self) -> &str {
        &self.rule_tag
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Primary key: dealer value always two digits, pair values two
    /// digits, hard/soft totals unpadded.
    pub fn key(hand: &Hand, dealer_up: Card) -> String {
        let class = hand.classification();
        let dealer = dealer_up.up_value();
        match class {
            HandClass::Pair => format!("{}_{:02}:{:02}", class.tag(), hand.pair_value(), dealer),
            _ => format!("{}_{}:{:02}", class.tag(), hand.total(), dealer),
        }
    }

    /// Fallback key with no padding anywhere, accepted for compatibility
    /// with hand-edited bundles.
    fn alt_key(hand: &Hand, dealer_up: Card) -> String {
        format!(
            "{}_{}:{}",
            hand.classification().tag(),
            hand.class_value(),
            dealer_up.up_value()
        )
    }

    /// Looks up the rule-resolved baseline action, or `None` when the
    /// bundle has no entry under either key form.
    pub fn lookup(&self, hand: &Hand, dealer_up: Card, rules: &Rules) -> Option<Action> {
        let key = Self::key(hand, dealer_up);
        let entry = self
            .entries
            .get(&key)
            .or_else(|| self.entries.get(&Self::alt_key(hand, dealer_up)));
        match entry {
            Some(baseline) => Some(baseline.resolve(hand, rules)),
            None => {
                if let Ok(mut warned) = self.warned_missing.lock() {
                    if warned.insert(key.clone()) {
                        eprintln!(
                            "warning: strategy table {} has no entry for {}, using default chart",
                            self.rule_tag, key
                        );
                    }
                }
                None
            }
        }
    }
}

/// Hand-coded default chart. Covers every reachable total so the engine
/// can always answer when a bundle entry is missing.
pub fn default_chart_action(hand: &Hand, dealer_up: Card) -> Action {
    let dealer = dealer_up.up_value();
    let total = hand.total();
    let two_cards = hand.num_cards() == 2;

    if hand.is_soft() {
        return match total {
            19..=21 => Action::Stand,
            18 if dealer >= 9 => Action::Hit,
            18 => Action::Stand,
            _ => Action::Hit,
        };
    }

    match total {
        17..=21 => Action::Stand,
        13..=16 if dealer <= 6 => Action::Stand,
        12 if (4..=6).contains(&dealer) => Action::Stand,
        11 if two_cards => Action::Double,
        10 if dealer <= 9 && two_cards => Action::Double,
        9 if (3..=6).contains(&dealer) && two_cards => Action::Double,
        _ => Action::Hit,
    }
}
