use advantage;
use serde::{Deserialize, Serialize};
use std::fs;

/// Driver configuration document. One rules block, one betting block,
/// one simulator block and any number of ablation entries to run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub rule: ConfigRule,
    pub betting: ConfigBetting,
    pub simulator: ConfigSimulator,
    #[serde(default)]
    pub ablations: Vec<ConfigAblation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigRule {
    pub num_decks: u8,
    pub penetration: f64,
    pub dealer_stands_soft_17: bool,
    pub double_after_split: bool,
    pub surrender_allowed: bool,
    pub double_restrictions: String,
    pub blackjack_payout: f64,
    pub table_min: f64,
    pub table_max: f64,
    pub max_splits: u8,
    pub resplit_aces: bool,
    pub hit_split_aces: bool,
    pub dealer_peeks: bool,
}

impl TryInto<advantage::Rules> for ConfigRule {
    type Error = serde::de::value::Error;

    fn try_into(self) -> Result<advantage::Rules, Self::Error> {
        let rules = advantage::Rules {
            num_decks: self.num_decks,
            penetration: self.penetration,
            dealer_stands_soft_17: self.dealer_stands_soft_17,
            double_after_split: self.double_after_split,
            surrender_allowed: self.surrender_allowed,
            double_restrictions: self.double_restrictions.parse()?,
            blackjack_payout: self.blackjack_payout,
            table_min: self.table_min,
            table_max: self.table_max,
            max_splits: self.max_splits,
            resplit_aces: self.resplit_aces,
            hit_split_aces: self.hit_split_aces,
            dealer_peeks: self.dealer_peeks,
        };

        Ok(rules)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigBetting {
    pub kelly_fraction: f64,
    pub max_spread: f64,
    pub max_betting_penetration: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSimulator {
    pub hands: u64,
    pub seed: u64,
    pub starting_bankroll: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigAblation {
    pub config_id: String,
    #[serde(default = "default_true")]
    pub use_counting: bool,
    #[serde(default = "default_true")]
    pub use_deviations: bool,
    #[serde(default = "default_betting_style")]
    pub betting_style: String,
    #[serde(default)]
    pub wong_out_threshold: Option<f64>,
    #[serde(default)]
    pub min_hands_per_shoe: u32,
    #[serde(default)]
    pub simulate_late_entry: bool,
    #[serde(default = "default_late_entry_max_pen")]
    pub late_entry_max_pen: f64,
    #[serde(default)]
    pub log_json: bool,
}

fn default_true() -> bool {
    true
}

fn default_betting_style() -> String {
    String::from("KELLY")
}

fn default_late_entry_max_pen() -> f64 {
    0.5
}

impl TryInto<advantage::simulation::SimulatorConfig> for ConfigAblation {
    type Error = serde::de::value::Error;

    fn try_into(self) -> Result<advantage::simulation::SimulatorConfig, Self::Error> {
        Ok(advantage::simulation::SimulatorConfig {
            config_id: self.config_id,
            use_counting: self.use_counting,
            use_deviations: self.use_deviations,
            betting_style: self.betting_style.parse()?,
            wong_out_threshold: self.wong_out_threshold,
            min_hands_per_shoe: self.min_hands_per_shoe,
            simulate_late_entry: self.simulate_late_entry,
            late_entry_max_pen: self.late_entry_max_pen,
            log_json: self.log_json,
        })
    }
}

/// Reads the content of a given config file and parses it to a Config.
///
/// Panics if any error occurs.
pub fn parse_config_from_file(filename: &str) -> Config {
    let file_content = fs::read_to_string(filename).unwrap();
    serde_yaml::from_str(&file_content).unwrap()
}
