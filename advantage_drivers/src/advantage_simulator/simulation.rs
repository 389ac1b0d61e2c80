use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use advantage::betting::BettingConfig;
use advantage::simulation::stats::SimulationResult;
use advantage::simulation::trace::NdjsonSink;
use advantage::simulation::{Simulator, SimulatorConfig};
use advantage::Rules;
use advantage_drivers::Config;

const REPORT_WIDTH: usize = 72;
const LABEL_WIDTH: usize = 28;

/// Runs every ablation entry in the config against the same rules and
/// seed, printing a per-run summary and a final comparison table.
pub fn run_all(config: &Config, trace_dir: Option<&PathBuf>) -> Result<(), String> {
    let rules: Rules = config.rule.clone().try_into().map_err(stringify)?;
    rules.validate().map_err(stringify)?;

    let mut betting_config = BettingConfig::from_rules(&rules);
    betting_config.kelly_fraction = config.betting.kelly_fraction;
    betting_config.max_spread = config.betting.max_spread;
    betting_config.max_betting_penetration = config.betting.max_betting_penetration;

    let ablations = if config.ablations.is_empty() {
        vec![advantage_drivers::ConfigAblation {
            config_id: String::from("BASELINE"),
            use_counting: true,
            use_deviations: true,
            betting_style: String::from("KELLY"),
            wong_out_threshold: None,
            min_hands_per_shoe: 0,
            simulate_late_entry: false,
            late_entry_max_pen: 0.5,
            log_json: false,
        }]
    } else {
        config.ablations.clone()
    };

    let mut results: Vec<(String, SimulationResult)> = Vec::with_capacity(ablations.len());
    for entry in ablations {
        let sim_config: SimulatorConfig = entry.try_into().map_err(stringify)?;
        let config_id = sim_config.config_id.clone();
        println!("Running {} ({} hands, seed {})...", config_id, config.simulator.hands, config.simulator.seed);

        let mut simulator = Simulator::new(
            rules,
            betting_config,
            sim_config.clone(),
            config.simulator.seed,
            config.simulator.starting_bankroll,
        )
        .map_err(stringify)?;

        if sim_config.log_json {
            let dir = trace_dir.cloned().unwrap_or_else(|| PathBuf::from("."));
            let path = dir.join(format!("trace_{}.ndjson", config_id.to_lowercase()));
            let file = File::create(&path).map_err(stringify)?;
            simulator = simulator.with_sink(Box::new(NdjsonSink::new(BufWriter::new(file))));
            println!("Flight recorder: {}", path.display());
        }

        let result = simulator.run(config.simulator.hands).map_err(stringify)?;
        print_summary(&config_id, &rules, &result);
        results.push((config_id, result));
    }

    if results.len() > 1 {
        print_comparison(&results);
    }
    Ok(())
}

fn stringify<E: std::fmt::Display>(e: E) -> String {
    e.to_string()
}

fn print_summary(config_id: &str, rules: &Rules, result: &SimulationResult) {
    let numeric_width = REPORT_WIDTH - LABEL_WIDTH;
    println!("{}", "-".repeat(REPORT_WIDTH));
    println!("{:-^REPORT_WIDTH$}", format!(" {} ({}) ", config_id, rules));
    println!("{:<LABEL_WIDTH$}{:>numeric_width$}", "hands played:", result.hands_played);
    println!("{:<LABEL_WIDTH$}{:>numeric_width$}", "hands skipped:", result.hands_skipped);
    println!("{:<LABEL_WIDTH$}{:>numeric_width$.2}", "total wagered:", result.total_wagered);
    println!("{:<LABEL_WIDTH$}{:>numeric_width$.2}", "net profit:", result.net_profit);
    println!("{:<LABEL_WIDTH$}{:>numeric_width$.4}", "EV %:", result.ev_percent);
    println!("{:<LABEL_WIDTH$}{:>numeric_width$.4}", "standard error:", result.standard_error);
    println!("{:<LABEL_WIDTH$}{:>numeric_width$.2}", "average bet:", result.average_bet);
    println!("{:<LABEL_WIDTH$}{:>numeric_width$.2}", "final bankroll:", result.final_bankroll);
    println!("{:<LABEL_WIDTH$}{:>numeric_width$.2}", "max drawdown:", result.max_drawdown);
    println!("{:<LABEL_WIDTH$}{:>numeric_width$.2}", "win rate %:", result.win_rate * 100.0);

    println!("{:-^REPORT_WIDTH$}", " outcomes ");
    for outcome in advantage::simulation::stats::Outcome::all() {
        let count = result.outcome_count(outcome);
        let percent = if result.hands_played > 0 {
            count as f64 / result.hands_played as f64 * 100.0
        } else {
            0.0
        };
        println!(
            "{:<LABEL_WIDTH$}{:>20}{:>12.2}%",
            format!("{}:", outcome.as_str().to_lowercase()),
            count,
            percent
        );
    }

    println!("{:-^REPORT_WIDTH$}", " by true count ");
    println!("{:<12}{:>16}{:>16}", "bucket", "hands", "EV %");
    for (bucket, stats) in &result.by_true_count {
        println!("{:<12}{:>16}{:>16.3}", format!("TC {:+}", bucket), stats.hands, stats.ev_percent());
    }
    println!("{}", "-".repeat(REPORT_WIDTH));
    println!();
}

fn print_comparison(results: &[(String, SimulationResult)]) {
    println!("{}", "=".repeat(REPORT_WIDTH));
    println!("{:-^REPORT_WIDTH$}", " comparison ");
    println!(
        "{:<20}{:>10}{:>12}{:>14}{:>14}",
        "config", "EV %", "std err", "hands", "skipped"
    );
    for (config_id, result) in results {
        println!(
            "{:<20}{:>+10.3}{:>12.4}{:>14}{:>14}",
            config_id, result.ev_percent, result.standard_error, result.hands_played, result.hands_skipped
        );
    }
    println!("{}", "=".repeat(REPORT_WIDTH));
}
