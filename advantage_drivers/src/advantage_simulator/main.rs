use std::path::PathBuf;

use advantage_drivers::parse_config_from_file;
use clap::Parser;

mod simulation;

const DEFAULT_CONFIG_PATH: &str = "~/.advantage.yml";

#[derive(Debug, Parser)]
#[command(author, about, long_about = None)]
struct CommandLineArgs {
    /// The path of the config file
    #[arg(short, long, default_value_t = String::from(DEFAULT_CONFIG_PATH))]
    config: String,

    /// Override the number of hands from the config file
    #[arg(long)]
    hands: Option<u64>,

    /// Override the RNG seed from the config file
    #[arg(long)]
    seed: Option<u64>,

    /// Directory for flight-recorder output files
    #[arg(long)]
    trace_dir: Option<PathBuf>,
}

fn main() {
    let mut args = CommandLineArgs::parse();
    if args.config == DEFAULT_CONFIG_PATH {
        let home_dir = home::home_dir().expect("Cannot find home directory");
        let config_file_path = home_dir.join(".advantage.yml");
        if !config_file_path.exists() {
            panic!("Config file not exists");
        }
        if config_file_path.is_dir() {
            panic!("This should be a path rather than a directory");
        }
        args.config = String::from(config_file_path.to_str().unwrap());
    }
    let args = args;

    let mut config = parse_config_from_file(&args.config);
    if let Some(hands) = args.hands {
        config.simulator.hands = hands;
    }
    if let Some(seed) = args.seed {
        config.simulator.seed = seed;
    }

    if let Err(e) = simulation::run_all(&config, args.trace_dir.as_ref()) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
