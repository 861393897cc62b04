mod session;

use std::io::{self, BufRead, Write};

use blackjack_ev::{EngineConfig, Rule};
use blackjack_ev_drivers::{default_config_path, parse_config_from_file, Config, ConfigError};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use self::session::{Reply, Session};

const DEFAULT_CONFIG_PATH: &str = "~/.blackjack_ev.yml";

#[derive(Debug, Parser)]
#[command(author, about, long_about = None)]
struct CommandLineArgs {
    /// The path of the config file
    #[arg(short, long, default_value_t = String::from(DEFAULT_CONFIG_PATH))]
    config: String,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: &str) -> Result<Config, ConfigError> {
    if path != DEFAULT_CONFIG_PATH {
        return parse_config_from_file(path);
    }

    let config_file_path = default_config_path()?;
    if !config_file_path.is_file() {
        info!(path = %config_file_path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }
    parse_config_from_file(&config_file_path.to_string_lossy())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let args = CommandLineArgs::parse();

    let config = load_config(&args.config)?;
    let seed = config.engine.seed;
    let rule: Rule = config.rule.into();
    let engine_config: EngineConfig = config.engine.try_into()?;
    info!(?rule, ?engine_config, "configuration loaded");

    let rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let mut session = Session::new(rule, engine_config, rng);

    println!(
        "Enter dealt cards (2-10, J, Q, K, A), `status`, `reset`, \
         `hand <cards> vs <up>` or `quit`."
    );
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        match session.execute(&line?) {
            Ok(Reply::Text(text)) => println!("{}", text),
            Ok(Reply::Quit) => break,
            Err(e) => error!("{}", e),
        }
        stdout.flush()?;
    }
    Ok(())
}
