//! CLI for budgetrec.
//!
//! Records interactions, prices and budgets into a workspace file, trains the
//! factor model, and prints budget-aware recommendations or graph views. The
//! `shell` subcommand offers the same operations as a line-oriented prompt.

mod commands;
mod shell;
mod workspace;

use anyhow::{Context, Result};
use budgetrec_core::RecommenderConfig;
use budgetrec_factor::FactorConfig;
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use commands::{GraphFormat, GraphView};
use workspace::Session;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the workspace file (interactions, prices, budgets)
    #[arg(long, global = true, default_value = "data/budgetrec.workspace.json")]
    workspace: PathBuf,

    /// Path to the trained model file
    #[arg(long, global = true, default_value = "data/budgetrec.model.json")]
    model: PathBuf,

    /// Treat user and item ids as separate namespaces
    #[arg(long, global = true)]
    distinct_namespaces: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record that a user interacted with an item
    Interact {
        #[arg(long)]
        user: u64,
        #[arg(long)]
        item: u64,
    },
    /// Set the price of an item
    Price {
        #[arg(long)]
        item: u64,
        #[arg(long, allow_negative_numbers = true)]
        price: f64,
    },
    /// Set the spending limit of a user
    Budget {
        #[arg(long)]
        user: u64,
        #[arg(long, allow_negative_numbers = true)]
        limit: f64,
    },
    /// Train the matrix factorization model on all interactions
    Train(TrainArgs),
    /// Print recommendations for one user or for every known user
    Recommend {
        #[arg(long)]
        user: Option<u64>,
    },
    /// Render the interaction or recommendation graph
    Graph {
        #[arg(value_enum)]
        view: GraphView,

        #[arg(long, value_enum, default_value = "dot")]
        format: GraphFormat,

        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Read commands line by line from stdin
    Shell(TrainArgs),
}

/// Training overrides; unset flags fall back to the config file, then to defaults.
#[derive(Args, Debug, Default)]
struct TrainArgs {
    /// JSON file with a full or partial factor config
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    factors: Option<usize>,
    #[arg(long)]
    epochs: Option<usize>,
    #[arg(long)]
    learning_rate: Option<f32>,
    #[arg(long)]
    regularization: Option<f32>,
    /// Sampled non-interacted items per interaction
    #[arg(long)]
    negatives: Option<usize>,
    /// Share of interactions held out for evaluation
    #[arg(long)]
    holdout: Option<f32>,
    #[arg(long)]
    seed: Option<u64>,
}

impl TrainArgs {
    fn resolve(&self) -> Result<FactorConfig> {
        let mut config = match &self.config {
            Some(path) => load_factor_config(path)?,
            None => FactorConfig::default(),
        };
        if let Some(v) = self.factors {
            config.factors = v;
        }
        if let Some(v) = self.epochs {
            config.epochs = v;
        }
        if let Some(v) = self.learning_rate {
            config.learning_rate = v;
        }
        if let Some(v) = self.regularization {
            config.regularization = v;
        }
        if let Some(v) = self.negatives {
            config.negatives_per_positive = v;
        }
        if let Some(v) = self.holdout {
            config.holdout_fraction = v;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        Ok(config)
    }
}

fn load_factor_config(path: &Path) -> Result<FactorConfig> {
    let file = File::open(path).with_context(|| format!("Failed to open config {:?}", path))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse config {:?}", path))
}

#[cfg(feature = "telemetry")]
fn init_tracing() {
    use tracing_subscriber::filter::LevelFilter;

    let level = match std::env::var("BUDGETREC_LOG").as_deref() {
        Ok("trace") => LevelFilter::TRACE,
        Ok("debug") => LevelFilter::DEBUG,
        Ok("info") => LevelFilter::INFO,
        Ok("error") => LevelFilter::ERROR,
        Ok("off") => LevelFilter::OFF,
        _ => LevelFilter::WARN,
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .init();
}

fn main() -> Result<ExitCode> {
    #[cfg(feature = "telemetry")]
    init_tracing();

    let cli = Cli::parse();
    let config = RecommenderConfig {
        shared_id_namespace: !cli.distinct_namespaces,
    };
    let mut session = Session::open(&cli.workspace, &cli.model, config)?;

    let text = match cli.command {
        Commands::Interact { user, item } => commands::interact(&mut session, user, item)?,
        Commands::Price { item, price } => commands::set_price(&mut session, item, price)?,
        Commands::Budget { user, limit } => commands::set_budget(&mut session, user, limit)?,
        Commands::Train(args) => commands::train(&mut session, args.resolve()?)?,
        Commands::Recommend { user } => commands::recommend(&session, user)?,
        Commands::Graph {
            view,
            format,
            output,
        } => commands::deliver(
            commands::graph(&session, view, format)?,
            output.as_deref(),
        )?,
        Commands::Shell(args) => {
            let train_config = args.resolve()?;
            let stdin = io::stdin();
            let code = shell::run(
                &mut session,
                stdin.lock(),
                &mut io::stdout(),
                &mut io::stderr(),
                &train_config,
            )?;
            return Ok(ExitCode::from(code));
        }
    };

    println!("{}", text.trim_end());
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_config_file() {
        let path = std::env::temp_dir().join(format!("budgetrec_factor_cfg_{}.json", std::process::id()));
        std::fs::write(&path, r#"{"factors": 3, "epochs": 5, "seed": 1}"#).unwrap();

        let args = TrainArgs {
            config: Some(path.clone()),
            epochs: Some(9),
            ..TrainArgs::default()
        };
        let config = args.resolve().unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(config.factors, 3);
        assert_eq!(config.epochs, 9);
        assert_eq!(config.seed, Some(1));
        assert_eq!(config.negatives_per_positive, FactorConfig::default().negatives_per_positive);
    }

    #[test]
    fn negative_price_reaches_validation() {
        let cli = Cli::try_parse_from(["budgetrec", "price", "--item", "1", "--price", "-2"]).unwrap();
        assert!(matches!(cli.command, Commands::Price { price, .. } if price < 0.0));
    }
}
