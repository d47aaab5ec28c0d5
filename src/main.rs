//! Close-game k-NN experiment CLI
//!
//! With no arguments, loads the default winners/losers files, runs the
//! seeded split/scale/fit/evaluate pipeline and prints the results.

use clap::{Parser, Subcommand};
use closegames::{Config, Result};

#[derive(Parser)]
#[command(name = "closegames")]
#[command(about = "k-nearest-neighbors outcome model for close games", long_about = None)]
struct Cli {
    /// Config file path (used only if it exists)
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Override the number of neighbors
    #[arg(short, long)]
    k: Option<usize>,

    /// Override the split seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the test fraction
    #[arg(long)]
    test_size: Option<f64>,

    /// Override the directory holding the winners/losers CSV files
    #[arg(long)]
    data_dir: Option<String>,

    /// Output format
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the experiment (default)
    Run,
    /// Write a default config file
    Init,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use text or json.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let mut config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    if let Some(k) = cli.k {
        config.model.k = k;
    }
    if let Some(seed) = cli.seed {
        config.split.seed = seed;
    }
    if let Some(test_size) = cli.test_size {
        config.split.test_size = test_size;
    }
    if let Some(dir) = cli.data_dir {
        config.data.data_dir = dir;
    }

    let result = match cli.command {
        None | Some(Commands::Run) => commands::run(&config, &cli.format),
        Some(Commands::Init) => commands::init(&cli.config, &config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use burn::backend::ndarray::NdArray;
    use closegames::training::KnnExperiment;

    type MyBackend = NdArray<f32>;

    pub fn init(config_path: &str, config: &Config) -> Result<()> {
        config.save(config_path)?;
        println!("Created config at {}", config_path);
        println!("  Data: {}", config.data.data_dir);
        println!("  k = {}, seed = {}", config.model.k, config.split.seed);
        Ok(())
    }

    pub fn run(config: &Config, format: &OutputFormat) -> Result<()> {
        log::info!(
            "Running k-NN (k = {}) on {} / {}",
            config.model.k,
            config.data.winners_path().display(),
            config.data.losers_path().display()
        );

        let report = KnnExperiment::<MyBackend>::load_and_run(Default::default(), config)?;

        match format {
            OutputFormat::Text => println!("{}", report),
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&report).map_err(|e| {
                    closegames::CloseGamesError::Parse(format!("Failed to serialize report: {}", e))
                })?;
                println!("{}", json);
            }
        }

        Ok(())
    }
}
