use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sc2_feature_extractor::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sc2_features")]
#[command(about = "Extract, merge and summarize StarCraft II replay features", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract one feature table per replay
    Extract {
        /// Directory of recorded replays, or a single replay file
        #[arg(long)]
        replays: PathBuf,

        /// Feature extraction configuration (JSON)
        #[arg(long)]
        config: PathBuf,

        /// Directory where the feature tables are written
        #[arg(long)]
        output: PathBuf,

        /// Number of worker threads
        #[arg(long, default_value_t = 1)]
        parallel: usize,

        /// Process at most this many replays
        #[arg(long)]
        amount: Option<usize>,

        /// Remove the output directory before extracting
        #[arg(long, default_value_t = false)]
        clear: bool,

        /// Episode break file, instead of the one in the replay directory
        #[arg(long)]
        episodes: Option<PathBuf>,

        /// Only play back the perspectives of these players
        #[arg(long, value_delimiter = ',')]
        players: Option<Vec<u32>>,
    },

    /// Merge a directory of feature tables into one dataset
    Merge {
        /// Directory of feature tables
        #[arg(long)]
        input: PathBuf,

        /// Merged table (CSV)
        #[arg(long)]
        output: PathBuf,

        /// Number episodes sequentially instead of reading them from
        /// replay names
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Convert non-numeric feature columns to this type
        #[arg(long)]
        coerce: Option<ScalarKind>,
    },

    /// Compute descriptive statistics of a dataset
    Stats {
        /// Merged table, or a directory of feature tables to merge first
        #[arg(long)]
        input: PathBuf,

        /// Statistics file (JSON)
        #[arg(long)]
        output: PathBuf,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sc2_feature_extractor=info,info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn table_path(output: &Path, replay: &Path) -> PathBuf {
    output.join(format!(
        "{}.{}",
        replay_name(replay),
        FEATURE_TABLE_EXTENSION
    ))
}

#[allow(clippy::too_many_arguments)]
fn extract(
    replays: &Path,
    config: &Path,
    output: &Path,
    parallel: usize,
    amount: Option<usize>,
    clear: bool,
    episodes: Option<&Path>,
    players: Option<Vec<u32>>,
) -> Result<()> {
    let config = FeatureExtractorConfig::load_json(config)
        .with_context(|| format!("Invalid configuration {:?}", config))?;

    if clear && output.exists() {
        log::info!("Clearing {:?}", output);
        std::fs::remove_dir_all(output)?;
    }
    std::fs::create_dir_all(output)?;
    config.save_json(output.join(CONFIG_FILE))?;
    ReplayFeatureCollector::standard(&config)?
        .save_descriptors(output.join(FEATURE_DESCRIPTORS_FILE), 2)?;

    let mut runner = ReplayProcessRunner::new(Arc::new(config), replays.to_path_buf(), parallel)?
        .with_amount(amount)
        .with_player_ids(players);
    if let Some(episodes) = episodes {
        let breaks: HashSet<usize> = parse_episode_breaks(&std::fs::read_to_string(episodes)?)?
            .into_iter()
            .collect();
        log::info!("Using {} episode breaks from {:?}", breaks.len(), episodes);
        runner = runner.with_episode_breaks(breaks);
    }

    let (done, pending): (Vec<PathBuf>, Vec<PathBuf>) = runner
        .replay_list()?
        .into_iter()
        .partition(|replay| table_path(output, replay).exists());
    if !done.is_empty() {
        log::info!("Skipping {} replays already processed", done.len());
    }

    let mut written = 0;
    let mut failed = 0;
    runner.run_replays(pending, RecordedReplayEngine::new, |outcome| {
        match outcome.result {
            Ok(Some(table)) => {
                let path = table_path(output, &outcome.path);
                match table.save_csv(&path) {
                    Ok(()) => {
                        written += 1;
                        log::info!("Saved {} rows to {:?}", table.len(), path);
                    }
                    Err(err) => {
                        failed += 1;
                        log::error!("Could not save {:?}: {}", path, err);
                    }
                }
            }
            Ok(None) => {}
            Err(_) => failed += 1,
        }
    })?;
    log::info!("Wrote {} feature tables, {} replays failed", written, failed);
    Ok(())
}

fn merge_directory(input: &Path, sequential: bool, coerce: Option<ScalarKind>) -> Result<FeatureTable> {
    let merged = DatasetMerger::new(!sequential, coerce)
        .merge_directory(input)
        .with_context(|| format!("Could not merge the tables in {:?}", input))?;
    Ok(merged)
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            replays,
            config,
            output,
            parallel,
            amount,
            clear,
            episodes,
            players,
        } => extract(
            &replays,
            &config,
            &output,
            parallel,
            amount,
            clear,
            episodes.as_deref(),
            players,
        )?,
        Commands::Merge {
            input,
            output,
            sequential,
            coerce,
        } => {
            let merged = merge_directory(&input, sequential, coerce)?;
            merged.save_csv(&output)?;
            log::info!("Saved merged dataset to {:?}", output);
        }
        Commands::Stats { input, output } => {
            let table = if input.is_dir() {
                merge_directory(&input, false, None)?
            } else {
                FeatureTable::load_csv(&input)?
            };
            StatsAggregator::new().compute(&table)?.save_json(&output)?;
            log::info!("Saved statistics to {:?}", output);
        }
    }
    Ok(())
}
