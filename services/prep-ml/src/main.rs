//! Avalanche ML dataset preparation CLI.
//!
//! Builds train/test label pools from a forecast archive and a Zarr
//! feature store, then samples class-balanced feature tensors from them.

mod commands;
mod config_loader;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ml_prep::Split;

#[derive(Parser, Debug)]
#[command(name = "prep-ml")]
#[command(about = "Prepare avalanche danger training datasets")]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "prep-ml.yaml")]
    config: PathBuf,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Join labels to grid points and save the train/test pools
    Labels {
        /// Recompute the grid-point cache
        #[arg(long)]
        overwrite_cache: bool,
    },
    /// Stream batches as Zarr tensors and CSV label tables
    CacheBatches {
        #[arg(long, value_enum, default_value = "train")]
        split: SplitArg,
    },
    /// Fill one pre-allocated disk-backed tensor
    Memmap {
        #[arg(long, value_enum, default_value = "train")]
        split: SplitArg,

        /// Tensor number within the split
        #[arg(long, default_value_t = 0)]
        batch: usize,

        /// Continue from the last checkpoint
        #[arg(long)]
        resume: bool,
    },
    /// Concatenate every disk-backed tensor in the ML directory
    Merge {
        /// Output file (default: <ml_dir>/X_all.npy)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Manifest, train tensors, test tensors and merge in one run
    Generate,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SplitArg {
    Train,
    Test,
}

impl From<SplitArg> for Split {
    fn from(arg: SplitArg) -> Self {
        match arg {
            SplitArg::Train => Split::Train,
            SplitArg::Test => Split::Test,
        }
    }
}

fn init_tracing(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.to_lowercase()));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);

    if args.json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args)?;

    let config = config_loader::load_config(&args.config)?;
    info!(config = %args.config.display(), "Loaded configuration");

    match args.command {
        Command::Labels { overwrite_cache } => commands::labels(&config, overwrite_cache),
        Command::CacheBatches { split } => commands::cache_batches(&config, split.into()),
        Command::Memmap {
            split,
            batch,
            resume,
        } => commands::memmap(&config, split.into(), batch, resume),
        Command::Merge { output } => commands::merge_tensors(&config, output),
        Command::Generate => commands::generate(&config),
    }
}
