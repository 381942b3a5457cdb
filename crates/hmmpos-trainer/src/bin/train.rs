use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use hmmpos_core::TrainerConfig;
use hmmpos_trainer::{load_config, load_tag_list, CorpusTrainer, DEFAULT_MIN_COUNT};
use tracing::info;

/// Train a bigram HMM part-of-speech tagger
#[derive(Parser)]
#[command(name = "train")]
#[command(version)]
struct Args {
    /// Tagged corpus files (.tsv/.txt, .conllu/.conll or .json)
    #[arg(short, long, required = true, num_args = 1..)]
    corpus: Vec<PathBuf>,

    /// Where to write the model
    #[arg(short, long, env = "HMMPOS_MODEL")]
    output: PathBuf,

    /// Smoothing constant (overrides the config file)
    #[arg(short, long)]
    alpha: Option<f64>,

    /// Minimum (word, tag) frequency for a word to enter the vocabulary
    #[arg(short, long, default_value_t = DEFAULT_MIN_COUNT)]
    min_count: u64,

    /// JSON list of tags to include even if unseen
    #[arg(short, long)]
    tags: Option<PathBuf>,

    /// JSON trainer configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Estimate on a single thread
    #[arg(long)]
    sequential: bool,
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => TrainerConfig::default(),
    };
    if let Some(alpha) = args.alpha {
        config = config.with_alpha(alpha);
    }
    if args.sequential {
        config = config.with_parallel(false);
    }

    let mut trainer = CorpusTrainer::new(config).with_min_count(args.min_count);
    if let Some(path) = &args.tags {
        trainer = trainer.with_tags(load_tag_list(path)?);
    }

    info!(files = args.corpus.len(), alpha = config.alpha, "starting training");
    let model = trainer.train_on_files(&args.corpus)?;
    model
        .save(&args.output)
        .with_context(|| format!("cannot write model to {}", args.output.display()))?;
    println!("Model saved to {}", args.output.display());
    Ok(())
}

fn main() {
    tracing_subscriber::fmt::init();

    if let Err(e) = run(Args::parse()) {
        eprintln!("Training failed: {e:#}");
        std::process::exit(1);
    }
}
