use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use hmmpos_core::HmmModel;
use hmmpos_trainer::{evaluate, load_corpus};

/// Score a trained model against a tagged test corpus
#[derive(Parser)]
#[command(name = "evaluate")]
#[command(version)]
struct Args {
    /// Trained model file
    #[arg(short, long, env = "HMMPOS_MODEL")]
    model: PathBuf,

    /// Tagged test corpus (.tsv/.txt, .conllu/.conll or .json)
    #[arg(short, long)]
    corpus: PathBuf,

    /// Print the per-tag precision/recall/F1 report
    #[arg(long)]
    per_tag: bool,

    /// Print a single JSON summary line instead of text
    #[arg(long)]
    json: bool,
}

fn run(args: Args) -> Result<()> {
    let model = HmmModel::load(&args.model)
        .with_context(|| format!("cannot load model {}", args.model.display()))?;
    let sentences = load_corpus(&args.corpus)?;
    let report = evaluate(&model, &sentences)?;

    if args.json {
        println!("{}", serde_json::to_string(&report.summary())?);
        return Ok(());
    }

    println!("Naive accuracy:   {:.4}", report.naive.item_accuracy());
    println!("Viterbi accuracy: {:.4}", report.viterbi.item_accuracy());
    if args.per_tag {
        println!();
        println!("== Naive ==");
        println!("{}", report.naive);
        println!();
        println!("== Viterbi ==");
        println!("{}", report.viterbi);
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt::init();

    if let Err(e) = run(Args::parse()) {
        eprintln!("Evaluation failed: {e:#}");
        std::process::exit(1);
    }
}
