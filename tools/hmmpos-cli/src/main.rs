//! Reads one sentence per line from stdin, splits it on whitespace and prints
//! the predicted tag of every token.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use hmmpos_core::HmmModel;
use serde::Serialize;

/// Tag sentences read from stdin
#[derive(Parser)]
#[command(name = "hmmpos-tag")]
#[command(version)]
struct Args {
    /// Trained model file
    #[arg(short, long, env = "HMMPOS_MODEL")]
    model: PathBuf,

    /// Print one JSON object per sentence
    #[arg(long)]
    json: bool,

    /// Use the most-frequent-tag baseline instead of Viterbi
    #[arg(long)]
    naive: bool,
}

#[derive(Debug, Serialize)]
struct TaggedToken {
    word: String,
    tag: Option<String>,
    known: bool,
}

#[derive(Debug, Serialize)]
struct TagOutput {
    input: String,
    tokens: Vec<TaggedToken>,
    mode: &'static str,
    error: Option<String>,
}

fn tag_line(model: &HmmModel, line: &str, naive: bool) -> TagOutput {
    let words: Vec<&str> = line.split_whitespace().collect();
    let mode = if naive { "naive" } else { "viterbi" };
    let tagged = if naive {
        model.naive_tag(&words).map(|tags| {
            words
                .iter()
                .zip(tags)
                .map(|(w, t)| (*w, t))
                .collect::<Vec<_>>()
        })
    } else {
        model.tagger().tag_sentence(&words).map(|pairs| {
            pairs
                .into_iter()
                .map(|(w, t)| (w, Some(t)))
                .collect::<Vec<_>>()
        })
    };

    match tagged {
        Ok(pairs) => TagOutput {
            input: line.to_string(),
            tokens: pairs
                .into_iter()
                .map(|(word, tag)| TaggedToken {
                    word: word.to_string(),
                    tag: tag.map(str::to_string),
                    known: model.vocab().contains(word),
                })
                .collect(),
            mode,
            error: None,
        },
        Err(e) => TagOutput {
            input: line.to_string(),
            tokens: Vec::new(),
            mode,
            error: Some(e.to_string()),
        },
    }
}

fn write_table<W: Write>(out: &mut W, output: &TagOutput) -> io::Result<()> {
    if let Some(error) = &output.error {
        return writeln!(out, "error: {error}\n");
    }
    let width = output
        .tokens
        .iter()
        .map(|t| t.word.chars().count())
        .max()
        .unwrap_or(0);
    for token in &output.tokens {
        let tag = token.tag.as_deref().unwrap_or("-");
        let marker = if token.known { "" } else { "  (unknown)" };
        writeln!(out, "{:<width$}  {tag}{marker}", token.word)?;
    }
    writeln!(out)
}

fn run(args: Args) -> Result<()> {
    let model = HmmModel::load(&args.model)
        .with_context(|| format!("cannot load model {}", args.model.display()))?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let output = tag_line(&model, line, args.naive);
        if args.json {
            writeln!(out, "{}", serde_json::to_string(&output)?)?;
        } else {
            write_table(&mut out, &output)?;
        }
        out.flush()?;
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    if let Err(e) = run(Args::parse()) {
        eprintln!("hmmpos-tag failed: {e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmmpos_core::{Trainer, TrainerConfig, Vocabulary};

    fn model() -> HmmModel {
        let vocab = Vocabulary::new(["el", "perro", "come"]);
        let mut trainer = Trainer::new(vocab, TrainerConfig::default()).unwrap();
        trainer.add_sentence(&[("el", "DET"), ("perro", "NOUN"), ("come", "VERB")]);
        trainer.add_sentence(&[("el", "DET"), ("perro", "NOUN")]);
        trainer.finish().unwrap()
    }

    #[test]
    fn test_viterbi_line() {
        let model = model();
        let output = tag_line(&model, "el  perro come", false);
        assert!(output.error.is_none());
        let tags: Vec<_> = output.tokens.iter().map(|t| t.tag.as_deref()).collect();
        assert_eq!(tags, [Some("DET"), Some("NOUN"), Some("VERB")]);
        assert!(output.tokens.iter().all(|t| t.known));
    }

    #[test]
    fn test_naive_line_with_unknown_word() {
        let model = model();
        let output = tag_line(&model, "el gato", true);
        assert_eq!(output.mode, "naive");
        assert_eq!(output.tokens[0].tag.as_deref(), Some("DET"));
        assert_eq!(output.tokens[1].tag, None);
        assert!(!output.tokens[1].known);
    }

    #[test]
    fn test_table_output() {
        let model = model();
        let output = tag_line(&model, "el perro", false);
        let mut buf = Vec::new();
        write_table(&mut buf, &output).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "el     DET\nperro  NOUN\n\n");
    }
}
