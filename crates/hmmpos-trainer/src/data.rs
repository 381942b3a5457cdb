//! Data loading for tagged corpora.
//!
//! Three formats are understood:
//!
//! * tab-separated `word<TAB>tag` lines, one token per line, sentences
//!   separated by blank lines, `#` lines ignored (`.tsv`, `.txt` and any
//!   other extension);
//! * CoNLL-U, using the FORM and UPOS columns (`.conllu`, `.conll`);
//! * a JSON array of `[word, tag]` pairs with every sentence already
//!   bracketed by `["<BOS>", "<BOS>"]` and `["<EOS>", "<EOS>"]` (`.json`).
//!
//! Either way the result is a list of sentences without sentinels.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use hmmpos_core::{BOS, EOS};
use tracing::{debug, warn};

/// One sentence of `(word, tag)` pairs, sentinels excluded.
pub type TaggedSentence = Vec<(String, String)>;

/// Load a corpus, choosing the format from the file extension.
pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<TaggedSentence>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let sentences = match extension.as_deref() {
        Some("json") => load_json_pairs(path)?,
        Some("conll" | "conllu") => load_conllu(path)?,
        _ => load_tsv(path)?,
    };
    debug!(path = %path.display(), sentences = sentences.len(), "corpus loaded");
    Ok(sentences)
}

/// Load a tab-separated corpus file.
pub fn load_tsv<P: AsRef<Path>>(path: P) -> Result<Vec<TaggedSentence>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    parse_tsv(BufReader::new(file)).with_context(|| format!("cannot read {}", path.display()))
}

/// Parse tab-separated `word<TAB>tag` lines. Lines without exactly one tab
/// are skipped with a warning.
pub fn parse_tsv<R: BufRead>(reader: R) -> Result<Vec<TaggedSentence>> {
    parse_lines(reader, |line| match line.split_once('\t') {
        Some((word, tag)) if !tag.contains('\t') => Row::token(word, tag),
        _ => Row::Malformed,
    })
}

/// Load a CoNLL-U file.
pub fn load_conllu<P: AsRef<Path>>(path: P) -> Result<Vec<TaggedSentence>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    parse_conllu(BufReader::new(file)).with_context(|| format!("cannot read {}", path.display()))
}

/// Parse CoNLL-U lines, taking FORM (column 2) as the word and UPOS
/// (column 4) as the tag. Multiword-token ranges (`1-2`) and empty nodes
/// (`1.1`) are skipped.
pub fn parse_conllu<R: BufRead>(reader: R) -> Result<Vec<TaggedSentence>> {
    parse_lines(reader, |line| {
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < 4 {
            return Row::Malformed;
        }
        if columns[0].contains(['-', '.']) {
            return Row::Skip;
        }
        Row::token(columns[1], columns[3])
    })
}

enum Row<'a> {
    Token(&'a str, &'a str),
    Skip,
    Malformed,
}

impl<'a> Row<'a> {
    fn token(word: &'a str, tag: &'a str) -> Self {
        let (word, tag) = (word.trim(), tag.trim());
        if word.is_empty() || tag.is_empty() {
            Row::Malformed
        } else {
            Row::Token(word, tag)
        }
    }
}

/// Shared line loop: blank lines end a sentence, `#` lines are comments.
fn parse_lines<R, F>(reader: R, mut row: F) -> Result<Vec<TaggedSentence>>
where
    R: BufRead,
    F: for<'l> FnMut(&'l str) -> Row<'l>,
{
    let mut sentences = Vec::new();
    let mut current = Vec::new();

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches(['\r', '\n']);

        if line.trim().is_empty() {
            if !current.is_empty() {
                sentences.push(std::mem::take(&mut current));
            }
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        match row(line) {
            Row::Token(word, tag) => current.push((word.to_string(), tag.to_string())),
            Row::Skip => {}
            Row::Malformed => {
                warn!(line = lineno + 1, content = line, "skipping malformed corpus line")
            }
        }
    }

    if !current.is_empty() {
        sentences.push(current);
    }

    Ok(sentences)
}

/// Load a JSON array of boundary-annotated `[word, tag]` pairs.
pub fn load_json_pairs<P: AsRef<Path>>(path: P) -> Result<Vec<TaggedSentence>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let pairs: Vec<(String, String)> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("{} is not a JSON array of [word, tag] pairs", path.display()))?;
    Ok(split_annotated(pairs))
}

/// Split a bracketed pair stream into sentences. A `<BOS>` tag opens a
/// sentence and an `<EOS>` tag closes it; the sentinel pairs themselves are
/// dropped.
pub fn split_annotated<I>(pairs: I) -> Vec<TaggedSentence>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut sentences = Vec::new();
    let mut current = Vec::new();
    for (word, tag) in pairs {
        if tag == BOS || tag == EOS {
            if !current.is_empty() {
                sentences.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.push((word, tag));
    }
    if !current.is_empty() {
        sentences.push(current);
    }
    sentences
}

/// Read a JSON list of tag names.
pub fn load_tag_list<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("{} is not a JSON list of tags", path.display()))
}
