//! The treebank reader.
//!
//! Reads a whitespace/tab-separated, CoNLL-style file: one token per line,
//! blank lines separating sentences, end-of-file implicitly closing the
//! last sentence. A malformed line aborts only the sentence it belongs to;
//! the rest of the file is still read, so one bad sentence never costs the
//! whole corpus.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::Result;
use crate::token::{Sentence, Token};

lazy_static! {
    static ref COLUMN_SEP: Regex = Regex::new(r"[ \t]+").unwrap();
}

/// Why a sentence was dropped from a corpus read, for the caller to log or
/// count. Modeled as data rather than a formatted string so a test can
/// assert on *which* condition fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorpusDiagnostic {
    /// A line had fewer than 8 whitespace-separated columns.
    TooFewColumns { line: usize, found: usize },
    /// Column 0 or column 6 was not a valid unsigned integer.
    BadInteger { line: usize, column: usize, value: String },
}

impl std::fmt::Display for CorpusDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorpusDiagnostic::TooFewColumns { line, found } => write!(
                f,
                "line {}: expected at least 8 columns, found {}",
                line, found
            ),
            CorpusDiagnostic::BadInteger { line, column, value } => write!(
                f,
                "line {}: column {} is not a valid integer: {:?}",
                line, column, value
            ),
        }
    }
}

/// Parses one treebank line into a `Token`, or the diagnostic explaining
/// why it couldn't be.
fn parse_line(line: &str, lineno: usize) -> std::result::Result<Token, CorpusDiagnostic> {
    let cols: Vec<&str> = COLUMN_SEP.split(line.trim()).collect();
    if cols.len() < 8 {
        return Err(CorpusDiagnostic::TooFewColumns {
            line: lineno,
            found: cols.len(),
        });
    }
    let id: u32 = cols[0].parse().map_err(|_| CorpusDiagnostic::BadInteger {
        line: lineno,
        column: 0,
        value: cols[0].to_string(),
    })?;
    let parent_id: u32 = cols[6].parse().map_err(|_| CorpusDiagnostic::BadInteger {
        line: lineno,
        column: 6,
        value: cols[6].to_string(),
    })?;
    Ok(Token {
        id,
        form: cols[1].to_string(),
        tag: cols[4].to_string(),
        parent_id,
        label: cols[7].to_string(),
    })
}

/// Reads every sentence out of `path`. Sentences containing a malformed
/// line are skipped entirely (logged at `warn`); reading continues with
/// the next sentence.
pub fn read_treebank(path: &Path) -> Result<Vec<Sentence>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut sentences = Vec::new();
    let mut current: Vec<Token> = Vec::new();
    let mut current_ok = true;

    let flush = |current: &mut Vec<Token>, current_ok: &mut bool, sentences: &mut Vec<Sentence>| {
        if *current_ok && !current.is_empty() {
            sentences.push(Sentence::from_tokens(std::mem::take(current)));
        } else {
            current.clear();
        }
        *current_ok = true;
    };

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = idx + 1;
        if line.trim().is_empty() {
            flush(&mut current, &mut current_ok, &mut sentences);
            continue;
        }
        match parse_line(&line, lineno) {
            Ok(tok) => current.push(tok),
            Err(cause) => {
                crate::diag::Diagnostic::MalformedLine { raw_line: line.clone(), cause }.emit();
                current_ok = false;
            }
        }
    }
    flush(&mut current, &mut current_ok, &mut sentences);

    log::info!("read {} sentence(s) from {}", sentences.len(), path.display());
    Ok(sentences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp(name: &str, contents: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("beamdep-corpus-test-{}-{}", std::process::id(), name));
        let mut f = File::create(&p).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        p
    }

    #[test]
    fn reads_two_sentences_separated_by_blank_line() {
        let path = write_tmp(
            "two-sentences",
            "1\ta\t_\t_\tNN\t_\t0\troot\n\n1\tb\t_\t_\tVB\t_\t0\troot\n",
        );
        let sentences = read_treebank(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].tokens()[1].form, "a");
        assert_eq!(sentences[1].tokens()[1].form, "b");
    }

    #[test]
    fn eof_implicitly_closes_last_sentence() {
        let path = write_tmp("no-trailing-blank", "1\ta\t_\t_\tNN\t_\t0\troot\n");
        let sentences = read_treebank(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(sentences.len(), 1);
    }

    #[test]
    fn malformed_sentence_is_skipped_but_others_survive() {
        let path = write_tmp(
            "one-bad-sentence",
            "1\tgood\t_\t_\tNN\t_\t0\troot\n\n1\tbad\t_\t_\tNN\t_\tnotanumber\troot\n\n1\tfine\t_\t_\tVB\t_\t0\troot\n",
        );
        let sentences = read_treebank(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].tokens()[1].form, "good");
        assert_eq!(sentences[1].tokens()[1].form, "fine");
    }

    #[test]
    fn tabs_and_spaces_are_both_accepted_separators() {
        let path = write_tmp("mixed-sep", "1 a  _\t_ NN _ 0 root\n");
        let sentences = read_treebank(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0].tokens()[1].tag, "NN");
    }
}
