//! The crate's single fatal-error hierarchy.
//!
//! Recoverable conditions (a malformed treebank line, a skipped
//! non-projective sentence) are reported through `diag` and never become an
//! `Error`; only conditions that must abort the current subcommand are
//! represented here.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Fatal errors that unwind out of `train`/`test` and become a non-zero exit
/// code.
#[derive(Debug)]
pub enum Error {
    /// Wraps any I/O failure (opening the corpus, creating the model
    /// directory, writing or reading a weight file).
    Io(io::Error),
    /// The weight file for the requested iteration tag does not exist.
    MissingModel(PathBuf),
    /// A saved weight file could not be parsed back into a classifier.
    CorruptModel { path: PathBuf, reason: String },
    /// A sentence's gold parent relation is not a tree rooted at ROOT.
    NotATree { sentence_index: usize, reason: String },
    /// Beam expansion produced an empty beam; this can only happen from a
    /// bug in the expansion rule itself, never from ordinary input.
    EmptyBeam { step: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::MissingModel(path) => {
                write!(f, "model file not found: {}", path.display())
            }
            Error::CorruptModel { path, reason } => {
                write!(f, "could not load model {}: {}", path.display(), reason)
            }
            Error::NotATree { sentence_index, reason } => write!(
                f,
                "gold tree for sentence {} is not a tree: {}",
                sentence_index, reason
            ),
            Error::EmptyBeam { step } => {
                write!(f, "beam emptied after expansion at step {} (internal bug)", step)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
