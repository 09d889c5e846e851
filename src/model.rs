//! Weight-file path conventions and directory lifecycle for saved models.
//!
//! Weights live at `<model_dir>/weight.<tag>`, `<tag>` being either an
//! iteration number or the literal `FINAL`. This module owns only the path
//! convention and directory bookkeeping; the weight file's own format is
//! `Perceptron::save`/`load`'s business.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::perceptron::Perceptron;

/// Which checkpoint within a model directory to address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    Iteration(u32),
    Final,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Iteration(n) => write!(f, "{}", n),
            Tag::Final => write!(f, "FINAL"),
        }
    }
}

/// The path a given tag's weight file lives (or would live) at.
pub fn weight_path(model_dir: &Path, tag: &Tag) -> PathBuf {
    model_dir.join(format!("weight.{}", tag))
}

/// Creates `model_dir` (and any missing parents) if it does not already
/// exist, then saves `perceptron` to the path for `tag`.
pub fn checkpoint(model_dir: &Path, tag: &Tag, perceptron: &Perceptron) -> Result<PathBuf> {
    std::fs::create_dir_all(model_dir)?;
    let path = weight_path(model_dir, tag);
    perceptron.save(&path)?;
    log::info!("wrote checkpoint {}", path.display());
    Ok(path)
}

/// Loads the weight file for `tag` out of `model_dir`. A missing file is
/// the caller's `Error::MissingModel`, naming the exact path that was
/// expected, not a panic.
pub fn load(model_dir: &Path, tag: &Tag) -> Result<Perceptron> {
    let path = weight_path(model_dir, tag);
    Perceptron::load(&path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_dir(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("beamdep-model-test-{}-{}", std::process::id(), name));
        p
    }

    #[test]
    fn tag_formats_match_the_weight_path_convention() {
        let dir = Path::new("/models/run1");
        assert_eq!(weight_path(dir, &Tag::Iteration(7)), Path::new("/models/run1/weight.7"));
        assert_eq!(weight_path(dir, &Tag::Final), Path::new("/models/run1/weight.FINAL"));
    }

    #[test]
    fn checkpoint_creates_missing_directory() {
        let dir = tmp_dir("fresh-dir");
        std::fs::remove_dir_all(&dir).ok();
        let perceptron = Perceptron::new();
        let path = checkpoint(&dir, &Tag::Iteration(1), &perceptron).unwrap();
        assert!(path.exists());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_missing_tag_is_missing_model_error() {
        use assert_matches::assert_matches;
        let dir = tmp_dir("nothing-here");
        std::fs::remove_dir_all(&dir).ok();
        assert_matches!(load(&dir, &Tag::Final), Err(crate::error::Error::MissingModel(_)));
    }
}
