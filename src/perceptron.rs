//! A sparse, two-class, averaged-perceptron classifier.
//!
//! Averaging uses the standard "lazy" trick: rather than re-summing every
//! weight at every step, each weight remembers the step at which it was last
//! touched and only flushes its contribution to the running sum when it is
//! touched again (or when the model is saved). This keeps update and score
//! cost proportional to the number of *active* features, not to the size of
//! the vocabulary or the number of steps trained.

use fnv::FnvHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};

/// The two action classes the parser engine distinguishes.
pub type Class = u8;
pub const LEFT: Class = 0;
pub const RIGHT: Class = 1;

#[derive(Debug, Clone, Copy, Default)]
struct WeightCell {
    /// The perceptron's raw (un-averaged) weight, as of `last_update`.
    current: f64,
    /// Running sum of `current` over all elapsed steps, lazily caught up.
    total: f64,
    /// Step count at which `total` was last brought up to date.
    last_update: u64,
}

impl WeightCell {
    fn flush(&mut self, now: u64) {
        let elapsed = (now - self.last_update) as f64;
        self.total += elapsed * self.current;
        self.last_update = now;
    }
}

/// The online linear model. Owns the feature vocabulary: callers pass
/// opaque feature strings and never see an index.
#[derive(Debug, Default)]
pub struct Perceptron {
    weights: FnvHashMap<String, [WeightCell; 2]>,
    t: u64,
}

impl Perceptron {
    pub fn new() -> Perceptron {
        Perceptron {
            weights: FnvHashMap::default(),
            t: 0,
        }
    }

    /// Sum of current (not averaged) weights of `features` for each class.
    pub fn score<S: AsRef<str>>(&self, features: &[S]) -> (f64, f64) {
        let mut s0 = 0.0;
        let mut s1 = 0.0;
        for f in features {
            if let Some(cells) = self.weights.get(f.as_ref()) {
                s0 += cells[0].current;
                s1 += cells[1].current;
            }
        }
        (s0, s1)
    }

    /// Rewards `features_pos` under `class_pos` by `+1`, penalises
    /// `features_neg` under `class_neg` by `-1`, then advances the step
    /// counter.
    pub fn update<S: AsRef<str>>(
        &mut self,
        features_pos: &[S],
        class_pos: Class,
        features_neg: &[S],
        class_neg: Class,
    ) {
        for f in features_pos {
            self.bump(f.as_ref(), class_pos, 1.0);
        }
        for f in features_neg {
            self.bump(f.as_ref(), class_neg, -1.0);
        }
        self.t += 1;
    }

    /// Advances the step counter without touching any weight. Used when a
    /// sentence is parsed correctly and no update is warranted, so that the
    /// averaging denominator still reflects the number of sentences seen.
    pub fn tick(&mut self) {
        self.t += 1;
    }

    fn bump(&mut self, feature: &str, class: Class, delta: f64) {
        let cells = self
            .weights
            .entry(feature.to_string())
            .or_insert_with(Default::default);
        let cell = &mut cells[class as usize];
        cell.flush(self.t);
        cell.current += delta;
    }

    /// The averaged weight vector: `(feature, class) -> running_sum / t`.
    /// Exposed mainly for tests asserting on the save/load round trip.
    pub fn averaged_weights(&self) -> FnvHashMap<(String, Class), f64> {
        let mut out = FnvHashMap::default();
        for (feature, cells) in &self.weights {
            for (class, cell) in cells.iter().enumerate() {
                let mut flushed = *cell;
                flushed.flush(self.t);
                if flushed.total != 0.0 {
                    let avg = if self.t > 0 {
                        flushed.total / self.t as f64
                    } else {
                        0.0
                    };
                    out.insert((feature.clone(), class as Class), avg);
                }
            }
        }
        out
    }

    /// Persists the averaged weight vector (not the raw, un-averaged
    /// weights) to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        use itertools::Itertools;

        let file = File::create(path)?;
        let mut w = BufWriter::new(file);
        let rows = self
            .averaged_weights()
            .into_iter()
            .sorted_by_key(|((feature, class), _)| (feature.clone(), *class));
        for ((feature, class), weight) in rows {
            writeln!(w, "{}\t{}\t{:.17}", feature, class, weight)?;
        }
        Ok(())
    }

    /// Loads a perceptron previously written by `save`. The loaded model's
    /// `score` immediately reflects the averaged weights (there is no
    /// un-averaged state to recover); further training on a loaded model is
    /// supported but starts a fresh averaging window from `t = 0`.
    pub fn load(path: &Path) -> Result<Perceptron> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::MissingModel(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;
        let reader = BufReader::new(file);
        let mut model = Perceptron::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let mut parts = line.splitn(3, '\t');
            let (feature, class, weight) = match (parts.next(), parts.next(), parts.next()) {
                (Some(f), Some(c), Some(w)) => (f, c, w),
                _ => {
                    return Err(Error::CorruptModel {
                        path: path.to_path_buf(),
                        reason: format!("line {}: expected 3 tab-separated fields", lineno + 1),
                    })
                }
            };
            let class: Class = class.parse().map_err(|_| Error::CorruptModel {
                path: path.to_path_buf(),
                reason: format!("line {}: bad class {:?}", lineno + 1, class),
            })?;
            let weight: f64 = weight.parse().map_err(|_| Error::CorruptModel {
                path: path.to_path_buf(),
                reason: format!("line {}: bad weight {:?}", lineno + 1, weight),
            })?;
            let cells = model.weights.entry(feature.to_string()).or_insert_with(Default::default);
            cells[class as usize] = WeightCell {
                current: weight,
                total: weight,
                last_update: 1,
            };
        }
        model.t = 1;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn tmp_path(name: &str) -> std::path::PathBuf {
        let mut p = env::temp_dir();
        p.push(format!("beamdep-test-{}-{}", std::process::id(), name));
        p
    }

    #[test]
    fn update_then_score_reflects_raw_weight() {
        let mut p = Perceptron::new();
        p.update(&["f1", "f2"], RIGHT, &["f3"], LEFT);
        let (s0, s1) = p.score(&["f1"]);
        assert_eq!(s0, 0.0);
        assert_eq!(s1, 1.0);
        let (s0, _) = p.score(&["f3"]);
        assert_eq!(s0, -1.0);
    }

    #[test]
    fn unseen_feature_scores_zero() {
        let p = Perceptron::new();
        assert_eq!(p.score(&["nope"]), (0.0, 0.0));
    }

    #[test]
    fn tick_advances_t_without_changing_weights() {
        let mut p = Perceptron::new();
        p.update(&["f1"], RIGHT, &["f2"], LEFT);
        let before = p.averaged_weights();
        p.tick();
        // current weights unaffected; only the averaging denominator moves.
        let (s0, s1) = p.score(&["f1"]);
        assert_eq!((s0, s1), (0.0, 1.0));
        assert_ne!(p.averaged_weights(), before);
    }

    #[test]
    fn save_load_round_trip() {
        let mut p = Perceptron::new();
        p.update(&["f1", "f2"], RIGHT, &["f2"], LEFT);
        p.tick();
        p.update(&["f1"], LEFT, &["f3"], RIGHT);
        let path = tmp_path("roundtrip");
        p.save(&path).unwrap();
        let loaded = Perceptron::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let original = p.averaged_weights();
        let restored = loaded.averaged_weights();
        assert_eq!(original.len(), restored.len());
        for (key, value) in &original {
            let got = restored.get(key).copied().unwrap_or(0.0);
            assert!((got - value).abs() < 1e-9, "key {:?}: {} vs {}", key, got, value);
        }
    }

    #[test]
    fn load_missing_file_is_missing_model_error() {
        let path = tmp_path("does-not-exist");
        match Perceptron::load(&path) {
            Err(Error::MissingModel(p)) => assert_eq!(p, path),
            other => panic!("expected MissingModel, got {:?}", other),
        }
    }
}
