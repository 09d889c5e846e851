//! Recoverable diagnostics: conditions that drop one sentence or log one
//! warning but never abort a run.
//!
//! Modeled as data, not formatted strings, so a caller (or a test) can
//! match on *which* condition fired without scraping log output. Each
//! variant also knows how to render itself as a source-annotated snippet
//! for human consumption.

use annotate_snippets::display_list::{DisplayList, FormatOptions};
use annotate_snippets::snippet::{Annotation, AnnotationType, Slice, Snippet, SourceAnnotation};

use crate::corpus::CorpusDiagnostic;

/// A single recoverable condition encountered while reading a corpus or
/// filtering it for training.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A treebank line could not be parsed; the sentence containing it was
    /// dropped.
    MalformedLine { raw_line: String, cause: CorpusDiagnostic },
    /// A gold-annotated sentence was excluded from training because its
    /// arc set is non-projective.
    NonProjectiveSentence { sentence_index: usize, corpus_path: String },
}

impl Diagnostic {
    /// Logs this diagnostic at `warn` level, using the annotated-snippet
    /// rendering when source text is available.
    pub fn emit(&self) {
        match self {
            Diagnostic::MalformedLine { raw_line, cause } => {
                log::warn!("{}", render_malformed_line(raw_line, cause));
            }
            Diagnostic::NonProjectiveSentence { sentence_index, corpus_path } => {
                log::warn!(
                    "skipping non-projective sentence #{} from {} (training only)",
                    sentence_index,
                    corpus_path
                );
            }
        }
    }
}

fn render_malformed_line(raw_line: &str, cause: &CorpusDiagnostic) -> String {
    let label = cause.to_string();
    let (origin, annotation_range) = ("treebank line", (0, raw_line.len().max(1)));
    let snippet = Snippet {
        title: Some(Annotation {
            label: Some("skipping sentence with malformed line"),
            id: None,
            annotation_type: AnnotationType::Warning,
        }),
        footer: vec![],
        slices: vec![Slice {
            source: raw_line,
            line_start: 1,
            origin: Some(origin),
            fold: false,
            annotations: vec![SourceAnnotation {
                label: &label,
                annotation_type: AnnotationType::Warning,
                range: annotation_range,
            }],
        }],
        opt: FormatOptions { color: false, ..Default::default() },
    };
    DisplayList::from(snippet).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_line_diagnostic_renders_without_panicking() {
        let diag = Diagnostic::MalformedLine {
            raw_line: "1 a _ _ NN _ notanumber root".to_string(),
            cause: CorpusDiagnostic::BadInteger {
                line: 3,
                column: 6,
                value: "notanumber".to_string(),
            },
        };
        let rendered = match &diag {
            Diagnostic::MalformedLine { raw_line, cause } => render_malformed_line(raw_line, cause),
            _ => unreachable!(),
        };
        assert!(rendered.contains("notanumber"));
    }

    #[test]
    fn non_projective_sentence_diagnostic_is_matchable() {
        let diag = Diagnostic::NonProjectiveSentence {
            sentence_index: 4,
            corpus_path: "train.conll".to_string(),
        };
        use assert_matches::assert_matches;
        assert_matches!(diag, Diagnostic::NonProjectiveSentence { sentence_index: 4, .. });
    }
}
