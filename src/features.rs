//! The feature extractor contract and a default implementation.
//!
//! The extractor is an external collaborator: given
//! `(pending, deps, focus_index)` it returns an ordered multiset of opaque
//! feature strings describing the pair `(pending[i], pending[i+1])`. It must
//! be deterministic and referentially transparent in its three arguments.
//! `FeatureExtractor` captures that contract as a trait so the parser engine
//! never depends on the default templates below.

use tinyvec::TinyVec;

use crate::deps::DepSet;
use crate::token::Token;

/// The local feature bag returned for one pending pair. Bounded and small in
/// the default extractor, so it lives inline rather than on the heap in the
/// common case.
pub type LocalFeatures = TinyVec<[String; 8]>;

pub trait FeatureExtractor {
    /// `pending` is the full pending list (as token references, in order);
    /// `i` indexes the left member of the focus pair, so
    /// `0 <= i < pending.len() - 1`.
    fn extract(&self, pending: &[&Token], deps: &DepSet, i: usize) -> LocalFeatures;
}

/// Form- and tag-based templates over the focus pair and its immediate
/// neighbours, including the simplest possible template,
/// `"L:"+tok1.form+"|R:"+tok2.form`, as one of several.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFeatureExtractor;

impl FeatureExtractor for DefaultFeatureExtractor {
    fn extract(&self, pending: &[&Token], _deps: &DepSet, i: usize) -> LocalFeatures {
        let left = pending[i];
        let right = pending[i + 1];
        let mut feats = LocalFeatures::new();

        feats.push(format!("L:{}|R:{}", left.form, right.form));
        feats.push(format!("LT:{}|RT:{}", left.tag, right.tag));
        feats.push(format!("LF:{}", left.form));
        feats.push(format!("RF:{}", right.form));
        feats.push(format!("LT:{}", left.tag));
        feats.push(format!("RT:{}", right.tag));

        if i > 0 {
            feats.push(format!("OL:{}", pending[i - 1].tag));
        }
        if i + 2 < pending.len() {
            feats.push(format!("OR:{}", pending[i + 2].tag));
        }

        feats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Sentence;

    fn sent() -> Sentence {
        Sentence::from_tokens(vec![
            Token {
                id: 1,
                form: "a".into(),
                tag: "NN".into(),
                parent_id: 0,
                label: String::new(),
            },
            Token {
                id: 2,
                form: "b".into(),
                tag: "VB".into(),
                parent_id: 1,
                label: String::new(),
            },
        ])
    }

    #[test]
    fn extractor_is_referentially_transparent() {
        let s = sent();
        let pending: Vec<&Token> = s.tokens().iter().collect();
        let deps = DepSet::new();
        let extractor = DefaultFeatureExtractor;
        let a = extractor.extract(&pending, &deps, 0);
        let b = extractor.extract(&pending, &deps, 0);
        assert_eq!(a, b);
    }

    #[test]
    fn simplest_template_is_left_right_form_pair() {
        let s = sent();
        let pending: Vec<&Token> = s.tokens().iter().collect();
        let deps = DepSet::new();
        let feats = DefaultFeatureExtractor.extract(&pending, &deps, 0);
        assert!(feats.iter().any(|f| f == "L:ROOT|R:a"));
    }
}
