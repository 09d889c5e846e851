//! The training-time oracle.
//!
//! Built once per sentence from its gold parents. Easy-first may attach a
//! child only after that child has collected all of *its own* gold
//! dependents, otherwise those dependents become unreachable (the child is
//! gone from the pending list, so nothing can attach to it any more).

use fnv::FnvHashMap;

use crate::deps::{Arc, DepSet};
use crate::error::{Error, Result};
use crate::token::{Sentence, ROOT_ID};

pub struct Oracle {
    /// For each token id, the set of gold arcs in which it is the head.
    gold_children_of: FnvHashMap<u32, Vec<Arc>>,
}

impl Oracle {
    /// Validates that `sentence`'s gold parent relation is a tree rooted at
    /// ROOT (no cycles, every non-root token has a path to ROOT) and builds
    /// the oracle from it. Fatal if the gold data is not a tree.
    pub fn new(sentence: &Sentence) -> Result<Oracle> {
        let tokens = sentence.tokens();

        for tok in tokens.iter().skip(1) {
            if tok.parent_id == tok.id {
                return Err(Error::NotATree {
                    sentence_index: 0,
                    reason: format!("token {} is its own gold parent", tok.id),
                });
            }
        }

        // Walk each token's ancestor chain; if it doesn't terminate at ROOT
        // within `tokens.len()` hops, there's a cycle.
        for tok in tokens.iter().skip(1) {
            let mut cur = tok.parent_id;
            let mut hops = 0usize;
            while cur != ROOT_ID {
                if hops > tokens.len() {
                    return Err(Error::NotATree {
                        sentence_index: 0,
                        reason: format!("cycle reachable from token {}", tok.id),
                    });
                }
                if cur as usize >= tokens.len() {
                    return Err(Error::NotATree {
                        sentence_index: 0,
                        reason: format!("token {} has out-of-range gold parent {}", tok.id, cur),
                    });
                }
                cur = tokens[cur as usize].parent_id;
                hops += 1;
            }
        }

        let mut gold_children_of: FnvHashMap<u32, Vec<Arc>> = FnvHashMap::default();
        for tok in tokens.iter().skip(1) {
            gold_children_of
                .entry(tok.parent_id)
                .or_default()
                .push(Arc::new(tok.parent_id, tok.id));
        }

        Ok(Oracle { gold_children_of })
    }

    /// Whether attaching `child` under `head` is still consistent with
    /// completing the gold tree, given the arcs already committed in
    /// `deps`.
    pub fn allow(&self, deps: &DepSet, head: u32, child: u32, gold_parent_of_child: u32) -> bool {
        if gold_parent_of_child != head {
            return false;
        }
        match self.gold_children_of.get(&child) {
            None => true,
            Some(required) => required.iter().all(|arc| deps.contains_arc(arc)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Token;

    fn tok(id: u32, parent_id: u32) -> Token {
        Token {
            id,
            form: id.to_string(),
            tag: "X".into(),
            parent_id,
            label: String::new(),
        }
    }

    #[test]
    fn self_parent_is_rejected() {
        use assert_matches::assert_matches;
        let sent = Sentence::from_tokens(vec![tok(1, 1)]);
        assert_matches!(Oracle::new(&sent), Err(Error::NotATree { .. }));
    }

    #[test]
    fn cycle_is_rejected() {
        use assert_matches::assert_matches;
        // 1 -> 2 -> 1, neither reaches ROOT.
        let sent = Sentence::from_tokens(vec![tok(1, 2), tok(2, 1)]);
        assert_matches!(Oracle::new(&sent), Err(Error::NotATree { .. }));
    }

    #[test]
    fn chain_forbids_attaching_parent_before_child_is_saturated() {
        // ROOT -> a(1) -> b(2); oracle must forbid (ROOT, a) until (a, b) is in deps.
        let sent = Sentence::from_tokens(vec![tok(1, 0), tok(2, 1)]);
        let oracle = Oracle::new(&sent).unwrap();
        let empty = DepSet::new();
        assert!(!oracle.allow(&empty, 0, 1, 0));
        assert!(oracle.allow(&empty, 1, 2, 1));

        let mut deps = DepSet::new();
        deps.add(1, 2);
        assert!(oracle.allow(&deps, 0, 1, 0));
    }

    #[test]
    fn leaf_with_no_gold_children_is_always_attachable() {
        let sent = Sentence::from_tokens(vec![tok(1, 0)]);
        let oracle = Oracle::new(&sent).unwrap();
        assert!(oracle.allow(&DepSet::new(), 0, 1, 0));
    }
}
