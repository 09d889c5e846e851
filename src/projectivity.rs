//! The projectivity filter.
//!
//! Used only to keep non-projective sentences out of training, where the
//! easy-first action space (adjacent-pair attachment over a pending list)
//! cannot reach them. Decoding is unaffected: it never consults a gold
//! tree.

use crate::token::Sentence;

/// True if no two gold arcs of `sentence` cross when drawn as arcs above
/// the linear token order (including ROOT at position 0).
///
/// Two arcs `(h1, c1)` and `(h2, c2)` cross when each spans over exactly
/// one endpoint of the other: writing `lo`/`hi` for the smaller/larger of
/// an arc's two endpoints, they cross iff `lo1 < lo2 < hi1 < hi2` or the
/// symmetric case.
pub fn is_projective(sentence: &Sentence) -> bool {
    let tokens = sentence.tokens();
    let arcs: Vec<(u32, u32)> = tokens
        .iter()
        .skip(1)
        .map(|t| {
            let (lo, hi) = if t.parent_id < t.id {
                (t.parent_id, t.id)
            } else {
                (t.id, t.parent_id)
            };
            (lo, hi)
        })
        .collect();

    for i in 0..arcs.len() {
        for j in (i + 1)..arcs.len() {
            let (lo1, hi1) = arcs[i];
            let (lo2, hi2) = arcs[j];
            if crosses(lo1, hi1, lo2, hi2) {
                return false;
            }
        }
    }
    true
}

fn crosses(lo1: u32, hi1: u32, lo2: u32, hi2: u32) -> bool {
    (lo1 < lo2 && lo2 < hi1 && hi1 < hi2) || (lo2 < lo1 && lo1 < hi2 && hi2 < hi1)
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
    fn chain_is_projective() {
        let sent = Sentence::from_tokens(vec![tok(1, 0), tok(2, 1), tok(3, 2)]);
        assert!(is_projective(&sent));
    }

    #[test]
    fn both_children_of_root_is_projective() {
        let sent = Sentence::from_tokens(vec![tok(1, 0), tok(2, 0)]);
        assert!(is_projective(&sent));
    }

    #[test]
    fn siblings_sharing_a_head_are_projective() {
        let sent = Sentence::from_tokens(vec![tok(1, 0), tok(2, 1), tok(3, 1)]);
        assert!(is_projective(&sent));
    }

    #[test]
    fn interleaved_arcs_are_non_projective() {
        // 1 -> 3 and 2 -> 4: spans (1,3) and (2,4) interleave.
        let sent = Sentence::from_tokens(vec![tok(1, 3), tok(2, 4), tok(3, 0), tok(4, 0)]);
        assert!(!is_projective(&sent));
    }
}
