//! The parser engine: beam expansion for decoding, and early-update
//! structured-perceptron training on top of the same expansion rule.
//!
//! States for one sentence's parse are bump-allocated out of a per-sentence
//! `typed_arena::Arena`, which is dropped once that sentence's parse (decode
//! or train) finishes. The per-state delta is one arc and one removed
//! token, so arena allocation avoids giving every one of the `O(k·n²)`
//! ephemeral states its own independently-tracked heap lifetime.

use std::rc::Rc;
use typed_arena::Arena;

use crate::beam::Beam;
use crate::deps::DepSet;
use crate::error::{Error, Result};
use crate::features::FeatureExtractor;
use crate::oracle::Oracle;
use crate::perceptron::{Class, Perceptron, LEFT, RIGHT};
use crate::token::{Sentence, Token};

/// One link in the persistent prefix chain of local feature bags. A
/// state's global feature bag is its parent's bag plus the local features
/// of the action that produced it (`child.features ≡ parent.features ++
/// local_features`), without copying the parent's share of the bag.
struct FeatureLink {
    local: crate::features::LocalFeatures,
    parent: FeatureChain,
}

#[derive(Clone)]
pub struct FeatureChain(Option<Rc<FeatureLink>>);

impl FeatureChain {
    pub fn empty() -> FeatureChain {
        FeatureChain(None)
    }

    fn extend(&self, local: crate::features::LocalFeatures) -> FeatureChain {
        FeatureChain(Some(Rc::new(FeatureLink {
            local,
            parent: self.clone(),
        })))
    }

    /// Flattens the chain into a single feature list, oldest action first.
    /// Only ever called on `update`, at most once per sentence.
    pub fn flatten(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect(&self, out: &mut Vec<String>) {
        if let Some(link) = &self.0 {
            link.parent.collect(out);
            out.extend(link.local.iter().cloned());
        }
    }
}

/// A partial parse: the still-pending tokens, the arcs committed so far,
/// and enough bookkeeping to score and extend it by one more attachment.
pub struct State {
    /// Token ids still awaiting attachment, in sentence order.
    pub pending: Vec<u32>,
    pub features: FeatureChain,
    pub score: f64,
    pub last_class: Option<Class>,
    pub deps: DepSet,
    pub on_gold_prefix: bool,
}

impl State {
    fn initial(sentence: &Sentence) -> State {
        State {
            pending: sentence.tokens().iter().map(|t| t.id).collect(),
            features: FeatureChain::empty(),
            score: f64::NEG_INFINITY,
            last_class: None,
            deps: DepSet::new(),
            on_gold_prefix: true,
        }
    }

    /// Adds `step_score` to this state's score under class `c`'s
    /// attachment, honouring the `-inf` sentinel (the first real score
    /// replaces it rather than being added to it).
    fn advanced_score(&self, step_score: f64) -> f64 {
        if self.score == f64::NEG_INFINITY {
            step_score
        } else {
            self.score + step_score
        }
    }
}

/// Outcome of training on one sentence: which branch of the early-update /
/// final-update state machine fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The gold-consistent candidate fell off the beam at this (0-based)
    /// step; an early update fired here.
    EarlyMiss { step: usize },
    /// The parse completed and matched the gold tree exactly; no update,
    /// only `tick()`.
    CompleteAgree,
    /// The parse completed but disagreed with gold; a final update fired.
    CompleteDisagree,
}

fn build_gold_deps(sentence: &Sentence) -> DepSet {
    let mut deps = DepSet::new();
    for tok in sentence.tokens().iter().skip(1) {
        deps.add(tok.parent_id, tok.id);
    }
    deps
}

fn pending_tokens<'s>(sentence: &'s Sentence, pending: &[u32]) -> Vec<&'s Token> {
    pending.iter().map(|&id| sentence.token(id)).collect()
}

/// Runs the beam-expansion rule (decoding variant) for one step, producing
/// the next beam from `beam`. Training uses the same underlying expansion
/// (`expand_one_with_oracle`) inlined alongside its early-update bookkeeping
/// in `train_sentence`, since it additionally needs the side `best_valid`
/// beam threaded through the loop.
fn expand_decode_step<'a, X: FeatureExtractor>(
    beam: &Beam<'a>,
    sentence: &Sentence,
    perceptron: &Perceptron,
    extractor: &X,
    arena: &'a Arena<State>,
) -> Result<Beam<'a>> {
    let mut next = Beam::new(beam.capacity());
    for state in beam.iterate() {
        expand_one_with_oracle(state, sentence, None, perceptron, extractor, arena, &mut |child| {
            next.add(child);
        });
    }
    if next.size() == 0 {
        return Err(Error::EmptyBeam { step: 0 });
    }
    Ok(next)
}

fn expand_one_with_oracle<'a, X: FeatureExtractor>(
    state: &'a State,
    sentence: &Sentence,
    oracle: Option<&Oracle>,
    perceptron: &Perceptron,
    extractor: &X,
    arena: &'a Arena<State>,
    offer: &mut impl FnMut(&'a State),
) {
    let toks = pending_tokens(sentence, &state.pending);
    for i in 0..toks.len() - 1 {
        let local = extractor.extract(&toks, &state.deps, i);
        let (s0, s1) = perceptron.score(&local[..]);
        let tok1 = toks[i];
        let tok2 = toks[i + 1];

        for (class, step_score) in [(LEFT, s0), (RIGHT, s1)] {
            let (head, child, remove_idx) = if class == LEFT {
                (tok2.id, tok1.id, i)
            } else {
                (tok1.id, tok2.id, i + 1)
            };

            let mut new_pending = state.pending.clone();
            new_pending.remove(remove_idx);
            let mut new_deps = state.deps.clone();
            new_deps.add(head, child);

            let on_gold_prefix = match oracle {
                Some(oracle) if state.on_gold_prefix => {
                    let gold_parent_of_child = sentence.token(child).parent_id;
                    oracle.allow(&state.deps, head, child, gold_parent_of_child)
                }
                _ => false,
            };

            let child_state = arena.alloc(State {
                pending: new_pending,
                features: state.features.extend(local.clone()),
                score: state.advanced_score(step_score),
                last_class: Some(class),
                deps: new_deps,
                on_gold_prefix,
            });
            offer(child_state);
        }
    }
}

fn apply_update(perceptron: &mut Perceptron, positive: &State, negative: &State) {
    let pos_feats = positive.features.flatten();
    let neg_feats = negative.features.flatten();
    let pos_class = positive
        .last_class
        .expect("a state offered for update is never the untouched initial state");
    let neg_class = negative
        .last_class
        .expect("a state offered for update is never the untouched initial state");
    perceptron.update(&pos_feats, pos_class, &neg_feats, neg_class);
}

/// Parses `sentence` to completion under fixed weights and returns the
/// winning state's arc set.
pub fn decode<X: FeatureExtractor>(
    sentence: &Sentence,
    perceptron: &Perceptron,
    extractor: &X,
    beam_size: usize,
) -> Result<DepSet> {
    let arena = Arena::new();
    let init = arena.alloc(State::initial(sentence));
    let mut beam = Beam::new(beam_size);
    beam.add(init);

    let steps = sentence.len().saturating_sub(1);
    for _ in 0..steps {
        beam = expand_decode_step(&beam, sentence, perceptron, extractor, &arena)?;
    }
    Ok(beam
        .top()
        .expect("beam is never empty by construction")
        .deps
        .clone())
}

/// Trains on one sentence with early-update structured-perceptron
/// learning, mutating `perceptron` in place, and reports which branch of
/// the state machine fired.
pub fn train_sentence<X: FeatureExtractor>(
    sentence: &Sentence,
    perceptron: &mut Perceptron,
    extractor: &X,
    beam_size: usize,
) -> Result<Phase> {
    let oracle = Oracle::new(sentence)?;
    let gold_deps = build_gold_deps(sentence);

    let arena = Arena::new();
    let init = arena.alloc(State::initial(sentence));
    let mut beam = Beam::new(beam_size);
    beam.add(init);

    let steps = sentence.len().saturating_sub(1);
    let mut last_best_valid: Option<&State> = None;

    for step in 0..steps {
        let mut next = Beam::new(beam_size);
        let mut best_valid_beam: Beam = Beam::new(1);
        for state in beam.iterate() {
            expand_one_with_oracle(
                state,
                sentence,
                Some(&oracle),
                perceptron,
                extractor,
                &arena,
                &mut |child| {
                    if child.on_gold_prefix {
                        best_valid_beam.add(child);
                    }
                    next.add(child);
                },
            );
        }
        if next.size() == 0 {
            return Err(Error::EmptyBeam { step });
        }
        let best_valid = best_valid_beam.top();

        let survived = match best_valid {
            Some(bv) => next.contains(bv),
            None => false,
        };
        beam = next;
        if let Some(bv) = best_valid {
            last_best_valid = Some(bv);
        }

        if !survived {
            let top = beam.top().expect("beam is never empty by construction");
            let positive = last_best_valid.expect(
                "a gold-consistent state exists at least at step 0, from the trivially-valid initial state",
            );
            apply_update(perceptron, positive, top);
            return Ok(Phase::EarlyMiss { step });
        }
    }

    let top = beam.top().expect("beam is never empty by construction");
    if top.deps == gold_deps {
        perceptron.tick();
        Ok(Phase::CompleteAgree)
    } else {
        let positive = last_best_valid
            .expect("a completed parse always passed through at least one expansion step");
        apply_update(perceptron, positive, top);
        Ok(Phase::CompleteDisagree)
    }
}
