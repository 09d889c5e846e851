//! Graphviz DOT export of a parsed dependency tree, for manual inspection.
//! Has no effect on parsing or training; built only under the `dot`
//! feature.

use dot_writer::{Attributes, DotWriter};

use crate::deps::DepSet;
use crate::token::Sentence;

/// Renders one sentence's token forms and its arc set as a DOT digraph.
pub fn to_dot(sentence: &Sentence, deps: &DepSet) -> String {
    let mut buf = Vec::new();
    {
        let mut writer = DotWriter::from(&mut buf);
        writer.set_pretty_print(true);
        let mut graph = writer.digraph();
        for tok in sentence.tokens() {
            graph.node_named(node_id(tok.id)).set_label(&tok.form);
        }
        for arc in deps.iter() {
            graph.edge(node_id(arc.head), node_id(arc.child));
        }
    }
    String::from_utf8(buf).expect("dot-writer only ever emits valid UTF-8")
}

fn node_id(token_id: u32) -> String {
    format!("n{}", token_id)
}
