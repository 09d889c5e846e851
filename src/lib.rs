//! A beam-search, easy-first transition-based dependency parser trained
//! with a structured perceptron.
//!
//! At each step the engine picks an adjacent pair of still-unattached
//! tokens and attaches one to the other (`left`/`right`), scoring every
//! candidate action with a shared classifier and keeping only the
//! highest-scoring `beam_size` resulting parses. Training runs the same
//! expansion under an oracle that tracks a side beam of gold-consistent
//! states, applying an early update the moment that beam falls off the
//! main one, or a final update if the completed parse disagrees with gold.

pub mod beam;
pub mod corpus;
pub mod deps;
pub mod diag;
pub mod error;
pub mod features;
pub mod model;
pub mod oracle;
pub mod parser;
pub mod perceptron;
pub mod projectivity;
pub mod token;

#[cfg(feature = "dot")]
pub mod export;
