//! Top-level module for the next-word prediction system.
//!
//! This module provides a word-level prediction and generation engine,
//! including:
//! - An editable example corpus with derived vocabulary (`Corpus`)
//! - Count-based next-word probability computation (`probability`)
//! - Temperature rescaling and weighted sampling (`TemperatureSampler`)
//! - An append/rollback generation log (`GenerationHistory`)
//! - A high-level generation session (`GenerationSession`)

/// Editable corpus of example sentences and its derived vocabulary.
///
/// Handles tokenization (lower-case, whitespace split, punctuation kept
/// attached) and the canonical default sentence set.
pub mod corpus;

/// Count-based next-word probability computation.
///
/// Exposes the insertion-ordered `Distribution` type and the pure
/// `compute` function over (corpus, context).
pub mod probability;

/// Temperature rescaling, weighted sampling, and top-k extraction.
pub mod sampler;

/// Generation step records and the append/rollback history log.
pub mod history;

/// High-level generation session tying corpus, context, probabilities,
/// temperature, and history together.
///
/// This is the object front ends own; one session per demo instance.
pub mod session;
