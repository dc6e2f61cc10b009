//! Core library for the LLM-intuition teaching demos.
//!
//! This crate provides the algorithmic heart of the demos:
//! - Frequency-based next-word prediction over a small example corpus
//! - Temperature rescaling and weighted sampling of distributions
//! - A step-by-step generation session with history and step-back
//! - A token-stream session with mid-stream branching and replay,
//!   fed by either a scripted playback source or a live streaming API
//!
//! Everything visual (layout, animation, instructional text) lives in
//! front-end layers and is deliberately absent here.

/// Next-word prediction, sampling, and generation-session logic.
///
/// This module exposes the high-level session interface while keeping
/// the probability and sampling primitives individually usable.
pub mod model;

/// Token-stream session, token sources, and the scripted scenario table.
///
/// Covers buffering, cooperative cancellation, branching, and the
/// playback/live source implementations.
pub mod stream;

/// Persisted user preferences (simulated vs. live mode, stored API key).
pub mod prefs;

/// I/O utilities (file loading, path helpers).
pub mod io;
