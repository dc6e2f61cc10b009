//! Token-stream subsystem for the streaming/branching demo.
//!
//! Fully independent from the n-gram prediction subsystem: no shared
//! mutable state. It provides:
//! - Token records and the `TokenSource` abstraction (`source`)
//! - The buffering/branching session state machine (`session`)
//! - A scripted playback source with the scenario table (`playback`)
//! - A live streaming chat-completions client (`live`)

/// Token records, stream requests, cancellation, and the source trait.
pub mod source;

/// The token-stream session: buffer, streaming state, selection,
/// branching, and orchestration over a `TokenSource`.
pub mod session;

/// Scripted playback source and the built-in scenario table.
pub mod playback;

/// Live streaming source over a hosted chat-completions endpoint.
pub mod live;
