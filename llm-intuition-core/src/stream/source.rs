use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

/// Maximum number of alternatives kept per token.
pub const MAX_ALTERNATIVES: usize = 5;

/// One alternative token with its probability.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TokenAlternative {
	pub token: String,
	pub probability: f64,
}

/// One emitted token with its probability and top alternatives.
///
/// Immutable once appended to a session buffer, except at a branch
/// point, where the whole record is substituted.
///
/// # Invariants
/// - `alternatives.len() <= MAX_ALTERNATIVES`
/// - Probabilities are linear (0..=1), already converted from
///   log-probabilities by the source
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TokenRecord {
	/// The token text as generated (may carry leading whitespace).
	pub token: String,
	/// Probability of this token.
	pub probability: f64,
	/// Top alternative tokens, most probable first.
	pub alternatives: Vec<TokenAlternative>,
}

impl TokenRecord {
	/// Builds a record, truncating the alternatives to
	/// [`MAX_ALTERNATIVES`].
	pub fn new(token: &str, probability: f64, mut alternatives: Vec<TokenAlternative>) -> Self {
		alternatives.truncate(MAX_ALTERNATIVES);
		Self { token: token.to_owned(), probability, alternatives }
	}
}

/// One chat message in the wire format the live endpoint expects.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChatMessage {
	pub role: String,
	pub content: String,
}

impl ChatMessage {
	pub fn new(role: &str, content: &str) -> Self {
		Self { role: role.to_owned(), content: content.to_owned() }
	}
}

/// A request for one streamed generation.
///
/// `messages`, when set, overrides the default `[system?, user]` pair —
/// used for branch continuation with an assistant prefix. `resume_from`
/// tells a scripted source how many tokens the caller already holds so
/// it can emit only the remainder; live sources ignore it (the
/// assistant prefix in `messages` carries the same information).
#[derive(Clone, Debug, Default)]
pub struct StreamRequest {
	pub user_prompt: String,
	pub system_prompt: String,
	pub system_preset: String,
	pub messages: Option<Vec<ChatMessage>>,
	pub resume_from: Option<usize>,
}

impl StreamRequest {
	/// A plain request with no continuation override.
	pub fn new(user_prompt: &str, system_prompt: &str, system_preset: &str) -> Self {
		Self {
			user_prompt: user_prompt.to_owned(),
			system_prompt: system_prompt.to_owned(),
			system_preset: system_preset.to_owned(),
			messages: None,
			resume_from: None,
		}
	}

	/// The message list to send: the override when present, otherwise
	/// `[system (if non-empty), user]`.
	pub fn chat_messages(&self) -> Vec<ChatMessage> {
		if let Some(messages) = &self.messages {
			return messages.clone();
		}
		let mut messages = Vec::new();
		if !self.system_prompt.is_empty() {
			messages.push(ChatMessage::new("system", &self.system_prompt));
		}
		messages.push(ChatMessage::new("user", &self.user_prompt));
		messages
	}
}

/// Cooperative cancellation flag shared between a session and the
/// source it is driving.
///
/// Sources must check [`CancelToken::is_cancelled`] between emitted
/// tokens and stop promptly; there is no forced preemption.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
	cancelled: Arc<AtomicBool>,
}

impl CancelToken {
	pub fn new() -> Self {
		Self { cancelled: Arc::new(AtomicBool::new(false)) }
	}

	/// Signals cancellation. Idempotent.
	pub fn cancel(&self) {
		self.cancelled.store(true, Ordering::SeqCst);
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancelled.load(Ordering::SeqCst)
	}
}

/// Failure modes of a token source.
///
/// `Cancelled` exists for control flow only: a user-initiated
/// cancellation must never be surfaced as an error or populate a
/// session's error field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceError {
	/// The live source was invoked with no resolvable API key.
	MissingCredential,
	/// Non-success response or malformed stream, with detail.
	Transport(String),
	/// The cancellation token was observed mid-stream.
	Cancelled,
}

impl fmt::Display for SourceError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SourceError::MissingCredential => write!(
				f,
				"No API key found. Set OPENAI_API_KEY or store a key in the preferences file"
			),
			SourceError::Transport(detail) => write!(f, "Streaming failed: {}", detail),
			SourceError::Cancelled => write!(f, "Stream cancelled"),
		}
	}
}

impl std::error::Error for SourceError {}

/// A source of token records for one generation.
///
/// Implementations stream tokens to `on_token` until exhaustion,
/// checking `cancel` between emissions. There are two concrete
/// implementations: a scripted playback source and a live streaming
/// client.
pub trait TokenSource {
	fn stream(
		&self,
		request: &StreamRequest,
		cancel: &CancelToken,
		on_token: &mut dyn FnMut(TokenRecord),
	) -> Result<(), SourceError>;
}
