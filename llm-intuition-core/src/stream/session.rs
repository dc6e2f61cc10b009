use log::debug;

use super::source::{
	CancelToken, ChatMessage, SourceError, StreamRequest, TokenRecord, TokenSource,
};

/// System prompt presets offered by the demo, as `(name, text)` pairs.
///
/// `Custom` is a placeholder: the UI supplies its own text for it.
pub const SYSTEM_PRESETS: [(&str, &str); 6] = [
	("None", ""),
	("Helpful Assistant", "You are a helpful, concise assistant."),
	("Pirate", "You are a pirate. Always respond in pirate speak."),
	(
		"Data Scientist",
		"You are a data scientist. Use precise technical language and include relevant statistical concepts.",
	),
	("JSON Only", "You must respond with valid JSON only. No other text."),
	("Custom", ""),
];

/// Session state for the token-stream demo.
///
/// # Responsibilities
/// - Buffer token records from a [`TokenSource`]
/// - Track streaming state, token selection, and the last error
/// - Branch: replace a buffered token with an alternative, discard the
///   suffix, and arm a continuation re-stream
/// - Orchestrate a source run, translating source errors into state
///
/// # Invariants
/// - At most one generation in flight; `start` cancels the previous one
/// - `streaming == true` implies a live cancellation handle is held
/// - A user-initiated cancellation never populates `error`
/// - No terminal dead state: `start` is always possible
#[derive(Debug, Default)]
pub struct TokenStreamSession {
	tokens: Vec<TokenRecord>,
	streaming: bool,
	selected: Option<usize>,
	pending_branch: bool,
	error: Option<String>,
	handle: Option<CancelToken>,
	user_prompt: String,
	system_prompt: String,
	system_preset: String,
}

impl TokenStreamSession {
	/// Creates an idle session with the `None` preset.
	pub fn new() -> Self {
		Self {
			system_preset: "None".to_owned(),
			..Self::default()
		}
	}

	/// Sets the user prompt for subsequent generations.
	pub fn set_user_prompt(&mut self, prompt: &str) {
		self.user_prompt = prompt.to_owned();
	}

	/// Sets the system prompt and preset name.
	///
	/// Cancels any in-flight stream and clears selection and error.
	/// Buffered tokens are kept: the front end shows a "prompt changed"
	/// indicator and the user regenerates explicitly.
	pub fn set_system_prompt(&mut self, prompt: &str, preset: &str) {
		self.cancel_in_flight();
		self.system_prompt = prompt.to_owned();
		self.system_preset = preset.to_owned();
		self.streaming = false;
		self.selected = None;
		self.error = None;
	}

	/// Begins a new generation.
	///
	/// Cancels any prior in-flight generation (cancelling a finished
	/// one is a no-op), clears the buffer, selection, pending-branch
	/// flag and error, and returns the fresh cancellation handle.
	pub fn start(&mut self) -> CancelToken {
		self.cancel_in_flight();

		let token = CancelToken::new();
		self.handle = Some(token.clone());
		self.streaming = true;
		self.tokens.clear();
		self.selected = None;
		self.pending_branch = false;
		self.error = None;
		token
	}

	/// Appends a token record to the buffer.
	///
	/// Only valid while streaming; a cooperatively-cancelled source may
	/// still emit a trailing token, which is dropped here.
	pub fn push_token(&mut self, record: TokenRecord) {
		if self.streaming {
			self.tokens.push(record);
		} else {
			debug!("Dropping token emitted outside a streaming window: {:?}", record.token);
		}
	}

	/// Marks the generation finished: streaming stops and the handle is
	/// released, but buffered tokens stay visible. Idempotent.
	pub fn finish(&mut self) {
		self.streaming = false;
		self.handle = None;
		self.pending_branch = false;
	}

	/// User-initiated cancellation.
	///
	/// Signals the active source (if any) and returns to idle. Never
	/// sets the error field: cancellation is not a failure. Idempotent.
	pub fn cancel(&mut self) {
		self.cancel_in_flight();
		self.streaming = false;
		self.pending_branch = false;
	}

	/// Toggles which buffered token's alternatives are shown.
	///
	/// Selecting the already-selected index (or passing `None`) clears
	/// the selection. Out-of-range indices are ignored.
	pub fn select_token(&mut self, index: Option<usize>) {
		self.selected = match index {
			Some(i) if Some(i) == self.selected => None,
			Some(i) if i < self.tokens.len() => Some(i),
			_ => None,
		};
	}

	/// Branches the stream at `index`, replacing the token there with
	/// `alternative` and discarding everything after it.
	///
	/// # Behavior
	/// 1. Cancels any in-flight stream.
	/// 2. Looks up the alternative's probability in the alternatives
	///    list already stored at `buffer[index]` — never re-queries the
	///    source; absent means probability 0.
	/// 3. Replaces the record with the alternative, its probability,
	///    and the *same* alternatives list (not recomputed).
	/// 4. Truncates the buffer to `index + 1`.
	/// 5. Clears selection and error and arms `pending_branch`; the
	///    caller observes the flag and resumes via [`resume_branch`].
	///
	/// # Errors
	/// Returns an error if `index` is out of range.
	///
	/// [`resume_branch`]: Self::resume_branch
	pub fn branch_from(&mut self, index: usize, alternative: &str) -> Result<(), String> {
		let original = self
			.tokens
			.get(index)
			.ok_or_else(|| format!("Branch index {} out of range", index))?;

		let probability = original
			.alternatives
			.iter()
			.find(|alt| alt.token == alternative)
			.map(|alt| alt.probability)
			.unwrap_or(0.0);

		let replacement = TokenRecord {
			token: alternative.to_owned(),
			probability,
			alternatives: original.alternatives.clone(),
		};

		self.cancel_in_flight();
		self.tokens[index] = replacement;
		self.tokens.truncate(index + 1);
		self.streaming = false;
		self.selected = None;
		self.error = None;
		self.pending_branch = true;
		Ok(())
	}

	/// Concatenation of all buffered token texts, used as the assistant
	/// prefix for branch continuation.
	pub fn prefix_text(&self) -> String {
		self.tokens.iter().map(|t| t.token.as_str()).collect()
	}

	/// Runs a full generation against `source`, blocking until the
	/// stream ends, is cancelled, or fails.
	///
	/// Errors from the source are written into the session state, not
	/// propagated; cancellation leaves the error field empty. In every
	/// case the session settles back to idle and a new `start` remains
	/// possible.
	pub fn run(&mut self, source: &dyn TokenSource) {
		if self.user_prompt.trim().is_empty() {
			return;
		}

		let cancel = self.start();
		let request = StreamRequest::new(&self.user_prompt, &self.system_prompt, &self.system_preset);
		self.drive(source, &request, &cancel);
	}

	/// Resumes generation after a branch.
	///
	/// Observes `pending_branch`; a call without a pending branch is a
	/// no-op. Builds a continuation request carrying the buffered
	/// prefix as an assistant message (for live sources) and the buffer
	/// length as `resume_from` (for scripted sources), clears the flag,
	/// and streams the remainder onto the existing buffer.
	pub fn resume_branch(&mut self, source: &dyn TokenSource) {
		if !self.pending_branch || self.tokens.is_empty() {
			return;
		}

		let mut messages = Vec::new();
		if !self.system_prompt.is_empty() {
			messages.push(ChatMessage::new("system", &self.system_prompt));
		}
		messages.push(ChatMessage::new("user", &self.user_prompt));
		messages.push(ChatMessage::new("assistant", &self.prefix_text()));

		let request = StreamRequest {
			user_prompt: self.user_prompt.clone(),
			system_prompt: self.system_prompt.clone(),
			system_preset: self.system_preset.clone(),
			messages: Some(messages),
			resume_from: Some(self.tokens.len()),
		};

		// Re-arm streaming without clearing the buffer
		self.cancel_in_flight();
		let cancel = CancelToken::new();
		self.handle = Some(cancel.clone());
		self.streaming = true;
		self.pending_branch = false;
		self.selected = None;
		self.error = None;

		self.drive(source, &request, &cancel);
	}

	/// Streams `request` from `source` into the buffer and settles the
	/// session state from the outcome.
	fn drive(&mut self, source: &dyn TokenSource, request: &StreamRequest, cancel: &CancelToken) {
		let result = {
			let tokens = &mut self.tokens;
			source.stream(request, cancel, &mut |record| tokens.push(record))
		};

		match result {
			Ok(()) => self.finish(),
			Err(SourceError::Cancelled) => {
				// Intentional cancellation, not an error
				self.streaming = false;
				self.handle = None;
			}
			Err(err) => {
				self.error = Some(err.to_string());
				self.streaming = false;
				self.handle = None;
			}
		}
	}

	fn cancel_in_flight(&mut self) {
		if let Some(handle) = self.handle.take() {
			handle.cancel();
		}
	}

	/// Buffered tokens in emission order.
	pub fn tokens(&self) -> &[TokenRecord] {
		&self.tokens
	}

	/// True while a generation is in flight.
	pub fn is_streaming(&self) -> bool {
		self.streaming
	}

	/// Index of the token whose alternatives are expanded, if any.
	pub fn selected_token(&self) -> Option<usize> {
		self.selected
	}

	/// True when a branch awaits continuation.
	pub fn pending_branch(&self) -> bool {
		self.pending_branch
	}

	/// The last source error message, if any.
	pub fn error(&self) -> Option<&str> {
		self.error.as_deref()
	}

	/// The current user prompt.
	pub fn user_prompt(&self) -> &str {
		&self.user_prompt
	}

	/// The current system preset name.
	pub fn system_preset(&self) -> &str {
		&self.system_preset
	}

	/// Clears everything back to the initial state.
	pub fn reset(&mut self) {
		self.cancel_in_flight();
		*self = Self::new();
	}
}
