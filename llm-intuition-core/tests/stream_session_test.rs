//! Integration tests for the token-stream session state machine.

use llm_intuition_core::stream::session::{SYSTEM_PRESETS, TokenStreamSession};
use llm_intuition_core::stream::source::{
	CancelToken, SourceError, StreamRequest, TokenAlternative, TokenRecord, TokenSource,
};

fn record(token: &str, probability: f64, alts: &[(&str, f64)]) -> TokenRecord {
	let alternatives = alts
		.iter()
		.map(|(t, p)| TokenAlternative { token: (*t).to_owned(), probability: *p })
		.collect();
	TokenRecord::new(token, probability, alternatives)
}

/// Source that emits fixed records, cancelling its own token after
/// `cancel_after` emissions (simulating a user pressing stop).
struct ScriptedSource {
	records: Vec<TokenRecord>,
	cancel_after: Option<usize>,
}

impl TokenSource for ScriptedSource {
	fn stream(
		&self,
		_request: &StreamRequest,
		cancel: &CancelToken,
		on_token: &mut dyn FnMut(TokenRecord),
	) -> Result<(), SourceError> {
		for (i, r) in self.records.iter().enumerate() {
			if cancel.is_cancelled() {
				return Err(SourceError::Cancelled);
			}
			on_token(r.clone());
			if Some(i + 1) == self.cancel_after {
				cancel.cancel();
			}
		}
		Ok(())
	}
}

/// Source that fails mid-stream with a transport error.
struct FailingSource;

impl TokenSource for FailingSource {
	fn stream(
		&self,
		_request: &StreamRequest,
		_cancel: &CancelToken,
		on_token: &mut dyn FnMut(TokenRecord),
	) -> Result<(), SourceError> {
		on_token(record("partial", 0.5, &[]));
		Err(SourceError::Transport("API error 500: boom".to_owned()))
	}
}

fn three_records() -> Vec<TokenRecord> {
	vec![
		record("The", 0.9, &[("The", 0.9), ("A", 0.05)]),
		record(" capital", 0.8, &[(" capital", 0.8), (" answer", 0.1), (" city", 0.05)]),
		record(" is", 0.95, &[(" is", 0.95), (" was", 0.02)]),
	]
}

#[test]
fn test_start_clears_previous_state() {
	let mut session = TokenStreamSession::new();
	session.start();
	session.push_token(record("old", 0.5, &[]));
	session.finish();
	session.select_token(Some(0));

	session.start();
	assert!(session.tokens().is_empty());
	assert!(session.is_streaming());
	assert_eq!(session.selected_token(), None);
	assert_eq!(session.error(), None);
}

#[test]
fn test_start_cancels_prior_generation() {
	let mut session = TokenStreamSession::new();
	let first = session.start();
	let second = session.start();

	assert!(first.is_cancelled());
	assert!(!second.is_cancelled());
}

#[test]
fn test_push_token_outside_streaming_is_dropped() {
	let mut session = TokenStreamSession::new();
	session.push_token(record("stray", 0.1, &[]));
	assert!(session.tokens().is_empty());

	session.start();
	session.push_token(record("kept", 0.1, &[]));
	session.finish();
	session.push_token(record("late", 0.1, &[]));

	assert_eq!(session.tokens().len(), 1);
}

#[test]
fn test_finish_keeps_tokens_visible() {
	let mut session = TokenStreamSession::new();
	session.start();
	session.push_token(record("The", 0.9, &[]));
	session.finish();

	assert!(!session.is_streaming());
	assert_eq!(session.tokens().len(), 1);

	// Idempotent
	session.finish();
	assert_eq!(session.tokens().len(), 1);
}

#[test]
fn test_cancel_never_sets_error() {
	let mut session = TokenStreamSession::new();
	let handle = session.start();
	session.cancel();

	assert!(handle.is_cancelled());
	assert!(!session.is_streaming());
	assert_eq!(session.error(), None);

	// Cancelling again (already finished) is a no-op
	session.cancel();
	assert_eq!(session.error(), None);
}

#[test]
fn test_select_token_toggles() {
	let mut session = TokenStreamSession::new();
	session.start();
	for r in three_records() {
		session.push_token(r);
	}
	session.finish();

	session.select_token(Some(1));
	assert_eq!(session.selected_token(), Some(1));

	// Selecting the selected index clears the selection
	session.select_token(Some(1));
	assert_eq!(session.selected_token(), None);

	session.select_token(Some(2));
	session.select_token(None);
	assert_eq!(session.selected_token(), None);

	// Out of range is ignored
	session.select_token(Some(99));
	assert_eq!(session.selected_token(), None);
}

#[test]
fn test_branch_from_replaces_truncates_and_arms() {
	let mut session = TokenStreamSession::new();
	session.start();
	for r in three_records() {
		session.push_token(r);
	}
	session.finish();
	session.select_token(Some(2));

	let alternatives_before = session.tokens()[1].alternatives.clone();
	session.branch_from(1, " answer").expect("index in range");

	assert_eq!(session.tokens().len(), 2);
	assert_eq!(session.tokens()[1].token, " answer");
	// Probability looked up from the stored alternatives, not re-queried
	assert!((session.tokens()[1].probability - 0.1).abs() < 1e-12);
	// Alternatives are carried over unchanged
	assert_eq!(session.tokens()[1].alternatives, alternatives_before);

	assert!(session.pending_branch());
	assert!(!session.is_streaming());
	assert_eq!(session.selected_token(), None);
	assert_eq!(session.error(), None);
}

#[test]
fn test_branch_from_unknown_alternative_gets_zero_probability() {
	let mut session = TokenStreamSession::new();
	session.start();
	for r in three_records() {
		session.push_token(r);
	}
	session.finish();

	session.branch_from(0, "Nowhere").expect("index in range");
	assert_eq!(session.tokens()[0].token, "Nowhere");
	assert_eq!(session.tokens()[0].probability, 0.0);
}

#[test]
fn test_branch_from_out_of_range_errors() {
	let mut session = TokenStreamSession::new();
	assert!(session.branch_from(0, "x").is_err());
}

#[test]
fn test_prefix_text_concatenates_tokens() {
	let mut session = TokenStreamSession::new();
	session.start();
	for r in three_records() {
		session.push_token(r);
	}
	assert_eq!(session.prefix_text(), "The capital is");
}

#[test]
fn test_run_streams_to_completion() {
	let mut session = TokenStreamSession::new();
	session.set_user_prompt("hello");

	let source = ScriptedSource { records: three_records(), cancel_after: None };
	session.run(&source);

	assert_eq!(session.tokens().len(), 3);
	assert!(!session.is_streaming());
	assert_eq!(session.error(), None);
}

#[test]
fn test_run_without_prompt_is_noop() {
	let mut session = TokenStreamSession::new();
	let source = ScriptedSource { records: three_records(), cancel_after: None };
	session.run(&source);

	assert!(session.tokens().is_empty());
	assert!(!session.is_streaming());
}

#[test]
fn test_cancel_mid_stream_keeps_partial_buffer() {
	// Cancelled after 2 of 3 tokens: exactly those 2 remain, the
	// session is idle, and no error is recorded.
	let mut session = TokenStreamSession::new();
	session.set_user_prompt("hello");

	let source = ScriptedSource { records: three_records(), cancel_after: Some(2) };
	session.run(&source);

	assert_eq!(session.tokens().len(), 2);
	assert!(!session.is_streaming());
	assert_eq!(session.error(), None);
}

#[test]
fn test_transport_error_recorded_and_recoverable() {
	let mut session = TokenStreamSession::new();
	session.set_user_prompt("hello");

	session.run(&FailingSource);
	assert!(!session.is_streaming());
	let error = session.error().expect("error recorded");
	assert!(error.contains("API error 500"));

	// Never a dead state: a new start is always possible
	let source = ScriptedSource { records: three_records(), cancel_after: None };
	session.run(&source);
	assert_eq!(session.tokens().len(), 3);
	assert_eq!(session.error(), None);
}

#[test]
fn test_set_system_prompt_cancels_but_keeps_tokens() {
	let mut session = TokenStreamSession::new();
	session.set_user_prompt("hello");
	let handle = session.start();
	session.push_token(record("The", 0.9, &[]));

	session.set_system_prompt("You are a pirate.", "Pirate");

	assert!(handle.is_cancelled());
	assert!(!session.is_streaming());
	assert_eq!(session.tokens().len(), 1, "tokens kept, user regenerates explicitly");
	assert_eq!(session.system_preset(), "Pirate");
	assert_eq!(session.error(), None);
}

#[test]
fn test_system_presets_table() {
	assert_eq!(SYSTEM_PRESETS.len(), 6);
	assert_eq!(SYSTEM_PRESETS[0], ("None", ""));
	assert!(
		SYSTEM_PRESETS
			.iter()
			.any(|(name, text)| *name == "Pirate" && text.contains("pirate"))
	);
}
