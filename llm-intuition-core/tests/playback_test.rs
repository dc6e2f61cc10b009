//! Integration tests for the scripted playback source and scenarios.

use llm_intuition_core::stream::playback::{PlaybackSource, scenario_for, stream_text};
use llm_intuition_core::stream::session::TokenStreamSession;
use llm_intuition_core::stream::source::{CancelToken, StreamRequest, TokenSource};

const CAPITAL_PROMPT: &str = "What is the capital of France?";

#[test]
fn test_scenario_exact_match() {
	let scenario = scenario_for(CAPITAL_PROMPT, "Pirate");
	assert_eq!(scenario[0].token, "Arr");

	let scenario = scenario_for("Explain what a variable is", "Data Scientist");
	assert_eq!(scenario[0].token, "A");
	assert_eq!(scenario[1].token, " variable");
}

#[test]
fn test_scenario_falls_back_to_same_prompt_any_preset() {
	// No capital/JSON Only scenario exists; same prompt, first preset wins
	let scenario = scenario_for(CAPITAL_PROMPT, "JSON Only");
	assert_eq!(scenario[0].token, "The");

	let scenario = scenario_for("tell me about a VARIABLE", "Pirate");
	assert_eq!(scenario[0].token, "A");
}

#[test]
fn test_scenario_falls_back_to_default() {
	let scenario = scenario_for("something entirely unknown", "Pirate");
	assert_eq!(scenario[0].token, "The");
	assert_eq!(scenario.last().map(|r| r.token.as_str()), Some("."));
}

#[test]
fn test_scenario_alternatives_lead_with_own_token() {
	for scenario_tokens in [
		scenario_for(CAPITAL_PROMPT, "None"),
		scenario_for(CAPITAL_PROMPT, "Pirate"),
		scenario_for("variable", "Data Scientist"),
	] {
		for record in scenario_tokens {
			assert!(record.alternatives.len() <= 5);
			let first = &record.alternatives[0];
			assert_eq!(first.token, record.token);
			assert_eq!(first.probability, record.probability);
		}
	}
}

#[test]
fn test_playback_streams_whole_scenario() {
	let source = PlaybackSource::instant();
	let request = StreamRequest::new(CAPITAL_PROMPT, "", "None");
	let cancel = CancelToken::new();

	let mut collected = Vec::new();
	source
		.stream(&request, &cancel, &mut |r| collected.push(r))
		.expect("playback never fails");

	assert_eq!(collected.len(), 20);
	let text: String = collected.iter().map(|r| r.token.as_str()).collect();
	assert!(text.starts_with("The capital of France is Paris."));
}

#[test]
fn test_playback_resume_emits_only_remainder() {
	let source = PlaybackSource::instant();
	let mut request = StreamRequest::new(CAPITAL_PROMPT, "", "None");
	request.resume_from = Some(18);
	let cancel = CancelToken::new();

	let mut collected = Vec::new();
	source
		.stream(&request, &cancel, &mut |r| collected.push(r))
		.expect("playback never fails");

	let scenario = scenario_for(CAPITAL_PROMPT, "None");
	assert_eq!(collected.len(), 2);
	assert_eq!(collected[0], scenario[18]);
	assert_eq!(collected[1], scenario[19]);
}

#[test]
fn test_playback_resume_past_end_is_empty() {
	let source = PlaybackSource::instant();
	let mut request = StreamRequest::new(CAPITAL_PROMPT, "", "None");
	request.resume_from = Some(1000);
	let cancel = CancelToken::new();

	let mut collected = Vec::new();
	source
		.stream(&request, &cancel, &mut |r| collected.push(r))
		.expect("playback never fails");
	assert!(collected.is_empty());
}

#[test]
fn test_playback_observes_cancellation_immediately() {
	let source = PlaybackSource::instant();
	let request = StreamRequest::new(CAPITAL_PROMPT, "", "None");
	let cancel = CancelToken::new();
	cancel.cancel();

	let mut collected = Vec::new();
	let result = source.stream(&request, &cancel, &mut |r| collected.push(r));
	assert!(result.is_err());
	assert!(collected.is_empty());
}

#[test]
fn test_session_branch_and_resume_over_playback() {
	let source = PlaybackSource::instant();
	let mut session = TokenStreamSession::new();
	session.set_user_prompt(CAPITAL_PROMPT);
	session.run(&source);
	assert_eq!(session.tokens().len(), 20);

	// Branch token 5 (" Paris") onto " officially"
	session.branch_from(5, " officially").expect("index in range");
	assert_eq!(session.tokens().len(), 6);
	assert!(session.pending_branch());

	session.resume_branch(&source);

	// Continuation appended after the branch point instead of replaying
	let scenario = scenario_for(CAPITAL_PROMPT, "None");
	assert_eq!(session.tokens().len(), 20);
	assert_eq!(session.tokens()[5].token, " officially");
	assert_eq!(&session.tokens()[6..], &scenario[6..]);
	assert!(!session.pending_branch());
	assert!(!session.is_streaming());
	assert_eq!(session.error(), None);
}

#[test]
fn test_resume_without_pending_branch_is_noop() {
	let source = PlaybackSource::instant();
	let mut session = TokenStreamSession::new();
	session.set_user_prompt(CAPITAL_PROMPT);
	session.run(&source);

	let before = session.tokens().len();
	session.resume_branch(&source);
	assert_eq!(session.tokens().len(), before);
}

#[test]
fn test_stream_text_emits_growing_prefixes() {
	let cancel = CancelToken::new();
	let full = "Hello there! General Kenobi.";

	let mut chunks: Vec<String> = Vec::new();
	stream_text(full, false, &cancel, &mut |chunk| chunks.push(chunk.to_owned()));

	assert_eq!(chunks.last().map(String::as_str), Some(full));
	for pair in chunks.windows(2) {
		assert!(pair[1].starts_with(pair[0].as_str()));
		assert!(pair[1].len() > pair[0].len());
	}
}

#[test]
fn test_stream_text_respects_cancellation() {
	let cancel = CancelToken::new();
	cancel.cancel();

	let mut chunks = 0;
	stream_text("never emitted", false, &cancel, &mut |_| chunks += 1);
	assert_eq!(chunks, 0);
}
