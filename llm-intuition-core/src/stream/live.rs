use std::io::{BufRead, BufReader};

use log::{debug, warn};
use serde::Deserialize;

use super::source::{
	CancelToken, MAX_ALTERNATIVES, SourceError, StreamRequest, TokenAlternative, TokenRecord,
	TokenSource,
};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const CREDENTIAL_ENV: &str = "OPENAI_API_KEY";

/// One parsed server-sent event payload. Each event carries zero or one
/// token delta.
#[derive(Deserialize)]
struct StreamChunk {
	#[serde(default)]
	choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
	#[serde(default)]
	logprobs: Option<LogprobsDelta>,
}

#[derive(Deserialize)]
struct LogprobsDelta {
	#[serde(default)]
	content: Vec<LogprobEntry>,
}

#[derive(Deserialize)]
struct LogprobEntry {
	token: String,
	logprob: f64,
	#[serde(default)]
	top_logprobs: Vec<TopLogprob>,
}

#[derive(Deserialize)]
struct TopLogprob {
	token: String,
	logprob: f64,
}

/// Live token source: one streaming chat-completion request with
/// per-token log-probabilities.
///
/// # Responsibilities
/// - Resolve the API credential at call time (constructor argument,
///   else the `OPENAI_API_KEY` environment variable)
/// - Issue a single streaming POST requesting `logprobs` with up to
///   [`MAX_ALTERNATIVES`] alternatives per position
/// - Parse the incremental event stream line by line, converting
///   log-probabilities to linear probabilities
///
/// # Errors
/// - Missing credential surfaces when `stream` is invoked, never at
///   construction
/// - Non-success responses and malformed streams surface as
///   `Transport` with the response detail; malformed individual event
///   lines are skipped
pub struct LiveSource {
	client: reqwest::blocking::Client,
	endpoint: String,
	model: String,
	api_key: Option<String>,
}

impl LiveSource {
	/// Creates a source with an optional explicit API key.
	///
	/// With `None`, the key is looked up in the environment when a
	/// stream is requested.
	pub fn new(api_key: Option<String>) -> Self {
		Self {
			client: reqwest::blocking::Client::new(),
			endpoint: DEFAULT_ENDPOINT.to_owned(),
			model: DEFAULT_MODEL.to_owned(),
			api_key,
		}
	}

	/// Overrides the endpoint URL (tests, proxies).
	pub fn with_endpoint(mut self, endpoint: &str) -> Self {
		self.endpoint = endpoint.to_owned();
		self
	}

	/// Overrides the model name.
	pub fn with_model(mut self, model: &str) -> Self {
		self.model = model.to_owned();
		self
	}

	fn resolve_key(&self) -> Result<String, SourceError> {
		if let Some(key) = &self.api_key {
			if !key.is_empty() {
				return Ok(key.clone());
			}
		}
		match std::env::var(CREDENTIAL_ENV) {
			Ok(key) if !key.is_empty() => Ok(key),
			_ => Err(SourceError::MissingCredential),
		}
	}

	/// Parses one SSE data payload into a token record, if the event
	/// carries one.
	///
	/// Public so the event format stays testable without a network.
	pub fn parse_event(data: &str) -> Option<TokenRecord> {
		let chunk: StreamChunk = match serde_json::from_str(data) {
			Ok(chunk) => chunk,
			Err(err) => {
				// Malformed lines are skipped, not fatal
				debug!("Skipping malformed stream event: {}", err);
				return None;
			}
		};

		let entry = chunk
			.choices
			.into_iter()
			.next()?
			.logprobs?
			.content
			.into_iter()
			.next()?;

		let alternatives: Vec<TokenAlternative> = entry
			.top_logprobs
			.into_iter()
			.take(MAX_ALTERNATIVES)
			.map(|alt| TokenAlternative {
				token: alt.token,
				probability: alt.logprob.exp(),
			})
			.collect();

		Some(TokenRecord::new(&entry.token, entry.logprob.exp(), alternatives))
	}
}

impl TokenSource for LiveSource {
	fn stream(
		&self,
		request: &StreamRequest,
		cancel: &CancelToken,
		on_token: &mut dyn FnMut(TokenRecord),
	) -> Result<(), SourceError> {
		let api_key = self.resolve_key()?;

		let body = serde_json::json!({
			"model": self.model,
			"stream": true,
			"logprobs": true,
			"top_logprobs": MAX_ALTERNATIVES,
			"messages": request.chat_messages(),
		});

		let response = self
			.client
			.post(&self.endpoint)
			.bearer_auth(api_key)
			.json(&body)
			.send()
			.map_err(|err| SourceError::Transport(err.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			let detail = response.text().unwrap_or_default();
			warn!("Live source returned {}: {}", status, detail);
			return Err(SourceError::Transport(format!("API error {}: {}", status, detail)));
		}

		let reader = BufReader::new(response);
		for line in reader.lines() {
			if cancel.is_cancelled() {
				return Err(SourceError::Cancelled);
			}

			let line = line.map_err(|err| SourceError::Transport(err.to_string()))?;
			let trimmed = line.trim();
			let Some(data) = trimmed.strip_prefix("data: ") else {
				continue;
			};
			if data == "[DONE]" {
				return Ok(());
			}

			if let Some(record) = Self::parse_event(data) {
				on_token(record);
			}
		}

		Ok(())
	}
}
