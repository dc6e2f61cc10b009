use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::probability::Distribution;

/// How a generation step's word was chosen.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionMethod {
	/// Picked by the user (clicked, typed, or pasted).
	Manual,
	/// Drawn from the temperature-rescaled distribution.
	Sampled,
}

/// One recorded generation step.
///
/// Immutable once appended: the context and predictions are snapshots
/// of what the session looked like when the word was selected.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GenerationStep {
	/// Monotone identifier assigned by the owning history.
	pub id: u64,
	/// Context at the time of selection (before the word was appended).
	pub context: Vec<String>,
	/// Distribution the word was selected from. Empty for synthetic
	/// manual steps, where it was never computed.
	pub predictions: Distribution,
	/// The selected word.
	pub selected: String,
	/// How the word was chosen.
	pub method: SelectionMethod,
	/// Milliseconds since the Unix epoch at append time.
	pub timestamp: u64,
}

fn now_millis() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_millis() as u64)
		.unwrap_or(0)
}

/// Append/rollback log of generation steps.
///
/// # Invariants
/// - `steps[i].context.len() == i`
/// - `steps[i + 1].context == steps[i].context + [steps[i].selected]`
/// - Step ids are strictly increasing
///
/// The history records contexts; it does not own the live context.
/// After `step_back` the caller must restore its context from the
/// returned value and recompute probabilities.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct GenerationHistory {
	steps: Vec<GenerationStep>,
	next_id: u64,
}

impl GenerationHistory {
	/// Creates an empty history.
	pub fn new() -> Self {
		Self { steps: Vec::new(), next_id: 0 }
	}

	/// Appends a step and returns a reference to it.
	pub fn append(
		&mut self,
		context: Vec<String>,
		predictions: Distribution,
		selected: String,
		method: SelectionMethod,
	) -> &GenerationStep {
		let step = GenerationStep {
			id: self.next_id,
			context,
			predictions,
			selected,
			method,
			timestamp: now_millis(),
		};
		self.next_id += 1;
		self.steps.push(step);
		// Just pushed, cannot be empty
		self.steps.last().unwrap()
	}

	/// Removes the most recent step and returns its recorded context.
	///
	/// Returns `None` (no-op) when the history is empty.
	///
	/// Post-condition for the caller: restore the live context to the
	/// returned value and recompute probabilities.
	pub fn step_back(&mut self) -> Option<Vec<String>> {
		self.steps.pop().map(|step| step.context)
	}

	/// Discards all steps and rebuilds the history synthetically for
	/// `context`: one `Manual` step per word, each recording the
	/// context prefix before it and an empty distribution (none was
	/// ever computed for that partial context).
	///
	/// Keeps the stepped display and step-back semantics consistent
	/// when the user pastes or types a whole context at once.
	pub fn replace_context(&mut self, context: &[String]) {
		self.steps.clear();
		for (i, word) in context.iter().enumerate() {
			self.append(
				context[..i].to_vec(),
				Distribution::new(),
				word.clone(),
				SelectionMethod::Manual,
			);
		}
	}

	/// Removes every step. Idempotent.
	pub fn reset(&mut self) {
		self.steps.clear();
	}

	/// Steps in append order.
	pub fn steps(&self) -> &[GenerationStep] {
		&self.steps
	}

	/// The most recent step, if any.
	pub fn last(&self) -> Option<&GenerationStep> {
		self.steps.last()
	}

	/// Number of recorded steps.
	pub fn len(&self) -> usize {
		self.steps.len()
	}

	/// True when no steps are recorded.
	pub fn is_empty(&self) -> bool {
		self.steps.is_empty()
	}
}
