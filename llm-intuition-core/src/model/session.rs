use super::corpus::Corpus;
use super::history::{GenerationHistory, SelectionMethod};
use super::probability::{Distribution, compute};
use super::sampler::TemperatureSampler;

/// Generation stops once the context reaches this many words.
pub const MAX_CONTEXT_WORDS: usize = 15;

/// High-level generation session for the next-word prediction demo.
///
/// # Responsibilities
/// - Own the corpus, context, current distribution, temperature,
///   sampler, and history for one demo instance
/// - Keep the distribution in sync with corpus and context edits
/// - Apply the stopping policy to automatic continuation
///
/// # Invariants
/// - `history.steps()[i].context` equals the live context truncated to
///   length `i`
/// - The distribution always reflects the current (corpus, context)
///   unless the stopping policy has fired
///
/// Sessions are plain owned values; create one per demo instance (or
/// per test) and drop it when done. Nothing is shared between sessions.
#[derive(Debug)]
pub struct GenerationSession {
	corpus: Corpus,
	context: Vec<String>,
	probabilities: Distribution,
	temperature: f64,
	history: GenerationHistory,
	sampler: TemperatureSampler,
}

impl GenerationSession {
	/// Creates a session over the default example corpus, with
	/// temperature 1.0 and an entropy-seeded sampler.
	pub fn new() -> Self {
		Self::with_corpus(Corpus::with_defaults())
	}

	/// Creates a session over the given corpus.
	pub fn with_corpus(corpus: Corpus) -> Self {
		let mut session = Self {
			corpus,
			context: Vec::new(),
			probabilities: Distribution::new(),
			temperature: 1.0,
			history: GenerationHistory::new(),
			sampler: TemperatureSampler::new(),
		};
		session.calculate_probabilities();
		session
	}

	/// Creates a session with a seeded sampler for reproducible runs.
	pub fn with_seed(corpus: Corpus, seed: u64) -> Self {
		let mut session = Self {
			corpus,
			context: Vec::new(),
			probabilities: Distribution::new(),
			temperature: 1.0,
			history: GenerationHistory::new(),
			sampler: TemperatureSampler::with_seed(seed),
		};
		session.calculate_probabilities();
		session
	}

	/// Adds an example sentence and recomputes probabilities.
	pub fn add_example(&mut self, example: &str) {
		self.corpus.add(example);
		self.calculate_probabilities();
	}

	/// Removes the example at `index` and recomputes probabilities.
	pub fn remove_example(&mut self, index: usize) {
		self.corpus.remove(index);
		self.calculate_probabilities();
	}

	/// Clears the corpus; the distribution becomes empty.
	pub fn clear_examples(&mut self) {
		self.corpus.clear();
		self.calculate_probabilities();
	}

	/// Restores the default example corpus and recomputes.
	pub fn set_default_examples(&mut self) {
		self.corpus.reset_default();
		self.calculate_probabilities();
	}

	/// Replaces the whole corpus and recomputes.
	pub fn set_corpus(&mut self, corpus: Corpus) {
		self.corpus = corpus;
		self.calculate_probabilities();
	}

	/// Sets the sampling temperature.
	///
	/// # Errors
	/// Returns an error unless `temperature > 0.0`.
	pub fn set_temperature(&mut self, temperature: f64) -> Result<(), String> {
		if !temperature.is_finite() || temperature <= 0.0 {
			return Err(format!(
				"Temperature must be a finite value > 0.0, got {}",
				temperature
			));
		}
		self.temperature = temperature;
		Ok(())
	}

	/// Recomputes the next-word distribution for the current
	/// (corpus, context) pair.
	pub fn calculate_probabilities(&mut self) {
		self.probabilities = compute(&self.corpus, &self.context);
	}

	/// Records the selection of `word`: appends a history step with the
	/// current context and distribution snapshots, extends the context,
	/// and recomputes probabilities unless the stopping policy fired.
	pub fn select_word(&mut self, word: &str, method: SelectionMethod) {
		self.history.append(
			self.context.clone(),
			self.probabilities.clone(),
			word.to_owned(),
			method,
		);
		self.context.push(word.to_owned());

		if !self.should_stop() {
			self.calculate_probabilities();
		}
	}

	/// Samples the next word from the temperature-rescaled distribution
	/// and selects it with [`SelectionMethod::Sampled`].
	///
	/// Returns `None` when the distribution is empty or all-zero (no
	/// match in the corpus) — a valid outcome, not an error.
	pub fn sample_next(&mut self) -> Option<String> {
		if self.probabilities.total() <= 0.0 {
			return None;
		}

		let rescaled = TemperatureSampler::rescale(&self.probabilities, self.temperature);
		let word = self.sampler.sample(&rescaled)?;
		self.select_word(&word, SelectionMethod::Sampled);
		Some(word)
	}

	/// Samples words until the stopping policy fires or the corpus has
	/// no continuation. Returns the number of words generated.
	pub fn generate_until_stop(&mut self) -> usize {
		let mut generated = 0;
		while !self.should_stop() {
			match self.sample_next() {
				Some(_) => generated += 1,
				None => break,
			}
		}
		generated
	}

	/// Stopping policy for automatic continuation: the most recent word
	/// ends with `.`, or the context has reached [`MAX_CONTEXT_WORDS`].
	///
	/// Gates sampling only; manual edits are never blocked by it.
	pub fn should_stop(&self) -> bool {
		if self.context.len() >= MAX_CONTEXT_WORDS {
			return true;
		}
		match self.context.last() {
			Some(word) => word.ends_with('.'),
			None => false,
		}
	}

	/// Undoes exactly one generation step, restoring the context the
	/// step recorded and recomputing probabilities. No-op when the
	/// history is empty.
	pub fn step_back(&mut self) {
		if let Some(context) = self.history.step_back() {
			self.context = context;
			self.calculate_probabilities();
		}
	}

	/// Replaces the context wholesale (typed or pasted text), rebuilding
	/// the history synthetically so step-back still works word by word.
	pub fn replace_context(&mut self, context: Vec<String>) {
		self.history.replace_context(&context);
		self.context = context;
		self.calculate_probabilities();
	}

	/// Clears context and history and recomputes. Idempotent.
	pub fn reset(&mut self) {
		self.context.clear();
		self.history.reset();
		self.calculate_probabilities();
	}

	/// The words generated so far.
	pub fn context(&self) -> &[String] {
		&self.context
	}

	/// The current next-word distribution.
	pub fn probabilities(&self) -> &Distribution {
		&self.probabilities
	}

	/// The current sampling temperature.
	pub fn temperature(&self) -> f64 {
		self.temperature
	}

	/// The generation history.
	pub fn history(&self) -> &GenerationHistory {
		&self.history
	}

	/// The corpus being learned from.
	pub fn corpus(&self) -> &Corpus {
		&self.corpus
	}

	/// The corpus vocabulary in enumeration order.
	pub fn vocabulary(&self) -> Vec<String> {
		self.corpus.vocabulary()
	}
}

impl Default for GenerationSession {
	fn default() -> Self {
		Self::new()
	}
}
