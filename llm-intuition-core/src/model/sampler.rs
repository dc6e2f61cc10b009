use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::probability::Distribution;

/// Epsilon added before taking logarithms, so zero-probability words
/// stay representable instead of producing `-inf`.
const LOG_EPSILON: f64 = 1e-10;

/// Rescales and samples probability distributions under a temperature.
///
/// # Responsibilities
/// - Temperature rescaling via log-space softmax (numerically stable)
/// - Weighted random sampling in the distribution's enumeration order
/// - Top-k extraction with stable tie-breaking
///
/// The sampler owns its RNG so a seeded instance replays identical
/// draws, which the tests rely on.
#[derive(Debug)]
pub struct TemperatureSampler {
	rng: StdRng,
}

impl TemperatureSampler {
	/// Creates a sampler seeded from OS entropy.
	pub fn new() -> Self {
		Self { rng: StdRng::from_os_rng() }
	}

	/// Creates a sampler with a fixed seed for reproducible draws.
	pub fn with_seed(seed: u64) -> Self {
		Self { rng: StdRng::seed_from_u64(seed) }
	}

	/// Rescales a distribution by `temperature`.
	///
	/// # Behavior
	/// - `temperature == 1.0` is an identity no-op: the input comes
	///   back unchanged, all-zero distributions included.
	/// - Otherwise, each probability `p` becomes a logit
	///   `ln(p + ε) / temperature`; the maximum logit is subtracted
	///   before exponentiation (max-subtraction stabilization) and the
	///   exponentials are normalized (softmax).
	///
	/// Lower temperature sharpens the distribution toward its mode;
	/// higher temperature flattens it toward uniform.
	pub fn rescale(distribution: &Distribution, temperature: f64) -> Distribution {
		if temperature == 1.0 || distribution.is_empty() {
			return distribution.clone();
		}

		let logits: Vec<(String, f64)> = distribution
			.iter()
			.map(|(word, p)| (word.to_owned(), (p + LOG_EPSILON).ln() / temperature))
			.collect();

		let max_logit = logits
			.iter()
			.map(|(_, l)| *l)
			.fold(f64::NEG_INFINITY, f64::max);

		let exps: Vec<(String, f64)> = logits
			.into_iter()
			.map(|(word, logit)| (word, (logit - max_logit).exp()))
			.collect();

		let sum: f64 = exps.iter().map(|(_, e)| e).sum();

		Distribution::from_entries(
			exps.into_iter().map(|(word, e)| (word, e / sum)).collect(),
		)
	}

	/// Draws a word by weighted random sampling.
	///
	/// Walks the distribution in enumeration order accumulating
	/// probability and returns the first word whose cumulative value
	/// reaches the uniform draw. If rounding leaves the cumulative sum
	/// short of the draw, the last word in enumeration order is the
	/// deterministic fallback.
	///
	/// Returns `None` only for an empty distribution.
	pub fn sample(&mut self, distribution: &Distribution) -> Option<String> {
		if distribution.is_empty() {
			return None;
		}

		let u: f64 = self.rng.random();
		let mut cumulative = 0.0;
		let mut fallback: Option<&str> = None;

		for (word, probability) in distribution.iter() {
			cumulative += probability;
			if u <= cumulative {
				return Some(word.to_owned());
			}
			fallback = Some(word);
		}

		fallback.map(str::to_owned)
	}

	/// Returns the `k` most probable words with their probabilities.
	///
	/// Sorted descending by probability; ties keep the distribution's
	/// enumeration order (stable sort).
	pub fn top_k(distribution: &Distribution, k: usize) -> Vec<(String, f64)> {
		let mut entries: Vec<(String, f64)> = distribution
			.iter()
			.map(|(word, p)| (word.to_owned(), p))
			.collect();
		entries.sort_by(|a, b| b.1.total_cmp(&a.1));
		entries.truncate(k);
		entries
	}
}

impl Default for TemperatureSampler {
	fn default() -> Self {
		Self::new()
	}
}
