use serde::{Deserialize, Serialize};

use super::corpus::{Corpus, tokenize};

/// A probability distribution over candidate next words.
///
/// Entries keep their insertion order (the vocabulary order of the
/// corpus that produced them). That order is load-bearing: weighted
/// sampling walks it cumulatively and top-k uses it to break ties, so
/// two computations over the same corpus always enumerate identically.
///
/// # Invariants
/// - Each word appears at most once
/// - Probabilities are in [0, 1]
/// - The sum over all entries is either 0 (no context match) or 1
///   within floating-point tolerance
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Distribution {
	entries: Vec<(String, f64)>,
}

impl Distribution {
	/// Creates an empty distribution.
	pub fn new() -> Self {
		Self { entries: Vec::new() }
	}

	/// Builds a distribution from `(word, probability)` pairs, keeping
	/// the given order.
	pub fn from_entries(entries: Vec<(String, f64)>) -> Self {
		Self { entries }
	}

	/// Appends a word with the given probability.
	///
	/// Callers are responsible for not inserting duplicates; `compute`
	/// inserts each vocabulary word exactly once.
	pub fn push(&mut self, word: String, probability: f64) {
		self.entries.push((word, probability));
	}

	/// Sets the probability of an existing word. No-op if absent.
	pub fn set(&mut self, word: &str, probability: f64) {
		if let Some(entry) = self.entries.iter_mut().find(|(w, _)| w == word) {
			entry.1 = probability;
		}
	}

	/// Returns the probability of `word`, or 0.0 if absent.
	pub fn get(&self, word: &str) -> f64 {
		self.entries
			.iter()
			.find(|(w, _)| w == word)
			.map(|(_, p)| *p)
			.unwrap_or(0.0)
	}

	/// Iterates `(word, probability)` in enumeration order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
		self.entries.iter().map(|(w, p)| (w.as_str(), *p))
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// True when the distribution has no entries.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Sum of all probabilities.
	///
	/// 0.0 signals "no match": the context never occurs in the corpus.
	pub fn total(&self) -> f64 {
		self.entries.iter().map(|(_, p)| p).sum()
	}
}

impl Default for Distribution {
	fn default() -> Self {
		Self::new()
	}
}

/// Computes the next-word distribution for `context` over `corpus`.
///
/// Pure and deterministic: no side effects, identical inputs give
/// identical outputs (including entry order).
///
/// # Behavior
/// - Every vocabulary word is present in the result, defaulting to 0.
/// - Empty context: each example's first token counts as one "next
///   word" occurrence.
/// - Non-empty context: a window of `context.len()` tokens slides over
///   each example; whenever the window equals the context
///   (case-insensitive exact sequence) and a token follows it, that
///   follower's count is incremented. Overlapping windows within the
///   same example each contribute.
/// - Counts are normalized by the total matched count. A total of 0
///   leaves every probability at 0 — a meaningful "no match" result,
///   not an error.
pub fn compute(corpus: &Corpus, context: &[String]) -> Distribution {
	let context: Vec<String> = context.iter().map(|w| w.to_lowercase()).collect();

	let mut distribution = Distribution::new();
	for word in corpus.vocabulary() {
		distribution.push(word, 0.0);
	}

	let mut counts: Vec<(String, usize)> = Vec::new();
	let mut bump = |word: &str| {
		if let Some(entry) = counts.iter_mut().find(|(w, _)| w == word) {
			entry.1 += 1;
		} else {
			counts.push((word.to_owned(), 1));
		}
	};

	for example in corpus.examples() {
		let words = tokenize(example);

		if context.is_empty() {
			if let Some(first) = words.first() {
				bump(first);
			}
		} else if words.len() > context.len() {
			for i in 0..=words.len() - context.len() - 1 {
				if words[i..i + context.len()] == context[..] {
					bump(&words[i + context.len()]);
				}
			}
		}
	}

	let total: usize = counts.iter().map(|(_, c)| c).sum();
	if total > 0 {
		for (word, count) in counts {
			distribution.set(&word, count as f64 / total as f64);
		}
	}

	distribution
}
