use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::io::read_file;

/// The canonical example sentences the demo starts with.
///
/// Chosen so that short contexts ("the cat", "the dog", ...) have
/// several distinct continuations with uneven frequencies.
pub const DEFAULT_EXAMPLES: [&str; 12] = [
	"The cat sat on the mat.",
	"The dog ran in the park.",
	"The cat ate the food.",
	"The cat played with the toy.",
	"The cat played with the ball.",
	"The bird flew over the tree.",
	"The dog sat by the door.",
	"The cat played in the garden.",
	"The dog ate the bone.",
	"The bird sat on the branch.",
	"The fish swam in the water.",
	"The dog jumped over the fence.",
];

/// Splits a sentence into lower-cased word tokens.
///
/// - Splits on whitespace and drops empty tokens.
/// - Punctuation stays attached to its word, so `"cat."` and `"cat"`
///   are distinct tokens. This is intentional: the demo treats the
///   trailing period as part of the "word" so sentence endings are
///   learnable.
pub fn tokenize(sentence: &str) -> Vec<String> {
	sentence
		.split_whitespace()
		.filter(|w| !w.is_empty())
		.map(|w| w.to_lowercase())
		.collect()
}

/// An ordered, editable corpus of example sentences.
///
/// # Responsibilities
/// - Keep examples in insertion order (duplicates allowed)
/// - Support add / remove / clear / reset-to-default edits
/// - Derive the vocabulary (distinct tokens, first-seen order)
///
/// # Invariants
/// - Stored examples are trimmed and never empty
/// - Vocabulary order is stable for a given corpus content, which fixes
///   the enumeration order of every distribution computed from it
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Corpus {
	examples: Vec<String>,
}

impl Corpus {
	/// Creates an empty corpus.
	pub fn new() -> Self {
		Self { examples: Vec::new() }
	}

	/// Creates a corpus pre-filled with [`DEFAULT_EXAMPLES`].
	pub fn with_defaults() -> Self {
		let mut corpus = Self::new();
		corpus.reset_default();
		corpus
	}

	/// Loads a corpus from a text file, one example sentence per line.
	///
	/// Blank lines are skipped.
	///
	/// # Errors
	/// Returns an error if the file cannot be read.
	pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
		let mut corpus = Self::new();
		for line in read_file(path)? {
			corpus.add(&line);
		}
		Ok(corpus)
	}

	/// Appends a trimmed example sentence.
	///
	/// Blank input is ignored.
	pub fn add(&mut self, example: &str) {
		let trimmed = example.trim();
		if !trimmed.is_empty() {
			self.examples.push(trimmed.to_owned());
		}
	}

	/// Removes the example at `index`.
	///
	/// Out-of-range indices are a no-op (the UI may race a removal
	/// against a corpus edit).
	pub fn remove(&mut self, index: usize) {
		if index < self.examples.len() {
			self.examples.remove(index);
		}
	}

	/// Removes every example.
	pub fn clear(&mut self) {
		self.examples.clear();
	}

	/// Replaces the contents with [`DEFAULT_EXAMPLES`].
	pub fn reset_default(&mut self) {
		self.examples = DEFAULT_EXAMPLES.iter().map(|s| (*s).to_owned()).collect();
	}

	/// Returns the examples in insertion order.
	pub fn examples(&self) -> &[String] {
		&self.examples
	}

	/// Number of examples.
	pub fn len(&self) -> usize {
		self.examples.len()
	}

	/// True when the corpus holds no examples.
	pub fn is_empty(&self) -> bool {
		self.examples.is_empty()
	}

	/// Returns the vocabulary: distinct tokens across all examples,
	/// in first-seen order.
	///
	/// Recomputed on demand; the corpus is small by design.
	pub fn vocabulary(&self) -> Vec<String> {
		let mut seen = std::collections::HashSet::new();
		let mut vocabulary = Vec::new();
		for example in &self.examples {
			for word in tokenize(example) {
				if seen.insert(word.clone()) {
					vocabulary.push(word);
				}
			}
		}
		vocabulary
	}
}

impl Default for Corpus {
	fn default() -> Self {
		Self::new()
	}
}
