//! Integration tests for next-word probability computation.

use llm_intuition_core::model::corpus::{Corpus, DEFAULT_EXAMPLES, tokenize};
use llm_intuition_core::model::probability::compute;

fn corpus_of(examples: &[&str]) -> Corpus {
	let mut corpus = Corpus::new();
	for example in examples {
		corpus.add(example);
	}
	corpus
}

fn words(context: &[&str]) -> Vec<String> {
	context.iter().map(|w| (*w).to_owned()).collect()
}

#[test]
fn test_tokenize_keeps_punctuation_attached() {
	assert_eq!(tokenize("The cat sat."), vec!["the", "cat", "sat."]);
	assert_eq!(tokenize("  spaced   out  "), vec!["spaced", "out"]);
	assert!(tokenize("").is_empty());
}

#[test]
fn test_empty_context_counts_first_words() {
	let corpus = corpus_of(&["The cat sat.", "The dog ran."]);
	let distribution = compute(&corpus, &[]);

	assert!((distribution.get("the") - 1.0).abs() < 1e-12);
	for (word, probability) in distribution.iter() {
		if word != "the" {
			assert_eq!(probability, 0.0, "expected zero for {}", word);
		}
	}
}

#[test]
fn test_every_vocabulary_word_is_present() {
	let corpus = corpus_of(&["The cat sat.", "The dog ran."]);
	let distribution = compute(&corpus, &words(&["the"]));

	// Vocabulary: the, cat, sat., dog, ran.
	assert_eq!(distribution.len(), 5);
	assert_eq!(distribution.get("ran."), 0.0);
}

#[test]
fn test_sum_is_zero_or_one() {
	let corpus = Corpus::with_defaults();

	for context in [
		vec![],
		words(&["the"]),
		words(&["the", "cat"]),
		words(&["no", "such", "context"]),
	] {
		let total = compute(&corpus, &context).total();
		assert!(
			total.abs() < 1e-9 || (total - 1.0).abs() < 1e-9,
			"sum was {} for context {:?}",
			total,
			context
		);
	}
}

#[test]
fn test_default_corpus_the_cat_scenario() {
	let corpus = Corpus::with_defaults();
	assert_eq!(corpus.len(), DEFAULT_EXAMPLES.len());

	let distribution = compute(&corpus, &words(&["the", "cat"]));

	// "the cat" is followed by: sat (1), ate (1), played (3)
	assert!((distribution.get("sat") - 0.2).abs() < 1e-12);
	assert!((distribution.get("ate") - 0.2).abs() < 1e-12);
	assert!((distribution.get("played") - 0.6).abs() < 1e-12);

	for (word, probability) in distribution.iter() {
		if !matches!(word, "sat" | "ate" | "played") {
			assert_eq!(probability, 0.0, "unexpected mass on {}", word);
		}
	}
}

#[test]
fn test_context_match_is_case_insensitive() {
	let corpus = corpus_of(&["The cat sat."]);
	let distribution = compute(&corpus, &words(&["THE", "Cat"]));

	assert!((distribution.get("sat.") - 1.0).abs() < 1e-12);
}

#[test]
fn test_overlapping_windows_count_independently() {
	let corpus = corpus_of(&["a a a a"]);
	let distribution = compute(&corpus, &words(&["a", "a"]));

	// Windows at offsets 0 and 1 both match with a following token.
	assert!((distribution.get("a") - 1.0).abs() < 1e-12);

	let corpus = corpus_of(&["b a b a c"]);
	let distribution = compute(&corpus, &words(&["a"]));
	assert!((distribution.get("b") - 0.5).abs() < 1e-12);
	assert!((distribution.get("c") - 0.5).abs() < 1e-12);
}

#[test]
fn test_window_at_sentence_end_needs_a_follower() {
	// "the mat." matches only where a token follows the window.
	let corpus = corpus_of(&["the cat sat on the mat."]);
	let distribution = compute(&corpus, &words(&["the", "mat."]));

	assert_eq!(distribution.total(), 0.0);
}

#[test]
fn test_no_match_yields_all_zeros_not_an_error() {
	let corpus = Corpus::with_defaults();
	let distribution = compute(&corpus, &words(&["purple", "elephant"]));

	assert_eq!(distribution.total(), 0.0);
	assert!(!distribution.is_empty(), "vocabulary entries still present");
}

#[test]
fn test_punctuation_makes_distinct_vocabulary_entries() {
	let corpus = corpus_of(&["the cat. meowed", "the cat slept"]);
	let distribution = compute(&corpus, &words(&["the"]));

	// "cat." and "cat" are different words
	assert!((distribution.get("cat.") - 0.5).abs() < 1e-12);
	assert!((distribution.get("cat") - 0.5).abs() < 1e-12);
}

#[test]
fn test_compute_is_deterministic() {
	let corpus = Corpus::with_defaults();
	let context = words(&["the"]);

	let first = compute(&corpus, &context);
	let second = compute(&corpus, &context);
	assert_eq!(first, second);
}

#[test]
fn test_empty_corpus_yields_empty_distribution() {
	let corpus = Corpus::new();
	let distribution = compute(&corpus, &[]);
	assert!(distribution.is_empty());
}
