use llm_intuition_core::model::corpus::Corpus;
use llm_intuition_core::model::history::SelectionMethod;
use llm_intuition_core::model::sampler::TemperatureSampler;
use llm_intuition_core::model::session::GenerationSession;
use llm_intuition_core::stream::playback::PlaybackSource;
use llm_intuition_core::stream::session::TokenStreamSession;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // --- Next-word prediction demo -----------------------------------

    // A session owns its corpus, context, history, and sampler.
    // Seeded here so repeated runs print the same generations.
    let mut session = GenerationSession::with_seed(Corpus::with_defaults(), 42);

    // With an empty context, the distribution counts first words.
    // Every example starts with "The", so "the" gets probability 1.
    println!("First-word distribution:");
    for (word, probability) in session.probabilities().iter() {
        if probability > 0.0 {
            println!("  {}: {:.3}", word, probability);
        }
    }

    // Inspect the distribution after "the cat": three continuations
    // ("sat", "ate", "played") weighted by corpus frequency.
    session.replace_context(vec!["the".to_owned(), "cat".to_owned()]);
    println!("\nAfter \"the cat\":");
    for (word, probability) in TemperatureSampler::top_k(session.probabilities(), 5) {
        println!("  {}: {:.3}", word, probability);
    }

    // Temperature reshapes the same distribution: low sharpens toward
    // the most frequent word, high flattens toward uniform.
    for temperature in [0.3, 1.0, 2.0] {
        let rescaled = TemperatureSampler::rescale(session.probabilities(), temperature);
        let top = TemperatureSampler::top_k(&rescaled, 1);
        println!(
            "Temperature {}: most likely \"{}\" at {:.3}",
            temperature, top[0].0, top[0].1
        );
    }

    // Invalid temperatures are rejected, not clamped.
    match session.set_temperature(0.0) {
        Ok(_) => println!("Should not happen"),
        Err(_) => println!("\nTemperature 0.0 is invalid, must be > 0.0"),
    }

    // Step-by-step: pick a word manually, then undo it.
    session.reset();
    session.select_word("the", SelectionMethod::Manual);
    println!("\nContext after manual pick: {:?}", session.context());
    session.step_back();
    println!("Context after step back:   {:?}", session.context());

    // Generate 5 full sentences with sampled continuation.
    session.set_temperature(0.8)?;
    for i in 0..5 {
        session.reset();
        session.generate_until_stop();
        println!("Generated sentence {}: {}", i + 1, session.context().join(" "));
    }

    // --- Token-stream demo --------------------------------------------

    // Play back the scripted scenario for a known prompt, instantly.
    let source = PlaybackSource::instant();
    let mut stream = TokenStreamSession::new();
    stream.set_user_prompt("What is the capital of France?");
    stream.run(&source);
    println!("\nStreamed {} tokens: {:?}", stream.tokens().len(), stream.prefix_text());

    // Branch at token 5 (" Paris") onto its alternative " officially",
    // discarding everything after it...
    stream.branch_from(5, " officially")?;
    println!(
        "After branch: {} tokens, pending continuation: {}",
        stream.tokens().len(),
        stream.pending_branch()
    );

    // ...and resume: the playback source streams only the remainder.
    stream.resume_branch(&source);
    println!("After resume: {} tokens: {:?}", stream.tokens().len(), stream.prefix_text());

    // Cancellation is not an error: the error field stays empty.
    stream.cancel();
    assert!(stream.error().is_none());

    Ok(())
}
