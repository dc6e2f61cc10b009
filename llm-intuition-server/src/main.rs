use std::sync::Mutex;

use actix_web::{App, HttpResponse, HttpServer, Responder, get, put, web};

use serde::{Deserialize, Serialize};

use llm_intuition_core::io::{get_filename, list_files};
use llm_intuition_core::model::corpus::Corpus;
use llm_intuition_core::model::sampler::TemperatureSampler;
use llm_intuition_core::model::session::GenerationSession;
use llm_intuition_core::stream::playback::PlaybackSource;
use llm_intuition_core::stream::session::{SYSTEM_PRESETS, TokenStreamSession};

/// Query parameters for the `/v1/predict` endpoint.
#[derive(Deserialize)]
struct PredictParams {
	context: Option<String>,
	temperature: Option<f64>,
	k: Option<usize>,
}

/// Query parameters for the `/v1/generate` endpoint.
#[derive(Deserialize)]
struct GenerateParams {
	context: Option<String>,
	temperature: Option<f64>,
}

#[derive(Deserialize)]
struct ExampleParams {
	text: Option<String>,
}

#[derive(Deserialize)]
struct CorpusQuery {
	name: Option<String>,
}

#[derive(Deserialize)]
struct TokensParams {
	prompt: Option<String>,
	preset: Option<String>,
}

#[derive(Serialize)]
struct Prediction {
	word: String,
	probability: f64,
}

struct SharedData {
	session: GenerationSession,
}

/// Splits a `context` query value into words; absent or blank means the
/// empty context.
fn parse_context(context: &Option<String>) -> Vec<String> {
	match context {
		Some(s) => s.split_whitespace().map(str::to_owned).collect(),
		None => Vec::new(),
	}
}

/// HTTP GET endpoint `/v1/predict`
///
/// Computes the next-word distribution for the given context, rescales
/// it by the given temperature, and returns the top-k predictions as
/// JSON. An all-zero result means no context match in the corpus.
#[get("/v1/predict")]
async fn get_predictions(data: web::Data<Mutex<SharedData>>, query: web::Query<PredictParams>) -> impl Responder {
	let temperature = query.temperature.unwrap_or(1.0);
	let k = query.k.unwrap_or(5);
	let context = parse_context(&query.context);

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Session lock failed"),
	};

	if let Err(e) = shared_data.session.set_temperature(temperature) {
		return HttpResponse::BadRequest().body(e);
	}
	shared_data.session.replace_context(context);

	let rescaled = TemperatureSampler::rescale(shared_data.session.probabilities(), temperature);
	let predictions: Vec<Prediction> = TemperatureSampler::top_k(&rescaled, k)
		.into_iter()
		.map(|(word, probability)| Prediction { word, probability })
		.collect();

	HttpResponse::Ok().json(predictions)
}

/// HTTP GET endpoint `/v1/generate`
///
/// Runs sampled generation from the given context until the stopping
/// policy fires (sentence-ending word or maximum length) and returns
/// the full generated text.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<Mutex<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let temperature = query.temperature.unwrap_or(1.0);
	let context = parse_context(&query.context);

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Session lock failed"),
	};

	if let Err(e) = shared_data.session.set_temperature(temperature) {
		return HttpResponse::BadRequest().body(e);
	}
	shared_data.session.replace_context(context);
	shared_data.session.generate_until_stop();

	HttpResponse::Ok().body(shared_data.session.context().join(" "))
}

#[get("/v1/examples")]
async fn get_examples(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Session lock failed"),
	};
	HttpResponse::Ok().body(shared_data.session.corpus().examples().join("\n"))
}

/// HTTP PUT endpoint `/v1/examples`
///
/// Adds one example sentence to the corpus.
#[put("/v1/examples")]
async fn put_example(data: web::Data<Mutex<SharedData>>, query: web::Query<ExampleParams>) -> impl Responder {
	let text = match &query.text {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty example text"),
	};

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Session lock failed"),
	};

	shared_data.session.add_example(text);
	HttpResponse::Ok().body("Example added")
}

/// HTTP PUT endpoint `/v1/reset`
///
/// Clears context and history; the corpus is kept.
#[put("/v1/reset")]
async fn put_reset(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Session lock failed"),
	};
	shared_data.session.reset();
	HttpResponse::Ok().body("Session reset")
}

#[get("/v1/corpora")]
async fn get_corpora() -> impl Responder {
	match list_files("./data", "txt") {
		Ok(files) => {
			let names: Vec<String> = files.iter().filter_map(|f| get_filename(f).ok()).collect();
			HttpResponse::Ok().body(names.join("\n"))
		}
		Err(_) => HttpResponse::InternalServerError().body("Failed to list corpora"),
	}
}

/// HTTP PUT endpoint `/v1/load_corpus`
///
/// Replaces the session corpus with a `.txt` file from `./data`
/// (one example sentence per line).
#[put("/v1/load_corpus")]
async fn put_corpus(data: web::Data<Mutex<SharedData>>, query: web::Query<CorpusQuery>) -> impl Responder {
	let name = match &query.name {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty corpus name"),
	};

	let corpus_path = format!("./data/{}.txt", name);
	let corpus = match Corpus::from_file(&corpus_path) {
		Ok(c) => c,
		Err(e) => return HttpResponse::InternalServerError().body(format!("Failed to load corpus: {e}")),
	};

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Session lock failed"),
	};

	shared_data.session.set_corpus(corpus);
	HttpResponse::Ok().body("Corpus loaded successfully")
}

/// HTTP GET endpoint `/v1/tokens`
///
/// Runs the scripted playback scenario for the given prompt and preset
/// through a token-stream session (no pacing) and returns the full
/// token list with probabilities and alternatives.
#[get("/v1/tokens")]
async fn get_tokens(query: web::Query<TokensParams>) -> impl Responder {
	let prompt = match &query.prompt {
		Some(s) if !s.trim().is_empty() => s.trim().to_owned(),
		_ => return HttpResponse::BadRequest().body("Missing or empty prompt"),
	};
	let preset = query.preset.clone().unwrap_or_else(|| "None".to_owned());

	let preset_text = SYSTEM_PRESETS
		.iter()
		.find(|(name, _)| *name == preset)
		.map(|(_, text)| *text)
		.unwrap_or("");

	let mut session = TokenStreamSession::new();
	session.set_user_prompt(&prompt);
	session.set_system_prompt(preset_text, &preset);
	session.run(&PlaybackSource::instant());

	if let Some(error) = session.error() {
		return HttpResponse::InternalServerError().body(error.to_owned());
	}

	HttpResponse::Ok().json(session.tokens())
}

/// Main entry point for the server.
///
/// Builds a generation session over the default corpus, wraps it in a
/// `Mutex` for thread safety, and starts an Actix-web HTTP server.
///
/// # Notes
/// - The server binds to 127.0.0.1:5000.
/// - Corpus files are looked up under `./data`.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::init();

	let shared_data = SharedData {
		session: GenerationSession::new(),
	};
	let shared_session = web::Data::new(Mutex::new(shared_data));

	log::info!("Listening on 127.0.0.1:5000");

	HttpServer::new(move || {
		App::new()
			.wrap(actix_cors::Cors::permissive())
			.app_data(shared_session.clone())
			.service(get_predictions)
			.service(get_generated)
			.service(get_examples)
			.service(put_example)
			.service(put_reset)
			.service(get_corpora)
			.service(put_corpus)
			.service(get_tokens)
	})
		.bind(("127.0.0.1", 5000))?
		.run()
		.await
}
