use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::{get, put, web, App, HttpResponse, HttpServer, Responder};
use log::{info, warn};
use serde::Deserialize;

use wortgen_core::io::{list_files, normalize_folder};
use wortgen_core::model::markov_model::MarkovModel;

/// Window size used when a load request does not specify one.
const DEFAULT_N: usize = 3;

/// Query parameters for the `/v1/generate` endpoint.
#[derive(Deserialize)]
struct GenerateParams {
	model: String,
	count: Option<usize>,
	max_len: Option<usize>,
}

/// Query parameters for the `/v1/load_models` endpoint.
#[derive(Deserialize)]
struct ModelQuery {
	names: Option<String>,
	n: Option<usize>,
}

struct SharedData {
	/// Directory holding corpus files (`<name>.txt`, one entry per line).
	data_dir: PathBuf,
	models: HashMap<String, MarkovModel>,
}

impl SharedData {
	/// Loads one corpus file into the model map.
	fn load(&mut self, name: &str, n: usize) -> Result<(), String> {
		let corpus_path = self.data_dir.join(format!("{}.txt", name));
		match MarkovModel::new(&corpus_path, n) {
			Ok(model) => {
				self.models.insert(name.to_owned(), model);
				Ok(())
			}
			Err(e) => Err(format!("Failed to load model `{}`: {}", name, e)),
		}
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates `count` independent samples from a loaded model and returns
/// them as a JSON array. Each sample draws from the thread-local
/// generator, so responses do not depend on request interleaving.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<Mutex<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let count = query.count.unwrap_or(1).clamp(1, 1000);

	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let model = match shared_data.models.get(&query.model) {
		Some(m) => m,
		None => return HttpResponse::BadRequest().body(format!("Model `{}` is not loaded", query.model)),
	};

	let mut words = Vec::with_capacity(count);
	for _ in 0..count {
		match model.generate_bounded(query.max_len) {
			Ok(word) => words.push(word),
			Err(e) => return HttpResponse::InternalServerError().body(e.to_string()),
		}
	}

	HttpResponse::Ok().json(words)
}

/// HTTP GET endpoint `/v1/models`
///
/// Lists the corpus files available in the data directory.
#[get("/v1/models")]
async fn get_models(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	match list_files(&shared_data.data_dir, "txt") {
		Ok(files) => HttpResponse::Ok().body(files.join("\n").replace(".txt", "")),
		Err(_) => HttpResponse::InternalServerError().body("Failed to list models"),
	}
}

/// HTTP GET endpoint `/v1/loaded_models`
#[get("/v1/loaded_models")]
async fn get_loaded_models(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let mut names: Vec<&str> = shared_data.models.keys().map(String::as_str).collect();
	names.sort_unstable();
	HttpResponse::Ok().body(names.join("\n"))
}

/// HTTP PUT endpoint `/v1/load_models`
///
/// Replaces the loaded models with the named corpus files, built with the
/// requested window size (default 3).
#[put("/v1/load_models")]
async fn put_models(data: web::Data<Mutex<SharedData>>, query: web::Query<ModelQuery>) -> impl Responder {
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let query_names = match &query.names {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty model name"),
	};
	let n = query.n.unwrap_or(DEFAULT_N);

	let model_names: Vec<String> = query_names
		.split(',')
		.map(|s| s.trim().to_owned())
		.filter(|s| !s.is_empty())
		.collect();

	shared_data.models.clear();
	for name in &model_names {
		if let Err(e) = shared_data.load(name, n) {
			return HttpResponse::InternalServerError().body(e);
		}
	}

	HttpResponse::Ok().body("Models loaded successfully")
}

/// Main entry point for the server.
///
/// Takes the corpus directory as the first argument (default `./data`),
/// preloads every corpus file found there, and serves the generation API
/// on 127.0.0.1:5000. Models are read-only after loading; the mutex
/// exists only for `/v1/load_models`.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::init();

	let data_dir = normalize_folder(&std::env::args().nth(1).unwrap_or_else(|| "./data".to_owned()));
	let mut shared_data = SharedData {
		data_dir,
		models: HashMap::new(),
	};

	match list_files(&shared_data.data_dir, "txt") {
		Ok(files) => {
			for file in files {
				let name = file.trim_end_matches(".txt").to_owned();
				match shared_data.load(&name, DEFAULT_N) {
					Ok(()) => info!("preloaded model `{}`", name),
					Err(e) => warn!("{}", e),
				}
			}
		}
		Err(e) => warn!("no corpus directory at {}: {}", shared_data.data_dir.display(), e),
	}

	let shared_model = web::Data::new(Mutex::new(shared_data));

	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(shared_model.clone())
			.service(get_generated)
			.service(get_models)
			.service(put_models)
			.service(get_loaded_models)
	})
		.bind(("127.0.0.1", 5000))?
		.run()
		.await
}
