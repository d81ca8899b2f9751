use std::path::Path;
use std::sync::mpsc;
use std::thread;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::io::{cache_path, file_stem, read_lines};
use super::counts::{combine, CountTable};
use super::matrix::FlatMatrix;
use super::sampler::{RngSource, Sampler, UniformSource};

/// A built transition model plus its window size.
///
/// # Responsibilities
/// - Build the flat matrix from an in-memory corpus or a corpus file
/// - Cache file-backed builds as a compact binary next to the corpus
/// - Hand out independent samples
///
/// # Invariants
/// - The matrix is never mutated after construction; it is shared
///   read-only by any number of sampling calls.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MarkovModel {
	/// Window size the matrix was built with.
	n: usize,
	matrix: FlatMatrix,
	/// Stems of the corpus files this model was loaded from.
	sources: Vec<String>,
}

impl MarkovModel {
	/// Builds a model from an in-memory corpus.
	///
	/// # Errors
	/// Fails for `n = 1` (n-grams cannot be split into transitions).
	pub fn from_corpus<I, S>(corpus: I, n: usize) -> Result<Self>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		Ok(Self {
			n,
			matrix: FlatMatrix::from_corpus(corpus, n)?,
			sources: Vec::new(),
		})
	}

	/// Loads a model for a corpus file, building it if needed.
	///
	/// A binary cache next to the corpus (`names.txt` → `names.bin`) is
	/// used when it exists and was built with the same `n`; otherwise the
	/// corpus is read (one entry per line), counted in parallel, and the
	/// cache is written for the next load.
	pub fn new<P: AsRef<Path>>(filepath: P, n: usize) -> Result<Self> {
		let binary_path = cache_path(&filepath, "bin")?;

		let cached = if binary_path.exists() {
			let bytes = std::fs::read(&binary_path)?;
			let model: Self = postcard::from_bytes(&bytes)?;
			if model.n == n {
				debug!("loaded cached model from {}", binary_path.display());
				Some(model)
			} else {
				debug!(
					"cache {} was built with n={}, rebuilding with n={}",
					binary_path.display(),
					model.n,
					n
				);
				None
			}
		} else {
			None
		};

		let mut model = match cached {
			Some(model) => model,
			None => Self::read_corpus_file(&filepath, &binary_path, n)?,
		};
		model.sources.push(file_stem(&filepath)?);
		Ok(model)
	}

	/// Reads a corpus file, builds the model, and writes the binary cache.
	fn read_corpus_file<PF, PB>(filepath: PF, binary_path: PB, n: usize) -> Result<Self>
	where
		PF: AsRef<Path>,
		PB: AsRef<Path>,
	{
		let lines = read_lines(&filepath)?;
		let table = Self::count_corpus(&lines, n);
		let matrix = FlatMatrix::from_table(&table)?;
		info!(
			"built {}-gram model from {} corpus lines ({} states)",
			n,
			lines.len(),
			matrix.len()
		);

		let model = Self { n, matrix, sources: Vec::new() };
		let bytes = postcard::to_stdvec(&model)?;
		std::fs::write(binary_path, bytes)?;

		Ok(model)
	}

	/// Counts the corpus across worker threads.
	///
	/// Lines are split into chunks (CPU cores * factor), each chunk is
	/// counted into a partial table on its own thread, and the partials
	/// are folded together in chunk order. Merging in chunk order keeps
	/// the row order of the final matrices independent of thread timing.
	fn count_corpus(lines: &[String], n: usize) -> CountTable {
		if lines.is_empty() {
			return CountTable::new();
		}

		let cpus = num_cpus::get();
		let factor = 8;
		let chunks = cpus * factor;
		let chunk_size = lines.len().div_ceil(chunks).max(1);

		let (tx, rx) = mpsc::channel();
		for (slot, chunk) in lines.chunks(chunk_size).enumerate() {
			let tx = tx.clone();
			let chunk: Vec<String> = chunk.to_vec();

			thread::spawn(move || {
				let partial = combine(&chunk, n);
				tx.send((slot, partial)).expect("failed to send partial counts from worker");
			});
		}
		drop(tx);

		let mut partials: Vec<(usize, CountTable)> = rx.iter().collect();
		partials.sort_by_key(|(slot, _)| *slot);

		let mut table = CountTable::new();
		for (_, partial) in &partials {
			table.merge(partial);
		}
		table
	}

	pub fn n(&self) -> usize {
		self.n
	}

	pub fn matrix(&self) -> &FlatMatrix {
		&self.matrix
	}

	pub fn sources(&self) -> &[String] {
		&self.sources
	}

	/// One independent sample from the thread-local generator.
	pub fn generate(&self) -> Result<String> {
		self.matrix.generate()
	}

	/// Like `generate`, with an optional length bound on the walk.
	pub fn generate_bounded(&self, max_len: Option<usize>) -> Result<String> {
		let mut source = RngSource(rand::rng());
		self.generate_with(&mut source, max_len)
	}

	/// Samples with a caller-supplied draw source and optional length
	/// bound.
	pub fn generate_with<S: UniformSource>(&self, source: &mut S, max_len: Option<usize>) -> Result<String> {
		let mut sampler = Sampler::new(&self.matrix, source);
		if let Some(max) = max_len {
			sampler = sampler.bounded(max);
		}
		sampler.generate()
	}
}

#[cfg(test)]
mod tests {
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	use super::*;

	#[test]
	fn in_memory_build_and_sample() {
		let model = MarkovModel::from_corpus(["ab"], 2).unwrap();
		assert_eq!(model.n(), 2);
		assert!(model.sources().is_empty());

		let mut source = RngSource(StdRng::seed_from_u64(3));
		assert_eq!(model.generate_with(&mut source, None).unwrap(), "ab");
		// single possible path, so the thread-local generator agrees
		assert_eq!(model.generate().unwrap(), "ab");
	}

	#[test]
	fn file_build_writes_and_reuses_the_cache() {
		let dir = tempfile::tempdir().unwrap();
		let corpus = dir.path().join("names.txt");
		std::fs::write(&corpus, "anna\nbert\nclara\n").unwrap();

		let model = MarkovModel::new(&corpus, 3).unwrap();
		assert_eq!(model.sources(), ["names"]);
		let cache = dir.path().join("names.bin");
		assert!(cache.exists());

		// second load comes from the cache and matches the first build
		let reloaded = MarkovModel::new(&corpus, 3).unwrap();
		assert_eq!(reloaded.n(), 3);
		assert_eq!(reloaded.matrix(), model.matrix());
	}

	#[test]
	fn cache_with_a_different_window_is_rebuilt() {
		let dir = tempfile::tempdir().unwrap();
		let corpus = dir.path().join("names.txt");
		std::fs::write(&corpus, "anna\nbert\nclara\n").unwrap();

		let first = MarkovModel::new(&corpus, 3).unwrap();
		let second = MarkovModel::new(&corpus, 2).unwrap();
		assert_eq!(second.n(), 2);
		assert_ne!(second.matrix(), first.matrix());
	}

	#[test]
	fn parallel_count_matches_sequential_combine() {
		let lines: Vec<String> = (0..100)
			.map(|i| format!("name{}", i % 7))
			.collect();
		let parallel = MarkovModel::count_corpus(&lines, 3);
		let sequential = combine(&lines, 3);

		assert_eq!(parallel.len(), sequential.len());
		for (gram, count) in sequential.iter() {
			assert_eq!(parallel.count(gram), count, "count of `{}`", gram);
		}
	}

	#[test]
	fn samples_resemble_the_corpus() {
		let model = MarkovModel::from_corpus(["anna", "annika", "annabel"], 3).unwrap();
		let mut source = RngSource(StdRng::seed_from_u64(11));
		for _ in 0..50 {
			let word = model.generate_with(&mut source, Some(64)).unwrap();
			assert!(word.starts_with("an"), "unexpected sample `{}`", word);
		}
	}
}
