use rand::Rng;

use crate::error::{ModelError, Result};
use super::matrix::FlatMatrix;
use super::state::State;

/// A source of uniform draws in [0, 1).
///
/// Randomness enters the sampler only through this seam, so deterministic
/// tests can script a fixed sequence and concurrent callers can each own
/// an independent generator instead of sharing process-wide state.
pub trait UniformSource {
	fn draw(&mut self) -> f64;
}

impl<S: UniformSource + ?Sized> UniformSource for &mut S {
	fn draw(&mut self) -> f64 {
		(**self).draw()
	}
}

/// Adapts any `rand` generator to the `UniformSource` seam.
pub struct RngSource<R: Rng>(pub R);

impl<R: Rng> UniformSource for RngSource<R> {
	fn draw(&mut self) -> f64 {
		self.0.random()
	}
}

/// Weighted random walker over a flat matrix.
///
/// Borrows the matrix read-only and owns its draw source, so any number
/// of samplers can share one model without their outputs depending on
/// call interleaving.
pub struct Sampler<'a, S: UniformSource> {
	matrix: &'a FlatMatrix,
	source: S,
	max_len: Option<usize>,
}

impl<'a, S: UniformSource> Sampler<'a, S> {
	pub fn new(matrix: &'a FlatMatrix, source: S) -> Self {
		Self { matrix, source, max_len: None }
	}

	/// Caps the walk at `max_len` output characters.
	///
	/// Walks are unbounded by default; the cap turns a runaway walk on a
	/// cyclic model into a distinct `LengthBoundExceeded` outcome.
	pub fn bounded(mut self, max_len: usize) -> Self {
		self.max_len = Some(max_len);
		self
	}

	/// Weighted selection: the first to-state whose cumulative threshold
	/// strictly exceeds a fresh draw.
	///
	/// # Errors
	/// The last threshold of every row is 1.0, so the scan matches for
	/// any draw below 1.0. Exhausting it means the matrix or the draw
	/// source broke an invariant; that is fatal, not recoverable.
	fn select(&mut self, from: &State) -> Result<&'a State> {
		let matrix = self.matrix;
		let row = matrix
			.row(from)
			.ok_or_else(|| ModelError::MissingRow { state: from.to_string() })?;

		let p = self.source.draw();
		for (to, threshold) in row {
			if *threshold > p {
				return Ok(to);
			}
		}
		Err(ModelError::SelectionFailed { state: from.to_string(), draw: p })
	}

	/// Walks the matrix from the start state to the end state.
	///
	/// The first selection from the start row seeds the output with a
	/// whole prefix; every further step appends the final character of the
	/// selected state. Reaching the end state returns what accumulated.
	/// The output never contains sentinel characters.
	pub fn generate(&mut self) -> Result<String> {
		if self.matrix.is_empty() {
			return Err(ModelError::EmptyModel);
		}

		let seed = self.select(&State::Start)?;
		let State::Prefix(prefix) = seed else {
			// the start row can point straight at the end state
			// (single-character corpus entries); nothing was emitted
			return Ok(String::new());
		};

		let mut out = prefix.clone();
		let mut len = out.chars().count();
		let mut current = seed;

		loop {
			let next = self.select(current)?;
			if next.is_end() {
				return Ok(out);
			}
			if let Some(max) = self.max_len {
				if len >= max {
					return Err(ModelError::LengthBoundExceeded { max });
				}
			}
			if let Some(c) = next.last_char() {
				out.push(c);
				len += 1;
			}
			current = next;
		}
	}
}

impl FlatMatrix {
	/// One independent sample per call, drawn from the thread-local
	/// generator.
	pub fn generate(&self) -> Result<String> {
		Sampler::new(self, RngSource(rand::rng())).generate()
	}
}
