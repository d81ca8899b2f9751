use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use super::counts::{combine, CountTable};
use super::state::State;

/// Insertion-ordered rows keyed by from-state.
///
/// Each row is an ordered list of (to-state, value) pairs; row order and
/// in-row order are both first-observation order. The side index gives
/// O(1) row lookup during sampling.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
struct StateRows<V> {
	index: HashMap<State, usize>,
	rows: Vec<(State, Vec<(State, V)>)>,
}

impl<V> StateRows<V> {
	fn new() -> Self {
		Self { index: HashMap::new(), rows: Vec::new() }
	}

	fn row_mut(&mut self, from: &State) -> &mut Vec<(State, V)> {
		let slot = match self.index.get(from) {
			Some(&slot) => slot,
			None => {
				let slot = self.rows.len();
				self.index.insert(from.clone(), slot);
				self.rows.push((from.clone(), Vec::new()));
				slot
			}
		};
		&mut self.rows[slot].1
	}

	fn get(&self, from: &State) -> Option<&[(State, V)]> {
		self.index.get(from).map(|&slot| self.rows[slot].1.as_slice())
	}

	fn iter(&self) -> impl Iterator<Item = (&State, &[(State, V)])> {
		self.rows.iter().map(|(from, row)| (from, row.as_slice()))
	}

	fn len(&self) -> usize {
		self.rows.len()
	}

	fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}
}

/// Raw transition counts between states.
///
/// Built by reshaping a flat count table with the n-gram split rule. The
/// end sentinel never appears as a row key; the start sentinel never
/// appears as a transition target.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CountMatrix {
	rows: StateRows<u64>,
}

impl CountMatrix {
	/// Reshapes a count table into from-state/to-state rows.
	///
	/// Distinct n-grams can split to the same (from, to) pair: clamped
	/// whole-string n-grams all collapse to (Start, End). Their counts
	/// are summed.
	///
	/// # Errors
	/// Fails on n-grams shorter than two characters (see
	/// `State::split_ngram`).
	pub fn from_counts(table: &CountTable) -> Result<Self> {
		let mut rows = StateRows::new();
		for (gram, count) in table.iter() {
			let (from, to) = State::split_ngram(gram)?;
			let row = rows.row_mut(&from);
			match row.iter_mut().find(|(state, _)| *state == to) {
				Some(entry) => entry.1 += count,
				None => row.push((to, count)),
			}
		}
		Ok(Self { rows })
	}

	pub fn row(&self, from: &State) -> Option<&[(State, u64)]> {
		self.rows.get(from)
	}

	pub fn rows(&self) -> impl Iterator<Item = (&State, &[(State, u64)])> {
		self.rows.iter()
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}
}

/// Transition probabilities between states.
///
/// # Invariants
/// - Every row sums to 1.0 within floating-point tolerance
/// - Every probability is strictly positive
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProbabilityMatrix {
	rows: StateRows<f64>,
}

impl ProbabilityMatrix {
	/// Normalizes each count row by its total.
	///
	/// Every row key has at least one observed transition, so row totals
	/// are never zero.
	pub fn from_counts(counts: &CountMatrix) -> Self {
		let mut rows = StateRows::new();
		for (from, row) in counts.rows() {
			let total: u64 = row.iter().map(|(_, count)| count).sum();
			let new_row = rows.row_mut(from);
			for (to, count) in row {
				new_row.push((to.clone(), *count as f64 / total as f64));
			}
		}
		Self { rows }
	}

	pub fn row(&self, from: &State) -> Option<&[(State, f64)]> {
		self.rows.get(from)
	}

	pub fn rows(&self) -> impl Iterator<Item = (&State, &[(State, f64)])> {
		self.rows.iter()
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}
}

/// Transition model with cumulative probability thresholds per row.
///
/// The only artifact the sampler needs: a row scan against a uniform draw
/// selects the next state in O(row width).
///
/// # Invariants
/// - Thresholds increase in row order
/// - The last threshold of every row is exactly 1.0
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FlatMatrix {
	rows: StateRows<f64>,
}

impl FlatMatrix {
	/// Runs a prefix sum over each probability row.
	///
	/// The final threshold is pinned to exactly 1.0: the sampler's scan
	/// relies on it to terminate for every draw below 1.0, and rounding
	/// drift in the sum must not break that.
	pub fn from_probabilities(probabilities: &ProbabilityMatrix) -> Self {
		let mut rows = StateRows::new();
		for (from, row) in probabilities.rows() {
			let new_row = rows.row_mut(from);
			let mut cumulative = 0.0;
			for (position, (to, probability)) in row.iter().enumerate() {
				cumulative += probability;
				if position + 1 == row.len() {
					cumulative = 1.0;
				}
				new_row.push((to.clone(), cumulative));
			}
		}
		Self { rows }
	}

	/// Builds the full model from a raw corpus: combine, reshape,
	/// normalize, flatten.
	///
	/// An empty corpus (or a zero window) produces an empty matrix;
	/// sampling from it fails with `EmptyModel`.
	///
	/// # Errors
	/// Fails for windows that produce n-grams shorter than two characters
	/// (`n = 1` on any non-degenerate corpus).
	pub fn from_corpus<I, S>(corpus: I, n: usize) -> Result<Self>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		Self::from_table(&combine(corpus, n))
	}

	/// Builds the model from an already-counted table (steps shared with
	/// the parallel file-backed build).
	pub fn from_table(table: &CountTable) -> Result<Self> {
		let counts = CountMatrix::from_counts(table)?;
		let probabilities = ProbabilityMatrix::from_counts(&counts);
		Ok(Self::from_probabilities(&probabilities))
	}

	pub fn row(&self, from: &State) -> Option<&[(State, f64)]> {
		self.rows.get(from)
	}

	pub fn rows(&self) -> impl Iterator<Item = (&State, &[(State, f64)])> {
		self.rows.iter()
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ModelError;

	fn prefix(s: &str) -> State {
		State::Prefix(s.to_owned())
	}

	fn assert_close(actual: f64, expected: f64) {
		assert!((actual - expected).abs() < 1e-12, "expected {}, got {}", expected, actual);
	}

	// corpus ["aaa", "aaa", "aab"], n = 3
	fn aab_corpus_counts() -> CountMatrix {
		CountMatrix::from_counts(&combine(["aaa", "aaa", "aab"], 3)).unwrap()
	}

	#[test]
	fn count_matrix_for_a_small_corpus() {
		let counts = aab_corpus_counts();
		assert_eq!(counts.len(), 3);
		assert_eq!(counts.row(&State::Start), Some([(prefix("aa"), 3)].as_slice()));
		// in-row order is first-observation order: `aa⁝` is seen at offset 2
		// of the first entry, before `aab` from the third
		assert_eq!(
			counts.row(&prefix("aa")),
			Some([(prefix("aa"), 2), (State::End, 2), (prefix("ab"), 1)].as_slice())
		);
		assert_eq!(counts.row(&prefix("ab")), Some([(State::End, 1)].as_slice()));
	}

	#[test]
	fn end_state_has_no_row() {
		let counts = aab_corpus_counts();
		assert!(counts.row(&State::End).is_none());
	}

	#[test]
	fn probability_matrix_for_a_small_corpus() {
		let probabilities = ProbabilityMatrix::from_counts(&aab_corpus_counts());

		let start_row = probabilities.row(&State::Start).unwrap();
		assert_eq!(start_row.len(), 1);
		assert_eq!(start_row[0].0, prefix("aa"));
		assert_close(start_row[0].1, 1.0);

		let aa_row = probabilities.row(&prefix("aa")).unwrap();
		assert_eq!(aa_row[0].0, prefix("aa"));
		assert_close(aa_row[0].1, 0.4);
		assert_eq!(aa_row[1].0, State::End);
		assert_close(aa_row[1].1, 0.4);
		assert_eq!(aa_row[2].0, prefix("ab"));
		assert_close(aa_row[2].1, 0.2);
	}

	#[test]
	fn probability_rows_sum_to_one() {
		let corpus = ["hello", "help", "hero", "he", "hat"];
		let counts = CountMatrix::from_counts(&combine(corpus, 3)).unwrap();
		let probabilities = ProbabilityMatrix::from_counts(&counts);
		for (from, row) in probabilities.rows() {
			let sum: f64 = row.iter().map(|(_, p)| p).sum();
			assert!((sum - 1.0).abs() < 1e-9, "row `{}` sums to {}", from, sum);
		}
	}

	#[test]
	fn flat_rows_are_cumulative_and_end_at_one() {
		let corpus = ["hello", "help", "hero", "he", "hat"];
		let flat = FlatMatrix::from_corpus(corpus, 3).unwrap();
		for (from, row) in flat.rows() {
			let mut previous = 0.0;
			for (_, threshold) in row {
				assert!(*threshold > previous, "row `{}` thresholds not increasing", from);
				previous = *threshold;
			}
			assert_eq!(previous, 1.0, "row `{}` does not end at 1.0", from);
		}
	}

	#[test]
	fn flat_matrix_for_a_small_corpus() {
		let flat = FlatMatrix::from_corpus(["aaa", "aaa", "aab"], 3).unwrap();
		let aa_row = flat.row(&prefix("aa")).unwrap();
		assert_close(aa_row[0].1, 0.4);
		assert_close(aa_row[1].1, 0.8);
		assert_eq!(aa_row[2].1, 1.0);
	}

	#[test]
	fn clamped_whole_string_counts_are_summed() {
		// both entries collapse to a single (Start, End) transition
		let counts = CountMatrix::from_counts(&combine(["a", "b"], 4)).unwrap();
		assert_eq!(counts.row(&State::Start), Some([(State::End, 2)].as_slice()));
	}

	#[test]
	fn empty_corpus_builds_an_empty_matrix() {
		let flat = FlatMatrix::from_corpus(Vec::<String>::new(), 3).unwrap();
		assert!(flat.is_empty());
	}

	#[test]
	fn zero_window_builds_an_empty_matrix() {
		let flat = FlatMatrix::from_corpus(["abc"], 0).unwrap();
		assert!(flat.is_empty());
	}

	#[test]
	fn unit_window_is_rejected_at_reshape() {
		let err = FlatMatrix::from_corpus(["abc"], 1).unwrap_err();
		assert!(matches!(err, ModelError::NgramTooShort { .. }));
	}
}
