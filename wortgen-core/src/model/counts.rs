use std::collections::HashMap;

use crate::error::{ModelError, Result};
use super::ngrams::ngrams;
use super::state::mark_boundaries;

/// Occurrence counts for n-grams across a corpus.
///
/// Keys are unique; first-observation order is preserved and flows through
/// to the row order of the matrices built from this table, so builds are
/// reproducible for a given corpus.
///
/// # Invariants
/// - Every stored count is >= 1
/// - `entries` order is the order in which n-grams were first recorded
#[derive(Clone, Debug, Default)]
pub struct CountTable {
	index: HashMap<String, usize>,
	entries: Vec<(String, u64)>,
}

impl CountTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Counts a sequence of n-grams.
	pub fn from_ngrams<I, S>(grams: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut table = Self::new();
		for gram in grams {
			table.record(gram.into());
		}
		table
	}

	/// Records one occurrence of `ngram`. Absent entries start at zero.
	pub fn record(&mut self, ngram: String) {
		match self.index.get(&ngram) {
			Some(&slot) => self.entries[slot].1 += 1,
			None => {
				self.index.insert(ngram.clone(), self.entries.len());
				self.entries.push((ngram, 1));
			}
		}
	}

	pub fn count(&self, ngram: &str) -> u64 {
		self.index.get(ngram).map_or(0, |&slot| self.entries[slot].1)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Iterates entries in first-observation order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
		self.entries.iter().map(|(gram, count)| (gram.as_str(), *count))
	}

	/// Folds another table into this one.
	///
	/// Counts for shared n-grams are summed; unseen n-grams are appended
	/// in `other`'s order. Used to combine partial tables from parallel
	/// corpus counting.
	pub fn merge(&mut self, other: &Self) {
		for (gram, count) in other.iter() {
			match self.index.get(gram) {
				Some(&slot) => self.entries[slot].1 += count,
				None => {
					self.index.insert(gram.to_owned(), self.entries.len());
					self.entries.push((gram.to_owned(), count));
				}
			}
		}
	}
}

/// Counts the n-grams of every corpus entry into one shared table.
///
/// Each entry is wrapped with the start and end markers before extraction,
/// so boundary transitions are counted like any other n-gram. The window
/// `n` is shared by the whole corpus.
pub fn combine<I, S>(corpus: I, n: usize) -> CountTable
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let mut table = CountTable::new();
	for entry in corpus {
		for gram in ngrams(&mark_boundaries(entry.as_ref()), n) {
			table.record(gram);
		}
	}
	table
}

/// Weighted-corpus combination.
///
/// # Errors
/// Always fails with `WeightedCorpusUnsupported`. The capability is kept
/// visible so callers cannot mistake a silent approximation for support.
pub fn combine_weighted<I, S>(_corpus: I, _n: usize) -> Result<CountTable>
where
	I: IntoIterator<Item = (S, f64)>,
	S: AsRef<str>,
{
	Err(ModelError::WeightedCorpusUnsupported)
}
