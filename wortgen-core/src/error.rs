use thiserror::Error;

/// Errors produced while building or sampling a model.
///
/// Sampling errors split into two kinds: expected outcomes of degenerate
/// input (`EmptyModel`, `LengthBoundExceeded`) and internal-invariant
/// violations (`SelectionFailed`, `MissingRow`) that indicate a bug in
/// matrix construction and must propagate rather than be swallowed.
#[derive(Error, Debug)]
pub enum ModelError {
	/// The model has no states; nothing can be sampled from it.
	#[error("model is empty, nothing to sample")]
	EmptyModel,

	/// The walk reached a state with no outgoing transitions.
	#[error("no transition row for state `{state}`")]
	MissingRow { state: String },

	/// The weighted-selection scan found no threshold above the draw.
	/// The last threshold of every row is pinned at 1.0, so this can only
	/// happen for a malformed row or a draw outside [0, 1).
	#[error("no threshold above draw {draw} in row `{state}`, matrix is malformed")]
	SelectionFailed { state: String, draw: f64 },

	/// An n-gram shorter than two characters cannot be split into a
	/// from-state/to-state transition.
	#[error("n-gram `{ngram}` is too short to split into a transition")]
	NgramTooShort { ngram: String },

	/// Weighted corpora are not supported.
	#[error("weighted corpus combination is not implemented")]
	WeightedCorpusUnsupported,

	/// The walk grew past the configured length bound.
	#[error("generation exceeded the bound of {max} characters")]
	LengthBoundExceeded { max: usize },

	#[error(transparent)]
	Io(#[from] std::io::Error),

	/// Binary model cache (de)serialization failed.
	#[error("model codec error: {0}")]
	Codec(#[from] postcard::Error),
}

pub type Result<T> = std::result::Result<T, ModelError>;
