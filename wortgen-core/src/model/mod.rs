//! Top-level module for the transition-model pipeline.
//!
//! Data flows one direction only:
//! extractor → count table → count matrix → probability matrix → flat
//! matrix → sampler. Everything upstream of the flat matrix is a one-time,
//! write-once build step.

/// Sentinel characters, boundary wrapping, and the typed transition state.
pub mod state;

/// N-gram extraction (lazy window iterator with the short-string clamp).
pub mod ngrams;

/// N-gram counting and whole-corpus combination.
pub mod counts;

/// Count → probability → flat matrix transforms.
pub mod matrix;

/// Weighted random walks over a flat matrix.
///
/// Randomness enters through the `UniformSource` seam so tests can script
/// draws and concurrent callers can each own an independent generator.
pub mod sampler;

/// File-backed model with a binary cache and parallel corpus counting.
pub mod markov_model;
