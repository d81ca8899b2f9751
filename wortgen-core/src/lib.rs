//! Markov-chain string generation library.
//!
//! This crate learns a character-level n-gram transition model from a corpus
//! of example strings and samples plausible new strings from it:
//! - Boundary-marked n-gram extraction
//! - Count, probability and flat (cumulative) transition matrices
//! - Weighted random walks with an injectable randomness source
//! - File-backed models with a compact binary cache
//!
//! The model is built once from an immutable corpus snapshot; the resulting
//! flat matrix is read-only and can be shared by any number of samplers.

/// Core model types and generation logic.
pub mod model;

/// Error taxonomy shared by the whole crate.
pub mod error;

/// I/O utilities (corpus loading, cache paths, directory listing).
pub mod io;
