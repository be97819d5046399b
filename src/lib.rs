//! Pick the best-scoring alignment of each read across several name-sorted
//! alignment files, one file per reference genome.
//!
//! The pipeline is
//! [`scanner`](libs::scanner) → [`merge`](libs::merge) → [`select`](libs::select) → [`classify`](libs::classify).

pub mod libs;

pub use crate::libs::error::HitError;
pub use crate::libs::io::*;
