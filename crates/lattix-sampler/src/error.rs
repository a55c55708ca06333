//! Error types for lattix-sampler.

use thiserror::Error;

use crate::fact::{RelationId, Side};

/// Errors that can occur while indexing facts or drawing samples.
#[derive(Error, Debug)]
pub enum Error {
    /// Batch mode other than `head-batch` / `tail-batch`.
    #[error("Training batch mode {0} not supported")]
    InvalidMode(String),

    /// A lookup key the index never saw at construction time.
    #[error("Missing index key: {0}")]
    MissingKey(String),

    /// Positive pair sampling from a pool with no entities.
    #[error("Empty {side} pool for relation {relation}")]
    EmptyPool { relation: RelationId, side: Side },

    /// Fact with ids outside the declared entity/relation range.
    #[error("Invalid fact: {0}")]
    InvalidFact(String),

    /// Invalid configuration.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// A capped rejection loop ran out of rounds.
    #[error("{what} sampling gave up after {rounds} rounds")]
    SamplingExhausted { what: &'static str, rounds: usize },

    /// Collating zero examples.
    #[error("Cannot collate an empty batch")]
    EmptyBatch,

    /// Path-evidence collate over an example built without path evidence.
    #[error("Example {0} carries no path evidence")]
    MissingPathEvidence(usize),

    /// Array shape error while stacking a batch.
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for lattix-sampler.
pub type Result<T> = std::result::Result<T, Error>;
