#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::len_without_is_empty)]

//! Negative sampling and relation-path evidence for KGE training.
//!
//! Knowledge graph embedding models learn from (head, relation, tail) facts
//! by contrasting each true fact with corrupted ones. This crate produces,
//! for every training step, a positive fact plus a controlled set of
//! synthetic negatives and auxiliary relation-path evidence, stacked into
//! [`ndarray`] batches ready for optimization.
//!
//! The embedding model, its scoring function, the optimizer and checkpoint
//! I/O live elsewhere: the training loop simply pulls batches.
//!
//! # Pipeline
//!
//! ```text
//! facts ─► FactIndex ─────────┐
//!                             ├─► TrainingExampleBuilder ─► TrainingLoader ─► AlternatingStream
//! paths ─► PathEvidenceIndex ─┘      (one per mode)          (one per mode)
//! ```
//!
//! | Component | Role |
//! |-----------|------|
//! | [`FactIndex`] | frequencies, true heads/tails, per-relation entity pools |
//! | [`NegativeSampler`] | filtered entity negatives |
//! | [`PairSampler`] | entities inside / outside a relation's pool |
//! | [`PathEvidenceIndex`] | ranked relation paths, weak-positive relations |
//! | [`TrainingExampleBuilder`] | one [`TrainingExample`] per fact |
//! | [`collate`] / [`collate_with_paths`] | stack examples into a [`TrainingBatch`] |
//! | [`AlternatingStream`] | endless head/tail alternation |
//! | [`EvaluationExampleBuilder`] | all-entity candidates with filter bias |
//!
//! # Modes
//!
//! | Mode | Perturbed slot | Negative filter |
//! |------|----------------|-----------------|
//! | `head-batch` | head | true heads of (relation, tail) |
//! | `tail-batch` | tail | true tails of (head, relation) |
//!
//! # Randomness
//!
//! There is no global random state. Every sampling call takes an explicit
//! `&mut impl Rng`; loaders own a seeded `XorShiftRng`, so a fixed
//! [`SamplerConfig::seed`] reproduces the same batches.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use lattix_sampler::{
//!     AlternatingStream, Fact, FactIndex, Mode, SamplerConfig, TrainingExampleBuilder,
//!     TrainingLoader,
//! };
//!
//! let facts = vec![
//!     Fact::new(0, 0, 1),
//!     Fact::new(1, 0, 2),
//!     Fact::new(2, 1, 3),
//!     Fact::new(3, 1, 0),
//! ];
//! let config = SamplerConfig::default()
//!     .with_negative_sample_size(4)
//!     .with_pair_sample_size(2)
//!     .with_batch_size(2);
//! let index = Arc::new(FactIndex::from_config(facts, 6, 2, &config)?);
//!
//! let head = TrainingLoader::new(
//!     TrainingExampleBuilder::new(index.clone(), Mode::HeadBatch, &config)?,
//!     &config,
//! )?;
//! let tail = TrainingLoader::new(
//!     TrainingExampleBuilder::new(index, Mode::TailBatch, &config)?,
//!     &config,
//! )?;
//!
//! let mut stream = AlternatingStream::new(head, tail);
//! let first = stream.next().unwrap()?;
//! let second = stream.next().unwrap()?;
//! assert_eq!(first.mode, Mode::HeadBatch);
//! assert_eq!(second.mode, Mode::TailBatch);
//! assert_eq!(first.negatives.dim(), (2, 4));
//! # Ok::<(), lattix_sampler::Error>(())
//! ```

pub mod batch;
mod config;
mod error;
pub mod example;
mod fact;
pub mod index;
pub mod loader;
pub mod path;
pub mod sampling;
pub mod stream;

pub use batch::{collate, collate_evaluation, collate_with_paths, EvaluationBatch, PathBatch, TrainingBatch};
pub use config::SamplerConfig;
pub use error::{Error, Result};
pub use example::{
    EvaluationExample, EvaluationExampleBuilder, PathSample, TrainingExample,
    TrainingExampleBuilder,
};
pub use fact::{inverse_relation, EntityId, Fact, FactSet, Mode, RelationId, Side};
pub use index::FactIndex;
pub use loader::{EvaluationLoader, TrainingLoader};
pub use path::{PathCandidate, PathEvidence, PathEvidenceBundle, PathEvidenceIndex, PathKey};
pub use sampling::{NegativeSampler, PairSampler};
pub use stream::{AlternatingStream, BatchSource, Cyclic};
