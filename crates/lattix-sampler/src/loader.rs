//! Epoch-level batching over the example builders.
//!
//! A loader is a [`BatchSource`]: each pass is one epoch, chunked into
//! `batch_size` examples (the last batch may be short).
//!
//! Every example in a training batch is built from its own seed, drawn from
//! the pass RNG before any example is built. With the `parallel` feature the
//! examples of a batch are built on the rayon pool; the batches are identical
//! either way.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::batch::{collate, collate_evaluation, collate_with_paths, EvaluationBatch, TrainingBatch};
use crate::config::SamplerConfig;
use crate::error::{Error, Result};
use crate::example::{EvaluationExampleBuilder, TrainingExample, TrainingExampleBuilder};
use crate::stream::BatchSource;

/// Shuffled, batched training epochs for one mode.
#[derive(Debug, Clone)]
pub struct TrainingLoader {
    builder: Arc<TrainingExampleBuilder>,
    batch_size: usize,
    shuffle: bool,
    rng: XorShiftRng,
}

impl TrainingLoader {
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] for an invalid `config` or a builder with no
    /// facts: an empty source would end an otherwise endless stream.
    pub fn new(builder: TrainingExampleBuilder, config: &SamplerConfig) -> Result<Self> {
        config.validate()?;
        if builder.is_empty() {
            return Err(Error::InvalidConfig("training set has no facts".into()));
        }
        Ok(Self {
            builder: Arc::new(builder),
            batch_size: config.batch_size,
            shuffle: config.shuffle,
            rng: XorShiftRng::seed_from_u64(config.seed),
        })
    }

    pub fn builder(&self) -> &TrainingExampleBuilder {
        &self.builder
    }

    /// Batches per epoch.
    pub fn num_batches(&self) -> usize {
        self.builder.len().div_ceil(self.batch_size)
    }
}

impl BatchSource for TrainingLoader {
    type Batch = Result<TrainingBatch>;
    type Pass = TrainingPass;

    fn pass(&mut self) -> TrainingPass {
        let mut rng = XorShiftRng::seed_from_u64(self.rng.gen());
        let mut order: Vec<usize> = (0..self.builder.len()).collect();
        if self.shuffle {
            order.shuffle(&mut rng);
        }
        TrainingPass {
            builder: Arc::clone(&self.builder),
            order,
            cursor: 0,
            batch_size: self.batch_size,
            rng,
        }
    }
}

/// One training epoch.
#[derive(Debug)]
pub struct TrainingPass {
    builder: Arc<TrainingExampleBuilder>,
    order: Vec<usize>,
    cursor: usize,
    batch_size: usize,
    rng: XorShiftRng,
}

impl Iterator for TrainingPass {
    type Item = Result<TrainingBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.order.len() {
            return None;
        }
        let end = (self.cursor + self.batch_size).min(self.order.len());
        let chunk = &self.order[self.cursor..end];
        self.cursor = end;

        let seeds: Vec<u64> = chunk.iter().map(|_| self.rng.gen()).collect();
        let batch = build_training_examples(&self.builder, chunk, &seeds).and_then(|examples| {
            if self.builder.has_path_evidence() {
                collate_with_paths(&examples)
            } else {
                collate(&examples)
            }
        });
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.order.len() - self.cursor).div_ceil(self.batch_size);
        (left, Some(left))
    }
}

#[cfg(feature = "parallel")]
fn build_training_examples(
    builder: &TrainingExampleBuilder,
    chunk: &[usize],
    seeds: &[u64],
) -> Result<Vec<TrainingExample>> {
    chunk
        .par_iter()
        .zip(seeds.par_iter())
        .map(|(&idx, &seed)| builder.build(idx, &mut XorShiftRng::seed_from_u64(seed)))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn build_training_examples(
    builder: &TrainingExampleBuilder,
    chunk: &[usize],
    seeds: &[u64],
) -> Result<Vec<TrainingExample>> {
    chunk
        .iter()
        .zip(seeds)
        .map(|(&idx, &seed)| builder.build(idx, &mut XorShiftRng::seed_from_u64(seed)))
        .collect()
}

/// Sequential evaluation batches.
#[derive(Debug, Clone)]
pub struct EvaluationLoader {
    builder: Arc<EvaluationExampleBuilder>,
    batch_size: usize,
}

impl EvaluationLoader {
    /// Batches of `config.batch_size` evaluation examples.
    pub fn new(builder: EvaluationExampleBuilder, config: &SamplerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            builder: Arc::new(builder),
            batch_size: config.batch_size,
        })
    }
}

impl BatchSource for EvaluationLoader {
    type Batch = Result<EvaluationBatch>;
    type Pass = EvaluationPass;

    fn pass(&mut self) -> EvaluationPass {
        EvaluationPass {
            builder: Arc::clone(&self.builder),
            cursor: 0,
            batch_size: self.batch_size,
        }
    }
}

/// One pass over the evaluation facts.
#[derive(Debug)]
pub struct EvaluationPass {
    builder: Arc<EvaluationExampleBuilder>,
    cursor: usize,
    batch_size: usize,
}

impl Iterator for EvaluationPass {
    type Item = Result<EvaluationBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        let total = self.builder.len();
        if self.cursor >= total {
            return None;
        }
        let range = self.cursor..(self.cursor + self.batch_size).min(total);
        self.cursor = range.end;

        #[cfg(feature = "parallel")]
        let examples = range
            .into_par_iter()
            .map(|idx| self.builder.build(idx))
            .collect::<Result<Vec<_>>>();
        #[cfg(not(feature = "parallel"))]
        let examples = range
            .map(|idx| self.builder.build(idx))
            .collect::<Result<Vec<_>>>();

        Some(examples.and_then(|examples| collate_evaluation(&examples)))
    }
}
