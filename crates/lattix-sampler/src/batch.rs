//! Stacking per-example outputs into batched arrays.
//!
//! | Field | Shape | Type |
//! |-------|-------|------|
//! | `positive` | N × 3 | `i64` |
//! | `negatives` | N × negative_sample_size | `i64` |
//! | `subsampling_weight` | N | `f64` |
//! | `positive_pairs` / `negative_pairs` | N × pair_sample_size | `i64` |
//! | `negative_relation` | N × 1 | `i64` |
//! | `paths` | N × max_n_cand × max_steps | `i64` |
//! | `reliabilities` | N × max_n_cand | `f64` |
//!
//! The mode of a batch is taken from its first example; callers keep batches
//! single-mode and that is not re-validated here.

use ndarray::{Array1, Array2, Array3};

use crate::error::{Error, Result};
use crate::example::{EvaluationExample, TrainingExample};
use crate::fact::{EntityId, Mode, RelationId};

/// Path-evidence part of a [`TrainingBatch`].
#[derive(Debug, Clone, PartialEq)]
pub struct PathBatch {
    pub negative_relation: Array2<RelationId>,
    pub paths: Array3<RelationId>,
    pub reliabilities: Array2<f64>,
}

/// A collated batch of training examples.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingBatch {
    pub positive: Array2<i64>,
    pub negatives: Array2<EntityId>,
    pub subsampling_weight: Array1<f64>,
    pub mode: Mode,
    pub positive_pairs: Array2<EntityId>,
    pub negative_pairs: Array2<EntityId>,
    /// Set only by [`collate_with_paths`].
    pub paths: Option<PathBatch>,
}

impl TrainingBatch {
    pub fn len(&self) -> usize {
        self.positive.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.positive.nrows() == 0
    }
}

/// A collated batch of evaluation examples.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationBatch {
    pub positive: Array2<i64>,
    pub candidates: Array2<EntityId>,
    pub filter_bias: Array2<f32>,
    pub mode: Mode,
}

/// Stack training examples, ignoring any path evidence they carry.
pub fn collate(examples: &[TrainingExample]) -> Result<TrainingBatch> {
    let first = examples.first().ok_or(Error::EmptyBatch)?;
    let n = examples.len();

    let positive = stack_rows(examples.iter().map(|e| e.positive.to_array().to_vec()), n, 3)?;
    let negatives = stack_rows(
        examples.iter().map(|e| e.negatives.clone()),
        n,
        first.negatives.len(),
    )?;
    let subsampling_weight: Array1<f64> = examples.iter().map(|e| e.subsampling_weight).collect();
    let positive_pairs = stack_rows(
        examples.iter().map(|e| e.positive_pairs.clone()),
        n,
        first.positive_pairs.len(),
    )?;
    let negative_pairs = stack_rows(
        examples.iter().map(|e| e.negative_pairs.clone()),
        n,
        first.negative_pairs.len(),
    )?;

    Ok(TrainingBatch {
        positive,
        negatives,
        subsampling_weight,
        mode: first.mode,
        positive_pairs,
        negative_pairs,
        paths: None,
    })
}

/// Stack training examples together with their path evidence.
///
/// # Errors
///
/// [`Error::MissingPathEvidence`] names the first example without it.
pub fn collate_with_paths(examples: &[TrainingExample]) -> Result<TrainingBatch> {
    let mut batch = collate(examples)?;

    let samples = examples
        .iter()
        .enumerate()
        .map(|(i, e)| e.path.as_ref().ok_or(Error::MissingPathEvidence(i)))
        .collect::<Result<Vec<_>>>()?;

    let n = samples.len();
    let (n_cand, steps) = samples[0].paths.dim();

    let negative_relation = stack_rows(samples.iter().map(|s| vec![s.negative_relation]), n, 1)?;
    let paths = Array3::from_shape_vec(
        (n, n_cand, steps),
        samples.iter().flat_map(|s| s.paths.iter().copied()).collect(),
    )?;
    let reliabilities = stack_rows(
        samples.iter().map(|s| s.reliabilities.to_vec()),
        n,
        n_cand,
    )?;

    batch.paths = Some(PathBatch {
        negative_relation,
        paths,
        reliabilities,
    });
    Ok(batch)
}

/// Stack evaluation examples.
pub fn collate_evaluation(examples: &[EvaluationExample]) -> Result<EvaluationBatch> {
    let first = examples.first().ok_or(Error::EmptyBatch)?;
    let n = examples.len();
    let width = first.candidates.len();

    Ok(EvaluationBatch {
        positive: stack_rows(examples.iter().map(|e| e.positive.to_array().to_vec()), n, 3)?,
        candidates: stack_rows(examples.iter().map(|e| e.candidates.clone()), n, width)?,
        filter_bias: stack_rows(examples.iter().map(|e| e.filter_bias.clone()), n, width)?,
        mode: first.mode,
    })
}

/// Row-major stack; a row of the wrong width surfaces as a shape error.
fn stack_rows<T>(rows: impl Iterator<Item = Vec<T>>, n: usize, width: usize) -> Result<Array2<T>> {
    let flat: Vec<T> = rows.flatten().collect();
    Ok(Array2::from_shape_vec((n, width), flat)?)
}
