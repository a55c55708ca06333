//! Per-fact training and evaluation examples.
//!
//! [`TrainingExampleBuilder`] composes the index lookups and samplers into a
//! single [`TrainingExample`]; [`EvaluationExampleBuilder`] enumerates every
//! entity as a candidate for filtered ranking.

use std::sync::Arc;

use ndarray::{Array1, Array2};
use rand::Rng;

use crate::config::SamplerConfig;
use crate::error::{Error, Result};
use crate::fact::{EntityId, Fact, FactSet, Mode, RelationId};
use crate::index::FactIndex;
use crate::path::{sample_negative_relation, PathEvidenceIndex};
use crate::sampling::{NegativeSampler, PairSampler};

/// Path-derived part of a training example.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSample {
    /// Relation outside the weak-positive set.
    pub negative_relation: RelationId,
    /// `max_n_cand × max_steps`, padded with `-1`.
    pub paths: Array2<RelationId>,
    /// `max_n_cand` reliabilities, `0.0` for padding rows.
    pub reliabilities: Array1<f64>,
}

/// One positive fact with its sampled negatives.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub positive: Fact,
    /// Exactly `negative_sample_size` entities.
    pub negatives: Vec<EntityId>,
    pub subsampling_weight: f64,
    pub mode: Mode,
    /// Exactly `pair_sample_size` entities from the relation's pool.
    pub positive_pairs: Vec<EntityId>,
    /// Exactly `pair_sample_size` entities outside the relation's pool.
    pub negative_pairs: Vec<EntityId>,
    /// Present iff the builder carries path evidence.
    pub path: Option<PathSample>,
}

/// Builds training examples for one mode over the indexed facts.
///
/// Holds only shared read-only state, so one builder (or many clones) can be
/// used from several threads at once.
#[derive(Debug, Clone)]
pub struct TrainingExampleBuilder {
    index: Arc<FactIndex>,
    paths: Option<Arc<PathEvidenceIndex>>,
    mode: Mode,
    negative_sample_size: usize,
    pair_sample_size: usize,
    max_rounds: Option<usize>,
}

impl TrainingExampleBuilder {
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] if `config` does not validate, or if the index
    /// was built with a different frequency floor than `config` asks for
    /// (see [`FactIndex::from_config`]).
    pub fn new(index: Arc<FactIndex>, mode: Mode, config: &SamplerConfig) -> Result<Self> {
        config.validate()?;
        if index.frequency_floor() != config.frequency_floor {
            return Err(Error::InvalidConfig(format!(
                "index frequency floor {} does not match configured {}",
                index.frequency_floor(),
                config.frequency_floor
            )));
        }
        Ok(Self {
            index,
            paths: None,
            mode,
            negative_sample_size: config.negative_sample_size,
            pair_sample_size: config.pair_sample_size,
            max_rounds: config.max_rejection_rounds,
        })
    }

    /// Attach path evidence aligned with the index's fact order.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] if the evidence does not cover every fact.
    pub fn with_path_evidence(mut self, paths: Arc<PathEvidenceIndex>) -> Result<Self> {
        if paths.len() != self.index.len() {
            return Err(Error::InvalidConfig(format!(
                "path evidence covers {} examples but the index holds {} facts",
                paths.len(),
                self.index.len()
            )));
        }
        self.paths = Some(paths);
        Ok(self)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn index(&self) -> &FactIndex {
        &self.index
    }

    pub fn has_path_evidence(&self) -> bool {
        self.paths.is_some()
    }

    /// Number of buildable examples (one per indexed fact).
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Build the example for the `idx`-th indexed fact.
    pub fn build(&self, idx: usize, rng: &mut impl Rng) -> Result<TrainingExample> {
        let positive = self
            .index
            .fact(idx)
            .ok_or_else(|| Error::MissingKey(format!("training example {idx}")))?;
        let index = &*self.index;
        let mode = self.mode;

        let subsampling_weight = index.subsampling_weight(&positive)?;

        let negatives = NegativeSampler::new(index)
            .with_max_rounds(self.max_rounds)
            .sample(rng, &positive, mode, self.negative_sample_size)?;

        let path = match &self.paths {
            Some(paths) => {
                let evidence = paths.evidence(idx, positive.relation)?;
                let negative_relation = sample_negative_relation(
                    rng,
                    index.nrelation(),
                    &evidence.weak_positive,
                    self.max_rounds,
                )?;
                Some(PathSample {
                    negative_relation,
                    paths: evidence.paths,
                    reliabilities: evidence.reliabilities,
                })
            }
            None => None,
        };

        let pairs = PairSampler::new(index).with_max_rounds(self.max_rounds);
        let negative_pairs =
            pairs.sample_negative_pairs(rng, positive.relation, mode, self.pair_sample_size)?;
        let positive_pairs =
            pairs.sample_positive_pairs(rng, positive.relation, mode, self.pair_sample_size)?;

        Ok(TrainingExample {
            positive,
            negatives,
            subsampling_weight,
            mode,
            positive_pairs,
            negative_pairs,
            path,
        })
    }
}

/// Filter bias of a rankable candidate.
pub const RANKABLE: f32 = 0.0;
/// Filter bias of a candidate that reproduces another known fact.
pub const FILTERED: f32 = -1.0;

/// All-entity candidate list for one evaluation fact.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationExample {
    pub positive: Fact,
    /// `nentity` candidates; filtered slots hold the true entity.
    pub candidates: Vec<EntityId>,
    /// `nentity` biases, [`RANKABLE`] or [`FILTERED`].
    pub filter_bias: Vec<f32>,
    pub mode: Mode,
}

/// Builds filtered-ranking examples over a list of evaluation facts.
#[derive(Debug, Clone)]
pub struct EvaluationExampleBuilder {
    facts: Vec<Fact>,
    known: Arc<FactSet>,
    nentity: usize,
    mode: Mode,
}

impl EvaluationExampleBuilder {
    /// `known` should hold every true fact (train, valid and test).
    pub fn new(facts: Vec<Fact>, known: Arc<FactSet>, nentity: usize, mode: Mode) -> Self {
        Self {
            facts,
            known,
            nentity,
            mode,
        }
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn nentity(&self) -> usize {
        self.nentity
    }

    pub fn build(&self, idx: usize) -> Result<EvaluationExample> {
        let positive = *self
            .facts
            .get(idx)
            .ok_or_else(|| Error::MissingKey(format!("evaluation example {idx}")))?;
        self.build_fact(positive)
    }

    /// Enumerate every entity as a substitute for the mode's slot.
    ///
    /// A candidate that reproduces a known fact is filtered (bias -1, slot
    /// holds the true entity). The true entity's own slot is always reset to
    /// (0, true entity): the positive itself is known but must stay rankable.
    pub fn build_fact(&self, positive: Fact) -> Result<EvaluationExample> {
        let truth = positive.entity_at(self.mode);
        if truth < 0 || truth as usize >= self.nentity {
            return Err(Error::InvalidFact(format!(
                "{positive:?} answer {truth} outside [0, {})",
                self.nentity
            )));
        }

        let upper = self.nentity as EntityId;
        let (mut filter_bias, mut candidates): (Vec<f32>, Vec<EntityId>) = (0..upper)
            .map(|candidate| {
                if self.known.contains(&positive.corrupt(self.mode, candidate)) {
                    (FILTERED, truth)
                } else {
                    (RANKABLE, candidate)
                }
            })
            .unzip();

        filter_bias[truth as usize] = RANKABLE;
        candidates[truth as usize] = truth;

        Ok(EvaluationExample {
            positive,
            candidates,
            filter_bias,
            mode: self.mode,
        })
    }
}
