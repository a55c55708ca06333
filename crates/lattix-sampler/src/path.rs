//! Multi-hop relation-path evidence (weak supervision).
//!
//! A path-mining stage proposes, for every training fact, candidate relation
//! paths that may explain its relation, each with an occurrence probability.
//! A side table scores how well a path corroborates a target relation.
//!
//! # Reliability
//!
//! ```text
//! reliability = probability * (0.99 * confidence + 0.01)
//! ```
//!
//! The `0.01` floor keeps uncorroborated paths (confidence 0) from scoring
//! exactly zero.
//!
//! # Per-example output
//!
//! | Output | Shape | Padding |
//! |--------|-------|---------|
//! | ranked paths | `max_n_cand × max_steps` | [`PAD_RELATION`] |
//! | reliabilities | `max_n_cand` | `0.0` |
//!
//! Every relation in a kept path, plus the fact's own relation, is a *weak
//! positive*; the negative relation is drawn from outside that set.

use std::collections::{HashMap, HashSet};
use std::io::Read;

use ndarray::{Array1, Array2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fact::RelationId;

/// Padding value for unused path slots.
pub const PAD_RELATION: RelationId = -1;

/// Relation ids drawn per negative-relation round.
const NEGATIVE_RELATION_DRAWS: usize = 4;

/// A candidate relation path with its occurrence probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathCandidate {
    pub relations: Vec<RelationId>,
    pub probability: f64,
}

impl PathCandidate {
    pub fn new(relations: Vec<RelationId>, probability: f64) -> Self {
        Self {
            relations,
            probability,
        }
    }
}

/// Confidence table key: space-joined path plus target relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathKey {
    pub path: String,
    pub relation: RelationId,
}

impl PathKey {
    pub fn new(path: &[RelationId], relation: RelationId) -> Self {
        Self {
            path: path_string(path),
            relation,
        }
    }
}

/// `[3, -2, 7]` -> `"3 -2 7"`.
pub fn path_string(path: &[RelationId]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `reliability = probability * (0.99 * confidence + 0.01)`.
#[inline]
pub fn reliability(probability: f64, confidence: f64) -> f64 {
    probability * (0.99 * confidence + 0.01)
}

/// Ranked, fixed-shape path evidence for one training example.
#[derive(Debug, Clone, PartialEq)]
pub struct PathEvidence {
    /// `max_n_cand × max_steps` relation ids, padded with [`PAD_RELATION`].
    pub paths: Array2<RelationId>,
    /// Reliability per row, `0.0` for padding rows.
    pub reliabilities: Array1<f64>,
    /// Relations of the kept paths plus the target relation.
    pub weak_positive: HashSet<RelationId>,
}

/// Confidence entry in the serialized bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathConfidenceEntry {
    pub path: Vec<RelationId>,
    pub relation: RelationId,
    pub confidence: f64,
}

/// Serialized output of the path-mining stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathEvidenceBundle {
    /// Candidates per training example, aligned with the fact order.
    pub path_probs: Vec<Vec<PathCandidate>>,
    #[serde(default)]
    pub path_confidence: Vec<PathConfidenceEntry>,
    pub max_n_cand: usize,
    pub max_steps: usize,
}

/// Per-example path candidates plus the confidence side table.
#[derive(Debug, Clone)]
pub struct PathEvidenceIndex {
    candidates: Vec<Vec<PathCandidate>>,
    confidence: HashMap<PathKey, f64>,
    max_n_cand: usize,
    max_steps: usize,
}

impl PathEvidenceIndex {
    pub fn new(
        candidates: Vec<Vec<PathCandidate>>,
        confidence: HashMap<PathKey, f64>,
        max_n_cand: usize,
        max_steps: usize,
    ) -> Self {
        Self {
            candidates,
            confidence,
            max_n_cand,
            max_steps,
        }
    }

    pub fn from_bundle(bundle: PathEvidenceBundle) -> Self {
        let confidence = bundle
            .path_confidence
            .into_iter()
            .map(|e| (PathKey::new(&e.path, e.relation), e.confidence))
            .collect();
        Self::new(
            bundle.path_probs,
            confidence,
            bundle.max_n_cand,
            bundle.max_steps,
        )
    }

    /// Load a JSON [`PathEvidenceBundle`].
    pub fn from_json_reader(reader: impl Read) -> Result<Self> {
        let bundle: PathEvidenceBundle = serde_json::from_reader(reader)?;
        Ok(Self::from_bundle(bundle))
    }

    /// Number of examples with a (possibly empty) candidate list.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn max_n_cand(&self) -> usize {
        self.max_n_cand
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn candidates(&self, example: usize) -> Option<&[PathCandidate]> {
        self.candidates.get(example).map(Vec::as_slice)
    }

    /// Corroboration confidence of `path` for `relation` (0.0 when absent).
    pub fn confidence(&self, path: &[RelationId], relation: RelationId) -> f64 {
        self.confidence
            .get(&PathKey::new(path, relation))
            .copied()
            .unwrap_or(0.0)
    }

    /// Rank the example's candidates and pad them to the fixed shape.
    ///
    /// Sorting is stable and descending by reliability, so equal scores keep
    /// their input order.
    pub fn evidence(&self, example: usize, relation: RelationId) -> Result<PathEvidence> {
        let candidates = self.candidates(example).ok_or_else(|| {
            Error::MissingKey(format!("path candidates of example {example}"))
        })?;

        let mut weak_positive = HashSet::from([relation]);

        if candidates.is_empty() {
            return Ok(PathEvidence {
                paths: Array2::from_elem((self.max_n_cand, self.max_steps), PAD_RELATION),
                reliabilities: Array1::zeros(self.max_n_cand),
                weak_positive,
            });
        }

        let mut scored: Vec<(&PathCandidate, f64)> = candidates
            .iter()
            .map(|c| {
                let score = reliability(c.probability, self.confidence(&c.relations, relation));
                (c, score)
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(self.max_n_cand);

        let mut paths = Array2::from_elem((self.max_n_cand, self.max_steps), PAD_RELATION);
        let mut reliabilities = Array1::zeros(self.max_n_cand);

        for (row, (candidate, score)) in scored.into_iter().enumerate() {
            weak_positive.extend(candidate.relations.iter().copied());
            reliabilities[row] = score;
            for (step, &r) in candidate.relations.iter().take(self.max_steps).enumerate() {
                paths[[row, step]] = r;
            }
        }

        Ok(PathEvidence {
            paths,
            reliabilities,
            weak_positive,
        })
    }
}

/// Draw one relation id from `[0, nrelation)` outside `weak_positive`.
///
/// Each round draws four ids and keeps the first survivor; a round with no
/// survivor is redrawn. Like entity rejection sampling this retries forever
/// unless `max_rounds` is set.
pub fn sample_negative_relation(
    rng: &mut impl Rng,
    nrelation: usize,
    weak_positive: &HashSet<RelationId>,
    max_rounds: Option<usize>,
) -> Result<RelationId> {
    let upper = nrelation as RelationId;
    let mut rounds = 0usize;
    loop {
        if max_rounds.is_some_and(|cap| rounds >= cap) {
            return Err(Error::SamplingExhausted {
                what: "negative relation",
                rounds,
            });
        }
        rounds += 1;

        let draws: [RelationId; NEGATIVE_RELATION_DRAWS] =
            std::array::from_fn(|_| rng.gen_range(0..upper));
        if let Some(&r) = draws.iter().find(|&&r| !weak_positive.contains(&r)) {
            return Ok(r);
        }
    }
}
