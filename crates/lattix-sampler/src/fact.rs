//! Integer-id facts, batch modes, and the fact membership set.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Entity id. Signed so that padded slots can hold `-1`.
pub type EntityId = i64;

/// Relation id. Inverse relations are encoded as `-r - 1`.
pub type RelationId = i64;

/// Inverse of a relation: `r -> -r - 1`.
///
/// The mapping is an involution, so `inverse_relation(inverse_relation(r)) == r`.
#[inline]
pub fn inverse_relation(relation: RelationId) -> RelationId {
    -relation - 1
}

/// A (head, relation, tail) fact over integer ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fact {
    pub head: EntityId,
    pub relation: RelationId,
    pub tail: EntityId,
}

impl Fact {
    pub fn new(head: EntityId, relation: RelationId, tail: EntityId) -> Self {
        Self { head, relation, tail }
    }

    /// The fact as a `[head, relation, tail]` row.
    pub fn to_array(self) -> [i64; 3] {
        [self.head, self.relation, self.tail]
    }

    /// Replace the slot perturbed by `mode` with `entity`.
    pub fn corrupt(self, mode: Mode, entity: EntityId) -> Self {
        match mode {
            Mode::HeadBatch => Self { head: entity, ..self },
            Mode::TailBatch => Self { tail: entity, ..self },
        }
    }

    /// The entity in the slot perturbed by `mode`.
    pub fn entity_at(self, mode: Mode) -> EntityId {
        match mode {
            Mode::HeadBatch => self.head,
            Mode::TailBatch => self.tail,
        }
    }
}

impl From<(EntityId, RelationId, EntityId)> for Fact {
    fn from((head, relation, tail): (EntityId, RelationId, EntityId)) -> Self {
        Self { head, relation, tail }
    }
}

/// Which slot of a fact is perturbed when generating negatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "head-batch")]
    HeadBatch,
    #[serde(rename = "tail-batch")]
    TailBatch,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::HeadBatch => "head-batch",
            Mode::TailBatch => "tail-batch",
        }
    }

    /// The entity side this mode perturbs.
    pub fn side(self) -> Side {
        match self {
            Mode::HeadBatch => Side::Head,
            Mode::TailBatch => Side::Tail,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "head-batch" => Ok(Mode::HeadBatch),
            "tail-batch" => Ok(Mode::TailBatch),
            other => Err(Error::InvalidMode(other.to_string())),
        }
    }
}

/// Head or tail position of an entity within a fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Head,
    Tail,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Head => f.write_str("head"),
            Side::Tail => f.write_str("tail"),
        }
    }
}

/// Membership-only set of known-true facts.
#[derive(Debug, Clone, Default)]
pub struct FactSet {
    facts: HashSet<Fact>,
}

impl FactSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn contains(&self, fact: &Fact) -> bool {
        self.facts.contains(fact)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

impl FromIterator<Fact> for FactSet {
    fn from_iter<I: IntoIterator<Item = Fact>>(iter: I) -> Self {
        Self {
            facts: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<&'a Fact> for FactSet {
    fn from_iter<I: IntoIterator<Item = &'a Fact>>(iter: I) -> Self {
        iter.into_iter().copied().collect()
    }
}
