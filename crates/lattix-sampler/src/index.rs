//! Static lookup structures over the full fact collection.
//!
//! [`FactIndex`] is built once and never mutated afterwards, so it can be
//! shared across threads (`Arc<FactIndex>`) for concurrent read-only access.
//!
//! | Structure | Key | Value | Used by |
//! |-----------|-----|-------|---------|
//! | frequency | (entity, relation) | count, floored at `frequency_floor` | subsampling weight |
//! | true heads | (relation, tail) | sorted unique heads | head-batch negative filter |
//! | true tails | (head, relation) | sorted unique tails | tail-batch negative filter |
//! | head / tail pools | relation | sorted unique entities | pair sampling |
//!
//! # Subsampling weight
//!
//! Analogous to word2vec frequency subsampling, a fact `(h, r, t)` is weighted
//! by `sqrt(1 / (count(h, r) + count(t, -r-1)))`. Each fact increments the
//! count of its `(head, relation)` pair and of its `(tail, inverse relation)`
//! pair; the first occurrence of a pair seeds it at the floor instead.

use std::collections::HashMap;

use tracing::debug;

use crate::config::SamplerConfig;
use crate::error::{Error, Result};
use crate::fact::{inverse_relation, EntityId, Fact, FactSet, Mode, RelationId, Side};

/// Default starting count of every frequency key.
pub const DEFAULT_FREQUENCY_FLOOR: u32 = 4;

/// Composite `(entity, relation)` key.
///
/// Keys the frequency table and the true-tail sets (`entity` is the head).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityRelation {
    pub entity: EntityId,
    pub relation: RelationId,
}

impl EntityRelation {
    pub fn new(entity: EntityId, relation: RelationId) -> Self {
        Self { entity, relation }
    }
}

/// Composite `(relation, entity)` key for the true-head sets (`entity` is the tail).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationEntity {
    pub relation: RelationId,
    pub entity: EntityId,
}

impl RelationEntity {
    pub fn new(relation: RelationId, entity: EntityId) -> Self {
        Self { relation, entity }
    }
}

/// Lookup indexes over an ordered, fixed fact collection.
#[derive(Debug, Clone)]
pub struct FactIndex {
    facts: Vec<Fact>,
    fact_set: FactSet,
    nentity: usize,
    nrelation: usize,
    frequency_floor: u32,
    frequency: HashMap<EntityRelation, u32>,
    true_heads: HashMap<RelationEntity, Box<[EntityId]>>,
    true_tails: HashMap<EntityRelation, Box<[EntityId]>>,
    head_pools: HashMap<RelationId, Box<[EntityId]>>,
    tail_pools: HashMap<RelationId, Box<[EntityId]>>,
}

impl FactIndex {
    /// Build an index with the default frequency floor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for zero entity/relation counts and
    /// [`Error::InvalidFact`] for any id outside the declared ranges.
    pub fn new(facts: Vec<Fact>, nentity: usize, nrelation: usize) -> Result<Self> {
        Self::with_frequency_floor(facts, nentity, nrelation, DEFAULT_FREQUENCY_FLOOR)
    }

    /// Build an index whose frequency floor comes from `config`.
    pub fn from_config(
        facts: Vec<Fact>,
        nentity: usize,
        nrelation: usize,
        config: &SamplerConfig,
    ) -> Result<Self> {
        config.validate()?;
        Self::with_frequency_floor(facts, nentity, nrelation, config.frequency_floor)
    }

    /// Build an index with an explicit frequency floor.
    ///
    /// # Errors
    ///
    /// As [`FactIndex::new`], plus [`Error::InvalidConfig`] for a zero floor.
    pub fn with_frequency_floor(
        facts: Vec<Fact>,
        nentity: usize,
        nrelation: usize,
        floor: u32,
    ) -> Result<Self> {
        if floor == 0 {
            // sqrt(1 / 0) for a fact whose pairs occur once
            return Err(Error::InvalidConfig("frequency floor must be > 0".into()));
        }
        if nentity == 0 || nrelation == 0 {
            return Err(Error::InvalidConfig(format!(
                "need at least one entity and one relation (nentity={nentity}, nrelation={nrelation})"
            )));
        }
        for fact in &facts {
            validate_fact(fact, nentity, nrelation)?;
        }

        let frequency = count_frequency(&facts, floor);
        let (true_heads, true_tails) = true_head_and_tail(&facts);
        let (head_pools, tail_pools) = relation_pools(&facts);
        let fact_set: FactSet = facts.iter().collect();

        debug!(
            facts = facts.len(),
            unique_facts = fact_set.len(),
            nentity,
            nrelation,
            frequency_keys = frequency.len(),
            true_head_keys = true_heads.len(),
            true_tail_keys = true_tails.len(),
            relations_used = head_pools.len(),
            "built fact index"
        );

        Ok(Self {
            facts,
            fact_set,
            nentity,
            nrelation,
            frequency_floor: floor,
            frequency,
            true_heads,
            true_tails,
            head_pools,
            tail_pools,
        })
    }

    /// Number of facts (including duplicates) in construction order.
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn nentity(&self) -> usize {
        self.nentity
    }

    pub fn nrelation(&self) -> usize {
        self.nrelation
    }

    pub fn frequency_floor(&self) -> u32 {
        self.frequency_floor
    }

    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    pub fn fact(&self, idx: usize) -> Option<Fact> {
        self.facts.get(idx).copied()
    }

    pub fn fact_set(&self) -> &FactSet {
        &self.fact_set
    }

    pub fn contains(&self, fact: &Fact) -> bool {
        self.fact_set.contains(fact)
    }

    /// Frequency count of an `(entity, relation)` pair.
    pub fn frequency(&self, entity: EntityId, relation: RelationId) -> Result<u32> {
        self.frequency
            .get(&EntityRelation::new(entity, relation))
            .copied()
            .ok_or_else(|| {
                Error::MissingKey(format!("frequency of (entity {entity}, relation {relation})"))
            })
    }

    /// `sqrt(1 / (count(h, r) + count(t, -r-1)))`.
    pub fn subsampling_weight(&self, fact: &Fact) -> Result<f64> {
        let forward = self.frequency(fact.head, fact.relation)?;
        let backward = self.frequency(fact.tail, inverse_relation(fact.relation))?;
        Ok((1.0 / f64::from(forward + backward)).sqrt())
    }

    /// Heads completing a known fact `(?, relation, tail)`, sorted and unique.
    pub fn true_heads(&self, relation: RelationId, tail: EntityId) -> Result<&[EntityId]> {
        self.true_heads
            .get(&RelationEntity::new(relation, tail))
            .map(|heads| &heads[..])
            .ok_or_else(|| {
                Error::MissingKey(format!("true heads of (relation {relation}, tail {tail})"))
            })
    }

    /// Tails completing a known fact `(head, relation, ?)`, sorted and unique.
    pub fn true_tails(&self, head: EntityId, relation: RelationId) -> Result<&[EntityId]> {
        self.true_tails
            .get(&EntityRelation::new(head, relation))
            .map(|tails| &tails[..])
            .ok_or_else(|| {
                Error::MissingKey(format!("true tails of (head {head}, relation {relation})"))
            })
    }

    /// True-entity set filtering negatives of `fact` under `mode`.
    pub fn true_entities(&self, fact: &Fact, mode: Mode) -> Result<&[EntityId]> {
        match mode {
            Mode::HeadBatch => self.true_heads(fact.relation, fact.tail),
            Mode::TailBatch => self.true_tails(fact.head, fact.relation),
        }
    }

    /// Entities seen on `side` of `relation`, sorted and unique.
    ///
    /// A relation inside `[0, nrelation)` that no fact uses has an empty pool;
    /// callers that need a non-empty pool must check (see
    /// [`Error::EmptyPool`]). A relation outside the range is a missing key.
    pub fn entity_pool(&self, relation: RelationId, side: Side) -> Result<&[EntityId]> {
        if relation < 0 || relation as usize >= self.nrelation {
            return Err(Error::MissingKey(format!("{side} pool of relation {relation}")));
        }
        let pools = match side {
            Side::Head => &self.head_pools,
            Side::Tail => &self.tail_pools,
        };
        Ok(pools.get(&relation).map_or(&[][..], |pool| &pool[..]))
    }
}

fn validate_fact(fact: &Fact, nentity: usize, nrelation: usize) -> Result<()> {
    let entity_ok = |e: EntityId| e >= 0 && (e as usize) < nentity;
    if !entity_ok(fact.head) || !entity_ok(fact.tail) {
        return Err(Error::InvalidFact(format!(
            "{fact:?} has an entity outside [0, {nentity})"
        )));
    }
    if fact.relation < 0 || fact.relation as usize >= nrelation {
        return Err(Error::InvalidFact(format!(
            "{fact:?} has a relation outside [0, {nrelation})"
        )));
    }
    Ok(())
}

fn count_frequency(facts: &[Fact], floor: u32) -> HashMap<EntityRelation, u32> {
    let mut count = HashMap::new();
    for fact in facts {
        for key in [
            EntityRelation::new(fact.head, fact.relation),
            EntityRelation::new(fact.tail, inverse_relation(fact.relation)),
        ] {
            count.entry(key).and_modify(|c| *c += 1).or_insert(floor);
        }
    }
    count
}

type TrueSets = (
    HashMap<RelationEntity, Box<[EntityId]>>,
    HashMap<EntityRelation, Box<[EntityId]>>,
);

fn true_head_and_tail(facts: &[Fact]) -> TrueSets {
    let mut heads: HashMap<RelationEntity, Vec<EntityId>> = HashMap::new();
    let mut tails: HashMap<EntityRelation, Vec<EntityId>> = HashMap::new();

    for fact in facts {
        tails
            .entry(EntityRelation::new(fact.head, fact.relation))
            .or_default()
            .push(fact.tail);
        heads
            .entry(RelationEntity::new(fact.relation, fact.tail))
            .or_default()
            .push(fact.head);
    }

    (freeze(heads), freeze(tails))
}

fn relation_pools(
    facts: &[Fact],
) -> (HashMap<RelationId, Box<[EntityId]>>, HashMap<RelationId, Box<[EntityId]>>) {
    let mut heads: HashMap<RelationId, Vec<EntityId>> = HashMap::new();
    let mut tails: HashMap<RelationId, Vec<EntityId>> = HashMap::new();

    for fact in facts {
        heads.entry(fact.relation).or_default().push(fact.head);
        tails.entry(fact.relation).or_default().push(fact.tail);
    }

    (freeze(heads), freeze(tails))
}

/// Sort, dedup and box each value list so membership is a binary search.
fn freeze<K: std::hash::Hash + Eq>(
    map: HashMap<K, Vec<EntityId>>,
) -> HashMap<K, Box<[EntityId]>> {
    map.into_iter()
        .map(|(key, mut entities)| {
            entities.sort_unstable();
            entities.dedup();
            (key, entities.into_boxed_slice())
        })
        .collect()
}
