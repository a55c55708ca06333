use rand::seq::SliceRandom;
use rand::Rng;

use super::rejection_sample;
use crate::error::{Error, Result};
use crate::fact::{EntityId, Mode, RelationId};
use crate::index::FactIndex;

/// Entity pair sampler over per-relation entity pools.
///
/// "Positive" entities were seen on the mode's side of the relation;
/// "negative" entities never were. Unlike [`NegativeSampler`](super::NegativeSampler),
/// the negative filter is relation-wide, not fact-specific.
#[derive(Debug, Clone, Copy)]
pub struct PairSampler<'a> {
    index: &'a FactIndex,
    max_rounds: Option<usize>,
}

impl<'a> PairSampler<'a> {
    pub fn new(index: &'a FactIndex) -> Self {
        Self {
            index,
            max_rounds: None,
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: Option<usize>) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Draw exactly `k` entities outside the relation's pool on the mode's side.
    pub fn sample_negative_pairs(
        &self,
        rng: &mut impl Rng,
        relation: RelationId,
        mode: Mode,
        k: usize,
    ) -> Result<Vec<EntityId>> {
        let pool = self.index.entity_pool(relation, mode.side())?;
        rejection_sample(
            rng,
            self.index.nentity(),
            k,
            self.max_rounds,
            "negative pair",
            |e| pool.binary_search(&e).is_ok(),
        )
    }

    /// Draw exactly `k` entities with replacement from the relation's pool.
    ///
    /// A pool smaller than `k` is tiled `k` times before drawing, so small
    /// pools are reused rather than treated as an error.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyPool`] when the relation has no entity on that side and
    /// `k > 0`.
    pub fn sample_positive_pairs(
        &self,
        rng: &mut impl Rng,
        relation: RelationId,
        mode: Mode,
        k: usize,
    ) -> Result<Vec<EntityId>> {
        let side = mode.side();
        let pool = self.index.entity_pool(relation, side)?;
        if k == 0 {
            return Ok(Vec::new());
        }
        if pool.is_empty() {
            return Err(Error::EmptyPool { relation, side });
        }

        let tiled;
        let candidates = if pool.len() < k {
            tiled = pool.repeat(k);
            &tiled[..]
        } else {
            pool
        };

        Ok((0..k)
            .filter_map(|_| candidates.choose(rng).copied())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fact::{Fact, Side};
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    fn index() -> FactIndex {
        let facts = vec![
            Fact::new(5, 0, 1),
            Fact::new(2, 1, 3),
            Fact::new(4, 1, 3),
            Fact::new(6, 1, 7),
        ];
        FactIndex::new(facts, 10, 3).unwrap()
    }

    #[test]
    fn test_single_entity_pool_tiles() {
        let index = index();
        let sampler = PairSampler::new(&index);
        let mut rng = XorShiftRng::seed_from_u64(42);

        let pairs = sampler
            .sample_positive_pairs(&mut rng, 0, Mode::HeadBatch, 3)
            .unwrap();
        assert_eq!(pairs, vec![5, 5, 5]);
    }

    #[test]
    fn test_positive_pairs_come_from_pool() {
        let index = index();
        let sampler = PairSampler::new(&index);
        let mut rng = XorShiftRng::seed_from_u64(3);

        let pool = index.entity_pool(1, Side::Head).unwrap();
        let pairs = sampler
            .sample_positive_pairs(&mut rng, 1, Mode::HeadBatch, 2)
            .unwrap();
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|e| pool.contains(e)));

        let pairs = sampler
            .sample_positive_pairs(&mut rng, 1, Mode::TailBatch, 11)
            .unwrap();
        assert_eq!(pairs.len(), 11);
        assert!(pairs.iter().all(|&e| e == 3 || e == 7));
    }

    #[test]
    fn test_negative_pairs_avoid_pool() {
        let index = index();
        let sampler = PairSampler::new(&index);
        let mut rng = XorShiftRng::seed_from_u64(11);

        let pairs = sampler
            .sample_negative_pairs(&mut rng, 1, Mode::HeadBatch, 25)
            .unwrap();
        assert_eq!(pairs.len(), 25);
        assert!(pairs.iter().all(|e| ![2, 4, 6].contains(e)));
    }

    #[test]
    fn test_unused_relation_fails_fast() {
        let index = index();
        let sampler = PairSampler::new(&index);
        let mut rng = XorShiftRng::seed_from_u64(11);

        let err = sampler
            .sample_positive_pairs(&mut rng, 2, Mode::TailBatch, 4)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::EmptyPool { relation: 2, side: Side::Tail }
        ));

        // nothing to exclude: any entity is a negative pair
        let pairs = sampler
            .sample_negative_pairs(&mut rng, 2, Mode::TailBatch, 4)
            .unwrap();
        assert_eq!(pairs.len(), 4);
    }

    #[test]
    fn test_zero_pairs() {
        let index = index();
        let sampler = PairSampler::new(&index);
        let mut rng = XorShiftRng::seed_from_u64(11);
        assert!(sampler
            .sample_positive_pairs(&mut rng, 2, Mode::HeadBatch, 0)
            .unwrap()
            .is_empty());
    }
}
