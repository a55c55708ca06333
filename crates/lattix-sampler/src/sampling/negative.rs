use rand::Rng;

use super::rejection_sample;
use crate::error::Result;
use crate::fact::{EntityId, Fact, Mode};
use crate::index::FactIndex;

/// Filtered negative sampler.
///
/// A negative for `(h, r, t)` in head-batch mode is an entity `e` such that
/// `(e, r, t)` is not a known fact; tail-batch mode checks `(h, r, e)`.
#[derive(Debug, Clone, Copy)]
pub struct NegativeSampler<'a> {
    index: &'a FactIndex,
    max_rounds: Option<usize>,
}

impl<'a> NegativeSampler<'a> {
    pub fn new(index: &'a FactIndex) -> Self {
        Self {
            index,
            max_rounds: None,
        }
    }

    /// Cap the rejection loop (None = retry until `k` negatives are found).
    pub fn with_max_rounds(mut self, max_rounds: Option<usize>) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Draw exactly `k` negatives for `fact`, uniform over `[0, nentity)`.
    ///
    /// # Errors
    ///
    /// [`Error::MissingKey`](crate::Error::MissingKey) if the fact's
    /// true-entity key is not indexed, or
    /// [`Error::SamplingExhausted`](crate::Error::SamplingExhausted) when a cap
    /// is set and reached.
    pub fn sample(
        &self,
        rng: &mut impl Rng,
        fact: &Fact,
        mode: Mode,
        k: usize,
    ) -> Result<Vec<EntityId>> {
        let true_entities = self.index.true_entities(fact, mode)?;
        rejection_sample(
            rng,
            self.index.nentity(),
            k,
            self.max_rounds,
            "negative entity",
            |e| true_entities.binary_search(&e).is_ok(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    fn star_index() -> FactIndex {
        // entity 0 relates to 1..=4 through relation 0
        let facts = (1..=4).map(|t| Fact::new(0, 0, t)).collect();
        FactIndex::new(facts, 10, 1).unwrap()
    }

    #[test]
    fn test_tail_negatives_avoid_true_tails() {
        let index = star_index();
        let sampler = NegativeSampler::new(&index);
        let mut rng = XorShiftRng::seed_from_u64(42);

        let negatives = sampler
            .sample(&mut rng, &Fact::new(0, 0, 1), Mode::TailBatch, 50)
            .unwrap();

        assert_eq!(negatives.len(), 50);
        for e in negatives {
            assert!((0..10).contains(&e));
            assert!(!index.contains(&Fact::new(0, 0, e)), "{e} completes a true fact");
        }
    }

    #[test]
    fn test_head_negatives_avoid_true_heads() {
        let index = star_index();
        let sampler = NegativeSampler::new(&index);
        let mut rng = XorShiftRng::seed_from_u64(7);

        let negatives = sampler
            .sample(&mut rng, &Fact::new(0, 0, 3), Mode::HeadBatch, 20)
            .unwrap();

        assert_eq!(negatives.len(), 20);
        assert!(negatives.iter().all(|&e| e != 0));
    }

    #[test]
    fn test_missing_true_set_key() {
        let index = star_index();
        let sampler = NegativeSampler::new(&index);
        let mut rng = XorShiftRng::seed_from_u64(7);

        let err = sampler
            .sample(&mut rng, &Fact::new(5, 0, 6), Mode::TailBatch, 4)
            .unwrap_err();
        assert!(matches!(err, Error::MissingKey(_)));
    }

    #[test]
    fn test_saturated_true_set_hits_cap() {
        // every entity is a true tail of (0, 0)
        let facts = (0..3).map(|t| Fact::new(0, 0, t)).collect();
        let index = FactIndex::new(facts, 3, 1).unwrap();
        let sampler = NegativeSampler::new(&index).with_max_rounds(Some(10));
        let mut rng = XorShiftRng::seed_from_u64(1);

        let err = sampler
            .sample(&mut rng, &Fact::new(0, 0, 0), Mode::TailBatch, 2)
            .unwrap_err();
        assert!(matches!(err, Error::SamplingExhausted { rounds: 10, .. }));
    }

    #[test]
    fn test_same_seed_same_negatives() {
        let index = star_index();
        let sampler = NegativeSampler::new(&index);
        let fact = Fact::new(0, 0, 2);

        let a = sampler
            .sample(&mut XorShiftRng::seed_from_u64(9), &fact, Mode::TailBatch, 16)
            .unwrap();
        let b = sampler
            .sample(&mut XorShiftRng::seed_from_u64(9), &fact, Mode::TailBatch, 16)
            .unwrap();
        assert_eq!(a, b);
    }
}
