//! Entity sampling against the [`FactIndex`](crate::FactIndex).
//!
//! # Key Types
//!
//! - [`NegativeSampler`] - corrupt one slot of a fact without hitting a known fact
//! - [`PairSampler`] - draw entities inside / outside a relation's entity pool
//!
//! Both negative draws use the same over-sample-then-filter loop: draw `2k`
//! uniform ids, drop the rejected ones, repeat until `k` survive, truncate.
//!
//! # Liveness
//!
//! The loop has no built-in bound. If the rejected set covers (almost) the
//! whole entity range it spins forever. Realistic graphs keep true-sets sparse
//! relative to `nentity`, so this does not happen in practice. Callers that
//! cannot tolerate the latency set
//! [`SamplerConfig::max_rejection_rounds`](crate::SamplerConfig::max_rejection_rounds),
//! which turns a non-converging loop into [`Error::SamplingExhausted`].

mod negative;
mod pair;

pub use negative::NegativeSampler;
pub use pair::PairSampler;

use rand::Rng;
use tracing::{trace, warn};

use crate::error::{Error, Result};
use crate::fact::EntityId;

/// Round count after which an uncapped loop logs a warning (once).
const SLOW_ROUNDS: usize = 10_000;

/// Draw `k` ids from `[0, upper)` that `reject` lets through.
pub(crate) fn rejection_sample(
    rng: &mut impl Rng,
    upper: usize,
    k: usize,
    max_rounds: Option<usize>,
    what: &'static str,
    reject: impl Fn(EntityId) -> bool,
) -> Result<Vec<EntityId>> {
    let upper = upper as EntityId;
    let mut kept = Vec::with_capacity(2 * k);
    let mut rounds = 0usize;

    while kept.len() < k {
        if max_rounds.is_some_and(|cap| rounds >= cap) {
            return Err(Error::SamplingExhausted { what, rounds });
        }
        rounds += 1;
        if rounds == SLOW_ROUNDS {
            warn!(what, rounds, k, "rejection sampling is not converging");
        }

        kept.extend(
            (0..2 * k)
                .map(|_| rng.gen_range(0..upper))
                .filter(|&id| !reject(id)),
        );
    }

    trace!(what, rounds, k, "rejection sampling done");
    kept.truncate(k);
    Ok(kept)
}
