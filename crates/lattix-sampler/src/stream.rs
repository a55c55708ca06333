//! Unbounded batch streams over finite, restartable sources.
//!
//! - [`BatchSource`] - a finite source that can start a fresh pass on demand
//! - [`Cyclic`] - restarts its source whenever a pass runs dry
//! - [`AlternatingStream`] - strict head/tail alternation over two cyclic sources
//!
//! The two sides of an [`AlternatingStream`] share no state: each restarts
//! its own source independently of the other.

use tracing::debug;

/// A finite batch source that can be iterated again from the start.
pub trait BatchSource {
    type Batch;
    type Pass: Iterator<Item = Self::Batch>;

    /// Start a fresh pass (one epoch) over the source.
    fn pass(&mut self) -> Self::Pass;
}

/// A fixed list of batches, replayed in order on every pass.
impl<T: Clone> BatchSource for Vec<T> {
    type Batch = T;
    type Pass = std::vec::IntoIter<T>;

    fn pass(&mut self) -> Self::Pass {
        self.clone().into_iter()
    }
}

/// Endless iteration over a [`BatchSource`].
///
/// Only ends if a freshly started pass yields nothing, i.e. the source is empty.
pub struct Cyclic<S: BatchSource> {
    source: S,
    current: Option<S::Pass>,
    passes: usize,
}

impl<S: BatchSource> Cyclic<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            current: None,
            passes: 0,
        }
    }

    /// Passes started so far, including the current one.
    pub fn passes(&self) -> usize {
        self.passes
    }
}

impl<S: BatchSource> Iterator for Cyclic<S> {
    type Item = S::Batch;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(batch) = self.current.as_mut().and_then(Iterator::next) {
            return Some(batch);
        }

        let mut pass = self.source.pass();
        self.passes += 1;
        if self.passes > 1 {
            debug!(passes = self.passes, "batch source exhausted, restarting");
        }
        let batch = pass.next();
        self.current = Some(pass);
        batch
    }
}

/// Alternates between a head-batch and a tail-batch source every step.
///
/// The step counter starts at 0 and is incremented before each pull: odd
/// steps pull from the head side, even steps from the tail side. So the
/// first batch is head-batch, the second tail-batch, and so on forever.
pub struct AlternatingStream<H, T>
where
    H: BatchSource,
    T: BatchSource<Batch = H::Batch>,
{
    head: Cyclic<H>,
    tail: Cyclic<T>,
    step: u64,
}

impl<H, T> AlternatingStream<H, T>
where
    H: BatchSource,
    T: BatchSource<Batch = H::Batch>,
{
    pub fn new(head: H, tail: T) -> Self {
        Self {
            head: Cyclic::new(head),
            tail: Cyclic::new(tail),
            step: 0,
        }
    }

    /// Number of batches pulled so far.
    pub fn step(&self) -> u64 {
        self.step
    }
}

impl<H, T> Iterator for AlternatingStream<H, T>
where
    H: BatchSource,
    T: BatchSource<Batch = H::Batch>,
{
    type Item = H::Batch;

    fn next(&mut self) -> Option<Self::Item> {
        self.step += 1;
        if self.step % 2 == 0 {
            self.tail.next()
        } else {
            self.head.next()
        }
    }
}
