//! Shared-state primitives for parallel kernels
//!
//! - [`WorkerCounters`]: one cache-padded counter per rayon worker, reduced
//!   once per step instead of hammering a single global atomic
//! - [`AtomicF32`]: `f32` with an atomic add built from a CAS retry loop

use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// Per-worker counters padded to the cache line
///
/// Each rayon worker increments its own slot (`current_thread_index`), so
/// concurrent updates never share a line. Totals become visible only at
/// [`WorkerCounters::reduce`], which the caller invokes after the parallel
/// region has joined.
///
/// # Example
///
/// ```
/// use frontier_graph::frontier::WorkerCounters;
/// use rayon::prelude::*;
///
/// let counters = WorkerCounters::new();
/// (0..1000).into_par_iter().for_each(|_| counters.add(1));
/// assert_eq!(counters.reduce(), 1000);
/// assert_eq!(counters.reduce(), 0); // reduce resets
/// ```
#[derive(Debug)]
pub struct WorkerCounters {
    slots: Box<[CachePadded<AtomicUsize>]>,
}

impl WorkerCounters {
    /// One slot per worker of the current rayon pool
    #[must_use]
    pub fn new() -> Self {
        Self::with_workers(rayon::current_num_threads())
    }

    /// Explicit slot count (at least one)
    #[must_use]
    pub fn with_workers(workers: usize) -> Self {
        let slots = (0..workers.max(1))
            .map(|_| CachePadded::new(AtomicUsize::new(0)))
            .collect();
        Self { slots }
    }

    /// Number of slots
    #[must_use]
    pub fn workers(&self) -> usize {
        self.slots.len()
    }

    /// Add to the calling worker's slot
    ///
    /// Callers outside the pool (or from a larger pool) share slots by
    /// modulo; the total stays exact, only padding benefits are lost.
    #[inline]
    pub fn add(&self, amount: usize) {
        let idx = rayon::current_thread_index().unwrap_or(0) % self.slots.len();
        self.slots[idx].fetch_add(amount, Ordering::Relaxed);
    }

    /// Sum all slots and reset them to zero
    pub fn reduce(&self) -> usize {
        self.slots
            .iter()
            .map(|slot| slot.swap(0, Ordering::Relaxed))
            .sum()
    }
}

impl Default for WorkerCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Atomic `f32`, stored as its bit pattern in an [`AtomicU32`]
///
/// There is no portable native float add, so [`AtomicF32::fetch_add`]
/// reinterprets the bits and retries a weak compare-exchange until no other
/// writer intervened.
#[derive(Debug, Default)]
#[repr(transparent)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    /// New atomic holding `value`
    #[must_use]
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    /// Load the current value
    #[inline]
    pub fn load(&self, order: Ordering) -> f32 {
        f32::from_bits(self.0.load(order))
    }

    /// Store `value`
    #[inline]
    pub fn store(&self, value: f32, order: Ordering) {
        self.0.store(value.to_bits(), order);
    }

    /// Replace the value, returning the previous one
    #[inline]
    pub fn swap(&self, value: f32, order: Ordering) -> f32 {
        f32::from_bits(self.0.swap(value.to_bits(), order))
    }

    /// Atomically add `delta`, returning the previous value
    #[inline]
    pub fn fetch_add(&self, delta: f32, order: Ordering) -> f32 {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            let next = (f32::from_bits(current) + delta).to_bits();
            match self
                .0
                .compare_exchange_weak(current, next, order, Ordering::Relaxed)
            {
                Ok(previous) => return f32::from_bits(previous),
                Err(actual) => current = actual,
            }
        }
    }

    /// Consume the atomic and return the value
    #[must_use]
    pub fn into_inner(self) -> f32 {
        f32::from_bits(self.0.into_inner())
    }
}
