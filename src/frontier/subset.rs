//! Vertex subsets: the frontier representation
//!
//! Based on Ligra's `vertexSubset` (Shun & Blelloch, `PPoPP` 2013). A subset
//! over a universe of `n` vertices is either:
//!
//! - **sparse**: an explicit list of unique members (cheap when small)
//! - **dense**: a bitmap of `n` bits plus a cached cardinality (O(1) membership)
//!
//! Conversions are lossless. The traversal engine converts between steps,
//! never during one.

use crate::error::GraphError;
use anyhow::Result;
use rayon::iter::Either;
use rayon::prelude::*;
use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};

const WORD_BITS: usize = 64;

/// Number of 64-bit words needed for `universe` bits
#[inline]
pub(crate) const fn word_count(universe: usize) -> usize {
    universe.div_ceil(WORD_BITS)
}

#[derive(Debug, Clone)]
enum Repr {
    Sparse(Vec<u32>),
    Dense { bits: Vec<u64>, count: usize },
}

/// A set of active vertex identifiers over a fixed universe
///
/// # Example
///
/// ```
/// use frontier_graph::VertexSubset;
///
/// let subset = VertexSubset::from_members(vec![7, 2, 7, 4], 10).unwrap();
/// assert_eq!(subset.len(), 3);
///
/// let dense = subset.into_dense();
/// assert!(dense.is_dense());
/// assert!(dense.contains(4));
/// assert_eq!(dense.to_vec(), vec![2, 4, 7]);
/// ```
#[derive(Debug, Clone)]
pub struct VertexSubset {
    universe: usize,
    repr: Repr,
}

impl VertexSubset {
    /// Empty subset
    #[must_use]
    pub const fn empty(universe: usize) -> Self {
        Self {
            universe,
            repr: Repr::Sparse(Vec::new()),
        }
    }

    /// Subset holding only `v`
    ///
    /// `v` must be `< universe`; kernels validate roots before calling this.
    #[must_use]
    pub fn single(v: u32, universe: usize) -> Self {
        debug_assert!((v as usize) < universe, "vertex {v} outside universe {universe}");
        Self {
            universe,
            repr: Repr::Sparse(vec![v]),
        }
    }

    /// Every vertex of the universe (dense)
    #[must_use]
    pub fn full(universe: usize) -> Self {
        let mut bits = vec![u64::MAX; word_count(universe)];
        mask_tail(&mut bits, universe);
        Self {
            universe,
            repr: Repr::Dense {
                bits,
                count: universe,
            },
        }
    }

    /// Subset from arbitrary members: validated, sorted, deduplicated
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::VertexOutOfRange`] if a member is `>= universe`.
    pub fn from_members(mut members: Vec<u32>, universe: usize) -> Result<Self> {
        if let Some(&bad) = members.iter().find(|&&v| v as usize >= universe) {
            return Err(GraphError::out_of_range(bad, universe).into());
        }
        members.sort_unstable();
        members.dedup();
        Ok(Self {
            universe,
            repr: Repr::Sparse(members),
        })
    }

    /// Subset from members already known to be unique and in range
    #[must_use]
    pub fn from_unique(members: Vec<u32>, universe: usize) -> Self {
        debug_assert!(members.iter().all(|&v| (v as usize) < universe));
        Self {
            universe,
            repr: Repr::Sparse(members),
        }
    }

    /// Dense subset from a bitmap; bits past `universe` are ignored
    #[must_use]
    pub fn from_bits(mut bits: Vec<u64>, universe: usize) -> Self {
        bits.resize(word_count(universe), 0);
        mask_tail(&mut bits, universe);
        let count = bits.iter().map(|w| w.count_ones() as usize).sum();
        Self {
            universe,
            repr: Repr::Dense { bits, count },
        }
    }

    /// Cardinality
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::Sparse(members) => members.len(),
            Repr::Dense { count, .. } => *count,
        }
    }

    /// Whether no vertex is active
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the vertex universe
    #[must_use]
    pub const fn universe(&self) -> usize {
        self.universe
    }

    /// Whether the bitmap representation is in use
    #[must_use]
    pub const fn is_dense(&self) -> bool {
        matches!(self.repr, Repr::Dense { .. })
    }

    /// Membership test: O(1) dense, O(len) sparse
    #[must_use]
    pub fn contains(&self, v: u32) -> bool {
        let idx = v as usize;
        if idx >= self.universe {
            return false;
        }
        match &self.repr {
            Repr::Sparse(members) => members.contains(&v),
            Repr::Dense { bits, .. } => (bits[idx / WORD_BITS] >> (idx % WORD_BITS)) & 1 == 1,
        }
    }

    /// Iterate members (ascending when dense, insertion order when sparse)
    #[must_use]
    pub fn iter(&self) -> Members<'_> {
        match &self.repr {
            Repr::Sparse(members) => Members::Sparse(members.iter()),
            Repr::Dense { bits, .. } => Members::Dense {
                words: bits.iter().enumerate(),
                current: SetBits::default(),
            },
        }
    }

    /// Parallel iterator over members
    pub fn par_iter(&self) -> impl ParallelIterator<Item = u32> + '_ {
        match &self.repr {
            Repr::Sparse(members) => Either::Left(members.par_iter().copied()),
            Repr::Dense { bits, .. } => Either::Right(
                bits.par_iter()
                    .enumerate()
                    .flat_map_iter(|(w, &word)| SetBits::new(word, w * WORD_BITS)),
            ),
        }
    }

    /// Members collected into a vector
    #[must_use]
    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }

    /// Convert to the bitmap representation
    #[must_use]
    pub fn into_dense(self) -> Self {
        match self.repr {
            Repr::Dense { .. } => self,
            Repr::Sparse(members) => {
                let mut bits = vec![0_u64; word_count(self.universe)];
                for v in &members {
                    let idx = *v as usize;
                    bits[idx / WORD_BITS] |= 1 << (idx % WORD_BITS);
                }
                Self {
                    universe: self.universe,
                    repr: Repr::Dense {
                        bits,
                        count: members.len(),
                    },
                }
            }
        }
    }

    /// Convert to the explicit-list representation (ascending order)
    #[must_use]
    pub fn into_sparse(self) -> Self {
        match self.repr {
            Repr::Sparse(_) => self,
            Repr::Dense { ref bits, count } => {
                let mut members = Vec::with_capacity(count);
                members.par_extend(
                    bits.par_iter()
                        .enumerate()
                        .flat_map_iter(|(w, &word)| SetBits::new(word, w * WORD_BITS)),
                );
                Self {
                    universe: self.universe,
                    repr: Repr::Sparse(members),
                }
            }
        }
    }

    /// Borrow as dense, converting a sparse subset into a fresh bitmap
    #[must_use]
    pub fn to_dense(&self) -> Cow<'_, Self> {
        if self.is_dense() {
            Cow::Borrowed(self)
        } else {
            Cow::Owned(self.clone().into_dense())
        }
    }

    /// Borrow as sparse, materializing the member list of a dense subset
    #[must_use]
    pub fn to_sparse(&self) -> Cow<'_, Self> {
        if self.is_dense() {
            Cow::Owned(self.clone().into_sparse())
        } else {
            Cow::Borrowed(self)
        }
    }

    /// Pick the representation by density
    ///
    /// Dense when `len >= fraction * universe`, sparse otherwise.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Vertex counts far below 2^52
    pub fn normalize(self, fraction: f64) -> Self {
        let dense = self.len() as f64 >= fraction * self.universe as f64 && !self.is_empty();
        if dense {
            self.into_dense()
        } else {
            self.into_sparse()
        }
    }
}

impl<'a> IntoIterator for &'a VertexSubset {
    type Item = u32;
    type IntoIter = Members<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the members of a [`VertexSubset`]
#[derive(Debug, Clone)]
pub enum Members<'a> {
    /// Walking an explicit list
    Sparse(std::slice::Iter<'a, u32>),
    /// Walking bitmap words
    Dense {
        /// Remaining words with their index
        words: std::iter::Enumerate<std::slice::Iter<'a, u64>>,
        /// Bits left in the current word
        current: SetBits,
    },
}

impl Iterator for Members<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        match self {
            Self::Sparse(iter) => iter.next().copied(),
            Self::Dense { words, current } => loop {
                if let Some(v) = current.next() {
                    return Some(v);
                }
                let (w, &word) = words.next()?;
                *current = SetBits::new(word, w * WORD_BITS);
            },
        }
    }
}

/// Set-bit positions of one bitmap word, offset by the word's base index
#[derive(Debug, Clone, Copy, Default)]
pub struct SetBits {
    word: u64,
    base: usize,
}

impl SetBits {
    const fn new(word: u64, base: usize) -> Self {
        Self { word, base }
    }
}

impl Iterator for SetBits {
    type Item = u32;

    #[inline]
    fn next(&mut self) -> Option<u32> {
        if self.word == 0 {
            return None;
        }
        let bit = self.word.trailing_zeros() as usize;
        self.word &= self.word - 1;
        Some(crate::storage::vertex_id(self.base + bit))
    }
}

/// Word-packed bitmap with atomic test-and-set
///
/// Used to deduplicate concurrently discovered vertices: exactly one caller
/// observes `true` from [`AtomicBitmap::insert`] for a given vertex.
#[derive(Debug)]
pub struct AtomicBitmap {
    words: Vec<AtomicU64>,
    universe: usize,
}

impl AtomicBitmap {
    /// All-clear bitmap over `universe` vertices
    #[must_use]
    pub fn new(universe: usize) -> Self {
        Self {
            words: (0..word_count(universe)).map(|_| AtomicU64::new(0)).collect(),
            universe,
        }
    }

    /// Set the bit for `v`; returns `true` if this call set it
    #[inline]
    pub fn insert(&self, v: u32) -> bool {
        let idx = v as usize;
        let mask = 1_u64 << (idx % WORD_BITS);
        (self.words[idx / WORD_BITS].fetch_or(mask, Ordering::AcqRel) & mask) == 0
    }

    /// Whether the bit for `v` is set
    #[inline]
    #[must_use]
    pub fn contains(&self, v: u32) -> bool {
        let idx = v as usize;
        idx < self.universe
            && (self.words[idx / WORD_BITS].load(Ordering::Acquire) >> (idx % WORD_BITS)) & 1 == 1
    }

    /// Freeze into a dense [`VertexSubset`]
    #[must_use]
    pub fn into_subset(self) -> VertexSubset {
        let bits = self.words.into_iter().map(AtomicU64::into_inner).collect();
        VertexSubset::from_bits(bits, self.universe)
    }
}

fn mask_tail(bits: &mut [u64], universe: usize) {
    let tail = universe % WORD_BITS;
    if tail != 0 {
        if let Some(last) = bits.last_mut() {
            *last &= (1_u64 << tail) - 1;
        }
    }
}
