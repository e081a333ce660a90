//! Piece planning for chunked strategies
//!
//! A source of `size` bytes split into `n` pieces is covered by
//! `min(n, size)` contiguous ranges whose lengths differ by at most one byte.
//! The largest piece is `ceil(size / n)` bytes. Ranges never overlap and
//! together cover every byte exactly once.

use crate::error::{BenchError, Result};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::ops::Range;

/// A validated piece count, always at least one
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct PieceCount(NonZeroU32);

impl PieceCount {
    /// Validates a caller-supplied count
    ///
    /// Counts above `u32::MAX` saturate; the plan already degenerates to
    /// one-byte pieces long before that.
    pub fn new(n: i64) -> Result<Self> {
        let clamped = n.clamp(0, i64::from(u32::MAX)) as u32;
        NonZeroU32::new(clamped).map(Self).ok_or_else(|| {
            BenchError::InvalidArgument(format!("piece count must be >= 1, got {}", n))
        })
    }

    #[inline]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<i64> for PieceCount {
    type Error = BenchError;

    fn try_from(n: i64) -> Result<Self> {
        Self::new(n)
    }
}

impl From<PieceCount> for u32 {
    fn from(p: PieceCount) -> u32 {
        p.get()
    }
}

impl std::fmt::Display for PieceCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Order in which pieces are visited
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceOrder {
    /// Front to back
    #[default]
    Sequential,
    /// A uniformly random permutation
    Shuffled,
}

/// Splits `size` bytes into at most `pieces` ranges
pub fn plan(size: u64, pieces: PieceCount) -> Vec<Range<usize>> {
    let size = size as usize;
    if size == 0 {
        return Vec::new();
    }

    let n = (pieces.get() as usize).min(size);
    let base = size / n;
    let extra = size % n;

    let mut ranges = Vec::with_capacity(n);
    let mut start = 0;
    for i in 0..n {
        let len = base + usize::from(i < extra);
        ranges.push(start..start + len);
        start += len;
    }
    debug_assert_eq!(start, size);
    ranges
}

/// Plans pieces and arranges them in `order`
pub fn plan_ordered(size: u64, pieces: PieceCount, order: PieceOrder) -> Vec<Range<usize>> {
    let mut ranges = plan(size, pieces);
    arrange(&mut ranges, order, &mut rand::thread_rng());
    ranges
}

/// Reorders planned ranges in place
pub fn arrange<R: Rng + ?Sized>(ranges: &mut [Range<usize>], order: PieceOrder, rng: &mut R) {
    if order == PieceOrder::Shuffled {
        ranges.shuffle(rng);
    }
}
