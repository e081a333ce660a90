//! Timing harness
//!
//! Wraps a strategy between two reads of the monotonic clock. Wall-clock
//! adjustments never affect a measurement. A failed strategy produces no
//! result: its error is returned and the partial elapsed time is dropped.

use crate::error::Result;
use crate::source::SourceRef;
use crate::strategy::{ReadOutcome, StrategyKind};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// The byte count and elapsed time of one strategy execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub strategy: StrategyKind,
    pub source: SourceRef,
    pub bytes_read: u64,
    pub pieces: u32,
    pub elapsed_nanos: u64,
}

impl BenchmarkResult {
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_nanos)
    }

    /// Elapsed time in fractional milliseconds
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_nanos as f64 / 1_000_000.0
    }

    /// Throughput in MB/s, zero when nothing was read
    pub fn throughput_mbps(&self) -> f64 {
        throughput(self.bytes_read, self.elapsed())
    }
}

fn throughput(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if bytes == 0 || secs == 0.0 {
        return 0.0;
    }
    bytes as f64 / secs / 1_000_000.0
}

fn to_nanos(elapsed: Duration, bytes_read: u64) -> u64 {
    let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
    // A read that moved data took time even if the clock tick was coarser
    if bytes_read > 0 { nanos.max(1) } else { nanos }
}

/// Times `f`, including any cleanup it performs before returning
pub fn measure<F>(
    strategy: StrategyKind,
    source: &SourceRef,
    f: F,
) -> Result<(BenchmarkResult, ReadOutcome)>
where
    F: FnOnce() -> Result<ReadOutcome>,
{
    let start = Instant::now();
    let outcome = f()?;
    let elapsed = start.elapsed();

    let result = BenchmarkResult {
        strategy,
        source: source.clone(),
        bytes_read: outcome.bytes_read,
        pieces: outcome.pieces,
        elapsed_nanos: to_nanos(elapsed, outcome.bytes_read),
    };
    Ok((result, outcome))
}

/// Aggregate of repeated runs of one strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub strategy: StrategyKind,
    pub runs: usize,
    pub bytes_read: u64,
    pub min_nanos: u64,
    pub max_nanos: u64,
    pub mean_nanos: u64,
    pub median_nanos: u64,
    pub mean_throughput_mbps: f64,
}

impl Summary {
    /// Summarizes results of a single strategy; `None` when empty
    pub fn from_results(results: &[BenchmarkResult]) -> Option<Self> {
        let first = results.first()?;
        let mut nanos: Vec<u64> = results.iter().map(|r| r.elapsed_nanos).collect();
        nanos.sort_unstable();

        let total: u128 = nanos.iter().map(|&n| u128::from(n)).sum();
        let mean = (total / nanos.len() as u128) as u64;
        let mid = nanos.len() / 2;
        let median = if nanos.len() % 2 == 0 {
            ((u128::from(nanos[mid - 1]) + u128::from(nanos[mid])) / 2) as u64
        } else {
            nanos[mid]
        };

        Some(Self {
            strategy: first.strategy,
            runs: results.len(),
            bytes_read: first.bytes_read,
            min_nanos: nanos[0],
            max_nanos: nanos[nanos.len() - 1],
            mean_nanos: mean,
            median_nanos: median,
            mean_throughput_mbps: throughput(first.bytes_read, Duration::from_nanos(mean)),
        })
    }
}
