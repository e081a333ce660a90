//! Read strategies
//!
//! Each strategy is one combination of open, read, and close calls whose
//! aggregate latency is measured. All of them go through [`run`], so the
//! timing harness can wrap any variant the same way.
//!
//! | Strategy              | Sources       | Access pattern                              |
//! |-----------------------|---------------|---------------------------------------------|
//! | `OpenOnly`            | file          | open, fstat, close                          |
//! | `OpenNoStat`          | file          | open, close                                 |
//! | `FullRead`            | asset, file   | one buffer, one read                        |
//! | `ChunkedRead`         | asset, file   | one buffer, `pieces` reads                  |
//! | `StreamedRead`        | file          | buffered stream read until exhausted        |
//! | `StreamedChunkedRead` | file          | stream sized by seek, `pieces` reads        |
//! | `BufferedOpenRead`    | file          | library buffered reader, whole file         |
//! | `MappedRead`          | file          | mmap, copy out                              |
//! | `MappedChunkedRead`   | file          | mmap, copy out in `pieces`                  |

pub mod asset;
pub mod file;
pub mod mapped;
pub mod pieces;
pub mod stream;

use crate::error::{BenchError, Result};
use crate::source::Handle;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use pieces::{PieceCount, PieceOrder};

/// The closed set of read strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    OpenOnly,
    OpenNoStat,
    FullRead,
    ChunkedRead,
    StreamedRead,
    StreamedChunkedRead,
    BufferedOpenRead,
    MappedRead,
    MappedChunkedRead,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 9] = [
        Self::OpenOnly,
        Self::OpenNoStat,
        Self::FullRead,
        Self::ChunkedRead,
        Self::StreamedRead,
        Self::StreamedChunkedRead,
        Self::BufferedOpenRead,
        Self::MappedRead,
        Self::MappedChunkedRead,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::OpenOnly => "OpenOnly",
            Self::OpenNoStat => "OpenNoStat",
            Self::FullRead => "FullRead",
            Self::ChunkedRead => "ChunkedRead",
            Self::StreamedRead => "StreamedRead",
            Self::StreamedChunkedRead => "StreamedChunkedRead",
            Self::BufferedOpenRead => "BufferedOpenRead",
            Self::MappedRead => "MappedRead",
            Self::MappedChunkedRead => "MappedChunkedRead",
        }
    }

    /// True if the strategy splits its read into pieces
    pub const fn is_chunked(self) -> bool {
        matches!(
            self,
            Self::ChunkedRead | Self::StreamedChunkedRead | Self::MappedChunkedRead
        )
    }

    /// True if the strategy can read from an asset container
    pub const fn supports_assets(self) -> bool {
        matches!(self, Self::FullRead | Self::ChunkedRead)
    }

    /// True if the strategy never reads data
    pub const fn is_open_only(self) -> bool {
        matches!(self, Self::OpenOnly | Self::OpenNoStat)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| BenchError::InvalidArgument(format!("unknown strategy: {}", s)))
    }
}

/// What a strategy produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOutcome {
    /// Bytes copied into the destination buffer
    pub bytes_read: u64,
    /// Read calls that transferred data
    pub pieces: u32,
    /// The destination buffer
    pub data: Vec<u8>,
}

impl ReadOutcome {
    pub fn new(data: Vec<u8>, pieces: u32) -> Self {
        Self {
            bytes_read: data.len() as u64,
            pieces,
            data,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

fn required(kind: StrategyKind, pieces: Option<PieceCount>) -> Result<PieceCount> {
    pieces.ok_or_else(|| BenchError::InvalidArgument(format!("{} requires a piece count", kind)))
}

/// Runs one strategy against a resolved handle
pub fn run(
    kind: StrategyKind,
    handle: &Handle<'_>,
    pieces: Option<PieceCount>,
    order: PieceOrder,
) -> Result<ReadOutcome> {
    use StrategyKind::*;

    match handle {
        Handle::Asset { container, name } => match kind {
            FullRead => asset::full_read(*container, name),
            ChunkedRead => asset::chunked_read(*container, name, required(kind, pieces)?, order),
            _ => Err(BenchError::InvalidArgument(format!(
                "{} cannot read from an asset container",
                kind
            ))),
        },
        Handle::File(path) => match kind {
            OpenOnly => file::open_only(path),
            OpenNoStat => file::open_no_stat(path),
            FullRead => file::full_read(path),
            ChunkedRead => file::chunked_read(path, required(kind, pieces)?, order),
            StreamedRead => stream::streamed_read(path),
            StreamedChunkedRead => {
                stream::streamed_chunked_read(path, required(kind, pieces)?, order)
            }
            BufferedOpenRead => stream::buffered_open_read(path),
            MappedRead => mapped::mapped_read(path),
            MappedChunkedRead => mapped::mapped_chunked_read(path, required(kind, pieces)?, order),
        },
    }
}
