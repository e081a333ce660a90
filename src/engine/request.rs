//! Validated benchmark requests

use crate::error::{BenchError, Result};
use crate::source::SourceRef;
use crate::strategy::{PieceCount, StrategyKind};

/// One benchmark invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
    pub strategy: StrategyKind,
    pub source: SourceRef,
    pub pieces: Option<PieceCount>,
}

impl ReadRequest {
    /// Validates the combination of strategy, source and piece count
    ///
    /// Chunked strategies require a piece count; others ignore one. File-only
    /// strategies never accept an asset source.
    pub fn new(strategy: StrategyKind, source: SourceRef, pieces: Option<i64>) -> Result<Self> {
        if source.is_asset() && !strategy.supports_assets() {
            return Err(BenchError::InvalidArgument(format!(
                "{} cannot read {}",
                strategy, source
            )));
        }

        let pieces = if strategy.is_chunked() {
            let n = pieces.ok_or_else(|| {
                BenchError::InvalidArgument(format!("{} requires a piece count", strategy))
            })?;
            Some(PieceCount::new(n)?)
        } else {
            None
        };

        Ok(Self {
            strategy,
            source,
            pieces,
        })
    }
}
