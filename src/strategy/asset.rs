//! Asset container strategies
//!
//! Opening the asset is part of the measurement. Data is copied out of the
//! asset's whole buffer, the same access the host's buffer mode gives.

use super::ReadOutcome;
use super::pieces::{self, PieceCount, PieceOrder};
use crate::assets::AssetContainer;
use crate::error::Result;

/// Open the asset and copy its buffer in one go
pub fn full_read(container: &dyn AssetContainer, name: &str) -> Result<ReadOutcome> {
    let asset = container.open(name)?;
    if asset.is_empty() {
        return Ok(ReadOutcome::empty());
    }

    let data = asset.buffer().to_vec();
    drop(asset);
    Ok(ReadOutcome::new(data, 1))
}

/// Open the asset and copy its buffer in `pieces`
pub fn chunked_read(
    container: &dyn AssetContainer,
    name: &str,
    pieces: PieceCount,
    order: PieceOrder,
) -> Result<ReadOutcome> {
    let asset = container.open(name)?;
    let src = asset.buffer();
    let mut buf = vec![0u8; src.len()];

    let ranges = pieces::plan_ordered(asset.len(), pieces, order);
    for range in &ranges {
        buf[range.clone()].copy_from_slice(&src[range.clone()]);
    }
    drop(asset);
    Ok(ReadOutcome::new(buf, ranges.len() as u32))
}
