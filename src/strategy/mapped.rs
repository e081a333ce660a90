//! Memory-mapped strategies
//!
//! The file is mapped privately and copied out of the mapping, so page faults
//! are charged to the measurement the same way read calls are elsewhere.

use super::ReadOutcome;
use super::file::{alloc, file_len, open};
use super::pieces::{self, PieceCount, PieceOrder};
use crate::error::{BenchError, Result};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

fn map(file: &File, path: &Path) -> Result<Mmap> {
    // SAFETY: benchmark targets are not modified while a run holds the mapping
    unsafe { Mmap::map(file) }.map_err(|e| BenchError::io(path, e))
}

/// Map the whole file and copy it out in one go
pub fn mapped_read(path: &Path) -> Result<ReadOutcome> {
    let file = open(path)?;
    let len = file_len(&file, path)?;
    if len == 0 {
        return Ok(ReadOutcome::empty());
    }

    let mapping = map(&file, path)?;
    let data = mapping[..].to_vec();
    drop(mapping);
    drop(file);
    Ok(ReadOutcome::new(data, 1))
}

/// Map the whole file and copy it out in `pieces`
pub fn mapped_chunked_read(
    path: &Path,
    pieces: PieceCount,
    order: PieceOrder,
) -> Result<ReadOutcome> {
    let file = open(path)?;
    let len = file_len(&file, path)?;
    if len == 0 {
        return Ok(ReadOutcome::empty());
    }

    let mapping = map(&file, path)?;
    let mut buf = alloc(len, path)?;
    let ranges = pieces::plan_ordered(len, pieces, order);
    for range in &ranges {
        buf[range.clone()].copy_from_slice(&mapping[range.clone()]);
    }
    drop(mapping);
    drop(file);
    Ok(ReadOutcome::new(buf, ranges.len() as u32))
}
