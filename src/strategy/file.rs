//! Raw file descriptor strategies
//!
//! Every function opens the file itself and closes it (by drop) before
//! returning, so open and teardown are part of the measured section.

use super::ReadOutcome;
use super::pieces::{self, PieceCount, PieceOrder};
use crate::error::{BenchError, Result};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

pub(crate) fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| BenchError::io(path, e))
}

pub(crate) fn file_len(file: &File, path: &Path) -> Result<u64> {
    Ok(file.metadata().map_err(|e| BenchError::io(path, e))?.len())
}

pub(crate) fn alloc(len: u64, path: &Path) -> Result<Vec<u8>> {
    let len = usize::try_from(len)
        .map_err(|_| BenchError::io_failure(path, "source larger than address space"))?;
    Ok(vec![0u8; len])
}

/// Open, fstat, close
pub fn open_only(path: &Path) -> Result<ReadOutcome> {
    let file = open(path)?;
    let _size = file_len(&file, path)?;
    drop(file);
    Ok(ReadOutcome::empty())
}

/// Open, close
pub fn open_no_stat(path: &Path) -> Result<ReadOutcome> {
    let file = open(path)?;
    drop(file);
    Ok(ReadOutcome::empty())
}

/// One buffer sized to the file, one read
pub fn full_read(path: &Path) -> Result<ReadOutcome> {
    let mut file = open(path)?;
    let len = file_len(&file, path)?;
    let mut buf = alloc(len, path)?;
    if buf.is_empty() {
        return Ok(ReadOutcome::empty());
    }

    file.read_exact(&mut buf).map_err(|e| BenchError::io(path, e))?;
    drop(file);
    Ok(ReadOutcome::new(buf, 1))
}

/// One buffer sized to the file, filled by `pieces` reads
///
/// Sequential order relies on the file cursor; shuffled order seeks before
/// each piece.
pub fn chunked_read(path: &Path, pieces: PieceCount, order: PieceOrder) -> Result<ReadOutcome> {
    let mut file = open(path)?;
    let len = file_len(&file, path)?;
    let mut buf = alloc(len, path)?;

    let ranges = pieces::plan_ordered(len, pieces, order);
    let seek = order == PieceOrder::Shuffled;
    for range in &ranges {
        if seek {
            file.seek(SeekFrom::Start(range.start as u64))
                .map_err(|e| BenchError::io(path, e))?;
        }
        file.read_exact(&mut buf[range.clone()])
            .map_err(|e| BenchError::io(path, e))?;
    }
    drop(file);
    Ok(ReadOutcome::new(buf, ranges.len() as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn temp_with(bytes: &[u8]) -> NamedTempFile {
        let temp = NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), bytes).unwrap();
        temp
    }

    fn content(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 % 251) as u8).collect()
    }

    #[test]
    fn test_open_variants_read_nothing() {
        let temp = temp_with(&content(1000));
        let outcome = open_only(temp.path()).unwrap();
        assert_eq!(outcome.bytes_read, 0);
        assert_eq!(outcome.pieces, 0);

        let outcome = open_no_stat(temp.path()).unwrap();
        assert_eq!(outcome.bytes_read, 0);
    }

    #[test]
    fn test_full_read() {
        let data = content(100_000);
        let temp = temp_with(&data);
        let outcome = full_read(temp.path()).unwrap();
        assert_eq!(outcome.bytes_read, 100_000);
        assert_eq!(outcome.pieces, 1);
        assert_eq!(outcome.data, data);
    }

    #[test]
    fn test_chunked_read_both_orders() {
        let data = content(99_991);
        let temp = temp_with(&data);
        for order in [PieceOrder::Sequential, PieceOrder::Shuffled] {
            let outcome =
                chunked_read(temp.path(), PieceCount::new(7).unwrap(), order).unwrap();
            assert_eq!(outcome.bytes_read, data.len() as u64);
            assert_eq!(outcome.pieces, 7);
            assert_eq!(outcome.data, data);
        }
    }

    #[test]
    fn test_chunked_read_more_pieces_than_bytes() {
        let temp = temp_with(b"abc");
        let pieces = PieceCount::new(10).unwrap();
        let outcome = chunked_read(temp.path(), pieces, PieceOrder::Sequential).unwrap();
        assert_eq!(outcome.bytes_read, 3);
        assert_eq!(outcome.pieces, 3);
    }

    #[test]
    fn test_zero_length() {
        let temp = temp_with(b"");
        assert_eq!(full_read(temp.path()).unwrap().pieces, 0);
        let outcome = chunked_read(temp.path(), PieceCount::new(4).unwrap(), PieceOrder::Sequential)
            .unwrap();
        assert_eq!(outcome.bytes_read, 0);
        assert_eq!(outcome.pieces, 0);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing");
        assert!(matches!(open_only(&path), Err(BenchError::NotFound(_))));
        assert!(matches!(full_read(&path), Err(BenchError::NotFound(_))));
    }
}
