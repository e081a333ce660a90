//! Stream and library-buffered strategies

use super::ReadOutcome;
use super::file::{alloc, file_len, open};
use super::pieces::{self, PieceCount, PieceOrder};
use crate::error::{BenchError, Result};
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Block size of the stream reader
pub const STREAM_BLOCK_SIZE: usize = 64 * 1024;

/// Reads a sequential stream until exhausted without knowing its size
///
/// The destination grows as blocks arrive. `pieces` counts the reads that
/// returned data.
pub fn streamed_read(path: &Path) -> Result<ReadOutcome> {
    let mut stream = BufReader::with_capacity(STREAM_BLOCK_SIZE, open(path)?);
    let mut data = Vec::new();
    let mut block = vec![0u8; STREAM_BLOCK_SIZE];
    let mut reads = 0u32;

    loop {
        let n = match stream.read(&mut block) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(BenchError::io(path, e)),
        };
        data.extend_from_slice(&block[..n]);
        reads = reads.saturating_add(1);
    }
    drop(stream);
    Ok(ReadOutcome::new(data, reads))
}

/// Sizes the stream by seeking to its end, then reads it in `pieces`
pub fn streamed_chunked_read(
    path: &Path,
    pieces: PieceCount,
    order: PieceOrder,
) -> Result<ReadOutcome> {
    let mut stream = BufReader::with_capacity(STREAM_BLOCK_SIZE, open(path)?);
    let len = stream
        .seek(SeekFrom::End(0))
        .map_err(|e| BenchError::io(path, e))?;
    stream
        .seek(SeekFrom::Start(0))
        .map_err(|e| BenchError::io(path, e))?;

    let mut buf = alloc(len, path)?;
    let ranges = pieces::plan_ordered(len, pieces, order);
    let seek = order == PieceOrder::Shuffled;
    for range in &ranges {
        if seek {
            stream
                .seek(SeekFrom::Start(range.start as u64))
                .map_err(|e| BenchError::io(path, e))?;
        }
        stream
            .read_exact(&mut buf[range.clone()])
            .map_err(|e| BenchError::io(path, e))?;
    }
    drop(stream);
    Ok(ReadOutcome::new(buf, ranges.len() as u32))
}

/// Opens through the standard library's buffered reader and reads the whole file
pub fn buffered_open_read(path: &Path) -> Result<ReadOutcome> {
    let file = open(path)?;
    let len = file_len(&file, path)?;
    let mut reader = BufReader::new(file);
    let mut buf = alloc(len, path)?;
    if buf.is_empty() {
        return Ok(ReadOutcome::empty());
    }

    reader.read_exact(&mut buf).map_err(|e| BenchError::io(path, e))?;
    drop(reader);
    Ok(ReadOutcome::new(buf, 1))
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
        (0..len).map(|i| (i % 94) as u8 + b'!').collect()
    }

    #[test]
    fn test_streamed_read_multiple_blocks() {
        let data = content(STREAM_BLOCK_SIZE * 3 + 17);
        let temp = temp_with(&data);
        let outcome = streamed_read(temp.path()).unwrap();
        assert_eq!(outcome.bytes_read, data.len() as u64);
        assert_eq!(outcome.data, data);
        assert!(outcome.pieces >= 4);
    }

    #[test]
    fn test_streamed_read_empty() {
        let temp = temp_with(b"");
        let outcome = streamed_read(temp.path()).unwrap();
        assert_eq!(outcome.bytes_read, 0);
        assert_eq!(outcome.pieces, 0);
    }

    #[test]
    fn test_streamed_chunked_read() {
        let data = content(1_000_003);
        let temp = temp_with(&data);
        for order in [PieceOrder::Sequential, PieceOrder::Shuffled] {
            let outcome =
                streamed_chunked_read(temp.path(), PieceCount::new(10).unwrap(), order).unwrap();
            assert_eq!(outcome.bytes_read, data.len() as u64);
            assert_eq!(outcome.pieces, 10);
            assert_eq!(outcome.data, data);
        }
    }

    #[test]
    fn test_buffered_open_read() {
        let data = content(12_345);
        let temp = temp_with(&data);
        let outcome = buffered_open_read(temp.path()).unwrap();
        assert_eq!(outcome.data, data);
        assert_eq!(outcome.pieces, 1);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing");
        assert!(matches!(streamed_read(&path), Err(BenchError::NotFound(_))));
        assert!(matches!(buffered_open_read(&path), Err(BenchError::NotFound(_))));
    }
}
