//! Benchmark payload generator
//!
//! Produces a file of random printable ASCII: letters, digits and
//! punctuation, drawn uniformly.

use crate::error::{BenchError, Result};
use rand::Rng;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Size of the default payload in MiB
pub const DEFAULT_SIZE_MIB: u64 = 100;

const MIB: u64 = 1024 * 1024;
const BLOCK_SIZE: usize = 1024 * 1024;

/// Characters the payload is drawn from
pub const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz\
ABCDEFGHIJKLMNOPQRSTUVWXYZ\
0123456789\
!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Overwrites `buf` with characters from [`CHARSET`]
pub fn fill_random<R: Rng + ?Sized>(rng: &mut R, buf: &mut [u8]) {
    for b in buf.iter_mut() {
        *b = CHARSET[rng.gen_range(0..CHARSET.len())];
    }
}

/// Returns `len` random characters
pub fn random_content(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    fill_random(&mut rand::thread_rng(), &mut buf);
    buf
}

/// Writes `bytes` random characters to `path`, replacing any existing file
pub fn write_random_bytes<P: AsRef<Path>>(path: P, bytes: u64) -> Result<u64> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| BenchError::io(path, e))?;
    let mut out = BufWriter::new(file);
    let mut rng = rand::thread_rng();
    let mut block = vec![0u8; BLOCK_SIZE];

    let mut remaining = bytes;
    while remaining > 0 {
        let n = remaining.min(BLOCK_SIZE as u64) as usize;
        fill_random(&mut rng, &mut block[..n]);
        out.write_all(&block[..n]).map_err(|e| BenchError::io(path, e))?;
        remaining -= n as u64;
    }
    out.flush().map_err(|e| BenchError::io(path, e))?;

    tracing::debug!(path = %path.display(), bytes, "generated payload");
    Ok(bytes)
}

/// Writes `size_mib` MiB of random characters to `path`
pub fn write_random_file<P: AsRef<Path>>(path: P, size_mib: u64) -> Result<u64> {
    let bytes = size_mib
        .checked_mul(MIB)
        .ok_or_else(|| BenchError::InvalidArgument(format!("size too large: {} MiB", size_mib)))?;
    write_random_bytes(path, bytes)
}
