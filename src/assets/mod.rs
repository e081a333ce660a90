//! Asset container abstraction layer
//!
//! This module provides a unified interface for the read-only, name-indexed
//! stores that ship benchmark payloads: a plain directory, a packed container
//! file, or an in-memory table.

pub mod compress;
pub mod dir;
pub mod memory;
pub mod pack;

use memmap2::Mmap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

pub use compress::CompressionType;
pub use dir::DirAssets;
pub use memory::MemoryAssets;
pub use pack::{PackAssets, PackBuilder};

/// Errors that can occur during asset container operations
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Invalid asset name: {0}")]
    InvalidName(String),

    #[error("Corrupt pack: {0}")]
    Corrupt(String),

    #[error("Checksum mismatch for {name}: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        name: String,
        expected: u32,
        actual: u32,
    },

    #[error("Compression not supported: {0}")]
    UnsupportedCompression(u8),

    #[error("Compression error: {0}")]
    Compression(String),
}

pub type Result<T> = std::result::Result<T, AssetError>;

/// Trait for asset container access
///
/// Containers are owned by the host and only borrowed by the engine for the
/// duration of a single call. Implementations must not cache opened assets.
pub trait AssetContainer: Send + Sync {
    /// Opens the named asset
    fn open(&self, name: &str) -> Result<Asset>;

    /// Returns true if the container holds an asset with this name
    fn contains(&self, name: &str) -> bool;

    /// Lists asset names in a stable order
    fn list(&self) -> Vec<String>;
}

/// Reference-counted byte storage that several assets may slice into
pub(crate) type SharedBytes = Arc<dyn AsRef<[u8]> + Send + Sync>;

/// Backing storage of an opened asset
enum AssetData {
    Mapped(Mmap),
    Shared {
        bytes: SharedBytes,
        start: usize,
        end: usize,
    },
    Owned(Vec<u8>),
    Empty,
}

/// An opened asset
///
/// Gives whole-buffer access through [`Asset::buffer`] and sequential access
/// through [`Read`]. Dropping the asset releases it.
pub struct Asset {
    name: String,
    data: AssetData,
    pos: usize,
}

impl Asset {
    pub(crate) fn mapped(name: &str, mmap: Mmap) -> Self {
        Self::with_data(name, AssetData::Mapped(mmap))
    }

    pub(crate) fn shared(name: &str, bytes: SharedBytes, start: usize, end: usize) -> Self {
        Self::with_data(name, AssetData::Shared { bytes, start, end })
    }

    pub(crate) fn owned(name: &str, bytes: Vec<u8>) -> Self {
        Self::with_data(name, AssetData::Owned(bytes))
    }

    pub(crate) fn empty(name: &str) -> Self {
        Self::with_data(name, AssetData::Empty)
    }

    fn with_data(name: &str, data: AssetData) -> Self {
        Self {
            name: name.to_string(),
            data,
            pos: 0,
        }
    }

    /// Returns the asset name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the uncompressed length in bytes
    pub fn len(&self) -> u64 {
        self.buffer().len() as u64
    }

    /// Returns true if the asset has no content
    pub fn is_empty(&self) -> bool {
        self.buffer().is_empty()
    }

    /// Returns the whole uncompressed contents
    pub fn buffer(&self) -> &[u8] {
        match &self.data {
            AssetData::Mapped(mmap) => &mmap[..],
            AssetData::Shared { bytes, start, end } => &(**bytes).as_ref()[*start..*end],
            AssetData::Owned(bytes) => bytes,
            AssetData::Empty => &[],
        }
    }
}

impl Read for Asset {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let pos = self.pos;
        let remaining = &self.buffer()[pos.min(self.buffer().len())..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos = pos + n;
        Ok(n)
    }
}

impl std::fmt::Debug for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Asset")
            .field("name", &self.name)
            .field("len", &self.len())
            .field("pos", &self.pos)
            .finish()
    }
}

/// Rejects names that could escape the container root
pub(crate) fn validate_name(name: &str) -> Result<()> {
    let path = Path::new(name);
    let escapes = path.components().any(|c| {
        !matches!(c, std::path::Component::Normal(_))
    });
    if name.is_empty() || escapes {
        return Err(AssetError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Opens an asset container from the given path
///
/// Directories open as [`DirAssets`], regular files as [`PackAssets`].
pub fn open<P: AsRef<Path>>(path: P) -> Result<Box<dyn AssetContainer>> {
    let path = path.as_ref();
    let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AssetError::NotFound(path.display().to_string()),
        _ => AssetError::Io(e),
    })?;

    if metadata.is_dir() {
        Ok(Box::new(DirAssets::open(path)?))
    } else {
        Ok(Box::new(PackAssets::open(path)?))
    }
}
