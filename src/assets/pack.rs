//! Packed asset container
//!
//! A pack is a single file holding many assets, each optionally compressed.
//! All integers are little-endian.
//!
//! ```text
//! header:  magic "ARBPACK1" | version u32 | entry_count u32
//! entry:   name_len u16 | name | compression u8 | offset u64
//!          | stored_len u64 | raw_len u64 | crc32c u32
//! data:    entry payloads at their absolute offsets
//! ```
//!
//! Stored entries are served straight out of the mapped pack; compressed
//! entries are inflated and checksummed when opened.

use super::compress::{self, CompressionType};
use super::{Asset, AssetContainer, AssetError, Result, SharedBytes, validate_name};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use memmap2::Mmap;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::Path;
use std::sync::Arc;

/// Pack magic number
pub const PACK_MAGIC: [u8; 8] = *b"ARBPACK1";

/// Current pack format version
pub const PACK_VERSION: u32 = 1;

/// Size of the fixed header
const HEADER_SIZE: usize = 16;

/// Largest uncompressed entry a pack may declare
pub const MAX_RAW_LEN: u64 = 1 << 40;

/// Fixed part of an index entry, excluding the name
const ENTRY_FIXED_SIZE: usize = 2 + 1 + 8 + 8 + 8 + 4;

/// Index entry for one asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackEntry {
    pub name: String,
    pub compression: CompressionType,
    pub offset: u64,
    pub stored_len: u64,
    pub raw_len: u64,
    pub crc32c: u32,
}

impl PackEntry {
    fn stored_range(&self) -> std::ops::Range<usize> {
        self.offset as usize..(self.offset + self.stored_len) as usize
    }
}

/// A read-only packed asset container
pub struct PackAssets {
    map: Arc<Mmap>,
    entries: BTreeMap<String, PackEntry>,
}

impl PackAssets {
    /// Opens and indexes a pack file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let size = file.metadata()?.len();
        if (size as usize) < HEADER_SIZE {
            return Err(AssetError::Corrupt("file too small for header".to_string()));
        }

        // SAFETY: packs are read-only inputs and are not modified while open
        let map = unsafe { Mmap::map(&file)? };
        let entries = parse_index(&map)?;

        Ok(Self {
            map: Arc::new(map),
            entries,
        })
    }

    /// Returns the index entry for an asset
    pub fn entry(&self, name: &str) -> Option<&PackEntry> {
        self.entries.get(name)
    }

    /// Checks every entry against its stored checksum
    pub fn verify_all(&self) -> Result<()> {
        for name in self.entries.keys() {
            let asset = self.open(name)?;
            let entry = &self.entries[name];
            check_crc(entry, asset.buffer())?;
        }
        Ok(())
    }

    fn bytes(&self) -> &[u8] {
        &self.map[..]
    }
}

impl AssetContainer for PackAssets {
    fn open(&self, name: &str) -> Result<Asset> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| AssetError::NotFound(name.to_string()))?;

        if entry.raw_len == 0 {
            return Ok(Asset::empty(name));
        }

        match entry.compression {
            CompressionType::None => {
                let range = entry.stored_range();
                let shared: SharedBytes = Arc::clone(&self.map) as SharedBytes;
                Ok(Asset::shared(name, shared, range.start, range.end))
            }
            compression => {
                let stored = &self.bytes()[entry.stored_range()];
                let raw = compress::decompress(compression, stored, entry.raw_len as usize)?;
                check_crc(entry, &raw)?;
                Ok(Asset::owned(name, raw))
            }
        }
    }

    fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn list(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

impl std::fmt::Debug for PackAssets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackAssets")
            .field("size", &self.bytes().len())
            .field("entries", &self.entries.len())
            .finish()
    }
}

fn check_crc(entry: &PackEntry, raw: &[u8]) -> Result<()> {
    let actual = crc32c::crc32c(raw);
    if actual != entry.crc32c {
        return Err(AssetError::ChecksumMismatch {
            name: entry.name.clone(),
            expected: entry.crc32c,
            actual,
        });
    }
    Ok(())
}

fn parse_index(data: &[u8]) -> Result<BTreeMap<String, PackEntry>> {
    let mut cursor = Cursor::new(data);

    let mut magic = [0u8; 8];
    cursor.read_exact(&mut magic)?;
    if magic != PACK_MAGIC {
        return Err(AssetError::Corrupt("invalid magic".to_string()));
    }

    let version = cursor.read_u32::<LittleEndian>()?;
    if version != PACK_VERSION {
        return Err(AssetError::Corrupt(format!("unsupported version {}", version)));
    }

    let count = cursor.read_u32::<LittleEndian>()? as usize;
    let mut entries = BTreeMap::new();

    for _ in 0..count {
        let name_len = cursor.read_u16::<LittleEndian>()? as usize;
        let mut name = vec![0u8; name_len];
        cursor
            .read_exact(&mut name)
            .map_err(|_| AssetError::Corrupt("truncated index".to_string()))?;
        let name = String::from_utf8(name)
            .map_err(|_| AssetError::Corrupt("entry name is not UTF-8".to_string()))?;

        let entry = PackEntry {
            compression: CompressionType::from_u8(cursor.read_u8()?)?,
            offset: cursor.read_u64::<LittleEndian>()?,
            stored_len: cursor.read_u64::<LittleEndian>()?,
            raw_len: cursor.read_u64::<LittleEndian>()?,
            crc32c: cursor.read_u32::<LittleEndian>()?,
            name,
        };

        let end = entry.offset.checked_add(entry.stored_len);
        if end.is_none_or(|end| end > data.len() as u64) {
            return Err(AssetError::Corrupt(format!(
                "entry {} extends beyond end of pack",
                entry.name
            )));
        }
        if entry.raw_len > MAX_RAW_LEN || usize::try_from(entry.raw_len).is_err() {
            return Err(AssetError::Corrupt(format!(
                "entry {} claims {} bytes",
                entry.name, entry.raw_len
            )));
        }
        if !entry.compression.needs_decompression() && entry.stored_len != entry.raw_len {
            return Err(AssetError::Corrupt(format!(
                "stored entry {} has mismatched lengths",
                entry.name
            )));
        }

        entries.insert(entry.name.clone(), entry);
    }

    Ok(entries)
}

/// Builds pack files
#[derive(Debug)]
pub struct PackBuilder {
    compression: CompressionType,
    level: i32,
    pending: Vec<(String, CompressionType, Vec<u8>)>,
}

impl PackBuilder {
    /// Creates a builder whose entries default to `compression`
    pub fn new(compression: CompressionType) -> Self {
        Self {
            compression,
            level: compression.default_level(),
            pending: Vec::new(),
        }
    }

    /// Overrides the compression level
    pub fn level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    /// Adds an entry with the builder's default compression
    pub fn add(&mut self, name: &str, bytes: Vec<u8>) -> Result<&mut Self> {
        let compression = self.compression;
        self.add_with(name, bytes, compression)
    }

    /// Adds an entry with an explicit compression
    pub fn add_with(
        &mut self,
        name: &str,
        bytes: Vec<u8>,
        compression: CompressionType,
    ) -> Result<&mut Self> {
        validate_name(name)?;
        if name.len() > u16::MAX as usize {
            return Err(AssetError::InvalidName(name.to_string()));
        }
        self.pending.retain(|(n, _, _)| n != name);
        self.pending.push((name.to_string(), compression, bytes));
        Ok(self)
    }

    /// Adds a host file under the given asset name
    pub fn add_file<P: AsRef<Path>>(&mut self, name: &str, path: P) -> Result<&mut Self> {
        let bytes = std::fs::read(path)?;
        self.add(name, bytes)
    }

    /// Writes the pack and returns its index
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<Vec<PackEntry>> {
        let mut payloads = Vec::with_capacity(self.pending.len());
        for (name, compression, raw) in &self.pending {
            // Empty payloads are always stored
            let compression = if raw.is_empty() {
                CompressionType::None
            } else {
                *compression
            };
            let stored = compress::compress(compression, raw, self.level)?;
            payloads.push((name, compression, stored, raw.len() as u64, crc32c::crc32c(raw)));
        }

        let index_size: usize = payloads
            .iter()
            .map(|(name, ..)| ENTRY_FIXED_SIZE + name.len())
            .sum();
        let mut offset = (HEADER_SIZE + index_size) as u64;

        let mut entries = Vec::with_capacity(payloads.len());
        for (name, compression, stored, raw_len, crc) in &payloads {
            entries.push(PackEntry {
                name: (*name).clone(),
                compression: *compression,
                offset,
                stored_len: stored.len() as u64,
                raw_len: *raw_len,
                crc32c: *crc,
            });
            offset += stored.len() as u64;
        }

        let mut out = BufWriter::new(File::create(path.as_ref())?);
        out.write_all(&PACK_MAGIC)?;
        out.write_u32::<LittleEndian>(PACK_VERSION)?;
        out.write_u32::<LittleEndian>(entries.len() as u32)?;
        for entry in &entries {
            out.write_u16::<LittleEndian>(entry.name.len() as u16)?;
            out.write_all(entry.name.as_bytes())?;
            out.write_u8(entry.compression.to_u8())?;
            out.write_u64::<LittleEndian>(entry.offset)?;
            out.write_u64::<LittleEndian>(entry.stored_len)?;
            out.write_u64::<LittleEndian>(entry.raw_len)?;
            out.write_u32::<LittleEndian>(entry.crc32c)?;
        }
        for (_, _, stored, _, _) in &payloads {
            out.write_all(stored)?;
        }
        out.flush()?;

        Ok(entries)
    }
}
