//! Pack entry codecs
//!
//! Each entry in a pack is stored with one codec. Entries are inflated in full
//! when an asset is opened, so strategies never see codec framing.

use super::{AssetError, Result};
use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::str::FromStr;

/// Codec tag stored in a pack entry header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionType {
    None,
    Zlib,
    Zstd,
    /// lz4 block with a little-endian u32 length prefix
    Lz4,
}

impl CompressionType {
    const TAGS: [Self; 4] = [Self::None, Self::Zlib, Self::Zstd, Self::Lz4];

    /// Maps an entry header tag byte to a codec
    pub const fn from_u8(tag: u8) -> Result<Self> {
        if (tag as usize) < Self::TAGS.len() {
            Ok(Self::TAGS[tag as usize])
        } else {
            Err(AssetError::UnsupportedCompression(tag))
        }
    }

    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// `false` for entries stored verbatim
    #[inline]
    pub const fn needs_decompression(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Level the pack builder uses unless told otherwise
    pub const fn default_level(&self) -> i32 {
        match self {
            Self::Zlib => 6,
            Self::Zstd => 3,
            Self::None | Self::Lz4 => 0,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Zlib => "zlib",
            Self::Zstd => "zstd",
            Self::Lz4 => "lz4",
        }
    }
}

impl FromStr for CompressionType {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        let alias = match name.as_str() {
            "store" | "stored" => "none",
            "deflate" => "zlib",
            other => other,
        };
        Self::TAGS
            .into_iter()
            .find(|ct| ct.label() == alias)
            .ok_or_else(|| AssetError::Compression(format!("unknown codec {:?}", s)))
    }
}

fn codec_err(
    ct: CompressionType,
    stage: &'static str,
) -> impl FnOnce(std::io::Error) -> AssetError {
    move |e| AssetError::Compression(format!("{} {}: {}", ct.label(), stage, e))
}

/// Streams a decoder into a buffer, stopping one byte past `raw_len`
///
/// The initial capacity is capped by the stored size so a lying entry table
/// cannot force a large allocation up front.
fn inflate<R: Read>(decoder: R, stored_len: usize, raw_len: usize) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(raw_len.min(stored_len.saturating_mul(4)));
    let limit = (raw_len as u64).saturating_add(1);
    decoder.take(limit).read_to_end(&mut out)?;
    Ok(out)
}

/// Encodes `raw` for storage in a pack
///
/// `level` is clamped to 0..=9 for zlib and ignored for lz4.
pub fn compress(ct: CompressionType, raw: &[u8], level: i32) -> Result<Vec<u8>> {
    match ct {
        CompressionType::None => Ok(raw.to_vec()),
        CompressionType::Zlib => {
            let level = flate2::Compression::new(level.clamp(0, 9) as u32);
            let mut enc =
                flate2::write::ZlibEncoder::new(Vec::with_capacity(raw.len() / 2), level);
            enc.write_all(raw).map_err(codec_err(ct, "encode"))?;
            enc.finish().map_err(codec_err(ct, "encode"))
        }
        CompressionType::Zstd => zstd::bulk::compress(raw, level).map_err(codec_err(ct, "encode")),
        CompressionType::Lz4 => {
            lz4::block::compress(raw, None, true).map_err(codec_err(ct, "encode"))
        }
    }
}

/// Decodes a stored entry back to exactly `raw_len` bytes
///
/// A length mismatch after decoding means the entry table and the payload
/// disagree, which is reported as corruption rather than a codec error.
/// Output is never allowed to grow past `raw_len + 1` bytes.
pub fn decompress(ct: CompressionType, stored: &[u8], raw_len: usize) -> Result<Vec<u8>> {
    let raw = match ct {
        CompressionType::None => stored.to_vec(),
        CompressionType::Zlib => {
            let decoder = flate2::read::ZlibDecoder::new(stored);
            inflate(decoder, stored.len(), raw_len).map_err(codec_err(ct, "decode"))?
        }
        CompressionType::Zstd => {
            let decoder =
                zstd::stream::read::Decoder::new(stored).map_err(codec_err(ct, "decode"))?;
            inflate(decoder, stored.len(), raw_len).map_err(codec_err(ct, "decode"))?
        }
        CompressionType::Lz4 => {
            // The block allocates whatever its prefix claims
            let prefix = stored
                .get(..4)
                .map(LittleEndian::read_u32)
                .ok_or_else(|| AssetError::Corrupt("lz4 entry has no length prefix".into()))?;
            if prefix as usize != raw_len {
                return Err(AssetError::Corrupt(format!(
                    "lz4 entry prefix says {} bytes, table says {}",
                    prefix, raw_len
                )));
            }
            lz4::block::decompress(stored, None).map_err(codec_err(ct, "decode"))?
        }
    };

    if raw.len() == raw_len {
        Ok(raw)
    } else {
        Err(AssetError::Corrupt(format!(
            "{} entry inflated to {} bytes, table says {}",
            ct.label(),
            raw.len(),
            raw_len
        )))
    }
}
