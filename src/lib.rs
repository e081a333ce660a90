//! Asset Read Bench
//!
//! A native I/O benchmark engine that compares reading a payload bundled in
//! an application's asset container against reading the same payload after
//! it has been extracted to private storage.
//!
//! # Features
//!
//! - Nine read strategies, from a bare open to chunked memory-mapped copies
//! - Directory and single-file packed asset containers (zlib, zstd, lz4)
//! - Idempotent extraction with SHA-256 manifests
//! - Monotonic-clock timing with structured results
//! - A C ABI for embedding in a host application
//!
//! # Architecture
//!
//! - [`assets`]: Asset container abstraction and the pack format
//! - [`source`]: Resolution of asset and file names into openable handles
//! - [`strategy`]: The read strategies and piece planning
//! - [`timing`]: Timing harness and result aggregation
//! - [`engine`]: Dispatch surface, extraction and verification
//! - [`ffi`]: C-compatible entry points

pub mod assets;
pub mod config;
pub mod engine;
pub mod error;
pub mod ffi;
pub mod generate;
pub mod logging;
pub mod source;
pub mod strategy;
pub mod timing;

pub use assets::{
    AssetContainer, AssetError, CompressionType, DirAssets, MemoryAssets, PackAssets, PackBuilder,
};
pub use config::BenchConfig;
pub use engine::{Action, Dispatched, Engine, InitReport};
pub use error::{BenchError, ErrorKind, Result};
pub use source::SourceRef;
pub use strategy::{PieceCount, PieceOrder, StrategyKind};
pub use timing::{BenchmarkResult, Summary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
