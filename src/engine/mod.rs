//! Dispatch surface
//!
//! [`Engine`] exposes one operation per benchmark the host can trigger.
//! Every `*_go` call validates its arguments, resolves the source, times the
//! strategy and emits exactly one log line: `info` with the measurement on
//! success, `error` with the strategy and source on failure.

pub mod action;
pub mod init;
pub mod request;

use crate::assets::AssetContainer;
use crate::config::BenchConfig;
use crate::error::{BenchError, Result};
use crate::source::{Handle, Resolver, SourceRef};
use crate::strategy::{self, ReadOutcome, StrategyKind};
use crate::timing::{self, BenchmarkResult};
use std::path::Path;

pub use action::{Action, Target};
pub use init::{ExtractionManifest, InitReport};
pub use request::ReadRequest;

/// Log target of benchmark result lines
pub const LOG_TARGET: &str = "bench";

/// What [`Engine::dispatch`] produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    Init(InitReport),
    Bench(BenchmarkResult),
}

/// Benchmark engine bound to an asset container and a data directory
///
/// Both roots are borrowed. Either may be absent, in which case operations
/// needing it fail with `InvalidArgument`.
pub struct Engine<'a> {
    config: BenchConfig,
    assets: Option<&'a dyn AssetContainer>,
    data_dir: Option<&'a Path>,
}

impl<'a> Engine<'a> {
    pub fn new(
        assets: Option<&'a dyn AssetContainer>,
        data_dir: Option<&'a Path>,
        config: BenchConfig,
    ) -> Self {
        Self {
            config,
            assets,
            data_dir,
        }
    }

    pub fn with_assets(mut self, assets: &'a dyn AssetContainer) -> Self {
        self.assets = Some(assets);
        self
    }

    pub fn with_data_dir(mut self, data_dir: &'a Path) -> Self {
        self.data_dir = Some(data_dir);
        self
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    fn resolver(&self) -> Resolver<'a> {
        Resolver::new(self.assets, self.data_dir)
    }

    fn asset_source(&self) -> SourceRef {
        SourceRef::Asset(self.config.asset_name.clone())
    }

    fn file_source(&self) -> SourceRef {
        SourceRef::File(self.config.data_file_name.clone())
    }

    /// Extracts the benchmark asset into the data directory
    pub fn init(&self) -> Result<InitReport> {
        let tag = self.config.log_tag.as_str();
        let result = self.try_init();
        match &result {
            Ok(report) => tracing::info!(
                target: LOG_TARGET,
                tag,
                path = %report.path.display(),
                bytes = report.bytes,
                sha256 = %report.sha256,
                skipped = report.skipped,
                "init"
            ),
            Err(e) => tracing::error!(
                target: LOG_TARGET,
                tag,
                asset = %self.config.asset_name,
                error = %e,
                "init failed"
            ),
        }
        result
    }

    fn try_init(&self) -> Result<InitReport> {
        let assets = self
            .assets
            .ok_or_else(|| BenchError::InvalidArgument("no asset container supplied".to_string()))?;
        let data_dir = self
            .data_dir
            .ok_or_else(|| BenchError::InvalidArgument("no data directory supplied".to_string()))?;
        init::extract(
            assets,
            &self.config.asset_name,
            data_dir,
            &self.config.data_file_name,
        )
    }

    pub fn asset_read_one_go(&self) -> Result<BenchmarkResult> {
        self.go(StrategyKind::FullRead, self.asset_source(), None)
    }

    pub fn asset_read_multiple_go(&self, pieces: i64) -> Result<BenchmarkResult> {
        self.go(StrategyKind::ChunkedRead, self.asset_source(), Some(pieces))
    }

    pub fn open_one_go(&self) -> Result<BenchmarkResult> {
        self.go(StrategyKind::OpenOnly, self.file_source(), None)
    }

    pub fn open_no_stat_one_go(&self) -> Result<BenchmarkResult> {
        self.go(StrategyKind::OpenNoStat, self.file_source(), None)
    }

    pub fn file_read_one_go(&self) -> Result<BenchmarkResult> {
        self.go(StrategyKind::FullRead, self.file_source(), None)
    }

    pub fn file_read_multiple_go(&self, pieces: i64) -> Result<BenchmarkResult> {
        self.go(StrategyKind::ChunkedRead, self.file_source(), Some(pieces))
    }

    pub fn stream_file_read_one_go(&self) -> Result<BenchmarkResult> {
        self.go(StrategyKind::StreamedRead, self.file_source(), None)
    }

    pub fn stream_file_read_multiple_go(&self, pieces: i64) -> Result<BenchmarkResult> {
        self.go(
            StrategyKind::StreamedChunkedRead,
            self.file_source(),
            Some(pieces),
        )
    }

    pub fn fopen_one_go(&self) -> Result<BenchmarkResult> {
        self.go(StrategyKind::BufferedOpenRead, self.file_source(), None)
    }

    pub fn mmap_read_one_go(&self) -> Result<BenchmarkResult> {
        self.go(StrategyKind::MappedRead, self.file_source(), None)
    }

    pub fn mmap_read_multiple_go(&self, pieces: i64) -> Result<BenchmarkResult> {
        self.go(
            StrategyKind::MappedChunkedRead,
            self.file_source(),
            Some(pieces),
        )
    }

    /// Runs an action by value; chunked actions default to the configured
    /// piece count
    pub fn dispatch(&self, action: Action, pieces: Option<i64>) -> Result<Dispatched> {
        let (Some(target), Some(strategy)) = (action.target(), action.strategy()) else {
            return self.init().map(Dispatched::Init);
        };
        let source = match target {
            Target::Asset => self.asset_source(),
            Target::File => self.file_source(),
        };
        let pieces = action
            .takes_pieces()
            .then(|| pieces.unwrap_or(i64::from(self.config.default_pieces)));
        self.go(strategy, source, pieces).map(Dispatched::Bench)
    }

    fn go(
        &self,
        strategy: StrategyKind,
        source: SourceRef,
        pieces: Option<i64>,
    ) -> Result<BenchmarkResult> {
        let tag = self.config.log_tag.as_str();
        let result = self.try_go(strategy, &source, pieces);
        match &result {
            Ok((r, verified)) => tracing::info!(
                target: LOG_TARGET,
                tag,
                strategy = %r.strategy,
                source = %r.source,
                bytes = r.bytes_read,
                pieces = r.pieces,
                elapsed_ms = r.elapsed_ms(),
                verified = *verified,
                "{} took {:.3} ms",
                r.strategy,
                r.elapsed_ms()
            ),
            Err(e) => tracing::error!(
                target: LOG_TARGET,
                tag,
                strategy = %strategy,
                source = %source,
                error = %e,
                "{} failed",
                strategy
            ),
        }
        result.map(|(r, _)| r)
    }

    fn try_go(
        &self,
        strategy: StrategyKind,
        source: &SourceRef,
        pieces: Option<i64>,
    ) -> Result<(BenchmarkResult, bool)> {
        let request = ReadRequest::new(strategy, source.clone(), pieces)?;
        let handle = self.resolver().resolve(&request.source)?;
        let order = self.config.piece_order;

        let (result, outcome) = timing::measure(request.strategy, &request.source, || {
            strategy::run(request.strategy, &handle, request.pieces, order)
        })?;

        let verified = self.config.verify && !strategy.is_open_only();
        if verified {
            verify(&handle, &outcome)?;
        }
        Ok((result, verified))
    }
}

/// Compares the destination buffer against the source by SHA-256
fn verify(handle: &Handle<'_>, outcome: &ReadOutcome) -> Result<()> {
    let actual = init::sha256_hex(&outcome.data);
    let expected = match handle {
        Handle::Asset { container, name } => init::sha256_hex(container.open(name)?.buffer()),
        Handle::File(path) => init::file_sha256_hex(path)?,
    };
    if actual != expected {
        return Err(BenchError::io_failure(
            handle.describe(),
            format!("buffers differ: expected {}, read {}", expected, actual),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssets;
    use crate::error::ErrorKind;
    use crate::strategy::PieceOrder;

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| b'!' + (i % 94) as u8).collect()
    }

    fn assets_with(len: usize) -> MemoryAssets {
        MemoryAssets::new()
            .with("random_content.txt", payload(len))
            .unwrap()
    }

    #[test]
    fn test_file_ops_before_init_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let assets = assets_with(1024);
        let engine = Engine::new(Some(&assets), Some(dir.path()), BenchConfig::default());

        let results = [
            engine.open_one_go(),
            engine.open_no_stat_one_go(),
            engine.file_read_one_go(),
            engine.file_read_multiple_go(10),
            engine.stream_file_read_one_go(),
            engine.stream_file_read_multiple_go(10),
            engine.fopen_one_go(),
            engine.mmap_read_one_go(),
            engine.mmap_read_multiple_go(10),
        ];
        for result in results {
            assert_eq!(result.unwrap_err().kind(), ErrorKind::NotFound);
        }
    }

    #[test]
    fn test_non_positive_pieces_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let assets = assets_with(1024);
        let engine = Engine::new(Some(&assets), Some(dir.path()), BenchConfig::default());
        engine.init().unwrap();

        for n in [0, -1] {
            for result in [
                engine.asset_read_multiple_go(n),
                engine.file_read_multiple_go(n),
                engine.stream_file_read_multiple_go(n),
                engine.mmap_read_multiple_go(n),
            ] {
                assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidArgument);
            }
        }
    }

    #[test]
    fn test_asset_read_in_ten_pieces() {
        let assets = assets_with(1_000_000);
        let engine = Engine::new(Some(&assets), None, BenchConfig::default());

        let result = engine.asset_read_multiple_go(10).unwrap();
        assert_eq!(result.bytes_read, 1_000_000);
        assert_eq!(result.pieces, 10);
        assert!(result.elapsed_nanos > 0);
        assert_eq!(result.strategy, StrategyKind::ChunkedRead);
    }

    #[test]
    fn test_asset_read_in_three_uneven_pieces() {
        let assets = assets_with(1_000_000);
        let engine = Engine::new(Some(&assets), None, BenchConfig::default());

        let result = engine.asset_read_multiple_go(3).unwrap();
        assert_eq!(result.bytes_read, 1_000_000);
        assert_eq!(result.pieces, 3);
    }

    #[test]
    fn test_init_then_every_file_op() {
        let dir = tempfile::tempdir().unwrap();
        let assets = assets_with(300_001);
        let config = BenchConfig {
            verify: true,
            ..Default::default()
        };
        let engine = Engine::new(Some(&assets), Some(dir.path()), config);

        let report = engine.init().unwrap();
        assert_eq!(report.bytes, 300_001);
        assert!(engine.init().unwrap().skipped);

        for action in Action::ALL.into_iter().filter(|a| *a != Action::Init) {
            let result = match engine.dispatch(action, None).unwrap() {
                Dispatched::Bench(r) => r,
                other => panic!("{} produced {:?}", action, other),
            };
            let strategy = action.strategy().unwrap();
            if strategy.is_open_only() {
                assert_eq!(result.bytes_read, 0, "{}", action);
            } else {
                assert_eq!(result.bytes_read, 300_001, "{}", action);
                assert!(result.elapsed_nanos > 0, "{}", action);
            }
            if action.takes_pieces() {
                assert_eq!(result.pieces, 10, "{}", action);
            }
        }
    }

    #[test]
    fn test_shuffled_order_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let assets = assets_with(123_457);
        let config = BenchConfig {
            verify: true,
            piece_order: PieceOrder::Shuffled,
            ..Default::default()
        };
        let engine = Engine::new(Some(&assets), Some(dir.path()), config);
        engine.init().unwrap();

        assert_eq!(engine.file_read_multiple_go(7).unwrap().pieces, 7);
        assert_eq!(engine.mmap_read_multiple_go(7).unwrap().pieces, 7);
        assert_eq!(engine.stream_file_read_multiple_go(7).unwrap().pieces, 7);
        assert_eq!(engine.asset_read_multiple_go(7).unwrap().pieces, 7);
    }

    #[test]
    fn test_dispatch_init_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let assets = assets_with(64);
        let config = BenchConfig {
            default_pieces: 4,
            ..Default::default()
        };
        let engine = Engine::new(None, None, config)
            .with_assets(&assets)
            .with_data_dir(dir.path());

        assert!(matches!(
            engine.dispatch(Action::Init, None).unwrap(),
            Dispatched::Init(_)
        ));
        match engine.dispatch(Action::FileReadMultipleGo, None).unwrap() {
            Dispatched::Bench(r) => assert_eq!(r.pieces, 4),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_roots_are_invalid() {
        let engine = Engine::new(None, None, BenchConfig::default());
        assert_eq!(engine.init().unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            engine.asset_read_one_go().unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            engine.file_read_one_go().unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn test_missing_asset_is_not_found() {
        let assets = MemoryAssets::new();
        let engine = Engine::new(Some(&assets), None, BenchConfig::default());
        assert_eq!(
            engine.asset_read_one_go().unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_verify_detects_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local_content.txt");
        std::fs::write(&path, b"abcdef").unwrap();

        let handle = Handle::File(path);
        let outcome = ReadOutcome::new(b"abcdeX".to_vec(), 1);
        let err = verify(&handle, &outcome).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailure);

        let outcome = ReadOutcome::new(b"abcdef".to_vec(), 1);
        assert!(verify(&handle, &outcome).is_ok());
    }

    #[test]
    fn test_empty_file_reads_zero_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let assets = MemoryAssets::new()
            .with("random_content.txt", Vec::new())
            .unwrap();
        let engine = Engine::new(Some(&assets), Some(dir.path()), BenchConfig::default());
        engine.init().unwrap();

        let result = engine.file_read_multiple_go(10).unwrap();
        assert_eq!(result.bytes_read, 0);
        assert_eq!(result.pieces, 0);
        assert_eq!(engine.file_read_one_go().unwrap().bytes_read, 0);
    }
}
