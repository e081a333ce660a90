//! Path/handle resolution
//!
//! Turns a [`SourceRef`] into a [`Handle`] a read strategy can open. Asset
//! names resolve against a borrowed container, file names against the data
//! directory by plain concatenation. Nothing is cached between calls so every
//! benchmark starts cold.

use crate::assets::AssetContainer;
use crate::error::{BenchError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// What a benchmark reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum SourceRef {
    /// An asset inside the container
    Asset(String),
    /// A file inside the data directory
    File(String),
}

impl SourceRef {
    pub fn is_asset(&self) -> bool {
        matches!(self, Self::Asset(_))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Asset(name) | Self::File(name) => name,
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asset(name) => write!(f, "asset:{}", name),
            Self::File(name) => write!(f, "file:{}", name),
        }
    }
}

/// A resolved, not yet opened, source
///
/// Opening happens inside the strategy so that its cost is measured.
#[derive(Clone)]
pub enum Handle<'a> {
    Asset {
        container: &'a dyn AssetContainer,
        name: String,
    },
    File(PathBuf),
}

impl Handle<'_> {
    /// Human-readable identifier for log lines
    pub fn describe(&self) -> String {
        match self {
            Self::Asset { name, .. } => format!("asset:{}", name),
            Self::File(path) => path.display().to_string(),
        }
    }

    pub fn is_asset(&self) -> bool {
        matches!(self, Self::Asset { .. })
    }
}

impl fmt::Debug for Handle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Resolves sources against an optional container and data directory
#[derive(Clone, Copy, Default)]
pub struct Resolver<'a> {
    container: Option<&'a dyn AssetContainer>,
    data_dir: Option<&'a Path>,
}

impl<'a> Resolver<'a> {
    pub fn new(container: Option<&'a dyn AssetContainer>, data_dir: Option<&'a Path>) -> Self {
        Self {
            container,
            data_dir,
        }
    }

    /// Returns the full path a file name maps to, without checking it exists
    pub fn file_path(&self, name: &str) -> Result<PathBuf> {
        let data_dir = self.data_dir.ok_or_else(|| {
            BenchError::InvalidArgument("no data directory supplied".to_string())
        })?;
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(BenchError::InvalidArgument(format!(
                "file name must not contain separators: {:?}",
                name
            )));
        }
        Ok(data_dir.join(name))
    }

    /// Resolves a source, failing with `NotFound` if it does not exist
    pub fn resolve(&self, source: &SourceRef) -> Result<Handle<'a>> {
        match source {
            SourceRef::Asset(name) => {
                let container = self.container.ok_or_else(|| {
                    BenchError::InvalidArgument("no asset container supplied".to_string())
                })?;
                if !container.contains(name) {
                    return Err(BenchError::NotFound(format!("asset {}", name)));
                }
                Ok(Handle::Asset {
                    container,
                    name: name.clone(),
                })
            }
            SourceRef::File(name) => {
                let path = self.file_path(name)?;
                match path.try_exists() {
                    Ok(true) if path.is_file() => Ok(Handle::File(path)),
                    Ok(true) => Err(BenchError::InvalidArgument(format!(
                        "{} is not a regular file",
                        path.display()
                    ))),
                    Ok(false) => Err(BenchError::NotFound(path.display().to_string())),
                    Err(e) => Err(BenchError::io(path, e)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssets;

    #[test]
    fn test_resolve_asset() {
        let assets = MemoryAssets::new().with("sample.dat", vec![1, 2, 3]).unwrap();
        let resolver = Resolver::new(Some(&assets), None);

        let handle = resolver
            .resolve(&SourceRef::Asset("sample.dat".to_string()))
            .unwrap();
        assert!(handle.is_asset());
        assert_eq!(handle.describe(), "asset:sample.dat");
    }

    #[test]
    fn test_missing_asset_is_not_found() {
        let assets = MemoryAssets::new();
        let resolver = Resolver::new(Some(&assets), None);
        let err = resolver
            .resolve(&SourceRef::Asset("nope".to_string()))
            .unwrap_err();
        assert!(matches!(err, BenchError::NotFound(_)));
    }

    #[test]
    fn test_resolve_file_by_concatenation() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("local_content.txt"), b"x").unwrap();
        let resolver = Resolver::new(None, Some(dir.path()));

        let handle = resolver
            .resolve(&SourceRef::File("local_content.txt".to_string()))
            .unwrap();
        match handle {
            Handle::File(path) => assert_eq!(path, dir.path().join("local_content.txt")),
            other => panic!("unexpected handle {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = Resolver::new(None, Some(dir.path()));
        let err = resolver
            .resolve(&SourceRef::File("local_content.txt".to_string()))
            .unwrap_err();
        assert!(matches!(err, BenchError::NotFound(_)));
    }

    #[test]
    fn test_missing_roots_are_invalid() {
        let resolver = Resolver::default();
        assert!(matches!(
            resolver.resolve(&SourceRef::File("a".to_string())),
            Err(BenchError::InvalidArgument(_))
        ));
        assert!(matches!(
            resolver.resolve(&SourceRef::Asset("a".to_string())),
            Err(BenchError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_file_name_with_separator_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = Resolver::new(None, Some(dir.path()));
        assert!(resolver.file_path("../etc/passwd").is_err());
        assert!(resolver.file_path("").is_err());
    }

    #[test]
    fn test_directory_is_not_a_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let resolver = Resolver::new(None, Some(dir.path()));
        assert!(matches!(
            resolver.resolve(&SourceRef::File("sub".to_string())),
            Err(BenchError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_source_ref_display_and_serde() {
        let source = SourceRef::File("local_content.txt".to_string());
        assert_eq!(source.to_string(), "file:local_content.txt");
        assert!(!source.is_asset());
        let json = serde_json::to_string(&source).unwrap();
        assert_eq!(json, r#"{"kind":"file","name":"local_content.txt"}"#);
    }
}
