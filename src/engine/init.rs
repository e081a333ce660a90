//! Asset extraction into the data directory
//!
//! The asset is written to a temporary file next to the target and renamed
//! into place, so a reader never sees a half-written file. A target whose
//! SHA-256 already matches the asset is left untouched.

use crate::assets::{AssetContainer, AssetError};
use crate::error::{BenchError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Suffix of the manifest written beside the extracted file
pub const MANIFEST_SUFFIX: &str = ".manifest.json";

/// Record of the last extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionManifest {
    /// Asset the file was extracted from
    pub asset_name: String,
    /// Extracted file name
    pub file_name: String,
    /// Size in bytes
    pub bytes: u64,
    /// SHA-256 of the contents, lowercase hex
    pub sha256: String,
    /// Extraction time, RFC 3339
    pub extracted_at: String,
}

/// Outcome of `init`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitReport {
    pub path: PathBuf,
    pub bytes: u64,
    pub sha256: String,
    /// True if the target already held identical contents
    pub skipped: bool,
}

/// SHA-256 of a byte slice as lowercase hex
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// SHA-256 of a file as lowercase hex, streaming its contents
pub fn file_sha256_hex(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| BenchError::io(path, e))?;
    let mut hasher = Sha256::new();
    let mut block = vec![0u8; 64 * 1024];
    loop {
        let n = match file.read(&mut block) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(BenchError::io(path, e)),
        };
        hasher.update(&block[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Path of the manifest for an extracted file
pub fn manifest_path(data_dir: &Path, file_name: &str) -> PathBuf {
    data_dir.join(format!("{}{}", file_name, MANIFEST_SUFFIX))
}

/// Reads the manifest, if any
pub fn read_manifest(data_dir: &Path, file_name: &str) -> Result<Option<ExtractionManifest>> {
    let path = manifest_path(data_dir, file_name);
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(BenchError::io(path, e)),
    };
    let manifest = serde_json::from_str(&content)
        .map_err(|e| BenchError::io_failure(&path, format!("bad manifest: {}", e)))?;
    Ok(Some(manifest))
}

fn write_manifest(data_dir: &Path, manifest: &ExtractionManifest) -> Result<()> {
    let path = manifest_path(data_dir, &manifest.file_name);
    let content = serde_json::to_string_pretty(manifest)
        .map_err(|e| BenchError::io_failure(&path, e.to_string()))?;
    write_atomic(&path, content.as_bytes())
}

/// Writes `data` to a sibling temp file and renames it over `path`
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));

    let written = (|| -> std::io::Result<()> {
        let mut out = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp)?;
        out.write_all(data)?;
        out.sync_all()?;
        drop(out);
        std::fs::rename(&tmp, path)
    })();

    if let Err(e) = written {
        let _ = std::fs::remove_file(&tmp);
        return Err(BenchError::io(path, e));
    }
    Ok(())
}

/// Extracts `asset_name` from the container to `data_dir/file_name`
pub fn extract(
    container: &dyn AssetContainer,
    asset_name: &str,
    data_dir: &Path,
    file_name: &str,
) -> Result<InitReport> {
    let asset = container.open(asset_name).map_err(|e| match e {
        AssetError::NotFound(name) => BenchError::NotFound(format!("asset {}", name)),
        other => BenchError::Asset(other),
    })?;
    let bytes = asset.len();
    let sha256 = sha256_hex(asset.buffer());

    std::fs::create_dir_all(data_dir).map_err(|e| BenchError::io(data_dir, e))?;
    let target = data_dir.join(file_name);

    let up_to_date = target.is_file() && file_sha256_hex(&target)? == sha256;
    if !up_to_date {
        write_atomic(&target, asset.buffer())?;
    }
    drop(asset);

    let manifest_current = read_manifest(data_dir, file_name)
        .ok()
        .flatten()
        .is_some_and(|m| m.sha256 == sha256 && m.asset_name == asset_name);
    if !up_to_date || !manifest_current {
        write_manifest(
            data_dir,
            &ExtractionManifest {
                asset_name: asset_name.to_string(),
                file_name: file_name.to_string(),
                bytes,
                sha256: sha256.clone(),
                extracted_at: chrono::Utc::now().to_rfc3339(),
            },
        )?;
    }

    Ok(InitReport {
        path: target,
        bytes,
        sha256,
        skipped: up_to_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssets;
    use crate::error::ErrorKind;

    fn assets(data: &[u8]) -> MemoryAssets {
        MemoryAssets::new()
            .with("random_content.txt", data.to_vec())
            .unwrap()
    }

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_extract_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let data: Vec<u8> = (0..100_000u32).map(|i| (i % 94) as u8 + b'!').collect();
        let container = assets(&data);

        let report = extract(&container, "random_content.txt", dir.path(), "local_content.txt")
            .unwrap();
        assert!(!report.skipped);
        assert_eq!(report.bytes, data.len() as u64);
        assert_eq!(std::fs::read(&report.path).unwrap(), data);
        assert_eq!(file_sha256_hex(&report.path).unwrap(), sha256_hex(&data));

        let manifest = read_manifest(dir.path(), "local_content.txt")
            .unwrap()
            .unwrap();
        assert_eq!(manifest.sha256, report.sha256);
        assert_eq!(manifest.bytes, data.len() as u64);
    }

    #[test]
    fn test_extract_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let container = assets(b"same bytes every time");

        let first =
            extract(&container, "random_content.txt", dir.path(), "local_content.txt").unwrap();
        let second =
            extract(&container, "random_content.txt", dir.path(), "local_content.txt").unwrap();

        assert!(!first.skipped);
        assert!(second.skipped);
        assert_eq!(first.sha256, second.sha256);
        assert_eq!(
            std::fs::read(&second.path).unwrap(),
            b"same bytes every time"
        );

        // Only the file, its manifest, and nothing left over from temp writes
        let mut names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec!["local_content.txt", "local_content.txt.manifest.json"]
        );
    }

    #[test]
    fn test_extract_repairs_modified_file() {
        let dir = tempfile::tempdir().unwrap();
        let container = assets(b"original");
        extract(&container, "random_content.txt", dir.path(), "local_content.txt").unwrap();

        std::fs::write(dir.path().join("local_content.txt"), b"tampered!").unwrap();
        let report =
            extract(&container, "random_content.txt", dir.path(), "local_content.txt").unwrap();
        assert!(!report.skipped);
        assert_eq!(std::fs::read(&report.path).unwrap(), b"original");
    }

    #[test]
    fn test_extract_missing_asset() {
        let dir = tempfile::tempdir().unwrap();
        let container = MemoryAssets::new();
        let err = extract(&container, "random_content.txt", dir.path(), "local_content.txt")
            .unwrap_err();
        assert!(matches!(err, BenchError::NotFound(_)));
        assert!(!dir.path().join("local_content.txt").exists());
    }

    #[test]
    fn test_extract_creates_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("files").join("bench");
        let report =
            extract(&assets(b"x"), "random_content.txt", &nested, "local_content.txt").unwrap();
        assert!(report.path.starts_with(&nested));
    }

    #[test]
    fn test_extract_into_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"").unwrap();
        let err = extract(&assets(b"x"), "random_content.txt", &blocker, "local_content.txt")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
    }

    #[cfg(unix)]
    #[test]
    fn test_extract_into_read_only_dir_is_permission_denied() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).unwrap();

        // Privileged users write through the mode bits
        if std::fs::write(locked.join("write_check"), b"").is_ok() {
            std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = extract(&assets(b"x"), "random_content.txt", &locked, "local_content.txt");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert!(!locked.join("local_content.txt").exists());
    }
}
