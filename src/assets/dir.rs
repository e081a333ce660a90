//! Directory-backed asset container
//!
//! Serves every regular file below a root directory as an asset. Opened
//! assets are memory mapped, so whole-buffer access does not copy.

use super::{Asset, AssetContainer, AssetError, Result, validate_name};
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// An asset container rooted at a host directory
#[derive(Debug, Clone)]
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    /// Opens a directory as an asset container
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(AssetError::NotFound(root.display().to_string()));
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn path_of(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }

    fn collect(dir: &Path, prefix: &str, out: &mut Vec<String>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            let full = if prefix.is_empty() {
                name
            } else {
                format!("{}/{}", prefix, name)
            };
            match entry.file_type() {
                Ok(ft) if ft.is_dir() => Self::collect(&entry.path(), &full, out),
                Ok(ft) if ft.is_file() => out.push(full),
                _ => {}
            }
        }
    }
}

impl AssetContainer for DirAssets {
    fn open(&self, name: &str) -> Result<Asset> {
        let path = self.path_of(name)?;
        let file = File::open(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AssetError::NotFound(name.to_string()),
            _ => AssetError::Io(e),
        })?;

        let len = file.metadata()?.len();
        if len == 0 {
            // Zero-length files cannot be mapped
            return Ok(Asset::empty(name));
        }

        // SAFETY: assets are read-only inputs; the mapping is private and not
        // expected to be truncated while a benchmark holds it.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Asset::mapped(name, mmap))
    }

    fn contains(&self, name: &str) -> bool {
        self.path_of(name).map(|p| p.is_file()).unwrap_or(false)
    }

    fn list(&self) -> Vec<String> {
        let mut names = Vec::new();
        Self::collect(&self.root, "", &mut names);
        names.sort();
        names
    }
}
