//! In-memory asset container

use super::{Asset, AssetContainer, AssetError, Result, SharedBytes, validate_name};
use std::collections::BTreeMap;
use std::sync::Arc;

/// An asset container holding its contents in memory
#[derive(Default, Clone)]
pub struct MemoryAssets {
    entries: BTreeMap<String, SharedBytes>,
}

impl MemoryAssets {
    /// Creates an empty container
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an asset
    pub fn insert(&mut self, name: &str, bytes: Vec<u8>) -> Result<()> {
        validate_name(name)?;
        self.entries.insert(name.to_string(), Arc::new(bytes));
        Ok(())
    }

    /// Builder-style [`MemoryAssets::insert`]
    pub fn with(mut self, name: &str, bytes: Vec<u8>) -> Result<Self> {
        self.insert(name, bytes)?;
        Ok(self)
    }
}

impl AssetContainer for MemoryAssets {
    fn open(&self, name: &str) -> Result<Asset> {
        let bytes = self
            .entries
            .get(name)
            .ok_or_else(|| AssetError::NotFound(name.to_string()))?;
        let len = (**bytes).as_ref().len();
        Ok(Asset::shared(name, Arc::clone(bytes), 0, len))
    }

    fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn list(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

impl std::fmt::Debug for MemoryAssets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryAssets")
            .field("entries", &self.list())
            .finish()
    }
}
