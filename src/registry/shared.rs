//! RegistryCache: share one registry per resolved root directory.
//!
//! Asking twice for the same root returns the same `Arc` without running
//! discovery again. Different roots get different registries. Re-scanning
//! only happens through [`RegistryCache::rebuild`].

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;

use super::{resolve_root, JobCatalog, JobRegistry};
use crate::config::DiscoveryConfig;

/// Registries keyed by resolved root path.
#[derive(Debug, Default)]
pub struct RegistryCache {
    registries: DashMap<PathBuf, Arc<JobRegistry>>,
    config: DiscoveryConfig,
}

impl RegistryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `config` for every discovery this cache runs.
    pub fn with_config(config: DiscoveryConfig) -> Self {
        Self {
            registries: DashMap::new(),
            config,
        }
    }

    /// Return the registry for `root`, discovering it on first use.
    pub fn get_or_discover(&self, root: impl AsRef<Path>, catalog: &JobCatalog) -> Arc<JobRegistry> {
        let key = resolve_root(root.as_ref());
        let entry = self
            .registries
            .entry(key.clone())
            .or_insert_with(|| Arc::new(JobRegistry::discover_with(&key, catalog, &self.config)));
        Arc::clone(entry.value())
    }

    /// Discover `root` again and replace the cached registry.
    ///
    /// Holders of the previous `Arc` keep using the old registry.
    pub fn rebuild(&self, root: impl AsRef<Path>, catalog: &JobCatalog) -> Arc<JobRegistry> {
        let key = resolve_root(root.as_ref());
        let registry = Arc::new(JobRegistry::discover_with(&key, catalog, &self.config));
        self.registries.insert(key, Arc::clone(&registry));
        registry
    }

    pub fn get(&self, root: impl AsRef<Path>) -> Option<Arc<JobRegistry>> {
        self.registries
            .get(&resolve_root(root.as_ref()))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Drop the cached registry for `root`.
    pub fn evict(&self, root: impl AsRef<Path>) -> Option<Arc<JobRegistry>> {
        self.registries
            .remove(&resolve_root(root.as_ref()))
            .map(|(_, registry)| registry)
    }

    pub fn len(&self) -> usize {
        self.registries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registries.is_empty()
    }
}
