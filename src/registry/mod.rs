//! registry: the table of routable jobs for one root directory.
//!
//! A `JobRegistry` is an explicit value owned by the caller. Build it once at
//! startup, then share it behind an `Arc`; once shared it is read-only.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use jobrouter::{JobCatalog, JobRegistry, Router};
//!
//! let catalog = JobCatalog::from_declarations(jobrouter::jobs![addition, count_up])?;
//!
//! // Expose the handlers listed by the manifests under ./jobs
//! let registry = Arc::new(JobRegistry::discover("./jobs", &catalog));
//!
//! // Or expose every catalog entry directly
//! let registry = Arc::new(JobRegistry::from_catalog("./jobs", &catalog)?);
//!
//! let router = Router::new(registry);
//! ```

mod catalog;
mod discovery;
mod shared;

pub use catalog::JobCatalog;
pub use discovery::{Discovery, DiscoveryReport};
pub use shared::RegistryCache;

use std::path::{Path, PathBuf};

use crate::config::{DiscoveryConfig, DuplicatePolicy};
use crate::error::JobError;
use crate::job::{register, JobDeclaration, JobDescriptor, JobSummary};

/// Resolve a root directory to the path registries are keyed by.
///
/// Existing directories are canonicalized; anything else is made absolute.
pub fn resolve_root(root: &Path) -> PathBuf {
    std::fs::canonicalize(root)
        .or_else(|_| std::path::absolute(root))
        .unwrap_or_else(|_| root.to_path_buf())
}

/// All jobs discovered under one root, in registration order.
#[derive(Debug)]
pub struct JobRegistry {
    root: PathBuf,
    entries: Vec<JobDescriptor>,
    duplicate_policy: DuplicatePolicy,
    report: DiscoveryReport,
}

impl JobRegistry {
    /// Create an empty registry for `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: resolve_root(root.as_ref()),
            entries: Vec::new(),
            duplicate_policy: DuplicatePolicy::default(),
            report: DiscoveryReport::default(),
        }
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Build a registry by discovering manifests under `root` with default settings.
    pub fn discover(root: impl AsRef<Path>, catalog: &JobCatalog) -> Self {
        Self::discover_with(root, catalog, &DiscoveryConfig::default())
    }

    /// Build a registry by discovering manifests under `root`.
    ///
    /// Never fails as a whole; per-unit failures are in [`JobRegistry::report`].
    pub fn discover_with(
        root: impl AsRef<Path>,
        catalog: &JobCatalog,
        config: &DiscoveryConfig,
    ) -> Self {
        let mut registry = Self::new(root).with_duplicate_policy(config.duplicate_policy);
        let root = registry.root.clone();
        registry.report = Discovery::new(&root, catalog, config).run(&mut registry);
        registry
    }

    /// Register every catalog entry, in declaration order, without scanning.
    pub fn from_catalog(root: impl AsRef<Path>, catalog: &JobCatalog) -> Result<Self, JobError> {
        let mut registry = Self::new(root);
        for descriptor in catalog.iter() {
            registry.insert(descriptor.clone())?;
        }
        Ok(registry)
    }

    /// Validate a declaration and append it.
    pub fn register(&mut self, declaration: JobDeclaration) -> Result<&JobDescriptor, JobError> {
        let descriptor = register(declaration)?;
        self.insert(descriptor)
    }

    /// Append a descriptor.
    ///
    /// A name that is already registered is logged under
    /// `DuplicatePolicy::Warn` (the earlier entry keeps winning lookups) and
    /// refused under `DuplicatePolicy::Reject`.
    pub fn insert(&mut self, descriptor: JobDescriptor) -> Result<&JobDescriptor, JobError> {
        if let Some(existing) = self.find(descriptor.name()) {
            match self.duplicate_policy {
                DuplicatePolicy::Reject => {
                    return Err(JobError::DuplicateJob {
                        name: descriptor.name().to_string(),
                    });
                }
                DuplicatePolicy::Warn => {
                    tracing::warn!(
                        job = descriptor.name(),
                        existing = existing.ident(),
                        shadowed = descriptor.ident(),
                        root = %self.root.display(),
                        "duplicate job name, lookups resolve to the first registration"
                    );
                }
            }
        }
        self.entries.push(descriptor);
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// All descriptors in registration order.
    pub fn list(&self) -> &[JobDescriptor] {
        &self.entries
    }

    /// First descriptor registered under `name`.
    pub fn find(&self, name: &str) -> Option<&JobDescriptor> {
        self.entries.iter().find(|d| d.name() == name)
    }

    /// The resolved root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|d| d.name()).collect()
    }

    /// Serializable listing of every job.
    pub fn summaries(&self) -> Vec<JobSummary> {
        self.entries.iter().map(JobDescriptor::summary).collect()
    }

    /// What the discovery run found. Empty for registries not built by discovery.
    pub fn report(&self) -> &DiscoveryReport {
        &self.report
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
