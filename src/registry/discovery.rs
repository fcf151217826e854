//! Discovery: walk a job directory and load job manifests.
//!
//! Every file under the root with the manifest extension is a unit, except
//! placeholder names (`mod.toml` by default). A unit lists the catalog
//! handlers it exposes:
//!
//! ```toml
//! [[job]]
//! handler = "addition"
//!
//! [[job]]
//! handler = "count_up"
//! name = "number_generator"
//! description = "Generate numbers up to a given number"
//! ```
//!
//! Units load atomically: a unit that fails to read, parse, or resolve
//! contributes no jobs. Failures are logged and recorded in the
//! [`DiscoveryReport`]; discovery always continues with the next unit.

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::catalog::JobCatalog;
use super::JobRegistry;
use crate::config::{DiscoveryConfig, DuplicatePolicy};
use crate::error::JobError;
use crate::job::JobDescriptor;

/// Outcome of one discovery run.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Manifest files found under the root.
    pub total_units: usize,
    pub loaded_units: usize,
    pub failed_units: usize,
    /// Jobs appended to the registry.
    pub registered_jobs: usize,
    /// One `DiscoveryLoad` error per failed unit.
    pub failures: Vec<JobError>,
}

impl DiscoveryReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record_failure(&mut self, error: JobError) {
        warn!(error = %error, "job unit skipped");
        self.failed_units += 1;
        self.failures.push(error);
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    #[serde(default, rename = "job")]
    jobs: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestEntry {
    handler: String,
    name: Option<String>,
    description: Option<String>,
}

/// A discovery pass over one root directory.
pub struct Discovery<'a> {
    root: &'a Path,
    catalog: &'a JobCatalog,
    config: &'a DiscoveryConfig,
}

impl<'a> Discovery<'a> {
    pub fn new(root: &'a Path, catalog: &'a JobCatalog, config: &'a DiscoveryConfig) -> Self {
        Self {
            root,
            catalog,
            config,
        }
    }

    /// Load every unit and append its jobs to `registry`.
    pub fn run(&self, registry: &mut JobRegistry) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();

        if !self.root.is_dir() {
            report.record_failure(JobError::DiscoveryLoad {
                path: self.root.to_path_buf(),
                reason: "root is not a readable directory".to_string(),
            });
            return report;
        }

        let units = self.find_units();
        report.total_units = units.len();
        if units.is_empty() {
            info!(root = %self.root.display(), "no job units found");
            return report;
        }

        for unit in &units {
            let jobs = match self
                .load_unit(unit)
                .and_then(|jobs| self.check_duplicates(unit, registry, jobs))
            {
                Ok(jobs) => jobs,
                Err(e) => {
                    report.record_failure(e);
                    continue;
                }
            };

            report.loaded_units += 1;
            for job in jobs {
                match registry.insert(job) {
                    Ok(desc) => {
                        debug!(unit = %unit.display(), job = desc.name(), "registered job");
                        report.registered_jobs += 1;
                    }
                    Err(e) => warn!(unit = %unit.display(), error = %e, "job not registered"),
                }
            }
        }

        info!(
            root = %self.root.display(),
            units = report.total_units,
            loaded = report.loaded_units,
            failed = report.failed_units,
            jobs = report.registered_jobs,
            "job discovery complete"
        );
        report
    }

    /// Find all manifest files below the root, sorted by path.
    pub fn find_units(&self) -> Vec<PathBuf> {
        let mut units = Vec::new();
        let mut visited = HashSet::new();
        let mut dirs_to_scan = VecDeque::new();
        dirs_to_scan.push_back((self.root.to_path_buf(), 0usize));

        while let Some((current_dir, depth)) = dirs_to_scan.pop_front() {
            if self.config.follow_symlinks {
                let key = fs::canonicalize(&current_dir).unwrap_or_else(|_| current_dir.clone());
                if !visited.insert(key) {
                    continue;
                }
            }

            let entries = match fs::read_dir(&current_dir) {
                Ok(entries) => entries,
                Err(e) => {
                    debug!(dir = %current_dir.display(), error = %e, "skipping unreadable directory");
                    continue;
                }
            };

            for entry in entries {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        debug!(dir = %current_dir.display(), error = %e, "skipping directory entry");
                        continue;
                    }
                };
                let path = entry.path();

                let Ok(file_type) = entry.file_type() else {
                    continue;
                };
                let is_dir = if file_type.is_symlink() {
                    match fs::metadata(&path) {
                        Ok(meta) if meta.is_dir() && !self.config.follow_symlinks => continue,
                        Ok(meta) => meta.is_dir(),
                        Err(_) => continue,
                    }
                } else {
                    file_type.is_dir()
                };

                if is_dir {
                    if self.config.max_depth.map_or(true, |max| depth < max) {
                        dirs_to_scan.push_back((path, depth + 1));
                    }
                } else if self.is_unit(&path) {
                    units.push(path);
                }
            }
        }

        units.sort();
        debug!(root = %self.root.display(), count = units.len(), "found job units");
        units
    }

    fn is_unit(&self, path: &Path) -> bool {
        let placeholder = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| self.config.is_placeholder(n));
        !placeholder && self.config.is_manifest(path)
    }

    /// Read one manifest and resolve its handlers against the catalog.
    pub fn load_unit(&self, path: &Path) -> Result<Vec<JobDescriptor>, JobError> {
        let fail = |reason: String| JobError::DiscoveryLoad {
            path: path.to_path_buf(),
            reason,
        };

        let source = fs::read_to_string(path).map_err(|e| fail(format!("read failed: {e}")))?;
        let manifest: Manifest =
            toml::from_str(&source).map_err(|e| fail(format!("invalid manifest: {e}")))?;

        manifest
            .jobs
            .iter()
            .map(|entry| {
                let descriptor = self
                    .catalog
                    .get(&entry.handler)
                    .ok_or_else(|| fail(format!("unknown handler `{}`", entry.handler)))?;
                if entry.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
                    return Err(fail(format!(
                        "empty job name for handler `{}`",
                        entry.handler
                    )));
                }
                Ok(descriptor.renamed(entry.name.as_deref(), entry.description.as_deref()))
            })
            .collect()
    }

    fn check_duplicates(
        &self,
        unit: &Path,
        registry: &JobRegistry,
        jobs: Vec<JobDescriptor>,
    ) -> Result<Vec<JobDescriptor>, JobError> {
        if self.config.duplicate_policy != DuplicatePolicy::Reject {
            return Ok(jobs);
        }
        let mut seen = HashSet::new();
        for job in &jobs {
            if registry.find(job.name()).is_some() || !seen.insert(job.name()) {
                return Err(JobError::DiscoveryLoad {
                    path: unit.to_path_buf(),
                    reason: format!("duplicate job name `{}`", job.name()),
                });
            }
        }
        Ok(jobs)
    }
}
