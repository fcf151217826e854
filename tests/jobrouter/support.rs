//! Shared fixtures: the compiled-in catalog and manifest helpers.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use jobrouter::{jobs, JobCatalog, JobRegistry, Router};

use crate::handlers::{generators, math, uploads};

/// Catalog with every async test handler.
pub fn catalog() -> JobCatalog {
    jobrouter::init_logging();
    JobCatalog::from_declarations(jobs![
        math::addition,
        math::divide,
        math::greet,
        math::boxed_increment,
        math::deferred_double,
        math::checked_sqrt,
        generators::count_up,
        generators::lazy_ticks,
        generators::flaky_numbers,
        generators::sleepy,
        generators::ticker,
        generators::guarded_wait,
        uploads::upload,
        uploads::peer,
    ])
    .expect("test catalog is valid")
}

/// Router over a registry holding the whole catalog.
pub fn router() -> Router {
    let registry = JobRegistry::from_catalog(".", &catalog()).expect("no duplicate names");
    Router::new(Arc::new(registry))
}

/// Write a manifest at `relative` below `root`, creating parent directories.
pub fn write_manifest(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}
