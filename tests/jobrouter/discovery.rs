//! Discovery integration tests: manifests on disk resolved against the catalog.

use std::sync::Arc;

use jobrouter::registry::Discovery;
use jobrouter::{
    DiscoveryConfig, DuplicatePolicy, JobError, JobRegistry, JobRequest, RegistryCache, Router,
};
use serde_json::json;

use crate::support::{catalog, write_manifest};

const MATH_MANIFEST: &str = r#"
[[job]]
handler = "addition"

[[job]]
handler = "divide"
description = "Floating point division"
"#;

const STREAM_MANIFEST: &str = r#"
[[job]]
handler = "count_up"
name = "numbers"
"#;

#[tokio::test]
async fn discovers_nested_manifests() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), "math.toml", MATH_MANIFEST);
    write_manifest(dir.path(), "streams/numbers.toml", STREAM_MANIFEST);

    let registry = JobRegistry::discover(dir.path(), &catalog());
    let report = registry.report();
    assert!(report.is_clean());
    assert_eq!(report.total_units, 2);
    assert_eq!(report.loaded_units, 2);
    assert_eq!(report.registered_jobs, 3);
    assert_eq!(registry.names(), vec!["addition", "divide", "numbers"]);
    assert_eq!(
        registry.find("divide").unwrap().description(),
        "Floating point division"
    );

    let router = Router::new(Arc::new(registry));
    let collected = router
        .route(JobRequest::new("numbers").arg("limit", 2))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();
    assert_eq!(collected, vec![json!(0), json!(1), json!(2)]);
}

#[test]
fn broken_unit_does_not_stop_discovery() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), "a_math.toml", MATH_MANIFEST);
    write_manifest(dir.path(), "b_broken.toml", "[[job]\nhandler = ");
    write_manifest(
        dir.path(),
        "c_unknown.toml",
        "[[job]]\nhandler = \"addition\"\nname = \"plus\"\n\n[[job]]\nhandler = \"no_such_handler\"\n",
    );
    write_manifest(dir.path(), "d_streams.toml", STREAM_MANIFEST);

    let registry = JobRegistry::discover(dir.path(), &catalog());
    let report = registry.report();

    assert_eq!(report.total_units, 4);
    assert_eq!(report.loaded_units, 2);
    assert_eq!(report.failed_units, 2);
    assert!(report.failures.iter().all(JobError::is_discovery_failure));

    // The unit with an unknown handler contributes nothing, not even `plus`.
    assert!(registry.find("plus").is_none());
    assert_eq!(registry.names(), vec!["addition", "divide", "numbers"]);
}

#[test]
fn placeholder_and_foreign_files_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), "mod.toml", "this is not a manifest");
    write_manifest(dir.path(), "nested/mod.toml", "[[job]]\nhandler = \"addition\"\n");
    write_manifest(dir.path(), "README.md", "# jobs");
    write_manifest(dir.path(), "nested/streams.toml", STREAM_MANIFEST);

    let registry = JobRegistry::discover(dir.path(), &catalog());
    assert!(registry.report().is_clean());
    assert_eq!(registry.report().total_units, 1);
    assert_eq!(registry.names(), vec!["numbers"]);
}

#[test]
fn missing_root_is_recorded_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist");

    let registry = JobRegistry::discover(&missing, &catalog());
    assert!(registry.is_empty());
    assert_eq!(registry.report().failures.len(), 1);
    assert!(!registry.report().is_clean());
}

#[test]
fn max_depth_limits_the_walk() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), "top.toml", MATH_MANIFEST);
    write_manifest(dir.path(), "one/two/deep.toml", STREAM_MANIFEST);

    let config = DiscoveryConfig {
        max_depth: Some(1),
        ..DiscoveryConfig::default()
    };
    let registry = JobRegistry::discover_with(dir.path(), &catalog(), &config);
    assert_eq!(registry.names(), vec!["addition", "divide"]);

    let unlimited = JobRegistry::discover(dir.path(), &catalog());
    assert_eq!(unlimited.len(), 3);
}

#[test]
fn reject_policy_fails_the_duplicate_unit() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), "a.toml", "[[job]]\nhandler = \"addition\"\n");
    write_manifest(
        dir.path(),
        "b.toml",
        "[[job]]\nhandler = \"divide\"\nname = \"addition\"\n",
    );

    let warn = JobRegistry::discover(dir.path(), &catalog());
    assert_eq!(warn.len(), 2);
    assert_eq!(warn.find("addition").unwrap().ident(), "addition");

    let config = DiscoveryConfig {
        duplicate_policy: DuplicatePolicy::Reject,
        ..DiscoveryConfig::default()
    };
    let reject = JobRegistry::discover_with(dir.path(), &catalog(), &config);
    assert_eq!(reject.len(), 1);
    assert_eq!(reject.report().failed_units, 1);
}

#[test]
fn units_are_found_in_sorted_order() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), "b/z.toml", "");
    write_manifest(dir.path(), "a.toml", "");
    write_manifest(dir.path(), "b/a.toml", "");

    let catalog = catalog();
    let config = DiscoveryConfig::default();
    let discovery = Discovery::new(dir.path(), &catalog, &config);
    let units = discovery.find_units();

    let relative: Vec<_> = units
        .iter()
        .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
        .collect();
    assert_eq!(
        relative,
        vec![
            std::path::PathBuf::from("a.toml"),
            std::path::PathBuf::from("b/a.toml"),
            std::path::PathBuf::from("b/z.toml"),
        ]
    );
}

#[test]
fn cache_discovers_each_root_once() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), "math.toml", MATH_MANIFEST);

    let cache = RegistryCache::new();
    let catalog = catalog();
    let first = cache.get_or_discover(dir.path(), &catalog);

    write_manifest(dir.path(), "streams.toml", STREAM_MANIFEST);
    let second = cache.get_or_discover(dir.path(), &catalog);

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.names(), vec!["addition", "divide"]);

    let rebuilt = cache.rebuild(dir.path(), &catalog);
    assert_eq!(rebuilt.names(), vec!["addition", "divide", "numbers"]);
}
