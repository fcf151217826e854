//! Routing integration tests: named dispatch against a catalog-backed registry.

use std::sync::Arc;

use futures::StreamExt;
use jobrouter::{JobCatalog, JobError, JobRegistry, JobRequest, Router};
use serde_json::json;

use crate::support::{catalog, router};

#[tokio::test]
async fn addition_returns_sum() {
    let output = router()
        .route(JobRequest::new("addition").arg("num1", 4).arg("num2", 9))
        .await
        .unwrap();
    assert!(!output.is_stream());
    assert_eq!(output.into_value(), Some(json!(13)));
}

#[tokio::test]
async fn count_up_yields_through_limit() {
    let mut numbers = router()
        .route(JobRequest::new("count_up").arg("limit", 5))
        .await
        .unwrap()
        .into_stream()
        .expect("count_up streams");

    let mut seen = Vec::new();
    while let Some(n) = numbers.next().await {
        seen.push(n.unwrap());
    }
    assert_eq!(seen, (0..=5).map(|n| json!(n)).collect::<Vec<_>>());
}

#[tokio::test]
async fn unknown_job_reports_name_and_root() {
    let err = router()
        .route(JobRequest::new("missing_job"))
        .await
        .unwrap_err();

    match &err {
        JobError::JobNotFound { name, root } => {
            assert_eq!(name, "missing_job");
            assert!(root.is_absolute());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().starts_with("the job 'missing_job' was not found in "));
}

#[tokio::test]
async fn empty_directory_has_no_jobs() {
    let dir = tempfile::tempdir().unwrap();
    let registry = JobRegistry::discover(dir.path(), &catalog());
    assert!(registry.is_empty());
    assert!(registry.report().is_clean());

    let router = Router::new(Arc::new(registry));
    let err = router
        .route(JobRequest::new("addition").arg("num1", 1).arg("num2", 2))
        .await
        .unwrap_err();
    assert!(matches!(err, JobError::JobNotFound { .. }));
}

#[tokio::test]
async fn declared_name_replaces_identifier() {
    let router = router();

    let output = router
        .route(JobRequest::new("say_hello").arg("name", "Ada"))
        .await
        .unwrap();
    assert_eq!(output.into_value(), Some(json!("Hello, Ada!")));

    let err = router.route(JobRequest::new("greet")).await.unwrap_err();
    assert!(matches!(err, JobError::JobNotFound { .. }));
}

#[tokio::test]
async fn handler_error_is_execution_failure() {
    let err = router()
        .route(
            JobRequest::new("divide")
                .arg("numerator", 1.0)
                .arg("denominator", 0.0),
        )
        .await
        .unwrap_err();

    match err {
        JobError::HandlerExecution { job, source } => {
            assert_eq!(job, "divide");
            assert_eq!(source.to_string(), "division by zero");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn registry_lists_jobs_in_declaration_order() {
    let registry = JobRegistry::from_catalog(".", &catalog()).unwrap();
    let names = registry.names();
    assert_eq!(&names[..3], &["addition", "divide", "say_hello"]);

    let summaries = registry.summaries();
    assert_eq!(summaries[0].description, "Add two numbers together");
    assert_eq!(summaries[0].parameters, vec!["num1", "num2"]);
    assert_eq!(summaries[1].description, "Divide two numbers");
}

#[tokio::test]
async fn first_registration_wins_on_duplicate_names() {
    let catalog = catalog();
    let mut registry = JobRegistry::new(".");
    let count_up = catalog.get("count_up").unwrap().clone();
    let addition = catalog.get("addition").unwrap().clone();

    registry.insert(addition).unwrap();
    registry
        .register(
            jobrouter::JobDeclaration::new(
                "other_addition",
                jobrouter::HandlerFn::single(|_| async { Ok(json!("shadowed")) }),
            )
            .name("addition"),
        )
        .unwrap();
    registry.insert(count_up).unwrap();
    assert_eq!(registry.len(), 3);

    let router = Router::new(Arc::new(registry));
    let output = router
        .route(JobRequest::new("addition").arg("num1", 2).arg("num2", 2))
        .await
        .unwrap();
    assert_eq!(output.into_value(), Some(json!(4)));
}

#[tokio::test]
async fn request_decoded_from_json() {
    let request: JobRequest =
        serde_json::from_value(json!({ "name": "addition", "args": { "num1": 20, "num2": 22 } }))
            .unwrap();
    let output = router().route(request).await.unwrap();
    assert_eq!(output.into_value(), Some(json!(42)));
}

#[test]
fn empty_catalog_registry() {
    let registry = JobRegistry::from_catalog(".", &JobCatalog::new()).unwrap();
    assert!(registry.is_empty());
}

#[tokio::test]
async fn future_returning_jobs_are_awaited() {
    let router = router();

    let output = router
        .route(JobRequest::new("increment").arg("n", 41))
        .await
        .unwrap();
    assert_eq!(output.into_value(), Some(json!(42)));

    let output = router
        .route(JobRequest::new("deferred_double").arg("n", 21))
        .await
        .unwrap();
    assert_eq!(output.into_value(), Some(json!(42)));

    let err = router
        .route(JobRequest::new("deferred_double").arg("n", i64::MAX))
        .await
        .unwrap_err();
    assert!(matches!(err, JobError::HandlerExecution { ref job, .. } if job == "deferred_double"));
}

#[tokio::test]
async fn aliased_result_error_is_execution_failure() {
    let router = router();

    let output = router
        .route(JobRequest::new("checked_sqrt").arg("n", 49))
        .await
        .unwrap();
    assert_eq!(output.into_value(), Some(json!(7)));

    let err = router
        .route(JobRequest::new("checked_sqrt").arg("n", -4))
        .await
        .unwrap_err();
    match err {
        JobError::HandlerExecution { job, source } => {
            assert_eq!(job, "checked_sqrt");
            assert_eq!(source.to_string(), "no real square root of -4");
        }
        other => panic!("unexpected error: {other}"),
    }
}
