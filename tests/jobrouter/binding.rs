//! Argument binding: filtering undeclared keys, optional parameters and handles.

use std::sync::Arc;

use jobrouter::{
    BoxError, ContextHandle, HandlerFn, JobDeclaration, JobError, JobRegistry, JobRequest, Router,
    BINARY_STREAM,
};
use serde_json::json;

use crate::handlers::uploads::{Peer, Upload};
use crate::support::router;

/// Fails if it is called with anything besides `a` and `b`.
fn strict_pair() -> JobDeclaration {
    JobDeclaration::new(
        "strict_pair",
        HandlerFn::single(|args| async move {
            let unexpected: Vec<String> = args
                .names()
                .into_iter()
                .filter(|name| *name != "a" && *name != "b")
                .map(str::to_string)
                .collect();
            if !unexpected.is_empty() {
                return Err::<serde_json::Value, BoxError>(
                    format!("unexpected arguments: {unexpected:?}").into(),
                );
            }
            Ok(json!(args.names()))
        }),
    )
    .parameters(["a", "b"])
}

#[tokio::test]
async fn undeclared_arguments_are_dropped() {
    let output = router()
        .route(
            JobRequest::new("addition")
                .arg("num1", 4)
                .arg("num2", 9)
                .arg("verbose", true)
                .arg("trace_id", "abc"),
        )
        .await
        .unwrap();
    assert_eq!(output.into_value(), Some(json!(13)));
}

#[tokio::test]
async fn handler_never_sees_undeclared_keys() {
    let mut registry = JobRegistry::new(".");
    registry.register(strict_pair()).unwrap();
    let router = Router::new(Arc::new(registry));

    let output = router
        .route(
            JobRequest::new("strict_pair")
                .args(json!({ "a": 1, "b": 2, "c": 3, "websocket": "nope" }))
                .with_binary_stream(ContextHandle::new(())),
        )
        .await
        .unwrap();
    assert_eq!(output.into_value(), Some(json!(["a", "b"])));
}

#[tokio::test]
async fn missing_argument_names_the_parameter() {
    let err = router()
        .route(JobRequest::new("addition").arg("num1", 4))
        .await
        .unwrap_err();
    match err {
        JobError::InvalidArgument { job, argument, .. } => {
            assert_eq!(job, "addition");
            assert_eq!(argument, "num2");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn wrong_type_is_invalid_argument() {
    let err = router()
        .route(JobRequest::new("addition").arg("num1", "four").arg("num2", 9))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        JobError::InvalidArgument { ref argument, .. } if argument == "num1"
    ));
}

#[tokio::test]
async fn optional_parameter_defaults_to_none() {
    let router = router();

    let plain = router
        .route(JobRequest::new("say_hello").arg("name", "Grace"))
        .await
        .unwrap();
    assert_eq!(plain.into_value(), Some(json!("Hello, Grace!")));

    let custom = router
        .route(
            JobRequest::new("say_hello")
                .arg("name", "Grace")
                .arg("greeting", "Welcome"),
        )
        .await
        .unwrap();
    assert_eq!(custom.into_value(), Some(json!("Welcome, Grace!")));
}

#[tokio::test]
async fn binary_stream_handle_reaches_handler() {
    let output = router()
        .binary_stream_router(
            JobRequest::new("upload").arg("label", "photo"),
            ContextHandle::new(Upload { bytes: vec![0u8; 16] }),
        )
        .await
        .unwrap();
    assert_eq!(
        output.into_value(),
        Some(json!({ "label": "photo", "size": 16 }))
    );
}

#[tokio::test]
async fn handle_wins_over_same_named_argument() {
    let output = router()
        .route(
            JobRequest::new("upload")
                .arg("label", "doc")
                .arg(BINARY_STREAM, "not a stream")
                .with_binary_stream(ContextHandle::new(Upload { bytes: vec![1, 2, 3] })),
        )
        .await
        .unwrap();
    assert_eq!(output.into_value(), Some(json!({ "label": "doc", "size": 3 })));
}

#[tokio::test]
async fn missing_required_handle_is_invalid_argument() {
    let err = router()
        .route(JobRequest::new("upload").arg("label", "doc"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        JobError::InvalidArgument { ref argument, .. } if argument == BINARY_STREAM
    ));
}

#[tokio::test]
async fn optional_websocket_handle() {
    let router = router();

    let anonymous = router.route(JobRequest::new("peer")).await.unwrap();
    assert_eq!(anonymous.into_value(), Some(json!("anonymous")));

    let connected = router
        .websocket_router(
            JobRequest::new("peer"),
            ContextHandle::new(Peer {
                addr: "10.1.2.3:9000".to_string(),
            }),
        )
        .await
        .unwrap();
    assert_eq!(connected.into_value(), Some(json!("10.1.2.3:9000")));
}

#[tokio::test]
async fn handle_not_injected_into_jobs_that_do_not_declare_it() {
    let output = router()
        .websocket_router(
            JobRequest::new("addition").arg("num1", 1).arg("num2", 1),
            ContextHandle::new(Peer {
                addr: "ignored".to_string(),
            }),
        )
        .await
        .unwrap();
    assert_eq!(output.into_value(), Some(json!(2)));
}
