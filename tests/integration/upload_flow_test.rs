//! End-to-end tests for the upload pipeline against a wiremock server:
//! validation gate, HTTP transfer with progress, error classification,
//! and the client-side history.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use buglens_common::Config;
use buglens_upload::client::HttpUploadService;
use buglens_upload::progress::ProgressSender;
use buglens_upload::{Artifact, UploadMetadata, UploadService, UPLOAD_DESCRIPTION};

use common::{ack_body, init_tracing, pipeline_against};

#[tokio::test]
async fn test_successful_upload_appends_record() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ack_body("main.cpp", 1024, "p1")))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = pipeline_against(&server);
    let record = pipeline
        .submit(
            Artifact::new("main.cpp", vec![b'x'; 1024]),
            ProgressSender::sink(),
        )
        .await
        .unwrap();

    // file_info and project_id copied verbatim from the acknowledgment
    assert_eq!(record.original_display_name, "main.cpp");
    assert_eq!(record.byte_size, 1024);
    assert_eq!(record.extension, ".cpp");
    assert_eq!(record.project_id, "p1");
    assert_eq!(record.server_path, "/uploads/p1/main.cpp");
    assert!(record.is_uploaded());

    assert_eq!(pipeline.history().len(), 1);
    assert_eq!(pipeline.history().records()[0], record);
}

#[tokio::test]
async fn test_multipart_fields_reach_the_wire() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .and(body_string_contains("name=\"project_name\""))
        .and(body_string_contains("Project_"))
        .and(body_string_contains("name=\"description\""))
        .and(body_string_contains(UPLOAD_DESCRIPTION))
        .and(body_string_contains("filename=\"widget.hpp\""))
        .and(body_string_contains("#pragma once"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ack_body("widget.hpp", 12, "p2")))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = pipeline_against(&server);
    pipeline
        .submit(
            Artifact::new("widget.hpp", b"#pragma once".to_vec()),
            ProgressSender::sink(),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_http_error_maps_to_server_rejected() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = pipeline_against(&server);
    let err = pipeline
        .submit(
            Artifact::new("main.cpp", vec![b'x'; 64]),
            ProgressSender::sink(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "SERVER_REJECTED");
    assert_eq!(err.to_string(), "upload failed: HTTP 500");
    assert!(pipeline.history().is_empty());
}

#[tokio::test]
async fn test_application_rejection_uses_service_message() {
    init_tracing();
    let server = MockServer::start().await;
    let mut body = ack_body("main.cpp", 64, "p1");
    body["success"] = serde_json::json!(false);
    body["message"] = serde_json::json!("storage quota exceeded");
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = pipeline_against(&server);
    let err = pipeline
        .submit(
            Artifact::new("main.cpp", vec![b'x'; 64]),
            ProgressSender::sink(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "SERVER_REJECTED");
    assert_eq!(err.to_string(), "storage quota exceeded");
    assert!(pipeline.history().is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_classified() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Bad Gateway</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = pipeline_against(&server);
    let err = pipeline
        .submit(
            Artifact::new("main.cpp", vec![b'x'; 64]),
            ProgressSender::sink(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "MALFORMED_ACKNOWLEDGMENT");
    assert!(pipeline.history().is_empty());
}

#[tokio::test]
async fn test_unreachable_service_maps_to_transport_failure() {
    init_tracing();
    // A server that was shut down before the transfer begins. Use a
    // non-pooled server so dropping it actually closes the listener;
    // pooled servers from `MockServer::start` keep listening after drop.
    let server = MockServer::builder().start().await;
    let pipeline = pipeline_against(&server);
    drop(server);

    let err = pipeline
        .submit(
            Artifact::new("main.cpp", vec![b'x'; 64]),
            ProgressSender::sink(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "TRANSPORT_FAILURE");
    assert!(pipeline.history().is_empty());
}

#[tokio::test]
async fn test_rejected_artifact_sends_nothing() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ack_body("x", 1, "p1")))
        .expect(0)
        .mount(&server)
        .await;

    let pipeline = pipeline_against(&server);

    let err = pipeline
        .submit(
            Artifact::new("payload.exe", vec![0u8; 10]),
            ProgressSender::sink(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "POLICY_REJECTED");
    assert_eq!(
        err.to_string(),
        "upload rejected: unsupported type: .exe"
    );

    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty());
    assert!(pipeline.history().is_empty());
}

#[tokio::test]
async fn test_oversized_archive_rejected_without_network() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ack_body("x", 1, "p1")))
        .expect(0)
        .mount(&server)
        .await;

    let pipeline = pipeline_against(&server);

    // 60 MiB, well over the 50 MiB ceiling
    let err = pipeline
        .submit(
            Artifact::new("big.zip", vec![0u8; 60 * 1024 * 1024]),
            ProgressSender::sink(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "POLICY_REJECTED");
    assert!(err.to_string().contains("too large"));

    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_concurrent_transfers_never_overlap() {
    init_tracing();
    let server = MockServer::start().await;
    let delay = Duration::from_millis(200);
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ack_body("main.cpp", 64, "p1"))
                .set_delay(delay),
        )
        .expect(2)
        .mount(&server)
        .await;

    let config = Config {
        provider: "http".to_string(),
        base_url: server.uri(),
    };
    let engine = Arc::new(HttpUploadService::new(&config));

    let started = Instant::now();
    let mut handles = Vec::new();
    for _ in 0..2 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine
                .begin_transfer(
                    Artifact::new("main.cpp", vec![b'x'; 64]),
                    UploadMetadata::generate(),
                    ProgressSender::sink(),
                )
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Each response is delayed; if the engine let the transfers overlap
    // the pair would finish after roughly one delay. Holding the single
    // transfer slot forces them back-to-back, so the elapsed time spans
    // both delays.
    assert!(
        started.elapsed() >= delay * 2,
        "transfers overlapped: {:?} elapsed",
        started.elapsed()
    );
}

#[tokio::test]
async fn test_progress_is_monotonic_and_terminates_once() {
    init_tracing();
    let size = 300 * 1024;
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ack_body(
            "main.cpp",
            size as u64,
            "p1",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = pipeline_against(&server);
    let (sender, mut rx) = ProgressSender::channel();

    pipeline
        .submit(Artifact::new("main.cpp", vec![b'x'; size]), sender)
        .await
        .unwrap();

    // The terminal result has resolved; drain what the transfer emitted.
    let mut ticks = Vec::new();
    while let Some(update) = rx.recv().await {
        ticks.push(update.percent);
    }

    tracing::info!(?ticks, "observed progress sequence");
    assert!(!ticks.is_empty());
    assert!(ticks.iter().all(|p| *p <= 100));
    assert!(ticks.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*ticks.last().unwrap(), 100);
    // The recv loop above only ends when the channel is closed, which
    // is the single terminal event; nothing arrives afterwards.
    assert!(rx.recv().await.is_none());
}
