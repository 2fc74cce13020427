//! Mastodon client tests against a local HTTP mock
//!
//! Checks that HTTP statuses reported by the instance survive the mapping
//! onto upstream errors, so retry decisions and exit codes see the real code.

use libtootbot::error::{TootbotError, UpstreamError};
use libtootbot::platforms::mastodon::MastodonClient;
use libtootbot::platforms::TootPlatform;
use libtootbot::poster::{publish, RetryPolicy};
use libtootbot::types::{GeneratedText, PostPayload, Visibility};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> MastodonClient {
    MastodonClient::new(server.uri(), "test-token".to_string()).expect("client")
}

fn payload() -> PostPayload {
    PostPayload::new(GeneratedText::new("Short post.".to_string()), Visibility::Direct)
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        initial_backoff: Duration::from_millis(1),
    }
}

#[tokio::test]
async fn test_unauthorized_post_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/statuses"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "The access token is invalid" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = publish(&client, &payload(), &fast_policy())
        .await
        .unwrap_err();

    match &err {
        TootbotError::Upstream(UpstreamError::Posting { status, message }) => {
            assert_eq!(*status, Some(401));
            assert!(message.contains("The access token is invalid"));
        }
        other => panic!("Expected posting error, got {:?}", other),
    }
    assert_eq!(err.exit_code(), 3);
}

#[tokio::test]
async fn test_unprocessable_post_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/statuses"))
        .respond_with(ResponseTemplate::new(422).set_body_json(
            json!({ "error": "Validation failed: Text character limit of 500 exceeded" }),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = publish(&client, &payload(), &fast_policy())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TootbotError::Upstream(UpstreamError::Posting {
            status: Some(422),
            ..
        })
    ));
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn test_unavailable_instance_is_retried_until_exhausted() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/statuses"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .expect(4)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = publish(&client, &payload(), &fast_policy())
        .await
        .unwrap_err();

    match err {
        TootbotError::Upstream(e) => {
            assert_eq!(e.status(), Some(503));
            assert!(e.is_transient_post_error());
        }
        other => panic!("Expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_media_upload_keeps_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/media"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "The access token is invalid" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client
        .upload_media(vec![0x89, b'P', b'N', b'G'], "Alt text")
        .await;

    match result {
        Err(TootbotError::Upstream(UpstreamError::MediaUpload { status, .. })) => {
            assert_eq!(status, Some(401));
        }
        other => panic!("Expected media upload error, got {:?}", other),
    }
}
