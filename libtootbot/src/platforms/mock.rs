//! Mock posting service for testing
//!
//! Simulates a Mastodon instance whose status creation fails a scripted
//! number of times before succeeding. It records every upload and post
//! attempt (with timestamps) so tests can check retry counts and backoff
//! delays without network access.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::error::{Result, UpstreamError};
use crate::platforms::TootPlatform;
use crate::types::{MediaHandle, PostPayload, PostResult};

/// Configuration for mock platform behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub name: String,

    /// Outcome of each post attempt, in order
    ///
    /// `Some(code)` fails with that HTTP status, `None` fails without one.
    /// Attempts past the end of the list succeed.
    pub post_failures: Vec<Option<u16>>,

    /// Fail every post attempt with this status
    pub always_fail: Option<Option<u16>>,

    /// Status of a failed media upload
    pub upload_failure: Option<Option<u16>>,

    /// Address returned on success
    pub address: String,

    /// Simulated network latency per call
    pub delay: Duration,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            post_failures: Vec::new(),
            always_fail: None,
            upload_failure: None,
            address: "https://mastodon.example/@bot/1".to_string(),
            delay: Duration::ZERO,
        }
    }
}

/// Mock platform for testing
#[derive(Clone)]
pub struct MockPlatform {
    config: MockConfig,
    post_attempts: Arc<Mutex<Vec<Instant>>>,
    posted: Arc<Mutex<Vec<PostPayload>>>,
    uploads: Arc<Mutex<Vec<(usize, String)>>>,
}

impl MockPlatform {
    pub fn new(config: MockConfig) -> Self {
        Self {
            config,
            post_attempts: Arc::new(Mutex::new(Vec::new())),
            posted: Arc::new(Mutex::new(Vec::new())),
            uploads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Mock platform that always succeeds
    pub fn success() -> Self {
        Self::new(MockConfig::default())
    }

    /// Succeeds with `address`
    pub fn with_address(address: &str) -> Self {
        Self::new(MockConfig {
            address: address.to_string(),
            ..Default::default()
        })
    }

    /// Fails the first attempts with the given statuses, then succeeds
    pub fn failing_then_success(failures: &[Option<u16>]) -> Self {
        Self::new(MockConfig {
            post_failures: failures.to_vec(),
            ..Default::default()
        })
    }

    /// Every post attempt fails with `status`
    pub fn always_failing(status: Option<u16>) -> Self {
        Self::new(MockConfig {
            always_fail: Some(status),
            ..Default::default()
        })
    }

    /// Media uploads fail with `status`; posting succeeds
    pub fn upload_failure(status: Option<u16>) -> Self {
        Self::new(MockConfig {
            upload_failure: Some(status),
            ..Default::default()
        })
    }

    pub fn post_call_count(&self) -> usize {
        self.post_attempts.lock().unwrap().len()
    }

    /// When each post attempt started
    pub fn post_attempt_times(&self) -> Vec<Instant> {
        self.post_attempts.lock().unwrap().clone()
    }

    /// Payloads of successful posts
    pub fn posted(&self) -> Vec<PostPayload> {
        self.posted.lock().unwrap().clone()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    /// (byte length, description) of each upload
    pub fn uploads(&self) -> Vec<(usize, String)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl TootPlatform for MockPlatform {
    async fn upload_media(&self, bytes: Vec<u8>, description: &str) -> Result<MediaHandle> {
        let index = {
            let mut uploads = self.uploads.lock().unwrap();
            uploads.push((bytes.len(), description.to_string()));
            uploads.len()
        };

        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }

        match self.config.upload_failure {
            Some(status) => Err(UpstreamError::MediaUpload {
                status,
                message: "Mock media upload failed".to_string(),
            }
            .into()),
            None => Ok(MediaHandle(format!("{}-media-{}", self.config.name, index))),
        }
    }

    async fn post_status(&self, payload: &PostPayload) -> Result<PostResult> {
        let attempt = {
            let mut attempts = self.post_attempts.lock().unwrap();
            attempts.push(Instant::now());
            attempts.len()
        };

        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }

        let failure = match self.config.always_fail {
            Some(status) => Some(status),
            None => self.config.post_failures.get(attempt - 1).copied(),
        };

        match failure {
            Some(status) => Err(UpstreamError::Posting {
                status,
                message: format!("Mock post attempt {} failed", attempt),
            }
            .into()),
            None => {
                self.posted.lock().unwrap().push(payload.clone());
                Ok(PostResult {
                    address: self.config.address.clone(),
                })
            }
        }
    }

    fn name(&self) -> &str {
        &self.config.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GeneratedText, Visibility};

    fn payload() -> PostPayload {
        PostPayload::new(GeneratedText::new("Test".to_string()), Visibility::Direct)
    }

    #[tokio::test]
    async fn test_mock_success() {
        let platform = MockPlatform::with_address("https://example.social/@a/7");

        let result = platform.post_status(&payload()).await.unwrap();
        assert_eq!(result.address, "https://example.social/@a/7");
        assert_eq!(platform.post_call_count(), 1);
        assert_eq!(platform.posted(), vec![payload()]);
    }

    #[tokio::test]
    async fn test_mock_failing_then_success() {
        let platform = MockPlatform::failing_then_success(&[Some(503), None]);

        let err = platform.post_status(&payload()).await.unwrap_err();
        assert!(err.to_string().contains("attempt 1"));
        assert!(platform.post_status(&payload()).await.is_err());
        assert!(platform.post_status(&payload()).await.is_ok());
        assert_eq!(platform.post_call_count(), 3);
        assert_eq!(platform.posted().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_always_failing() {
        let platform = MockPlatform::always_failing(Some(401));

        for _ in 0..5 {
            assert!(platform.post_status(&payload()).await.is_err());
        }
        assert!(platform.posted().is_empty());
    }

    #[tokio::test]
    async fn test_mock_upload() {
        let platform = MockPlatform::success();

        let handle = platform.upload_media(vec![1, 2, 3], "alt").await.unwrap();
        assert_eq!(handle, MediaHandle("mock-media-1".to_string()));
        assert_eq!(platform.uploads(), vec![(3, "alt".to_string())]);
    }

    #[tokio::test]
    async fn test_mock_upload_failure() {
        let platform = MockPlatform::upload_failure(Some(413));

        let result = platform.upload_media(vec![0; 10], "alt").await;
        assert!(result.is_err());
        assert_eq!(platform.upload_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_with_delay() {
        let platform = MockPlatform::new(MockConfig {
            delay: Duration::from_millis(50),
            ..Default::default()
        });

        let start = std::time::Instant::now();
        platform.post_status(&payload()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
