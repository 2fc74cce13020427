//! Scripted completion and image services for testing
//!
//! Each mock replays a fixed script and records how it was called, so tests
//! can assert on call counts and arguments without network access.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::{Result, UpstreamError};
use crate::services::{CompletionService, ImageService};
use crate::types::ImagePrompt;

/// Completion service that answers from a queue of scripted outcomes
///
/// Once the queue runs dry the last outcome is repeated.
#[derive(Clone)]
pub struct MockCompletion {
    script: Arc<Mutex<VecDeque<std::result::Result<String, UpstreamError>>>>,
    last: Arc<Mutex<Option<std::result::Result<String, UpstreamError>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockCompletion {
    pub fn new(script: Vec<std::result::Result<String, UpstreamError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            last: Arc::new(Mutex::new(None)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always answer with `text`
    pub fn always(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    /// Answer with each text in order
    pub fn sequence(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    /// Fail every call with the given status
    pub fn failing(status: Option<u16>, message: &str) -> Self {
        Self::new(vec![Err(UpstreamError::Completion {
            status,
            message: message.to_string(),
        })])
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// System prompts received, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for MockCompletion {
    async fn complete(&self, system_prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(system_prompt.to_string());

        let next = self.script.lock().unwrap().pop_front();
        let outcome = match next {
            Some(outcome) => {
                *self.last.lock().unwrap() = Some(outcome.clone());
                outcome
            }
            None => self.last.lock().unwrap().clone().unwrap_or_else(|| {
                Err(UpstreamError::Completion {
                    status: None,
                    message: "Mock completion script is empty".to_string(),
                })
            }),
        };

        outcome.map_err(Into::into)
    }
}

/// Configuration for mock image service behavior
#[derive(Debug, Clone)]
pub struct MockImageConfig {
    pub locator: String,
    pub bytes: Vec<u8>,
    pub generate_error: Option<UpstreamError>,
    pub download_error: Option<UpstreamError>,
}

impl Default for MockImageConfig {
    fn default() -> Self {
        Self {
            locator: "https://images.example/generated.png".to_string(),
            bytes: vec![0x89, b'P', b'N', b'G'],
            generate_error: None,
            download_error: None,
        }
    }
}

#[derive(Clone)]
pub struct MockImageService {
    config: MockImageConfig,
    prompts: Arc<Mutex<Vec<String>>>,
    downloads: Arc<Mutex<Vec<String>>>,
}

impl MockImageService {
    pub fn new(config: MockImageConfig) -> Self {
        Self {
            config,
            prompts: Arc::new(Mutex::new(Vec::new())),
            downloads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn success() -> Self {
        Self::new(MockImageConfig::default())
    }

    pub fn generate_failure(status: Option<u16>, message: &str) -> Self {
        Self::new(MockImageConfig {
            generate_error: Some(UpstreamError::ImageGeneration {
                status,
                message: message.to_string(),
            }),
            ..Default::default()
        })
    }

    pub fn download_failure(status: Option<u16>, message: &str) -> Self {
        Self::new(MockImageConfig {
            download_error: Some(UpstreamError::Download {
                status,
                message: message.to_string(),
            }),
            ..Default::default()
        })
    }

    pub fn generate_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn download_count(&self) -> usize {
        self.downloads.lock().unwrap().len()
    }

    /// Image prompts received, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageService for MockImageService {
    async fn generate_image(&self, prompt: &ImagePrompt) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.as_str().to_string());

        match &self.config.generate_error {
            Some(e) => Err(e.clone().into()),
            None => Ok(self.config.locator.clone()),
        }
    }

    async fn download(&self, locator: &str) -> Result<Vec<u8>> {
        self.downloads.lock().unwrap().push(locator.to_string());

        match &self.config.download_error {
            Some(e) => Err(e.clone().into()),
            None => Ok(self.config.bytes.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GeneratedText;

    #[tokio::test]
    async fn test_mock_completion_sequence_repeats_last() {
        let mock = MockCompletion::sequence(&["first", "second"]);

        assert_eq!(mock.complete("p").await.unwrap(), "first");
        assert_eq!(mock.complete("p").await.unwrap(), "second");
        assert_eq!(mock.complete("p").await.unwrap(), "second");
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_completion_failure() {
        let mock = MockCompletion::failing(Some(500), "model overloaded");

        let err = mock.complete("p").await.unwrap_err();
        assert!(err.to_string().contains("model overloaded"));
        assert_eq!(mock.prompts(), vec!["p".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_completion_empty_script() {
        let mock = MockCompletion::new(Vec::new());
        assert!(mock.complete("p").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_image_success() {
        let mock = MockImageService::success();
        let text = GeneratedText::new("hello".to_string());
        let prompt = ImagePrompt::from_template("draw {text}", &text);

        let locator = mock.generate_image(&prompt).await.unwrap();
        let bytes = mock.download(&locator).await.unwrap();

        assert_eq!(locator, "https://images.example/generated.png");
        assert!(!bytes.is_empty());
        assert_eq!(mock.prompts(), vec!["draw hello".to_string()]);
        assert_eq!(mock.download_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_image_download_failure() {
        let mock = MockImageService::download_failure(Some(404), "expired");
        let result = mock.download("https://images.example/x.png").await;
        assert!(result.unwrap_err().to_string().contains("expired"));
    }
}
