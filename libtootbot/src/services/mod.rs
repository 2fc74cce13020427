//! Language-model and image-generation collaborators
//!
//! The bot only needs two capabilities from the model provider: turn a system
//! instruction into one candidate text, and turn an image prompt into a
//! downloadable picture. Both sit behind traits so the orchestrator can run
//! against the real HTTP client or the scripted mocks in [`mock`].

use async_trait::async_trait;

use crate::error::Result;
use crate::types::ImagePrompt;

pub mod openai;

// Available outside tests so integration tests can drive the orchestrator
pub mod mock;

/// Text completion service
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Submit `system_prompt` as a system-role message and return the first
    /// candidate's content
    ///
    /// # Errors
    ///
    /// Returns `UpstreamError::Completion` when the request fails or the
    /// response carries no candidate.
    async fn complete(&self, system_prompt: &str) -> Result<String>;
}

/// Image generation service
#[async_trait]
pub trait ImageService: Send + Sync {
    /// Request a single image and return its locator
    async fn generate_image(&self, prompt: &ImagePrompt) -> Result<String>;

    /// Fetch the binary behind a locator returned by [`generate_image`]
    ///
    /// [`generate_image`]: ImageService::generate_image
    async fn download(&self, locator: &str) -> Result<Vec<u8>>;
}
