//! Illustration pipeline: prompt, generate, download, upload
//!
//! Nothing on this path is retried; any failure aborts the run before a
//! status is created.

use tracing::{debug, info};

use crate::config::ImageConfig;
use crate::error::Result;
use crate::platforms::TootPlatform;
use crate::services::ImageService;
use crate::types::{GeneratedText, ImagePrompt, MediaHandle};

pub struct Illustrator<'a> {
    images: &'a dyn ImageService,
    platform: &'a dyn TootPlatform,
    prompt_template: &'a str,
    description: &'a str,
}

impl<'a> Illustrator<'a> {
    pub fn new(
        images: &'a dyn ImageService,
        platform: &'a dyn TootPlatform,
        config: &'a ImageConfig,
    ) -> Self {
        Self {
            images,
            platform,
            prompt_template: &config.prompt_template,
            description: &config.description,
        }
    }

    pub fn image_prompt(&self, text: &GeneratedText) -> ImagePrompt {
        ImagePrompt::from_template(self.prompt_template, text)
    }

    /// Generate an image for `text` and upload it as a media attachment
    pub async fn illustrate(&self, text: &GeneratedText) -> Result<MediaHandle> {
        let prompt = self.image_prompt(text);
        debug!(prompt = %prompt.as_str(), "Requesting illustration");

        let locator = self.images.generate_image(&prompt).await?;
        debug!(url = %locator, "Illustration generated");

        let bytes = self.images.download(&locator).await?;
        let handle = self.platform.upload_media(bytes, self.description).await?;

        info!(
            media_id = %handle.as_str(),
            platform = self.platform.name(),
            "Illustration uploaded"
        );
        Ok(handle)
    }
}
