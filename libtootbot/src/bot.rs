//! One bot run: text, optional illustration, publication

use std::io::Write;
use tracing::info;

use crate::config::ContentConfig;
use crate::error::Result;
use crate::generator::{GenerationSettings, TextGenerator};
use crate::illustrator::Illustrator;
use crate::platforms::TootPlatform;
use crate::poster::{publish, RetryPolicy};
use crate::prompt::PromptSource;
use crate::services::{CompletionService, ImageService};
use crate::types::{GeneratedText, ImagePrompt, PostPayload, PostResult, Visibility};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub with_image: bool,
    /// Generate but never upload or post
    pub dry_run: bool,
}

impl RunOptions {
    pub fn from_content(content: &ContentConfig) -> Self {
        Self {
            with_image: content.image.enabled,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Published(PostResult),
    DryRun {
        text: GeneratedText,
        image_prompt: Option<ImagePrompt>,
    },
}

/// Collaborators and settings for a single run, all borrowed
pub struct TootBot<'a> {
    pub prompt: &'a PromptSource,
    pub completion: &'a dyn CompletionService,
    pub images: &'a dyn ImageService,
    pub platform: &'a dyn TootPlatform,
    pub content: &'a ContentConfig,
    pub visibility: Visibility,
}

impl<'a> TootBot<'a> {
    /// Run the pipeline once
    ///
    /// Media is uploaded a single time, before the retrying status creation.
    /// Any error aborts the run; an uploaded attachment is not cleaned up.
    pub async fn run(&self, options: RunOptions) -> Result<RunOutcome> {
        let generator = TextGenerator::new(
            self.completion,
            self.prompt,
            GenerationSettings::from(&self.content.text),
        );
        let text = generator.generate().await?;
        info!(chars = text.char_count(), "Toot text ready");

        let illustrator = Illustrator::new(self.images, self.platform, &self.content.image);

        if options.dry_run {
            let image_prompt = options.with_image.then(|| illustrator.image_prompt(&text));
            info!("Dry run, nothing uploaded or posted");
            return Ok(RunOutcome::DryRun { text, image_prompt });
        }

        let mut payload = PostPayload::new(text, self.visibility);
        if options.with_image {
            let handle = illustrator.illustrate(&payload.text).await?;
            payload = payload.with_media(handle);
        }

        let policy = RetryPolicy::from(&self.content.post);
        let result = publish(self.platform, &payload, &policy).await?;
        info!(address = %result.address, visibility = %payload.visibility, "Toot published");

        Ok(RunOutcome::Published(result))
    }
}

/// Write the user-facing line for `outcome`
pub fn report<W: Write>(outcome: &RunOutcome, out: &mut W) -> std::io::Result<()> {
    match outcome {
        RunOutcome::Published(result) => writeln!(out, "New toot posted: {}", result.address),
        RunOutcome::DryRun { text, .. } => writeln!(out, "{}", text),
    }
}
