//! Toot text generation with length validation
//!
//! A candidate from the completion service is cleaned of formatting
//! characters and accepted only if it fits the maximum length. Over-length
//! candidates are discarded and a fresh one is requested, up to a fixed
//! number of attempts.

use tracing::{debug, warn};

use crate::config::TextConfig;
use crate::error::{Result, TootbotError};
use crate::prompt::PromptSource;
use crate::services::CompletionService;
use crate::types::GeneratedText;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSettings {
    /// Longest accepted text, in characters (inclusive)
    pub max_length: usize,
    /// Completion requests allowed before giving up
    pub max_attempts: u32,
    /// Characters removed from every candidate
    pub strip_chars: Vec<char>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self::from(&TextConfig::default())
    }
}

impl From<&TextConfig> for GenerationSettings {
    fn from(config: &TextConfig) -> Self {
        Self {
            max_length: config.max_length,
            max_attempts: config.max_attempts,
            strip_chars: config.strip_chars.clone(),
        }
    }
}

pub struct TextGenerator<'a> {
    completion: &'a dyn CompletionService,
    prompt: &'a PromptSource,
    settings: GenerationSettings,
}

impl<'a> TextGenerator<'a> {
    pub fn new(
        completion: &'a dyn CompletionService,
        prompt: &'a PromptSource,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            completion,
            prompt,
            settings,
        }
    }

    /// Produce a toot text no longer than `max_length` characters
    ///
    /// # Errors
    ///
    /// - `UpstreamError::Completion` from the first failing request; completion
    ///   calls are not retried
    /// - `TootbotError::ValidationExhausted` if every attempt was too long
    pub async fn generate(&self) -> Result<GeneratedText> {
        let max_length = self.settings.max_length;

        for attempt in 1..=self.settings.max_attempts {
            debug!(attempt, prompt = %self.prompt.as_str(), "Requesting toot text");

            let raw = self.completion.complete(self.prompt.as_str()).await?;
            let content = strip_chars(&raw, &self.settings.strip_chars);
            let length = content.chars().count();

            debug!(attempt, length, content = %content, "Toot content");

            if length > max_length {
                warn!(
                    "Toot length {} exceeds {}c. (attempt {}/{}), requesting a new one",
                    length, max_length, attempt, self.settings.max_attempts
                );
                continue;
            }

            return Ok(GeneratedText::new(content));
        }

        Err(TootbotError::ValidationExhausted {
            attempts: self.settings.max_attempts,
            max_length,
        })
    }
}

/// Remove every occurrence of the given characters
pub fn strip_chars(text: &str, chars: &[char]) -> String {
    text.chars().filter(|c| !chars.contains(c)).collect()
}
