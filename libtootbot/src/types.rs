//! Core types for Tootbot
//!
//! Every value here lives for a single run: text is generated, optionally
//! illustrated, posted once, and dropped.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ConfigError;

/// Text produced by the completion service that passed length validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedText(String);

impl GeneratedText {
    pub fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in Unicode scalar values
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for GeneratedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Prompt sent to the image service, derived from a [`GeneratedText`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePrompt(String);

impl ImagePrompt {
    /// Interpolate `text` into `template` at every `{text}` placeholder
    pub fn from_template(template: &str, text: &GeneratedText) -> Self {
        Self(template.replace("{text}", text.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Opaque identifier of an uploaded media attachment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaHandle(pub String);

impl MediaHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Audience scope of a post
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Direct,
    Public,
    Unlisted,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Direct => "direct",
            Visibility::Public => "public",
            Visibility::Unlisted => "unlisted",
            Visibility::Private => "private",
        }
    }
}

impl FromStr for Visibility {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "direct" => Ok(Visibility::Direct),
            "public" => Ok(Visibility::Public),
            "unlisted" => Ok(Visibility::Unlisted),
            "private" => Ok(Visibility::Private),
            other => Err(ConfigError::InvalidValue {
                field: "VISIBILITY".to_string(),
                reason: format!(
                    "'{}' is not one of direct, public, unlisted, private",
                    other
                ),
            }),
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the posting service needs to create a status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostPayload {
    pub text: GeneratedText,
    pub visibility: Visibility,
    pub media: Vec<MediaHandle>,
}

impl PostPayload {
    pub fn new(text: GeneratedText, visibility: Visibility) -> Self {
        Self {
            text,
            visibility,
            media: Vec::new(),
        }
    }

    pub fn with_media(mut self, handle: MediaHandle) -> Self {
        self.media.push(handle);
        self
    }
}

/// Outcome of a successful status creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostResult {
    /// Public address of the created post
    pub address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_from_str() {
        assert_eq!("direct".parse::<Visibility>().unwrap(), Visibility::Direct);
        assert_eq!("PUBLIC".parse::<Visibility>().unwrap(), Visibility::Public);
        assert_eq!(" unlisted ".parse::<Visibility>().unwrap(), Visibility::Unlisted);
        assert_eq!("Private".parse::<Visibility>().unwrap(), Visibility::Private);
    }

    #[test]
    fn test_visibility_from_str_invalid() {
        let err = "followers".parse::<Visibility>().unwrap_err();
        assert!(err.to_string().contains("followers"));
    }

    #[test]
    fn test_visibility_default_is_direct() {
        assert_eq!(Visibility::default(), Visibility::Direct);
        assert_eq!(Visibility::default().to_string(), "direct");
    }

    #[test]
    fn test_image_prompt_interpolation() {
        let text = GeneratedText::new("Rust 2.0 est sorti".to_string());
        let prompt = ImagePrompt::from_template("Illustre : “{text}”. Sans texte.", &text);
        assert_eq!(prompt.as_str(), "Illustre : “Rust 2.0 est sorti”. Sans texte.");
    }

    #[test]
    fn test_image_prompt_without_placeholder_is_template() {
        let text = GeneratedText::new("ignored".to_string());
        let prompt = ImagePrompt::from_template("A lighthouse at dawn", &text);
        assert_eq!(prompt.as_str(), "A lighthouse at dawn");
    }

    #[test]
    fn test_generated_text_counts_chars_not_bytes() {
        let text = GeneratedText::new("pouet é🦀".to_string());
        assert_eq!(text.char_count(), 8);
    }

    #[test]
    fn test_payload_with_media() {
        let payload = PostPayload::new(
            GeneratedText::new("hi".to_string()),
            Visibility::Unlisted,
        )
        .with_media(MediaHandle("42".to_string()));

        assert_eq!(payload.media, vec![MediaHandle("42".to_string())]);
        assert_eq!(payload.visibility, Visibility::Unlisted);
    }
}
