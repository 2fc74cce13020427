//! Configuration management for Tootbot
//!
//! Secrets and endpoints come from the environment (optionally seeded from a
//! `.env` file). Content settings such as prompt templates, models and retry
//! tuning come from an optional TOML file and fall back to built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::types::Visibility;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

pub const DEFAULT_IMAGE_PROMPT_TEMPLATE: &str = "Est-ce que tu peux me produire une image \
d'illustration pas trop science-fiction et plutôt crédible et réaliste pour ce message que tu \
as généré : “{text}”. Surtout, évite ABSOLUMENT et IMPÉRATIVEMENT de positionner le moindre \
texte ou la moindre flèche sur l'image générée.";

pub const DEFAULT_MEDIA_DESCRIPTION: &str =
    "Illustration générée des technologies mentionnées dans le pouet.";

#[derive(Debug, Clone)]
pub struct Config {
    pub mastodon: MastodonConfig,
    pub openai: OpenAiConfig,
    pub visibility: Visibility,
    pub content: ContentConfig,
}

#[derive(Clone)]
pub struct MastodonConfig {
    /// Instance base address, e.g. "https://mastodon.social"
    pub instance: String,
    pub access_token: String,
}

impl std::fmt::Debug for MastodonConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MastodonConfig")
            .field("instance", &self.instance)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Content and tuning settings, loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub text: TextConfig,
    pub image: ImageConfig,
    pub post: PostConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub prompt_file: String,
    pub model: String,
    pub max_length: usize,
    /// Upper bound on completion requests before giving up
    pub max_attempts: u32,
    /// Collapse newlines in the prompt into single spaces
    pub normalize_whitespace: bool,
    pub strip_chars: Vec<char>,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            prompt_file: "prompt.txt".to_string(),
            model: "gpt-4o".to_string(),
            max_length: 666,
            max_attempts: 5,
            normalize_whitespace: false,
            strip_chars: vec!['*'],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub enabled: bool,
    pub model: String,
    pub quality: String,
    pub size: String,
    /// Template with a `{text}` placeholder for the generated toot
    pub prompt_template: String,
    /// Alt text attached to the uploaded media
    pub description: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "dall-e-3".to_string(),
            quality: "hd".to_string(),
            size: "1792x1024".to_string(),
            prompt_template: DEFAULT_IMAGE_PROMPT_TEMPLATE.to_string(),
            description: DEFAULT_MEDIA_DESCRIPTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 500,
        }
    }
}

impl ContentConfig {
    /// Load content settings from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: ContentConfig = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.text.max_length == 0 {
            return Err(invalid("text.max_length", "must be greater than zero").into());
        }
        if self.text.max_attempts == 0 {
            return Err(invalid("text.max_attempts", "must be at least 1").into());
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from the process environment
    ///
    /// A `.env` file in the working directory is read first if one exists;
    /// variables already set in the environment take precedence over it.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("Ignoring unreadable .env file: {}", e);
            }
        }

        let content = match resolve_config_path(config_path) {
            Some(path) => ContentConfig::load_from_path(&path)?,
            None => ContentConfig::default(),
        };

        Self::from_lookup(|key| std::env::var(key).ok(), content)
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F, content: ContentConfig) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> std::result::Result<String, ConfigError> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
        };

        let instance = normalize_instance_url(&required("URL")?);
        let access_token = required("TOKEN")?;
        let api_key = required("OPENAI_API_KEY")?;

        let visibility = match lookup("VISIBILITY").filter(|v| !v.trim().is_empty()) {
            Some(value) => value.parse()?,
            None => Visibility::default(),
        };

        let base_url = lookup("OPENAI_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());

        Ok(Self {
            mastodon: MastodonConfig {
                instance,
                access_token,
            },
            openai: OpenAiConfig { api_key, base_url },
            visibility,
            content,
        })
    }
}

/// Resolve the content configuration file path
///
/// An explicit path wins over `TOOTBOT_CONFIG`. Without either, built-in
/// defaults are used and no file is read.
pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
    explicit
        .map(str::to_string)
        .or_else(|| std::env::var("TOOTBOT_CONFIG").ok())
        .filter(|p| !p.trim().is_empty())
        .map(|p| PathBuf::from(shellexpand::tilde(&p).to_string()))
}

/// Ensure instance URL has a scheme, defaulting to https
pub fn normalize_instance_url(instance: &str) -> String {
    let trimmed = instance.trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
