//! OpenAI-compatible HTTP client for chat completions and image generation

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::{Config, ImageConfig, OpenAiConfig};
use crate::error::{ConfigError, Result, UpstreamError};
use crate::services::{CompletionService, ImageService};
use crate::types::ImagePrompt;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// Image request parameters that stay fixed for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSettings {
    pub model: String,
    pub quality: String,
    pub size: String,
}

impl From<&ImageConfig> for ImageSettings {
    fn from(config: &ImageConfig) -> Self {
        Self {
            model: config.model.clone(),
            quality: config.quality.clone(),
            size: config.size.clone(),
        }
    }
}

pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    text_model: String,
    image: ImageSettings,
    client: Client,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    quality: &'a str,
    size: &'a str,
}

#[derive(Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    url: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl OpenAiClient {
    pub fn new(openai: &OpenAiConfig, text_model: String, image: ImageSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                field: "http client".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            api_key: openai.api_key.clone(),
            base_url: openai.base_url.trim_end_matches('/').to_string(),
            text_model,
            image,
            client,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.openai,
            config.content.text.model.clone(),
            ImageSettings::from(&config.content.image),
        )
    }

    pub fn text_model(&self) -> &str {
        &self.text_model
    }

    /// POST a JSON body and decode the JSON reply
    ///
    /// `wrap` builds the caller's error variant from a status and message.
    async fn post_json<B, R>(
        &self,
        path: &str,
        body: &B,
        wrap: fn(Option<u16>, String) -> UpstreamError,
    ) -> std::result::Result<R, UpstreamError>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let url = format!("{}/{}", self.base_url, path);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| wrap(e.status().map(|s| s.as_u16()), e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(wrap(Some(status.as_u16()), api_error_message(&text)));
        }

        resp.json::<R>()
            .await
            .map_err(|e| wrap(None, format!("Invalid response body: {}", e)))
    }
}

/// Prefer the provider's `error.message` over the raw body
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.to_string())
}

fn completion_error(status: Option<u16>, message: String) -> UpstreamError {
    UpstreamError::Completion { status, message }
}

fn image_error(status: Option<u16>, message: String) -> UpstreamError {
    UpstreamError::ImageGeneration { status, message }
}

#[async_trait]
impl CompletionService for OpenAiClient {
    async fn complete(&self, system_prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.text_model,
            messages: vec![ChatMessage {
                role: "system",
                content: system_prompt,
            }],
        };

        let response: ChatResponse = self
            .post_json("chat/completions", &request, completion_error)
            .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| completion_error(None, "Response contained no choices".to_string()))?;

        debug!(model = %self.text_model, chars = content.chars().count(), "Received completion");
        Ok(content)
    }
}

#[async_trait]
impl ImageService for OpenAiClient {
    async fn generate_image(&self, prompt: &ImagePrompt) -> Result<String> {
        let request = ImageRequest {
            model: &self.image.model,
            prompt: prompt.as_str(),
            n: 1,
            quality: &self.image.quality,
            size: &self.image.size,
        };

        let response: ImageResponse = self
            .post_json("images/generations", &request, image_error)
            .await?;

        let url = response
            .data
            .into_iter()
            .next()
            .and_then(|d| d.url)
            .ok_or_else(|| image_error(None, "Response contained no image URL".to_string()))?;

        debug!(model = %self.image.model, size = %self.image.size, "Image generated");
        Ok(url)
    }

    async fn download(&self, locator: &str) -> Result<Vec<u8>> {
        let download_error = |status: Option<u16>, message: String| UpstreamError::Download {
            status,
            message,
        };

        let resp = self
            .client
            .get(locator)
            .send()
            .await
            .map_err(|e| download_error(e.status().map(|s| s.as_u16()), e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(download_error(
                Some(status.as_u16()),
                format!("GET {} returned {}", locator, status),
            )
            .into());
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| download_error(None, e.to_string()))?;

        debug!(bytes = bytes.len(), "Downloaded image");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OpenAiClient {
        let openai = OpenAiConfig {
            api_key: "sk-test".to_string(),
            base_url: "http://localhost:9999/v1/".to_string(),
        };
        OpenAiClient::new(
            &openai,
            "gpt-4o".to_string(),
            ImageSettings::from(&ImageConfig::default()),
        )
        .unwrap()
    }

    #[test]
    fn test_client_creation_trims_base_url() {
        let client = client();
        assert_eq!(client.base_url, "http://localhost:9999/v1");
        assert_eq!(client.text_model(), "gpt-4o");
    }

    #[test]
    fn test_image_settings_from_config() {
        let settings = ImageSettings::from(&ImageConfig::default());
        assert_eq!(settings.model, "dall-e-3");
        assert_eq!(settings.quality, "hd");
        assert_eq!(settings.size, "1792x1024");
    }

    #[test]
    fn test_api_error_message_extracts_provider_message() {
        let body = r#"{"error":{"message":"Invalid API key","type":"invalid_request_error"}}"#;
        assert_eq!(api_error_message(body), "Invalid API key");
    }

    #[test]
    fn test_api_error_message_falls_back_to_body() {
        assert_eq!(api_error_message("upstream timeout"), "upstream timeout");
    }

    #[test]
    fn test_chat_request_shape() {
        let request = ChatRequest {
            model: "gpt-4o",
            messages: vec![ChatMessage {
                role: "system",
                content: "Write one sentence.",
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "Write one sentence.");
    }

    #[test]
    fn test_image_request_shape() {
        let request = ImageRequest {
            model: "dall-e-3",
            prompt: "a quiet server room",
            n: 1,
            quality: "hd",
            size: "1792x1024",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["n"], 1);
        assert_eq!(json["quality"], "hd");
        assert_eq!(json["size"], "1792x1024");
    }
}
