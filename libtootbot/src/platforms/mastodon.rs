//! Mastodon posting service
//!
//! Talks to Mastodon and other Fediverse servers implementing the Mastodon
//! API through the megalodon library.

use async_trait::async_trait;
use megalodon::entities::{StatusVisibility, UploadMedia};
use megalodon::megalodon::{PostStatusInputOptions, PostStatusOutput, UploadMediaInputOptions};
use megalodon::error::Error as MegalodonError;
use megalodon::{Megalodon, SNS};
use tracing::debug;

use crate::config::{normalize_instance_url, MastodonConfig};
use crate::error::{ConfigError, Result, UpstreamError};
use crate::platforms::TootPlatform;
use crate::types::{MediaHandle, PostPayload, PostResult, Visibility};

pub struct MastodonClient {
    client: Box<dyn Megalodon + Send + Sync>,

    /// The instance URL (e.g., "https://mastodon.social")
    instance_url: String,
}

impl MastodonClient {
    /// Create a new Mastodon client
    ///
    /// `instance_url` gets an `https://` prefix when it has no scheme.
    pub fn new(instance_url: String, access_token: String) -> Result<Self> {
        let instance_url = normalize_instance_url(&instance_url);

        let client = megalodon::generator(
            SNS::Mastodon,
            instance_url.clone(),
            Some(access_token),
            None,
        )
        .map_err(|e| ConfigError::InvalidValue {
            field: "URL".to_string(),
            reason: format!("Failed to create Mastodon client: {:?}", e),
        })?;

        Ok(Self {
            client,
            instance_url,
        })
    }

    pub fn from_config(config: &MastodonConfig) -> Result<Self> {
        Self::new(config.instance.clone(), config.access_token.clone())
    }

    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }
}

#[async_trait]
impl TootPlatform for MastodonClient {
    async fn upload_media(&self, bytes: Vec<u8>, description: &str) -> Result<MediaHandle> {
        let size = bytes.len();
        let options = UploadMediaInputOptions {
            description: Some(description.to_string()),
            ..Default::default()
        };

        let response = self
            .client
            .upload_media_reader(Box::new(std::io::Cursor::new(bytes)), Some(&options))
            .await
            .map_err(|e| map_megalodon_error(e, "upload media", media_upload_error))?;

        let id = match response.json {
            UploadMedia::Attachment(attachment) => attachment.id,
            UploadMedia::AsyncAttachment(attachment) => attachment.id,
        };

        debug!(media_id = %id, bytes = size, "Uploaded media");
        Ok(MediaHandle(id))
    }

    async fn post_status(&self, payload: &PostPayload) -> Result<PostResult> {
        let media_ids = if payload.media.is_empty() {
            None
        } else {
            Some(payload.media.iter().map(|m| m.0.clone()).collect())
        };

        let options = PostStatusInputOptions {
            media_ids,
            visibility: Some(status_visibility(payload.visibility)),
            ..Default::default()
        };

        let response = self
            .client
            .post_status(payload.text.as_str().to_string(), Some(&options))
            .await
            .map_err(|e| map_megalodon_error(e, "post status", posting_error))?;

        match response.json {
            PostStatusOutput::Status(status) => Ok(PostResult {
                address: status.url.unwrap_or(status.uri),
            }),
            PostStatusOutput::ScheduledStatus(scheduled) => Err(UpstreamError::Posting {
                status: Some(200),
                message: format!(
                    "Instance scheduled the status instead of publishing it (id {})",
                    scheduled.id
                ),
            }
            .into()),
        }
    }

    fn name(&self) -> &str {
        "mastodon"
    }
}

fn status_visibility(visibility: Visibility) -> StatusVisibility {
    match visibility {
        Visibility::Direct => StatusVisibility::Direct,
        Visibility::Public => StatusVisibility::Public,
        Visibility::Unlisted => StatusVisibility::Unlisted,
        Visibility::Private => StatusVisibility::Private,
    }
}

fn media_upload_error(status: Option<u16>, message: String) -> UpstreamError {
    UpstreamError::MediaUpload { status, message }
}

fn posting_error(status: Option<u16>, message: String) -> UpstreamError {
    UpstreamError::Posting { status, message }
}

/// Map megalodon errors to UpstreamError
///
/// The HTTP status comes from the structured error when megalodon reports
/// one; the error text is only scanned for variants that carry no status.
fn map_megalodon_error(
    error: MegalodonError,
    context: &str,
    wrap: fn(Option<u16>, String) -> UpstreamError,
) -> UpstreamError {
    let (status, detail) = match error {
        MegalodonError::OwnError(own) => (own.status, own.message),
        MegalodonError::RequestError(e) => (e.status().map(|s| s.as_u16()), e.to_string()),
        other => {
            let detail = other.to_string();
            (extract_http_status(&detail), detail)
        }
    };

    let hint = match status {
        Some(401) | Some(403) => " Verify that TOKEN is valid and has write scopes.",
        Some(422) => " The instance rejected the content.",
        Some(429) => " Rate limit exceeded, try again later.",
        Some(500..=599) => " The instance may be experiencing issues.",
        _ => "",
    };

    wrap(
        status,
        format!("Mastodon {} failed: {}.{}", context, detail.trim(), hint),
    )
}

/// Extract HTTP status code from error message
///
/// Looks for patterns like "HTTP 401", "status 403", "code: 422" and bare
/// codes followed by a colon, a space or the end of the text.
fn extract_http_status(error_str: &str) -> Option<u16> {
    let prefixes = ["HTTP ", "status ", "code: ", "status_code: "];

    for prefix in &prefixes {
        if let Some(pos) = error_str.find(prefix) {
            let code = error_str[pos + prefix.len()..]
                .get(0..3)
                .and_then(|s| s.parse::<u16>().ok())
                .filter(|c| (100..=599).contains(c));
            if code.is_some() {
                return code;
            }
        }
    }

    let bytes = error_str.as_bytes();
    for (i, window) in bytes.windows(3).enumerate() {
        let boundary_after = matches!(bytes.get(i + 3), None | Some(b':') | Some(b' '));
        let is_code = window.iter().all(u8::is_ascii_digit)
            && boundary_after
            && (i == 0 || !bytes[i - 1].is_ascii_digit());
        if !is_code {
            continue;
        }
        let code = std::str::from_utf8(window)
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .filter(|c| (100..=599).contains(c));
        if code.is_some() {
            return code;
        }
    }

    None
}
