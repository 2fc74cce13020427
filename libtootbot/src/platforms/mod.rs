//! Posting service abstraction and implementations
//!
//! # Examples
//!
//! ```no_run
//! use libtootbot::platforms::{mastodon::MastodonClient, TootPlatform};
//! use libtootbot::types::{GeneratedText, PostPayload, Visibility};
//!
//! # async fn example() -> libtootbot::error::Result<()> {
//! let client = MastodonClient::new(
//!     "https://mastodon.social".to_string(),
//!     "your-access-token".to_string(),
//! )?;
//!
//! let handle = client.upload_media(vec![0u8; 16], "Alt text").await?;
//! let payload = PostPayload::new(GeneratedText::new("Hello".into()), Visibility::Direct)
//!     .with_media(handle);
//! let result = client.post_status(&payload).await?;
//! println!("{}", result.address);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{MediaHandle, PostPayload, PostResult};

pub mod mastodon;

// Mock platform is available for all builds (not just tests) to support integration tests
pub mod mock;

/// Posting service for a federated social network
#[async_trait]
pub trait TootPlatform: Send + Sync {
    /// Upload a binary attachment with its description
    ///
    /// # Errors
    ///
    /// Returns `UpstreamError::MediaUpload` if the upload is rejected or the
    /// service is unreachable.
    async fn upload_media(&self, bytes: Vec<u8>, description: &str) -> Result<MediaHandle>;

    /// Create a status from `payload` and return the post's address
    ///
    /// # Errors
    ///
    /// Returns `UpstreamError::Posting`, carrying the HTTP status when the
    /// service reported one. Retry decisions are made by
    /// [`crate::poster::publish`], never here.
    async fn post_status(&self, payload: &PostPayload) -> Result<PostResult>;

    /// Lowercase identifier used in logs
    fn name(&self) -> &str;
}
