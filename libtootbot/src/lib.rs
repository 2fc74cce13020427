//! Tootbot - generated toots for the Fediverse
//!
//! This library asks a language model for a short post, optionally
//! illustrates it with a generated image, and publishes it to a Mastodon
//! compatible server with bounded retries.

pub mod bot;
pub mod config;
pub mod error;
pub mod generator;
pub mod illustrator;
pub mod logging;
pub mod platforms;
pub mod poster;
pub mod prompt;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use bot::{RunOptions, RunOutcome, TootBot};
pub use config::Config;
pub use error::{Result, TootbotError};
pub use types::{GeneratedText, MediaHandle, PostPayload, PostResult, Visibility};
