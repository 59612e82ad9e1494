//! Transcript message types.
//!
//! This module contains types for representing messages in a conversation
//! transcript, including the sender and an optional inline image payload.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents the sender of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    /// Message from the user.
    User,
    /// Message from the assistant (including notices and error texts).
    Bot,
}

/// An image held in memory as a base64 payload with its media type.
///
/// The same representation serves inline display and transmission to the
/// backend, which expects a `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineImage {
    /// MIME type of the image (e.g. `image/png`)
    pub media_type: String,
    /// Base64-encoded image bytes
    pub data: String,
}

impl InlineImage {
    /// Encodes raw image bytes into an in-memory representation.
    pub fn from_bytes(bytes: &[u8], media_type: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            data: BASE64_STANDARD.encode(bytes),
        }
    }

    /// Renders the `data:<mime>;base64,<payload>` form used on the wire.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// A single message in a conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier (UUID format)
    pub id: String,
    /// Who produced the message
    pub sender: Sender,
    /// Display text; may contain newlines and light markdown
    pub text: String,
    /// Inline image, present only on user messages sent with an attachment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<InlineImage>,
    /// Timestamp when the message was created
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a user message, optionally carrying an attached image.
    pub fn user(text: impl Into<String>, image: Option<InlineImage>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender: Sender::User,
            text: text.into(),
            image,
            timestamp: Utc::now(),
        }
    }

    /// Creates a bot message.
    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender: Sender::Bot,
            text: text.into(),
            image: None,
            timestamp: Utc::now(),
        }
    }
}
