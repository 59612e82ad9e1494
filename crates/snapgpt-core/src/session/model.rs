//! Session domain model.
//!
//! This module contains the core Session entity that represents one
//! conversation in the application's domain layer.

use super::chat_mode::ChatMode;
use super::message::Message;
use crate::config::BackendConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name given to freshly created sessions.
pub const DEFAULT_SESSION_NAME: &str = "New Chat";
/// Name stored when a rename would leave the label empty.
pub const FALLBACK_SESSION_NAME: &str = "Untitled Chat";

/// Represents one conversation in the application's domain layer.
///
/// A session contains:
/// - A user-editable label
/// - The ordered message transcript
/// - The conversation mode (regular chat or PDF discussion)
/// - The uploaded document's name, when one has been attached
/// - The user's model preference for regular chat turns
///
/// This is the "pure" domain model that business logic operates on,
/// independent of how the sidebar chooses to display it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier (UUID format), also the correlation key
    /// sent to the backend for chat continuity
    pub id: String,
    /// Human-readable session label
    pub name: String,
    /// Timestamp when the session was created; fixed for the session's
    /// lifetime and used only for date-bucket classification
    pub created_at: DateTime<Utc>,
    /// Ordered message history
    pub transcript: Vec<Message>,
    /// Current conversation mode
    pub mode: ChatMode,
    /// Uploaded document name; empty unless a PDF upload has set it
    #[serde(default)]
    pub pdf_name: String,
    /// Model preference for regular chat turns
    pub selected_model: String,
}

impl Session {
    /// Creates a fresh session with a new id, the default name, an empty
    /// transcript and `Regular` mode.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: DEFAULT_SESSION_NAME.to_string(),
            created_at: Utc::now(),
            transcript: Vec::new(),
            mode: ChatMode::Regular,
            pdf_name: String::new(),
            selected_model: model.into(),
        }
    }

    /// Sidebar label: the document name while in PDF mode, else the
    /// session name.
    pub fn display_label(&self) -> String {
        if self.mode.is_pdf() {
            format!("PDF: {}", self.pdf_name)
        } else {
            self.name.clone()
        }
    }

    /// The model a chat turn for this session must use.
    ///
    /// PDF-discussion sessions always use the fixed PDF-analysis model
    /// regardless of the stored preference.
    pub fn effective_model<'a>(&'a self, config: &'a BackendConfig) -> &'a str {
        if self.mode.is_pdf() {
            &config.pdf_model
        } else {
            &self.selected_model
        }
    }
}
