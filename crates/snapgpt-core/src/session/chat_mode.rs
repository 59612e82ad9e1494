//! Conversation mode types for session state management.

use serde::{Deserialize, Serialize};

/// Represents the current conversation mode of a session.
///
/// `Regular` is free-form multimodal chat; `PdfDiscussion` answers
/// questions against one uploaded document's extracted text. The document
/// name lives on the session (`pdf_name`) rather than in this enum because
/// a failed upload legitimately leaves a name behind while the mode stays
/// `Regular`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatMode {
    /// Free-form chat against the session's selected model.
    #[default]
    Regular,
    /// Document-grounded question answering over a cached PDF text.
    PdfDiscussion,
}

impl ChatMode {
    /// Returns true while in PDF-discussion mode.
    pub fn is_pdf(&self) -> bool {
        matches!(self, Self::PdfDiscussion)
    }
}
