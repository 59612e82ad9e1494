//! Backend gateway trait.
//!
//! Defines the interface to the external inference backend, decoupling the
//! application's core logic from the HTTP transport.

use crate::error::Result;
use crate::session::InlineImage;
use async_trait::async_trait;

/// Result of a PDF upload: the extracted document text and the backend's
/// initial analysis of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfUpload {
    /// Full extracted text of the document
    pub text: String,
    /// Initial analysis summary produced by the backend
    pub analysis: String,
}

/// An abstract gateway to the inference backend.
///
/// Every operation is a single request/response with no automatic retry;
/// any non-success response or transport failure surfaces as
/// [`SnapGptError::Backend`](crate::SnapGptError::Backend).
#[async_trait]
pub trait BackendGateway: Send + Sync {
    /// Sends one regular chat turn.
    ///
    /// # Arguments
    ///
    /// * `session_id` - Correlation key for conversation continuity
    /// * `text` - The user's message
    /// * `model` - Model identifier to answer with
    /// * `image` - Optional attached image
    ///
    /// # Returns
    ///
    /// The assistant's reply text.
    async fn send_chat_turn(
        &self,
        session_id: &str,
        text: &str,
        model: &str,
        image: Option<&InlineImage>,
    ) -> Result<String>;

    /// Asks a question against an uploaded document's extracted text.
    ///
    /// # Returns
    ///
    /// The assistant's answer text.
    async fn send_pdf_question(&self, question: &str, pdf_text: &str, model: &str)
    -> Result<String>;

    /// Uploads a PDF for extraction and initial analysis.
    async fn upload_pdf(&self, file: Vec<u8>, file_name: &str) -> Result<PdfUpload>;

    /// Notifies the backend that a session's server-side history should be
    /// discarded. Best-effort; callers log failures instead of surfacing
    /// them.
    async fn reset_session(&self, session_id: &str) -> Result<()>;
}
