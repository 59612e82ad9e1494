//! Compose-box attachment state.
//!
//! Holds at most one pending image and the extracted text of the active
//! document. This state belongs to the in-progress compose box, not to any
//! session record, and is dropped on session switches.

use crate::session::InlineImage;

/// The extracted text of an uploaded document, cached for PDF-mode
/// question routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfContext {
    /// Full extracted text of the document
    pub text: String,
    /// Document label shown in the UI
    pub name: String,
}

/// Pending attachments for the next message.
#[derive(Debug, Clone, Default)]
pub struct ComposeAttachments {
    image: Option<InlineImage>,
    pdf_context: Option<PdfContext>,
}

impl ComposeAttachments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any pending image with a freshly encoded one.
    pub fn attach_image(&mut self, bytes: &[u8], media_type: impl Into<String>) {
        self.image = Some(InlineImage::from_bytes(bytes, media_type));
    }

    pub fn clear_image(&mut self) {
        self.image = None;
    }

    pub fn image(&self) -> Option<&InlineImage> {
        self.image.as_ref()
    }

    /// Caches an uploaded document's extracted text. While set, the
    /// controller routes questions through the PDF endpoint.
    pub fn set_pdf_context(&mut self, text: impl Into<String>, name: impl Into<String>) {
        self.pdf_context = Some(PdfContext {
            text: text.into(),
            name: name.into(),
        });
    }

    pub fn clear_pdf_context(&mut self) {
        self.pdf_context = None;
    }

    pub fn pdf_context(&self) -> Option<&PdfContext> {
        self.pdf_context.as_ref()
    }

    /// Drops both the pending image and the cached document text.
    pub fn clear(&mut self) {
        self.image = None;
        self.pdf_context = None;
    }
}
