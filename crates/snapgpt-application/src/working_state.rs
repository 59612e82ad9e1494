//! Working copy of the active conversation.
//!
//! The controller mutates this state on every user action and mirrors it
//! back into the session store on switches and workflow completions. It
//! matches the active session's persisted record at all times except
//! during an in-flight request, when the transcript already holds the
//! optimistically appended user message.

use snapgpt_core::attachment::ComposeAttachments;
use snapgpt_core::config::BackendConfig;
use snapgpt_core::session::{ChatMode, Message, Session, SessionPatch};

/// The controller's request state. Entering any non-idle phase disables
/// new submissions of the same action class until the operation resolves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ControllerPhase {
    /// Waiting for user input.
    #[default]
    Idle,
    /// A regular chat turn is in flight.
    AwaitingChatReply,
    /// A PDF-mode question is in flight.
    AwaitingPdfReply,
    /// A PDF upload is in flight.
    UploadingPdf,
}

impl ControllerPhase {
    /// True while a chat or PDF reply is pending.
    pub fn is_awaiting_reply(&self) -> bool {
        matches!(self, Self::AwaitingChatReply | Self::AwaitingPdfReply)
    }
}

/// An in-progress rename of a session label.
#[derive(Debug, Clone)]
pub(crate) struct RenameEdit {
    pub session_id: String,
    pub buffer: String,
}

/// The live state of the active conversation.
#[derive(Debug)]
pub(crate) struct WorkingState {
    /// Id of the active session
    pub active_id: String,
    /// Working transcript, including optimistic entries
    pub transcript: Vec<Message>,
    /// Current conversation mode
    pub mode: ChatMode,
    /// Uploaded document name (kept even after a failed upload)
    pub pdf_name: String,
    /// Model preference for regular chat turns
    pub selected_model: String,
    /// Compose-box attachments (pending image, cached document text)
    pub compose: ComposeAttachments,
    /// Request state machine
    pub phase: ControllerPhase,
}

impl WorkingState {
    /// Builds the working state for a freshly activated session.
    pub fn from_session(session: Session) -> Self {
        Self {
            active_id: session.id,
            transcript: session.transcript,
            mode: session.mode,
            pdf_name: session.pdf_name,
            selected_model: session.selected_model,
            compose: ComposeAttachments::new(),
            phase: ControllerPhase::Idle,
        }
    }

    /// Replaces the working state with another session's fields.
    ///
    /// Compose attachments are dropped; the request phase is untouched so
    /// an in-flight call can still observe that the active session
    /// changed underneath it.
    pub fn load_session(&mut self, session: Session) {
        self.active_id = session.id;
        self.transcript = session.transcript;
        self.mode = session.mode;
        self.pdf_name = session.pdf_name;
        self.selected_model = session.selected_model;
        self.compose.clear();
    }

    /// The patch that mirrors this working state into the stored record.
    /// The session name is store-owned and never part of the mirror.
    pub fn to_patch(&self) -> SessionPatch {
        SessionPatch {
            name: None,
            transcript: Some(self.transcript.clone()),
            mode: Some(self.mode),
            pdf_name: Some(self.pdf_name.clone()),
            selected_model: Some(self.selected_model.clone()),
        }
    }

    /// The model a chat turn must use right now: the fixed PDF model while
    /// in PDF mode, else the session's preference.
    pub fn effective_model<'a>(&'a self, config: &'a BackendConfig) -> &'a str {
        if self.mode.is_pdf() {
            &config.pdf_model
        } else {
            &self.selected_model
        }
    }
}
