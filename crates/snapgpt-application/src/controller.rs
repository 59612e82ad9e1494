//! Active session controller.
//!
//! `ChatController` is the single owner of the conversation state the UI
//! displays. It decides which session is active, mirrors the working
//! transcript/mode/model into the session store on every transition, and
//! orchestrates the chat, PDF-question and upload workflows against the
//! backend gateway. Backend failures never escape these workflows; they
//! become bot messages in the transcript.

use crate::working_state::{ControllerPhase, RenameEdit, WorkingState};
use chrono::{DateTime, Utc};
use snapgpt_core::config::BackendConfig;
use snapgpt_core::error::{Result, SnapGptError};
use snapgpt_core::gateway::BackendGateway;
use snapgpt_core::session::{
    ChatMode, DEFAULT_SESSION_NAME, InlineImage, Message, Session, SessionGroups, SessionStore,
};
use std::sync::Arc;
use tokio::sync::RwLock;

const CHAT_ERROR_TEXT: &str =
    "Sorry, there was an error connecting to the chatbot. Please try again.";
const PDF_ERROR_TEXT: &str = "Sorry, there was an error processing the PDF. Please try again.";
const EXIT_PDF_TEXT: &str = "Exited PDF mode. You're now back in normal chat mode.";

fn pdf_loaded_text(file_name: &str, model: &str) -> String {
    format!(
        "PDF \"{file_name}\" successfully loaded. The document has been analyzed and you can now ask questions about its content. Model automatically switched to {model}."
    )
}

fn initial_analysis_text(analysis: &str) -> String {
    format!("**Initial Analysis**\n\n{analysis}")
}

/// A network call prepared under the state lock and issued with it
/// released.
enum PendingCall {
    Chat {
        text: String,
        model: String,
        image: Option<InlineImage>,
    },
    Pdf {
        question: String,
        pdf_text: String,
        model: String,
    },
}

/// The core state machine behind the chat view.
///
/// Lock order is `working` before `store` everywhere; network calls are
/// issued with both released. Every request records the session id it was
/// issued for, and its result is discarded if that session is no longer
/// active on completion.
pub struct ChatController {
    store: RwLock<SessionStore>,
    working: RwLock<WorkingState>,
    rename_edit: RwLock<Option<RenameEdit>>,
    gateway: Arc<dyn BackendGateway>,
    config: BackendConfig,
}

impl ChatController {
    /// Creates a controller with one fresh, active session.
    pub fn new(gateway: Arc<dyn BackendGateway>, config: BackendConfig) -> Self {
        let mut store = SessionStore::new();
        let initial = store.create(config.chat_model.as_str());
        tracing::info!("[ChatController] created initial session {}", initial.id);
        Self {
            store: RwLock::new(store),
            working: RwLock::new(WorkingState::from_session(initial)),
            rename_edit: RwLock::new(None),
            gateway,
            config,
        }
    }

    /// Mirrors the working state into the active session's stored record.
    async fn persist_working(&self) {
        let working = self.working.read().await;
        let mut store = self.store.write().await;
        store.update(&working.active_id, working.to_patch());
    }

    // ========================================================================
    // Send workflow
    // ========================================================================

    /// Sends the compose-box content as one turn.
    ///
    /// No-op when the text is blank and no image is attached, or while a
    /// reply is already pending. The user message is appended
    /// optimistically before the network call resolves; a failure appends
    /// a fixed error notice instead of surfacing to the caller. The
    /// pending image is cleared on completion either way.
    pub async fn send_message(&self, text: &str) {
        let (issued_for, call) = {
            let mut working = self.working.write().await;
            if working.phase.is_awaiting_reply() {
                tracing::debug!("[ChatController] send rejected: a reply is already pending");
                return;
            }
            let image = working.compose.image().cloned();
            if text.trim().is_empty() && image.is_none() {
                return;
            }

            working.transcript.push(Message::user(text, image.clone()));

            let pdf_context = working.compose.pdf_context().cloned();
            let call = match pdf_context {
                Some(context) if working.mode.is_pdf() => {
                    working.phase = ControllerPhase::AwaitingPdfReply;
                    PendingCall::Pdf {
                        question: text.to_string(),
                        pdf_text: context.text,
                        model: self.config.pdf_model.clone(),
                    }
                }
                _ => {
                    working.phase = ControllerPhase::AwaitingChatReply;
                    PendingCall::Chat {
                        text: text.to_string(),
                        model: working.effective_model(&self.config).to_string(),
                        image,
                    }
                }
            };
            (working.active_id.clone(), call)
        };
        // Make the optimistic user message visible in the stored record too.
        self.persist_working().await;

        let outcome = match &call {
            PendingCall::Chat { text, model, image } => {
                self.gateway
                    .send_chat_turn(&issued_for, text, model, image.as_ref())
                    .await
            }
            PendingCall::Pdf {
                question,
                pdf_text,
                model,
            } => self.gateway.send_pdf_question(question, pdf_text, model).await,
        };

        {
            let mut working = self.working.write().await;
            working.phase = ControllerPhase::Idle;
            working.compose.clear_image();
            if working.active_id != issued_for {
                tracing::warn!(
                    "[ChatController] discarding reply for inactive session {}",
                    issued_for
                );
                return;
            }
            match outcome {
                Ok(reply) => working.transcript.push(Message::bot(reply)),
                Err(err) => {
                    tracing::error!("[ChatController] chat turn failed: {}", err);
                    working.transcript.push(Message::bot(CHAT_ERROR_TEXT));
                }
            }
        }
        self.persist_working().await;
    }

    // ========================================================================
    // PDF upload workflow
    // ========================================================================

    /// Uploads a PDF and promotes its extracted text into the session's
    /// working context.
    ///
    /// The document name and the forced PDF model are applied eagerly,
    /// before the upload resolves, and are kept even when it fails; only
    /// the mode transition is withheld until success.
    pub async fn upload_pdf(&self, file: Vec<u8>, file_name: &str) {
        if file.is_empty() {
            return;
        }
        let issued_for = {
            let mut working = self.working.write().await;
            if working.phase == ControllerPhase::UploadingPdf {
                tracing::debug!("[ChatController] upload rejected: an upload is already pending");
                return;
            }
            working.pdf_name = file_name.to_string();
            working.selected_model = self.config.pdf_model.clone();
            working.phase = ControllerPhase::UploadingPdf;
            working.active_id.clone()
        };

        let outcome = self.gateway.upload_pdf(file, file_name).await;

        {
            let mut working = self.working.write().await;
            working.phase = ControllerPhase::Idle;
            if working.active_id != issued_for {
                tracing::warn!(
                    "[ChatController] discarding PDF upload result for inactive session {}",
                    issued_for
                );
                return;
            }
            match outcome {
                Ok(upload) => {
                    working.compose.set_pdf_context(upload.text, file_name);
                    working.mode = ChatMode::PdfDiscussion;
                    working
                        .transcript
                        .push(Message::bot(pdf_loaded_text(file_name, &self.config.pdf_model)));
                    working
                        .transcript
                        .push(Message::bot(initial_analysis_text(&upload.analysis)));
                    tracing::info!(
                        "[ChatController] session {} entered PDF mode with \"{}\"",
                        issued_for,
                        file_name
                    );
                }
                Err(err) => {
                    tracing::error!("[ChatController] PDF upload failed: {}", err);
                    working.transcript.push(Message::bot(PDF_ERROR_TEXT));
                }
            }
        }
        self.persist_working().await;
    }

    /// Leaves PDF mode: clears the document name and cached text, appends
    /// a notice, and keeps the selected model as-is.
    pub async fn exit_pdf_mode(&self) {
        {
            let mut working = self.working.write().await;
            if !working.mode.is_pdf() {
                return;
            }
            working.mode = ChatMode::Regular;
            working.pdf_name.clear();
            working.compose.clear_pdf_context();
            working.transcript.push(Message::bot(EXIT_PDF_TEXT));
        }
        self.persist_working().await;
    }

    // ========================================================================
    // Session lifecycle
    // ========================================================================

    /// Switches to another session.
    ///
    /// Persists the working state into the current record first, then
    /// loads the target's fields as the new working state. Unknown ids
    /// leave the current session untouched.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no session with this id exists.
    pub async fn switch_to(&self, id: &str) -> Result<()> {
        let mut working = self.working.write().await;
        if working.active_id == id {
            return Ok(());
        }
        let mut store = self.store.write().await;
        store.update(&working.active_id, working.to_patch());
        let Some(target) = store.get(id).cloned() else {
            return Err(SnapGptError::not_found("Session", id));
        };
        working.load_session(target);
        tracing::info!("[ChatController] switched to session {}", id);
        Ok(())
    }

    /// Persists the current session, then creates and activates a fresh
    /// one on the default chat model.
    ///
    /// # Returns
    ///
    /// The new session's id.
    pub async fn create_new(&self) -> String {
        let mut working = self.working.write().await;
        let mut store = self.store.write().await;
        store.update(&working.active_id, working.to_patch());
        let fresh = store.create(self.config.chat_model.as_str());
        tracing::info!("[ChatController] created session {}", fresh.id);
        let id = fresh.id.clone();
        working.load_session(fresh);
        id
    }

    /// Deletes a session.
    ///
    /// When the active session is deleted, the first remaining entry is
    /// activated, or a fresh session is created so the list is never
    /// empty. Unknown ids are a no-op.
    pub async fn delete_session(&self, id: &str) {
        let mut working = self.working.write().await;
        let mut store = self.store.write().await;
        if !store.delete(id) {
            tracing::debug!("[ChatController] delete: unknown session {}", id);
            return;
        }
        tracing::info!("[ChatController] deleted session {}", id);
        if working.active_id != id {
            return;
        }
        match store.sessions().first().cloned() {
            Some(next) => working.load_session(next),
            None => {
                let fresh = store.create(self.config.chat_model.as_str());
                tracing::info!("[ChatController] created replacement session {}", fresh.id);
                working.load_session(fresh);
            }
        }
    }

    /// Notifies the backend to drop the session's server-side history
    /// (best effort, failures only logged), then starts a fresh session.
    pub async fn reset_chat(&self) -> String {
        let session_id = self.working.read().await.active_id.clone();
        if let Err(err) = self.gateway.reset_session(&session_id).await {
            tracing::warn!("[ChatController] backend reset failed (ignored): {}", err);
        }
        self.create_new().await
    }

    // ========================================================================
    // Rename
    // ========================================================================

    /// Renames a session directly. Whitespace-only names fall back to the
    /// default untitled label.
    pub async fn rename_session(&self, id: &str, new_name: &str) {
        let mut store = self.store.write().await;
        store.rename(id, new_name);
    }

    /// Starts editing a session's label, seeding the buffer with the
    /// current name.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no session with this id exists.
    pub async fn begin_rename(&self, id: &str) -> Result<()> {
        let current = {
            let store = self.store.read().await;
            store
                .get(id)
                .map(|s| s.name.clone())
                .ok_or_else(|| SnapGptError::not_found("Session", id))?
        };
        let mut edit = self.rename_edit.write().await;
        *edit = Some(RenameEdit {
            session_id: id.to_string(),
            buffer: current,
        });
        Ok(())
    }

    /// Replaces the rename buffer. No-op when no edit is in progress.
    pub async fn edit_rename(&self, buffer: &str) {
        if let Some(edit) = self.rename_edit.write().await.as_mut() {
            edit.buffer = buffer.to_string();
        }
    }

    /// Commits the in-progress rename.
    pub async fn commit_rename(&self) {
        let Some(edit) = self.rename_edit.write().await.take() else {
            return;
        };
        let mut store = self.store.write().await;
        store.rename(&edit.session_id, &edit.buffer);
    }

    /// Discards the in-progress rename.
    pub async fn cancel_rename(&self) {
        *self.rename_edit.write().await = None;
    }

    // ========================================================================
    // Compose box
    // ========================================================================

    /// Attaches an image to the next message, replacing any pending one.
    pub async fn attach_image(&self, bytes: &[u8], media_type: &str) {
        let mut working = self.working.write().await;
        working.compose.attach_image(bytes, media_type);
    }

    /// Drops the pending image.
    pub async fn clear_image(&self) {
        let mut working = self.working.write().await;
        working.compose.clear_image();
    }

    pub async fn has_attached_image(&self) -> bool {
        self.working.read().await.compose.image().is_some()
    }

    /// Updates the session's model preference and mirrors it into the
    /// stored record. Ignored while in PDF mode, where the model is fixed.
    pub async fn set_model(&self, model: &str) {
        {
            let mut working = self.working.write().await;
            if working.mode.is_pdf() {
                tracing::debug!("[ChatController] model change ignored while in PDF mode");
                return;
            }
            working.selected_model = model.to_string();
        }
        self.persist_working().await;
    }

    // ========================================================================
    // Read accessors
    // ========================================================================

    pub async fn active_session_id(&self) -> String {
        self.working.read().await.active_id.clone()
    }

    pub async fn transcript(&self) -> Vec<Message> {
        self.working.read().await.transcript.clone()
    }

    pub async fn mode(&self) -> ChatMode {
        self.working.read().await.mode
    }

    pub async fn pdf_name(&self) -> String {
        self.working.read().await.pdf_name.clone()
    }

    pub async fn selected_model(&self) -> String {
        self.working.read().await.selected_model.clone()
    }

    pub async fn phase(&self) -> ControllerPhase {
        self.working.read().await.phase
    }

    /// Header line for the active conversation: the document while in PDF
    /// mode, else the session's stored name.
    pub async fn header_label(&self) -> String {
        let working = self.working.read().await;
        if working.mode.is_pdf() {
            return format!("PDF Discussion: {}", working.pdf_name);
        }
        let store = self.store.read().await;
        store
            .get(&working.active_id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| DEFAULT_SESSION_NAME.to_string())
    }

    /// All sessions in display order, with the working state freshly
    /// mirrored in.
    pub async fn sessions(&self) -> Vec<Session> {
        self.persist_working().await;
        self.store.read().await.sessions().to_vec()
    }

    /// Sidebar grouping relative to `reference`, with the working state
    /// freshly mirrored in.
    pub async fn grouped_sessions(&self, reference: DateTime<Utc>) -> SessionGroups {
        self.persist_working().await;
        self.store.read().await.grouped_by_date(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use snapgpt_core::gateway::PdfUpload;
    use snapgpt_core::session::Sender;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Notify;

    /// Call-recording gateway with scripted outcomes.
    #[derive(Default)]
    struct MockGateway {
        chat_calls: Mutex<Vec<(String, String, String, bool)>>,
        pdf_calls: Mutex<Vec<(String, String, String)>>,
        reset_calls: Mutex<Vec<String>>,
        fail_chat: AtomicBool,
        fail_upload: AtomicBool,
        fail_reset: AtomicBool,
    }

    impl MockGateway {
        fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn chat_call_count(&self) -> usize {
            self.chat_calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl BackendGateway for MockGateway {
        async fn send_chat_turn(
            &self,
            session_id: &str,
            text: &str,
            model: &str,
            image: Option<&InlineImage>,
        ) -> snapgpt_core::error::Result<String> {
            self.chat_calls.lock().unwrap().push((
                session_id.to_string(),
                text.to_string(),
                model.to_string(),
                image.is_some(),
            ));
            if self.fail_chat.load(Ordering::SeqCst) {
                Err(SnapGptError::backend("mock chat failure"))
            } else {
                Ok(format!("reply to: {text}"))
            }
        }

        async fn send_pdf_question(
            &self,
            question: &str,
            pdf_text: &str,
            model: &str,
        ) -> snapgpt_core::error::Result<String> {
            self.pdf_calls.lock().unwrap().push((
                question.to_string(),
                pdf_text.to_string(),
                model.to_string(),
            ));
            Ok(format!("answer to: {question}"))
        }

        async fn upload_pdf(
            &self,
            _file: Vec<u8>,
            _file_name: &str,
        ) -> snapgpt_core::error::Result<PdfUpload> {
            if self.fail_upload.load(Ordering::SeqCst) {
                Err(SnapGptError::backend("mock upload failure"))
            } else {
                Ok(PdfUpload {
                    text: "extracted text".to_string(),
                    analysis: "a short summary".to_string(),
                })
            }
        }

        async fn reset_session(&self, session_id: &str) -> snapgpt_core::error::Result<()> {
            self.reset_calls.lock().unwrap().push(session_id.to_string());
            if self.fail_reset.load(Ordering::SeqCst) {
                Err(SnapGptError::backend("mock reset failure"))
            } else {
                Ok(())
            }
        }
    }

    /// Gateway whose chat call blocks until released, for in-flight tests.
    #[derive(Default)]
    struct BlockingGateway {
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl BackendGateway for BlockingGateway {
        async fn send_chat_turn(
            &self,
            _session_id: &str,
            _text: &str,
            _model: &str,
            _image: Option<&InlineImage>,
        ) -> snapgpt_core::error::Result<String> {
            self.started.notify_one();
            self.release.notified().await;
            Ok("late reply".to_string())
        }

        async fn send_pdf_question(
            &self,
            _question: &str,
            _pdf_text: &str,
            _model: &str,
        ) -> snapgpt_core::error::Result<String> {
            unreachable!("not used in blocking tests")
        }

        async fn upload_pdf(
            &self,
            _file: Vec<u8>,
            _file_name: &str,
        ) -> snapgpt_core::error::Result<PdfUpload> {
            unreachable!("not used in blocking tests")
        }

        async fn reset_session(&self, _session_id: &str) -> snapgpt_core::error::Result<()> {
            Ok(())
        }
    }

    fn controller_with(gateway: Arc<dyn BackendGateway>) -> ChatController {
        ChatController::new(gateway, BackendConfig::default())
    }

    #[tokio::test]
    async fn starts_with_one_active_session() {
        let controller = controller_with(MockGateway::new());
        let sessions = controller.sessions().await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, controller.active_session_id().await);
        assert_eq!(sessions[0].name, DEFAULT_SESSION_NAME);
    }

    #[tokio::test]
    async fn send_appends_user_and_bot_messages() {
        let gateway = MockGateway::new();
        let controller = controller_with(gateway.clone());

        controller.send_message("hello").await;

        let transcript = controller.transcript().await;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].sender, Sender::User);
        assert_eq!(transcript[0].text, "hello");
        assert_eq!(transcript[1].sender, Sender::Bot);
        assert_eq!(transcript[1].text, "reply to: hello");
        assert_eq!(gateway.chat_call_count(), 1);
    }

    #[tokio::test]
    async fn send_uses_session_id_and_selected_model() {
        let gateway = MockGateway::new();
        let controller = controller_with(gateway.clone());
        let active = controller.active_session_id().await;

        controller.send_message("hi").await;

        let calls = gateway.chat_calls.lock().unwrap();
        assert_eq!(calls[0].0, active);
        assert_eq!(calls[0].2, BackendConfig::default().chat_model);
        assert!(!calls[0].3);
    }

    #[tokio::test]
    async fn blank_send_without_image_is_a_noop() {
        let gateway = MockGateway::new();
        let controller = controller_with(gateway.clone());

        controller.send_message("   ").await;

        assert!(controller.transcript().await.is_empty());
        assert_eq!(gateway.chat_call_count(), 0);
    }

    #[tokio::test]
    async fn image_only_send_goes_through_and_clears_the_attachment() {
        let gateway = MockGateway::new();
        let controller = controller_with(gateway.clone());
        controller.attach_image(b"png bytes", "image/png").await;

        controller.send_message("").await;

        let transcript = controller.transcript().await;
        assert_eq!(transcript.len(), 2);
        assert!(transcript[0].image.is_some());
        assert!(gateway.chat_calls.lock().unwrap()[0].3);
        assert!(!controller.has_attached_image().await);
    }

    #[tokio::test]
    async fn chat_failure_appends_the_fixed_error_notice() {
        let gateway = MockGateway::new();
        gateway.fail_chat.store(true, Ordering::SeqCst);
        let controller = controller_with(gateway.clone());

        controller.send_message("hello").await;

        let transcript = controller.transcript().await;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].sender, Sender::Bot);
        assert_eq!(transcript[1].text, CHAT_ERROR_TEXT);
        assert_eq!(controller.phase().await, ControllerPhase::Idle);
    }

    #[tokio::test]
    async fn send_is_rejected_while_a_reply_is_pending() {
        let gateway = Arc::new(BlockingGateway::default());
        let controller = Arc::new(controller_with(gateway.clone()));

        let background = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.send_message("first").await })
        };
        gateway.started.notified().await;

        controller.send_message("second").await;
        // Only the first optimistic message is present and only one call
        // went out.
        assert_eq!(controller.transcript().await.len(), 1);

        gateway.release.notify_one();
        background.await.unwrap();

        let transcript = controller.transcript().await;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].text, "late reply");
        assert_eq!(controller.phase().await, ControllerPhase::Idle);
    }

    #[tokio::test]
    async fn reply_for_a_switched_away_session_is_discarded() {
        let gateway = Arc::new(BlockingGateway::default());
        let controller = Arc::new(controller_with(gateway.clone()));
        let original = controller.active_session_id().await;

        let background = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.send_message("question").await })
        };
        gateway.started.notified().await;

        controller.create_new().await;
        gateway.release.notify_one();
        background.await.unwrap();

        // The late reply landed nowhere: the new session is untouched and
        // the original keeps only its optimistic user message.
        assert!(controller.transcript().await.is_empty());
        let sessions = controller.sessions().await;
        let stored = sessions.iter().find(|s| s.id == original).unwrap();
        assert_eq!(stored.transcript.len(), 1);
        assert_eq!(stored.transcript[0].sender, Sender::User);
        assert_eq!(controller.phase().await, ControllerPhase::Idle);
    }

    #[tokio::test]
    async fn switch_round_trip_preserves_transcripts() {
        let controller = controller_with(MockGateway::new());
        let a = controller.active_session_id().await;

        controller.send_message("message in A").await;
        let b = controller.create_new().await;
        controller.send_message("message in B").await;

        controller.switch_to(&a).await.unwrap();
        let transcript = controller.transcript().await;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].text, "message in A");

        controller.switch_to(&b).await.unwrap();
        let transcript = controller.transcript().await;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].text, "message in B");
    }

    #[tokio::test]
    async fn switch_to_unknown_session_fails_and_keeps_state() {
        let controller = controller_with(MockGateway::new());
        let active = controller.active_session_id().await;
        controller.send_message("kept").await;

        let err = controller.switch_to("missing").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(controller.active_session_id().await, active);
        assert_eq!(controller.transcript().await.len(), 2);
    }

    #[tokio::test]
    async fn deleting_the_active_session_activates_the_first_remaining() {
        let controller = controller_with(MockGateway::new());
        let a = controller.active_session_id().await;
        controller.send_message("remembered").await;
        let b = controller.create_new().await;

        controller.delete_session(&b).await;

        // A is the only remaining entry and its stored transcript is live.
        assert_eq!(controller.active_session_id().await, a);
        let transcript = controller.transcript().await;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].text, "remembered");
    }

    #[tokio::test]
    async fn deleting_everything_leaves_exactly_one_active_session() {
        let controller = controller_with(MockGateway::new());
        for _ in 0..3 {
            controller.create_new().await;
        }
        assert_eq!(controller.sessions().await.len(), 4);

        let ids: Vec<String> = controller.sessions().await.iter().map(|s| s.id.clone()).collect();
        for id in &ids {
            controller.delete_session(id).await;
        }

        let sessions = controller.sessions().await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, controller.active_session_id().await);
        assert!(!ids.contains(&sessions[0].id));
    }

    #[tokio::test]
    async fn deleting_an_inactive_session_keeps_the_active_one() {
        let controller = controller_with(MockGateway::new());
        let a = controller.active_session_id().await;
        let b = controller.create_new().await;

        controller.delete_session(&a).await;

        assert_eq!(controller.active_session_id().await, b);
        assert_eq!(controller.sessions().await.len(), 1);
    }

    #[tokio::test]
    async fn upload_success_enters_pdf_mode_with_two_notices() {
        let controller = controller_with(MockGateway::new());

        controller.upload_pdf(b"%PDF".to_vec(), "paper.pdf").await;

        assert_eq!(controller.mode().await, ChatMode::PdfDiscussion);
        assert_eq!(controller.pdf_name().await, "paper.pdf");
        assert_eq!(
            controller.selected_model().await,
            BackendConfig::default().pdf_model
        );

        let transcript = controller.transcript().await;
        assert_eq!(transcript.len(), 2);
        assert!(transcript[0].text.contains("paper.pdf"));
        assert!(transcript[0].text.contains("successfully loaded"));
        assert!(transcript[1].text.starts_with("**Initial Analysis**"));
        assert!(transcript[1].text.contains("a short summary"));
    }

    #[tokio::test]
    async fn upload_failure_keeps_mode_but_not_the_optimistic_fields() {
        let gateway = MockGateway::new();
        gateway.fail_upload.store(true, Ordering::SeqCst);
        let controller = controller_with(gateway);

        controller.upload_pdf(b"%PDF".to_vec(), "paper.pdf").await;

        // The mode transition is withheld, while the eagerly applied
        // document name and forced model remain.
        assert_eq!(controller.mode().await, ChatMode::Regular);
        assert_eq!(controller.pdf_name().await, "paper.pdf");
        assert_eq!(
            controller.selected_model().await,
            BackendConfig::default().pdf_model
        );

        let transcript = controller.transcript().await;
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].text, PDF_ERROR_TEXT);
    }

    #[tokio::test]
    async fn empty_upload_is_a_noop() {
        let controller = controller_with(MockGateway::new());
        controller.upload_pdf(Vec::new(), "paper.pdf").await;
        assert!(controller.transcript().await.is_empty());
        assert!(controller.pdf_name().await.is_empty());
    }

    #[tokio::test]
    async fn pdf_mode_questions_route_through_the_pdf_endpoint() {
        let gateway = MockGateway::new();
        let controller = controller_with(gateway.clone());
        controller.upload_pdf(b"%PDF".to_vec(), "paper.pdf").await;

        controller.send_message("what is section 2 about?").await;

        assert_eq!(gateway.chat_call_count(), 0);
        let pdf_calls = gateway.pdf_calls.lock().unwrap();
        assert_eq!(pdf_calls.len(), 1);
        assert_eq!(pdf_calls[0].0, "what is section 2 about?");
        assert_eq!(pdf_calls[0].1, "extracted text");
        assert_eq!(pdf_calls[0].2, BackendConfig::default().pdf_model);
    }

    #[tokio::test]
    async fn exit_pdf_mode_clears_context_but_not_the_model() {
        let controller = controller_with(MockGateway::new());
        controller.upload_pdf(b"%PDF".to_vec(), "paper.pdf").await;

        controller.exit_pdf_mode().await;

        assert_eq!(controller.mode().await, ChatMode::Regular);
        assert!(controller.pdf_name().await.is_empty());
        assert_eq!(
            controller.selected_model().await,
            BackendConfig::default().pdf_model
        );

        let transcript = controller.transcript().await;
        assert_eq!(transcript.last().unwrap().text, EXIT_PDF_TEXT);

        // A question after leaving PDF mode goes back to the chat endpoint.
        controller.send_message("regular again").await;
        assert_eq!(controller.mode().await, ChatMode::Regular);
    }

    #[tokio::test]
    async fn rename_whitespace_falls_back_to_untitled() {
        let controller = controller_with(MockGateway::new());
        let id = controller.active_session_id().await;

        controller.rename_session(&id, "   ").await;

        let sessions = controller.sessions().await;
        assert_eq!(sessions[0].name, "Untitled Chat");
    }

    #[tokio::test]
    async fn rename_edit_lifecycle_commits_and_cancels() {
        let controller = controller_with(MockGateway::new());
        let id = controller.active_session_id().await;

        controller.begin_rename(&id).await.unwrap();
        controller.edit_rename("Research").await;
        controller.commit_rename().await;
        assert_eq!(controller.sessions().await[0].name, "Research");

        controller.begin_rename(&id).await.unwrap();
        controller.edit_rename("discarded").await;
        controller.cancel_rename().await;
        controller.commit_rename().await; // no edit in progress, no-op
        assert_eq!(controller.sessions().await[0].name, "Research");

        assert!(controller.begin_rename("missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn set_model_updates_and_is_locked_in_pdf_mode() {
        let controller = controller_with(MockGateway::new());
        controller.set_model("mistral:latest").await;
        assert_eq!(controller.selected_model().await, "mistral:latest");
        assert_eq!(controller.sessions().await[0].selected_model, "mistral:latest");

        controller.upload_pdf(b"%PDF".to_vec(), "paper.pdf").await;
        controller.set_model("llama3.2-vision").await;
        assert_eq!(
            controller.selected_model().await,
            BackendConfig::default().pdf_model
        );
    }

    #[tokio::test]
    async fn reset_notifies_the_backend_and_starts_fresh() {
        let gateway = MockGateway::new();
        let controller = controller_with(gateway.clone());
        let original = controller.active_session_id().await;
        controller.send_message("old talk").await;

        let fresh = controller.reset_chat().await;

        assert_eq!(*gateway.reset_calls.lock().unwrap(), vec![original.clone()]);
        assert_ne!(fresh, original);
        assert_eq!(controller.active_session_id().await, fresh);
        assert!(controller.transcript().await.is_empty());
    }

    #[tokio::test]
    async fn reset_failure_is_swallowed_and_still_starts_fresh() {
        let gateway = MockGateway::new();
        gateway.fail_reset.store(true, Ordering::SeqCst);
        let controller = controller_with(gateway);
        let original = controller.active_session_id().await;

        let fresh = controller.reset_chat().await;
        assert_ne!(fresh, original);
    }

    #[tokio::test]
    async fn header_label_tracks_mode_and_name() {
        let controller = controller_with(MockGateway::new());
        assert_eq!(controller.header_label().await, DEFAULT_SESSION_NAME);

        let id = controller.active_session_id().await;
        controller.rename_session(&id, "Notes").await;
        assert_eq!(controller.header_label().await, "Notes");

        controller.upload_pdf(b"%PDF".to_vec(), "paper.pdf").await;
        assert_eq!(controller.header_label().await, "PDF Discussion: paper.pdf");
    }

    #[tokio::test]
    async fn grouped_sessions_reflect_freshly_mirrored_state() {
        let controller = controller_with(MockGateway::new());
        controller.upload_pdf(b"%PDF".to_vec(), "paper.pdf").await;

        let groups = controller.grouped_sessions(Utc::now()).await;
        assert_eq!(groups.today.len(), 1);
        assert_eq!(groups.today[0].display_label(), "PDF: paper.pdf");
        assert!(groups.yesterday.is_empty());
        assert!(groups.previous_7_days.is_empty());
        assert!(groups.older.is_empty());
    }
}
