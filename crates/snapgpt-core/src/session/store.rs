//! In-memory session store.
//!
//! The store owns every session record for the lifetime of the process and
//! keeps them in most-recent-first order, which is also the display order
//! of the sidebar. It performs no I/O; durable persistence is a non-goal.

use super::chat_mode::ChatMode;
use super::message::Message;
use super::model::{FALLBACK_SESSION_NAME, Session};
use chrono::{DateTime, Days, Utc};

/// A partial session record merged into a stored one by
/// [`SessionStore::update`]. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub name: Option<String>,
    pub transcript: Option<Vec<Message>>,
    pub mode: Option<ChatMode>,
    pub pdf_name: Option<String>,
    pub selected_model: Option<String>,
}

/// Sessions partitioned into the four calendar-day buckets the sidebar
/// displays. Membership is mutually exclusive; order within each bucket
/// follows the store's most-recent-first order.
#[derive(Debug, Clone, Default)]
pub struct SessionGroups {
    pub today: Vec<Session>,
    pub yesterday: Vec<Session>,
    pub previous_7_days: Vec<Session>,
    pub older: Vec<Session>,
}

/// The central registry of conversation records.
///
/// `SessionStore` is responsible for creating, renaming, deleting and
/// patching session records, and for the date-bucketed grouping used by
/// the sidebar. It never decides which session is active; that is the
/// controller's job.
#[derive(Debug, Default)]
pub struct SessionStore {
    /// All sessions, most-recent-first.
    sessions: Vec<Session>,
}

impl SessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fresh session on the given model and inserts it at the
    /// front of the list.
    ///
    /// # Returns
    ///
    /// A clone of the newly created record.
    pub fn create(&mut self, model: impl Into<String>) -> Session {
        let session = Session::new(model);
        self.sessions.insert(0, session.clone());
        session
    }

    /// Renames a session.
    ///
    /// The new name is trimmed; a name that trims to empty is stored as
    /// `"Untitled Chat"`. Unknown ids are a no-op.
    pub fn rename(&mut self, id: &str, new_name: &str) {
        let Some(session) = self.get_mut(id) else {
            tracing::debug!("[SessionStore] rename: unknown session {}", id);
            return;
        };
        let trimmed = new_name.trim();
        session.name = if trimmed.is_empty() {
            FALLBACK_SESSION_NAME.to_string()
        } else {
            trimmed.to_string()
        };
    }

    /// Removes a session record.
    ///
    /// # Returns
    ///
    /// `true` if a record was removed. Picking a replacement active
    /// session is the caller's responsibility.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        self.sessions.len() != before
    }

    /// Merges a partial record into the stored one.
    ///
    /// Used to persist the controller's working state on every session
    /// switch. Unknown ids are a no-op.
    pub fn update(&mut self, id: &str, patch: SessionPatch) {
        let Some(session) = self.get_mut(id) else {
            tracing::debug!("[SessionStore] update: unknown session {}", id);
            return;
        };
        if let Some(name) = patch.name {
            session.name = name;
        }
        if let Some(transcript) = patch.transcript {
            session.transcript = transcript;
        }
        if let Some(mode) = patch.mode {
            session.mode = mode;
        }
        if let Some(pdf_name) = patch.pdf_name {
            session.pdf_name = pdf_name;
        }
        if let Some(selected_model) = patch.selected_model {
            session.selected_model = selected_model;
        }
    }

    /// Finds a session by id.
    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Finds a session by id, mutably.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    /// All sessions in display order.
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// The id of the first (most recent) session, if any.
    pub fn first_id(&self) -> Option<String> {
        self.sessions.first().map(|s| s.id.clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Partitions all sessions into *today* / *yesterday* / *previous 7
    /// days* / *older* buckets relative to `reference`.
    ///
    /// Classification uses `created_at` truncated to calendar-day
    /// granularity: same day as the reference is *today*, the day before
    /// is *yesterday*, strictly earlier days within the last seven days
    /// (inclusive lower bound of `reference - 7 days`) are *previous 7
    /// days*, everything else is *older*.
    pub fn grouped_by_date(&self, reference: DateTime<Utc>) -> SessionGroups {
        let today = reference.date_naive();
        let yesterday = today - Days::new(1);
        let week_ago = today - Days::new(7);

        let mut groups = SessionGroups::default();
        for session in &self.sessions {
            let day = session.created_at.date_naive();
            if day == today {
                groups.today.push(session.clone());
            } else if day == yesterday {
                groups.yesterday.push(session.clone());
            } else if day >= week_ago {
                groups.previous_7_days.push(session.clone());
            } else {
                groups.older.push(session.clone());
            }
        }
        groups
    }
}
