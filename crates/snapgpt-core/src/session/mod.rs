//! Session domain module.
//!
//! This module contains all session-related domain models and the
//! in-memory store that owns them.
//!
//! # Module Structure
//!
//! - `model`: Core session domain model (`Session`)
//! - `message`: Transcript message types (`Sender`, `Message`, `InlineImage`)
//! - `chat_mode`: Conversation mode (`ChatMode`)
//! - `store`: In-memory registry with date-bucketed grouping (`SessionStore`)

mod chat_mode;
mod message;
mod model;
mod store;

// Re-export public API
pub use chat_mode::ChatMode;
pub use message::{InlineImage, Message, Sender};
pub use model::{DEFAULT_SESSION_NAME, FALLBACK_SESSION_NAME, Session};
pub use store::{SessionGroups, SessionPatch, SessionStore};
