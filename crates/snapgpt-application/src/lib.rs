//! Application layer: the active-session controller.
//!
//! This crate owns "which session is active", keeps the working
//! conversation state in sync with the session store, and drives the
//! chat / PDF-question / upload workflows against the backend gateway.

pub mod controller;
mod working_state;

pub use controller::ChatController;
pub use working_state::ControllerPhase;
