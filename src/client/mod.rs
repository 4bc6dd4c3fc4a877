//! Shell client
//!
//! Handles the session loop and per-session state.

pub mod handler;
pub mod state;

pub use handler::handle_session;
pub use state::Session;
