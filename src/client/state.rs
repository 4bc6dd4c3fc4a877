//! Module `state`
//!
//! Defines the `Session` struct holding the per-session shell state.

use crate::storage::VirtualPath;

/// State of one shell session.
///
/// Starts at the root; only the working directory is tracked.
#[derive(Debug, Default)]
pub struct Session {
    cwd: VirtualPath,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current working directory.
    pub fn cwd(&self) -> &VirtualPath {
        &self.cwd
    }

    /// Working directory as shown to the user, always absolute.
    pub fn display_cwd(&self) -> String {
        format!("/{}", self.cwd)
    }

    /// Sets the current working directory.
    pub fn set_cwd(&mut self, cwd: VirtualPath) {
        self.cwd = cwd;
    }
}
