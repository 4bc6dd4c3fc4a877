//! Security agent
//!
//! An optional strategy consulted before every storage operation. The agent
//! only ever sees normalized paths.

use super::request::Request;

/// Decides whether a request may proceed.
///
/// `path` is the normalized joined path (empty for the root). `extra` holds
/// request-specific arguments: the normalized destination for copy and move,
/// the flag characters for flag requests, `"force"` for a forced import.
pub trait SecurityAgent {
    fn authorize(&self, request: Request, path: &str, extra: &[&str]) -> bool;
}

impl<F> SecurityAgent for F
where
    F: Fn(Request, &str, &[&str]) -> bool,
{
    fn authorize(&self, request: Request, path: &str, extra: &[&str]) -> bool {
        self(request, path, extra)
    }
}
