//! Navigate module
//!
//! Resolves shell arguments against a session's working directory and
//! handles directory changes.

mod operations;

pub use operations::{change_directory, resolve_path};
