//! RAX VFS
//!
//! An in-memory hierarchical virtual filesystem with per-item metadata,
//! flags, a forbidden-character policy and an optional security agent.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod navigate;
pub mod protocol;
pub mod storage;

pub use auth::{Request, SecurityAgent};
pub use error::StorageError;
pub use storage::Storage;
