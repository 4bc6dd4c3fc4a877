//! Error handlers
//!
//! Logs errors and maps them to shell reply codes.

use crate::error::types::{NavigateError, StorageError, VfsError};
use crate::protocol::responses::{DENIED, LOCKED, NOT_FOUND, SYNTAX_ERROR};
use log::error;

/// Handle an error that ended a session or prevented startup
pub fn handle_error(err: &VfsError) {
    error!("VFS Error: {}", err);
}

/// Convert a storage error to a shell reply code
pub fn storage_error_code(err: &StorageError) -> u16 {
    match err {
        StorageError::NotFound(_)
        | StorageError::NotAFile(_)
        | StorageError::NotADirectory(_)
        | StorageError::AlreadyExists(_)
        | StorageError::DirectoryNotEmpty(_)
        | StorageError::NoMetadata(_) => NOT_FOUND,
        StorageError::RootProtected
        | StorageError::ReadOnly(_)
        | StorageError::Undeletable(_)
        | StorageError::ForbiddenCharacter { .. }
        | StorageError::AccessDenied { .. } => DENIED,
        StorageError::MalformedInput(_)
        | StorageError::InvalidFlag(_)
        | StorageError::InvalidArgument(_)
        | StorageError::Parse(_) => SYNTAX_ERROR,
        StorageError::ConfigurationLocked | StorageError::Reentrant(_) => LOCKED,
    }
}

/// Convert any crate error to a shell reply code
pub fn error_to_reply_code(err: &VfsError) -> u16 {
    match err {
        VfsError::Storage(e) => storage_error_code(e),
        VfsError::Navigate(NavigateError::Storage(e)) => storage_error_code(e),
        VfsError::Navigate(_) => NOT_FOUND,
        VfsError::Config(_) => SYNTAX_ERROR,
        VfsError::IoError(_) => NOT_FOUND,
        VfsError::ProtocolError(_) => SYNTAX_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_codes() {
        assert_eq!(storage_error_code(&StorageError::NotFound("a".into())), 550);
        assert_eq!(storage_error_code(&StorageError::ReadOnly("a".into())), 553);
        assert_eq!(storage_error_code(&StorageError::ConfigurationLocked), 554);
        assert_eq!(storage_error_code(&StorageError::InvalidFlag('x')), 500);
    }

    #[test]
    fn test_wrapped_codes() {
        let err = VfsError::Navigate(NavigateError::Storage(StorageError::AccessDenied {
            request: "folder/exist",
            path: "doc".into(),
        }));
        assert_eq!(error_to_reply_code(&err), 553);
        let err = VfsError::ProtocolError("bad".into());
        assert_eq!(error_to_reply_code(&err), 500);
    }
}
