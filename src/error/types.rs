//! Error types
//!
//! Defines domain-specific error types for the storage engine, the shell
//! navigation layer, and the binary as a whole.

use std::fmt;
use std::io;

/// Storage engine errors
///
/// Every expected failure of a storage operation ends up here. Agent denials
/// and forbidden characters travel through the same channel as structural
/// failures.
#[derive(Debug)]
pub enum StorageError {
    NotFound(String),
    NotAFile(String),
    NotADirectory(String),
    AlreadyExists(String),
    RootProtected,
    DirectoryNotEmpty(String),
    ReadOnly(String),
    Undeletable(String),
    ForbiddenCharacter { path: String, ch: char },
    AccessDenied { request: &'static str, path: String },
    MalformedInput(String),
    InvalidFlag(char),
    InvalidArgument(String),
    NoMetadata(String),
    ConfigurationLocked,
    Parse(serde_json::Error),
    Reentrant(&'static str),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::NotFound(p) => write!(f, "Not found: {}", p),
            StorageError::NotAFile(p) => write!(f, "Not a file: {}", p),
            StorageError::NotADirectory(p) => write!(f, "Not a directory: {}", p),
            StorageError::AlreadyExists(p) => write!(f, "Already exists: {}", p),
            StorageError::RootProtected => write!(f, "The root folder cannot be modified"),
            StorageError::DirectoryNotEmpty(p) => write!(f, "Directory not empty: {}", p),
            StorageError::ReadOnly(p) => write!(f, "Read-only: {}", p),
            StorageError::Undeletable(p) => write!(f, "Undeletable: {}", p),
            StorageError::ForbiddenCharacter { path, ch } => {
                write!(f, "Forbidden character {:?} in path: {}", ch, path)
            }
            StorageError::AccessDenied { request, path } => {
                write!(f, "Access denied by agent ({}): {}", request, path)
            }
            StorageError::MalformedInput(msg) => write!(f, "Malformed input: {}", msg),
            StorageError::InvalidFlag(c) => write!(f, "Invalid flag: {:?}", c),
            StorageError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            StorageError::NoMetadata(p) => write!(f, "No table entry for: {}", p),
            StorageError::ConfigurationLocked => write!(f, "Configuration is locked"),
            StorageError::Parse(e) => write!(f, "Parse error: {}", e),
            StorageError::Reentrant(request) => {
                write!(f, "Rejected nested {} during authorization", request)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl From<serde_json::Error> for StorageError {
    fn from(error: serde_json::Error) -> Self {
        StorageError::Parse(error)
    }
}

/// Navigate module errors
#[derive(Debug)]
pub enum NavigateError {
    InvalidPath(String),
    DirectoryNotFound(String),
    Storage(StorageError),
}

impl fmt::Display for NavigateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigateError::InvalidPath(p) => write!(f, "Invalid path: {}", p),
            NavigateError::DirectoryNotFound(p) => write!(f, "Directory not found: {}", p),
            NavigateError::Storage(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for NavigateError {}

impl From<StorageError> for NavigateError {
    fn from(error: StorageError) -> Self {
        NavigateError::Storage(error)
    }
}

/// General error that encompasses all error types of the crate
#[derive(Debug)]
pub enum VfsError {
    Storage(StorageError),
    Navigate(NavigateError),
    Config(config::ConfigError),
    IoError(io::Error),
    ProtocolError(String),
}

impl fmt::Display for VfsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VfsError::Storage(e) => write!(f, "Storage error: {}", e),
            VfsError::Navigate(e) => write!(f, "Navigate error: {}", e),
            VfsError::Config(e) => write!(f, "Configuration error: {}", e),
            VfsError::IoError(e) => write!(f, "I/O error: {}", e),
            VfsError::ProtocolError(e) => write!(f, "Protocol error: {}", e),
        }
    }
}

impl std::error::Error for VfsError {}

impl From<StorageError> for VfsError {
    fn from(error: StorageError) -> Self {
        VfsError::Storage(error)
    }
}

impl From<NavigateError> for VfsError {
    fn from(error: NavigateError) -> Self {
        VfsError::Navigate(error)
    }
}

impl From<config::ConfigError> for VfsError {
    fn from(error: config::ConfigError) -> Self {
        VfsError::Config(error)
    }
}

impl From<io::Error> for VfsError {
    fn from(error: io::Error) -> Self {
        VfsError::IoError(error)
    }
}
