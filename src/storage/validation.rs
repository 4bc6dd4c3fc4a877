//! Path validation
//!
//! Forbidden-character policy and its one-way configuration lock.

use crate::error::StorageError;
use crate::storage::path::VirtualPath;

/// Characters refused in paths unless configured otherwise.
pub const DEFAULT_FORBIDDEN_CHARS: &str = ":*?<>|";

/// The separator, which can never be forbidden.
pub const SEPARATOR: char = '/';

/// Forbidden characters, strict mode and the lock guarding both.
///
/// Once locked the policy never changes again.
#[derive(Debug, Clone)]
pub struct ForbidPolicy {
    forbidden: String,
    strict: bool,
    locked: bool,
}

impl Default for ForbidPolicy {
    fn default() -> Self {
        Self {
            forbidden: DEFAULT_FORBIDDEN_CHARS.to_string(),
            strict: false,
            locked: false,
        }
    }
}

impl ForbidPolicy {
    /// Builds a policy with a custom character set.
    pub fn new(forbidden: &str, strict: bool) -> Result<Self, StorageError> {
        if forbidden.contains(SEPARATOR) {
            return Err(StorageError::InvalidArgument(
                "the separator cannot be forbidden".into(),
            ));
        }

        let mut policy = Self {
            forbidden: String::new(),
            strict,
            locked: false,
        };
        for ch in forbidden.chars() {
            if !policy.forbidden.contains(ch) {
                policy.forbidden.push(ch);
            }
        }
        Ok(policy)
    }

    pub fn forbidden_chars(&self) -> &str {
        &self.forbidden
    }

    pub fn is_forbidden(&self, ch: char) -> bool {
        self.forbidden.contains(ch)
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Checks a path against the policy.
    ///
    /// Only content writes are checked unless strict mode is on.
    pub fn check(&self, path: &VirtualPath, writing_content: bool) -> Result<(), StorageError> {
        if !writing_content && !self.strict {
            return Ok(());
        }

        let joined = path.joined();
        match joined.chars().find(|ch| self.forbidden.contains(*ch)) {
            Some(ch) => Err(StorageError::ForbiddenCharacter { path: joined, ch }),
            None => Ok(()),
        }
    }

    fn ensure_unlocked(&self) -> Result<(), StorageError> {
        if self.locked {
            Err(StorageError::ConfigurationLocked)
        } else {
            Ok(())
        }
    }

    /// Adds characters to the forbidden set.
    pub fn forbid(&mut self, chars: &str) -> Result<(), StorageError> {
        self.ensure_unlocked()?;
        if chars.is_empty() {
            return Err(StorageError::InvalidArgument("no character given".into()));
        }
        if chars.contains(SEPARATOR) {
            return Err(StorageError::InvalidArgument(
                "the separator cannot be forbidden".into(),
            ));
        }

        for ch in chars.chars() {
            if !self.forbidden.contains(ch) {
                self.forbidden.push(ch);
            }
        }
        Ok(())
    }

    /// Removes characters from the forbidden set.
    ///
    /// Fails without any change if one of them is not currently forbidden.
    pub fn unforbid(&mut self, chars: &str) -> Result<(), StorageError> {
        self.ensure_unlocked()?;
        if chars.is_empty() {
            return Err(StorageError::InvalidArgument("no character given".into()));
        }
        if let Some(ch) = chars.chars().find(|ch| !self.forbidden.contains(*ch)) {
            return Err(StorageError::InvalidArgument(format!(
                "{:?} is not forbidden",
                ch
            )));
        }

        self.forbidden.retain(|ch| !chars.contains(ch));
        Ok(())
    }

    pub fn set_strict(&mut self, strict: bool) -> Result<(), StorageError> {
        self.ensure_unlocked()?;
        self.strict = strict;
        Ok(())
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }
}
