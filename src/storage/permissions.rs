//! Item protection
//!
//! Flag-driven rules deciding whether an item may be rewritten or removed.
//! Recursive removal of an ancestor folder does not consult these rules.

use crate::error::StorageError;
use crate::storage::path::VirtualPath;
use crate::storage::table::{Flag, MetadataEntry};

/// Check if an item's content may be rewritten
///
/// Read-only and undeletable items both refuse content writes.
pub fn check_writable(
    path: &VirtualPath,
    entry: Option<&MetadataEntry>,
) -> Result<(), StorageError> {
    let Some(entry) = entry else {
        return Ok(());
    };

    if entry.flags.contains(Flag::ReadOnly) {
        return Err(StorageError::ReadOnly(path.joined()));
    }
    if entry.flags.contains(Flag::Undeletable) {
        return Err(StorageError::Undeletable(path.joined()));
    }
    Ok(())
}

/// Check if an item may be removed (or moved away)
///
/// With `read_only_is_undeletable`, a read-only item is protected like an
/// undeletable one.
pub fn check_removable(
    path: &VirtualPath,
    entry: Option<&MetadataEntry>,
    read_only_is_undeletable: bool,
) -> Result<(), StorageError> {
    let Some(entry) = entry else {
        return Ok(());
    };

    if entry.flags.contains(Flag::Undeletable) {
        return Err(StorageError::Undeletable(path.joined()));
    }
    if read_only_is_undeletable && entry.flags.contains(Flag::ReadOnly) {
        return Err(StorageError::ReadOnly(path.joined()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::path::normalize;

    fn entry(flags: &str) -> MetadataEntry {
        let mut entry = MetadataEntry::new(0);
        entry.flags = flags.parse().unwrap();
        entry
    }

    #[test]
    fn test_untracked_items_are_unprotected() {
        let path = normalize("a");
        assert!(check_writable(&path, None).is_ok());
        assert!(check_removable(&path, None, true).is_ok());
    }

    #[test]
    fn test_hidden_does_not_protect() {
        let path = normalize("a");
        assert!(check_writable(&path, Some(&entry("h"))).is_ok());
        assert!(check_removable(&path, Some(&entry("h")), true).is_ok());
    }

    #[test]
    fn test_read_only_blocks_writes_and_optionally_removal() {
        let path = normalize("a");
        let ro = entry("r");
        assert!(matches!(check_writable(&path, Some(&ro)), Err(StorageError::ReadOnly(_))));
        assert!(matches!(
            check_removable(&path, Some(&ro), true),
            Err(StorageError::ReadOnly(_))
        ));
        assert!(check_removable(&path, Some(&ro), false).is_ok());
    }

    #[test]
    fn test_undeletable_blocks_everything() {
        let path = normalize("a");
        let u = entry("u");
        assert!(matches!(check_writable(&path, Some(&u)), Err(StorageError::Undeletable(_))));
        assert!(matches!(
            check_removable(&path, Some(&u), false),
            Err(StorageError::Undeletable(_))
        ));
    }
}
