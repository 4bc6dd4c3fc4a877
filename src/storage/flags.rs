//! Metadata and flag operations

use log::debug;

use crate::auth::Request;
use crate::error::StorageError;
use crate::storage::Storage;
use crate::storage::operations::State;
use crate::storage::path::{VirtualPath, normalize};
use crate::storage::results::TableEntry;
use crate::storage::table::{Flag, MetadataEntry};

impl State {
    fn entry(&self, path: &VirtualPath) -> Result<&MetadataEntry, StorageError> {
        self.tree.lookup(path, None)?;
        self.table
            .get(path)
            .ok_or_else(|| StorageError::NoMetadata(path.joined()))
    }

    fn entry_mut(&mut self, path: &VirtualPath) -> Result<&mut MetadataEntry, StorageError> {
        self.tree.lookup(path, None)?;
        self.table
            .get_mut(path)
            .ok_or_else(|| StorageError::NoMetadata(path.joined()))
    }
}

fn parse_flags(flags: &str) -> Result<Vec<Flag>, StorageError> {
    if flags.is_empty() {
        return Err(StorageError::InvalidArgument("no flag given".into()));
    }
    Flag::parse_all(flags)
}

impl Storage {
    /// Copy of the `(created_at, modified_at, flags)` entry of an item.
    pub fn get_table_entry(&self, path: &str) -> Result<TableEntry, StorageError> {
        let path = normalize(path);
        self.authorize(Request::TableEntry, &path, &[])?;

        let state = self.state.borrow();
        state.policy.check(&path, false)?;
        Ok(state.entry(&path)?.to_table_entry())
    }

    /// Sets one or more flags, e.g. `"hr"`.
    pub fn add_flag(&self, path: &str, flags: &str) -> Result<(), StorageError> {
        let path = normalize(path);
        self.authorize(Request::FlagWrite, &path, &[flags])?;

        let parsed = parse_flags(flags)?;
        let mut state = self.state.borrow_mut();
        state.policy.check(&path, false)?;
        let entry = state.entry_mut(&path)?;
        for flag in parsed {
            entry.flags.insert(flag);
        }
        debug!("Flags of {} now {:?}", path, entry.flags.to_string());
        Ok(())
    }

    /// Clears one or more flags. Clearing an unset flag is not an error.
    pub fn remove_flag(&self, path: &str, flags: &str) -> Result<(), StorageError> {
        let path = normalize(path);
        self.authorize(Request::FlagRemove, &path, &[flags])?;

        let parsed = parse_flags(flags)?;
        let mut state = self.state.borrow_mut();
        state.policy.check(&path, false)?;
        let entry = state.entry_mut(&path)?;
        for flag in parsed {
            entry.flags.remove(flag);
        }
        debug!("Flags of {} now {:?}", path, entry.flags.to_string());
        Ok(())
    }

    pub fn has_flag(&self, path: &str, flag: Flag) -> bool {
        let path = normalize(path);
        let probe = flag.as_char().to_string();
        if self.authorize(Request::FlagHas, &path, &[&probe]).is_err() {
            return false;
        }

        let state = self.state.borrow();
        state.policy.check(&path, false).is_ok()
            && state
                .entry(&path)
                .is_ok_and(|entry| entry.flags.contains(flag))
    }

    /// Flag string of an item, in the order the flags were set.
    pub fn get_flags(&self, path: &str) -> Result<String, StorageError> {
        let path = normalize(path);
        self.authorize(Request::FlagRead, &path, &[])?;

        let state = self.state.borrow();
        state.policy.check(&path, false)?;
        Ok(state.entry(&path)?.flags.to_string())
    }
}
