//! File system table (FST)
//!
//! Side index holding creation/modification times and flags, keyed by the
//! joined normalized path. The root never has an entry.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::StorageError;
use crate::storage::path::VirtualPath;
use crate::storage::results::TableEntry;

/// A per-item flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    /// `h`: left out of folder listings unless hidden items are requested
    Hidden,
    /// `r`: content cannot be rewritten
    ReadOnly,
    /// `u`: item cannot be removed directly
    Undeletable,
}

impl Flag {
    pub fn as_char(self) -> char {
        match self {
            Flag::Hidden => 'h',
            Flag::ReadOnly => 'r',
            Flag::Undeletable => 'u',
        }
    }

    /// Parses a flag string such as `"ru"` into its flags.
    pub fn parse_all(flags: &str) -> Result<Vec<Flag>, StorageError> {
        flags.chars().map(Flag::try_from).collect()
    }
}

impl TryFrom<char> for Flag {
    type Error = StorageError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            'h' => Ok(Flag::Hidden),
            'r' => Ok(Flag::ReadOnly),
            'u' => Ok(Flag::Undeletable),
            other => Err(StorageError::InvalidFlag(other)),
        }
    }
}

/// Set of flags, each present at most once, kept in the order they were set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags {
    set: Vec<Flag>,
}

impl Flags {
    pub fn contains(&self, flag: Flag) -> bool {
        self.set.contains(&flag)
    }

    pub fn insert(&mut self, flag: Flag) {
        if !self.contains(flag) {
            self.set.push(flag);
        }
    }

    pub fn remove(&mut self, flag: Flag) {
        self.set.retain(|f| *f != flag);
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for flag in &self.set {
            write!(f, "{}", flag.as_char())?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Flags {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut flags = Flags::default();
        for flag in Flag::parse_all(s)? {
            flags.insert(flag);
        }
        Ok(flags)
    }
}

/// Metadata of one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEntry {
    pub created_at: i64,
    pub modified_at: i64,
    pub flags: Flags,
}

impl MetadataEntry {
    pub fn new(now: i64) -> Self {
        Self {
            created_at: now,
            modified_at: now,
            flags: Flags::default(),
        }
    }

    /// Owned copy in the externally visible tuple form.
    pub fn to_table_entry(&self) -> TableEntry {
        TableEntry(self.created_at, self.modified_at, self.flags.to_string())
    }
}

impl TryFrom<&TableEntry> for MetadataEntry {
    type Error = StorageError;

    fn try_from(entry: &TableEntry) -> Result<Self, Self::Error> {
        Ok(Self {
            created_at: entry.0,
            modified_at: entry.1,
            flags: entry.2.parse()?,
        })
    }
}

/// The table itself.
#[derive(Debug, Default)]
pub struct MetadataTable {
    entries: BTreeMap<String, MetadataEntry>,
}

impl MetadataTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &VirtualPath) -> Option<&MetadataEntry> {
        self.entries.get(&path.joined())
    }

    pub fn get_mut(&mut self, path: &VirtualPath) -> Option<&mut MetadataEntry> {
        self.entries.get_mut(&path.joined())
    }

    pub fn has_flag(&self, path: &VirtualPath, flag: Flag) -> bool {
        self.get(path).is_some_and(|entry| entry.flags.contains(flag))
    }

    pub fn insert(&mut self, path: &VirtualPath, entry: MetadataEntry) {
        debug_assert!(!path.is_root(), "the root has no table entry");
        self.entries.insert(path.joined(), entry);
    }

    /// Records a write: creates the entry on first write, refreshes the
    /// modification time afterwards.
    pub fn touch(&mut self, path: &VirtualPath, now: i64) {
        self.entries
            .entry(path.joined())
            .and_modify(|entry| entry.modified_at = now)
            .or_insert_with(|| MetadataEntry::new(now));
    }

    /// Removes the entry of `path` and of everything below it.
    pub fn remove_tree(&mut self, path: &VirtualPath) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|key, _| !VirtualPath::from(key.as_str()).starts_with(path));
        before - self.entries.len()
    }

    pub fn remove(&mut self, path: &VirtualPath) -> Option<MetadataEntry> {
        self.entries.remove(&path.joined())
    }

    /// Entries strictly below `folder`, keyed relative to it.
    pub fn subset(&self, folder: &VirtualPath) -> BTreeMap<String, TableEntry> {
        self.entries
            .iter()
            .filter_map(|(key, entry)| {
                let relative = VirtualPath::from(key.as_str()).strip_prefix(folder)?;
                if relative.is_root() {
                    return None;
                }
                Some((relative.joined(), entry.to_table_entry()))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::path::normalize;

    #[test]
    fn test_flags_are_canonical() {
        let mut flags: Flags = "rur".parse().unwrap();
        assert_eq!(flags.to_string(), "ru");
        flags.insert(Flag::Hidden);
        flags.insert(Flag::ReadOnly);
        assert_eq!(flags.to_string(), "ruh");
        flags.remove(Flag::ReadOnly);
        assert_eq!(flags.to_string(), "uh");
        assert!(matches!("rx".parse::<Flags>(), Err(StorageError::InvalidFlag('x'))));
    }

    #[test]
    fn test_touch_creates_then_refreshes() {
        let mut table = MetadataTable::new();
        let path = normalize("a.txt");
        table.touch(&path, 10);
        table.touch(&path, 25);
        let entry = table.get(&path).unwrap();
        assert_eq!(entry.created_at, 10);
        assert_eq!(entry.modified_at, 25);
        assert!(entry.flags.is_empty());
    }

    #[test]
    fn test_remove_tree_drops_descendants_only() {
        let mut table = MetadataTable::new();
        for key in ["doc", "doc/a", "doc/sub/b", "docs", "other"] {
            table.touch(&normalize(key), 1);
        }
        assert_eq!(table.remove_tree(&normalize("doc")), 3);
        assert!(table.get(&normalize("docs")).is_some());
        assert!(table.get(&normalize("other")).is_some());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_subset_is_relative() {
        let mut table = MetadataTable::new();
        for key in ["doc", "doc/a", "doc/sub/b", "docs/c"] {
            table.touch(&normalize(key), 7);
        }
        let subset = table.subset(&normalize("doc"));
        let keys: Vec<&str> = subset.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "sub/b"]);
        assert_eq!(subset["a"], TableEntry(7, 7, String::new()));
    }
}
