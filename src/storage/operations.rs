//! Storage operations
//!
//! The public storage handle: path normalization, the agent gate, the
//! forbidden-character gate and the tree/table work for file operations and
//! configuration. Folder and flag operations live in sibling modules.

use std::cell::{Cell, RefCell};
use std::fmt;

use chrono::Utc;
use log::{debug, warn};
use serde::de::DeserializeOwned;

use crate::auth::{Request, SecurityAgent};
use crate::config::{StorageSettings, VfsConfig};
use crate::error::StorageError;
use crate::storage::filesystem::{Node, NodeKind, TreeStore, WriteOutcome};
use crate::storage::path::{VirtualPath, normalize};
use crate::storage::permissions::{check_removable, check_writable};
use crate::storage::table::MetadataTable;
use crate::storage::validation::ForbidPolicy;

/// Milliseconds since the Unix epoch.
pub(crate) fn now() -> i64 {
    Utc::now().timestamp_millis()
}

/// Mutable state of a storage, only ever borrowed while no agent code runs.
pub(crate) struct State {
    pub(crate) tree: TreeStore,
    pub(crate) table: MetadataTable,
    pub(crate) policy: ForbidPolicy,
    pub(crate) settings: StorageSettings,
}

impl State {
    /// Writes file content and records it in the table.
    pub(crate) fn write_content(
        &mut self,
        path: &VirtualPath,
        content: String,
    ) -> Result<(), StorageError> {
        self.policy.check(path, !content.is_empty())?;
        check_writable(path, self.table.get(path))?;

        let len = content.len();
        let outcome = self.tree.write(path, Node::File(content))?;
        self.table.touch(path, now());
        match outcome {
            WriteOutcome::Created => debug!("Created {} ({} bytes)", path, len),
            WriteOutcome::Replaced => debug!("Rewrote {} ({} bytes)", path, len),
        }
        Ok(())
    }

    /// Removes a single file, honouring its own flags.
    pub(crate) fn remove_file(&mut self, path: &VirtualPath) -> Result<(), StorageError> {
        self.tree.file(path)?;
        check_removable(
            path,
            self.table.get(path),
            self.settings.read_only_is_undeletable,
        )?;

        self.tree.remove(path, Some(NodeKind::File))?;
        self.table.remove(path);
        debug!("Removed file {}", path);
        Ok(())
    }

    /// Removes a folder and every table entry below it.
    ///
    /// The folder's own flags are honoured, its descendants' are not.
    pub(crate) fn remove_tree(
        &mut self,
        path: &VirtualPath,
        recursive: bool,
    ) -> Result<(), StorageError> {
        if path.is_root() {
            return Err(StorageError::RootProtected);
        }

        let dir = self.tree.directory(path)?;
        if !dir.is_empty() && !recursive {
            return Err(StorageError::DirectoryNotEmpty(path.joined()));
        }
        check_removable(
            path,
            self.table.get(path),
            self.settings.read_only_is_undeletable,
        )?;

        self.tree.remove(path, Some(NodeKind::Directory))?;
        let dropped = self.table.remove_tree(path);
        debug!("Removed folder {} ({} table entries)", path, dropped);
        Ok(())
    }

    pub(crate) fn ensure_absent(&self, path: &VirtualPath) -> Result<(), StorageError> {
        match self.tree.lookup(path, None) {
            Ok(_) => Err(StorageError::AlreadyExists(path.joined())),
            Err(_) => Ok(()),
        }
    }
}

/// Resets the reentrancy marker, even if the agent panics.
struct AuthorizationGuard<'a>(&'a Cell<bool>);

impl<'a> AuthorizationGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for AuthorizationGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// An in-memory virtual filesystem.
///
/// All operations take `&self`; the storage is single-threaded (`!Sync`) and
/// must be wrapped in a mutex to be shared across threads. An agent that
/// calls back into the same storage while it is being consulted gets
/// [`StorageError::Reentrant`].
pub struct Storage {
    pub(crate) state: RefCell<State>,
    agent: Option<Box<dyn SecurityAgent>>,
    authorizing: Cell<bool>,
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("agent", &self.agent.is_some())
            .field("entries", &self.state.borrow().table.len())
            .finish()
    }
}

impl Storage {
    /// Empty storage without agent and with default settings.
    pub fn new() -> Self {
        Self::from_parts(StorageSettings::default(), ForbidPolicy::default(), None)
    }

    /// Empty storage guarded by `agent`.
    pub fn with_agent(agent: impl SecurityAgent + 'static) -> Self {
        Self::from_parts(
            StorageSettings::default(),
            ForbidPolicy::default(),
            Some(Box::new(agent)),
        )
    }

    pub fn from_parts(
        settings: StorageSettings,
        policy: ForbidPolicy,
        agent: Option<Box<dyn SecurityAgent>>,
    ) -> Self {
        Self {
            state: RefCell::new(State {
                tree: TreeStore::new(),
                table: MetadataTable::new(),
                policy,
                settings,
            }),
            agent,
            authorizing: Cell::new(false),
        }
    }

    /// Builds a storage from loaded configuration, locking the policy when
    /// `lock_on_start` is set.
    pub fn from_config(
        config: &VfsConfig,
        agent: Option<Box<dyn SecurityAgent>>,
    ) -> Result<Self, StorageError> {
        let mut policy =
            ForbidPolicy::new(&config.policy.forbidden_chars, config.policy.strict_forbid)?;
        if config.policy.lock_on_start {
            policy.lock();
        }
        Ok(Self::from_parts(config.storage.clone(), policy, agent))
    }

    /// Consults the agent, if any.
    pub(crate) fn authorize(
        &self,
        request: Request,
        path: &VirtualPath,
        extra: &[&str],
    ) -> Result<(), StorageError> {
        if self.authorizing.get() {
            warn!("Rejected nested {} request on {:?}", request, path.joined());
            return Err(StorageError::Reentrant(request.as_str()));
        }

        let Some(agent) = self.agent.as_deref() else {
            return Ok(());
        };

        let granted = {
            let _guard = AuthorizationGuard::enter(&self.authorizing);
            agent.authorize(request, &path.joined(), extra)
        };

        if granted {
            Ok(())
        } else {
            warn!("Agent denied {} on {:?}", request, path.joined());
            Err(StorageError::AccessDenied {
                request: request.as_str(),
                path: path.joined(),
            })
        }
    }

    fn ensure_not_authorizing(&self, operation: &'static str) -> Result<(), StorageError> {
        if self.authorizing.get() {
            warn!("Rejected nested {} during authorization", operation);
            return Err(StorageError::Reentrant(operation));
        }
        Ok(())
    }

    /// Type-checked existence probe shared by the three `exists` variants.
    fn probe(
        &self,
        request: Request,
        path: &str,
        expected: Option<NodeKind>,
    ) -> Result<(), StorageError> {
        let path = normalize(path);
        self.authorize(request, &path, &[])?;

        let state = self.state.borrow();
        state.policy.check(&path, false)?;
        state.tree.lookup(&path, expected)?;
        Ok(())
    }

    /// Normalizes a path the same way every operation does.
    pub fn normalize(&self, raw: &str) -> VirtualPath {
        normalize(raw)
    }

    /// Segment-wise test that `path` lies inside (or is) `parent`.
    pub fn is_within(&self, path: &str, parent: &str) -> bool {
        normalize(path).starts_with(&normalize(parent))
    }

    pub fn exists(&self, path: &str) -> bool {
        self.probe(Request::AnyExist, path, None).is_ok()
    }

    pub fn file_exists(&self, path: &str) -> bool {
        self.probe(Request::FileExist, path, Some(NodeKind::File)).is_ok()
    }

    pub fn dir_exists(&self, path: &str) -> bool {
        self.probe(Request::FolderExist, path, Some(NodeKind::Directory))
            .is_ok()
    }

    /// Creates or overwrites a file.
    pub fn write_file(&self, path: &str, content: &str) -> Result<(), StorageError> {
        let path = normalize(path);
        self.authorize(Request::FileWrite, &path, &[])?;

        self.state
            .borrow_mut()
            .write_content(&path, content.to_string())
    }

    /// Appends to a file, creating it when absent.
    ///
    /// The configured separator (a newline by default) goes between the old
    /// and new content unless `no_newline` is set.
    pub fn append_file(
        &self,
        path: &str,
        content: &str,
        no_newline: bool,
    ) -> Result<(), StorageError> {
        let path = normalize(path);
        self.authorize(Request::FileAppend, &path, &[])?;

        let mut state = self.state.borrow_mut();
        let combined = match state.tree.file(&path) {
            Ok(existing) => {
                let separator = if no_newline {
                    ""
                } else {
                    state.settings.append_separator.as_str()
                };
                format!("{}{}{}", existing, separator, content)
            }
            Err(StorageError::NotFound(_)) => content.to_string(),
            Err(e) => return Err(e),
        };
        state.write_content(&path, combined)
    }

    /// Creates an empty file. Fails if anything exists at `path`.
    pub fn touch_file(&self, path: &str) -> Result<(), StorageError> {
        let path = normalize(path);
        self.authorize(Request::FileMake, &path, &[])?;

        let mut state = self.state.borrow_mut();
        state.policy.check(&path, false)?;
        state.ensure_absent(&path)?;
        state.write_content(&path, String::new())
    }

    pub fn read_file(&self, path: &str) -> Result<String, StorageError> {
        let path = normalize(path);
        self.authorize(Request::FileRead, &path, &[])?;

        let state = self.state.borrow();
        state.policy.check(&path, false)?;
        Ok(state.tree.file(&path)?.to_string())
    }

    /// Reads a file and deserializes its JSON content.
    pub fn read_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, StorageError> {
        let content = self.read_file(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Duplicates a file. The copy gets fresh metadata.
    pub fn copy_file(&self, source: &str, dest: &str) -> Result<(), StorageError> {
        let source = normalize(source);
        let dest = normalize(dest);
        self.authorize(Request::FileCopy, &source, &[&dest.joined()])?;

        let mut state = self.state.borrow_mut();
        state.policy.check(&source, false)?;
        let content = state.tree.file(&source)?.to_string();
        state.ensure_absent(&dest)?;
        state.write_content(&dest, content)
    }

    /// Moves a file: copy, then remove the source.
    ///
    /// Protected sources are refused up front. If the source cannot be
    /// removed after the copy, the copy is rolled back.
    pub fn move_file(&self, source: &str, dest: &str) -> Result<(), StorageError> {
        let source = normalize(source);
        let dest = normalize(dest);
        self.authorize(Request::FileMove, &source, &[&dest.joined()])?;

        let mut state = self.state.borrow_mut();
        state.policy.check(&source, false)?;
        let content = state.tree.file(&source)?.to_string();
        state.ensure_absent(&dest)?;
        check_removable(
            &source,
            state.table.get(&source),
            state.settings.read_only_is_undeletable,
        )?;

        state.write_content(&dest, content)?;
        if let Err(e) = state.remove_file(&source) {
            warn!("Rolling back move of {} to {}: {}", source, dest, e);
            state.tree.remove(&dest, Some(NodeKind::File))?;
            state.table.remove(&dest);
            return Err(e);
        }
        Ok(())
    }

    pub fn remove_file(&self, path: &str) -> Result<(), StorageError> {
        let path = normalize(path);
        self.authorize(Request::FileRemove, &path, &[])?;

        let mut state = self.state.borrow_mut();
        state.policy.check(&path, false)?;
        state.remove_file(&path)
    }

    // -- configuration --

    pub fn forbidden_chars(&self) -> String {
        self.state.borrow().policy.forbidden_chars().to_string()
    }

    pub fn is_forbidden(&self, ch: char) -> bool {
        self.state.borrow().policy.is_forbidden(ch)
    }

    pub fn is_strict_forbid(&self) -> bool {
        self.state.borrow().policy.is_strict()
    }

    pub fn is_locked(&self) -> bool {
        self.state.borrow().policy.is_locked()
    }

    /// Adds one or more forbidden characters.
    pub fn forbid(&self, chars: &str) -> Result<(), StorageError> {
        self.ensure_not_authorizing("forbid")?;
        self.state.borrow_mut().policy.forbid(chars)
    }

    /// Removes one or more forbidden characters.
    pub fn unforbid(&self, chars: &str) -> Result<(), StorageError> {
        self.ensure_not_authorizing("unforbid")?;
        self.state.borrow_mut().policy.unforbid(chars)
    }

    pub fn enable_strict_forbid(&self) -> Result<(), StorageError> {
        self.ensure_not_authorizing("enable_strict_forbid")?;
        self.state.borrow_mut().policy.set_strict(true)
    }

    pub fn disable_strict_forbid(&self) -> Result<(), StorageError> {
        self.ensure_not_authorizing("disable_strict_forbid")?;
        self.state.borrow_mut().policy.set_strict(false)
    }

    /// Freezes the forbidden-character configuration for good.
    pub fn lock(&self) -> Result<(), StorageError> {
        self.ensure_not_authorizing("lock")?;
        self.state.borrow_mut().policy.lock();
        debug!("Configuration locked");
        Ok(())
    }

    /// Whether an agent is set and willing to disclose itself.
    pub fn is_agent(&self) -> bool {
        if self.authorizing.get() {
            return false;
        }
        match self.agent.as_deref() {
            Some(agent) => {
                let _guard = AuthorizationGuard::enter(&self.authorizing);
                agent.authorize(Request::AgentExist, "", &[])
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_existence_functions() {
        let storage = Storage::new();
        assert!(!storage.exists("hello"));
        assert!(storage.exists("."));
        assert!(storage.dir_exists("."));
        assert!(!storage.file_exists("."));
        assert!(storage.dir_exists(".."));
    }

    #[test]
    fn test_file_writing_and_reading() {
        let storage = Storage::new();
        storage.write_file("hello.txt", "hello").unwrap();
        assert!(matches!(storage.write_file(".", "hello"), Err(StorageError::RootProtected)));
        assert_eq!(storage.read_file("hello.txt").unwrap(), "hello");
        assert_eq!(storage.read_file("/./hello.txt").unwrap(), "hello");
        assert!(matches!(storage.read_file("."), Err(StorageError::NotAFile(_))));
        assert!(matches!(storage.read_file("nope"), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_empty_content_is_distinct_from_absence() {
        let storage = Storage::new();
        storage.touch_file("empty").unwrap();
        assert!(storage.file_exists("empty"));
        assert_eq!(storage.read_file("empty").unwrap(), "");
        assert!(matches!(storage.touch_file("empty"), Err(StorageError::AlreadyExists(_))));
    }

    #[test]
    fn test_existence_is_exclusive() {
        let storage = Storage::new();
        storage.write_file("f", "x").unwrap();
        for path in ["f", ".", "missing"] {
            assert_eq!(
                storage.exists(path),
                storage.file_exists(path) || storage.dir_exists(path)
            );
            assert!(!(storage.file_exists(path) && storage.dir_exists(path)));
        }
    }

    #[test]
    fn test_append_file() {
        let storage = Storage::new();
        storage.append_file("log", "a", false).unwrap();
        storage.append_file("log", "b", false).unwrap();
        storage.append_file("log", "c", true).unwrap();
        assert_eq!(storage.read_file("log").unwrap(), "a\nbc");
    }

    #[test]
    fn test_append_uses_configured_separator() {
        let settings = StorageSettings {
            append_separator: ", ".to_string(),
            ..StorageSettings::default()
        };
        let storage = Storage::from_parts(settings, ForbidPolicy::default(), None);
        storage.append_file("list", "a", false).unwrap();
        storage.append_file("list", "b", false).unwrap();
        assert_eq!(storage.read_file("list").unwrap(), "a, b");
    }

    #[test]
    fn test_read_json() {
        let storage = Storage::new();
        storage.write_file("data.json", r#"{"n": 3, "tags": ["a"]}"#).unwrap();
        let value: serde_json::Value = storage.read_json("data.json").unwrap();
        assert_eq!(value["n"], 3);
        storage.write_file("bad.json", "{not json").unwrap();
        assert!(matches!(
            storage.read_json::<serde_json::Value>("bad.json"),
            Err(StorageError::Parse(_))
        ));
    }

    #[test]
    fn test_copy_gives_fresh_metadata() {
        let storage = Storage::new();
        storage.write_file("a", "1").unwrap();
        storage.add_flag("a", "h").unwrap();
        storage.copy_file("a", "b").unwrap();
        assert_eq!(storage.read_file("b").unwrap(), "1");
        assert_eq!(storage.get_flags("b").unwrap(), "");
        assert!(matches!(storage.copy_file("a", "b"), Err(StorageError::AlreadyExists(_))));
        assert!(matches!(storage.copy_file("zz", "c"), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_move_file() {
        let storage = Storage::new();
        storage.make_dir("doc").unwrap();
        storage.write_file("doc/x.txt", "1").unwrap();
        storage.move_file("doc/x.txt", "doc/y.txt").unwrap();
        assert!(!storage.exists("doc/x.txt"));
        assert!(storage.get_table_entry("doc/x.txt").is_err());
        assert_eq!(storage.read_file("doc/y.txt").unwrap(), "1");
    }

    #[test]
    fn test_move_refuses_protected_source() {
        let storage = Storage::new();
        storage.write_file("keep", "1").unwrap();
        storage.add_flag("keep", "r").unwrap();
        assert!(matches!(storage.move_file("keep", "moved"), Err(StorageError::ReadOnly(_))));
        assert!(!storage.exists("moved"));
        assert_eq!(storage.read_file("keep").unwrap(), "1");
    }

    #[test]
    fn test_move_into_missing_folder_leaves_source() {
        let storage = Storage::new();
        storage.write_file("a", "1").unwrap();
        assert!(storage.move_file("a", "nowhere/a").is_err());
        assert_eq!(storage.read_file("a").unwrap(), "1");
    }

    #[test]
    fn test_modification_time_is_refreshed() {
        let storage = Storage::new();
        storage.write_file("hello.txt", "hello").unwrap();
        thread::sleep(Duration::from_millis(5));
        storage.write_file("hello.txt", "hello").unwrap();

        let entry = storage.get_table_entry("hello.txt").unwrap();
        assert!(entry.modified_at() > entry.created_at());
        assert_eq!(entry.flags(), "");
    }

    #[test]
    fn test_rewrite_replaces_in_place() {
        let storage = Storage::new();
        let path = normalize("notes");
        let mut state = storage.state.borrow_mut();
        state.write_content(&path, "one".into()).unwrap();
        let created = state.table.get(&path).unwrap().created_at;
        state.write_content(&path, "two".into()).unwrap();

        assert_eq!(state.tree.file(&path).unwrap(), "two");
        assert_eq!(state.table.get(&path).unwrap().created_at, created);
        assert_eq!(state.table.len(), 1);
    }

    #[test]
    fn test_forbidden_characters() {
        let storage = Storage::new();
        assert!(matches!(
            storage.write_file("hello<>", "hello"),
            Err(StorageError::ForbiddenCharacter { .. })
        ));
        storage.unforbid("<").unwrap();
        storage.unforbid(">").unwrap();
        storage.write_file("hello<>", "hello").unwrap();
        assert!(!storage.is_forbidden('<'));
        assert!(!storage.is_forbidden('.'));
        assert!(storage.is_forbidden('|'));

        storage.forbid("h").unwrap();
        assert!(storage.write_file("hello.txt", "hello").is_err());
        storage.forbid("<").unwrap();

        assert!(!storage.is_strict_forbid());
        assert_eq!(storage.read_file("hello<>").unwrap(), "hello");
        storage.enable_strict_forbid().unwrap();
        assert!(storage.is_strict_forbid());
        assert!(storage.read_file("hello<>").is_err());
        assert!(!storage.exists("hello<>"));
        storage.disable_strict_forbid().unwrap();
        assert!(!storage.is_strict_forbid());
    }

    #[test]
    fn test_empty_write_skips_forbidden_check() {
        let storage = Storage::new();
        storage.write_file("a:b", "").unwrap();
        assert!(storage.append_file("a:b", "x", true).is_err());
    }

    #[test]
    fn test_lock_mode() {
        let storage = Storage::new();
        assert!(!storage.is_locked());
        storage.lock().unwrap();
        assert!(storage.is_locked());
        assert!(matches!(storage.forbid("f"), Err(StorageError::ConfigurationLocked)));
        assert!(matches!(storage.unforbid(":"), Err(StorageError::ConfigurationLocked)));
        assert!(storage.enable_strict_forbid().is_err());
        assert!(storage.disable_strict_forbid().is_err());
        assert!(!storage.is_forbidden('f'));
    }

    #[test]
    fn test_from_config_locks_on_start() {
        let mut config = VfsConfig::default();
        config.policy.forbidden_chars = "#".to_string();
        config.policy.lock_on_start = true;
        let storage = Storage::from_config(&config, None).unwrap();
        assert!(storage.is_locked());
        assert_eq!(storage.forbidden_chars(), "#");
        assert!(storage.write_file("a#b", "x").is_err());
    }

    #[test]
    fn test_is_within() {
        let storage = Storage::new();
        assert!(storage.is_within("doc/a/b", "/doc"));
        assert!(storage.is_within("doc", "doc/"));
        assert!(!storage.is_within("docs/a", "doc"));
        assert!(storage.is_within("anything", "/"));
    }
}
