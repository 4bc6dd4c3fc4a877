//! Folder operations
//!
//! Creation, listing, recursive removal and the export/import pair.

use log::{debug, info};

use crate::auth::Request;
use crate::error::StorageError;
use crate::storage::Storage;
use crate::storage::filesystem::{Directory, Node, NodeKind};
use crate::storage::operations::now;
use crate::storage::path::{VirtualPath, normalize};
use crate::storage::results::ExportedFolder;
use crate::storage::table::{Flag, MetadataEntry};

impl Storage {
    /// Creates an empty folder. The parent must already exist.
    pub fn make_dir(&self, path: &str) -> Result<(), StorageError> {
        let path = normalize(path);
        self.authorize(Request::FolderMake, &path, &[])?;
        if path.is_root() {
            return Err(StorageError::RootProtected);
        }

        let mut state = self.state.borrow_mut();
        state.policy.check(&path, false)?;
        state.ensure_absent(&path)?;

        state.tree.write(&path, Node::Directory(Directory::new()))?;
        state.table.touch(&path, now());
        debug!("Created folder {}", path);
        Ok(())
    }

    /// Names of the immediate children, in creation order.
    ///
    /// Items flagged hidden are left out unless `show_hidden` is set.
    pub fn read_dir(&self, path: &str, show_hidden: bool) -> Result<Vec<String>, StorageError> {
        let path = normalize(path);
        self.authorize(Request::FolderRead, &path, &[])?;

        let state = self.state.borrow();
        state.policy.check(&path, false)?;
        let dir = state.tree.directory(&path)?;

        Ok(dir
            .names()
            .filter(|name| show_hidden || !state.table.has_flag(&path.join(name), Flag::Hidden))
            .map(str::to_string)
            .collect())
    }

    /// Owned copy of a folder's whole subtree.
    pub fn get_tree(&self, path: &str) -> Result<Directory, StorageError> {
        let path = normalize(path);
        self.authorize(Request::FolderTree, &path, &[])?;

        let state = self.state.borrow();
        state.policy.check(&path, false)?;
        Ok(state.tree.directory(&path)?.clone())
    }

    pub fn has_sub_folders(&self, path: &str) -> Result<bool, StorageError> {
        let path = normalize(path);
        self.authorize(Request::FolderHasSubFolders, &path, &[])?;

        let state = self.state.borrow();
        state.policy.check(&path, false)?;
        Ok(state.tree.directory(&path)?.has_sub_folders())
    }

    /// Removes a folder; a non-empty one only when `recursive` is set.
    pub fn remove_tree(&self, path: &str, recursive: bool) -> Result<(), StorageError> {
        let path = normalize(path);
        self.authorize(Request::FolderRemove, &path, &[])?;

        let mut state = self.state.borrow_mut();
        state.policy.check(&path, false)?;
        state.remove_tree(&path, recursive)
    }

    /// Snapshot of a folder and the table entries below it.
    pub fn export_folder(&self, path: &str) -> Result<ExportedFolder, StorageError> {
        let path = normalize(path);
        self.authorize(Request::FolderExport, &path, &[])?;

        let state = self.state.borrow();
        state.policy.check(&path, false)?;
        let folder = state.tree.directory(&path)?.clone();

        Ok(ExportedFolder {
            path: path.joined(),
            folder,
            table: state.table.subset(&path),
        })
    }

    /// Writes an exported folder back into the tree.
    ///
    /// The destination defaults to the export's own path. An existing
    /// destination is an error unless `force` is set, in which case it is
    /// removed first (subject to its own flags). Table entries are restored
    /// for the items present in the folder; the destination itself gets a
    /// fresh entry.
    pub fn import_folder(
        &self,
        export: &ExportedFolder,
        target: Option<&str>,
        force: bool,
    ) -> Result<(), StorageError> {
        export.folder.validate()?;
        let mut restored: Vec<(VirtualPath, MetadataEntry)> = Vec::new();
        for (key, entry) in &export.table {
            let relative = normalize(key.as_str());
            if export.folder.find(&relative).is_some() {
                restored.push((relative, MetadataEntry::try_from(entry)?));
            }
        }

        let target = normalize(target.unwrap_or(&export.path));
        let extra: &[&str] = if force { &["force"] } else { &[] };
        self.authorize(Request::FolderImport, &target, extra)?;

        if target.is_root() {
            return Err(StorageError::RootProtected);
        }

        let mut state = self.state.borrow_mut();
        state.policy.check(&target, false)?;
        if let Some(parent) = target.parent() {
            state.tree.directory(&parent)?;
        }

        match state.tree.lookup(&target, None).map(Node::kind) {
            Ok(_) if !force => return Err(StorageError::AlreadyExists(target.joined())),
            Ok(NodeKind::Directory) => state.remove_tree(&target, true)?,
            Ok(NodeKind::File) => state.remove_file(&target)?,
            Err(_) => {}
        }

        state.tree.write(&target, Node::Directory(export.folder.clone()))?;
        state.table.insert(&target, MetadataEntry::new(now()));
        let count = restored.len();
        for (relative, entry) in restored {
            state.table.insert(&target.join(&relative.joined()), entry);
        }

        info!("Imported folder into {} ({} table entries)", target, count);
        Ok(())
    }

    /// Validates dynamic data as an export, then imports it.
    pub fn import_json(
        &self,
        value: &serde_json::Value,
        target: Option<&str>,
        force: bool,
    ) -> Result<(), StorageError> {
        let export = ExportedFolder::from_value(value)?;
        self.import_folder(&export, target, force)
    }
}
