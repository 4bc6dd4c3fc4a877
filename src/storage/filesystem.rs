//! In-memory tree
//!
//! Owns every node of the virtual filesystem. The tree has no notion of
//! metadata, flags or agents; those are layered on top by [`Storage`].
//!
//! [`Storage`]: crate::storage::Storage

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::storage::path::VirtualPath;

/// Kind of a node, used for type-checked access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::File => write!(f, "file"),
            NodeKind::Directory => write!(f, "folder"),
        }
    }
}

/// A file or a folder.
///
/// Serializes as a plain string for files and as a name → node object for
/// folders, which is the shape used by exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    File(String),
    Directory(Directory),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::File(_) => NodeKind::File,
            Node::Directory(_) => NodeKind::Directory,
        }
    }

    /// Builds a node from dynamic data.
    ///
    /// Only strings and non-array objects (recursively) are accepted.
    pub fn from_value(value: &serde_json::Value) -> Result<Node, StorageError> {
        match value {
            serde_json::Value::String(content) => Ok(Node::File(content.clone())),
            serde_json::Value::Object(_) => Ok(Node::Directory(Directory::from_value(value)?)),
            other => Err(StorageError::MalformedInput(format!(
                "expected a string or an object, got {}",
                other
            ))),
        }
    }
}

/// Children of a folder, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Directory {
    entries: IndexMap<String, Node>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_sub_folders(&self) -> bool {
        self.entries
            .values()
            .any(|node| matches!(node, Node::Directory(_)))
    }

    /// Inserts or replaces a child. Returns the previous node, if any.
    pub fn insert(&mut self, name: impl Into<String>, node: Node) -> Option<Node> {
        self.entries.insert(name.into(), node)
    }

    /// Resolves a path relative to this folder. The empty path is not a child.
    pub fn find(&self, relative: &VirtualPath) -> Option<&Node> {
        let (last, intermediate) = relative.segments().split_last()?;
        let mut dir = self;
        for name in intermediate {
            match dir.get(name)? {
                Node::Directory(child) => dir = child,
                Node::File(_) => return None,
            }
        }
        dir.get(last)
    }

    fn remove(&mut self, name: &str) -> Option<Node> {
        self.entries.shift_remove(name)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.entries.get_mut(name)
    }

    /// Builds a folder from a JSON object, validating every level.
    pub fn from_value(value: &serde_json::Value) -> Result<Directory, StorageError> {
        let serde_json::Value::Object(map) = value else {
            return Err(StorageError::MalformedInput(
                "folder must be a non-array object".into(),
            ));
        };

        let mut directory = Directory::new();
        for (name, child) in map {
            validate_segment(name)?;
            directory.insert(name.clone(), Node::from_value(child)?);
        }
        Ok(directory)
    }

    /// Checks that every name in the subtree is a usable path segment.
    pub fn validate(&self) -> Result<(), StorageError> {
        for (name, node) in self.iter() {
            validate_segment(name)?;
            if let Node::Directory(child) = node {
                child.validate()?;
            }
        }
        Ok(())
    }
}

fn validate_segment(name: &str) -> Result<(), StorageError> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') {
        return Err(StorageError::MalformedInput(format!(
            "invalid entry name {:?}",
            name
        )));
    }
    Ok(())
}

/// Result of a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Replaced,
}

/// The rooted tree of nodes.
#[derive(Debug)]
pub struct TreeStore {
    root: Node,
}

impl Default for TreeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeStore {
    pub fn new() -> Self {
        Self {
            root: Node::Directory(Directory::new()),
        }
    }

    fn root_dir(&self) -> &Directory {
        match &self.root {
            Node::Directory(dir) => dir,
            Node::File(_) => unreachable!("the root node is always a directory"),
        }
    }

    fn root_dir_mut(&mut self) -> &mut Directory {
        match &mut self.root {
            Node::Directory(dir) => dir,
            Node::File(_) => unreachable!("the root node is always a directory"),
        }
    }

    /// Walks the intermediate segments of `path`, never creating anything.
    fn parent_dir(&self, path: &VirtualPath) -> Result<&Directory, StorageError> {
        let segments = path.segments();
        let mut dir = self.root_dir();

        for (depth, name) in segments[..segments.len().saturating_sub(1)].iter().enumerate() {
            dir = match dir.get(name) {
                Some(Node::Directory(child)) => child,
                Some(Node::File(_)) => {
                    return Err(StorageError::NotADirectory(segments[..=depth].join("/")));
                }
                None => return Err(StorageError::NotFound(segments[..=depth].join("/"))),
            };
        }
        Ok(dir)
    }

    fn parent_dir_mut(&mut self, path: &VirtualPath) -> Result<&mut Directory, StorageError> {
        let segments = path.segments();
        let mut dir = self.root_dir_mut();

        for (depth, name) in segments[..segments.len().saturating_sub(1)].iter().enumerate() {
            dir = match dir.get_mut(name) {
                Some(Node::Directory(child)) => child,
                Some(Node::File(_)) => {
                    return Err(StorageError::NotADirectory(segments[..=depth].join("/")));
                }
                None => return Err(StorageError::NotFound(segments[..=depth].join("/"))),
            };
        }
        Ok(dir)
    }

    /// Looks up a node, optionally requiring a kind.
    ///
    /// The root can only be observed as a directory.
    pub fn lookup(
        &self,
        path: &VirtualPath,
        expected: Option<NodeKind>,
    ) -> Result<&Node, StorageError> {
        let Some(name) = path.file_name() else {
            return match expected {
                None | Some(NodeKind::Directory) => Ok(&self.root),
                Some(NodeKind::File) => Err(StorageError::NotAFile(path.joined())),
            };
        };

        let node = self
            .parent_dir(path)?
            .get(name)
            .ok_or_else(|| StorageError::NotFound(path.joined()))?;
        check_kind(node, expected, path)?;
        Ok(node)
    }

    /// Looks up a folder.
    pub fn directory(&self, path: &VirtualPath) -> Result<&Directory, StorageError> {
        match self.lookup(path, Some(NodeKind::Directory))? {
            Node::Directory(dir) => Ok(dir),
            Node::File(_) => Err(StorageError::NotADirectory(path.joined())),
        }
    }

    /// Reads a file's content.
    pub fn file(&self, path: &VirtualPath) -> Result<&str, StorageError> {
        match self.lookup(path, Some(NodeKind::File))? {
            Node::File(content) => Ok(content),
            Node::Directory(_) => Err(StorageError::NotAFile(path.joined())),
        }
    }

    /// Writes a node. An existing node of the other kind is never replaced.
    pub fn write(&mut self, path: &VirtualPath, node: Node) -> Result<WriteOutcome, StorageError> {
        let Some(name) = path.file_name() else {
            return Err(StorageError::RootProtected);
        };

        let parent = self.parent_dir_mut(path)?;
        if let Some(existing) = parent.get(name) {
            check_kind(existing, Some(node.kind()), path)?;
        }

        match parent.insert(name, node) {
            Some(_) => Ok(WriteOutcome::Replaced),
            None => Ok(WriteOutcome::Created),
        }
    }

    /// Detaches a node from its parent and hands it back.
    pub fn remove(
        &mut self,
        path: &VirtualPath,
        expected: Option<NodeKind>,
    ) -> Result<Node, StorageError> {
        let Some(name) = path.file_name() else {
            return Err(StorageError::RootProtected);
        };

        let parent = self.parent_dir_mut(path)?;
        let existing = parent
            .get(name)
            .ok_or_else(|| StorageError::NotFound(path.joined()))?;
        check_kind(existing, expected, path)?;

        parent
            .remove(name)
            .ok_or_else(|| StorageError::NotFound(path.joined()))
    }
}

fn check_kind(
    node: &Node,
    expected: Option<NodeKind>,
    path: &VirtualPath,
) -> Result<(), StorageError> {
    match (expected, node.kind()) {
        (Some(NodeKind::File), NodeKind::Directory) => Err(StorageError::NotAFile(path.joined())),
        (Some(NodeKind::Directory), NodeKind::File) => {
            Err(StorageError::NotADirectory(path.joined()))
        }
        _ => Ok(()),
    }
}
