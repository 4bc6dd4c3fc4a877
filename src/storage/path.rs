//! Virtual path normalization
//!
//! Every path handed to the storage is reduced to a canonical list of
//! segments before it touches the tree or the metadata table.

use std::fmt;

/// A normalized path inside the virtual tree.
///
/// The empty segment list is the root. Segments are never empty and never
/// `.` or `..`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VirtualPath {
    segments: Vec<String>,
}

/// Normalizes a raw path string.
///
/// Splits on `/`, drops empty and `.` tokens, and lets `..` pop the previous
/// segment. `..` at the root is a no-op, so a path can never climb above it.
/// `None` normalizes to the root.
pub fn normalize<'a>(raw: impl Into<Option<&'a str>>) -> VirtualPath {
    let mut segments: Vec<String> = Vec::new();

    for token in raw.into().unwrap_or("").split('/') {
        match token {
            ".." => {
                segments.pop();
            }
            "" | "." => {}
            name => segments.push(name.to_string()),
        }
    }

    VirtualPath { segments }
}

impl VirtualPath {
    /// The root path.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Joined form used as the metadata table key (`a/b/c`, root is `""`).
    pub fn joined(&self) -> String {
        self.segments.join("/")
    }

    /// Last segment, `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Parent path, `None` for the root.
    pub fn parent(&self) -> Option<VirtualPath> {
        if self.is_root() {
            return None;
        }
        Some(VirtualPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Appends a relative path and normalizes the result.
    pub fn join(&self, relative: &str) -> VirtualPath {
        normalize(format!("{}/{}", self.joined(), relative).as_str())
    }

    /// Segment-wise prefix test. `doc` contains `doc/a` but not `docs`.
    pub fn starts_with(&self, parent: &VirtualPath) -> bool {
        self.segments.len() >= parent.segments.len()
            && self.segments[..parent.segments.len()] == parent.segments[..]
    }

    /// Path relative to `parent`, or `None` when not contained in it.
    pub fn strip_prefix(&self, parent: &VirtualPath) -> Option<VirtualPath> {
        if !self.starts_with(parent) {
            return None;
        }
        Some(VirtualPath {
            segments: self.segments[parent.segments.len()..].to_vec(),
        })
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.joined())
    }
}

impl From<&str> for VirtualPath {
    fn from(raw: &str) -> Self {
        normalize(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_root_forms() {
        assert_eq!(normalize("/").joined(), "");
        assert_eq!(normalize("").joined(), "");
        assert_eq!(normalize(None::<&str>).joined(), "");
        assert!(normalize("/./").is_root());
    }

    #[test]
    fn test_normalize_complex_paths() {
        assert_eq!(normalize("/test//").joined(), "test");
        assert_eq!(normalize("a/./b/../c").joined(), "a/c");
        assert_eq!(normalize("../../a").joined(), "a");
        assert_eq!(normalize("a/b/../../..").joined(), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["", "/", "a//b", "./x/../y/", "../..", "doc/./test.txt", "a/b/c/.."] {
            let once = normalize(raw).joined();
            let twice = normalize(once.as_str()).joined();
            assert_eq!(once, twice, "normalize not idempotent for {raw:?}");
        }
    }

    #[test]
    fn test_parent_and_file_name() {
        let path = normalize("doc/sub/file.txt");
        assert_eq!(path.file_name(), Some("file.txt"));
        assert_eq!(path.parent().map(|p| p.joined()), Some("doc/sub".to_string()));
        assert_eq!(VirtualPath::root().parent(), None);
        assert_eq!(VirtualPath::root().file_name(), None);
    }

    #[test]
    fn test_prefix_is_segment_wise() {
        let doc = normalize("doc");
        assert!(normalize("doc/a").starts_with(&doc));
        assert!(normalize("doc").starts_with(&doc));
        assert!(!normalize("docs/a").starts_with(&doc));
        assert!(normalize("x").starts_with(&VirtualPath::root()));
        assert_eq!(
            normalize("doc/a/b").strip_prefix(&doc).map(|p| p.joined()),
            Some("a/b".to_string())
        );
        assert_eq!(normalize("docs").strip_prefix(&doc), None);
    }

    #[test]
    fn test_join_resolves_dots() {
        let base = normalize("home/user");
        assert_eq!(base.join("../other").joined(), "home/other");
        assert_eq!(base.join("./file").joined(), "home/user/file");
        assert_eq!(VirtualPath::root().join("a").joined(), "a");
    }
}
