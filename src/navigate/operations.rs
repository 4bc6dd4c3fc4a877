//! Navigation operations implementation

use crate::error::NavigateError;
use crate::storage::{Storage, VirtualPath, normalize};

/// Resolves a shell argument against the working directory.
///
/// A leading `/` makes the argument absolute.
pub fn resolve_path(cwd: &VirtualPath, target: &str) -> VirtualPath {
    if target.starts_with('/') {
        normalize(target)
    } else {
        cwd.join(target)
    }
}

/// Changes the working directory of a session
pub fn change_directory(
    storage: &Storage,
    cwd: &VirtualPath,
    target: &str,
) -> Result<VirtualPath, NavigateError> {
    if target.trim().is_empty() {
        return Err(NavigateError::InvalidPath("Empty path provided".into()));
    }

    let new_cwd = resolve_path(cwd, target);
    if !storage.dir_exists(&new_cwd.joined()) {
        return Err(NavigateError::DirectoryNotFound(format!("/{}", new_cwd)));
    }

    Ok(new_cwd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_and_absolute() {
        let cwd = normalize("doc/sub");
        assert_eq!(resolve_path(&cwd, "a.txt").joined(), "doc/sub/a.txt");
        assert_eq!(resolve_path(&cwd, "../x").joined(), "doc/x");
        assert_eq!(resolve_path(&cwd, "/top").joined(), "top");
        assert!(resolve_path(&cwd, "/").is_root());
        assert!(resolve_path(&cwd, "../../../..").is_root());
    }

    #[test]
    fn test_change_directory() {
        let storage = Storage::new();
        storage.make_dir("doc").unwrap();
        storage.write_file("doc/f", "x").unwrap();

        let cwd = change_directory(&storage, &VirtualPath::root(), "doc").unwrap();
        assert_eq!(cwd.joined(), "doc");
        assert!(matches!(
            change_directory(&storage, &cwd, "f"),
            Err(NavigateError::DirectoryNotFound(p)) if p == "/doc/f"
        ));
        assert!(matches!(
            change_directory(&storage, &cwd, " "),
            Err(NavigateError::InvalidPath(_))
        ));
        assert!(change_directory(&storage, &cwd, "..").unwrap().is_root());
    }
}
