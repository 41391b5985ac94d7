//! File system helpers for project discovery and artifact probing.

use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Check if a regular file exists in a directory
pub fn has_file(dir: &Path, filename: &str) -> bool {
    dir.join(filename).is_file()
}

/// Walk from `start` towards the filesystem root and return the first directory
/// containing `filename`.
pub fn find_upward(start: &Path, filename: &str) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if has_file(dir, filename) {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

/// Recursively search `root` for a file called `filename`, following symlinks. A missing
/// root is not an error; an unreadable directory below it is.
pub fn contains_file_named(root: &Path, filename: &str) -> io::Result<bool> {
    if !root.is_dir() {
        return Ok(false);
    }
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry?;
        if entry.file_type().is_file() && entry.file_name() == filename {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Make `path` absolute against `base` without touching the filesystem.
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_upward_from_nested_dir() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("generator.yml"), "app: {}\n").unwrap();
        let nested = temp.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(
            find_upward(&nested, "generator.yml"),
            Some(temp.path().to_path_buf())
        );
        assert_eq!(find_upward(&nested, "nope.yml"), None);
    }

    #[test]
    fn test_contains_file_named_recurses() {
        let temp = TempDir::new().unwrap();
        let deep = temp.path().join("functions/hello");
        fs::create_dir_all(&deep).unwrap();
        assert!(!contains_file_named(temp.path(), "Dockerfile").unwrap());
        assert!(!contains_file_named(&temp.path().join("missing"), "Dockerfile").unwrap());

        fs::write(deep.join("Dockerfile"), "FROM scratch\n").unwrap();
        assert!(contains_file_named(temp.path(), "Dockerfile").unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_contains_file_named_follows_symlinks() {
        let temp = TempDir::new().unwrap();
        let shared = temp.path().join("shared");
        fs::create_dir_all(&shared).unwrap();
        fs::write(shared.join("Dockerfile.base"), "FROM scratch\n").unwrap();

        let functions = temp.path().join("functions/hello");
        fs::create_dir_all(&functions).unwrap();
        std::os::unix::fs::symlink(shared.join("Dockerfile.base"), functions.join("Dockerfile"))
            .unwrap();
        assert!(contains_file_named(&temp.path().join("functions"), "Dockerfile").unwrap());

        let linked_dir = temp.path().join("linked");
        fs::create_dir_all(&linked_dir).unwrap();
        fs::create_dir_all(shared.join("nested")).unwrap();
        fs::write(shared.join("nested/Dockerfile"), "FROM scratch\n").unwrap();
        std::os::unix::fs::symlink(shared.join("nested"), linked_dir.join("fn")).unwrap();
        assert!(contains_file_named(&linked_dir, "Dockerfile").unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_contains_file_named_reports_broken_links() {
        let temp = TempDir::new().unwrap();
        std::os::unix::fs::symlink(temp.path().join("gone"), temp.path().join("dangling"))
            .unwrap();
        assert!(contains_file_named(temp.path(), "Dockerfile").is_err());
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("generator.yml")).unwrap();
        assert!(!has_file(temp.path(), "generator.yml"));
    }
}
