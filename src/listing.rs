//! Directory enumeration behind a small trait
//!
//! Agents never touch `std::fs` directly; they go through [`DirLister`] so
//! production runs walk the real filesystem while tests and benches walk
//! in-memory trees with fully deterministic contents and ordering.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Type of directory child
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Regular file
    File,
    /// Directory
    Directory,
    /// Symbolic link (published by name, never followed)
    Symlink,
    /// Anything else (device, fifo, socket, ...)
    Other,
}

impl EntryKind {
    /// Check if this is a regular file
    pub fn is_file(&self) -> bool {
        *self == EntryKind::File
    }

    /// Check if this is a directory
    pub fn is_dir(&self) -> bool {
        *self == EntryKind::Directory
    }

    /// Check if this is a symbolic link
    pub fn is_symlink(&self) -> bool {
        *self == EntryKind::Symlink
    }
}

/// One child of a directory as reported by a lister
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEntry {
    /// Name of the child (no path components)
    pub name: OsString,

    /// What kind of entry it is
    pub kind: EntryKind,
}

impl ChildEntry {
    /// Create a new child entry
    pub fn new(name: impl Into<OsString>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Create a file entry
    pub fn file(name: impl Into<OsString>) -> Self {
        Self::new(name, EntryKind::File)
    }

    /// Create a directory entry
    pub fn dir(name: impl Into<OsString>) -> Self {
        Self::new(name, EntryKind::Directory)
    }
}

/// Source of directory contents for the traversal agents
pub trait DirLister: Send + Sync {
    /// List the children of `dir`
    ///
    /// Never yields `.` or `..`. A failure means the directory could not
    /// be enumerated at all; the caller decides what that means for the
    /// traversal.
    fn list(&self, dir: &Path) -> io::Result<Vec<ChildEntry>>;
}

/// Lister over the real filesystem
///
/// By default children are sorted by name so that equivalent trees
/// enumerate in the same order regardless of the underlying filesystem.
/// `unsorted()` trusts the raw `read_dir` order instead.
#[derive(Debug, Clone, Copy)]
pub struct OsLister {
    sorted: bool,
}

impl OsLister {
    /// Create a lister that sorts each directory's children by name
    pub fn new() -> Self {
        Self { sorted: true }
    }

    /// Create a lister that preserves the OS enumeration order
    pub fn unsorted() -> Self {
        Self { sorted: false }
    }
}

impl Default for OsLister {
    fn default() -> Self {
        Self::new()
    }
}

impl DirLister for OsLister {
    fn list(&self, dir: &Path) -> io::Result<Vec<ChildEntry>> {
        let mut children = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            // file_type() does not follow symlinks
            let file_type = entry.file_type()?;

            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_file() {
                EntryKind::File
            } else if file_type.is_symlink() {
                EntryKind::Symlink
            } else {
                EntryKind::Other
            };

            children.push(ChildEntry {
                name: entry.file_name(),
                kind,
            });
        }

        if self.sorted {
            children.sort_by(|a, b| a.name.cmp(&b.name));
        }

        Ok(children)
    }
}

/// In-memory lister for tests and benches
///
/// Holds a map from absolute directory path to its children, in the exact
/// order they should be enumerated. Listing a path with no mapping fails
/// with `NotFound`, which is the deterministic way to exercise the
/// enumeration-failure policy.
#[derive(Debug, Default)]
pub struct StaticLister {
    dirs: HashMap<PathBuf, Vec<ChildEntry>>,
}

impl StaticLister {
    /// Create an empty lister (every listing fails)
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a directory and its children
    pub fn insert(&mut self, dir: impl Into<PathBuf>, children: Vec<ChildEntry>) {
        self.dirs.insert(dir.into(), children);
    }

    /// Builder-style variant of `insert`
    pub fn with_dir(mut self, dir: impl Into<PathBuf>, children: Vec<ChildEntry>) -> Self {
        self.insert(dir, children);
        self
    }
}

impl DirLister for StaticLister {
    fn list(&self, dir: &Path) -> io::Result<Vec<ChildEntry>> {
        self.dirs.get(dir).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such directory: {}", dir.display()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_os_lister_sorted_order() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("c.txt"), b"").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"").unwrap();
        std::fs::create_dir(dir.path().join("b")).unwrap();

        let children = OsLister::new().list(dir.path()).unwrap();
        let names: Vec<_> = children
            .iter()
            .map(|c| c.name.to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["a.txt", "b", "c.txt"]);
        assert!(children[1].kind.is_dir());
        assert!(children[0].kind.is_file());
    }

    #[test]
    fn test_os_lister_unsorted_same_set() {
        let dir = tempdir().unwrap();
        for name in ["one", "two", "three"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let mut names: Vec<_> = OsLister::unsorted()
            .list(dir.path())
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        names.sort();

        assert_eq!(names, vec!["one", "three", "two"]);
    }

    #[test]
    fn test_os_lister_missing_dir() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(OsLister::new().list(&missing).is_err());
    }

    #[test]
    fn test_static_lister() {
        let lister = StaticLister::new().with_dir(
            "/t",
            vec![ChildEntry::file("x"), ChildEntry::dir("sub")],
        );

        let children = lister.list(Path::new("/t")).unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0], ChildEntry::file("x"));
        assert!(children[1].kind.is_dir());

        let err = lister.list(Path::new("/t/sub")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
