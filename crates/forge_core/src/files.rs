//! Project file sets and the on-disk / wire representations.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::CoreResult;

/// Canonical path of the project manifest.
pub const MANIFEST_PATH: &str = "Cargo.toml";

/// Canonical path of the project entry point.
pub const ENTRY_POINT_PATH: &str = "src/main.rs";

/// Canonical path of the project readme.
pub const README_PATH: &str = "README.md";

/// Minimal manifest used when the model output did not contain one.
pub const DEFAULT_MANIFEST: &str = r#"[package]
name = "rust_project"
version = "0.1.0"
edition = "2021"

[dependencies]
"#;

/// Minimal entry point used when the model output did not contain one.
pub const DEFAULT_ENTRY_POINT: &str = r#"fn main() {
    println!("Hello, world!");
}
"#;

/// A single generated file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectFile {
    /// Path relative to the project root, forward slashes.
    pub path: String,
    /// File content, verbatim.
    pub content: String,
}

/// An ordered set of project files keyed by relative path.
///
/// Insertion order is preserved but carries no meaning; paths are unique and
/// inserting an existing path overwrites its content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileSet {
    entries: Vec<ProjectFile>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.iter().any(|f| f.path == path)
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|f| f.path == path)
            .map(|f| f.content.as_str())
    }

    /// Insert a file, overwriting any existing entry at the same path.
    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        let path = path.into();
        let content = content.into();
        match self.entries.iter_mut().find(|f| f.path == path) {
            Some(existing) => existing.content = content,
            None => self.entries.push(ProjectFile { path, content }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|f| (f.path.as_str(), f.content.as_str()))
    }

    pub fn paths(&self) -> Vec<&str> {
        self.entries.iter().map(|f| f.path.as_str()).collect()
    }

    /// Remove a file by path, returning its content if present.
    pub fn remove(&mut self, path: &str) -> Option<String> {
        let index = self.entries.iter().position(|f| f.path == path)?;
        Some(self.entries.remove(index).content)
    }

    /// Merge a patch into this set: paths mentioned in `patch` are
    /// overwritten, everything else is preserved.
    pub fn merge(&mut self, patch: FileSet) {
        for file in patch.entries {
            self.insert(file.path, file.content);
        }
    }

    /// Complete the minimal Cargo project skeleton: a manifest and an entry
    /// point are added with default content when missing.
    pub fn ensure_project_skeleton(&mut self) {
        if !self.contains(MANIFEST_PATH) {
            self.insert(MANIFEST_PATH, DEFAULT_MANIFEST);
        }
        if !self.contains(ENTRY_POINT_PATH) {
            self.insert(ENTRY_POINT_PATH, DEFAULT_ENTRY_POINT);
        }
    }

    /// Render the wire format: each file introduced by a
    /// `[filename: <path>]` marker line, content verbatim.
    pub fn to_wire(&self) -> String {
        let mut out = String::new();
        for (i, file) in self.entries.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!("[filename: {}]\n{}\n", file.path, file.content));
        }
        out
    }

    /// Write every file under `dir`, creating parent directories as needed
    /// and overwriting existing files. Returns the written relative paths.
    ///
    /// Entries with absolute or parent-escaping paths are skipped.
    pub fn write_to(&self, dir: &Path) -> CoreResult<Vec<String>> {
        let mut written = Vec::new();
        for file in &self.entries {
            if !is_safe_relative_path(&file.path) {
                warn!(path = %file.path, "skipping unsafe file path");
                continue;
            }
            let full_path = dir.join(&file.path);
            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&full_path, &file.content)?;
            debug!(path = %file.path, "wrote project file");
            written.push(file.path.clone());
        }
        Ok(written)
    }

    /// Read a project tree back into a file set, skipping build artifacts
    /// and VCS metadata. Non-UTF-8 files are ignored with a warning.
    pub fn read_from(dir: &Path) -> CoreResult<FileSet> {
        let mut files = FileSet::new();
        for entry in WalkDir::new(dir)
            .into_iter()
            .filter_entry(|e| {
                let name = e.file_name().to_string_lossy();
                name != "target" && name != ".git"
            })
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let relative = match entry.path().strip_prefix(dir) {
                Ok(p) => p.to_string_lossy().replace('\\', "/"),
                Err(_) => continue,
            };
            match fs::read_to_string(entry.path()) {
                Ok(content) => files.insert(relative, content),
                Err(e) => warn!(path = %relative, "skipping unreadable file: {}", e),
            }
        }
        Ok(files)
    }
}

impl PartialEq for FileSet {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().all(|(path, content)| other.get(path) == Some(content))
    }
}

fn is_safe_relative_path(path: &str) -> bool {
    let p = Path::new(path);
    !p.is_absolute()
        && !p
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_insert_overwrites_existing_path() {
        let mut files = FileSet::new();
        files.insert("src/main.rs", "fn main() {}");
        files.insert("src/main.rs", "fn main() { run(); }");

        assert_eq!(files.len(), 1);
        assert_eq!(files.get("src/main.rs"), Some("fn main() { run(); }"));
    }

    #[test]
    fn test_merge_preserves_unmentioned_paths() {
        let mut files = FileSet::new();
        files.insert("Cargo.toml", "[package]");
        files.insert("src/main.rs", "fn main() {}");

        let mut patch = FileSet::new();
        patch.insert("src/main.rs", "fn main() { fixed(); }");
        files.merge(patch);

        assert_eq!(files.len(), 2);
        assert_eq!(files.get("Cargo.toml"), Some("[package]"));
        assert_eq!(files.get("src/main.rs"), Some("fn main() { fixed(); }"));
    }

    #[test]
    fn test_ensure_project_skeleton_fills_missing_files() {
        let mut files = FileSet::new();
        files.insert("a.txt", "hello");
        files.ensure_project_skeleton();

        assert!(files.contains(MANIFEST_PATH));
        assert!(files.contains(ENTRY_POINT_PATH));
        assert_eq!(files.get("a.txt"), Some("hello"));
    }

    #[test]
    fn test_ensure_project_skeleton_keeps_existing_manifest() {
        let mut files = FileSet::new();
        files.insert(MANIFEST_PATH, "[package]\nname = \"custom\"\n");
        files.ensure_project_skeleton();

        assert_eq!(files.get(MANIFEST_PATH), Some("[package]\nname = \"custom\"\n"));
        assert_eq!(files.get(ENTRY_POINT_PATH), Some(DEFAULT_ENTRY_POINT));
    }

    #[test]
    fn test_write_read_round_trip() {
        let temp = tempdir().unwrap();

        let mut files = FileSet::new();
        files.insert("Cargo.toml", DEFAULT_MANIFEST);
        files.insert("src/main.rs", DEFAULT_ENTRY_POINT);
        files.insert("src/lib/util.rs", "pub fn util() {}\n");

        let written = files.write_to(temp.path()).unwrap();
        assert_eq!(written.len(), 3);

        let read_back = FileSet::read_from(temp.path()).unwrap();
        assert_eq!(read_back, files);
    }

    #[test]
    fn test_write_skips_escaping_paths() {
        let temp = tempdir().unwrap();

        let mut files = FileSet::new();
        files.insert("../escape.txt", "nope");
        files.insert("ok.txt", "fine");

        let written = files.write_to(temp.path()).unwrap();
        assert_eq!(written, vec!["ok.txt".to_string()]);
        assert!(!temp.path().parent().unwrap().join("escape.txt").exists());
    }

    #[test]
    fn test_to_wire_renders_marker_blocks() {
        let mut files = FileSet::new();
        files.insert("a.txt", "hello");
        files.insert("b.txt", "world");

        let wire = files.to_wire();
        assert!(wire.contains("[filename: a.txt]\nhello"));
        assert!(wire.contains("[filename: b.txt]\nworld"));
    }
}
