//! Temporary project directories.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary project with configurable files.
///
/// # Example
///
/// ```rust
/// use codeintel_test_utils::fixtures::TestProject;
///
/// let project = TestProject::new()
///     .with_config(r#"{ "tooltips": "status" }"#)
///     .with_file("pkg/__init__.py", "")
///     .build();
///
/// assert!(project.path().join("codeintel.json").exists());
/// ```
pub struct TestProject {
    temp_dir: TempDir,
    /// Path relative to the root -> contents.
    files: HashMap<PathBuf, String>,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
            files: HashMap::new(),
        }
    }

    /// Add a file; parent directories are created on build.
    pub fn with_file(mut self, path: impl AsRef<Path>, contents: impl Into<String>) -> Self {
        self.files
            .insert(path.as_ref().to_path_buf(), contents.into());
        self
    }

    /// Add a `codeintel.json` project config.
    pub fn with_config(self, config: &str) -> Self {
        self.with_file("codeintel.json", config)
    }

    /// Add a `codeintel.jsonc` project config.
    pub fn with_jsonc_config(self, config: &str) -> Self {
        self.with_file("codeintel.jsonc", config)
    }

    /// Add a small Python package.
    pub fn with_python_package(self, name: &str) -> Self {
        self.with_file(format!("{name}/__init__.py"), "")
            .with_file(format!("{name}/core.py"), content::PYTHON_MODULE)
    }

    pub fn build(self) -> BuiltTestProject {
        let root = self.temp_dir.path();
        for (path, contents) in &self.files {
            let full_path = root.join(path);
            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent).unwrap_or_else(|e| {
                    panic!("Failed to create parent directory for {}: {}", full_path.display(), e)
                });
            }
            fs::write(&full_path, contents)
                .unwrap_or_else(|e| panic!("Failed to write file {}: {}", full_path.display(), e));
        }
        BuiltTestProject {
            temp_dir: self.temp_dir,
        }
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// A project written to disk. Removed when dropped.
pub struct BuiltTestProject {
    temp_dir: TempDir,
}

impl BuiltTestProject {
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of a project file, as a string.
    pub fn file(&self, path: impl AsRef<Path>) -> String {
        self.path().join(path).display().to_string()
    }

    pub fn read_file(&self, path: impl AsRef<Path>) -> String {
        let full_path = self.path().join(path.as_ref());
        fs::read_to_string(&full_path)
            .unwrap_or_else(|e| panic!("Failed to read file {}: {}", full_path.display(), e))
    }

    pub fn write_file(&self, path: impl AsRef<Path>, contents: impl AsRef<str>) {
        let full_path = self.path().join(path.as_ref());
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).ok();
        }
        fs::write(&full_path, contents.as_ref())
            .unwrap_or_else(|e| panic!("Failed to write file {}: {}", full_path.display(), e));
    }
}

/// Common test file contents.
pub mod content {
    pub const PYTHON_MODULE: &str = r#"import os


def join_all(base, *parts, sep="/"):
    return sep.join([base, *parts])


class Loader:
    def __init__(self, root):
        self.root = root
"#;

    pub const PHP_SCRIPT: &str = r#"<?php
$user = new User();
$user->
"#;
}
