//! Discovery of experiment folders and tagged raw exports.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use regex::Regex;
use thiserror::Error;

use crate::core::Category;

/// Errors that can occur while scanning the batch tree.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Directory not found: {0}")]
    MissingRoot(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to list directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// One immediate subdirectory of the batch root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionFolder {
    /// Folder name, used to look up its condition and in plot titles.
    pub name: String,
    /// Full path of the folder.
    pub path: PathBuf,
}

/// Filename matcher for one category.
///
/// A raw export matches when its name contains the category tag (case
/// sensitive) and ends in `.txt`. Hidden files are never matched.
#[derive(Debug, Clone)]
pub struct CategoryMatcher {
    category: Category,
    pattern: Regex,
}

impl CategoryMatcher {
    pub fn new(category: Category) -> Self {
        let pattern = Regex::new(&format!(r"{}.*\.txt$", regex::escape(category.tag())))
            .expect("category pattern is a valid regex");
        Self { category, pattern }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Whether a file name belongs to this category.
    pub fn matches(&self, file_name: &str) -> bool {
        !file_name.starts_with('.') && self.pattern.is_match(file_name)
    }
}

fn ensure_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(DiscoveryError::MissingRoot(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(DiscoveryError::NotADirectory(path.to_path_buf()));
    }
    Ok(())
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let read_dir = fs::read_dir(dir).map_err(|e| DiscoveryError::ReadDir {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut entries = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| DiscoveryError::ReadDir {
            path: dir.to_path_buf(),
            source: e,
        })?;
        entries.push(entry.path());
    }

    entries.sort();
    Ok(entries)
}

/// List the experiment folders under `root`, sorted by name.
///
/// # Errors
///
/// Returns an error if `root` does not exist, is not a directory, or
/// cannot be listed.
pub fn find_condition_folders(root: &Path) -> Result<Vec<ConditionFolder>> {
    ensure_directory(root)?;

    let folders = sorted_entries(root)?
        .into_iter()
        .filter(|path| path.is_dir())
        .filter_map(|path| {
            let name = path.file_name()?.to_string_lossy().into_owned();
            Some(ConditionFolder { name, path })
        })
        .collect();

    Ok(folders)
}

/// List the raw exports of one category inside `folder`, sorted by name.
pub fn find_category_files(folder: &Path, matcher: &CategoryMatcher) -> Result<Vec<PathBuf>> {
    ensure_directory(folder)?;

    let files: Vec<PathBuf> = sorted_entries(folder)?
        .into_iter()
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .map(|name| matcher.matches(&name.to_string_lossy()))
                .unwrap_or(false)
        })
        .collect();

    debug!(
        "Found {} {} file(s) in {}",
        files.len(),
        matcher.category(),
        folder.display()
    );

    Ok(files)
}

/// Identity of a raw export in the master tables: its name without `.txt`.
pub fn file_identity(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.strip_suffix(".txt") {
        Some(stem) => stem.to_string(),
        None => name,
    }
}
