// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document discovery and loading for the chunk command.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File extensions picked up when walking a directory.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["txt", "text", "md", "markdown"];

/// A raw document ready for chunking.
#[derive(Debug, Clone)]
pub struct Document {
    pub title: String,
    pub path: PathBuf,
    pub text: String,
}

/// Expands inputs into a sorted list of document paths.
///
/// Files are taken as given, whatever their extension; directories are
/// walked recursively for [`DOCUMENT_EXTENSIONS`]. Inputs that do not exist
/// are kept so that loading reports them per document.
pub fn collect_paths(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            paths.push(input.clone());
            continue;
        }

        let mut found: Vec<PathBuf> = WalkDir::new(input)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable directory entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && has_document_extension(entry.path()))
            .map(|entry| entry.into_path())
            .collect();
        found.sort();
        paths.extend(found);
    }
    paths
}

fn has_document_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| DOCUMENT_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Title derived from the file name without extension.
pub fn title_for(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Reads a UTF-8 document from disk.
pub fn load_document(path: &Path) -> Result<Document> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read document: {}", path.display()))?;
    Ok(Document {
        title: title_for(path),
        path: path.to_path_buf(),
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn walks_directories_for_text_files() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("b.md"), "B.").unwrap();
        std::fs::write(dir.path().join("a.txt"), "A.").unwrap();
        std::fs::write(dir.path().join("nested").join("c.MARKDOWN"), "C.").unwrap();
        std::fs::write(dir.path().join("image.png"), [0u8, 1, 2]).unwrap();

        let paths = collect_paths(&[dir.path().to_path_buf()]);
        let names: Vec<String> = paths.iter().map(|p| title_for(p)).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn explicit_files_and_missing_inputs_are_kept() {
        let dir = TempDir::new().unwrap();
        let notes = dir.path().join("notes.rst");
        std::fs::write(&notes, "Notes.").unwrap();
        let missing = dir.path().join("missing.txt");

        let paths = collect_paths(&[notes.clone(), missing.clone()]);
        assert_eq!(paths, vec![notes.clone(), missing.clone()]);

        assert_eq!(load_document(&notes).unwrap().title, "notes");
        assert!(load_document(&missing).is_err());
    }

    #[test]
    fn non_utf8_document_fails_to_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("binary.txt");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        assert!(load_document(&path).is_err());
    }
}
