use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::loading::error::LoadError;
use crate::loading::schema::{Column, is_header};

/// Source of persisted model files.
///
/// The loader only needs directory enumeration and line reading, so tests and
/// embedders can serve traces from memory instead of disk.
pub trait ContentReader: Send + Sync {
    /// Files directly inside `dir`, sorted by file name.
    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>, LoadError>;

    fn read_lines(&self, path: &Path) -> Result<Vec<String>, LoadError>;
}

/// `ContentReader` backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsContentReader;

impl ContentReader for FsContentReader {
    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| LoadError::io(dir, e))? {
            let entry = entry.map_err(|e| LoadError::io(dir, e))?;
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }
        // Sort by name for deterministic order
        files.sort();
        Ok(files)
    }

    fn read_lines(&self, path: &Path) -> Result<Vec<String>, LoadError> {
        let content = fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
        Ok(content.lines().map(str::to_string).collect())
    }
}

/// One split line of a trace or state file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// `path:line` for error messages
    pub location: String,
    pub fields: Vec<String>,
}

/// Split lines into rows, dropping blank lines.
///
/// Returns the header fields separately when the first non-blank line is a
/// header of `columns`.
pub fn split_rows(
    path: &Path,
    lines: &[String],
    sep: &str,
    columns: &[Column],
    renaming: &HashMap<String, String>,
) -> (Option<Vec<String>>, Vec<Row>) {
    let mut header = None;
    let mut rows = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<String> = line.split(sep).map(str::to_string).collect();

        if header.is_none() && rows.is_empty() && is_header(columns, &fields, renaming) {
            header = Some(fields);
            continue;
        }

        rows.push(Row {
            location: format!("{}:{}", path.display(), index + 1),
            fields,
        });
    }

    (header, rows)
}
