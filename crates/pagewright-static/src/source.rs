//! Content enumeration.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use walkdir::WalkDir;

use crate::builder::BuildError;

/// One raw content file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentUnit {
    /// Path relative to the content root, `/`-separated
    pub relative_path: String,

    /// Extension without the dot
    pub extension: String,

    pub raw: Vec<u8>,

    pub last_modified: DateTime<Utc>,
}

/// Something that yields content units.
pub trait ContentSource {
    fn units(&self) -> Result<Vec<ContentUnit>, BuildError>;
}

/// Content files under a directory, filtered by extension.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    extensions: Vec<String>,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>, extensions: &[String]) -> Self {
        Self {
            root: root.into(),
            extensions: extensions.iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    fn accepts(&self, path: &Path) -> Option<String> {
        let ext = path.extension().and_then(|e| e.to_str())?.to_lowercase();
        self.extensions.contains(&ext).then_some(ext)
    }
}

impl ContentSource for DirectorySource {
    /// Units in file-name order, so repeated runs see the same sequence.
    fn units(&self) -> Result<Vec<ContentUnit>, BuildError> {
        if !self.root.is_dir() {
            return Err(BuildError::ContentDirNotFound(self.root.clone()));
        }

        let mut units = Vec::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
        {
            let entry = entry.map_err(|e| BuildError::ReadError {
                path: e.path().map_or_else(|| self.root.clone(), Path::to_path_buf),
                message: e.to_string(),
            })?;
            let path = entry.path();

            if !entry.file_type().is_file() {
                continue;
            }

            let Some(extension) = self.accepts(path) else {
                continue;
            };

            let raw = fs::read(path).map_err(|e| BuildError::ReadError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

            let last_modified = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(Utc::now);

            let relative_path = path
                .strip_prefix(&self.root)
                .unwrap_or(path)
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            units.push(ContentUnit {
                relative_path,
                extension,
                raw,
                last_modified,
            });
        }

        tracing::debug!("Found {} content files in {}", units.len(), self.root.display());

        Ok(units)
    }
}
