pub mod mime;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Metadata for a file sitting in one of the flat storage directories.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Milliseconds since the Unix epoch.
    pub last_modified: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FileNameError {
    #[error("Filename is required")]
    Empty,
    #[error("Invalid filename")]
    Traversal,
}

/// Rejects anything that could leave the storage directory.
pub fn validate_file_name(name: &str) -> Result<&str, FileNameError> {
    if name.is_empty() {
        return Err(FileNameError::Empty);
    }
    if name.contains("..") || name.contains('/') || name.contains('\\') {
        return Err(FileNameError::Traversal);
    }
    Ok(name)
}

/// Reduces arbitrary text to something safe to embed in a file name:
/// whitespace runs become `_`, other punctuation is dropped.
pub fn sanitize_component(value: &str) -> String {
    let joined = value.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned: String = joined
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// `report.pdf` -> `report_1718000000000_1a2b3c4d.pdf`
pub fn unique_file_name(original: &str) -> String {
    let (stem, ext) = match original.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (original, None),
    };
    let suffix = &Uuid::new_v4().simple().to_string()[..8];
    let base = format!(
        "{}_{}_{}",
        sanitize_component(stem),
        Utc::now().timestamp_millis(),
        suffix
    );
    match ext.map(sanitize_component) {
        Some(ext) => format!("{}.{}", base, ext),
        None => base,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_file_size: u64,
    pub max_batch_size: u64,
}

impl UploadLimits {
    /// Checks a batch of `(name, size)` pairs before anything is written.
    pub fn check<'a>(&self, files: impl IntoIterator<Item = (&'a str, u64)>) -> Result<(), String> {
        let mut total = 0u64;
        for (name, size) in files {
            if size > self.max_file_size {
                return Err(format!(
                    "File {} is too large ({}). Maximum size is {}",
                    name,
                    format_size(size),
                    format_size(self.max_file_size)
                ));
            }
            total += size;
            if total > self.max_batch_size {
                return Err(format!(
                    "Upload too large: adding {} brings the total to {}. Maximum total size is {}",
                    name,
                    format_size(total),
                    format_size(self.max_batch_size)
                ));
            }
        }
        Ok(())
    }
}

fn format_size(bytes: u64) -> String {
    let mb = bytes as f64 / (1024.0 * 1024.0);
    if mb.fract() == 0.0 {
        format!("{}MB", mb as u64)
    } else {
        format!("{:.1}MB", mb)
    }
}

/// A single flat directory of files. The directory listing is the index.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> io::Result<PathBuf> {
        let name = validate_file_name(name)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        Ok(self.root.join(name))
    }

    pub async fn root_exists(&self) -> bool {
        tokio::fs::metadata(&self.root)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
    }

    pub async fn exists(&self, name: &str) -> bool {
        match self.path_for(name) {
            Ok(path) => tokio::fs::metadata(path)
                .await
                .map(|meta| meta.is_file())
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    pub async fn save(&self, name: &str, bytes: &[u8]) -> io::Result<StoredFile> {
        let path = self.path_for(name)?;
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(&path, bytes).await?;
        let meta = tokio::fs::metadata(&path).await?;
        Ok(stored_file(name, &meta))
    }

    pub async fn read(&self, name: &str) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.path_for(name)?).await
    }

    /// Regular files in the directory, sorted by name. A missing directory
    /// simply has nothing in it.
    pub async fn list(&self) -> io::Result<Vec<StoredFile>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            files.push(stored_file(&name, &meta));
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    /// Names of files with the given extension, sorted.
    pub async fn list_names_with_extension(&self, ext: &str) -> io::Result<Vec<String>> {
        let suffix = format!(".{}", ext);
        Ok(self
            .list()
            .await?
            .into_iter()
            .map(|file| file.name)
            .filter(|name| name.ends_with(&suffix))
            .collect())
    }
}

fn stored_file(name: &str, meta: &std::fs::Metadata) -> StoredFile {
    let last_modified = meta
        .modified()
        .map(|time| DateTime::<Utc>::from(time).timestamp_millis())
        .unwrap_or(0);
    StoredFile {
        name: name.to_string(),
        original_name: None,
        size: meta.len(),
        mime_type: mime::mime_for_name(name).to_string(),
        last_modified,
    }
}
