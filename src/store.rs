//! Durable state: the item archive and the per-source watermark map.
//!
//! Both documents are read whole at the start of a cycle and rewritten whole
//! at the end. Writes are plain overwrites; a crash mid-write can truncate a
//! file, in which case the next load treats it as empty.

use crate::config::{ARCHIVE_FILE, WATERMARK_FILE};
use crate::models::{Archive, WatermarkMap};
use crate::utils::BoxError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct Store {
    archive_path: PathBuf,
    watermark_path: PathBuf,
}

impl Store {
    /// Store keeping both documents under `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let dir = data_dir.as_ref();
        Self {
            archive_path: dir.join(ARCHIVE_FILE),
            watermark_path: dir.join(WATERMARK_FILE),
        }
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    pub fn watermark_path(&self) -> &Path {
        &self.watermark_path
    }

    /// Create the data directory and seed `[]` / `{}` for missing files.
    /// Existing files are left untouched, even when corrupt.
    #[instrument(level = "debug", skip_all)]
    pub async fn ensure_files(&self) -> Result<(), BoxError> {
        for path in [&self.archive_path, &self.watermark_path] {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await?;
            }
        }
        seed_if_missing(&self.archive_path, "[]").await?;
        seed_if_missing(&self.watermark_path, "{}").await?;
        Ok(())
    }

    pub async fn load_archive(&self) -> Archive {
        load_or_default(&self.archive_path).await
    }

    pub async fn load_watermarks(&self) -> WatermarkMap {
        load_or_default(&self.watermark_path).await
    }

    pub async fn save_archive(&self, archive: &Archive) -> Result<(), BoxError> {
        save_json(&self.archive_path, archive).await
    }

    pub async fn save_watermarks(&self, marks: &WatermarkMap) -> Result<(), BoxError> {
        save_json(&self.watermark_path, marks).await
    }
}

async fn seed_if_missing(path: &Path, empty: &str) -> Result<(), BoxError> {
    if fs::try_exists(path).await? {
        return Ok(());
    }
    fs::write(path, empty).await?;
    info!(path = %path.display(), "Initialised state file");
    Ok(())
}

/// Read and parse a JSON document; unreadable or malformed files yield the default.
async fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "State file unreadable; starting empty");
            return T::default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "State file is not valid JSON; starting empty");
            T::default()
        }
    }
}

async fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), BoxError> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).await?;
    debug!(path = %path.display(), "Wrote state file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewsItem;
    use tempfile::TempDir;

    fn item(title: &str) -> NewsItem {
        NewsItem {
            title: title.to_string(),
            link: format!("https://example.com/{title}"),
            content: "body".to_string(),
            date: "2024-01-02T00:00:00Z".to_string(),
            source: "Acme Times".to_string(),
        }
    }

    #[tokio::test]
    async fn test_ensure_files_seeds_empty_documents() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("nested/data"));

        store.ensure_files().await.unwrap();

        assert_eq!(std::fs::read_to_string(store.archive_path()).unwrap(), "[]");
        assert_eq!(std::fs::read_to_string(store.watermark_path()).unwrap(), "{}");
        assert!(store.load_archive().await.is_empty());
        assert!(store.load_watermarks().await.is_empty());
    }

    #[tokio::test]
    async fn test_ensure_files_keeps_existing_state() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        store.ensure_files().await.unwrap();
        store.save_archive(&vec![item("a")]).await.unwrap();

        store.ensure_files().await.unwrap();

        assert_eq!(store.load_archive().await, vec![item("a")]);
    }

    #[tokio::test]
    async fn test_save_and_load_state() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        store.ensure_files().await.unwrap();

        let mut marks = WatermarkMap::new();
        marks.insert("Acme Times".into(), "2024-01-02T00:00:00Z".into());
        store.save_archive(&vec![item("a"), item("b")]).await.unwrap();
        store.save_watermarks(&marks).await.unwrap();

        let archive = store.load_archive().await;
        assert_eq!(archive.len(), 2);
        assert_eq!(archive[0].title, "a");
        assert_eq!(archive[1].title, "b");
        assert_eq!(store.load_watermarks().await, marks);
    }

    #[tokio::test]
    async fn test_pretty_printed_with_two_space_indent() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        store.ensure_files().await.unwrap();
        store.save_archive(&vec![item("a")]).await.unwrap();

        let raw = std::fs::read_to_string(store.archive_path()).unwrap();
        assert!(raw.starts_with("[\n  {\n    \"title\": \"a\""));
    }

    #[tokio::test]
    async fn test_corrupt_files_load_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        std::fs::write(store.archive_path(), "[{\"title\": ").unwrap();
        std::fs::write(store.watermark_path(), "not json").unwrap();

        assert!(store.load_archive().await.is_empty());
        assert!(store.load_watermarks().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_files_load_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("absent"));

        assert!(store.load_archive().await.is_empty());
        assert!(store.load_watermarks().await.is_empty());
    }
}
