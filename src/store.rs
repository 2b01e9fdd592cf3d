//! Page storage.
//!
//! The bot reads its configuration, data and template pages and writes one
//! page per configuration. `FsPageStore` keeps pages as files under a root
//! directory, one file per title.

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Component, Path, PathBuf};
use tracing::info;
use wikidatable_core::{Error, Result};

#[async_trait]
pub trait PageStore: Send + Sync {
    /// Page content parsed as JSON.
    async fn load_json(&self, title: &str) -> Result<Value>;

    /// Raw page wikitext.
    async fn fetch_wikitext(&self, title: &str) -> Result<String>;

    /// Replace a page's content. Failures must be `Error::Write`.
    async fn edit(&self, title: &str, text: &str, summary: &str) -> Result<()>;
}

pub struct FsPageStore {
    root: PathBuf,
}

impl FsPageStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// File backing `title`. `/` in a title becomes a directory separator;
    /// titles that would escape the root are rejected.
    pub fn path_for(&self, title: &str) -> Result<PathBuf> {
        let relative = Path::new(title);
        let escapes = title.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(Error::invalid_page(title, "title does not map to a file below the page root"));
        }
        Ok(self.root.join(relative))
    }

    async fn read(&self, title: &str) -> Result<String> {
        let path = self.path_for(title)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::PageNotFound(title.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl PageStore for FsPageStore {
    async fn load_json(&self, title: &str) -> Result<Value> {
        let text = self.read(title).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn fetch_wikitext(&self, title: &str) -> Result<String> {
        self.read(title).await
    }

    async fn edit(&self, title: &str, text: &str, summary: &str) -> Result<()> {
        let path = self.path_for(title).map_err(|e| Error::write(title, e.to_string()))?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::write(title, e.to_string()))?;
        }
        tokio::fs::write(&path, text)
            .await
            .map_err(|e| Error::write(title, e.to_string()))?;
        info!("Edited {} ({}): {}", title, path.display(), summary);
        Ok(())
    }
}
