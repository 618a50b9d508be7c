//! hoshinonaka: the Hoshinonaka government website
//!
//! Articles and bureaus are kept in a small JSON-backed store and served as
//! HTML pages. Drafts are only visible to staff.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod helpers;
pub mod server;
pub mod store;
pub mod templates;
pub mod visibility;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

/// A site rooted at a directory
#[derive(Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: std::path::PathBuf,
    /// Markdown sources for `import`
    pub content_dir: std::path::PathBuf,
    /// Files served under /static
    pub static_dir: std::path::PathBuf,
    /// JSON snapshot of the store
    pub data_file: std::path::PathBuf,
}

impl Site {
    /// Create a site from a directory, reading `_config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        let content_dir = base_dir.join(&config.content_dir);
        let static_dir = base_dir.join(&config.static_dir);
        let data_file = base_dir.join(&config.data_file);

        Ok(Self {
            config,
            base_dir,
            content_dir,
            static_dir,
            data_file,
        })
    }

    /// Open the content store backing this site
    pub fn open_store(&self) -> Result<store::ContentStore> {
        store::ContentStore::open(&self.data_file, Arc::new(store::SystemClock))
            .with_context(|| format!("opening store {:?}", self.data_file))
    }

    /// Import markdown content into the store
    pub fn import(&self) -> Result<content::loader::ImportReport> {
        commands::import::run(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert_eq!(site.content_dir, dir.path().join("content"));
        assert_eq!(site.static_dir, dir.path().join("static"));
        assert_eq!(site.data_file, dir.path().join("data/store.json"));

        let store = site.open_store().unwrap();
        assert_eq!(store.article_count(), 0);
    }

    #[test]
    fn test_site_reads_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("_config.yml"),
            "content_dir: posts\ndata_file: db.json\n",
        )
        .unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert_eq!(site.content_dir, dir.path().join("posts"));
        assert_eq!(site.data_file, dir.path().join("db.json"));
    }
}
