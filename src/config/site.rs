//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,
    pub copyright: String,
    /// IANA zone used when showing timestamps
    pub timezone: String,
    /// Moment.js-style format for displayed timestamps
    pub datetime_format: String,

    // URL
    pub root: String,

    // Directory
    pub content_dir: String,
    pub static_dir: String,
    pub data_file: String,

    // Home page
    pub latest_articles: usize,

    // Server
    pub ip: String,
    pub port: u16,
    /// Shared secrets that unlock draft preview
    #[serde(default)]
    pub staff_tokens: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "ほしのなか政府".to_string(),
            description: "ほしのなか政府の公式サイトです。".to_string(),
            author: "Hoshinonaka/Snak".to_string(),
            copyright: "©️ 2023 Hoshinonaka/Snak".to_string(),
            timezone: "Asia/Tokyo".to_string(),
            datetime_format: "YYYY/MM/DD HH:mm".to_string(),

            root: "/".to_string(),

            content_dir: "content".to_string(),
            static_dir: "static".to_string(),
            data_file: "data/store.json".to_string(),

            latest_articles: 5,

            ip: "127.0.0.1".to_string(),
            port: 8000,
            staff_tokens: Vec::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("reading {:?}", path.as_ref()))?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        config.tz()?;
        Ok(config)
    }

    /// Parsed display timezone
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("invalid timezone {:?}: {}", self.timezone, e))
    }

    /// Whether `token` is one of the configured staff tokens
    pub fn is_staff_token(&self, token: &str) -> bool {
        !token.is_empty() && self.staff_tokens.iter().any(|t| t == token)
    }
}
