//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

const CONFIG: &str = r#"# Site
title: ほしのなか政府
description: ほしのなか政府の公式サイトです。
author: Hoshinonaka/Snak
copyright: ©️ 2023 Hoshinonaka/Snak
timezone: Asia/Tokyo
datetime_format: YYYY/MM/DD HH:mm

# URL
root: /

# Directory
content_dir: content
static_dir: static
data_file: data/store.json

# Home page
latest_articles: 5

# Server
ip: 127.0.0.1
port: 8000
# Requests carrying one of these in X-Staff-Token (or as a Bearer token)
# can read drafts.
staff_tokens: []
"#;

const SAMPLE_BUREAU: &str = r#"---
name: 総務局
slug: general-affairs
---

政府の庶務を担当します。
"#;

const SAMPLE_ARTICLE: &str = r#"---
title: サイトを公開しました
published: true
bureau: general-affairs
---

## お知らせ

ほしのなか政府の公式サイトを公開しました。
"#;

const STYLESHEET: &str = r#"body { margin: 0; font-family: sans-serif; }
header, footer { display: flex; align-items: center; padding: 0.5rem 1rem; }
nav .navItem { margin-left: 1rem; }
main { max-width: 48rem; margin: 0 auto; padding: 1rem; }
.draftMark { color: #c00; font-weight: bold; }
"#;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir.join("content/articles"))?;
    fs::create_dir_all(target_dir.join("content/bureaus"))?;
    fs::create_dir_all(target_dir.join("static"))?;
    fs::create_dir_all(target_dir.join("data"))?;

    write_new(&target_dir.join("_config.yml"), CONFIG)?;
    write_new(
        &target_dir.join("content/bureaus/general-affairs.md"),
        SAMPLE_BUREAU,
    )?;
    write_new(&target_dir.join("content/articles/hello.md"), SAMPLE_ARTICLE)?;
    write_new(&target_dir.join("static/style.css"), STYLESHEET)?;

    Ok(())
}

/// Write a file unless it is already there
fn write_new(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        tracing::info!("Keeping existing {:?}", path);
        return Ok(());
    }
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Site;

    #[test]
    fn test_init_site_is_importable() {
        let dir = tempfile::tempdir().unwrap();
        init_site(dir.path()).unwrap();

        let site = Site::new(dir.path()).unwrap();
        assert_eq!(site.config.title, "ほしのなか政府");
        assert!(site.static_dir.join("style.css").exists());

        let report = site.import().unwrap();
        assert_eq!(report.bureaus_created, 1);
        assert_eq!(report.articles_created, 1);
        assert_eq!(report.skipped, 0);
    }

    #[test]
    fn test_init_keeps_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("_config.yml"), "title: 別のサイト\n").unwrap();
        init_site(dir.path()).unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert_eq!(site.config.title, "別のサイト");
    }
}
