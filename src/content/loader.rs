//! Content loader - imports articles and bureaus from markdown files
//!
//! Layout under the content directory:
//!
//! ```text
//! content/
//!   bureaus/*.md    name, slug
//!   articles/*.md   title, published, bureau (slug)
//! ```

use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{ArticleDraft, BureauDraft, FrontMatter};
use crate::store::ContentStore;

/// An article read from disk, before its bureau slug is resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceArticle {
    pub source: PathBuf,
    pub title: String,
    pub content_with_markdown: String,
    pub is_published: bool,
    pub bureau_slug: Option<String>,
}

/// What an import did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub bureaus_created: usize,
    pub bureaus_updated: usize,
    pub articles_created: usize,
    pub articles_updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

/// Loads content from the content directory
pub struct ContentLoader {
    content_dir: PathBuf,
}

impl ContentLoader {
    pub fn new<P: Into<PathBuf>>(content_dir: P) -> Self {
        Self {
            content_dir: content_dir.into(),
        }
    }

    /// Load all bureaus from content/bureaus
    pub fn load_bureaus(&self) -> Result<Vec<BureauDraft>> {
        let mut bureaus = Vec::new();
        for path in markdown_files(&self.content_dir.join("bureaus")) {
            match load_bureau(&path) {
                Ok(bureau) => bureaus.push(bureau),
                Err(e) => tracing::warn!("Failed to load bureau {:?}: {}", path, e),
            }
        }
        Ok(bureaus)
    }

    /// Load all articles from content/articles
    pub fn load_articles(&self) -> Result<Vec<SourceArticle>> {
        let mut articles = Vec::new();
        for path in markdown_files(&self.content_dir.join("articles")) {
            match load_article(&path) {
                Ok(article) => articles.push(article),
                Err(e) => tracing::warn!("Failed to load article {:?}: {}", path, e),
            }
        }
        Ok(articles)
    }

    /// Write everything under the content directory into the store.
    ///
    /// Bureaus are matched by slug and articles by title; records whose
    /// fields already match are left alone so their update time is kept.
    pub fn import(&self, store: &ContentStore) -> Result<ImportReport> {
        let mut report = ImportReport::default();

        for draft in self.load_bureaus()? {
            let existing = store.get_bureau_by_slug(&draft.slug);
            let result = match existing {
                Some(bureau) if BureauDraft::from(&bureau) == draft => {
                    report.unchanged += 1;
                    continue;
                }
                Some(bureau) => store
                    .update_bureau(bureau.id, draft.clone())
                    .map(|_| report.bureaus_updated += 1),
                None => store
                    .create_bureau(draft.clone())
                    .map(|_| report.bureaus_created += 1),
            };
            if let Err(e) = result {
                tracing::warn!("Skipping bureau {:?}: {}", draft.slug, e);
                report.skipped += 1;
            }
        }

        let bureau_ids: HashMap<String, u64> = store
            .bureaus()
            .into_iter()
            .map(|b| (b.slug, b.id))
            .collect();
        let mut by_title: HashMap<String, u64> = store
            .articles()
            .into_iter()
            .map(|a| (a.title, a.id))
            .collect();

        for source in self.load_articles()? {
            let bureau = match &source.bureau_slug {
                Some(slug) => match bureau_ids.get(slug) {
                    Some(id) => Some(*id),
                    None => {
                        tracing::warn!(
                            "Skipping {:?}: unknown bureau {:?}",
                            source.source,
                            slug
                        );
                        report.skipped += 1;
                        continue;
                    }
                },
                None => None,
            };
            let draft = ArticleDraft::new(source.title.clone(), source.content_with_markdown)
                .published(source.is_published)
                .in_bureau(bureau);

            let existing = by_title
                .get(&source.title)
                .and_then(|id| store.get_article(*id));
            let result = match existing {
                Some(article) if ArticleDraft::from(&article) == draft => {
                    report.unchanged += 1;
                    continue;
                }
                Some(article) => store
                    .update_article(article.id, draft)
                    .map(|_| report.articles_updated += 1),
                None => store.create_article(draft).map(|article| {
                    by_title.insert(article.title, article.id);
                    report.articles_created += 1;
                }),
            };
            if let Err(e) = result {
                tracing::warn!("Skipping {:?}: {}", source.source, e);
                report.skipped += 1;
            }
        }

        tracing::info!(
            "Imported {} bureaus and {} articles ({} unchanged, {} skipped)",
            report.bureaus_created + report.bureaus_updated,
            report.articles_created + report.articles_updated,
            report.unchanged,
            report.skipped
        );
        Ok(report)
    }
}

fn load_bureau(path: &Path) -> Result<BureauDraft> {
    let content = fs::read_to_string(path)?;
    let (fm, body) = FrontMatter::parse(&content)?;
    let stem = file_stem(path);
    let name = fm.name.or(fm.title).unwrap_or_else(|| stem.clone());
    let slug = fm.slug.unwrap_or_else(|| slug::slugify(&stem));
    Ok(BureauDraft::new(name, slug, body.trim_end()))
}

fn load_article(path: &Path) -> Result<SourceArticle> {
    let content = fs::read_to_string(path)?;
    let (fm, body) = FrontMatter::parse(&content)?;
    Ok(SourceArticle {
        source: path.to_path_buf(),
        title: fm.title.unwrap_or_else(|| file_stem(path)),
        content_with_markdown: body.trim_end().to_string(),
        is_published: fm.published,
        bureau_slug: fm.bureau,
    })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .to_string()
}

/// Markdown files under `dir`, in file-name order
fn markdown_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        return Vec::new();
    }
    WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && is_markdown_file(p))
        .collect()
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_lowercase().as_str(), "md" | "markdown"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ManualClock;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn sample_content() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "bureaus/finance.md",
            "---\nname: 財務局\nslug: finance\n---\n財務を担当します。\n",
        );
        write(dir.path(), "bureaus/Foreign Affairs.md", "外交を担当します。\n");
        write(
            dir.path(),
            "articles/budget.md",
            "---\ntitle: 予算案\npublished: true\nbureau: finance\n---\n## 概要\n",
        );
        write(dir.path(), "articles/draft.md", "---\ntitle: 下書き記事\n---\n準備中\n");
        write(
            dir.path(),
            "articles/orphan.md",
            "---\ntitle: 迷子\nbureau: nowhere\n---\n本文\n",
        );
        write(dir.path(), "articles/empty.md", "---\ntitle: 空\n---\n");
        write(dir.path(), "articles/notes.txt", "not markdown");
        dir
    }

    fn store() -> ContentStore {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2023, 2, 1, 0, 0, 0).unwrap(),
        ));
        ContentStore::in_memory(clock)
    }

    #[test]
    fn test_load_bureaus() {
        let dir = sample_content();
        let bureaus = ContentLoader::new(dir.path()).load_bureaus().unwrap();
        assert_eq!(bureaus.len(), 2);
        let foreign = bureaus.iter().find(|b| b.slug == "foreign-affairs").unwrap();
        assert_eq!(foreign.name, "Foreign Affairs");
    }

    #[test]
    fn test_import() {
        let dir = sample_content();
        let store = store();
        let report = ContentLoader::new(dir.path()).import(&store).unwrap();

        assert_eq!(report.bureaus_created, 1);
        // "Foreign Affairs" is longer than a bureau name may be
        assert_eq!(report.articles_created, 2);
        assert_eq!(report.skipped, 3);
        assert_eq!(store.bureau_count(), 1);

        let finance = store.get_bureau_by_slug("finance").unwrap();
        let budget = store
            .articles()
            .into_iter()
            .find(|a| a.title == "予算案")
            .unwrap();
        assert!(budget.is_published);
        assert_eq!(budget.bureau, Some(finance.id));
        assert_eq!(budget.content_with_markdown, "## 概要");

        let draft = store
            .articles()
            .into_iter()
            .find(|a| a.title == "下書き記事")
            .unwrap();
        assert!(!draft.is_published);
    }

    #[test]
    fn test_reimport_is_stable() {
        let dir = sample_content();
        let store = store();
        let loader = ContentLoader::new(dir.path());
        loader.import(&store).unwrap();
        let before = store.articles();

        let report = loader.import(&store).unwrap();
        assert_eq!(report.articles_created, 0);
        assert_eq!(report.articles_updated, 0);
        assert_eq!(report.unchanged, 3);
        assert_eq!(store.articles(), before);

        write(
            dir.path(),
            "articles/draft.md",
            "---\ntitle: 下書き記事\npublished: true\n---\n完成\n",
        );
        let report = loader.import(&store).unwrap();
        assert_eq!(report.articles_updated, 1);
        assert_eq!(store.article_count(), 2);
    }

    #[test]
    fn test_missing_content_dir() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ContentLoader::new(dir.path().join("missing"));
        assert!(loader.load_articles().unwrap().is_empty());
        assert_eq!(loader.import(&store()).unwrap(), ImportReport::default());
    }
}
