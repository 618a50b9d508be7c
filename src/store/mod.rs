//! Content store
//!
//! Holds articles and bureaus in memory and optionally mirrors them to a JSON
//! snapshot on disk. Every write is applied to a copy of the data, validated,
//! persisted, and only then swapped in, so a rejected write leaves the stored
//! state exactly as it was.

mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use crate::content::{Article, ArticleDraft, Bureau, BureauDraft};
use crate::error::{Error, Result, ValidationError, ValidationKind};

/// Snapshot of everything the store holds
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreData {
    version: u32,
    next_article_id: u64,
    next_bureau_id: u64,
    articles: BTreeMap<u64, Article>,
    bureaus: BTreeMap<u64, Bureau>,
}

impl StoreData {
    /// Current snapshot format version
    const VERSION: u32 = 1;

    fn ensure_bureau(&self, bureau: Option<u64>) -> Result<(), ValidationError> {
        match bureau {
            Some(id) if !self.bureaus.contains_key(&id) => Err(ValidationError::new(
                "bureau",
                ValidationKind::UnknownBureau(id),
            )),
            _ => Ok(()),
        }
    }

    fn ensure_unique_slug(&self, slug: &str, except: Option<u64>) -> Result<(), ValidationError> {
        let taken = self
            .bureaus
            .values()
            .any(|b| b.slug == slug && Some(b.id) != except);
        if taken {
            Err(ValidationError::new("slug", ValidationKind::DuplicateSlug))
        } else {
            Ok(())
        }
    }
}

impl Default for StoreData {
    fn default() -> Self {
        Self {
            version: Self::VERSION,
            next_article_id: 1,
            next_bureau_id: 1,
            articles: BTreeMap::new(),
            bureaus: BTreeMap::new(),
        }
    }
}

/// Articles and bureaus with their write invariants
pub struct ContentStore {
    data: RwLock<StoreData>,
    clock: Arc<dyn Clock>,
    path: Option<PathBuf>,
}

impl ContentStore {
    /// A store that lives only as long as the process
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self {
            data: RwLock::new(StoreData::default()),
            clock,
            path: None,
        }
    }

    /// Open a JSON-backed store, loading the snapshot if the file exists
    pub fn open<P: AsRef<Path>>(path: P, clock: Arc<dyn Clock>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = if path.exists() {
            let content = fs::read_to_string(&path)?;
            let data: StoreData = serde_json::from_str(&content)?;
            if data.version != StoreData::VERSION {
                tracing::error!("Store {:?} has version {}", path, data.version);
                return Err(Error::UnsupportedVersion(data.version));
            }
            tracing::debug!(
                "Loaded {} articles and {} bureaus from {:?}",
                data.articles.len(),
                data.bureaus.len(),
                path
            );
            data
        } else {
            tracing::info!("No store at {:?}, starting empty", path);
            StoreData::default()
        };

        Ok(Self {
            data: RwLock::new(data),
            clock,
            path: Some(path),
        })
    }

    /// Backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreData> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a write against a copy of the data and commit it only on success
    fn transact<T>(&self, op: impl FnOnce(&mut StoreData, DateTime<Utc>) -> Result<T>) -> Result<T> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = guard.clone();
        let value = op(&mut next, self.clock.now())?;
        if let Some(path) = &self.path {
            save(path, &next)?;
        }
        *guard = next;
        Ok(value)
    }

    // Articles

    pub fn create_article(&self, draft: ArticleDraft) -> Result<Article> {
        draft.validate()?;
        let article = self.transact(|data, now| {
            data.ensure_bureau(draft.bureau)?;
            let id = data.next_article_id;
            data.next_article_id += 1;
            let article = Article {
                id,
                title: draft.title,
                content_with_markdown: draft.content_with_markdown,
                is_published: draft.is_published,
                bureau: draft.bureau,
                created_at: now,
                updated_at: now,
            };
            data.articles.insert(id, article.clone());
            Ok(article)
        })?;
        tracing::info!("Created article {} ({})", article.id, article.title);
        Ok(article)
    }

    /// Replace an article's fields, keeping its id and creation time
    pub fn update_article(&self, id: u64, draft: ArticleDraft) -> Result<Article> {
        draft.validate()?;
        let article = self.transact(|data, now| {
            data.ensure_bureau(draft.bureau)?;
            let article = data.articles.get_mut(&id).ok_or(Error::NotFound)?;
            article.title = draft.title;
            article.content_with_markdown = draft.content_with_markdown;
            article.is_published = draft.is_published;
            article.bureau = draft.bureau;
            article.updated_at = now.max(article.created_at);
            Ok(article.clone())
        })?;
        tracing::info!("Updated article {}", id);
        Ok(article)
    }

    pub fn delete_article(&self, id: u64) -> Result<Article> {
        let article = self.transact(|data, _| data.articles.remove(&id).ok_or(Error::NotFound))?;
        tracing::info!("Deleted article {}", id);
        Ok(article)
    }

    pub fn get_article(&self, id: u64) -> Option<Article> {
        self.read().articles.get(&id).cloned()
    }

    /// Every article regardless of publish state, by id
    pub fn articles(&self) -> Vec<Article> {
        self.read().articles.values().cloned().collect()
    }

    pub fn articles_in_bureau(&self, bureau: u64) -> Vec<Article> {
        self.read()
            .articles
            .values()
            .filter(|a| a.bureau == Some(bureau))
            .cloned()
            .collect()
    }

    pub fn article_count(&self) -> usize {
        self.read().articles.len()
    }

    // Bureaus

    pub fn create_bureau(&self, draft: BureauDraft) -> Result<Bureau> {
        draft.validate()?;
        let bureau = self.transact(|data, now| {
            data.ensure_unique_slug(&draft.slug, None)?;
            let id = data.next_bureau_id;
            data.next_bureau_id += 1;
            let bureau = Bureau {
                id,
                name: draft.name,
                slug: draft.slug,
                content_with_markdown: draft.content_with_markdown,
                created_at: now,
                updated_at: now,
            };
            data.bureaus.insert(id, bureau.clone());
            Ok(bureau)
        })?;
        tracing::info!("Created bureau {} ({})", bureau.id, bureau.slug);
        Ok(bureau)
    }

    pub fn update_bureau(&self, id: u64, draft: BureauDraft) -> Result<Bureau> {
        draft.validate()?;
        let bureau = self.transact(|data, now| {
            data.ensure_unique_slug(&draft.slug, Some(id))?;
            let bureau = data.bureaus.get_mut(&id).ok_or(Error::NotFound)?;
            bureau.name = draft.name;
            bureau.slug = draft.slug;
            bureau.content_with_markdown = draft.content_with_markdown;
            bureau.updated_at = now.max(bureau.created_at);
            Ok(bureau.clone())
        })?;
        tracing::info!("Updated bureau {}", id);
        Ok(bureau)
    }

    /// Remove a bureau; articles that referenced it keep existing without one
    pub fn delete_bureau(&self, id: u64) -> Result<Bureau> {
        let (bureau, detached) = self.transact(|data, _| {
            let bureau = data.bureaus.remove(&id).ok_or(Error::NotFound)?;
            let mut detached = 0;
            for article in data.articles.values_mut() {
                if article.bureau == Some(id) {
                    article.bureau = None;
                    detached += 1;
                }
            }
            Ok((bureau, detached))
        })?;
        tracing::info!("Deleted bureau {} ({} articles detached)", id, detached);
        Ok(bureau)
    }

    pub fn get_bureau(&self, id: u64) -> Option<Bureau> {
        self.read().bureaus.get(&id).cloned()
    }

    pub fn get_bureau_by_slug(&self, slug: &str) -> Option<Bureau> {
        self.read().bureaus.values().find(|b| b.slug == slug).cloned()
    }

    /// All bureaus, by id
    pub fn bureaus(&self) -> Vec<Bureau> {
        self.read().bureaus.values().cloned().collect()
    }

    pub fn bureau_count(&self) -> usize {
        self.read().bureaus.len()
    }
}

/// Write the snapshot next to its destination and move it into place
fn save(path: &Path, data: &StoreData) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("json.tmp");
    let content = serde_json::to_string_pretty(data)?;
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
