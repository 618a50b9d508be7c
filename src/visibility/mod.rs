//! Who may see which article
//!
//! Visitors only ever see published articles. Staff additionally see drafts
//! when they ask for one by id. A hidden article and a missing one produce
//! the same [`Error::NotFound`], so drafts are never revealed by probing ids.

use std::cmp::Ordering;

use crate::content::Article;
use crate::error::{Error, Result};
use crate::store::ContentStore;

/// Privilege level of whoever is asking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Requester {
    #[default]
    Visitor,
    Staff,
}

impl Requester {
    pub fn is_elevated(self) -> bool {
        matches!(self, Requester::Staff)
    }
}

/// Whether `requester` may see `article`
pub fn can_view(article: &Article, requester: Requester) -> bool {
    article.is_published || requester.is_elevated()
}

/// Fetch one article by id, treating hidden articles as missing
pub fn find_article(store: &ContentStore, id: u64, requester: Requester) -> Result<Article> {
    match store.get_article(id) {
        Some(article) if can_view(&article, requester) => Ok(article),
        Some(_) => {
            tracing::debug!("Article {} is a draft, hiding it from visitor", id);
            Err(Error::NotFound)
        }
        None => Err(Error::NotFound),
    }
}

/// Most recently updated first, newest id first on ties
pub fn newest_first(a: &Article, b: &Article) -> Ordering {
    b.updated_at
        .cmp(&a.updated_at)
        .then_with(|| b.id.cmp(&a.id))
}

/// Keep published articles only, in listing order
pub fn published<I>(articles: I) -> Vec<Article>
where
    I: IntoIterator<Item = Article>,
{
    let mut list: Vec<Article> = articles.into_iter().filter(|a| a.is_published).collect();
    list.sort_by(newest_first);
    list
}

/// Every published article, newest first
pub fn published_articles(store: &ContentStore) -> Vec<Article> {
    published(store.articles())
}

/// The `limit` most recently updated published articles
pub fn latest_articles(store: &ContentStore, limit: usize) -> Vec<Article> {
    let mut list = published_articles(store);
    list.truncate(limit);
    list
}

/// Published articles that belong to a bureau, newest first
pub fn bureau_articles(store: &ContentStore, bureau: u64) -> Vec<Article> {
    published(store.articles_in_bureau(bureau))
}
