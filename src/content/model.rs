//! Article and Bureau models

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::MarkdownRenderer;
use crate::error::{ValidationError, ValidationKind};

pub const ARTICLE_TITLE_MAX: usize = 255;
pub const BUREAU_NAME_MAX: usize = 10;
pub const BUREAU_SLUG_MAX: usize = 50;

lazy_static! {
    static ref SLUG_RE: Regex = Regex::new(r"^[-a-zA-Z0-9_]+$").unwrap();
}

/// Anything with a markdown body that can be shown as HTML
pub trait RenderContent {
    /// Raw markdown as authored
    fn markdown(&self) -> &str;

    /// Sanitized HTML for the markdown body
    fn render_content(&self) -> String {
        MarkdownRenderer::new().render(self.markdown())
    }
}

/// A news article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: u64,
    pub title: String,
    pub content_with_markdown: String,
    /// Visible to the public when true
    pub is_published: bool,
    /// Owning bureau, cleared when that bureau is deleted
    pub bureau: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RenderContent for Article {
    fn markdown(&self) -> &str {
        &self.content_with_markdown
    }
}

/// A government bureau page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bureau {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub content_with_markdown: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RenderContent for Bureau {
    fn markdown(&self) -> &str {
        &self.content_with_markdown
    }
}

/// Author-supplied fields of an article, before the store assigns id and timestamps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleDraft {
    pub title: String,
    pub content_with_markdown: String,
    pub is_published: bool,
    pub bureau: Option<u64>,
}

impl ArticleDraft {
    pub fn new(title: impl Into<String>, content_with_markdown: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content_with_markdown: content_with_markdown.into(),
            ..Default::default()
        }
    }

    pub fn published(mut self, is_published: bool) -> Self {
        self.is_published = is_published;
        self
    }

    pub fn in_bureau(mut self, bureau: Option<u64>) -> Self {
        self.bureau = bureau;
        self
    }

    /// Field checks that need no other records
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("title", &self.title)?;
        max_chars("title", &self.title, ARTICLE_TITLE_MAX)?;
        require("content_with_markdown", &self.content_with_markdown)?;
        Ok(())
    }
}

impl From<&Article> for ArticleDraft {
    fn from(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            content_with_markdown: article.content_with_markdown.clone(),
            is_published: article.is_published,
            bureau: article.bureau,
        }
    }
}

/// Author-supplied fields of a bureau
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BureauDraft {
    pub name: String,
    pub slug: String,
    pub content_with_markdown: String,
}

impl BureauDraft {
    pub fn new(
        name: impl Into<String>,
        slug: impl Into<String>,
        content_with_markdown: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            content_with_markdown: content_with_markdown.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        max_chars("name", &self.name, BUREAU_NAME_MAX)?;
        require("slug", &self.slug)?;
        max_chars("slug", &self.slug, BUREAU_SLUG_MAX)?;
        if !SLUG_RE.is_match(&self.slug) {
            return Err(ValidationError::new("slug", ValidationKind::InvalidSlug));
        }
        require("content_with_markdown", &self.content_with_markdown)?;
        Ok(())
    }
}

impl From<&Bureau> for BureauDraft {
    fn from(bureau: &Bureau) -> Self {
        Self {
            name: bureau.name.clone(),
            slug: bureau.slug.clone(),
            content_with_markdown: bureau.content_with_markdown.clone(),
        }
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new(field, ValidationKind::Required))
    } else {
        Ok(())
    }
}

fn max_chars(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        Err(ValidationError::new(field, ValidationKind::TooLong { max }))
    } else {
        Ok(())
    }
}
