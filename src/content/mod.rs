//! Content module - articles, bureaus, and markdown rendering

mod frontmatter;
pub mod loader;
mod markdown;
mod model;

pub use frontmatter::FrontMatter;
pub use markdown::{Allowlist, MarkdownRenderer, MARKDOWN_ALLOWLIST};
pub use model::{
    Article, ArticleDraft, Bureau, BureauDraft, RenderContent, ARTICLE_TITLE_MAX,
    BUREAU_NAME_MAX, BUREAU_SLUG_MAX,
};
