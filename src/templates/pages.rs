//! Page rendering: turns stored records into template contexts

use anyhow::Result;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tera::Context;

use super::TemplateRenderer;
use crate::config::SiteConfig;
use crate::content::{Article, Bureau, RenderContent};
use crate::helpers;

/// Site-wide values every page needs
#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub copyright: String,
    pub home: String,
    pub articles_url: String,
    pub bureaus_url: String,
    pub favicon: String,
    pub logo: String,
    pub stylesheet: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BureauLink {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArticleData {
    pub id: u64,
    pub title: String,
    pub url: String,
    /// Sanitized HTML
    pub content: String,
    pub is_published: bool,
    pub created_at: String,
    pub updated_at: String,
    pub updated_at_xml: String,
    pub bureau: Option<BureauLink>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BureauData {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub url: String,
    /// Sanitized HTML
    pub content: String,
    pub updated_at: String,
}

/// Renders each page of the site
pub struct Pages {
    renderer: TemplateRenderer,
    config: SiteConfig,
    tz: Tz,
}

impl Pages {
    pub fn new(config: SiteConfig) -> Result<Self> {
        let tz = config.tz()?;
        Ok(Self {
            renderer: TemplateRenderer::new()?,
            config,
            tz,
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    fn site(&self) -> SiteData {
        let config = &self.config;
        SiteData {
            title: config.title.clone(),
            copyright: config.copyright.clone(),
            home: helpers::url_for(config, ""),
            articles_url: helpers::articles_url(config),
            bureaus_url: helpers::bureaus_url(config),
            favicon: helpers::static_url(config, "favicon.ico"),
            logo: helpers::static_url(config, "logo.png"),
            stylesheet: helpers::static_url(config, "style.css"),
        }
    }

    fn local(&self, date: &DateTime<Utc>) -> String {
        helpers::local_date(date, self.tz, &self.config.datetime_format)
    }

    fn bureau_link(&self, bureau: &Bureau) -> BureauLink {
        BureauLink {
            name: bureau.name.clone(),
            url: helpers::bureau_url(&self.config, &bureau.slug),
        }
    }

    fn article_data(&self, article: &Article, bureaus: &[Bureau]) -> ArticleData {
        let bureau = article
            .bureau
            .and_then(|id| bureaus.iter().find(|b| b.id == id))
            .map(|b| self.bureau_link(b));
        ArticleData {
            id: article.id,
            title: article.title.clone(),
            url: helpers::article_url(&self.config, article.id),
            content: article.render_content(),
            is_published: article.is_published,
            created_at: self.local(&article.created_at),
            updated_at: self.local(&article.updated_at),
            updated_at_xml: helpers::date_xml(&article.updated_at.with_timezone(&self.tz)),
            bureau,
        }
    }

    fn bureau_data(&self, bureau: &Bureau) -> BureauData {
        BureauData {
            id: bureau.id,
            name: bureau.name.clone(),
            slug: bureau.slug.clone(),
            url: helpers::bureau_url(&self.config, &bureau.slug),
            content: bureau.render_content(),
            updated_at: self.local(&bureau.updated_at),
        }
    }

    /// Context shared by every page; `description` must already be HTML-safe
    fn context(&self, description: String) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site());
        context.insert("description", &description);
        context
    }

    fn default_description(&self) -> String {
        helpers::html_escape(&self.config.description)
    }

    /// Landing page
    pub fn index(&self, latest: &[Article], bureaus: &[Bureau]) -> Result<String> {
        let mut context = self.context(self.default_description());
        let new_articles: Vec<ArticleData> = latest
            .iter()
            .map(|a| self.article_data(a, bureaus))
            .collect();
        let bureaus: Vec<BureauData> = bureaus.iter().map(|b| self.bureau_data(b)).collect();
        context.insert("new_articles", &new_articles);
        context.insert("bureaus", &bureaus);
        self.renderer.render("index.html", &context)
    }

    pub fn article_list(&self, articles: &[Article], bureaus: &[Bureau]) -> Result<String> {
        let mut context = self.context(self.default_description());
        let articles: Vec<ArticleData> = articles
            .iter()
            .map(|a| self.article_data(a, bureaus))
            .collect();
        context.insert("articles", &articles);
        self.renderer.render("list.html", &context)
    }

    pub fn article_detail(&self, article: &Article, bureau: Option<&Bureau>) -> Result<String> {
        let bureaus: Vec<Bureau> = bureau.into_iter().cloned().collect();
        let data = self.article_data(article, &bureaus);
        let mut context = self.context(excerpt(&data.content));
        context.insert("article", &data);
        self.renderer.render("detail.html", &context)
    }

    pub fn bureau_list(&self, bureaus: &[Bureau]) -> Result<String> {
        let mut context = self.context(self.default_description());
        let bureaus: Vec<BureauData> = bureaus.iter().map(|b| self.bureau_data(b)).collect();
        context.insert("bureaus", &bureaus);
        self.renderer.render("bureaus.html", &context)
    }

    pub fn bureau_detail(&self, bureau: &Bureau, articles: &[Article]) -> Result<String> {
        let data = self.bureau_data(bureau);
        let mut context = self.context(excerpt(&data.content));
        let owner = std::slice::from_ref(bureau);
        let articles: Vec<ArticleData> = articles
            .iter()
            .map(|a| self.article_data(a, owner))
            .collect();
        context.insert("bureau", &data);
        context.insert("articles", &articles);
        self.renderer.render("bureau.html", &context)
    }

    pub fn not_found(&self) -> Result<String> {
        let context = self.context(self.default_description());
        self.renderer.render("not_found.html", &context)
    }
}

/// Meta description from sanitized HTML, safe inside a quoted attribute
fn excerpt(html: &str) -> String {
    let text = helpers::squash_whitespace(&helpers::strip_html(html));
    helpers::truncate(&text, 120, Some("…")).replace('"', "&quot;")
}
