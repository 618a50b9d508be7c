//! Site templates using the Tera template engine
//!
//! All page templates are embedded directly in the binary.

mod pages;

pub use pages::{ArticleData, BureauData, BureauLink, Pages, SiteData};

use anyhow::Result;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::helpers;

/// Template renderer with the embedded site templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all site templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Tera's own escaping also rewrites '/', which breaks hrefs. Text
        // fields go through the `text` filter instead and rendered markdown
        // is already sanitized.
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("index.html", include_str!("site/index.html")),
            ("list.html", include_str!("site/list.html")),
            ("detail.html", include_str!("site/detail.html")),
            ("bureaus.html", include_str!("site/bureaus.html")),
            ("bureau.html", include_str!("site/bureau.html")),
            ("not_found.html", include_str!("site/not_found.html")),
        ])?;

        tera.register_filter("text", text_filter);
        tera.register_filter("strip_html", strip_html_filter);
        tera.register_filter("truncate_chars", truncate_chars_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: escape text for HTML
fn text_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = match value {
        tera::Value::String(s) => s.clone(),
        tera::Value::Null => String::new(),
        other => other.to_string(),
    };
    Ok(tera::Value::String(helpers::html_escape(&s)))
}

/// Tera filter: strip HTML tags
fn strip_html_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    Ok(tera::Value::String(helpers::strip_html(&s)))
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 120,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "…".to_string(),
    };
    Ok(tera::Value::String(helpers::truncate(
        &s,
        length,
        Some(&omission),
    )))
}
