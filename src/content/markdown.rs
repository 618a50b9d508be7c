//! Markdown rendering with allowlist sanitization

use pulldown_cmark::{html, Options, Parser};
use std::collections::{HashMap, HashSet};

/// Tags and attributes that survive sanitization
#[derive(Debug, Clone, Copy)]
pub struct Allowlist {
    pub tags: &'static [&'static str],
    /// Attributes permitted on every allowed tag
    pub generic_attributes: &'static [&'static str],
    pub tag_attributes: &'static [(&'static str, &'static [&'static str])],
}

/// Markdown-produced structural tags plus table tags.
pub const MARKDOWN_ALLOWLIST: Allowlist = Allowlist {
    tags: &[
        "a",
        "abbr",
        "acronym",
        "b",
        "blockquote",
        "br",
        "code",
        "dd",
        "del",
        "div",
        "dl",
        "dt",
        "em",
        "h1",
        "h2",
        "h3",
        "h4",
        "h5",
        "h6",
        "hr",
        "i",
        "img",
        "li",
        "ol",
        "p",
        "pre",
        "span",
        "strong",
        "sub",
        "sup",
        "tt",
        "ul",
        "table",
        "thead",
        "tbody",
        "tr",
        "th",
        "td",
    ],
    generic_attributes: &["class", "id"],
    tag_attributes: &[
        ("a", &["href", "alt", "title"]),
        ("img", &["src", "alt", "title", "width", "height"]),
    ],
};

impl Allowlist {
    /// Sanitize an HTML fragment, keeping only what this allowlist permits.
    ///
    /// `script` and `style` elements are dropped together with their content.
    /// Allowed markup is kept as written; no `rel` is added to links.
    pub fn clean(&self, html: &str) -> String {
        let tags: HashSet<&str> = self.tags.iter().copied().collect();
        let generic: HashSet<&str> = self.generic_attributes.iter().copied().collect();
        let per_tag: HashMap<&str, HashSet<&str>> = self
            .tag_attributes
            .iter()
            .map(|(tag, attrs)| (*tag, attrs.iter().copied().collect()))
            .collect();

        ammonia::Builder::default()
            .tags(tags)
            .generic_attributes(generic)
            .tag_attributes(per_tag)
            .link_rel(None)
            .clean(html)
            .to_string()
    }
}

/// Converts author markdown into HTML that can be embedded without escaping
#[derive(Debug, Clone, Copy)]
pub struct MarkdownRenderer {
    allowlist: &'static Allowlist,
}

impl MarkdownRenderer {
    /// Create a renderer using the standard markdown allowlist
    pub fn new() -> Self {
        Self::with_allowlist(&MARKDOWN_ALLOWLIST)
    }

    pub fn with_allowlist(allowlist: &'static Allowlist) -> Self {
        Self { allowlist }
    }

    /// Render markdown to sanitized HTML.
    ///
    /// Never fails: input that is not valid markdown comes out as text.
    ///
    /// Rendering the output again gives the same HTML, except for a code
    /// block with blank lines nested in a container: the blank line ends the
    /// raw HTML block on the second pass.
    pub fn render(&self, markdown: &str) -> String {
        let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
        let parser = Parser::new_ext(markdown, options);

        let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut html_output, parser);

        self.allowlist.clean(&html_output).trim().to_string()
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}
