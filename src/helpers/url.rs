//! URL helper functions

use crate::config::SiteConfig;

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/static/logo.png") // -> "/gov/static/logo.png"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let root = config.root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

pub fn articles_url(config: &SiteConfig) -> String {
    url_for(config, "articles/")
}

pub fn article_url(config: &SiteConfig, id: u64) -> String {
    url_for(config, &format!("articles/{}", id))
}

pub fn bureaus_url(config: &SiteConfig) -> String {
    url_for(config, "bureaus/")
}

pub fn bureau_url(config: &SiteConfig, slug: &str) -> String {
    url_for(config, &format!("bureaus/{}", slug))
}

pub fn static_url(config: &SiteConfig, path: &str) -> String {
    url_for(config, &format!("static/{}", path.trim_start_matches('/')))
}
