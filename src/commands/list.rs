//! List site content

use anyhow::Result;

use crate::store::ContentStore;
use crate::visibility;
use crate::Site;

/// List site content by type
pub fn run(site: &Site, content_type: &str) -> Result<()> {
    let store = site.open_store()?;
    print!("{}", listing(&store, content_type)?);
    Ok(())
}

fn listing(store: &ContentStore, content_type: &str) -> Result<String> {
    let mut out = String::new();
    match content_type {
        "article" | "articles" => {
            let mut articles = store.articles();
            articles.sort_by(visibility::newest_first);
            out.push_str(&format!("Articles ({}):\n", articles.len()));
            for article in articles {
                let bureau = article
                    .bureau
                    .and_then(|id| store.get_bureau(id))
                    .map(|b| format!(" ({})", b.slug))
                    .unwrap_or_default();
                out.push_str(&format!(
                    "  #{} {} - {}{}{}\n",
                    article.id,
                    article.updated_at.format("%Y-%m-%d %H:%M"),
                    article.title,
                    bureau,
                    if article.is_published { "" } else { " [draft]" }
                ));
            }
        }
        "bureau" | "bureaus" => {
            let bureaus = store.bureaus();
            out.push_str(&format!("Bureaus ({}):\n", bureaus.len()));
            for bureau in bureaus {
                let count = store.articles_in_bureau(bureau.id).len();
                out.push_str(&format!(
                    "  {} [{}] {} articles\n",
                    bureau.name, bureau.slug, count
                ));
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: articles, bureaus",
                content_type
            );
        }
    }
    Ok(out)
}
