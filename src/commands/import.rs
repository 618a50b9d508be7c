//! Import markdown content into the store

use anyhow::Result;

use crate::content::loader::{ContentLoader, ImportReport};
use crate::Site;

/// Import everything under the content directory
pub fn run(site: &Site) -> Result<ImportReport> {
    let store = site.open_store()?;
    let loader = ContentLoader::new(&site.content_dir);
    let report = loader.import(&store)?;
    tracing::debug!(
        "Store now holds {} articles and {} bureaus",
        store.article_count(),
        store.bureau_count()
    );
    Ok(report)
}
