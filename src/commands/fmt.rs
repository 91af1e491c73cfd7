//! Rewrite an article in canonical form

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::content::loader::ContentLoader;
use crate::Blog;

/// Canonical source text of one article; with `write`, also save it in place
pub fn run(blog: &Blog, path: &Path, write: bool) -> Result<String> {
    let article = ContentLoader::new(blog).load_article(path)?;
    let formatted = article.record.to_source()?;

    if write {
        let current = fs::read_to_string(path)?;
        if current == formatted {
            tracing::info!("{:?} is already formatted", path);
        } else {
            fs::write(path, &formatted).with_context(|| format!("Failed to write {:?}", path))?;
            tracing::info!("Formatted {:?}", path);
        }
    }

    Ok(formatted)
}
