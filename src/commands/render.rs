//! Render articles to HTML pages

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::content::loader::{Article, ContentLoader};
use crate::render::Renderer;
use crate::Blog;

/// Render one article, or every article when `path` is `None`.
/// Returns the pages written.
pub fn run(blog: &Blog, path: Option<&Path>) -> Result<Vec<PathBuf>> {
    let loader = ContentLoader::new(blog);
    let articles = match path {
        Some(path) => vec![loader.load_article(path)?],
        None => {
            let report = loader.load_articles()?;
            if let Some((path, error)) = report.failures.into_iter().next() {
                return Err(error.context(format!("Cannot render while {:?} is broken", path)));
            }
            report.articles
        }
    };

    // Claim every output directory before writing anything
    let mut claimed: HashMap<String, &str> = HashMap::new();
    let mut names = Vec::with_capacity(articles.len());
    for article in &articles {
        let name = output_name(article);
        if let Some(other) = claimed.insert(name.clone(), &article.source) {
            anyhow::bail!(
                "{} and {} would both render to {}/index.html",
                other,
                article.source,
                name
            );
        }
        names.push(name);
    }

    let start = std::time::Instant::now();
    let mut written = Vec::new();
    for (article, name) in articles.iter().zip(&names) {
        written.push(render_article(blog, article, name)?);
    }

    tracing::info!(
        "Rendered {} page(s) in {:.2}s",
        written.len(),
        start.elapsed().as_secs_f64()
    );

    Ok(written)
}

/// Output directory name: the title slug, or the file name when the title
/// has nothing to slugify
fn output_name(article: &Article) -> String {
    let slug = article.record.slug();
    if !slug.is_empty() {
        return slug;
    }
    let stem = Path::new(&article.source)
        .file_stem()
        .map(|s| slug::slugify(s.to_string_lossy()))
        .unwrap_or_default();
    if stem.is_empty() {
        "untitled".to_string()
    } else {
        stem
    }
}

fn render_article(blog: &Blog, article: &Article, name: &str) -> Result<PathBuf> {
    let renderer = blog.renderer();
    let rendered = renderer.render(&article.record)?;
    let page = renderer.render_page(&article.record, &rendered);

    let out_dir = blog.public_dir.join(name);
    fs::create_dir_all(&out_dir)?;
    let out_path = out_dir.join("index.html");
    fs::write(&out_path, page).with_context(|| format!("Failed to write {:?}", out_path))?;

    tracing::debug!("Rendered {} -> {:?}", article.source, out_path);
    Ok(out_path)
}
