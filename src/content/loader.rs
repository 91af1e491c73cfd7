//! Content loader - finds and parses article sources under the content directory

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::ContentRecord;
use crate::Blog;

/// A parsed article and where it came from
#[derive(Debug, Clone)]
pub struct Article {
    /// Source file path relative to the content directory
    pub source: String,

    /// Full source file path
    pub full_source: PathBuf,

    pub record: ContentRecord,
}

/// Outcome of loading a whole content directory
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Parsed articles, newest first
    pub articles: Vec<Article>,

    /// Files that could not be read or parsed
    pub failures: Vec<(PathBuf, anyhow::Error)>,
}

/// Loads articles from the content directory
pub struct ContentLoader<'a> {
    blog: &'a Blog,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(blog: &'a Blog) -> Self {
        Self { blog }
    }

    /// Load every article, collecting failures instead of stopping at the first
    pub fn load_articles(&self) -> Result<LoadReport> {
        let content_dir = &self.blog.content_dir;
        if !content_dir.exists() {
            tracing::debug!("Content directory {:?} does not exist", content_dir);
            return Ok(LoadReport::default());
        }

        let mut report = LoadReport::default();

        for entry in WalkDir::new(content_dir)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && is_article_file(path) {
                match self.load_article(path) {
                    Ok(article) => report.articles.push(article),
                    Err(e) => {
                        tracing::warn!("Failed to load article {:?}: {:#}", path, e);
                        report.failures.push((path.to_path_buf(), e));
                    }
                }
            }
        }

        // Newest first, then by path for a stable order
        report.articles.sort_by(|a, b| {
            b.record
                .date
                .cmp(&a.record.date)
                .then_with(|| a.source.cmp(&b.source))
        });

        tracing::debug!(
            "Loaded {} article(s), {} failure(s)",
            report.articles.len(),
            report.failures.len()
        );

        Ok(report)
    }

    /// Load a single article from a file
    pub fn load_article(&self, path: &Path) -> Result<Article> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let record =
            ContentRecord::parse(&content).with_context(|| format!("Failed to parse {:?}", path))?;

        let source = path
            .strip_prefix(&self.blog.content_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string();

        if record.is_stub() {
            tracing::info!("{} is a stub with no body yet", source);
        }

        Ok(Article {
            source,
            full_source: path.to_path_buf(),
            record,
        })
    }
}

/// Check if a file is an article source
pub fn is_article_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "mdx" || e == "markdown")
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.') || n.starts_with('_'))
        .unwrap_or(false)
}
