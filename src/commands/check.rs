//! Validate every article in the content directory

use anyhow::Result;
use std::path::PathBuf;

use crate::content::loader::ContentLoader;
use crate::content::ContentRecord;
use crate::Blog;

/// Result of checking a content directory
#[derive(Debug, Default)]
pub struct CheckSummary {
    /// Articles that parsed cleanly
    pub articles: usize,
    /// Of those, how many have no body yet
    pub stubs: usize,
    /// Files that failed, with a printable reason
    pub failures: Vec<(PathBuf, String)>,
}

impl CheckSummary {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Parse every article and confirm it survives a rewrite unchanged
pub fn run(blog: &Blog) -> Result<CheckSummary> {
    let report = ContentLoader::new(blog).load_articles()?;
    let mut summary = CheckSummary::default();

    for (path, error) in report.failures {
        summary.failures.push((path, format!("{:#}", error)));
    }

    for article in report.articles {
        let rewritten = article.record.to_source()?;
        match ContentRecord::parse(&rewritten) {
            Ok(reparsed) if reparsed == article.record => {}
            Ok(_) => {
                summary.failures.push((
                    article.full_source.clone(),
                    "record changes when written back to source".to_string(),
                ));
                continue;
            }
            Err(e) => {
                summary.failures.push((
                    article.full_source.clone(),
                    format!("rewritten source no longer parses: {}", e),
                ));
                continue;
            }
        }

        summary.articles += 1;
        if article.record.is_stub() {
            summary.stubs += 1;
        }
    }

    tracing::info!(
        "Checked {} article(s): {} ok, {} stub(s), {} failure(s)",
        summary.articles + summary.failures.len(),
        summary.articles,
        summary.stubs,
        summary.failures.len()
    );

    Ok(summary)
}
