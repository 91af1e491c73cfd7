//! List site content

use anyhow::Result;
use std::collections::HashMap;

use crate::content::loader::ContentLoader;
use crate::Blog;

/// List site content by type
pub fn run(blog: &Blog, content_type: &str) -> Result<()> {
    let loader = ContentLoader::new(blog);

    match content_type {
        "post" | "posts" => {
            let report = loader.load_articles()?;
            println!("Posts ({}):", report.articles.len());
            for article in report.articles {
                let stub = if article.record.is_stub() { " (stub)" } else { "" };
                println!(
                    "  {} - {}{} [{}]",
                    article.record.date.format("%Y-%m-%d"),
                    article.record.title,
                    stub,
                    article.source
                );
            }
        }
        "tag" | "tags" => {
            let report = loader.load_articles()?;
            println!("Tags:");
            for (tag, count) in tag_counts(report.articles.iter().map(|a| &a.record.tags)) {
                println!("  {} ({})", tag, count);
            }
        }
        _ => {
            anyhow::bail!("Unknown type: {}. Available: post, tag", content_type);
        }
    }

    Ok(())
}

/// Tag usage counts, most used first, ties by name
pub fn tag_counts<'a, I>(tag_sets: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a std::collections::BTreeSet<String>>,
{
    let mut tags: HashMap<String, usize> = HashMap::new();
    for set in tag_sets {
        for tag in set {
            *tags.entry(tag.clone()).or_insert(0) += 1;
        }
    }
    let mut tags: Vec<_> = tags.into_iter().collect();
    tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    tags
}
