//! Create a new article

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::content::ContentRecord;
use crate::Blog;

/// Write a stub article and return its path
pub fn create_article(blog: &Blog, title: &str, path: Option<&str>) -> Result<PathBuf> {
    let now = chrono::Local::now();

    fs::create_dir_all(&blog.content_dir)?;

    // Generate filename
    let filename = if let Some(p) = path {
        if p.ends_with(".md") || p.ends_with(".mdx") {
            p.to_string()
        } else {
            format!("{}.mdx", p)
        }
    } else {
        let slug = slug::slugify(title);

        blog.config
            .new_post_name
            .replace(":title", &slug)
            .replace(":year", &now.format("%Y").to_string())
            .replace(":month", &now.format("%m").to_string())
            .replace(":day", &now.format("%d").to_string())
            .replace(":i_month", &now.format("%-m").to_string())
            .replace(":i_day", &now.format("%-d").to_string())
    };

    let file_path = blog.content_dir.join(&filename);

    // Check if file already exists
    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let record = ContentRecord::stub(title, now.date_naive());
    fs::write(&file_path, record.to_source()?)?;

    tracing::info!("Created stub article {:?}", file_path);

    Ok(file_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_article() {
        let tmp = TempDir::new().unwrap();
        let blog = Blog::new(tmp.path()).unwrap();

        let path = create_article(&blog, "Type-safe React Query", None).unwrap();
        assert_eq!(path, blog.content_dir.join("type-safe-react-query.mdx"));

        let record = ContentRecord::parse(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(record.title, "Type-safe React Query");
        assert!(record.is_stub());

        assert!(create_article(&blog, "Type-safe React Query", None).is_err());
    }

    #[test]
    fn test_create_article_with_path() {
        let tmp = TempDir::new().unwrap();
        let blog = Blog::new(tmp.path()).unwrap();

        let path = create_article(&blog, "Hello", Some("2023/hello")).unwrap();
        assert_eq!(path, blog.content_dir.join("2023/hello.mdx"));
        assert!(path.exists());
    }
}
