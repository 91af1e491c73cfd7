//! Print a parsed record

use anyhow::Result;
use std::path::Path;

use crate::content::loader::ContentLoader;
use crate::Blog;

/// Parse one article and return the record as pretty JSON
pub fn run(blog: &Blog, path: &Path) -> Result<String> {
    let article = ContentLoader::new(blog).load_article(path)?;
    Ok(serde_json::to_string_pretty(&article.record)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_show_json() {
        let tmp = TempDir::new().unwrap();
        let blog = Blog::new(tmp.path()).unwrap();
        let path = tmp.path().join("a.mdx");
        fs::write(
            &path,
            "---\ntitle: A\ndate: 2023-01-07\ntags: [x]\n---\n```ts {1}\nlet a\n```\n\n<Toc />\n",
        )
        .unwrap();

        let json: serde_json::Value = serde_json::from_str(&run(&blog, &path).unwrap()).unwrap();
        assert_eq!(json["title"], "A");
        assert_eq!(json["date"], "2023-01-07");
        assert_eq!(json["tags"][0], "x");
        assert_eq!(json["body"][0]["type"], "code_block");
        assert_eq!(json["body"][0]["highlighted_lines"][0], 1);
        assert_eq!(json["body"][1]["type"], "component");
        assert_eq!(json["body"][1]["widget"]["name"], "Toc");
    }
}
