//! Initialize a new blog workspace

use anyhow::Result;
use std::fs;
use std::path::Path;

/// Initialize a new blog in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        anyhow::bail!("{:?} already contains a _config.yml", target_dir);
    }

    // Create directory structure
    fs::create_dir_all(target_dir.join("content"))?;

    // Create default _config.yml
    let config_content = r#"# Site
title: My Blog
description: ''
author: John Doe
language: en

# URL
url: http://example.com
root: /

# Directory
content_dir: content
public_dir: public

# Writing
new_post_name: :title.mdx
words_per_minute: 200
highlight:
  theme: base16-ocean.dark
  line_number: true
"#;

    fs::write(&config_path, config_content)?;

    // Create a sample article exercising every block kind
    let now = chrono::Local::now();
    let sample_post = format!(
        r#"---
title: Hello World
description: A first article with code samples and widgets
date: {}
tags:
  - Welcome
---

<Toc maxDepth={{2}} />

Welcome! Articles are markdown with front matter, annotated code fences and a few widgets.

## Code samples

Fences take a language, an optional title and the lines to highlight:

```ts title="greet.ts" {{2}}
export function greet(name: string) {{
  return `Hello, ${{name}}!`
}}
```

## Widgets

Widgets sit on their own lines as self-closing tags.

<Comments />
"#,
        now.format("%Y-%m-%d")
    );

    fs::write(target_dir.join("content/hello-world.mdx"), sample_post)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::loader::ContentLoader;
    use crate::Blog;
    use tempfile::TempDir;

    #[test]
    fn test_init_site_is_loadable() {
        let tmp = TempDir::new().unwrap();
        init_site(tmp.path()).unwrap();

        let blog = Blog::new(tmp.path()).unwrap();
        assert_eq!(blog.config.new_post_name, ":title.mdx");

        let report = ContentLoader::new(&blog).load_articles().unwrap();
        assert!(report.failures.is_empty());
        assert_eq!(report.articles.len(), 1);

        let record = &report.articles[0].record;
        assert_eq!(record.title, "Hello World");
        assert_eq!(record.widgets().count(), 2);
        let code = record.code_blocks().next().unwrap();
        assert_eq!(code.title.as_deref(), Some("greet.ts"));
        assert!(code.is_highlighted(2));
    }

    #[test]
    fn test_init_refuses_existing_site() {
        let tmp = TempDir::new().unwrap();
        init_site(tmp.path()).unwrap();
        assert!(init_site(tmp.path()).is_err());
    }
}
