//! HTML rendering with syntax highlighting

use anyhow::Result;
use lazy_static::lazy_static;
use pulldown_cmark::{html, Parser};
use regex::Regex;
use std::collections::HashMap;
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use super::{RenderConfig, Rendered, Renderer, TocEntry};
use crate::content::widget::{AttributionProps, TocProps, TranslationsProps};
use crate::content::{markdown_options, BlockNode, CodeBlock, ContentRecord, Widget};

lazy_static! {
    static ref LINK_DEFINITION: Regex = Regex::new(r"^ {0,3}\[[^\]]+\]:\s*\S+").unwrap();
}

/// Default depth of the table of contents widget
const TOC_DEPTH: u8 = 3;

/// HTML renderer with syntax highlighting
pub struct HtmlRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    config: RenderConfig,
}

impl HtmlRenderer {
    /// Create a new renderer
    pub fn new(config: RenderConfig) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            config,
        }
    }

    /// Wrap a rendered body into a standalone page
    pub fn render_page(&self, record: &ContentRecord, rendered: &Rendered) -> String {
        let banner = record
            .banner
            .as_ref()
            .map(|b| format!(r#"<img class="banner" src="{}" alt="">"#, html_escape(b)))
            .unwrap_or_default();

        let tags: String = record
            .tags
            .iter()
            .map(|t| format!(r#"<li class="tag">{}</li>"#, html_escape(t)))
            .collect();

        format!(
            r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
<meta charset="utf-8">
<title>{title} | {site}</title>
<meta name="description" content="{description}">
<link rel="canonical" href="{url}{slug}/">
</head>
<body>
<article>
<header>
{banner}
<h1>{title}</h1>
<p class="meta"><time datetime="{date}">{date}</time> · {minutes} min read</p>
<ul class="tags">{tags}</ul>
</header>
{body}
</article>
</body>
</html>
"#,
            lang = html_escape(&self.config.language),
            title = html_escape(&record.title),
            site = html_escape(&self.config.site_title),
            description = html_escape(&record.description),
            url = self.config.site_url,
            slug = record.slug(),
            banner = banner,
            date = record.date.format("%Y-%m-%d"),
            minutes = rendered.reading_minutes,
            tags = tags,
            body = rendered.body,
        )
    }

    /// Render markdown prose to HTML
    fn render_markdown(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, markdown_options());
        let mut html_output = String::new();
        html::push_html(&mut html_output, parser);
        html_output
    }

    /// Render heading text without the paragraph wrapper
    fn render_inline(&self, text: &str) -> String {
        let html = self.render_markdown(text);
        html.trim()
            .strip_prefix("<p>")
            .and_then(|s| s.strip_suffix("</p>"))
            .map(str::to_string)
            .unwrap_or_else(|| html_escape(text))
    }

    /// Highlight a code block, marking its annotated lines
    fn highlight_code(&self, block: &CodeBlock) -> String {
        let lang = block.language.as_deref().unwrap_or("text");

        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let theme = self
            .theme_set
            .themes
            .get(&self.config.theme)
            .or_else(|| self.theme_set.themes.values().next());

        let mut highlighter = theme.map(|theme| HighlightLines::new(syntax, theme));
        let mut lines = Vec::new();

        for (i, line) in LinesWithEndings::from(&block.source).enumerate() {
            let code = highlighter
                .as_mut()
                .and_then(|h| h.highlight_line(line, &self.syntax_set).ok())
                .and_then(|regions| {
                    styled_line_to_highlighted_html(&regions, IncludeBackground::No).ok()
                })
                .unwrap_or_else(|| html_escape(line))
                .replace('\n', "");

            let number = i + 1;
            let class = if block.is_highlighted(number) {
                "line highlighted"
            } else {
                "line"
            };
            let gutter = if self.config.line_numbers {
                format!(r#"<span class="line-number">{}</span>"#, number)
            } else {
                String::new()
            };
            lines.push(format!(r#"<span class="{}">{}{}</span>"#, class, gutter, code));
        }

        let caption = block
            .title
            .as_ref()
            .map(|t| format!("<figcaption>{}</figcaption>", html_escape(t)))
            .unwrap_or_default();

        format!(
            r#"<figure class="highlight {lang}">{caption}<pre><code class="language-{lang}">{code}</code></pre></figure>"#,
            lang = html_escape(lang),
            caption = caption,
            code = lines.join("\n"),
        )
    }

    fn render_widget(&self, widget: &Widget, toc: &[TocEntry]) -> String {
        match widget {
            Widget::Comments(_) => {
                r#"<section class="widget comments" data-widget="Comments"></section>"#.to_string()
            }
            Widget::Attribution(AttributionProps { author, url }) => {
                let who = match url {
                    Some(url) => format!(
                        r#"<a href="{}">{}</a>"#,
                        html_escape(url),
                        html_escape(author)
                    ),
                    None => html_escape(author),
                };
                format!(
                    r#"<p class="widget attribution" data-widget="Attribution">{}</p>"#,
                    who
                )
            }
            Widget::Translations(TranslationsProps { translations }) => {
                let items: String = translations
                    .iter()
                    .map(|t| {
                        format!(
                            r#"<li><a href="{}">{}</a></li>"#,
                            html_escape(&t.url),
                            html_escape(&t.language)
                        )
                    })
                    .collect();
                format!(
                    r#"<nav class="widget translations" data-widget="Translations"><ul>{}</ul></nav>"#,
                    items
                )
            }
            Widget::TableOfContents(TocProps { max_depth }) => {
                let depth = max_depth.unwrap_or(TOC_DEPTH);
                let items: String = toc
                    .iter()
                    .filter(|e| e.level <= depth)
                    .map(|e| {
                        format!(
                            r##"<li class="toc-level-{}"><a href="#{}">{}</a></li>"##,
                            e.level,
                            e.id,
                            html_escape(&e.text)
                        )
                    })
                    .collect();
                format!(
                    r#"<nav class="widget toc" data-widget="Toc"><ul>{}</ul></nav>"#,
                    items
                )
            }
        }
    }
}

impl Renderer for HtmlRenderer {
    fn render(&self, record: &ContentRecord) -> Result<Rendered> {
        // Paragraphs are rendered one at a time, so reference-style link
        // definitions are appended to each of them
        let definitions: Vec<&str> = record
            .body
            .iter()
            .filter_map(|node| match node {
                BlockNode::Paragraph { content } if is_link_definitions(content) => {
                    Some(content.as_str())
                }
                _ => None,
            })
            .collect();
        let definitions = definitions.join("\n");

        let toc = table_of_contents(record);
        let mut anchors = toc.iter();
        let mut out = String::new();

        for node in &record.body {
            let html = match node {
                BlockNode::Paragraph { content } if is_link_definitions(content) => continue,
                BlockNode::Paragraph { content } => {
                    self.render_markdown(&format!("{}\n\n{}", content, definitions))
                }
                BlockNode::Heading { level, text } => {
                    let id = anchors.next().map(|e| e.id.as_str()).unwrap_or_default();
                    format!(
                        "<h{level} id=\"{id}\">{inner}</h{level}>\n",
                        level = level,
                        id = id,
                        inner = self.render_inline(text)
                    )
                }
                BlockNode::CodeBlock(block) => format!("{}\n", self.highlight_code(block)),
                BlockNode::Component { widget } => {
                    format!("{}\n", self.render_widget(widget, &toc))
                }
            };
            out.push_str(&html);
        }

        let reading_minutes = record
            .word_count()
            .div_ceil(self.config.words_per_minute.max(1))
            .max(1);

        tracing::debug!(
            "Rendered `{}` ({} bytes, {} min read)",
            record.title,
            out.len(),
            reading_minutes
        );

        Ok(Rendered {
            body: out,
            toc,
            reading_minutes,
        })
    }
}

/// Headings with unique anchor ids, in order
pub fn table_of_contents(record: &ContentRecord) -> Vec<TocEntry> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    record
        .headings()
        .map(|(level, text)| {
            let base = match slug::slugify(text) {
                s if s.is_empty() => "section".to_string(),
                s => s,
            };
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            let id = if *count == 1 {
                base
            } else {
                format!("{}-{}", base, *count - 1)
            };
            TocEntry {
                level,
                text: text.to_string(),
                id,
            }
        })
        .collect()
}

fn is_link_definitions(content: &str) -> bool {
    content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .all(|l| LINK_DEFINITION.is_match(l))
}

/// Simple HTML escaping
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE: &str = r#"---
title: Type-safe React Query
description: Having types is not being type-safe
date: 2023-01-07
banner: ./glasses.jpg
tags: [ReactJs, TypeScript]
---

<Translations translations={[{ language: 'Deutsch', url: 'https://example.com/de' }]} />

<Toc maxDepth={2} />

## Intro

Read the [zod docs][zod] first.

[zod]: https://zod.dev

### Details

## Intro

```ts title="fetch.ts" {2}
const a = 1
const b = 2
```

<Attribution author="Jane" url="https://example.com/jane" />

<Comments />
"#;

    fn render(src: &str) -> Rendered {
        let record = ContentRecord::parse(src).unwrap();
        HtmlRenderer::new(RenderConfig::default())
            .render(&record)
            .unwrap()
    }

    #[test]
    fn test_render_article() {
        let rendered = render(ARTICLE);
        let html = &rendered.body;

        assert!(html.contains(r#"<h2 id="intro">Intro</h2>"#));
        assert!(html.contains(r#"<h2 id="intro-1">Intro</h2>"#));
        assert!(html.contains(r#"<a href="https://zod.dev">zod docs</a>"#));
        assert!(!html.contains("[zod]:"));
        assert!(html.contains("<figcaption>fetch.ts</figcaption>"));
        assert_eq!(html.matches(r#"class="line highlighted""#).count(), 1);
        assert_eq!(html.matches(r#"class="line""#).count(), 1);
        assert!(html.contains(r#"<a href="https://example.com/de">Deutsch</a>"#));
        assert!(html.contains(r#"<a href="https://example.com/jane">Jane</a>"#));
        assert!(html.contains(r#"data-widget="Comments""#));
    }

    #[test]
    fn test_table_of_contents() {
        let rendered = render(ARTICLE);
        let ids: Vec<_> = rendered.toc.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["intro", "details", "intro-1"]);

        // maxDepth={2} leaves out the level 3 heading
        assert!(rendered.body.contains(r##"<a href="#intro">Intro</a>"##));
        assert!(!rendered.body.contains(r##"<a href="#details">"##));
    }

    #[test]
    fn test_reading_time() {
        let words = vec!["word"; 450].join(" ");
        let src = format!("---\ntitle: T\ndate: 2023-01-07\n---\n{}\n", words);
        assert_eq!(render(&src).reading_minutes, 3);

        let stub = render("---\ntitle: T\ndate: 2023-01-07\n---\n");
        assert_eq!(stub.reading_minutes, 1);
        assert!(stub.body.is_empty());
    }

    #[test]
    fn test_render_page() {
        let record = ContentRecord::parse(ARTICLE).unwrap();
        let renderer = HtmlRenderer::new(RenderConfig::default());
        let rendered = renderer.render(&record).unwrap();
        let page = renderer.render_page(&record, &rendered);

        assert!(page.contains("<title>Type-safe React Query | My Blog</title>"));
        assert!(page.contains(r#"<img class="banner" src="./glasses.jpg" alt="">"#));
        assert!(page.contains(r#"<li class="tag">ReactJs</li>"#));
        assert!(page.contains("http://example.com/type-safe-react-query/"));
    }

    #[test]
    fn test_unknown_language_falls_back() {
        let src = "---\ntitle: T\ndate: 2023-01-07\n---\n```nope\n<div>\n```\n";
        let html = render(src).body;
        assert!(html.contains("language-nope"));
        assert!(html.contains("&lt;div&gt;"));
    }
}
