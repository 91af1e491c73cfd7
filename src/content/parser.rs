//! Source text to content record
//!
//! The body is split line by line into fenced code, widget tags and prose.
//! Prose runs are handed to pulldown-cmark and broken into top-level blocks.

use lazy_static::lazy_static;
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};
use regex::Regex;

use super::fence::FenceInfo;
use super::widget::Widget;
use super::{BlockNode, ContentRecord, FrontMatter, ParseError};

lazy_static! {
    static ref CLOSING_HASHES: Regex = Regex::new(r"(?:^|[ \t]+)#+[ \t]*$").unwrap();
}

/// Markdown extensions recognised in prose
pub fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_GFM
}

/// Parse a full source artifact
pub fn parse(source: &str) -> Result<ContentRecord, ParseError> {
    let (fm, body) = FrontMatter::parse(source)?;
    let mut record = fm.into_record(Vec::new())?;

    let header_lines = source[..source.len() - body.len()].matches('\n').count();
    record.body = BodyParser::new(body, header_lines + 1).parse()?;

    tracing::debug!(
        "Parsed `{}`: {} block(s), {} code block(s)",
        record.title,
        record.body.len(),
        record.code_blocks().count()
    );

    Ok(record)
}

/// An opening code fence
struct Fence<'a> {
    marker: char,
    len: usize,
    indent: usize,
    info: &'a str,
}

fn opening_fence(line: &str) -> Option<Fence<'_>> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let marker = rest.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = rest.len() - rest.trim_start_matches(marker).len();
    if len < 3 {
        return None;
    }
    let info = rest[len..].trim();
    if marker == '`' && info.contains('`') {
        return None;
    }
    Some(Fence {
        marker,
        len,
        indent,
        info,
    })
}

fn is_closing_fence(line: &str, fence: &Fence) -> bool {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return false;
    }
    let len = trimmed.len() - trimmed.trim_start_matches(fence.marker).len();
    len >= fence.len && trimmed[len..].trim().is_empty()
}

/// Drop up to `indent` leading spaces
fn strip_indent(line: &str, indent: usize) -> &str {
    let spaces = line.len() - line.trim_start_matches(' ').len();
    &line[spaces.min(indent)..]
}

/// Component name of a tag opening `line`, with the text after the name
fn component_tag(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let rest = trimmed.strip_prefix('<')?;
    if !rest.starts_with(|c: char| c.is_ascii_uppercase()) {
        return None;
    }
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
        .unwrap_or(rest.len());
    Some((&rest[..end], &rest[end..]))
}

/// Does `line` start a widget tag (`<Name` then props, `/>` or end of line)
fn opens_widget(line: &str) -> bool {
    component_tag(line).is_some_and(|(_, after)| {
        after.is_empty() || after.starts_with(|c: char| c.is_whitespace() || c == '/')
    })
}

/// Name of a component whose opening tag fills the whole line, as in
/// `<Newsletter>` or `<Callout type="info">`
fn block_component(line: &str) -> Option<&str> {
    let (name, after) = component_tag(line)?;
    let after = after.trim_end();
    let is_open_tag = after.ends_with('>')
        && !after.ends_with("/>")
        && !after.contains('<')
        && (after == ">" || after.starts_with(char::is_whitespace));
    is_open_tag.then_some(name)
}

/// Text of an ATX or setext heading, without its markers
fn heading_text(src: &str) -> String {
    let src = src.trim();
    if src.starts_with('#') {
        let text = src.trim_start_matches('#');
        CLOSING_HASHES.replace(text, "").trim().to_string()
    } else {
        let mut lines: Vec<&str> = src.lines().collect();
        lines.pop();
        lines.iter().map(|l| l.trim()).collect::<Vec<_>>().join(" ")
    }
}

struct BodyParser<'a> {
    lines: Vec<&'a str>,
    first_line: usize,
    blocks: Vec<BlockNode>,
    prose: Vec<&'a str>,
    prose_start: usize,
}

impl<'a> BodyParser<'a> {
    fn new(body: &'a str, first_line: usize) -> Self {
        Self {
            lines: body.lines().collect(),
            first_line,
            blocks: Vec::new(),
            prose: Vec::new(),
            prose_start: first_line,
        }
    }

    /// 1-based source line of body line `index`
    fn line_no(&self, index: usize) -> usize {
        self.first_line + index
    }

    fn parse(mut self) -> Result<Vec<BlockNode>, ParseError> {
        let mut i = 0;

        while i < self.lines.len() {
            let line = self.lines[i];

            if let Some(fence) = opening_fence(line) {
                self.flush_prose()?;
                let start = i;
                let mut code = Vec::new();
                i += 1;
                while i < self.lines.len() && !is_closing_fence(self.lines[i], &fence) {
                    code.push(strip_indent(self.lines[i], fence.indent));
                    i += 1;
                }
                if i < self.lines.len() {
                    i += 1;
                } else {
                    tracing::warn!(
                        "Code fence opened at line {} is never closed",
                        self.line_no(start)
                    );
                }

                let line_no = self.line_no(start);
                let block = FenceInfo::parse(fence.info, line_no)?
                    .into_code_block(code.join("\n"), line_no)?;
                self.blocks.push(BlockNode::CodeBlock(block));
                continue;
            }

            if opens_widget(line) {
                if let Some(end) = self.widget_end(i) {
                    self.flush_prose()?;
                    let tag = self.lines[i..=end].join("\n");
                    let widget = Widget::parse_tag(&tag, self.line_no(i))?;
                    self.blocks.push(BlockNode::Component { widget });
                    i = end + 1;
                    continue;
                }
            }

            if let Some(name) = block_component(line) {
                let line_no = self.line_no(i);
                if Widget::KNOWN.iter().any(|known| *known == name) {
                    return Err(ParseError::props(
                        line_no,
                        name,
                        "only self-closing widget tags are supported",
                    ));
                }
                return Err(ParseError::UnresolvedComponentReference {
                    line: line_no,
                    name: name.to_string(),
                });
            }

            if self.prose.is_empty() {
                self.prose_start = self.line_no(i);
            }
            self.prose.push(line);
            i += 1;
        }

        self.flush_prose()?;
        Ok(self.blocks)
    }

    /// Index of the line closing a widget tag opened at `start`, if it closes
    /// before the next blank line
    fn widget_end(&self, start: usize) -> Option<usize> {
        for (j, line) in self.lines.iter().enumerate().skip(start) {
            if line.trim_end().ends_with("/>") {
                return Some(j);
            }
            if j > start && line.trim().is_empty() {
                return None;
            }
        }
        None
    }

    fn flush_prose(&mut self) -> Result<(), ParseError> {
        if self.prose.is_empty() {
            return Ok(());
        }
        let text = self.prose.join("\n");
        self.prose.clear();
        let start_line = self.prose_start;
        let line_of = |offset: usize| start_line + text[..offset].matches('\n').count();

        let mut depth = 0usize;
        let mut covered = 0usize;
        let mut code: Option<(String, String, usize)> = None;

        for (event, range) in Parser::new_ext(&text, markdown_options()).into_offset_iter() {
            if depth == 0 {
                if range.start > covered {
                    push_paragraph(&mut self.blocks, &text[covered..range.start]);
                }
                covered = covered.max(range.end);
            }

            match event {
                Event::Start(Tag::CodeBlock(kind)) if depth == 0 => {
                    let info = match kind {
                        CodeBlockKind::Fenced(info) => info.to_string(),
                        CodeBlockKind::Indented => String::new(),
                    };
                    code = Some((info, String::new(), line_of(range.start)));
                    depth += 1;
                }
                Event::Start(Tag::Heading { level, .. }) if depth == 0 => {
                    self.blocks.push(BlockNode::Heading {
                        level: level as u8,
                        text: heading_text(&text[range]),
                    });
                    depth += 1;
                }
                Event::Start(_) => {
                    if depth == 0 {
                        push_paragraph(&mut self.blocks, &text[range]);
                    }
                    depth += 1;
                }
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        if let Some((info, source, line)) = code.take() {
                            let source = source.strip_suffix('\n').unwrap_or(&source).to_string();
                            let block = FenceInfo::parse(&info, line)?.into_code_block(source, line)?;
                            self.blocks.push(BlockNode::CodeBlock(block));
                        }
                    }
                }
                Event::Text(t) if code.is_some() => {
                    if let Some((_, source, _)) = code.as_mut() {
                        source.push_str(&t);
                    }
                }
                _ if depth == 0 => push_paragraph(&mut self.blocks, &text[range]),
                _ => {}
            }
        }

        if covered < text.len() {
            push_paragraph(&mut self.blocks, &text[covered..]);
        }

        Ok(())
    }
}

/// Push prose that is not a heading or code, skipping blank runs
fn push_paragraph(blocks: &mut Vec<BlockNode>, src: &str) {
    let content = src.trim_end().trim_start_matches(['\n', '\r']);
    if !content.trim().is_empty() {
        blocks.push(BlockNode::Paragraph {
            content: content.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::widget::{Translation, TranslationsProps};
    use std::collections::BTreeSet;

    const ARTICLE: &str = r#"---
title: Type-safe React Query
description: About the difference between "having types" and "being type-safe"
date: 2023-01-07
banner: ./glasses.jpg
tags:
  - ReactJs
  - TypeScript
---

<Translations translations={[{ language: '简体中文', url: 'https://example.com/zh' }]} />

I think we can all agree that using **TypeScript** is a good idea.

## The Zod way

```ts title="useTodos.ts" {8}
import { z } from 'zod'

const todoSchema = z.object({
  id: z.number(),
  name: z.string(),
})

export const fetchTodo = async (id: number) => {
  const response = await axios.get(`todos/${id}`)
  return todoSchema.parse(response.data)
}
```

- first
- second

<Comments />
"#;

    fn paragraph(s: &str) -> BlockNode {
        BlockNode::Paragraph {
            content: s.to_string(),
        }
    }

    #[test]
    fn test_parse_article() {
        let record = parse(ARTICLE).unwrap();

        assert_eq!(record.title, "Type-safe React Query");
        assert_eq!(record.date.to_string(), "2023-01-07");
        assert_eq!(record.banner.as_deref(), Some("./glasses.jpg"));
        assert_eq!(record.tags.len(), 2);
        assert_eq!(record.body.len(), 6);

        assert_eq!(
            record.body[0],
            BlockNode::Component {
                widget: Widget::Translations(TranslationsProps {
                    translations: vec![Translation {
                        language: "简体中文".to_string(),
                        url: "https://example.com/zh".to_string(),
                    }],
                }),
            }
        );
        assert_eq!(
            record.body[1],
            paragraph("I think we can all agree that using **TypeScript** is a good idea.")
        );
        assert_eq!(
            record.body[2],
            BlockNode::Heading {
                level: 2,
                text: "The Zod way".to_string()
            }
        );

        let BlockNode::CodeBlock(code) = &record.body[3] else {
            panic!("expected a code block, got {:?}", record.body[3]);
        };
        assert_eq!(code.language.as_deref(), Some("ts"));
        assert_eq!(code.title.as_deref(), Some("useTodos.ts"));
        assert_eq!(code.line_count(), 11);
        assert_eq!(code.highlighted_lines, BTreeSet::from([8]));
        assert!(code.source.starts_with("import { z } from 'zod'"));

        assert_eq!(record.body[4], paragraph("- first\n- second"));
        assert_eq!(
            record.body[5],
            BlockNode::Component {
                widget: Widget::Comments(Default::default())
            }
        );
    }

    #[test]
    fn test_react_query_example() {
        let code: Vec<String> = (1..=10).map(|i| format!("const line{} = {}", i, i)).collect();
        let src = format!(
            "---\ntitle: \"Type-safe React Query\"\ndate: \"2023-01-07\"\ntags: [\"ReactJs\", \"TypeScript\"]\n---\n\n```ts {{8}}\n{}\n```\n",
            code.join("\n")
        );

        let record = parse(&src).unwrap();
        assert_eq!(record.tags.len(), 2);
        let blocks: Vec<_> = record.code_blocks().collect();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].language.as_deref(), Some("ts"));
        assert_eq!(blocks[0].line_count(), 10);
        assert_eq!(blocks[0].highlighted_lines, BTreeSet::from([8]));
    }

    #[test]
    fn test_parse_is_idempotent() {
        assert_eq!(parse(ARTICLE).unwrap(), parse(ARTICLE).unwrap());
    }

    #[test]
    fn test_headings() {
        let src = "---\ntitle: T\ndate: 2023-01-07\n---\n# One #\n\nTwo\n===\n\n### C#\n";
        let record = parse(src).unwrap();
        let headings: Vec<_> = record.headings().collect();
        assert_eq!(headings, vec![(1, "One"), (1, "Two"), (3, "C#")]);
    }

    #[test]
    fn test_indented_code_block() {
        let src = "---\ntitle: T\ndate: 2023-01-07\n---\nText\n\n    let x = 1;\n    let y = 2;\n";
        let record = parse(src).unwrap();
        let code = record.code_blocks().next().unwrap();
        assert_eq!(code.language, None);
        assert_eq!(code.source, "let x = 1;\nlet y = 2;");
    }

    #[test]
    fn test_tilde_and_long_fences() {
        let src = "---\ntitle: T\ndate: 2023-01-07\n---\n~~~js\na\n~~~\n\n````md\n```ts\nb\n```\n````\n";
        let record = parse(src).unwrap();
        let blocks: Vec<_> = record.code_blocks().collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].source, "a");
        assert_eq!(blocks[1].source, "```ts\nb\n```");
    }

    #[test]
    fn test_unterminated_fence_runs_to_end() {
        let src = "---\ntitle: T\ndate: 2023-01-07\n---\n```sh\necho hi\n";
        let record = parse(src).unwrap();
        assert_eq!(record.code_blocks().next().unwrap().source, "echo hi");
    }

    #[test]
    fn test_highlight_out_of_range() {
        let src = "---\ntitle: T\ndate: 2023-01-07\n---\n\n```ts {99}\n1\n2\n3\n4\n5\n```\n";
        let err = parse(src).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedCodeBlockAnnotation { line: 6, .. }
        ));
    }

    #[test]
    fn test_non_breaking_space_in_fence_info() {
        let src = "---\ntitle: T\ndate: 2023-01-07\n---\n```ts\u{a0}{1}\nx\n```\n";
        let code = parse(src).unwrap().code_blocks().next().cloned().unwrap();
        assert_eq!(code.language.as_deref(), Some("ts"));
        assert_eq!(code.highlighted_lines, BTreeSet::from([1]));
    }

    #[test]
    fn test_highlight_token_not_a_number() {
        let src = "---\ntitle: T\ndate: 2023-01-07\n---\n```ts {eight}\n1\n```\n";
        assert!(matches!(
            parse(src).unwrap_err(),
            ParseError::MalformedCodeBlockAnnotation { .. }
        ));
    }

    #[test]
    fn test_missing_metadata_fields() {
        let err = parse("---\ntitle: T\n---\nBody\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedMetadata { .. }));

        let err = parse("---\ndate: 2023-01-07\n---\nBody\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedMetadata { .. }));
    }

    #[test]
    fn test_unknown_widget() {
        let src = "---\ntitle: T\ndate: 2023-01-07\n---\n\nText\n\n<Newsletter />\n";
        assert_eq!(
            parse(src).unwrap_err(),
            ParseError::UnresolvedComponentReference {
                line: 8,
                name: "Newsletter".to_string()
            }
        );
    }

    #[test]
    fn test_inline_jsx_stays_prose() {
        let src = "---\ntitle: T\ndate: 2023-01-07\n---\n<Highlight>useQuery</Highlight> is the hook.\n";
        let record = parse(src).unwrap();
        assert_eq!(
            record.body,
            vec![paragraph("<Highlight>useQuery</Highlight> is the hook.")]
        );
    }

    #[test]
    fn test_inline_jsx_with_self_closing_tail_stays_prose() {
        let src = "---\ntitle: T\ndate: 2023-01-07\n---\n<Highlight>useQuery</Highlight> returns data.<br />\n";
        let record = parse(src).unwrap();
        assert_eq!(
            record.body,
            vec![paragraph("<Highlight>useQuery</Highlight> returns data.<br />")]
        );
    }

    #[test]
    fn test_unknown_block_component() {
        let src = "---\ntitle: T\ndate: 2023-01-07\n---\n<Newsletter>\nSubscribe\n</Newsletter>\n";
        assert_eq!(
            parse(src).unwrap_err(),
            ParseError::UnresolvedComponentReference {
                line: 5,
                name: "Newsletter".to_string()
            }
        );
    }

    #[test]
    fn test_known_widget_with_children() {
        let src = "---\ntitle: T\ndate: 2023-01-07\n---\nIntro\n\n<Comments>\nhi\n</Comments>\n";
        assert!(matches!(
            parse(src).unwrap_err(),
            ParseError::InvalidComponentProps { line: 7, .. }
        ));
    }

    #[test]
    fn test_block_component_detection() {
        assert_eq!(block_component("<Newsletter>"), Some("Newsletter"));
        assert_eq!(block_component("<Callout type=\"info\">"), Some("Callout"));
        assert_eq!(block_component("<Highlight>x</Highlight>"), None);
        assert_eq!(block_component("<Comments />"), None);
        assert_eq!(block_component("<div>"), None);
        assert!(opens_widget("<Translations"));
        assert!(opens_widget("<Comments/>"));
        assert!(!opens_widget("<Highlight>useQuery</Highlight> <br />"));
    }

    #[test]
    fn test_link_definitions_kept() {
        let src = "---\ntitle: T\ndate: 2023-01-07\n---\nSee [zod][1].\n\n[1]: https://zod.dev\n";
        let record = parse(src).unwrap();
        assert_eq!(
            record.body,
            vec![paragraph("See [zod][1]."), paragraph("[1]: https://zod.dev")]
        );
    }

    #[test]
    fn test_stub_body() {
        let record = parse("---\ntitle: Draft\ndate: 2023-01-07\n---\n").unwrap();
        assert!(record.is_stub());
    }

    #[test]
    fn test_heading_text() {
        assert_eq!(heading_text("## Title ##\n"), "Title");
        assert_eq!(heading_text("# C#"), "C#");
        assert_eq!(heading_text("#"), "");
        assert_eq!(heading_text("Setext\nacross\n---"), "Setext across");
    }
}
