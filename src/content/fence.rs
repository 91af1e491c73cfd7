//! Fenced code block annotations
//!
//! The info string after an opening fence carries the language, an optional
//! title and an optional set of lines to mark:
//!
//! ```text
//! ts title="useTodos.ts" {8}
//! tsx:title=queries.tsx {1,3-5}
//! js{2}
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use super::record::{line_count, CodeBlock};
use super::ParseError;

lazy_static! {
    static ref LINE_TOKEN: Regex = Regex::new(r"^(\d+)(?:\s*-\s*(\d+))?$").unwrap();
}

/// Parsed info string of a fenced code block
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FenceInfo {
    pub language: Option<String>,
    pub title: Option<String>,
    /// Highlight ranges as written, not yet checked against the block length
    pub ranges: Vec<RangeInclusive<usize>>,
}

impl FenceInfo {
    /// Parse an info string found on source line `line`
    pub fn parse(info: &str, line: usize) -> Result<Self, ParseError> {
        let mut fence = FenceInfo::default();
        let bytes = info.as_bytes();
        let mut pos = 0;
        let mut first = true;

        while let Some(c) = info[pos..].chars().next() {
            if c.is_whitespace() {
                pos += c.len_utf8();
                continue;
            }

            if c == '{' {
                let close = info[pos..].find('}').ok_or_else(|| {
                    ParseError::annotation(line, format!("unterminated line set in `{}`", info))
                })?;
                let ranges = parse_line_set(&info[pos + 1..pos + close], line)?;
                fence.ranges.extend(ranges);
                pos += close + 1;
                first = false;
                continue;
            }

            let end = info[pos..]
                .find(|ch: char| ch.is_whitespace() || ch == '{' || ch == '=')
                .map_or(info.len(), |i| pos + i);
            let word = &info[pos..end];

            if end < info.len() && bytes[end] == b'=' {
                let (value, next) = read_value(info, end + 1);
                let is_title = word == "title" || (first && word.ends_with(":title"));
                if is_title && value.contains('"') && value.contains('\'') {
                    return Err(ParseError::annotation(
                        line,
                        format!("title `{}` mixes both quote kinds", value),
                    ));
                }
                if word == "title" {
                    fence.title = Some(value.to_string());
                } else if let Some(language) = word.strip_suffix(":title").filter(|_| first) {
                    fence.language = Some(language.to_string()).filter(|l| !l.is_empty());
                    fence.title = Some(value.to_string());
                } else {
                    tracing::debug!("Ignoring fence attribute `{}` at line {}", word, line);
                }
                pos = next;
            } else {
                if first {
                    fence.language = Some(word.to_string());
                } else {
                    tracing::debug!("Ignoring fence token `{}` at line {}", word, line);
                }
                pos = end;
            }
            first = false;
        }

        Ok(fence)
    }

    /// Attach the annotations to a block body, checking every marked line exists
    pub fn into_code_block(self, source: String, line: usize) -> Result<CodeBlock, ParseError> {
        let count = line_count(&source);
        let mut highlighted_lines = BTreeSet::new();

        for range in self.ranges {
            if *range.start() < 1 || *range.end() > count {
                return Err(ParseError::annotation(
                    line,
                    format!(
                        "highlighted lines {}-{} fall outside the block's {} line(s)",
                        range.start(),
                        range.end(),
                        count
                    ),
                ));
            }
            highlighted_lines.extend(range);
        }

        Ok(CodeBlock {
            language: self.language,
            title: self.title,
            highlighted_lines,
            source,
        })
    }
}

/// Read an attribute value starting at `start`; returns (value, position after it)
fn read_value(info: &str, start: usize) -> (&str, usize) {
    let rest = &info[start..];
    match rest.chars().next() {
        Some(quote @ ('"' | '\'')) => match rest[1..].find(quote) {
            Some(close) => (&rest[1..1 + close], start + close + 2),
            None => (&rest[1..], info.len()),
        },
        _ => {
            let end = rest
                .find(|ch: char| ch.is_whitespace() || ch == '{')
                .unwrap_or(rest.len());
            (&rest[..end], start + end)
        }
    }
}

/// Parse the inside of `{...}`: comma separated line numbers and ranges
fn parse_line_set(set: &str, line: usize) -> Result<Vec<RangeInclusive<usize>>, ParseError> {
    let mut ranges = Vec::new();

    for token in set.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let caps = LINE_TOKEN.captures(token).ok_or_else(|| {
            ParseError::annotation(line, format!("`{}` is not a line number or range", token))
        })?;

        let parse = |s: &str| {
            s.parse::<usize>().map_err(|e| {
                ParseError::annotation(line, format!("`{}` is not a line number: {}", s, e))
            })
        };
        let start = parse(&caps[1])?;
        let end = match caps.get(2) {
            Some(end) => parse(end.as_str())?,
            None => start,
        };

        if start > end {
            return Err(ParseError::annotation(
                line,
                format!("range `{}` runs backwards", token),
            ));
        }
        ranges.push(start..=end);
    }

    Ok(ranges)
}

/// Render the info string for a code block
pub fn format_info(block: &CodeBlock) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(language) = &block.language {
        parts.push(language.clone());
    }

    if let Some(title) = &block.title {
        let quote = if title.contains('"') { '\'' } else { '"' };
        parts.push(format!("title={}{}{}", quote, title, quote));
    }

    if !block.highlighted_lines.is_empty() {
        parts.push(format!("{{{}}}", format_line_set(&block.highlighted_lines)));
    }

    parts.join(" ")
}

/// Compress a line set into `1,3-5` form
pub fn format_line_set(lines: &BTreeSet<usize>) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut iter = lines.iter().copied().peekable();

    while let Some(start) = iter.next() {
        let mut end = start;
        while iter.peek() == Some(&(end + 1)) {
            end += 1;
            iter.next();
        }
        if start == end {
            out.push(start.to_string());
        } else {
            out.push(format!("{}-{}", start, end));
        }
    }

    out.join(",")
}
