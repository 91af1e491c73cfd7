//! Content record model

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::widget::Widget;
use super::{parser, writer, ParseError};

/// One article: metadata plus an ordered body of block nodes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentRecord {
    /// Article title, never empty
    pub title: String,

    /// Short summary, empty when the source has none
    pub description: String,

    /// Publication date
    pub date: NaiveDate,

    /// Path to the banner image
    pub banner: Option<String>,

    /// Tag labels
    pub tags: BTreeSet<String>,

    /// Front-matter keys without a dedicated field
    pub extra: BTreeMap<String, serde_yaml::Value>,

    /// Body blocks in source order
    pub body: Vec<BlockNode>,
}

impl ContentRecord {
    /// Parse a record from source text
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        parser::parse(source)
    }

    /// Create a stub record with no body
    pub fn stub(title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            date,
            banner: None,
            tags: BTreeSet::new(),
            extra: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    /// Serialize back to canonical source text
    pub fn to_source(&self) -> Result<String, serde_yaml::Error> {
        writer::write(self)
    }

    /// A stub has metadata but no body yet
    pub fn is_stub(&self) -> bool {
        self.body.is_empty()
    }

    /// URL-friendly name derived from the title
    pub fn slug(&self) -> String {
        slug::slugify(&self.title)
    }

    pub fn code_blocks(&self) -> impl Iterator<Item = &CodeBlock> {
        self.body.iter().filter_map(|node| match node {
            BlockNode::CodeBlock(block) => Some(block),
            _ => None,
        })
    }

    pub fn widgets(&self) -> impl Iterator<Item = &Widget> {
        self.body.iter().filter_map(|node| match node {
            BlockNode::Component { widget } => Some(widget),
            _ => None,
        })
    }

    /// (level, text) for every heading, in order
    pub fn headings(&self) -> impl Iterator<Item = (u8, &str)> {
        self.body.iter().filter_map(|node| match node {
            BlockNode::Heading { level, text } => Some((*level, text.as_str())),
            _ => None,
        })
    }

    /// Number of whitespace-separated words in prose and headings
    pub fn word_count(&self) -> usize {
        self.body
            .iter()
            .map(|node| match node {
                BlockNode::Paragraph { content } => content.split_whitespace().count(),
                BlockNode::Heading { text, .. } => text.split_whitespace().count(),
                _ => 0,
            })
            .sum()
    }
}

/// One unit of article body content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockNode {
    /// Prose, kept as its markdown source
    Paragraph { content: String },
    /// Section heading, level 1 to 6
    Heading { level: u8, text: String },
    /// Annotated code sample
    CodeBlock(CodeBlock),
    /// Embedded widget reference
    Component { widget: Widget },
}

/// A fenced code sample with its annotations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeBlock {
    pub language: Option<String>,
    pub title: Option<String>,
    /// 1-based line numbers to mark
    pub highlighted_lines: BTreeSet<usize>,
    /// Code lines joined by `\n`, without a trailing newline
    pub source: String,
}

impl CodeBlock {
    pub fn new(language: Option<String>, source: impl Into<String>) -> Self {
        Self {
            language,
            title: None,
            highlighted_lines: BTreeSet::new(),
            source: source.into(),
        }
    }

    pub fn line_count(&self) -> usize {
        line_count(&self.source)
    }

    pub fn is_highlighted(&self, line: usize) -> bool {
        self.highlighted_lines.contains(&line)
    }
}

/// Count lines of a `\n`-joined block; an empty block has none
pub fn line_count(source: &str) -> usize {
    if source.is_empty() {
        0
    } else {
        source.split('\n').count()
    }
}
