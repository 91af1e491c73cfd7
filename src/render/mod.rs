//! Rendering - turns a content record into displayable output
//!
//! The site renderer is an external collaborator; this module defines the
//! seam it plugs into and ships a reference HTML implementation.

mod html;

use anyhow::Result;
use serde::Serialize;

use crate::config::SiteConfig;
use crate::content::ContentRecord;

pub use html::HtmlRenderer;

/// Settings a renderer needs, passed in rather than read from globals
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub site_title: String,
    pub site_url: String,
    pub language: String,
    /// syntect theme name
    pub theme: String,
    pub line_numbers: bool,
    pub words_per_minute: usize,
}

impl From<&SiteConfig> for RenderConfig {
    fn from(config: &SiteConfig) -> Self {
        Self {
            site_title: config.title.clone(),
            site_url: config.permalink(""),
            language: config.language.clone(),
            theme: config.highlight.theme.clone(),
            line_numbers: config.highlight.line_number,
            words_per_minute: config.words_per_minute.max(1),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::from(&SiteConfig::default())
    }
}

/// One entry of the table of contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub level: u8,
    pub text: String,
    /// Anchor id of the heading
    pub id: String,
}

/// Renderer output for one record
#[derive(Debug, Clone, Serialize)]
pub struct Rendered {
    /// Article body markup
    pub body: String,
    pub toc: Vec<TocEntry>,
    pub reading_minutes: usize,
}

/// Consumes a record read-only and produces displayable output
pub trait Renderer {
    fn render(&self, record: &ContentRecord) -> Result<Rendered>;
}
