//! mdx-article: typed content records for MDX blog articles
//!
//! This crate parses article sources (front matter, prose, annotated code
//! fences and widget tags) into a [`content::ContentRecord`], writes records
//! back to canonical source text, and renders them through the
//! [`render::Renderer`] seam.

pub mod commands;
pub mod config;
pub mod content;
pub mod render;

use anyhow::Result;
use std::path::Path;

/// A blog workspace: configuration plus the directories it points at
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: std::path::PathBuf,
    /// Content (article source) directory
    pub content_dir: std::path::PathBuf,
    /// Public (output) directory
    pub public_dir: std::path::PathBuf,
}

impl Blog {
    /// Create a new Blog instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        let content_dir = base_dir.join(&config.content_dir);
        let public_dir = base_dir.join(&config.public_dir);

        Ok(Self {
            config,
            base_dir,
            content_dir,
            public_dir,
        })
    }

    /// Reference HTML renderer configured for this site
    pub fn renderer(&self) -> render::HtmlRenderer {
        render::HtmlRenderer::new(render::RenderConfig::from(&self.config))
    }

    /// Check every article
    pub fn check(&self) -> Result<commands::check::CheckSummary> {
        commands::check::run(self)
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }

    /// Create a new stub article
    pub fn new_article(&self, title: &str) -> Result<std::path::PathBuf> {
        commands::new::create_article(self, title, None)
    }
}
