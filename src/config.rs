use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

use crate::post_index::RECENT_POSTS;
use crate::source::{ContentSource, LocalFiles, RemoteFiles};

const CONFIG_FILE: &str = "site.toml";

/// Site settings from `site.toml`, overridable through the environment.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SiteConfig {
    /// Appended to every post title.
    pub owner: String,
    /// Local directory holding the layout, fragments, index and posts.
    pub content_dir: PathBuf,
    /// Fetch content from this base URL instead of `content_dir`.
    pub content_url: Option<String>,
    pub port: u16,
    pub recent_posts: usize,
    #[serde(skip)]
    pub is_development: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            owner: "Site Owner".to_string(),
            content_dir: PathBuf::from("content"),
            content_url: None,
            port: 8080,
            recent_posts: RECENT_POSTS,
            is_development: false,
        }
    }
}

impl SiteConfig {
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid site configuration")
    }

    /// Read `$SITE_CONFIG` (or `site.toml` when present) and apply
    /// `PORT`, `CONTENT_DIR`, `CONTENT_URL` and `RUST_ENV`.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("SITE_CONFIG").ok().map(PathBuf::from);
        let mut config = match path {
            Some(path) => Self::read(&path)?,
            None if Path::new(CONFIG_FILE).exists() => Self::read(Path::new(CONFIG_FILE))?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn read(path: &Path) -> anyhow::Result<Self> {
        info!(path = %path.display(), "reading site configuration");
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&text)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(port) = var("PORT").and_then(|p| p.parse().ok()) {
            self.port = port;
        }
        if let Some(dir) = var("CONTENT_DIR") {
            self.content_dir = PathBuf::from(dir);
        }
        if let Some(url) = var("CONTENT_URL").filter(|url| !url.is_empty()) {
            self.content_url = Some(url);
        }
        self.is_development = var("RUST_ENV").is_some_and(|v| v == "development");
    }

    pub fn content_source(&self) -> ContentSource {
        match &self.content_url {
            Some(url) => ContentSource::Remote(RemoteFiles::new(url)),
            None => ContentSource::Local(LocalFiles::new(&self.content_dir)),
        }
    }
}
