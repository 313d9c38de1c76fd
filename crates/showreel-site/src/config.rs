//! Site Configuration
//!
//! JSON site manifest: asset base, media table, portfolio catalog,
//! playback options and where consent is persisted.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use showreel_media::{
    ConfigurationError, MediaFormat, MediaSource, PlaybackOptions, SourceRegistry,
};
use url::Url;

use crate::portfolio::PortfolioItem;
use crate::SiteError;

/// One encoded source as written in the manifest.
///
/// `format` defaults to the URL's extension and `priority` to the
/// position in the list (1-based).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceConfig {
    pub url: String,
    #[serde(default)]
    pub format: Option<MediaFormat>,
    #[serde(default)]
    pub priority: Option<u32>,
}

/// Sources and poster of one logical media item
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MediaConfig {
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub poster: Option<String>,
}

impl MediaConfig {
    fn to_sources(&self, id: &str) -> Result<Vec<MediaSource>, SiteError> {
        self.sources
            .iter()
            .enumerate()
            .map(|(i, source)| {
                let format = source
                    .format
                    .or_else(|| MediaFormat::from_url(&source.url))
                    .ok_or_else(|| {
                        SiteError::Config(format!(
                            "media `{}`: cannot infer format of `{}`",
                            id, source.url
                        ))
                    })?;
                let priority = source.priority.unwrap_or(i as u32 + 1);
                Ok(MediaSource::new(format, &source.url, priority))
            })
            .collect()
    }
}

/// Site manifest
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Relative media URLs are joined onto this
    pub asset_base: Option<Url>,
    pub media: BTreeMap<String, MediaConfig>,
    pub portfolio: Vec<PortfolioItem>,
    /// Options for the hero player
    pub playback: PlaybackOptions,
    /// Options for portfolio previews; `playback` when unset
    pub previews: Option<PlaybackOptions>,
    /// Previews play on pointer hover only, never on their own
    pub hover_previews: bool,
    /// Consent is kept in memory when unset
    pub storage_path: Option<PathBuf>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            asset_base: None,
            media: BTreeMap::new(),
            portfolio: Vec::new(),
            playback: PlaybackOptions::default(),
            previews: None,
            hover_previews: true,
            storage_path: None,
        }
    }
}

impl SiteConfig {
    /// Effective options for portfolio preview players
    pub fn preview_options(&self) -> PlaybackOptions {
        let mut options = self.previews.clone().unwrap_or_else(|| self.playback.clone());
        if self.hover_previews {
            options.autoplay = false;
        }
        options
    }

    pub fn from_json(json: &str) -> Result<Self, SiteError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SiteError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&contents)?;
        tracing::debug!(
            "Loaded site config {} ({} media, {} portfolio items)",
            path.as_ref().display(),
            config.media.len(),
            config.portfolio.len()
        );
        Ok(config)
    }

    /// Register every media entry and check the portfolio against it.
    ///
    /// Any defect here is fatal at startup.
    pub fn build_registry(&self) -> Result<SourceRegistry, SiteError> {
        let mut registry = match &self.asset_base {
            Some(base) => SourceRegistry::with_base(base.clone()),
            None => SourceRegistry::new(),
        };

        for (id, media) in &self.media {
            let sources = media.to_sources(id)?;
            registry.register(id, sources, media.poster.as_deref())?;
        }

        let mut ids = HashSet::new();
        for item in &self.portfolio {
            if !ids.insert(item.id) {
                return Err(SiteError::Config(format!(
                    "duplicate portfolio id {}",
                    item.id
                )));
            }
            if !registry.contains(&item.media) {
                return Err(ConfigurationError::UnknownMedia(item.media.clone()).into());
            }
        }

        Ok(registry)
    }
}
