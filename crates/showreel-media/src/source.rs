//! Source Resolution
//!
//! Maps a logical media identifier ("hero", a portfolio item id) to the
//! ordered list of encoded sources a player should try.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::capability::CapabilityProfile;
use crate::ConfigurationError;

/// Container format of an encoded source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    Mp4,
    Webm,
}

impl MediaFormat {
    /// MIME type for the `<source type>` attribute
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp4 => "video/mp4",
            Self::Webm => "video/webm",
        }
    }

    /// Infer the format from a URL's file extension
    pub fn from_url(url: &str) -> Option<Self> {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let ext = path.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "mp4" | "m4v" => Some(Self::Mp4),
            "webm" => Some(Self::Webm),
            _ => None,
        }
    }
}

/// One candidate encoding of a logical media item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSource {
    pub format: MediaFormat,
    pub url: String,
    /// Lower tries first
    pub priority: u32,
}

impl MediaSource {
    pub fn new(format: MediaFormat, url: &str, priority: u32) -> Self {
        Self {
            format,
            url: url.to_string(),
            priority,
        }
    }
}

/// Registered sources for one logical item
#[derive(Debug, Clone)]
struct MediaEntry {
    sources: Vec<MediaSource>,
    poster: Option<String>,
}

/// Registry of playable media, filled once at startup.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    base: Option<Url>,
    entries: HashMap<String, MediaEntry>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative source URLs against `base`
    pub fn with_base(base: Url) -> Self {
        Self {
            base: Some(base),
            entries: HashMap::new(),
        }
    }

    /// Register the candidate sources for `id`.
    ///
    /// Fails on an empty list, duplicate priorities or a URL that cannot
    /// be joined onto the asset base. Re-registering an id replaces it.
    pub fn register(
        &mut self,
        id: &str,
        sources: Vec<MediaSource>,
        poster: Option<&str>,
    ) -> Result<(), ConfigurationError> {
        if sources.is_empty() {
            return Err(ConfigurationError::EmptySourceList(id.to_string()));
        }

        let mut seen = Vec::with_capacity(sources.len());
        for source in &sources {
            if seen.contains(&source.priority) {
                return Err(ConfigurationError::DuplicatePriority {
                    id: id.to_string(),
                    priority: source.priority,
                });
            }
            seen.push(source.priority);
        }

        let sources = sources
            .into_iter()
            .map(|s| {
                let url = self.absolutize(&s.url)?;
                Ok(MediaSource { url, ..s })
            })
            .collect::<Result<Vec<_>, ConfigurationError>>()?;
        let poster = poster.map(|p| self.absolutize(p)).transpose()?;

        tracing::debug!("Registered media `{}` with {} sources", id, sources.len());
        self.entries
            .insert(id.to_string(), MediaEntry { sources, poster });
        Ok(())
    }

    fn absolutize(&self, raw: &str) -> Result<String, ConfigurationError> {
        let invalid = |e: url::ParseError| ConfigurationError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        };
        match &self.base {
            Some(base) => Ok(base.join(raw).map_err(invalid)?.to_string()),
            None => match Url::parse(raw) {
                Ok(url) => Ok(url.to_string()),
                // Site-relative paths are served as-is without a base
                Err(url::ParseError::RelativeUrlWithoutBase) => Ok(raw.to_string()),
                Err(e) => Err(invalid(e)),
            },
        }
    }

    /// Try-order candidate list for `id` under `profile`.
    ///
    /// The preferred format comes first, ties broken by registered
    /// priority. Priorities of the result are renumbered `1..=n`.
    pub fn resolve(
        &self,
        id: &str,
        profile: &CapabilityProfile,
    ) -> Result<Vec<MediaSource>, ConfigurationError> {
        let entry = self
            .entries
            .get(id)
            .ok_or_else(|| ConfigurationError::UnknownMedia(id.to_string()))?;

        let mut sources = entry.sources.clone();
        sources.sort_by_key(|s| (s.format != profile.preferred_format, s.priority));
        for (i, source) in sources.iter_mut().enumerate() {
            source.priority = i as u32 + 1;
        }
        Ok(sources)
    }

    /// Poster image shown while the video is not playing
    pub fn poster(&self, id: &str) -> Option<&str> {
        self.entries.get(id)?.poster.as_deref()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
