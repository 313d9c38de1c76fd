//! Showreel Site
//!
//! Composition root for the portfolio site: wires capability detection,
//! source registration, per-slot playback controllers and cookie consent
//! behind a single-threaded event loop.
//!
//! # Example
//! ```rust,ignore
//! use showreel_site::{Site, SiteConfig, SiteEvent, VideoSlot};
//!
//! let config = SiteConfig::load("site.json")?;
//! let mut site = Site::from_config(&config, &env)?;
//! site.mount(VideoSlot::Hero, element)?;
//! smol::block_on(showreel_site::run(&mut site, events));
//! ```

pub mod config;
pub mod store;
pub mod portfolio;
pub mod site;
pub mod event_loop;

pub use config::{MediaConfig, SiteConfig, SourceConfig};
pub use store::{Store, Subscription};
pub use portfolio::{Portfolio, PortfolioItem, ALL_CATEGORIES};
pub use site::{ConsentStore, FilterChange, Site, VideoSlot, HERO_MEDIA_ID};
pub use event_loop::{run, ClickAction, SiteEvent};

use showreel_consent::StorageError;
use showreel_media::{ConfigurationError, RetryError};

/// Site version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Site error
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    #[error("Invalid site config: {0}")]
    Config(String),

    #[error("Failed to parse site config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Media(#[from] ConfigurationError),

    #[error(transparent)]
    Retry(#[from] RetryError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("No video mounted in slot {0:?}")]
    UnknownSlot(VideoSlot),

    #[error("Unknown portfolio item {0}")]
    UnknownPortfolioItem(u32),
}
