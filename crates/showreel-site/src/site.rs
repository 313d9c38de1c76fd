//! Site
//!
//! Owns the process-wide state and one [`PlaybackController`] per rendered
//! video slot. Each slot is isolated: a failing preview never touches the
//! hero or its siblings.

use std::collections::BTreeMap;
use std::fmt;

use showreel_consent::{
    storage_available, ConsentAction, ConsentGate, ConsentState, FileStorage, KeyValueStore,
    MemoryStorage,
};
use showreel_media::{
    detect, CapabilityProfile, ClientEnvironment, ConfigurationError, MediaElement,
    PlaybackController, PlaybackOptions, PlaybackState, SourceRegistry,
};

use crate::config::SiteConfig;
use crate::event_loop::{ClickAction, SiteEvent};
use crate::portfolio::Portfolio;
use crate::store::{Store, Subscription};
use crate::SiteError;

/// Media id of the hero background video
pub const HERO_MEDIA_ID: &str = "hero";

/// Where a video is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VideoSlot {
    Hero,
    /// Grid preview of a portfolio item
    Preview(u32),
}

/// Consent gate with change notification for the banner
pub struct ConsentStore {
    gate: ConsentGate<Box<dyn KeyValueStore>>,
    state: Store<ConsentState>,
}

impl fmt::Debug for ConsentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsentStore")
            .field("state", &self.state.get())
            .finish()
    }
}

impl ConsentStore {
    pub fn new(storage: Box<dyn KeyValueStore>) -> Self {
        let gate = ConsentGate::new(storage);
        let state = Store::new(gate.get_status());
        Self { gate, state }
    }

    pub fn state(&self) -> ConsentState {
        self.state.get()
    }

    pub fn is_banner_visible(&self) -> bool {
        self.state.with(|s| s.is_banner_visible())
    }

    pub fn apply(&mut self, action: ConsentAction) -> Result<ConsentState, SiteError> {
        match self.gate.apply(action) {
            Ok(state) => {
                tracing::info!("Consent {:?} -> {:?}", action, state.status);
                self.state.set(state);
                Ok(state)
            }
            Err(e) => {
                // A partial write may have landed; resync with storage
                let state = self.gate.get_status();
                tracing::warn!("Consent {:?} failed, storage now {:?}", action, state.status);
                self.state.set(state);
                Err(e.into())
            }
        }
    }

    pub fn subscribe(&self, f: impl Fn(&ConsentState) + 'static) -> Subscription {
        self.state.subscribe(f)
    }

    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.state.unsubscribe(subscription)
    }
}

/// Preview slots affected by a filter change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterChange {
    /// Left the grid; their players were unmounted
    pub hidden: Vec<u32>,
    /// Entered the grid; the rendering layer mounts them
    pub shown: Vec<u32>,
}

/// Portfolio site
pub struct Site<E: MediaElement> {
    capabilities: Store<CapabilityProfile>,
    registry: SourceRegistry,
    hero_options: PlaybackOptions,
    preview_options: PlaybackOptions,
    portfolio: Portfolio,
    consent: ConsentStore,
    players: BTreeMap<VideoSlot, PlaybackController<E>>,
}

impl<E: MediaElement> Site<E> {
    /// Build the site from `config` with consent kept in `storage`
    pub fn new(
        config: &SiteConfig,
        env: &ClientEnvironment,
        storage: Box<dyn KeyValueStore>,
    ) -> Result<Self, SiteError> {
        let registry = config.build_registry()?;
        if !registry.contains(HERO_MEDIA_ID) {
            return Err(ConfigurationError::UnknownMedia(HERO_MEDIA_ID.to_string()).into());
        }

        let profile = detect(env);
        tracing::info!(
            "Site built: {} media, {} portfolio items, mobile={} prefers {:?}",
            registry.len(),
            config.portfolio.len(),
            profile.is_mobile,
            profile.preferred_format
        );

        Ok(Self {
            capabilities: Store::new(profile),
            registry,
            hero_options: config.playback.clone(),
            preview_options: config.preview_options(),
            portfolio: Portfolio::new(config.portfolio.clone()),
            consent: ConsentStore::new(storage),
            players: BTreeMap::new(),
        })
    }

    /// Build the site with consent persisted at the configured path.
    ///
    /// Unusable storage degrades to an in-memory store.
    pub fn from_config(config: &SiteConfig, env: &ClientEnvironment) -> Result<Self, SiteError> {
        let storage: Box<dyn KeyValueStore> = match &config.storage_path {
            Some(path) => {
                let mut file = FileStorage::open(path)?;
                if storage_available(&mut file) {
                    Box::new(file)
                } else {
                    tracing::warn!("Storage {} unusable, consent kept in memory", path.display());
                    Box::new(MemoryStorage::new())
                }
            }
            None => Box::new(MemoryStorage::new()),
        };
        Self::new(config, env, storage)
    }

    /// Create a controller for `slot` around `element` and start loading.
    ///
    /// A slot that is already mounted is torn down first.
    pub fn mount(&mut self, slot: VideoSlot, element: E) -> Result<(), SiteError> {
        let media_id = self.media_id(slot)?.to_string();
        let profile = self.capabilities.get();
        let options = match slot {
            VideoSlot::Hero => &self.hero_options,
            VideoSlot::Preview(_) => &self.preview_options,
        };
        let mut controller =
            PlaybackController::new(&media_id, &self.registry, &profile, options, element)?;

        if let Some(mut previous) = self.players.remove(&slot) {
            previous.unmount();
        }
        controller.mount();
        tracing::info!("Mounted {:?} ({})", slot, media_id);
        self.players.insert(slot, controller);
        Ok(())
    }

    /// Tear down `slot`, returning its element
    pub fn unmount(&mut self, slot: VideoSlot) -> Option<E> {
        let controller = self.players.remove(&slot)?;
        tracing::info!("Unmounted {:?}", slot);
        Some(controller.into_element())
    }

    /// Viewport resize. Returns true if the mobile classification flipped.
    ///
    /// Mounted players keep their resolved sources; new mounts use the
    /// updated profile.
    pub fn resize(&mut self, width: u32) -> bool {
        match self.capabilities.get().resized(width) {
            Some(profile) => {
                tracing::info!("Viewport {}px: mobile={}", width, profile.is_mobile);
                self.capabilities.set(profile);
                true
            }
            None => false,
        }
    }

    pub fn handle(&mut self, event: SiteEvent) -> Result<(), SiteError> {
        match event {
            SiteEvent::Resize(width) => {
                self.resize(width);
            }
            SiteEvent::Media { slot, event } => match self.players.get_mut(&slot) {
                Some(player) => player.handle_event(event),
                None => tracing::trace!("Dropping {:?} for unmounted {:?}", event.kind, slot),
            },
            SiteEvent::Intersection { slot, ratio } => {
                if let Some(player) = self.players.get_mut(&slot) {
                    player.observe_intersection(ratio);
                }
            }
            SiteEvent::PointerEnter(slot) => match self.players.get_mut(&slot) {
                Some(player) => player.user_play(),
                None => tracing::trace!("Hover over unmounted {:?}", slot),
            },
            SiteEvent::PointerLeave(slot) => {
                if let Some(player) = self.players.get_mut(&slot) {
                    player.pause();
                }
            }
            SiteEvent::Click { slot, action } => {
                let player = self
                    .players
                    .get_mut(&slot)
                    .ok_or(SiteError::UnknownSlot(slot))?;
                match action {
                    ClickAction::Play => player.user_play(),
                    ClickAction::Pause => player.pause(),
                    ClickAction::Retry => player.retry()?,
                }
            }
            SiteEvent::Consent(action) => {
                self.consent.apply(action)?;
            }
        }
        Ok(())
    }

    /// Change the grid filter, unmounting previews that left the grid
    pub fn set_filter(&mut self, category: &str) -> FilterChange {
        let before = self.visible_preview_ids();
        self.portfolio.set_filter(category);
        let after = self.visible_preview_ids();

        let hidden: Vec<u32> = before.iter().copied().filter(|id| !after.contains(id)).collect();
        let shown: Vec<u32> = after.iter().copied().filter(|id| !before.contains(id)).collect();
        for id in &hidden {
            self.unmount(VideoSlot::Preview(*id));
        }
        tracing::debug!("Filter {}: {} hidden, {} shown", category, hidden.len(), shown.len());
        FilterChange { hidden, shown }
    }

    /// Poster for `slot`, falling back to the portfolio thumbnail
    pub fn poster(&self, slot: VideoSlot) -> Option<&str> {
        let media_id = self.media_id(slot).ok()?;
        self.registry.poster(media_id).or_else(|| match slot {
            VideoSlot::Preview(id) => self.portfolio.get(id).map(|item| item.thumbnail.as_str()),
            VideoSlot::Hero => None,
        })
    }

    /// Whether the still image covers `slot`.
    ///
    /// The hero shows it whenever it is not playing. A preview keeps its
    /// thumbnail until it first plays and after a failure; once played, a
    /// paused preview shows its last frame.
    pub fn shows_poster(&self, slot: VideoSlot) -> bool {
        let Some(player) = self.players.get(&slot) else {
            return true;
        };
        match slot {
            VideoSlot::Hero => player.shows_fallback(),
            VideoSlot::Preview(_) => {
                !player.session().has_played() || matches!(player.state(), PlaybackState::Error(_))
            }
        }
    }

    pub fn player(&self, slot: VideoSlot) -> Option<&PlaybackController<E>> {
        self.players.get(&slot)
    }

    pub fn player_mut(&mut self, slot: VideoSlot) -> Option<&mut PlaybackController<E>> {
        self.players.get_mut(&slot)
    }

    pub fn state(&self, slot: VideoSlot) -> Option<PlaybackState> {
        self.players.get(&slot).map(|p| p.state())
    }

    pub fn mounted(&self) -> impl Iterator<Item = VideoSlot> + '_ {
        self.players.keys().copied()
    }

    pub fn capabilities(&self) -> CapabilityProfile {
        self.capabilities.get()
    }

    pub fn capability_store(&self) -> &Store<CapabilityProfile> {
        &self.capabilities
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn consent(&self) -> &ConsentStore {
        &self.consent
    }

    pub fn consent_mut(&mut self) -> &mut ConsentStore {
        &mut self.consent
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn portfolio_mut(&mut self) -> &mut Portfolio {
        &mut self.portfolio
    }

    fn media_id(&self, slot: VideoSlot) -> Result<&str, SiteError> {
        match slot {
            VideoSlot::Hero => Ok(HERO_MEDIA_ID),
            VideoSlot::Preview(id) => self
                .portfolio
                .get(id)
                .map(|item| item.media.as_str())
                .ok_or(SiteError::UnknownPortfolioItem(id)),
        }
    }

    fn visible_preview_ids(&self) -> Vec<u32> {
        self.portfolio.visible().iter().map(|item| item.id).collect()
    }
}
