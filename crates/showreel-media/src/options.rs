//! Playback Options
//!
//! One options structure configures every player on the site, replacing
//! per-variant branching.

use serde::{Deserialize, Serialize};

use crate::capability::CapabilityProfile;
use crate::playback::SessionPolicy;
use crate::source::MediaFormat;
use crate::visibility::DEFAULT_THRESHOLD;
use crate::DEFAULT_MAX_RETRIES;

/// Whether background videos may ever play with sound
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SoundPolicy {
    #[default]
    AlwaysMuted,
    /// Unmute after muted autoplay succeeds, if the profile allows sound
    UnmuteWhenAllowed,
}

/// Autoplay behaviour on mobile profiles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MobilePolicy {
    /// Muted autoplay first, gesture fallback
    #[default]
    Autoplay,
    /// Never autoplay on mobile; wait for a tap
    GestureOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackOptions {
    /// Start playing once the first source can play. Off for players
    /// that wait for hover or a click.
    pub autoplay: bool,
    pub max_retries: u32,
    pub visibility_threshold: f32,
    pub sound: SoundPolicy,
    pub mobile: MobilePolicy,
    /// Force a format to the front regardless of the detected engine
    pub format: Option<MediaFormat>,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            autoplay: true,
            max_retries: DEFAULT_MAX_RETRIES,
            visibility_threshold: DEFAULT_THRESHOLD,
            sound: SoundPolicy::AlwaysMuted,
            mobile: MobilePolicy::Autoplay,
            format: None,
        }
    }
}

impl PlaybackOptions {
    /// Defaults for a player that only plays when asked
    pub fn on_demand() -> Self {
        Self {
            autoplay: false,
            ..Self::default()
        }
    }

    /// Profile used for source ordering
    pub fn effective_profile(&self, profile: &CapabilityProfile) -> CapabilityProfile {
        match self.format {
            Some(format) => CapabilityProfile {
                preferred_format: format,
                ..*profile
            },
            None => *profile,
        }
    }

    /// Session knobs for a player created under `profile`
    pub fn policy(&self, profile: &CapabilityProfile) -> SessionPolicy {
        SessionPolicy {
            max_retries: self.max_retries,
            autoplay: self.autoplay
                && !(profile.is_mobile && self.mobile == MobilePolicy::GestureOnly),
            unmute_after_autoplay: self.sound == SoundPolicy::UnmuteWhenAllowed
                && profile.supports_autoplay_with_sound,
        }
    }
}
