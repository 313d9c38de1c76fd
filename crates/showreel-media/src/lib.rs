//! Showreel Media
//!
//! Video playback lifecycle for the Showreel site.
//!
//! Features:
//! - Capability detection (mobile, Safari-like engines, preferred format)
//! - Source resolution with per-profile try-order
//! - Playback state machine with stale-event rejection
//! - Visibility-driven suspend/resume
//! - One controller type for hero and preview players

pub mod capability;
pub mod source;
pub mod element;
pub mod playback;
pub mod visibility;
pub mod options;
pub mod controller;

pub use capability::{detect, CapabilityProfile, ClientEnvironment, ScreenSize, MOBILE_BREAKPOINT};
pub use source::{MediaFormat, MediaSource, SourceRegistry};
pub use element::{
    AttemptId, ElementEvent, ElementEventKind, MediaElement, MediaErrorCode,
    NetworkState, PlayRejection, ReadyState, VideoElement,
};
pub use playback::{Affordance, Command, PlaybackFailure, PlaybackSession, PlaybackState, SessionPolicy};
pub use visibility::{intersection_ratio, Rect, VisibilityGate};
pub use options::{MobilePolicy, PlaybackOptions, SoundPolicy};
pub use controller::PlaybackController;

/// Retries allowed after the candidate list is exhausted
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Registration or resolution defect. Fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("No sources registered for media `{0}`")]
    UnknownMedia(String),

    #[error("Empty source list for media `{0}`")]
    EmptySourceList(String),

    #[error("Duplicate priority {priority} for media `{id}`")]
    DuplicatePriority { id: String, priority: u32 },

    #[error("Invalid source URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Why a retry request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RetryError {
    #[error("Retry is only possible from the error state")]
    NotInError,

    #[error("Retry limit of {max} reached")]
    Exhausted { max: u32 },
}
