//! Playback State Machine
//!
//! One [`PlaybackSession`] per rendered video. The session never touches
//! the element itself: every transition returns the [`Command`]s the
//! controller must apply, and element outcomes are fed back through
//! [`PlaybackSession::on_event`].
//!
//! ```text
//! Idle -> Loading -> { Playing, AwaitingInteraction, Error }
//! Playing <-> Paused
//! Error -> Loading            (retry)
//! *     -> Disposed           (teardown)
//! ```

use crate::element::{AttemptId, ElementEvent, ElementEventKind, MediaErrorCode, PlayRejection};
use crate::source::MediaSource;
use crate::{ConfigurationError, RetryError, DEFAULT_MAX_RETRIES};

/// Lifecycle state of one video instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading,
    Playing,
    /// Explicitly paused by the user
    Paused,
    /// Autoplay was refused; a gesture is needed
    AwaitingInteraction,
    Error(PlaybackFailure),
    Disposed,
}

/// Failure carried by [`PlaybackState::Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackFailure {
    #[error("all candidate sources failed to load")]
    AllSourcesFailed,
    #[error("playback error, try again")]
    ManualPlayFailure,
}

/// What the UI should offer on top of the video
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affordance {
    None,
    Spinner,
    PlayButton,
    Retry,
    PlaybackError,
    /// Retry budget spent; only a remount helps
    Unavailable,
}

/// Instruction for the media element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Load { attempt: AttemptId, source: MediaSource },
    Play { attempt: AttemptId, muted: bool },
    Pause,
    SetMuted(bool),
    Detach,
}

/// Who asked for the pending `play()`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayOrigin {
    Autoplay,
    User,
    Resume,
}

/// Per-session knobs, derived from `PlaybackOptions` and the profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    pub max_retries: u32,
    /// Attempt muted autoplay once the first source can play
    pub autoplay: bool,
    /// Unmute after a successful muted autoplay
    pub unmute_after_autoplay: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            autoplay: true,
            unmute_after_autoplay: false,
        }
    }
}

/// Playback lifecycle of a single video instance
#[derive(Debug)]
pub struct PlaybackSession {
    media_id: String,
    sources: Vec<MediaSource>,
    current_index: usize,
    state: PlaybackState,
    /// Loads issued since the last (re)start
    attempt_count: u32,
    retries: u32,
    attempt: AttemptId,
    visible: bool,
    /// Paused by the visibility gate while logically playing
    suspended: bool,
    has_played: bool,
    muted: bool,
    /// What to do once the current load reports `canplay`
    on_ready: Option<PlayOrigin>,
    pending_play: Option<PlayOrigin>,
    policy: SessionPolicy,
}

impl PlaybackSession {
    /// Create a session over a resolved, non-empty candidate list
    pub fn new(
        media_id: &str,
        sources: Vec<MediaSource>,
        policy: SessionPolicy,
    ) -> Result<Self, ConfigurationError> {
        if sources.is_empty() {
            return Err(ConfigurationError::EmptySourceList(media_id.to_string()));
        }
        Ok(Self {
            media_id: media_id.to_string(),
            sources,
            current_index: 0,
            state: PlaybackState::Idle,
            attempt_count: 0,
            retries: 0,
            attempt: AttemptId::default(),
            visible: true,
            suspended: false,
            has_played: false,
            muted: true,
            on_ready: None,
            pending_play: None,
            policy,
        })
    }

    // === Accessors ===

    pub fn media_id(&self) -> &str {
        &self.media_id
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn sources(&self) -> &[MediaSource] {
        &self.sources
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_source(&self) -> &MediaSource {
        &self.sources[self.current_index.min(self.sources.len() - 1)]
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    /// Id that incoming events must carry to be honoured
    pub fn attempt(&self) -> AttemptId {
        self.attempt
    }

    pub fn retries_used(&self) -> u32 {
        self.retries
    }

    pub fn retries_remaining(&self) -> u32 {
        self.policy.max_retries.saturating_sub(self.retries)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn has_played(&self) -> bool {
        self.has_played
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Frames are actually advancing
    pub fn is_rendering(&self) -> bool {
        self.state == PlaybackState::Playing && !self.suspended
    }

    /// The poster covers the video in every state but `Playing`
    pub fn shows_fallback(&self) -> bool {
        self.state != PlaybackState::Playing
    }

    pub fn affordance(&self) -> Affordance {
        match self.state {
            PlaybackState::Idle | PlaybackState::Loading => Affordance::Spinner,
            PlaybackState::Playing | PlaybackState::Disposed => Affordance::None,
            PlaybackState::Paused | PlaybackState::AwaitingInteraction => Affordance::PlayButton,
            PlaybackState::Error(PlaybackFailure::AllSourcesFailed) if self.retries_remaining() == 0 => {
                Affordance::Unavailable
            }
            PlaybackState::Error(PlaybackFailure::AllSourcesFailed) => Affordance::Retry,
            PlaybackState::Error(PlaybackFailure::ManualPlayFailure) => Affordance::PlaybackError,
        }
    }

    // === Transitions ===

    /// Begin loading the first candidate. No-op unless `Idle`.
    pub fn start(&mut self) -> Vec<Command> {
        if self.state != PlaybackState::Idle {
            tracing::trace!("[{}] start ignored in {:?}", self.media_id, self.state);
            return Vec::new();
        }
        self.on_ready = self.policy.autoplay.then_some(PlayOrigin::Autoplay);
        self.load_current()
    }

    /// Explicit user gesture asking for playback.
    ///
    /// Always attempts play: after every candidate failed, the list is
    /// walked again from the top without spending the retry budget.
    pub fn user_play(&mut self) -> Vec<Command> {
        match self.state {
            PlaybackState::Disposed => Vec::new(),
            PlaybackState::Idle | PlaybackState::Loading => {
                // Supersede whatever load is in flight
                self.on_ready = Some(PlayOrigin::User);
                self.load_current()
            }
            PlaybackState::Playing if !self.suspended => Vec::new(),
            PlaybackState::Error(PlaybackFailure::AllSourcesFailed) => {
                tracing::debug!("[{}] play requested after exhaustion, reloading", self.media_id);
                self.current_index = 0;
                self.attempt_count = 0;
                self.on_ready = Some(PlayOrigin::User);
                self.load_current()
            }
            PlaybackState::Playing
            | PlaybackState::Paused
            | PlaybackState::AwaitingInteraction
            | PlaybackState::Error(PlaybackFailure::ManualPlayFailure) => {
                self.attempt = self.attempt.next();
                self.suspended = false;
                self.request_play(PlayOrigin::User)
            }
        }
    }

    /// Start over from the first candidate after an error.
    pub fn retry(&mut self) -> Result<Vec<Command>, RetryError> {
        if !matches!(self.state, PlaybackState::Error(_)) {
            return Err(RetryError::NotInError);
        }
        if self.retries >= self.policy.max_retries {
            tracing::warn!("[{}] retry budget exhausted", self.media_id);
            return Err(RetryError::Exhausted {
                max: self.policy.max_retries,
            });
        }
        self.retries += 1;
        self.attempt_count = 0;
        self.current_index = 0;
        self.on_ready = self.policy.autoplay.then_some(PlayOrigin::Autoplay);
        tracing::debug!(
            "[{}] retry {}/{}",
            self.media_id,
            self.retries,
            self.policy.max_retries
        );
        Ok(self.load_current())
    }

    /// Explicit user pause.
    ///
    /// Before playback starts this cancels the queued play: a video still
    /// loading settles on the play button instead of starting.
    pub fn pause(&mut self) -> Vec<Command> {
        match self.state {
            PlaybackState::Playing => {
                self.state = PlaybackState::Paused;
                self.suspended = false;
                self.pending_play = None;
                vec![Command::Pause]
            }
            PlaybackState::Loading | PlaybackState::AwaitingInteraction => {
                self.on_ready = None;
                if self.pending_play.take().is_none() {
                    return Vec::new();
                }
                // canplay already fired; only the play() is being withdrawn
                self.state = PlaybackState::AwaitingInteraction;
                vec![Command::Pause]
            }
            _ => Vec::new(),
        }
    }

    /// Visibility changed. Leaving view suspends without leaving `Playing`.
    pub fn set_visible(&mut self, visible: bool) -> Vec<Command> {
        if self.state == PlaybackState::Disposed || visible == self.visible {
            return Vec::new();
        }
        self.visible = visible;

        if !visible {
            if self.state == PlaybackState::Idle {
                return Vec::new();
            }
            if self.state == PlaybackState::Playing {
                self.suspended = true;
            }
            tracing::trace!("[{}] left view, pausing", self.media_id);
            return vec![Command::Pause];
        }

        match self.state {
            PlaybackState::Playing if self.suspended => self.request_play(PlayOrigin::Resume),
            PlaybackState::AwaitingInteraction if self.has_played => {
                self.request_play(PlayOrigin::Resume)
            }
            _ => Vec::new(),
        }
    }

    /// Feed an element outcome back. Events from superseded attempts
    /// are dropped.
    pub fn on_event(&mut self, event: ElementEvent) -> Vec<Command> {
        if self.state == PlaybackState::Disposed {
            tracing::trace!("[{}] event after teardown dropped", self.media_id);
            return Vec::new();
        }
        if event.attempt != self.attempt {
            tracing::trace!(
                "[{}] stale {:?} from {:?} (current {:?})",
                self.media_id,
                event.kind,
                event.attempt,
                self.attempt
            );
            return Vec::new();
        }

        match event.kind {
            ElementEventKind::CanPlay => self.on_can_play(),
            ElementEventKind::LoadFailed(code) => self.on_load_failed(code),
            ElementEventKind::PlayStarted => self.on_play_started(),
            ElementEventKind::PlayRejected(reason) => self.on_play_rejected(reason),
        }
    }

    /// Teardown. Reachable from every state; nothing mutates afterwards.
    pub fn dispose(&mut self) -> Vec<Command> {
        if self.state == PlaybackState::Disposed {
            return Vec::new();
        }
        tracing::debug!("[{}] disposed from {:?}", self.media_id, self.state);
        self.state = PlaybackState::Disposed;
        self.pending_play = None;
        self.on_ready = None;
        vec![Command::Detach]
    }

    // === Internals ===

    fn load_current(&mut self) -> Vec<Command> {
        self.attempt = self.attempt.next();
        self.attempt_count += 1;
        self.state = PlaybackState::Loading;
        self.pending_play = None;
        self.suspended = false;
        let source = self.sources[self.current_index].clone();
        tracing::debug!(
            "[{}] loading candidate {}/{} ({:?}) as {:?}",
            self.media_id,
            self.current_index + 1,
            self.sources.len(),
            source.format,
            self.attempt
        );
        vec![Command::Load {
            attempt: self.attempt,
            source,
        }]
    }

    fn request_play(&mut self, origin: PlayOrigin) -> Vec<Command> {
        self.pending_play = Some(origin);
        vec![Command::Play {
            attempt: self.attempt,
            muted: self.muted,
        }]
    }

    fn on_can_play(&mut self) -> Vec<Command> {
        if self.state != PlaybackState::Loading {
            return Vec::new();
        }
        match self.on_ready.take() {
            Some(origin) => self.request_play(origin),
            None => {
                self.state = PlaybackState::AwaitingInteraction;
                Vec::new()
            }
        }
    }

    fn on_load_failed(&mut self, code: MediaErrorCode) -> Vec<Command> {
        if !matches!(
            self.state,
            PlaybackState::Loading
                | PlaybackState::Playing
                | PlaybackState::Paused
                | PlaybackState::AwaitingInteraction
        ) {
            return Vec::new();
        }
        tracing::debug!(
            "[{}] candidate {} failed: {:?}",
            self.media_id,
            self.current_index + 1,
            code
        );

        if self.current_index + 1 < self.sources.len() {
            self.current_index += 1;
            if self.state == PlaybackState::Paused {
                // Never restart a video the user paused
                self.on_ready = None;
            } else if self.on_ready.is_none() {
                self.on_ready = match self.pending_play {
                    Some(PlayOrigin::User) => Some(PlayOrigin::User),
                    _ => self.policy.autoplay.then_some(PlayOrigin::Autoplay),
                };
            }
            return self.load_current();
        }

        tracing::warn!(
            "[{}] all {} candidates failed",
            self.media_id,
            self.sources.len()
        );
        self.state = PlaybackState::Error(PlaybackFailure::AllSourcesFailed);
        self.pending_play = None;
        self.on_ready = None;
        self.suspended = false;
        Vec::new()
    }

    fn on_play_started(&mut self) -> Vec<Command> {
        let Some(origin) = self.pending_play.take() else {
            // Playback we no longer want, e.g. paused while play() was pending
            return if self.is_rendering() {
                Vec::new()
            } else {
                vec![Command::Pause]
            };
        };

        self.state = PlaybackState::Playing;
        self.has_played = true;
        self.suspended = false;
        tracing::debug!("[{}] playing ({:?})", self.media_id, origin);

        let mut commands = Vec::new();
        if origin == PlayOrigin::Autoplay && self.policy.unmute_after_autoplay && self.muted {
            self.muted = false;
            commands.push(Command::SetMuted(false));
        }
        if !self.visible {
            self.suspended = true;
            commands.push(Command::Pause);
        }
        commands
    }

    fn on_play_rejected(&mut self, reason: PlayRejection) -> Vec<Command> {
        let Some(origin) = self.pending_play.take() else {
            return Vec::new();
        };

        match origin {
            PlayOrigin::Autoplay | PlayOrigin::Resume => {
                tracing::debug!(
                    "[{}] autoplay rejected ({:?}), waiting for a gesture",
                    self.media_id,
                    reason
                );
                self.state = PlaybackState::AwaitingInteraction;
                self.suspended = false;
            }
            PlayOrigin::User => {
                tracing::warn!("[{}] manual play failed: {:?}", self.media_id, reason);
                self.state = PlaybackState::Error(PlaybackFailure::ManualPlayFailure);
                self.suspended = false;
            }
        }
        Vec::new()
    }
}
