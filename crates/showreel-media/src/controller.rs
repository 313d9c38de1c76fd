//! Playback Controller
//!
//! Binds a [`PlaybackSession`] and a [`VisibilityGate`] to one
//! [`MediaElement`]. The hero background and every portfolio preview use
//! this same type with different options.

use crate::capability::CapabilityProfile;
use crate::element::{ElementEvent, MediaElement};
use crate::options::PlaybackOptions;
use crate::playback::{Affordance, Command, PlaybackSession, PlaybackState};
use crate::source::SourceRegistry;
use crate::visibility::{Rect, VisibilityGate};
use crate::{ConfigurationError, RetryError};

/// Media Playback Controller for one rendered video
#[derive(Debug)]
pub struct PlaybackController<E: MediaElement> {
    session: PlaybackSession,
    gate: VisibilityGate,
    element: E,
}

impl<E: MediaElement> PlaybackController<E> {
    /// Resolve `media_id` and build an idle controller around `element`
    pub fn new(
        media_id: &str,
        registry: &SourceRegistry,
        profile: &CapabilityProfile,
        options: &PlaybackOptions,
        element: E,
    ) -> Result<Self, ConfigurationError> {
        let sources = registry.resolve(media_id, &options.effective_profile(profile))?;
        let session = PlaybackSession::new(media_id, sources, options.policy(profile))?;
        Ok(Self {
            session,
            gate: VisibilityGate::new(options.visibility_threshold),
            element,
        })
    }

    /// Mount hook: start loading
    pub fn mount(&mut self) {
        let commands = self.session.start();
        self.apply(commands);
    }

    /// Unmount hook: detach the element and stop observing.
    ///
    /// The session ends in `Disposed`; later events are dropped.
    pub fn unmount(&mut self) {
        self.gate.disconnect();
        let commands = self.session.dispose();
        self.apply(commands);
    }

    /// Element callback
    pub fn handle_event(&mut self, event: ElementEvent) {
        let commands = self.session.on_event(event);
        self.apply(commands);
    }

    /// Play button click
    pub fn user_play(&mut self) {
        let commands = self.session.user_play();
        self.apply(commands);
    }

    /// Retry button click
    pub fn retry(&mut self) -> Result<(), RetryError> {
        let commands = self.session.retry()?;
        self.apply(commands);
        Ok(())
    }

    pub fn pause(&mut self) {
        let commands = self.session.pause();
        self.apply(commands);
    }

    /// Intersection observer callback with the visible fraction
    pub fn observe_intersection(&mut self, ratio: f32) {
        if let Some(visible) = self.gate.observe(ratio) {
            let commands = self.session.set_visible(visible);
            self.apply(commands);
        }
    }

    pub fn observe_rects(&mut self, target: &Rect, viewport: &Rect) {
        if let Some(visible) = self.gate.observe_rects(target, viewport) {
            let commands = self.session.set_visible(visible);
            self.apply(commands);
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.session.state()
    }

    pub fn affordance(&self) -> Affordance {
        self.session.affordance()
    }

    pub fn shows_fallback(&self) -> bool {
        self.session.shows_fallback()
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn element(&self) -> &E {
        &self.element
    }

    pub fn element_mut(&mut self) -> &mut E {
        &mut self.element
    }

    /// Tear down and hand the element back to the rendering layer
    pub fn into_element(mut self) -> E {
        self.unmount();
        self.element
    }

    fn apply(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::Load { attempt, source } => self.element.load(attempt, &source),
                Command::Play { attempt, muted } => self.element.play(attempt, muted),
                Command::Pause => self.element.pause(),
                Command::SetMuted(muted) => self.element.set_muted(muted),
                Command::Detach => self.element.detach(),
            }
        }
    }
}
