//! Media Elements
//!
//! The seam between the playback state machine and whatever renders the
//! `<video>`. Commands go out through [`MediaElement`]; outcomes come back
//! as [`ElementEvent`]s tagged with the attempt that caused them.

use crate::source::MediaSource;

/// Monotonic id of one load/play attempt within a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttemptId(pub u64);

impl AttemptId {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// `networkState` of the element
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NetworkState {
    /// No source attached
    #[default]
    Empty,
    /// Source selected, nothing being fetched
    Idle,
    Loading,
    /// The current source could not be used
    NoSource,
}

/// `readyState` of the element, in increasing order of buffered data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    #[default]
    HaveNothing,
    /// Enough to start playing (`canplay`)
    HaveFutureData,
    /// Playing through
    HaveEnoughData,
}

/// `MediaError.code` reported when a source fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaErrorCode {
    Aborted = 1,
    Network = 2,
    Decode = 3,
    SrcNotSupported = 4,
}

/// Why a `play()` promise rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayRejection {
    /// `NotAllowedError`: autoplay policy, no user gesture
    NotAllowed,
    /// `AbortError`: interrupted by a new load or pause
    Aborted,
    /// `NotSupportedError`: nothing playable is loaded
    NotSupported,
}

/// What the element reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementEventKind {
    /// `canplay`
    CanPlay,
    /// `error` on the current source
    LoadFailed(MediaErrorCode),
    /// `play()` resolved
    PlayStarted,
    /// `play()` rejected
    PlayRejected(PlayRejection),
}

/// An element callback tagged with the attempt it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementEvent {
    pub attempt: AttemptId,
    pub kind: ElementEventKind,
}

impl ElementEvent {
    pub fn new(attempt: AttemptId, kind: ElementEventKind) -> Self {
        Self { attempt, kind }
    }
}

/// A rendered video the controller can drive.
///
/// Every call returns immediately; outcomes arrive later as
/// [`ElementEvent`]s carrying the `attempt` passed in here.
pub trait MediaElement {
    /// Point the element at `source` and start fetching
    fn load(&mut self, attempt: AttemptId, source: &MediaSource);
    /// Start playback
    fn play(&mut self, attempt: AttemptId, muted: bool);
    /// Suspend playback, keeping the position
    fn pause(&mut self);
    fn set_muted(&mut self, muted: bool);
    /// Drop listeners and release the current source
    fn detach(&mut self);
}

/// Headless `<video>` that records what it was told to do.
///
/// Used where no real rendering layer exists: tests and the manifest
/// checker. Events are never produced on its own; the caller feeds them
/// back to the controller.
#[derive(Debug, Default)]
pub struct VideoElement {
    pub current_src: String,
    pub network_state: NetworkState,
    pub ready_state: ReadyState,
    pub paused: bool,
    pub muted: bool,
    pub current_time: f64,
    pub detached: bool,
    /// Attempt of the last `load`
    pub load_attempt: Option<AttemptId>,
    /// Attempt of the last `play`
    pub play_attempt: Option<AttemptId>,
    pub loads: usize,
    pub plays: usize,
    pub pauses: usize,
}

impl VideoElement {
    pub fn new() -> Self {
        Self {
            paused: true,
            muted: true,
            ..Default::default()
        }
    }

    /// Whether playback could start from the buffered data
    pub fn can_play(&self) -> bool {
        self.ready_state >= ReadyState::HaveFutureData
    }

    /// Act out the browser reporting `kind` for the latest request.
    ///
    /// Moves network/ready state the way a real element would and returns
    /// the event tagged with the attempt it answers. `None` once detached
    /// or before the matching request was made.
    pub fn report(&mut self, kind: ElementEventKind) -> Option<ElementEvent> {
        if self.detached {
            return None;
        }
        let attempt = match kind {
            ElementEventKind::CanPlay => {
                self.network_state = NetworkState::Idle;
                self.ready_state = ReadyState::HaveFutureData;
                self.load_attempt?
            }
            ElementEventKind::LoadFailed(_) => {
                self.network_state = NetworkState::NoSource;
                self.ready_state = ReadyState::HaveNothing;
                self.paused = true;
                self.load_attempt?
            }
            ElementEventKind::PlayStarted => {
                self.ready_state = ReadyState::HaveEnoughData;
                self.play_attempt?
            }
            ElementEventKind::PlayRejected(_) => {
                self.paused = true;
                self.play_attempt?
            }
        };
        Some(ElementEvent::new(attempt, kind))
    }

    /// Advance the playhead while playing
    pub fn tick(&mut self, seconds: f64) {
        if !self.paused {
            self.current_time += seconds;
        }
    }
}

impl MediaElement for VideoElement {
    fn load(&mut self, attempt: AttemptId, source: &MediaSource) {
        self.current_src = source.url.clone();
        self.network_state = NetworkState::Loading;
        self.ready_state = ReadyState::HaveNothing;
        self.current_time = 0.0;
        self.paused = true;
        self.load_attempt = Some(attempt);
        self.loads += 1;
    }

    fn play(&mut self, attempt: AttemptId, muted: bool) {
        self.muted = muted;
        self.paused = false;
        self.play_attempt = Some(attempt);
        self.plays += 1;
    }

    fn pause(&mut self) {
        self.paused = true;
        self.pauses += 1;
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn detach(&mut self) {
        self.paused = true;
        self.current_src.clear();
        self.network_state = NetworkState::Empty;
        self.ready_state = ReadyState::HaveNothing;
        self.detached = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MediaFormat;

    #[test]
    fn test_video_element() {
        let video = VideoElement::new();
        assert!(video.paused);
        assert!(video.muted);
    }

    #[test]
    fn test_pause_keeps_position() {
        let mut video = VideoElement::new();
        let source = MediaSource::new(MediaFormat::Mp4, "a.mp4", 1);
        video.load(AttemptId(1), &source);
        video.play(AttemptId(1), true);
        video.tick(2.5);
        video.pause();
        video.tick(1.0);
        assert_eq!(video.current_time, 2.5);
        video.play(AttemptId(1), true);
        video.tick(0.5);
        assert_eq!(video.current_time, 3.0);
    }

    #[test]
    fn test_report_moves_ready_state() {
        let mut video = VideoElement::new();
        assert_eq!(video.report(ElementEventKind::CanPlay), None);

        video.load(AttemptId(1), &MediaSource::new(MediaFormat::Webm, "a.webm", 1));
        assert!(!video.can_play());
        let event = video.report(ElementEventKind::CanPlay).unwrap();
        assert_eq!(event, ElementEvent::new(AttemptId(1), ElementEventKind::CanPlay));
        assert_eq!(video.network_state, NetworkState::Idle);
        assert!(video.can_play());

        video.play(AttemptId(2), true);
        let event = video.report(ElementEventKind::PlayStarted).unwrap();
        assert_eq!(event.attempt, AttemptId(2));
        assert_eq!(video.ready_state, ReadyState::HaveEnoughData);

        let event = video.report(ElementEventKind::LoadFailed(MediaErrorCode::Network)).unwrap();
        assert_eq!(event.attempt, AttemptId(1));
        assert_eq!(video.network_state, NetworkState::NoSource);
        assert!(video.paused);
        assert!(!video.can_play());

        video.detach();
        assert_eq!(video.report(ElementEventKind::CanPlay), None);
    }

    #[test]
    fn test_detach_releases_source() {
        let mut video = VideoElement::new();
        video.load(AttemptId(3), &MediaSource::new(MediaFormat::Webm, "a.webm", 1));
        assert_eq!(video.network_state, NetworkState::Loading);
        video.detach();
        assert!(video.current_src.is_empty());
        assert!(video.detached);
    }
}
