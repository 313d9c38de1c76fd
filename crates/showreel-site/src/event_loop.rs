//! UI Event Loop
//!
//! The rendering layer posts [`SiteEvent`]s on a channel; [`run`] applies
//! them to the [`Site`] one at a time until every sender is dropped.

use showreel_consent::ConsentAction;
use showreel_media::{ElementEvent, MediaElement};
use smol::channel::Receiver;

use crate::site::{Site, VideoSlot};

/// Button pressed on a video overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction {
    Play,
    Pause,
    Retry,
}

/// Everything the page can tell the site
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SiteEvent {
    /// Viewport width in CSS pixels
    Resize(u32),
    /// Element callback for the video in `slot`
    Media { slot: VideoSlot, event: ElementEvent },
    /// Intersection observer report for `slot`
    Intersection { slot: VideoSlot, ratio: f32 },
    /// Pointer moved over the video (`mouseenter`)
    PointerEnter(VideoSlot),
    /// Pointer left the video (`mouseleave`)
    PointerLeave(VideoSlot),
    Click { slot: VideoSlot, action: ClickAction },
    Consent(ConsentAction),
}

/// Drain `events` into `site`. Returns the number of events handled.
///
/// A failing event is logged and the loop moves on.
pub async fn run<E: MediaElement>(site: &mut Site<E>, events: Receiver<SiteEvent>) -> usize {
    let mut handled = 0;
    while let Ok(event) = events.recv().await {
        tracing::trace!("Site event {:?}", event);
        if let Err(e) = site.handle(event) {
            tracing::warn!("Event {:?} failed: {}", event, e);
        }
        handled += 1;
    }
    tracing::debug!("Event channel closed after {} events", handled);
    handled
}
