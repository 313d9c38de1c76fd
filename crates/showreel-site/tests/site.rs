//! Site tests - manifest → site → event loop → players
//!
//! Drives the demo manifest through the channel-fed event loop with
//! headless elements.

use showreel_consent::{ConsentAction, ConsentStatus, MemoryStorage};
use showreel_media::{
    Affordance, ClientEnvironment, ElementEvent, ElementEventKind, MediaErrorCode, MediaFormat,
    PlayRejection, PlaybackFailure, PlaybackState, VideoElement,
};
use showreel_site::{run, ClickAction, Site, SiteConfig, SiteEvent, VideoSlot};
use smol::channel::Sender;

const MANIFEST: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../demos/site.json"));

const CHROME: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const ANDROID: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";

fn config() -> SiteConfig {
    let mut config = SiteConfig::from_json(MANIFEST).unwrap();
    config.storage_path = None;
    config
}

fn site(ua: &str, width: u32) -> Site<VideoElement> {
    Site::new(&config(), &ClientEnvironment::new(width, ua), Box::new(MemoryStorage::new())).unwrap()
}

/// Queue element `kind` for `slot`, tagged with the slot's current attempt
fn report(site: &Site<VideoElement>, tx: &Sender<SiteEvent>, slot: VideoSlot, kind: ElementEventKind) {
    let attempt = site.player(slot).unwrap().session().attempt();
    tx.try_send(SiteEvent::Media {
        slot,
        event: ElementEvent::new(attempt, kind),
    })
    .unwrap();
}

/// Run the loop over everything queued so far
fn drain(site: &mut Site<VideoElement>, events: Vec<SiteEvent>) -> usize {
    let (tx, rx) = smol::channel::unbounded();
    for event in events {
        tx.try_send(event).unwrap();
    }
    drop(tx);
    smol::block_on(run(site, rx))
}

fn media(site: &Site<VideoElement>, slot: VideoSlot, kind: ElementEventKind) -> SiteEvent {
    SiteEvent::Media {
        slot,
        event: ElementEvent::new(site.player(slot).unwrap().session().attempt(), kind),
    }
}

// ============================================================================
// MANIFEST
// ============================================================================

#[test]
fn test_demo_manifest_builds() {
    let config = config();
    let registry = config.build_registry().unwrap();
    assert_eq!(registry.len(), 9);

    let site = site(CHROME, 1440);
    assert_eq!(
        site.portfolio().categories(),
        vec!["All", "Commercial", "Documentary", "Corporate"]
    );
    assert_eq!(site.portfolio().filter("Commercial").len(), 6);

    let hero = registry
        .resolve("hero", &site.capabilities())
        .unwrap();
    assert_eq!(hero[0].format, MediaFormat::Webm);
    assert_eq!(hero[0].url, "https://showreel.example/assets/videos/hero/hero-video.webm");
    assert_eq!(hero[1].url, "https://showreel.example/assets/videos/hero/hero-video.mp4");
}

// ============================================================================
// PLAYBACK THROUGH THE EVENT LOOP
// ============================================================================

#[test]
fn test_hero_autoplays_and_follows_viewport() {
    let mut site = site(CHROME, 1440);
    site.mount(VideoSlot::Hero, VideoElement::new()).unwrap();

    let (tx, rx) = smol::channel::unbounded();
    report(&site, &tx, VideoSlot::Hero, ElementEventKind::CanPlay);
    report(&site, &tx, VideoSlot::Hero, ElementEventKind::PlayStarted);
    tx.try_send(SiteEvent::Intersection { slot: VideoSlot::Hero, ratio: 0.0 }).unwrap();
    drop(tx);
    assert_eq!(smol::block_on(run(&mut site, rx)), 3);

    let hero = site.player(VideoSlot::Hero).unwrap();
    assert_eq!(hero.state(), PlaybackState::Playing);
    assert!(hero.session().is_suspended());
    assert!(hero.element().paused);
    assert!(hero.element().muted);

    drain(&mut site, vec![SiteEvent::Intersection { slot: VideoSlot::Hero, ratio: 0.8 }]);
    let hero = site.player(VideoSlot::Hero).unwrap();
    assert!(!hero.element().paused);
    assert_eq!(hero.element().plays, 2);
}

#[test]
fn test_mobile_hero_rejected_then_tap() {
    let mut site = site(ANDROID, 412);
    assert!(site.capabilities().is_mobile);
    site.mount(VideoSlot::Hero, VideoElement::new()).unwrap();
    let slot = VideoSlot::Hero;

    let can_play = media(&site, slot, ElementEventKind::CanPlay);
    let rejected = media(&site, slot, ElementEventKind::PlayRejected(PlayRejection::NotAllowed));
    drain(&mut site, vec![can_play, rejected]);
    assert_eq!(site.state(slot), Some(PlaybackState::AwaitingInteraction));
    assert_eq!(site.player(slot).unwrap().affordance(), Affordance::PlayButton);
    assert!(site.shows_poster(slot));

    drain(&mut site, vec![SiteEvent::Click { slot, action: ClickAction::Play }]);
    let started = media(&site, slot, ElementEventKind::PlayStarted);
    drain(&mut site, vec![started]);
    assert_eq!(site.state(slot), Some(PlaybackState::Playing));
    assert!(!site.shows_poster(slot));
}

#[test]
fn test_mobile_preview_plays_on_tap() {
    let mut site = site(ANDROID, 412);
    let slot = VideoSlot::Preview(5);
    site.mount(slot, VideoElement::new()).unwrap();

    let can_play = media(&site, slot, ElementEventKind::CanPlay);
    drain(&mut site, vec![can_play]);
    assert_eq!(site.state(slot), Some(PlaybackState::AwaitingInteraction));
    assert_eq!(site.player(slot).unwrap().element().plays, 0);

    drain(&mut site, vec![SiteEvent::Click { slot, action: ClickAction::Play }]);
    let started = media(&site, slot, ElementEventKind::PlayStarted);
    drain(&mut site, vec![started]);
    assert_eq!(site.state(slot), Some(PlaybackState::Playing));
}

#[test]
fn test_preview_grid_follows_pointer() {
    let mut site = site(CHROME, 1440);
    let slots: Vec<_> = (1..=8).map(VideoSlot::Preview).collect();
    for slot in &slots {
        site.mount(*slot, VideoElement::new()).unwrap();
    }
    let ready: Vec<_> = slots
        .iter()
        .map(|slot| media(&site, *slot, ElementEventKind::CanPlay))
        .collect();
    drain(&mut site, ready);
    assert!(slots.iter().all(|slot| site.shows_poster(*slot)));
    assert!(slots.iter().all(|slot| site.player(*slot).unwrap().element().plays == 0));

    let hovered = VideoSlot::Preview(3);
    drain(&mut site, vec![SiteEvent::PointerEnter(hovered)]);
    let started = media(&site, hovered, ElementEventKind::PlayStarted);
    drain(&mut site, vec![started, SiteEvent::PointerLeave(hovered)]);

    assert_eq!(site.state(hovered), Some(PlaybackState::Paused));
    assert!(!site.shows_poster(hovered));
    for slot in slots.iter().filter(|slot| **slot != hovered) {
        assert_eq!(site.state(*slot), Some(PlaybackState::AwaitingInteraction));
        assert!(site.shows_poster(*slot));
    }

    // Hovering again resumes from the paused frame
    drain(&mut site, vec![SiteEvent::PointerEnter(hovered)]);
    let started = media(&site, hovered, ElementEventKind::PlayStarted);
    drain(&mut site, vec![started]);
    assert_eq!(site.state(hovered), Some(PlaybackState::Playing));
}

#[test]
fn test_broken_preview_leaves_siblings_alone() {
    let mut site = site(CHROME, 1440);
    site.mount(VideoSlot::Hero, VideoElement::new()).unwrap();
    for id in [1, 2, 3] {
        site.mount(VideoSlot::Preview(id), VideoElement::new()).unwrap();
    }

    let broken = VideoSlot::Preview(2);
    let healthy = [VideoSlot::Preview(1), VideoSlot::Preview(3)];
    let mut events = vec![
        media(&site, broken, ElementEventKind::LoadFailed(MediaErrorCode::SrcNotSupported)),
        media(&site, VideoSlot::Hero, ElementEventKind::CanPlay),
        media(&site, VideoSlot::Hero, ElementEventKind::PlayStarted),
    ];
    for slot in healthy {
        events.push(media(&site, slot, ElementEventKind::CanPlay));
        events.push(SiteEvent::PointerEnter(slot));
    }
    drain(&mut site, events);
    let started: Vec<_> = healthy
        .iter()
        .map(|slot| media(&site, *slot, ElementEventKind::PlayStarted))
        .collect();
    drain(&mut site, started);

    assert_eq!(
        site.state(broken),
        Some(PlaybackState::Error(PlaybackFailure::AllSourcesFailed))
    );
    assert_eq!(site.player(broken).unwrap().affordance(), Affordance::Retry);
    assert!(site.shows_poster(broken));
    assert_eq!(site.poster(broken), Some(
        "https://showreel.example/assets/videos/Portfolio%20WEBM/thumbnails/hawaii-alex-smith.jpg"
    ));
    assert_eq!(site.state(VideoSlot::Hero), Some(PlaybackState::Playing));
    for slot in healthy {
        assert_eq!(site.state(slot), Some(PlaybackState::Playing));
    }

    drain(&mut site, vec![SiteEvent::Click { slot: broken, action: ClickAction::Retry }]);
    assert_eq!(site.state(broken), Some(PlaybackState::Loading));
    assert_eq!(site.player(broken).unwrap().session().retries_used(), 1);
}

#[test]
fn test_retry_outside_error_is_logged_not_fatal() {
    let mut site = site(CHROME, 1440);
    site.mount(VideoSlot::Hero, VideoElement::new()).unwrap();
    let handled = drain(
        &mut site,
        vec![
            SiteEvent::Click { slot: VideoSlot::Hero, action: ClickAction::Retry },
            SiteEvent::Resize(600),
        ],
    );
    assert_eq!(handled, 2);
    assert_eq!(site.state(VideoSlot::Hero), Some(PlaybackState::Loading));
    assert!(site.capabilities().is_mobile);
}

// ============================================================================
// CONSENT
// ============================================================================

#[test]
fn test_consent_persists_across_visits() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config();
    config.storage_path = Some(dir.path().join("local-storage.json"));
    let env = ClientEnvironment::new(1440, CHROME);

    let mut first: Site<VideoElement> = Site::from_config(&config, &env).unwrap();
    assert!(first.consent().is_banner_visible());
    drain(&mut first, vec![SiteEvent::Consent(ConsentAction::Accept)]);
    drop(first);

    let mut second: Site<VideoElement> = Site::from_config(&config, &env).unwrap();
    let state = second.consent().state();
    assert_eq!(state.status, ConsentStatus::Accepted);
    assert!(state.last_updated.is_some());
    assert!(!second.consent().is_banner_visible());

    drain(&mut second, vec![SiteEvent::Consent(ConsentAction::Reset)]);
    let third: Site<VideoElement> = Site::from_config(&config, &env).unwrap();
    assert!(third.consent().is_banner_visible());
}
