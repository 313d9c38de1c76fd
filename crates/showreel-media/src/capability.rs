//! Capability Detection
//!
//! Classifies the client once per session: mobile or desktop, Safari-like
//! engine or not, and which encoding to try first.

use serde::{Deserialize, Serialize};

use crate::source::MediaFormat;

/// Viewports narrower than this are treated as mobile.
pub const MOBILE_BREAKPOINT: u32 = 768;

/// User agent tokens that mark a handheld device
const MOBILE_TOKENS: &[&str] = &["iphone", "ipad", "ipod", "android"];

/// iOS browsers all run on WebKit regardless of branding
const IOS_TOKENS: &[&str] = &["iphone", "ipad", "ipod"];

/// Tokens that disqualify a `Safari` user agent from being Safari
const NOT_SAFARI_TOKENS: &[&str] = &["chrome", "chromium", "edg", "android"];

/// Screen size class
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenSize {
    /// Phone portrait (< 640px)
    Sm,
    /// Tablet (< 768px)
    Md,
    /// Small desktop (< 1024px)
    #[default]
    Lg,
    /// Large desktop
    Xl,
}

impl ScreenSize {
    /// Classify a viewport width in CSS pixels
    pub fn from_width(width: u32) -> Self {
        match width {
            0..640 => Self::Sm,
            640..MOBILE_BREAKPOINT => Self::Md,
            MOBILE_BREAKPOINT..1024 => Self::Lg,
            _ => Self::Xl,
        }
    }

    /// Whether this size is below the mobile breakpoint
    pub fn is_mobile(&self) -> bool {
        matches!(self, Self::Sm | Self::Md)
    }

    /// Scale applied to a cover-cropped background video so it fills
    /// narrow portrait viewports.
    pub fn video_scale(&self) -> f32 {
        match self {
            Self::Sm => 1.5,
            Self::Md => 1.2,
            Self::Lg | Self::Xl => 1.0,
        }
    }
}

/// Raw inputs the rendering layer measures on startup
#[derive(Debug, Clone, Default)]
pub struct ClientEnvironment {
    /// Viewport width in CSS pixels
    pub viewport_width: u32,
    /// `navigator.userAgent`
    pub user_agent: String,
}

impl ClientEnvironment {
    pub fn new(viewport_width: u32, user_agent: &str) -> Self {
        Self {
            viewport_width,
            user_agent: user_agent.to_string(),
        }
    }
}

/// Snapshot of device/browser traits that drive playback strategy.
///
/// Computed once by [`detect`]. The only later change is the mobile flag,
/// re-derived through [`CapabilityProfile::resized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityProfile {
    pub is_mobile: bool,
    pub supports_autoplay_with_sound: bool,
    pub preferred_format: MediaFormat,
    pub screen: ScreenSize,
    /// User agent names a handheld device; survives resizes.
    pub handheld: bool,
}

impl CapabilityProfile {
    /// Desktop, non-Safari profile
    pub fn desktop() -> Self {
        detect(&ClientEnvironment::new(1280, ""))
    }

    /// Re-derive the profile after a viewport resize.
    ///
    /// Returns `Some` only when the mobile classification flips.
    /// `preferred_format` is never touched so a playing video does not
    /// switch sources mid-stream.
    pub fn resized(&self, viewport_width: u32) -> Option<Self> {
        let screen = ScreenSize::from_width(viewport_width);
        let is_mobile = self.handheld || screen.is_mobile();
        if is_mobile == self.is_mobile {
            return None;
        }
        Some(Self {
            is_mobile,
            screen,
            ..*self
        })
    }
}

impl Default for CapabilityProfile {
    fn default() -> Self {
        Self::desktop()
    }
}

/// Classify the client.
pub fn detect(env: &ClientEnvironment) -> CapabilityProfile {
    let ua = env.user_agent.to_lowercase();
    let handheld = contains_any(&ua, MOBILE_TOKENS);
    let screen = ScreenSize::from_width(env.viewport_width);
    let safari_like = is_safari_like(&ua);

    let preferred_format = if safari_like {
        MediaFormat::Mp4
    } else {
        MediaFormat::Webm
    };

    let profile = CapabilityProfile {
        is_mobile: handheld || screen.is_mobile(),
        supports_autoplay_with_sound: !handheld && !safari_like,
        preferred_format,
        screen,
        handheld,
    };
    tracing::debug!(
        "Detected capabilities: mobile={} safari={} prefer={:?}",
        profile.is_mobile,
        safari_like,
        profile.preferred_format
    );
    profile
}

/// Safari and every iOS browser reject WEBM often enough to prefer MP4.
fn is_safari_like(ua: &str) -> bool {
    if contains_any(ua, IOS_TOKENS) {
        return true;
    }
    ua.contains("safari") && !contains_any(ua, NOT_SAFARI_TOKENS)
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_DESKTOP: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
        (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const SAFARI_DESKTOP: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_2) AppleWebKit/605.1.15 \
        (KHTML, like Gecko) Version/17.2 Safari/605.1.15";
    const CHROME_IOS: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_2 like Mac OS X) \
        AppleWebKit/605.1.15 (KHTML, like Gecko) CriOS/120.0 Mobile/15E148 Safari/604.1";
    const CHROME_ANDROID: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 \
        (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";

    #[test]
    fn test_desktop_chrome_prefers_webm() {
        let profile = detect(&ClientEnvironment::new(1440, CHROME_DESKTOP));
        assert!(!profile.is_mobile);
        assert!(profile.supports_autoplay_with_sound);
        assert_eq!(profile.preferred_format, MediaFormat::Webm);
        assert_eq!(profile.screen, ScreenSize::Xl);
    }

    #[test]
    fn test_safari_prefers_mp4() {
        let profile = detect(&ClientEnvironment::new(1440, SAFARI_DESKTOP));
        assert!(!profile.is_mobile);
        assert!(!profile.supports_autoplay_with_sound);
        assert_eq!(profile.preferred_format, MediaFormat::Mp4);
    }

    #[test]
    fn test_ios_is_mobile_and_safari_like() {
        let profile = detect(&ClientEnvironment::new(1024, CHROME_IOS));
        assert!(profile.is_mobile);
        assert_eq!(profile.preferred_format, MediaFormat::Mp4);
    }

    #[test]
    fn test_android_chrome_is_mobile_webm() {
        let profile = detect(&ClientEnvironment::new(412, CHROME_ANDROID));
        assert!(profile.is_mobile);
        assert!(!profile.supports_autoplay_with_sound);
        assert_eq!(profile.preferred_format, MediaFormat::Webm);
    }

    #[test]
    fn test_narrow_viewport_is_mobile() {
        let profile = detect(&ClientEnvironment::new(767, CHROME_DESKTOP));
        assert!(profile.is_mobile);
        assert_eq!(profile.screen, ScreenSize::Md);
        let profile = detect(&ClientEnvironment::new(768, CHROME_DESKTOP));
        assert!(!profile.is_mobile);
    }

    #[test]
    fn test_resize_flips_mobile_only() {
        let profile = detect(&ClientEnvironment::new(1280, SAFARI_DESKTOP));
        assert_eq!(profile.resized(1100), None);

        let narrow = profile.resized(500).unwrap();
        assert!(narrow.is_mobile);
        assert_eq!(narrow.screen, ScreenSize::Sm);
        assert_eq!(narrow.preferred_format, profile.preferred_format);
        assert_eq!(narrow.supports_autoplay_with_sound, profile.supports_autoplay_with_sound);

        let wide = narrow.resized(1300).unwrap();
        assert!(!wide.is_mobile);
    }

    #[test]
    fn test_handheld_stays_mobile_when_wide() {
        let profile = detect(&ClientEnvironment::new(400, CHROME_ANDROID));
        assert_eq!(profile.resized(1200), None);
    }

    #[test]
    fn test_video_scale() {
        assert_eq!(ScreenSize::from_width(320).video_scale(), 1.5);
        assert_eq!(ScreenSize::from_width(700).video_scale(), 1.2);
        assert_eq!(ScreenSize::from_width(1920).video_scale(), 1.0);
    }
}
