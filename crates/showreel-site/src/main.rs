//! Showreel - site manifest checker
//!
//! Loads a site manifest, registers every media item and prints the
//! candidate order each client class would try.

use anyhow::Context;
use showreel_media::{detect, ClientEnvironment, MOBILE_BREAKPOINT};
use showreel_site::SiteConfig;
use tracing_subscriber::EnvFilter;

const DESKTOP_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const MOBILE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_2 like Mac OS X) \
    AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Mobile/15E148 Safari/604.1";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = std::env::args()
        .nth(1)
        .context("usage: showreel <manifest.json>")?;

    let config = SiteConfig::load(&path).with_context(|| format!("loading {path}"))?;
    let registry = config
        .build_registry()
        .with_context(|| format!("registering media from {path}"))?;
    tracing::info!("Registered {} media items from {}", registry.len(), path);

    let mut ids: Vec<&str> = registry.ids().collect();
    ids.sort_unstable();

    let clients = [
        ("desktop", ClientEnvironment::new(1440, DESKTOP_UA)),
        ("mobile", ClientEnvironment::new(MOBILE_BREAKPOINT / 2, MOBILE_UA)),
    ];
    for (label, env) in &clients {
        let profile = config.playback.effective_profile(&detect(env));
        println!("{label} (prefers {:?}):", profile.preferred_format);
        for id in &ids {
            let sources = registry
                .resolve(id, &profile)
                .with_context(|| format!("resolving {id}"))?;
            let order: Vec<&str> = sources.iter().map(|s| s.url.as_str()).collect();
            println!("  {id}: {}", order.join(" -> "));
        }
    }

    Ok(())
}
