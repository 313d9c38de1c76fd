//! Consent Gate
//!
//! Cookie consent status persisted in client storage. Banner visibility
//! is derived from the status on every read and never stored.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::storage::KeyValueStore;
use crate::StorageError;

/// Storage key holding `"true"` / `"false"`
pub const CONSENT_KEY: &str = "cookieConsent";
/// Storage key holding the last change, seconds since the Unix epoch
pub const CONSENT_TIMESTAMP_KEY: &str = "cookieConsentTimestamp";

/// Consent status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConsentStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
}

impl ConsentStatus {
    fn parse(value: Option<&str>) -> Self {
        match value {
            Some("true") => Self::Accepted,
            Some("false") => Self::Declined,
            _ => Self::Pending,
        }
    }
}

/// Consent status plus when it last changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsentState {
    pub status: ConsentStatus,
    pub last_updated: Option<u64>,
}

impl ConsentState {
    pub fn is_banner_visible(&self) -> bool {
        self.status == ConsentStatus::Pending
    }
}

/// Explicit user decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentAction {
    Accept,
    Decline,
    Reset,
}

/// Seconds since the Unix epoch
fn system_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Consent policy store over a [`KeyValueStore`]
#[derive(Debug)]
pub struct ConsentGate<S: KeyValueStore> {
    store: S,
    clock: fn() -> u64,
}

impl<S: KeyValueStore> ConsentGate<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: system_now,
        }
    }

    /// Use `clock` instead of the system time for timestamps
    pub fn with_clock(store: S, clock: fn() -> u64) -> Self {
        Self { store, clock }
    }

    /// Current state, read from storage
    pub fn get_status(&self) -> ConsentState {
        let status = ConsentStatus::parse(self.store.get_item(CONSENT_KEY).as_deref());
        let last_updated = match status {
            ConsentStatus::Pending => None,
            _ => self
                .store
                .get_item(CONSENT_TIMESTAMP_KEY)
                .and_then(|v| v.parse().ok()),
        };
        ConsentState {
            status,
            last_updated,
        }
    }

    pub fn is_banner_visible(&self) -> bool {
        self.get_status().is_banner_visible()
    }

    pub fn accept(&mut self) -> Result<ConsentState, StorageError> {
        self.record("true")
    }

    pub fn decline(&mut self) -> Result<ConsentState, StorageError> {
        self.record("false")
    }

    /// Forget the decision; the banner shows again
    pub fn reset(&mut self) -> Result<ConsentState, StorageError> {
        self.store.remove_item(CONSENT_KEY)?;
        self.store.remove_item(CONSENT_TIMESTAMP_KEY)?;
        tracing::debug!("Consent reset");
        Ok(self.get_status())
    }

    pub fn apply(&mut self, action: ConsentAction) -> Result<ConsentState, StorageError> {
        match action {
            ConsentAction::Accept => self.accept(),
            ConsentAction::Decline => self.decline(),
            ConsentAction::Reset => self.reset(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn record(&mut self, value: &str) -> Result<ConsentState, StorageError> {
        let now = (self.clock)();
        self.store.set_item(CONSENT_KEY, value)?;
        self.store.set_item(CONSENT_TIMESTAMP_KEY, &now.to_string())?;
        let state = self.get_status();
        tracing::debug!("Consent recorded: {:?}", state.status);
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStorage, MemoryStorage};

    fn fixed_clock() -> u64 {
        1_700_000_000
    }

    #[test]
    fn test_first_visit_is_pending() {
        let gate = ConsentGate::new(MemoryStorage::new());
        let state = gate.get_status();
        assert_eq!(state.status, ConsentStatus::Pending);
        assert_eq!(state.last_updated, None);
        assert!(gate.is_banner_visible());
    }

    #[test]
    fn test_accept_and_decline() {
        let mut gate = ConsentGate::with_clock(MemoryStorage::new(), fixed_clock);
        let state = gate.accept().unwrap();
        assert_eq!(state.status, ConsentStatus::Accepted);
        assert_eq!(state.last_updated, Some(1_700_000_000));
        assert!(!gate.is_banner_visible());

        let state = gate.decline().unwrap();
        assert_eq!(state.status, ConsentStatus::Declined);
        assert!(!state.is_banner_visible());
        assert_eq!(gate.store().get_item(CONSENT_KEY).as_deref(), Some("false"));
    }

    #[test]
    fn test_reset_shows_banner() {
        let mut gate = ConsentGate::new(MemoryStorage::new());
        gate.accept().unwrap();
        let state = gate.reset().unwrap();
        assert_eq!(state, ConsentState::default());
        assert!(gate.is_banner_visible());
        assert!(gate.into_store().is_empty());
    }

    #[test]
    fn test_unknown_value_reads_pending() {
        let mut storage = MemoryStorage::new();
        storage.set_item(CONSENT_KEY, "maybe").unwrap();
        storage.set_item(CONSENT_TIMESTAMP_KEY, "12").unwrap();
        let gate = ConsentGate::new(storage);
        assert_eq!(gate.get_status(), ConsentState::default());
    }

    #[test]
    fn test_accept_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.json");

        let mut gate = ConsentGate::new(FileStorage::open(&path).unwrap());
        gate.apply(ConsentAction::Accept).unwrap();
        drop(gate);

        let reloaded = ConsentGate::new(FileStorage::open(&path).unwrap());
        let state = reloaded.get_status();
        assert_eq!(state.status, ConsentStatus::Accepted);
        assert!(state.last_updated.is_some());
        assert!(!reloaded.is_banner_visible());
    }
}
