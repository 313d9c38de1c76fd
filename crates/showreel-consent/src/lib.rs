//! Showreel Consent
//!
//! Cookie consent for the Showreel site.
//!
//! Features:
//! - `localStorage`/`sessionStorage` style key-value stores
//! - Consent status with derived banner visibility
//! - Storage availability check

pub mod storage;
pub mod consent;

pub use storage::{storage_available, FileStorage, KeyValueStore, MemoryStorage};
pub use consent::{
    ConsentAction, ConsentGate, ConsentState, ConsentStatus, CONSENT_KEY, CONSENT_TIMESTAMP_KEY,
};

/// Storage error
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
