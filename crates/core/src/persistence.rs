//! Loading and persisting the registry snapshot.
//!
//! Both directions are best effort. Loading never fails: an absent, unreadable or
//! malformed snapshot yields the demonstration dataset and a logged warning. Persisting
//! never fails either: a write error is logged and the in-memory registry stays
//! authoritative.

use crate::model::{demo_registry, Registry};
use crate::sanitize::parse_snapshot;
use crate::storage::StorageBackend;
use crate::{RegistryError, RegistryResult};
use chrono::{DateTime, Utc};

/// Where a loaded registry came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadSource {
    /// A stored snapshot was read and sanitized.
    Stored,
    /// Nothing was stored under the key.
    DemoNotFound,
    /// A stored value existed but could not be used.
    DemoRecovered(String),
}

/// Result of [`load_registry`].
#[derive(Clone, Debug)]
pub struct Loaded {
    pub registry: Registry,
    pub source: LoadSource,
}

fn read_snapshot(
    storage: &dyn StorageBackend,
    key: &str,
    now: DateTime<Utc>,
) -> RegistryResult<Option<Registry>> {
    let Some(raw) = storage.get_item(key)? else {
        return Ok(None);
    };
    parse_snapshot(&raw, now).map(Some)
}

/// Hydrates the registry from `storage`, falling back to the demonstration dataset.
pub fn load_registry(storage: &dyn StorageBackend, key: &str, now: DateTime<Utc>) -> Loaded {
    match read_snapshot(storage, key, now) {
        Ok(Some(registry)) => {
            tracing::debug!(
                "loaded registry snapshot: {} patients, {} transplants, {} follow-ups",
                registry.patients.len(),
                registry.transplants.len(),
                registry.followups.len()
            );
            Loaded {
                registry,
                source: LoadSource::Stored,
            }
        }
        Ok(None) => {
            tracing::info!("no stored registry under '{}', using demonstration data", key);
            Loaded {
                registry: demo_registry(now),
                source: LoadSource::DemoNotFound,
            }
        }
        Err(e) => {
            tracing::warn!(
                "could not load registry from local storage, using demonstration data: {}",
                e
            );
            Loaded {
                registry: demo_registry(now),
                source: LoadSource::DemoRecovered(e.to_string()),
            }
        }
    }
}

/// Serialises the registry for storage or export.
pub fn serialize_registry(registry: &Registry, pretty: bool) -> RegistryResult<String> {
    let result = if pretty {
        serde_json::to_string_pretty(registry)
    } else {
        serde_json::to_string(registry)
    };
    result.map_err(RegistryError::Serialization)
}

/// Stamps `settings.last_sync` and overwrites the snapshot under `key`.
///
/// Returns `true` when the write succeeded. Failures are logged and swallowed.
pub fn persist_registry(
    storage: &mut dyn StorageBackend,
    key: &str,
    registry: &mut Registry,
    now: DateTime<Utc>,
) -> bool {
    registry.settings.last_sync = now;

    let written = serialize_registry(registry, false)
        .and_then(|json| storage.set_item(key, &json).map_err(RegistryError::from));

    match written {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("could not save registry to local storage: {}", e);
            false
        }
    }
}
