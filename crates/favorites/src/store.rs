//! Identity-scoped persistent storage for favorite lists.
//!
//! Translates an identity into its namespace key and reads/writes the
//! JSON-serialized favorite list stored there. Every operation is
//! fail-soft: read problems degrade to an empty list, write problems to
//! `false`, and both are logged rather than surfaced. Screens must never
//! crash over a storage hiccup.
//!
//! # Key scheme
//!
//! - `favorites` - legacy global list from pre-namespacing app builds
//! - `favorites_<user id>` - one namespace per identity
//! - `favorites_backup_<user id>_<epoch millis>` - backup snapshots

use std::sync::Arc;

use tracing::{error, warn};

use bloom_core::{FavoriteItem, UserId};

use crate::kv::KeyValueStore;

/// Legacy unscoped favorites key from pre-namespacing builds.
pub const GLOBAL_KEY: &str = "favorites";

/// Prefix of every per-identity namespace key.
pub const USER_KEY_PREFIX: &str = "favorites_";

/// Prefix of every backup snapshot key.
pub const BACKUP_KEY_PREFIX: &str = "favorites_backup_";

/// Identity-to-namespace mapping over a device key-value store.
///
/// Cheaply cloneable; all clones share the same backend.
#[derive(Clone)]
pub struct IdentityScopedStore {
    kv: Arc<dyn KeyValueStore>,
}

impl IdentityScopedStore {
    /// Create a store over the given backend.
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// The namespace key for an identity, or `None` when no identity is
    /// present.
    ///
    /// Callers must treat `None` as "no storage available": operate as
    /// empty and no-op all writes.
    #[must_use]
    pub fn namespace_key(identity: Option<&UserId>) -> Option<String> {
        identity.map(|user| format!("{USER_KEY_PREFIX}{user}"))
    }

    /// Read the favorite list stored at `key`.
    ///
    /// Absent keys and malformed values both yield an empty list; the
    /// latter is logged. Never fails.
    pub async fn read_list(&self, key: &str) -> Vec<FavoriteItem> {
        let raw = match self.kv.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key = %key, error = %e, "favorites read failed, treating as empty");
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(e) => {
                warn!(key = %key, error = %e, "favorites list is malformed, treating as empty");
                Vec::new()
            }
        }
    }

    /// Write `items` at `key`, replacing the previous list.
    ///
    /// Returns `false` (and logs) on any storage or serialization error.
    pub async fn write_list(&self, key: &str, items: &[FavoriteItem]) -> bool {
        let raw = match serde_json::to_string(items) {
            Ok(raw) => raw,
            Err(e) => {
                error!(key = %key, error = %e, "failed to serialize favorites list");
                return false;
            }
        };

        match self.kv.set(key, &raw).await {
            Ok(()) => true,
            Err(e) => {
                error!(key = %key, error = %e, "favorites write failed");
                false
            }
        }
    }

    /// Remove `key` entirely.
    ///
    /// Distinct from writing an empty list: an absent key reads as "never
    /// had favorites" and stays eligible for legacy migration.
    pub async fn remove_key(&self, key: &str) -> bool {
        match self.kv.remove(key).await {
            Ok(()) => true,
            Err(e) => {
                error!(key = %key, error = %e, "favorites remove failed");
                false
            }
        }
    }

    /// Whether `key` holds any value at all, including an empty list.
    pub async fn contains_key(&self, key: &str) -> bool {
        match self.kv.get(key).await {
            Ok(value) => value.is_some(),
            Err(e) => {
                warn!(key = %key, error = %e, "favorites existence check failed");
                false
            }
        }
    }

    /// Every key currently in the underlying store.
    ///
    /// Used by the migration agent for statistics and backup discovery.
    pub async fn list_keys(&self) -> Vec<String> {
        match self.kv.list_keys().await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "favorites key enumeration failed");
                Vec::new()
            }
        }
    }
}
