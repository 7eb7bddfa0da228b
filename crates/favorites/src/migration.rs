//! Legacy migration, backups, and store statistics.
//!
//! Older app builds kept one global, unscoped favorites list. On sign-in
//! the [`MigrationAgent`] copies that list into the identity's namespace,
//! but only when the namespace has never held a value - an explicitly
//! written empty list counts as existing data and blocks migration.
//! Migration leaves the legacy key in place so other identities on the
//! same device can still migrate; [`cleanup_global`](MigrationAgent::cleanup_global)
//! deletes it explicitly.
//!
//! Backups snapshot a namespace under a timestamped key before sign-out.
//! They are write-once, read-many and never auto-deleted.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use bloom_core::{FavoriteItem, UserId};

use crate::store::{BACKUP_KEY_PREFIX, GLOBAL_KEY, IdentityScopedStore, USER_KEY_PREFIX};

/// A backup snapshot reference: the owning identity plus creation time.
///
/// Carried structured internally; the `favorites_backup_<id>_<millis>`
/// string form exists only at the storage boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRef {
    user: UserId,
    created_at: DateTime<Utc>,
}

impl BackupRef {
    fn new(user: UserId, created_at: DateTime<Utc>) -> Self {
        Self { user, created_at }
    }

    /// The identity the backup belongs to.
    #[must_use]
    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// When the backup was taken.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The storage key this backup lives under.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!(
            "{BACKUP_KEY_PREFIX}{}_{}",
            self.user,
            self.created_at.timestamp_millis()
        )
    }

    /// Parse a backup storage key back into its structured form.
    ///
    /// Splits on the *last* underscore so identities containing
    /// underscores round-trip. Returns `None` when the key does not match
    /// `favorites_backup_<id>_<epoch millis>`.
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        let rest = key.strip_prefix(BACKUP_KEY_PREFIX)?;
        let (user, millis) = rest.rsplit_once('_')?;
        if millis.is_empty() || !millis.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let created_at = DateTime::from_timestamp_millis(millis.parse().ok()?)?;
        let user = UserId::parse(user).ok()?;
        Some(Self::new(user, created_at))
    }
}

/// Per-identity namespace statistics, for diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceStats {
    /// Number of stored favorites.
    pub count: usize,
    /// Most recent `timestamp`/`migrated_at` across the items.
    pub last_modified: Option<DateTime<Utc>>,
}

/// One-time legacy migration plus backup/restore/statistics utilities.
///
/// Safe to call redundantly; every operation is idempotent or a guarded
/// overwrite. Intended to run off the sign-in critical path.
#[derive(Clone)]
pub struct MigrationAgent {
    store: IdentityScopedStore,
}

impl MigrationAgent {
    /// Create an agent over the given store.
    #[must_use]
    pub const fn new(store: IdentityScopedStore) -> Self {
        Self { store }
    }

    /// Copy the legacy global favorites list into `user`'s namespace.
    ///
    /// No-ops (returns `false`) when the namespace already holds any
    /// value - including an empty list written by a prior self-heal - or
    /// when the legacy list is absent or has no valid items. Surviving
    /// items are stamped with the owner and a migration timestamp. The
    /// legacy key is deliberately left in place.
    pub async fn migrate_global_to_user(&self, user: &UserId) -> bool {
        let Some(target) = IdentityScopedStore::namespace_key(Some(user)) else {
            return false;
        };

        if self.store.contains_key(&target).await {
            debug!(user = %user, "favorites namespace already populated, skipping migration");
            return false;
        }

        let legacy = self.store.read_list(GLOBAL_KEY).await;
        let mut items: Vec<FavoriteItem> =
            legacy.into_iter().filter(FavoriteItem::is_valid).collect();
        if items.is_empty() {
            debug!(user = %user, "no legacy favorites to migrate");
            return false;
        }

        let now = Utc::now();
        for item in &mut items {
            item.user_id = Some(user.clone());
            item.migrated_at = Some(now);
            item.normalize_images();
        }

        let migrated = self.store.write_list(&target, &items).await;
        if migrated {
            info!(user = %user, count = items.len(), "migrated legacy favorites");
        }
        migrated
    }

    /// Delete the legacy global favorites key outright.
    ///
    /// Destructive; never invoked automatically by migration.
    pub async fn cleanup_global(&self) -> bool {
        self.store.remove_key(GLOBAL_KEY).await
    }

    /// Snapshot `user`'s current favorites under a timestamped backup key.
    ///
    /// Returns `None` when the namespace is absent or the write fails.
    /// The list is written unmodified, so a later restore reproduces it
    /// exactly.
    pub async fn backup_user(&self, user: &UserId) -> Option<BackupRef> {
        let key = IdentityScopedStore::namespace_key(Some(user))?;
        if !self.store.contains_key(&key).await {
            debug!(user = %user, "no favorites namespace to back up");
            return None;
        }

        let items = self.store.read_list(&key).await;
        let backup = BackupRef::new(user.clone(), Utc::now());
        if self.store.write_list(&backup.storage_key(), &items).await {
            info!(user = %user, count = items.len(), "backed up favorites");
            Some(backup)
        } else {
            None
        }
    }

    /// Overwrite the backup's identity's live namespace with the backup
    /// contents. A full overwrite, not a merge.
    pub async fn restore_backup(&self, backup: &BackupRef) -> bool {
        let backup_key = backup.storage_key();
        if !self.store.contains_key(&backup_key).await {
            warn!(key = %backup_key, "backup key has no data, nothing to restore");
            return false;
        }

        let items = self.store.read_list(&backup_key).await;
        let Some(target) = IdentityScopedStore::namespace_key(Some(backup.user())) else {
            return false;
        };
        let restored = self.store.write_list(&target, &items).await;
        if restored {
            info!(user = %backup.user(), count = items.len(), "restored favorites from backup");
        }
        restored
    }

    /// Restore from a raw backup storage key.
    ///
    /// Fails (`false`) when the key does not match the backup pattern.
    pub async fn restore_from_key(&self, key: &str) -> bool {
        match BackupRef::parse(key) {
            Some(backup) => self.restore_backup(&backup).await,
            None => {
                warn!(key = %key, "malformed backup key");
                false
            }
        }
    }

    /// All backups belonging to `user`, newest first.
    pub async fn list_backups(&self, user: &UserId) -> Vec<BackupRef> {
        let mut backups: Vec<BackupRef> = self
            .store
            .list_keys()
            .await
            .iter()
            .filter_map(|key| BackupRef::parse(key))
            .filter(|backup| backup.user() == user)
            .collect();
        backups.sort_by_key(|backup| std::cmp::Reverse(backup.created_at()));
        backups
    }

    /// Per-identity favorites counts and last-modified times.
    ///
    /// Enumerates every namespaced key, skipping the legacy global key
    /// and backups. Diagnostics only; never on a user-facing path.
    pub async fn statistics(&self) -> BTreeMap<UserId, NamespaceStats> {
        let mut stats = BTreeMap::new();

        for key in self.store.list_keys().await {
            if key == GLOBAL_KEY || key.starts_with(BACKUP_KEY_PREFIX) {
                continue;
            }
            let Some(identity) = key.strip_prefix(USER_KEY_PREFIX) else {
                continue;
            };
            let Ok(user) = UserId::parse(identity) else {
                continue;
            };

            let items = self.store.read_list(&key).await;
            let last_modified = items
                .iter()
                .filter_map(|item| item.timestamp.max(item.migrated_at))
                .max();
            stats.insert(
                user,
                NamespaceStats {
                    count: items.len(),
                    last_modified,
                },
            );
        }

        stats
    }
}
