//! Session wiring for identity transitions.
//!
//! The authentication collaborator owns sign-in/sign-out; these hooks
//! translate its notifications into cache and migration-agent calls.
//! Migration runs as a detached background task - its outcome must never
//! affect sign-in success, so the task is spawned and only logged.

use tracing::{debug, info};

use bloom_core::UserId;

use crate::cache::FavoritesCache;
use crate::migration::MigrationAgent;

/// Glue between the authentication lifecycle and the favorites subsystem.
#[derive(Clone)]
pub struct SessionHooks {
    cache: FavoritesCache,
    agent: MigrationAgent,
}

impl SessionHooks {
    /// Create hooks over a cache and migration agent sharing one store.
    #[must_use]
    pub const fn new(cache: FavoritesCache, agent: MigrationAgent) -> Self {
        Self { cache, agent }
    }

    /// Handle a successful sign-in.
    ///
    /// Loads the identity's favorites (forced), then kicks off legacy
    /// migration in the background. The spawned task is never awaited by
    /// the sign-in flow; a migration that fills the namespace becomes
    /// visible on the next refresh.
    pub async fn on_sign_in(&self, user: UserId) {
        self.cache.set_identity(Some(user.clone())).await;

        let agent = self.agent.clone();
        tokio::spawn(async move {
            if agent.migrate_global_to_user(&user).await {
                info!(user = %user, "legacy favorites migration completed after sign-in");
            } else {
                debug!(user = %user, "legacy favorites migration was a no-op");
            }
        });
    }

    /// Handle sign-out.
    ///
    /// Backs up the current identity's namespace (so support can recover
    /// pre-logout state), then clears the in-memory items. The namespace
    /// itself is left intact for the next sign-in.
    pub async fn on_sign_out(&self) {
        if let Some(user) = self.cache.identity() {
            if let Some(backup) = self.agent.backup_user(&user).await {
                info!(user = %user, key = %backup.storage_key(), "favorites backed up on sign-out");
            } else {
                debug!(user = %user, "no favorites to back up on sign-out");
            }
        }
        self.cache.set_identity(None).await;
    }

    /// The cache these hooks drive.
    #[must_use]
    pub const fn cache(&self) -> &FavoritesCache {
        &self.cache
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::kv::MemoryKv;
    use crate::store::IdentityScopedStore;
    use bloom_core::{DisplayPrice, ServiceRef, Style};

    fn hooks() -> (SessionHooks, IdentityScopedStore) {
        let store = IdentityScopedStore::new(Arc::new(MemoryKv::new()));
        let cache = FavoritesCache::new(store.clone());
        let agent = MigrationAgent::new(store.clone());
        (SessionHooks::new(cache, agent), store)
    }

    #[tokio::test]
    async fn test_sign_in_loads_and_sign_out_backs_up() {
        let (hooks, store) = hooks();
        let service = ServiceRef::new("Hair Cut");
        let style = Style::new("Buzz Cut", DisplayPrice::Amount(100.into()));

        hooks.on_sign_in(UserId::parse("u1").unwrap()).await;
        assert!(hooks.cache().toggle(&service, &style).await);

        hooks.on_sign_out().await;
        assert!(hooks.cache().identity().is_none());
        assert!(hooks.cache().items().is_empty());

        // Namespace survives sign-out and a backup snapshot exists.
        assert_eq!(store.read_list("favorites_u1").await.len(), 1);
        let backups: Vec<String> = store
            .list_keys()
            .await
            .into_iter()
            .filter(|key| key.starts_with("favorites_backup_u1_"))
            .collect();
        assert_eq!(backups.len(), 1);
    }
}
