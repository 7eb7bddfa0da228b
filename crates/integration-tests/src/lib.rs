//! Integration tests for the Bloom favorites subsystem.
//!
//! Scenario tests run the cache, store, and migration agent together over
//! an in-memory key-value backend - no external services required.
//!
//! # Test Categories
//!
//! - `favorites` - toggle/query/clear semantics and identity transitions
//! - `migration` - legacy migration, backups, and statistics

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use bloom_core::{DisplayPrice, ServiceRef, Style, UserId};
use bloom_favorites::{
    FavoritesCache, IdentityScopedStore, MemoryKv, MigrationAgent, SessionHooks,
};

/// Everything a scenario needs, wired over one shared in-memory store.
pub struct TestContext {
    /// Raw backend, for planting and inspecting stored JSON directly.
    pub kv: Arc<MemoryKv>,
    /// Identity-scoped view over `kv`.
    pub store: IdentityScopedStore,
    /// The cache under test.
    pub cache: FavoritesCache,
    /// The migration agent under test.
    pub agent: MigrationAgent,
    /// Session wiring over `cache` and `agent`.
    pub hooks: SessionHooks,
}

impl TestContext {
    /// Build a fresh, empty context.
    #[must_use]
    pub fn new() -> Self {
        let kv = Arc::new(MemoryKv::new());
        let store = IdentityScopedStore::new(kv.clone());
        let cache = FavoritesCache::new(store.clone());
        let agent = MigrationAgent::new(store.clone());
        let hooks = SessionHooks::new(cache.clone(), agent.clone());
        Self {
            kv,
            store,
            cache,
            agent,
            hooks,
        }
    }

    /// Sign the cache in as `user`.
    pub async fn sign_in(&self, user: &str) -> UserId {
        let user = UserId::parse(user).unwrap();
        self.cache.set_identity(Some(user.clone())).await;
        user
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A style with a numeric price and no images.
#[must_use]
pub fn style(name: &str, price: i64) -> Style {
    Style::new(name, DisplayPrice::Amount(price.into()))
}

/// A bare service reference.
#[must_use]
pub fn service(name: &str) -> ServiceRef {
    ServiceRef::new(name)
}
