//! In-memory favorites cache for the current identity.
//!
//! The cache is the authoritative in-session view: every mutation updates
//! memory first, then persists the full list through
//! [`IdentityScopedStore`]. A failed persist returns `false` but leaves
//! the in-memory state in place - it stays the source of truth until the
//! next load.
//!
//! # Identity transitions
//!
//! [`set_identity`](FavoritesCache::set_identity) is the single entry
//! point: sign-in triggers a forced load of that identity's namespace,
//! sign-out clears memory without touching storage. Each transition bumps
//! a generation counter; a load that started under an older generation
//! discards its result instead of overwriting newer state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, warn};

use bloom_core::{FavoriteItem, FavoriteKey, ServiceRef, Style, UserId};

use crate::images::extract_image_refs;
use crate::store::IdentityScopedStore;

/// Reactive favorites state for the current identity.
///
/// Cheaply cloneable; all clones share state. Injected into whatever
/// consumes it (screens, session wiring) rather than held as a global.
#[derive(Clone)]
pub struct FavoritesCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    store: IdentityScopedStore,
    state: Mutex<CacheState>,
}

#[derive(Default)]
struct CacheState {
    identity: Option<UserId>,
    items: Vec<FavoriteItem>,
    loading: bool,
    /// Bumped on every identity transition; in-flight loads compare their
    /// snapshot against it and discard stale results.
    generation: u64,
}

impl FavoritesCache {
    /// Create a cache with no identity and no items.
    #[must_use]
    pub fn new(store: IdentityScopedStore) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                store,
                state: Mutex::new(CacheState::default()),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // State mutex is never held across an await, so a poisoned lock
        // only means a panicked test thread; the state itself is intact.
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Switch the cache to a new identity (or to signed-out).
    ///
    /// Sign-in forces a load of the identity's namespace; sign-out clears
    /// the in-memory items immediately, without a storage round-trip and
    /// without deleting the namespace.
    pub async fn set_identity(&self, identity: Option<UserId>) {
        let should_load = {
            let mut state = self.lock();
            state.generation = state.generation.wrapping_add(1);
            state.loading = false;
            state.identity = identity;
            if state.identity.is_some() {
                true
            } else {
                state.items.clear();
                false
            }
        };
        if should_load {
            self.reload(true).await;
        }
    }

    /// Reload the current identity's favorites from storage.
    ///
    /// Equivalent to a forced load: runs even if another load is in
    /// flight.
    pub async fn refresh(&self) {
        self.reload(true).await;
    }

    /// Load the current identity's favorites unless a load is already in
    /// flight.
    ///
    /// The non-forced counterpart of [`refresh`](Self::refresh), for
    /// callers that may fire redundantly (screen focus, pull-to-refresh).
    pub async fn load(&self) {
        self.reload(false).await;
    }

    /// Load favorites for the current identity.
    ///
    /// No-ops if a load is already in flight and `force` is `false`.
    /// Items failing the required-field invariant are dropped and the
    /// cleaned list is persisted back (self-healing). Surviving items are
    /// image-normalized in memory, so legacy records carrying both
    /// `image` and `images` come out cleaned on the next write.
    async fn reload(&self, force: bool) {
        let (identity, generation) = {
            let mut state = self.lock();
            if state.loading && !force {
                return;
            }
            let Some(identity) = state.identity.clone() else {
                state.items.clear();
                state.loading = false;
                return;
            };
            state.loading = true;
            (identity, state.generation)
        };

        let Some(key) = IdentityScopedStore::namespace_key(Some(&identity)) else {
            let mut state = self.lock();
            state.items.clear();
            state.loading = false;
            return;
        };

        let raw = self.inner.store.read_list(&key).await;
        let total = raw.len();
        let mut items: Vec<FavoriteItem> = raw.into_iter().filter(FavoriteItem::is_valid).collect();
        for item in &mut items {
            item.normalize_images();
        }

        let dropped = total - items.len();
        if dropped > 0 {
            warn!(
                user = %identity,
                dropped,
                "dropped invalid favorites on load, persisting cleaned list"
            );
            // Self-heal write; on failure the cleaned view is still served
            // this session and the next load heals again.
            let _ = self.inner.store.write_list(&key, &items).await;
        }

        let mut state = self.lock();
        if state.generation != generation {
            debug!(user = %identity, "discarding stale favorites load");
            return;
        }
        state.items = items;
        state.loading = false;
    }

    /// Toggle a style in or out of the favorites list.
    ///
    /// Returns `false` when no identity is present, when either name is
    /// missing, when adding a style that has no price (it could never be
    /// stored as a valid record), or when the persist failed after the
    /// in-memory mutation was applied (memory remains the source of truth
    /// until next load). Removal only needs the names, so a price-less
    /// style can still toggle an existing favorite off.
    pub async fn toggle(&self, service: &ServiceRef, style: &Style) -> bool {
        let (namespace, snapshot) = {
            let mut state = self.lock();
            let Some(identity) = state.identity.clone() else {
                return false;
            };
            let Some(key) = FavoriteKey::new(&service.name, &style.name) else {
                return false;
            };
            let Some(namespace) = IdentityScopedStore::namespace_key(Some(&identity)) else {
                return false;
            };

            let existing = state
                .items
                .iter()
                .position(|item| item.key().as_ref() == Some(&key));
            match existing {
                Some(position) => {
                    state.items.remove(position);
                }
                None => {
                    if style.price.is_none() {
                        return false;
                    }
                    state.items.push(build_item(service, style, &identity));
                }
            }
            (namespace, state.items.clone())
        };

        self.inner.store.write_list(&namespace, &snapshot).await
    }

    /// Whether the given service/style pair is currently a favorite.
    ///
    /// Case- and whitespace-insensitive; `false` when either name is
    /// empty or no identity is present.
    #[must_use]
    pub fn is_favorite(&self, service_name: &str, style_name: &str) -> bool {
        let Some(key) = FavoriteKey::new(service_name, style_name) else {
            return false;
        };
        let state = self.lock();
        state.identity.is_some()
            && state
                .items
                .iter()
                .any(|item| item.key().as_ref() == Some(&key))
    }

    /// Add a favorite if it is not already present.
    ///
    /// Returns `false` without touching anything if the pair is already a
    /// favorite.
    pub async fn add(&self, service: &ServiceRef, style: &Style) -> bool {
        if self.is_favorite(&service.name, &style.name) {
            return false;
        }
        self.toggle(service, style).await
    }

    /// Remove a favorite if it is present.
    ///
    /// Returns `false` without touching anything if the pair is not a
    /// favorite.
    pub async fn remove(&self, service: &ServiceRef, style: &Style) -> bool {
        if !self.is_favorite(&service.name, &style.name) {
            return false;
        }
        self.toggle(service, style).await
    }

    /// Empty the favorites list and remove the namespace key entirely.
    ///
    /// Removing the key (rather than writing `[]`) matters: an absent
    /// namespace reads as "never had favorites" and stays eligible for
    /// legacy migration.
    pub async fn clear(&self) -> bool {
        let namespace = {
            let mut state = self.lock();
            let Some(namespace) =
                IdentityScopedStore::namespace_key(state.identity.as_ref())
            else {
                return false;
            };
            state.items.clear();
            namespace
        };
        self.inner.store.remove_key(&namespace).await
    }

    /// The current identity's favorites filtered by service name,
    /// case-insensitively. Empty when signed out.
    #[must_use]
    pub fn by_service(&self, service_name: &str) -> Vec<FavoriteItem> {
        let wanted = service_name.trim().to_lowercase();
        self.lock()
            .items
            .iter()
            .filter(|item| item.service.name.trim().to_lowercase() == wanted)
            .cloned()
            .collect()
    }

    /// Snapshot of the current items, in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<FavoriteItem> {
        self.lock().items.clone()
    }

    /// Whether a load is currently in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    /// The identity the cache is currently scoped to.
    #[must_use]
    pub fn identity(&self) -> Option<UserId> {
        self.lock().identity.clone()
    }
}

/// Build the persisted record for a newly favorited style.
///
/// Copies the style's fields, attaches the service, stamps timestamp and
/// owner, and normalizes images: a populated `images` list stays multi,
/// otherwise a single extracted reference is stored as `image`.
fn build_item(service: &ServiceRef, style: &Style, identity: &UserId) -> FavoriteItem {
    let refs = extract_image_refs(style);
    let multi = style
        .images
        .as_ref()
        .is_some_and(|images| images.iter().any(|s| !s.as_url().trim().is_empty()));

    let (image, images) = if refs.is_empty() {
        (None, None)
    } else if multi || refs.len() > 1 {
        (None, Some(refs))
    } else {
        (refs.into_iter().next(), None)
    };

    FavoriteItem {
        name: style.name.clone(),
        price: style.price.clone(),
        service: service.clone(),
        image,
        images,
        timestamp: Some(Utc::now()),
        user_id: Some(identity.clone()),
        migrated_at: None,
        backed_up_at: None,
        extra: style.extra.clone(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::kv::{KeyValueStore, KvError, MemoryKv};
    use bloom_core::{DisplayPrice, ImageSource};

    /// Backend whose reads block until released, for observing in-flight
    /// loads.
    struct GatedKv {
        inner: MemoryKv,
        gate: tokio::sync::Notify,
        reads: AtomicUsize,
    }

    impl GatedKv {
        fn new() -> Self {
            Self {
                inner: MemoryKv::new(),
                gate: tokio::sync::Notify::new(),
                reads: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl KeyValueStore for GatedKv {
        async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<(), KvError> {
            self.inner.remove(key).await
        }

        async fn remove_many(&self, keys: &[String]) -> Result<(), KvError> {
            self.inner.remove_many(keys).await
        }

        async fn list_keys(&self) -> Result<Vec<String>, KvError> {
            self.inner.list_keys().await
        }
    }

    fn cache() -> FavoritesCache {
        FavoritesCache::new(IdentityScopedStore::new(Arc::new(MemoryKv::new())))
    }

    fn style(name: &str) -> Style {
        Style::new(name, DisplayPrice::Amount(100.into()))
    }

    #[tokio::test]
    async fn test_toggle_without_identity_fails() {
        let cache = cache();
        assert!(!cache.toggle(&ServiceRef::new("Hair Cut"), &style("Buzz Cut")).await);
        assert!(cache.items().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_with_blank_style_name_fails() {
        let cache = cache();
        cache.set_identity(Some(UserId::parse("u1").unwrap())).await;
        assert!(!cache.toggle(&ServiceRef::new("Hair Cut"), &style("   ")).await);
    }

    #[tokio::test]
    async fn test_toggle_rejects_priceless_style_on_add() {
        let cache = cache();
        cache.set_identity(Some(UserId::parse("u1").unwrap())).await;
        let service = ServiceRef::new("Hair Cut");

        let mut priceless = style("Buzz Cut");
        priceless.price = None;

        assert!(!cache.toggle(&service, &priceless).await);
        assert!(cache.items().is_empty());

        // Removal only needs the names, so a price-less style still
        // toggles an existing favorite off.
        assert!(cache.toggle(&service, &style("Buzz Cut")).await);
        assert!(cache.toggle(&service, &priceless).await);
        assert!(cache.items().is_empty());
    }

    #[tokio::test]
    async fn test_load_no_ops_while_another_load_is_in_flight() {
        let kv = Arc::new(GatedKv::new());
        let cache = FavoritesCache::new(IdentityScopedStore::new(kv.clone()));

        let background = cache.clone();
        let sign_in = tokio::spawn(async move {
            background
                .set_identity(Some(UserId::parse("u1").unwrap()))
                .await;
        });
        while !cache.is_loading() {
            tokio::task::yield_now().await;
        }
        assert_eq!(kv.reads.load(Ordering::SeqCst), 1);

        // Guarded load returns immediately without touching storage.
        cache.load().await;
        assert_eq!(kv.reads.load(Ordering::SeqCst), 1);

        kv.gate.notify_one();
        sign_in.await.unwrap();
        assert!(!cache.is_loading());
    }

    #[tokio::test]
    async fn test_new_item_is_stamped() {
        let cache = cache();
        cache.set_identity(Some(UserId::parse("u1").unwrap())).await;
        assert!(cache.toggle(&ServiceRef::new("Hair Cut"), &style("Buzz Cut")).await);

        let items = cache.items();
        assert_eq!(items.len(), 1);
        let item = items.first().unwrap();
        assert_eq!(item.user_id.as_ref().map(UserId::as_str), Some("u1"));
        assert!(item.timestamp.is_some());
    }

    #[tokio::test]
    async fn test_single_image_stored_as_image() {
        let cache = cache();
        cache.set_identity(Some(UserId::parse("u1").unwrap())).await;

        let mut single = style("Buzz Cut");
        single.image = Some(ImageSource::Url("a.jpg".to_owned()));
        cache.toggle(&ServiceRef::new("Hair Cut"), &single).await;

        let items = cache.items();
        let item = items.first().unwrap();
        assert_eq!(item.image.as_deref(), Some("a.jpg"));
        assert!(item.images.is_none());
    }

    #[tokio::test]
    async fn test_one_element_images_list_stays_multi() {
        let cache = cache();
        cache.set_identity(Some(UserId::parse("u1").unwrap())).await;

        let mut package = style("Mini Package");
        package.images = Some(vec![ImageSource::Url("a.jpg".to_owned())]);
        cache.toggle(&ServiceRef::new("Foot Spa"), &package).await;

        let items = cache.items();
        let item = items.first().unwrap();
        assert!(item.image.is_none());
        assert_eq!(item.images.as_deref(), Some(["a.jpg".to_owned()].as_slice()));
    }

    #[tokio::test]
    async fn test_sign_out_clears_memory_but_not_storage() {
        let kv = Arc::new(MemoryKv::new());
        let store = IdentityScopedStore::new(kv);
        let cache = FavoritesCache::new(store.clone());

        cache.set_identity(Some(UserId::parse("u1").unwrap())).await;
        cache.toggle(&ServiceRef::new("Hair Cut"), &style("Buzz Cut")).await;
        cache.set_identity(None).await;

        assert!(cache.items().is_empty());
        assert_eq!(store.read_list("favorites_u1").await.len(), 1);
    }

    #[tokio::test]
    async fn test_add_and_remove_are_guarded_toggles() {
        let cache = cache();
        cache.set_identity(Some(UserId::parse("u1").unwrap())).await;
        let service = ServiceRef::new("Hair Cut");

        assert!(cache.add(&service, &style("Buzz Cut")).await);
        assert!(!cache.add(&service, &style("buzz cut")).await);
        assert_eq!(cache.items().len(), 1);

        assert!(cache.remove(&service, &style("BUZZ CUT")).await);
        assert!(!cache.remove(&service, &style("Buzz Cut")).await);
        assert!(cache.items().is_empty());
    }
}
