//! Bloom Favorites - identity-scoped favorites cache and migration.
//!
//! # Architecture
//!
//! - [`kv`] - the device key-value storage contract ([`KeyValueStore`])
//!   plus in-memory and JSON-file backends
//! - [`store`] - [`IdentityScopedStore`]: maps an identity to a storage
//!   namespace and reads/writes favorite lists there, fail-soft
//! - [`cache`] - [`FavoritesCache`]: the authoritative in-memory view of
//!   the current identity's favorites, with toggle/query operations
//! - [`migration`] - [`MigrationAgent`]: one-time legacy migration plus
//!   backup/restore/statistics utilities
//! - [`images`] - pure image-reference extraction from heterogeneous
//!   style records
//! - [`session`] - [`SessionHooks`]: wires sign-in/sign-out transitions
//!   into the cache and migration agent
//!
//! Nothing here throws across the public API boundary: operations return
//! `bool`/`Option`/`Vec` and degrade to "visible in memory, not persisted"
//! on storage failure. A local cache must never crash a screen over a
//! storage hiccup.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use bloom_favorites::{FavoritesCache, IdentityScopedStore, MemoryKv};
//! use bloom_core::{DisplayPrice, ServiceRef, Style, UserId};
//!
//! let store = IdentityScopedStore::new(Arc::new(MemoryKv::new()));
//! let cache = FavoritesCache::new(store);
//!
//! cache.set_identity(Some(UserId::parse("u1")?)).await;
//! let service = ServiceRef::new("Hair Cut");
//! let style = Style::new("Buzz Cut", DisplayPrice::Amount(100.into()));
//! cache.toggle(&service, &style).await;
//! assert!(cache.is_favorite("hair cut", "BUZZ CUT"));
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod images;
pub mod kv;
pub mod migration;
pub mod session;
pub mod store;

pub use cache::FavoritesCache;
pub use images::extract_image_refs;
pub use kv::{JsonFileKv, KeyValueStore, KvError, MemoryKv};
pub use migration::{BackupRef, MigrationAgent, NamespaceStats};
pub use session::SessionHooks;
pub use store::IdentityScopedStore;
