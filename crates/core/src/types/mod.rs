//! Shared type definitions.
//!
//! All types here are plain data: serde-serializable, no I/O.

mod favorite;
mod identity;
mod key;

pub use favorite::{DisplayPrice, FavoriteItem, ImageSource, ServiceRef, Style};
pub use identity::{IdentityError, UserId};
pub use key::FavoriteKey;
