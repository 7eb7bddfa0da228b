//! Composite favorite key.

use core::fmt;

/// Derived uniqueness key for a favorite: normalized service name plus
/// normalized style name.
///
/// Never persisted - recomputed from the record on demand. Two favorites
/// collide when their trimmed, lowercased service and style names match;
/// display casing on the stored record is unaffected.
///
/// ## Examples
///
/// ```
/// use bloom_core::FavoriteKey;
///
/// let a = FavoriteKey::new("Hair Cut", "Buzz Cut");
/// let b = FavoriteKey::new(" hair cut ", "BUZZ CUT");
/// assert_eq!(a, b);
/// assert!(FavoriteKey::new("", "Buzz Cut").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FavoriteKey(String);

impl FavoriteKey {
    /// Build a key from a service name and a style name.
    ///
    /// Returns `None` if either component is empty after trimming - such a
    /// pair has no identity and can never be stored.
    #[must_use]
    pub fn new(service_name: &str, style_name: &str) -> Option<Self> {
        let service = service_name.trim().to_lowercase();
        let style = style_name.trim().to_lowercase();
        if service.is_empty() || style.is_empty() {
            return None;
        }
        Some(Self(format!("{service}|{style}")))
    }

    /// Returns the normalized key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FavoriteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
