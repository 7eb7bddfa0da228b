//! Favorite records and the style/service input shapes.
//!
//! These types mirror the JSON the backend and older app builds produce,
//! so field names serialize in camelCase and unknown fields are carried
//! through untouched in `extra` maps. Styles come in two shapes: single
//! image (`image`) and multi-image packages (`images`); legacy records may
//! carry image references under alternate field names inside `extra`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::identity::UserId;
use super::key::FavoriteKey;

/// Display price as delivered by the backend: a number or pre-formatted
/// text (e.g. `"from $45"`).
///
/// The price is required for a favorite to be stored but plays no part in
/// its identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DisplayPrice {
    /// Numeric price.
    Amount(Decimal),
    /// Pre-formatted price text.
    Text(String),
}

/// An image reference as found on heterogeneous style records: either a
/// bare URL string or a `{ "uri": ... }` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageSource {
    /// Bare URL string.
    Url(String),
    /// Object wrapping the URL.
    Object {
        /// The image URL.
        uri: String,
    },
}

impl ImageSource {
    /// Returns the underlying URL.
    #[must_use]
    pub fn as_url(&self) -> &str {
        match self {
            Self::Url(url) => url,
            Self::Object { uri } => uri,
        }
    }
}

/// The service a style belongs to (e.g. "Hair Cut", "Foot Spa").
///
/// Only the name participates in favorite identity; any other fields the
/// caller passes along are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRef {
    /// Service display name.
    pub name: String,
    /// Additional service fields, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServiceRef {
    /// Create a service reference with just a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra: Map::new(),
        }
    }
}

/// A bookable style as screens hand it to the favorites cache.
///
/// This is the *input* shape: images may be missing, wrapped in objects,
/// or hiding under alternate field names in `extra` (`imageUrl`, `img`,
/// `photo`, ...). The cache normalizes it into a [`FavoriteItem`] on add.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    /// Style display name.
    pub name: String,
    /// Display price, if the caller has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<DisplayPrice>,
    /// Single image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageSource>,
    /// Ordered multi-image references (package styles).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageSource>>,
    /// Additional style fields, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Style {
    /// Create a style with just a name and price.
    #[must_use]
    pub fn new(name: impl Into<String>, price: DisplayPrice) -> Self {
        Self {
            name: name.into(),
            price: Some(price),
            image: None,
            images: None,
            extra: Map::new(),
        }
    }
}

/// A persisted favorite: a style the user marked as liked, plus
/// provenance.
///
/// ## Invariants (enforced by the favorites cache)
///
/// - At most one item per [`FavoriteKey`] per storage namespace.
/// - `service.name`, `name`, and `price` are present on every item the
///   cache writes; items failing this are dropped on load (self-healing).
/// - At most one of `image` / `images` is populated after
///   [`normalize_images`](Self::normalize_images); records predating this
///   rule are tolerated on read and normalized on the next write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteItem {
    /// Style display name (identity component, display casing preserved).
    pub name: String,
    /// Display price. Required for validity, optional here so legacy
    /// records still deserialize and can be dropped gracefully.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<DisplayPrice>,
    /// Owning service (identity component).
    pub service: ServiceRef,
    /// Single image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Ordered multi-image URLs (package styles).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    /// When the favorite was added.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Identity that owns the record. Redundant with the storage
    /// namespace; kept for cross-checks and migration provenance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// Set when the record was copied from the legacy global store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrated_at: Option<DateTime<Utc>>,
    /// Set by older builds that stamped records during backup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backed_up_at: Option<DateTime<Utc>>,
    /// Fields carried over from the source style, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FavoriteItem {
    /// Whether the record satisfies the required-field invariant:
    /// non-empty `service.name`, non-empty `name`, and a defined `price`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.service.name.trim().is_empty() && !self.name.trim().is_empty() && self.price.is_some()
    }

    /// The composite favorite key, or `None` if a name component is empty.
    #[must_use]
    pub fn key(&self) -> Option<FavoriteKey> {
        FavoriteKey::new(&self.service.name, &self.name)
    }

    /// Enforce the at-most-one-of `image`/`images` rule in place.
    ///
    /// A populated `images` list wins over `image`; an empty `images` list
    /// is dropped. Records with neither are left alone - there is nothing
    /// to normalize them from.
    pub fn normalize_images(&mut self) {
        if let Some(images) = &self.images {
            if images.is_empty() {
                self.images = None;
            } else {
                self.image = None;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(service: &str, name: &str, price: Option<DisplayPrice>) -> FavoriteItem {
        FavoriteItem {
            name: name.to_owned(),
            price,
            service: ServiceRef::new(service),
            image: None,
            images: None,
            timestamp: None,
            user_id: None,
            migrated_at: None,
            backed_up_at: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn test_display_price_accepts_number_and_text() {
        let amount: DisplayPrice = serde_json::from_str("100").unwrap();
        assert!(matches!(amount, DisplayPrice::Amount(_)));

        let text: DisplayPrice = serde_json::from_str("\"from $45\"").unwrap();
        assert_eq!(text, DisplayPrice::Text("from $45".to_owned()));
    }

    #[test]
    fn test_image_source_shapes() {
        let url: ImageSource = serde_json::from_str("\"a.jpg\"").unwrap();
        assert_eq!(url.as_url(), "a.jpg");

        let object: ImageSource = serde_json::from_str(r#"{"uri":"b.jpg"}"#).unwrap();
        assert_eq!(object.as_url(), "b.jpg");
    }

    #[test]
    fn test_is_valid_requires_names_and_price() {
        assert!(item("Hair Cut", "Buzz Cut", Some(DisplayPrice::Amount(100.into()))).is_valid());
        assert!(!item("Hair Cut", "Buzz Cut", None).is_valid());
        assert!(!item("", "Buzz Cut", Some(DisplayPrice::Amount(100.into()))).is_valid());
        assert!(!item("Hair Cut", "  ", Some(DisplayPrice::Amount(100.into()))).is_valid());
    }

    #[test]
    fn test_camel_case_wire_format() {
        let mut fav = item("Hair Cut", "Buzz Cut", Some(DisplayPrice::Amount(100.into())));
        fav.user_id = Some(UserId::parse("u1").unwrap());
        fav.migrated_at = Some(Utc::now());

        let json = serde_json::to_value(&fav).unwrap();
        assert!(json.get("userId").is_some());
        assert!(json.get("migratedAt").is_some());
        assert!(json.get("user_id").is_none());
    }

    #[test]
    fn test_unknown_fields_round_trip_through_extra() {
        let raw = r#"{
            "name": "Buzz Cut",
            "price": 100,
            "service": {"name": "Hair Cut", "durationMinutes": 30},
            "stylist": "Dana"
        }"#;
        let fav: FavoriteItem = serde_json::from_str(raw).unwrap();
        assert_eq!(fav.extra.get("stylist"), Some(&Value::String("Dana".into())));
        assert!(fav.service.extra.contains_key("durationMinutes"));

        let back = serde_json::to_value(&fav).unwrap();
        assert_eq!(back.get("stylist"), Some(&Value::String("Dana".into())));
    }

    #[test]
    fn test_normalize_images_prefers_images() {
        let mut fav = item("Foot Spa", "Deluxe", Some(DisplayPrice::Amount(250.into())));
        fav.image = Some("a.jpg".to_owned());
        fav.images = Some(vec!["a.jpg".to_owned(), "b.jpg".to_owned()]);
        fav.normalize_images();
        assert!(fav.image.is_none());
        assert_eq!(fav.images.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_normalize_images_drops_empty_list() {
        let mut fav = item("Foot Spa", "Deluxe", Some(DisplayPrice::Amount(250.into())));
        fav.image = Some("a.jpg".to_owned());
        fav.images = Some(Vec::new());
        fav.normalize_images();
        assert_eq!(fav.image.as_deref(), Some("a.jpg"));
        assert!(fav.images.is_none());
    }
}
