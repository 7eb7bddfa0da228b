//! Image-reference extraction from heterogeneous style records.
//!
//! Styles arrive with images in several shapes: a multi-image `images`
//! array, a single `image` (string or `{uri}` object), or one of the
//! alternate field names older backends used. Extraction checks a fixed,
//! ordered list of fields and the first non-empty match wins.

use serde_json::Value;

use bloom_core::Style;

/// Alternate field names checked after the typed `images`/`image` fields,
/// in order.
const ALTERNATE_FIELDS: &[&str] = &["imageUrl", "imageUrls", "img", "photo"];

/// Extract the ordered image references of a style.
///
/// Checks, in order: `images`, `image`, `imageUrl`, `imageUrls`, `img`,
/// `photo`. The first field that yields at least one non-empty reference
/// wins; an empty vector means the style has no usable image.
#[must_use]
pub fn extract_image_refs(style: &Style) -> Vec<String> {
    if let Some(images) = &style.images {
        let refs: Vec<String> = images
            .iter()
            .map(|source| source.as_url().trim())
            .filter(|url| !url.is_empty())
            .map(str::to_owned)
            .collect();
        if !refs.is_empty() {
            return refs;
        }
    }

    if let Some(image) = &style.image {
        let url = image.as_url().trim();
        if !url.is_empty() {
            return vec![url.to_owned()];
        }
    }

    for field in ALTERNATE_FIELDS {
        if let Some(value) = style.extra.get(*field) {
            let refs = refs_from_value(value);
            if !refs.is_empty() {
                return refs;
            }
        }
    }

    Vec::new()
}

/// Pull image references out of an untyped JSON value: a string, a
/// `{uri}` object, or an array of either.
fn refs_from_value(value: &Value) -> Vec<String> {
    match value {
        Value::Array(values) => values.iter().filter_map(ref_from_value).collect(),
        _ => ref_from_value(value).into_iter().collect(),
    }
}

fn ref_from_value(value: &Value) -> Option<String> {
    let url = match value {
        Value::String(url) => url,
        Value::Object(object) => object.get("uri")?.as_str()?,
        _ => return None,
    };
    let url = url.trim();
    if url.is_empty() {
        None
    } else {
        Some(url.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bloom_core::{DisplayPrice, ImageSource};
    use serde_json::json;

    fn style() -> Style {
        Style::new("Buzz Cut", DisplayPrice::Amount(100.into()))
    }

    #[test]
    fn test_images_array_wins() {
        let mut style = style();
        style.images = Some(vec![
            ImageSource::Url("a.jpg".to_owned()),
            ImageSource::Object {
                uri: "b.jpg".to_owned(),
            },
        ]);
        style.image = Some(ImageSource::Url("ignored.jpg".to_owned()));

        assert_eq!(extract_image_refs(&style), vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_empty_images_falls_through_to_image() {
        let mut style = style();
        style.images = Some(Vec::new());
        style.image = Some(ImageSource::Url("a.jpg".to_owned()));

        assert_eq!(extract_image_refs(&style), vec!["a.jpg"]);
    }

    #[test]
    fn test_image_object_shape() {
        let mut style = style();
        style.image = Some(ImageSource::Object {
            uri: "a.jpg".to_owned(),
        });

        assert_eq!(extract_image_refs(&style), vec!["a.jpg"]);
    }

    #[test]
    fn test_alternate_field_order() {
        let mut style = style();
        style.extra.insert("photo".to_owned(), json!("photo.jpg"));
        style.extra.insert("imageUrl".to_owned(), json!("url.jpg"));

        // imageUrl precedes photo in the contract.
        assert_eq!(extract_image_refs(&style), vec!["url.jpg"]);
    }

    #[test]
    fn test_image_urls_array_alternate() {
        let mut style = style();
        style
            .extra
            .insert("imageUrls".to_owned(), json!(["a.jpg", {"uri": "b.jpg"}, ""]));

        assert_eq!(extract_image_refs(&style), vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_blank_strings_do_not_match() {
        let mut style = style();
        style.image = Some(ImageSource::Url("   ".to_owned()));
        style.extra.insert("img".to_owned(), json!("fallback.jpg"));

        assert_eq!(extract_image_refs(&style), vec!["fallback.jpg"]);
    }

    #[test]
    fn test_no_image_fields() {
        assert!(extract_image_refs(&style()).is_empty());
    }

    #[test]
    fn test_non_string_values_ignored() {
        let mut style = style();
        style.extra.insert("imageUrl".to_owned(), json!(42));
        style.extra.insert("photo".to_owned(), json!({"url": "wrong-key.jpg"}));

        assert!(extract_image_refs(&style).is_empty());
    }
}
