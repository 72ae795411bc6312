//! Picks the image bundle that best describes a variant.
//!
//! A bundle matches when its combo is a subset of the variant's attribute
//! set; the empty combo matches every variant. Among matches:
//!
//! 1. bundles with a non-empty combo come before the general bundle,
//! 2. larger combos (more specific) come before smaller ones,
//! 3. then the earliest created, then the lowest position.
//!
//! This is the only place that ranking lives. Listings, product detail, the
//! gallery and cart lines all call into it.

use crate::entities::commerce::AttributeImageModel;
use crate::models::attributes::AttributeSet;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;

/// The fields the resolver needs from a stored bundle.
pub trait ImageBundle {
    fn attribute_combo(&self) -> &AttributeSet;
    fn image_urls(&self) -> &[String];
    fn created_at(&self) -> DateTime<Utc>;
    fn position(&self) -> i32;
}

impl ImageBundle for AttributeImageModel {
    fn attribute_combo(&self) -> &AttributeSet {
        &self.attribute_combo
    }

    fn image_urls(&self) -> &[String] {
        &self.image_urls.0
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn position(&self) -> i32 {
        self.position
    }
}

/// Best matching bundle for `variant`, or `None` when nothing matches.
pub fn resolve_bundle<'a, B: ImageBundle>(
    bundles: &'a [B],
    variant: &AttributeSet,
) -> Option<&'a B> {
    bundles
        .iter()
        .filter(|b| b.attribute_combo().is_subset_of(variant))
        .min_by_key(|b| {
            let combo = b.attribute_combo();
            (
                combo.is_empty(),
                Reverse(combo.len()),
                b.created_at(),
                b.position(),
            )
        })
}

/// First image of the best matching bundle.
pub fn resolve_image<'a, B: ImageBundle>(bundles: &'a [B], variant: &AttributeSet) -> Option<&'a str> {
    resolve_bundle(bundles, variant)
        .and_then(|b| b.image_urls().first())
        .map(String::as_str)
}

/// First image of the earliest general bundle; the product's main image.
pub fn main_image<B: ImageBundle>(bundles: &[B]) -> Option<&str> {
    resolve_image(bundles, &AttributeSet::new())
}

/// Full image list of the best matching bundle, used for a detail gallery.
pub fn resolve_gallery<'a, B: ImageBundle>(bundles: &'a [B], variant: &AttributeSet) -> &'a [String] {
    resolve_bundle(bundles, variant)
        .map(|b| b.image_urls())
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attributes::ImageUrls;
    use chrono::Duration;
    use uuid::Uuid;

    fn set(pairs: &[(&str, &str)]) -> AttributeSet {
        pairs.iter().copied().collect()
    }

    fn bundle(combo: &[(&str, &str)], url: &str, age_secs: i64, position: i32) -> AttributeImageModel {
        AttributeImageModel {
            id: Uuid::new_v4(),
            product_id: Uuid::nil(),
            attribute_combo: set(combo),
            image_urls: ImageUrls(vec![url.to_string()]),
            position,
            created_at: Utc::now() - Duration::seconds(age_secs),
        }
    }

    #[test]
    fn picks_most_specific_subset_bundle() {
        let bundles = vec![
            bundle(&[], "general.jpg", 30, 0),
            bundle(&[("color", "Red")], "red.jpg", 20, 1),
            bundle(&[("color", "Red"), ("ram", "16")], "red-16.jpg", 10, 2),
        ];
        let variant = set(&[("color", "Red"), ("ram", "16"), ("cpu", "i5")]);

        assert_eq!(resolve_image(&bundles, &variant), Some("red-16.jpg"));
    }

    #[test]
    fn falls_back_to_general_bundle() {
        let bundles = vec![
            bundle(&[("color", "Blue")], "blue.jpg", 20, 0),
            bundle(&[], "general.jpg", 10, 1),
        ];
        let variant = set(&[("color", "Red")]);
        assert_eq!(resolve_image(&bundles, &variant), Some("general.jpg"));
        assert_eq!(main_image(&bundles), Some("general.jpg"));
    }

    #[test]
    fn no_match_yields_none() {
        let bundles = vec![bundle(&[("color", "Blue")], "blue.jpg", 20, 0)];
        assert_eq!(resolve_image(&bundles, &set(&[("color", "Red")])), None);
        assert_eq!(main_image(&bundles), None);
        assert!(resolve_gallery(&bundles, &set(&[("color", "Red")])).is_empty());
        let empty: Vec<AttributeImageModel> = Vec::new();
        assert_eq!(resolve_image(&empty, &set(&[("color", "Red")])), None);
    }

    #[test]
    fn equal_specificity_prefers_earliest_then_position() {
        let created = Utc::now();
        let mut older = bundle(&[("color", "Red")], "older.jpg", 0, 5);
        older.created_at = created - Duration::seconds(5);
        let mut first = bundle(&[("ram", "16")], "first.jpg", 0, 0);
        first.created_at = created;
        let mut second = bundle(&[("cpu", "i5")], "second.jpg", 0, 1);
        second.created_at = created;
        let variant = set(&[("color", "Red"), ("ram", "16"), ("cpu", "i5")]);

        let bundles = vec![second.clone(), first.clone(), older];
        assert_eq!(resolve_image(&bundles, &variant), Some("older.jpg"));

        let bundles = vec![second, first];
        assert_eq!(resolve_image(&bundles, &variant), Some("first.jpg"));
    }

    #[test]
    fn empty_url_list_resolves_to_none() {
        let mut b = bundle(&[("color", "Red")], "x", 0, 0);
        b.image_urls = ImageUrls(Vec::new());
        let bundles = vec![b];
        assert_eq!(resolve_image(&bundles, &set(&[("color", "Red")])), None);
    }
}
