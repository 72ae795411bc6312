//! Property-based tests for variant generation, image resolution and media paths.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use storefront_core::{
    media,
    models::attributes::{AttributeDefinition, AttributeSchema, AttributeSet},
    services::commerce::{
        image_resolver::{resolve_bundle, ImageBundle},
        variant_generator::{generate_variants, regenerate_variants},
        OptionSelections,
    },
};
use uuid::Uuid;

fn schema_of(names: &[String]) -> AttributeSchema {
    let mut definitions: Vec<AttributeDefinition> =
        names.iter().map(|n| AttributeDefinition::option(n.clone())).collect();
    definitions.push(AttributeDefinition::text("notes"));
    AttributeSchema::normalized(definitions).unwrap()
}

fn selections_strategy() -> impl Strategy<Value = OptionSelections> {
    prop::collection::vec(prop::collection::vec("[a-c]{1,2}", 0..4), 1..4).prop_map(|axes| {
        axes.into_iter()
            .enumerate()
            .map(|(i, values)| (format!("attr{}", i), values))
            .collect::<BTreeMap<_, _>>()
    })
}

fn distinct_count(values: &[String]) -> usize {
    values.iter().collect::<HashSet<_>>().len()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn generated_count_is_the_product_of_distinct_values(selections in selections_strategy()) {
        let names: Vec<String> = selections.keys().cloned().collect();
        let schema = schema_of(&names);
        let drafts = generate_variants(&schema, &selections, Some("BASE"));

        let non_empty: Vec<usize> = selections
            .values()
            .map(|v| distinct_count(v))
            .filter(|n| *n > 0)
            .collect();
        let expected = if non_empty.is_empty() { 0 } else { non_empty.iter().product() };
        prop_assert_eq!(drafts.len(), expected);

        let keys: HashSet<_> = drafts.iter().map(|d| d.attribute_set.key()).collect();
        prop_assert_eq!(keys.len(), drafts.len());
        for draft in &drafts {
            prop_assert_eq!(draft.attribute_set.len(), non_empty.len());
            prop_assert!(draft.sku.starts_with("BASE-"));
            prop_assert!(draft.attribute_set.get("notes").is_none());
        }
    }

    #[test]
    fn regeneration_keeps_every_existing_variant(selections in selections_strategy()) {
        let names: Vec<String> = selections.keys().cloned().collect();
        let schema = schema_of(&names);
        let stored: Vec<_> = generate_variants(&schema, &selections, None)
            .into_iter()
            .enumerate()
            .map(|(i, mut draft)| {
                draft.id = Some(Uuid::new_v4());
                draft.stock = i as i32;
                draft.sku = format!("KEEP-{}", i);
                draft
            })
            .collect();

        let again = regenerate_variants(&schema, &selections, None, &stored);
        prop_assert_eq!(again.len(), stored.len());
        for (before, after) in stored.iter().zip(&again) {
            prop_assert_eq!(before.id, after.id);
            prop_assert_eq!(&before.sku, &after.sku);
            prop_assert_eq!(before.stock, after.stock);
        }
    }
}

struct Bundle {
    combo: AttributeSet,
    urls: Vec<String>,
    created_at: DateTime<Utc>,
    position: i32,
}

impl ImageBundle for Bundle {
    fn attribute_combo(&self) -> &AttributeSet {
        &self.combo
    }

    fn image_urls(&self) -> &[String] {
        &self.urls
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn position(&self) -> i32 {
        self.position
    }
}

fn pairs_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::btree_map("[xyz]", "[12]", 0..3)
        .prop_map(|m| m.into_iter().collect::<Vec<_>>())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn resolver_picks_the_most_specific_matching_bundle(
        variant in pairs_strategy(),
        combos in prop::collection::vec(pairs_strategy(), 0..6),
    ) {
        let variant: AttributeSet = variant.into_iter().collect();
        let epoch = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bundles: Vec<Bundle> = combos
            .into_iter()
            .enumerate()
            .map(|(i, pairs)| Bundle {
                combo: pairs.into_iter().collect(),
                urls: vec![format!("/img/{}.jpg", i)],
                created_at: epoch + Duration::seconds(i as i64),
                position: 0,
            })
            .collect();

        let matching: Vec<&Bundle> = bundles
            .iter()
            .filter(|b| b.combo.is_subset_of(&variant))
            .collect();
        match resolve_bundle(&bundles, &variant) {
            None => prop_assert!(matching.is_empty()),
            Some(best) => {
                prop_assert!(best.combo.is_subset_of(&variant));
                let widest = matching.iter().map(|b| b.combo.len()).max().unwrap_or(0);
                prop_assert_eq!(best.combo.len(), widest);
            }
        }
    }

    #[test]
    fn stored_media_paths_stay_under_the_base(path in "/[a-z0-9/]{0,20}\\.jpg") {
        let base = "https://cdn.example.test";
        let stored = media::strip_base(base, &format!("{}{}", base, path));
        prop_assert!(stored.starts_with('/'));
        prop_assert!(!stored.starts_with("//"));
        prop_assert_eq!(stored.trim_start_matches('/'), path.trim_start_matches('/'));

        let served = media::absolutize(base, &stored);
        prop_assert_eq!(&served, &format!("{}{}", base, stored));
        prop_assert_eq!(media::strip_base(base, &served), stored);
    }

    #[test]
    fn lookalike_hosts_are_never_stripped(suffix in "[a-z]{1,8}\\.[a-z]{2,3}/[a-z]{1,8}\\.jpg") {
        let base = "https://cdn.example.test";
        let foreign = format!("{}.{}", base, suffix);
        prop_assert_eq!(media::strip_base(base, &foreign), foreign);
    }
}
