//! Cartesian variant generation.
//!
//! Every option-kind attribute of the category that has at least one chosen
//! value contributes one axis; each tuple of the cartesian product becomes one
//! [`VariantDraft`]. Axes follow the schema's declaration order, so names and
//! generated skus are stable across regenerations.

use crate::entities::commerce::VariantStatus;
use crate::models::attributes::{AttributeSchema, AttributeSet};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Base used when the product has no sku of its own.
pub const DEFAULT_BASE_SKU: &str = "SKU";

/// Chosen values per attribute name, in the order the admin picked them.
pub type OptionSelections = BTreeMap<String, Vec<String>>;

/// A variant before it is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantDraft {
    /// Id of the persisted variant this draft was matched with, if any
    #[serde(default)]
    pub id: Option<Uuid>,
    pub sku: String,
    pub name: String,
    pub attribute_set: AttributeSet,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub compare_at_price: Option<Decimal>,
    #[serde(default)]
    pub cost: Option<Decimal>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub status: VariantStatus,
}

/// Generates one draft per combination of chosen option values.
///
/// Selections for names missing from `schema`, or for text-kind attributes,
/// are ignored. Repeated values collapse to their first occurrence. When no
/// option attribute has a value the result is empty.
pub fn generate_variants(
    schema: &AttributeSchema,
    selections: &OptionSelections,
    base_sku: Option<&str>,
) -> Vec<VariantDraft> {
    let axes = option_axes(schema, selections);
    if axes.is_empty() {
        return Vec::new();
    }

    let base = base_sku
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_BASE_SKU);

    cartesian(&axes)
        .into_iter()
        .map(|attribute_set| VariantDraft {
            id: None,
            sku: synthesize_sku(base, &attribute_set),
            name: attribute_set.display_name(),
            attribute_set,
            price: Decimal::ZERO,
            compare_at_price: None,
            cost: None,
            stock: 0,
            status: VariantStatus::Active,
        })
        .collect()
}

/// Generates drafts and carries hand-edited fields over from `previous`.
///
/// A generated draft whose attribute set equals (ignoring order) the set of a
/// previous variant keeps that variant's id, sku, prices, stock and status.
pub fn regenerate_variants(
    schema: &AttributeSchema,
    selections: &OptionSelections,
    base_sku: Option<&str>,
    previous: &[VariantDraft],
) -> Vec<VariantDraft> {
    let by_key: HashMap<Vec<(String, String)>, &VariantDraft> = previous
        .iter()
        .map(|draft| (draft.attribute_set.key(), draft))
        .collect();

    generate_variants(schema, selections, base_sku)
        .into_iter()
        .map(|mut draft| {
            if let Some(prev) = by_key.get(&draft.attribute_set.key()) {
                draft.id = prev.id;
                draft.sku = prev.sku.clone();
                draft.price = prev.price;
                draft.compare_at_price = prev.compare_at_price;
                draft.cost = prev.cost;
                draft.stock = prev.stock;
                draft.status = prev.status;
            }
            draft
        })
        .collect()
}

/// `BASE-` followed by the first three characters of each value, uppercased.
pub fn synthesize_sku(base: &str, attribute_set: &AttributeSet) -> String {
    let mut parts = vec![base.to_string()];
    parts.extend(attribute_set.iter().map(|pair| {
        pair.value
            .trim()
            .chars()
            .take(3)
            .collect::<String>()
            .to_uppercase()
    }));
    parts.join("-")
}

fn option_axes(schema: &AttributeSchema, selections: &OptionSelections) -> Vec<(String, Vec<String>)> {
    schema
        .options()
        .filter_map(|def| {
            let chosen = selections.get(&def.name)?;
            let mut values: Vec<String> = Vec::with_capacity(chosen.len());
            for value in chosen {
                let value = value.trim();
                if !value.is_empty() && !values.iter().any(|v| v == value) {
                    values.push(value.to_string());
                }
            }
            if values.is_empty() {
                None
            } else {
                Some((def.name.clone(), values))
            }
        })
        .collect()
}

fn cartesian(axes: &[(String, Vec<String>)]) -> Vec<AttributeSet> {
    let mut combos: Vec<Vec<(&str, &str)>> = vec![Vec::new()];
    for (name, values) in axes {
        let mut next = Vec::with_capacity(combos.len() * values.len());
        for combo in &combos {
            for value in values {
                let mut extended = combo.clone();
                extended.push((name.as_str(), value.as_str()));
                next.push(extended);
            }
        }
        combos = next;
    }
    combos
        .into_iter()
        .map(|combo| combo.into_iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attributes::AttributeDefinition;
    use rust_decimal_macros::dec;

    fn laptop_schema() -> AttributeSchema {
        AttributeSchema(vec![
            AttributeDefinition::option("color"),
            AttributeDefinition::text("weight"),
            AttributeDefinition::option("ram"),
        ])
    }

    fn selections(entries: &[(&str, &[&str])]) -> OptionSelections {
        entries
            .iter()
            .map(|(name, values)| {
                (
                    name.to_string(),
                    values.iter().map(|v| v.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn generates_cartesian_product_in_declaration_order() {
        let drafts = generate_variants(
            &laptop_schema(),
            &selections(&[("ram", &["8GB", "16GB"]), ("color", &["Red", "Blue"])]),
            Some("LAP"),
        );

        assert_eq!(drafts.len(), 4);
        assert_eq!(drafts[0].name, "Red - 8GB");
        assert_eq!(drafts[0].sku, "LAP-RED-8GB");
        assert_eq!(drafts[3].name, "Blue - 16GB");
        assert_eq!(drafts[3].sku, "LAP-BLU-16G");
        assert!(drafts
            .iter()
            .all(|d| d.price == Decimal::ZERO && d.stock == 0 && d.status == VariantStatus::Active));
    }

    #[test]
    fn skips_unknown_text_and_empty_selections() {
        let drafts = generate_variants(
            &laptop_schema(),
            &selections(&[
                ("color", &["Red"]),
                ("weight", &["1kg", "2kg"]),
                ("size", &["L", "XL"]),
                ("ram", &[]),
            ]),
            None,
        );

        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].sku, "SKU-RED");
        assert_eq!(drafts[0].attribute_set.len(), 1);
    }

    #[test]
    fn no_option_values_means_no_variants() {
        assert!(generate_variants(&laptop_schema(), &OptionSelections::new(), None).is_empty());
    }

    #[test]
    fn repeated_values_collapse() {
        let drafts = generate_variants(
            &laptop_schema(),
            &selections(&[("color", &["Red", " Red", "Blue"])]),
            None,
        );
        assert_eq!(drafts.len(), 2);
    }

    #[test]
    fn regeneration_keeps_hand_edited_fields() {
        let schema = laptop_schema();
        let first = selections(&[("color", &["Red", "Blue"]), ("ram", &["8GB"])]);
        let mut previous = generate_variants(&schema, &first, Some("LAP"));
        let kept_id = Uuid::new_v4();
        previous[1].id = Some(kept_id);
        previous[1].price = dec!(1200);
        previous[1].stock = 7;
        previous[1].sku = "CUSTOM-1".into();

        let second = selections(&[("color", &["Blue", "Green"]), ("ram", &["8GB"])]);
        let drafts = regenerate_variants(&schema, &second, Some("LAP"), &previous);

        assert_eq!(drafts.len(), 2);
        let blue = &drafts[0];
        assert_eq!(blue.attribute_set.get("color"), Some("Blue"));
        assert_eq!(blue.id, Some(kept_id));
        assert_eq!(blue.price, dec!(1200));
        assert_eq!(blue.stock, 7);
        assert_eq!(blue.sku, "CUSTOM-1");

        let green = &drafts[1];
        assert_eq!(green.id, None);
        assert_eq!(green.price, Decimal::ZERO);
    }
}
