//! Attribute vocabulary shared by categories, variants and image bundles.
//!
//! Attribute bags arrive in two shapes: a list of `{name, value}` pairs or a
//! plain `{name: value}` object. Both normalize into [`AttributeSet`], an
//! ordered list of pairs with at most one value per name. Equality between
//! sets ignores order, so `{color: Red, ram: 16}` equals `{ram: 16, color: Red}`.

use crate::errors::ServiceError;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Whether an attribute is descriptive text or a selectable option.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    /// Descriptive property stored in product specs (e.g. weight)
    #[default]
    Text,
    /// Selectable property whose values generate variants (e.g. color)
    Option,
}

impl AttributeKind {
    pub fn is_option(self) -> bool {
        matches!(self, AttributeKind::Option)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub name: String,
    #[serde(default)]
    pub kind: AttributeKind,
}

impl AttributeDefinition {
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Text,
        }
    }

    pub fn option(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Option,
        }
    }
}

/// Ordered attribute definitions of one category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct AttributeSchema(pub Vec<AttributeDefinition>);

impl AttributeSchema {
    /// Trims names and rejects empty or duplicate (case-sensitive) names.
    pub fn normalized(definitions: Vec<AttributeDefinition>) -> Result<Self, ServiceError> {
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(definitions.len());
        for def in definitions {
            let name = def.name.trim().to_string();
            if name.is_empty() {
                return Err(ServiceError::validation("attribute name cannot be empty"));
            }
            if !seen.insert(name.clone()) {
                return Err(ServiceError::validation(format!(
                    "duplicate attribute name '{}'",
                    name
                )));
            }
            out.push(AttributeDefinition {
                name,
                kind: def.kind,
            });
        }
        Ok(Self(out))
    }

    pub fn definitions(&self) -> &[AttributeDefinition] {
        &self.0
    }

    pub fn get(&self, name: &str) -> Option<&AttributeDefinition> {
        self.0.iter().find(|d| d.name == name)
    }

    pub fn kind_of(&self, name: &str) -> Option<AttributeKind> {
        self.get(name).map(|d| d.kind)
    }

    /// Option-kind definitions in declaration order.
    pub fn options(&self) -> impl Iterator<Item = &AttributeDefinition> {
        self.0.iter().filter(|d| d.kind.is_option())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One `{name, value}` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributePair {
    pub name: String,
    #[serde(deserialize_with = "scalar_as_string")]
    pub value: String,
}

impl AttributePair {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Canonical attribute bag; see the module docs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(try_from = "AttributeBag", into = "Vec<AttributePair>")]
pub struct AttributeSet(Vec<AttributePair>);

/// Accepted wire shapes of an attribute bag.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AttributeBag {
    Pairs(Vec<AttributePair>),
    Map(BTreeMap<String, serde_json::Value>),
}

impl TryFrom<AttributeBag> for AttributeSet {
    type Error = String;

    fn try_from(bag: AttributeBag) -> Result<Self, Self::Error> {
        let pairs = match bag {
            AttributeBag::Pairs(pairs) => pairs,
            AttributeBag::Map(map) => map
                .into_iter()
                .filter_map(|(name, value)| json_scalar(&value).map(|v| AttributePair::new(name, v)))
                .collect(),
        };
        AttributeSet::try_from_pairs(pairs).map_err(|e| e.to_string())
    }
}

impl From<AttributeSet> for Vec<AttributePair> {
    fn from(set: AttributeSet) -> Self {
        set.0
    }
}

impl PartialEq for AttributeSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.is_subset_of(other)
    }
}

impl Eq for AttributeSet {}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set, trimming names and rejecting empty or repeated names.
    pub fn try_from_pairs(pairs: Vec<AttributePair>) -> Result<Self, ServiceError> {
        let mut set = Self::new();
        for pair in pairs {
            set.insert(pair.name, pair.value)?;
        }
        Ok(set)
    }

    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ServiceError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::validation("attribute name cannot be empty"));
        }
        if self.get(&name).is_some() {
            return Err(ServiceError::validation(format!(
                "attribute '{}' appears more than once",
                name
            )));
        }
        self.0.push(AttributePair {
            name,
            value: value.into(),
        });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    pub fn contains(&self, name: &str, value: &str) -> bool {
        self.get(name) == Some(value)
    }

    /// True when every pair of `self` is present in `other`.
    pub fn is_subset_of(&self, other: &AttributeSet) -> bool {
        self.0.iter().all(|p| other.contains(&p.name, &p.value))
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributePair> {
        self.0.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Order-independent identity, usable as a map key.
    pub fn key(&self) -> Vec<(String, String)> {
        let mut key: Vec<_> = self
            .0
            .iter()
            .map(|p| (p.name.clone(), p.value.clone()))
            .collect();
        key.sort();
        key
    }

    /// Values joined by `" - "` in set order.
    pub fn display_name(&self) -> String {
        self.0
            .iter()
            .map(|p| p.value.as_str())
            .collect::<Vec<_>>()
            .join(" - ")
    }

    /// Rejects names the schema does not declare as option attributes.
    pub fn ensure_options_of(&self, schema: &AttributeSchema) -> Result<(), ServiceError> {
        for pair in &self.0 {
            match schema.kind_of(&pair.name) {
                Some(AttributeKind::Option) => {}
                Some(AttributeKind::Text) => {
                    return Err(ServiceError::validation(format!(
                        "attribute '{}' is a text attribute and cannot key a variant or image",
                        pair.name
                    )))
                }
                None => {
                    return Err(ServiceError::validation(format!(
                        "attribute '{}' is not defined for this category",
                        pair.name
                    )))
                }
            }
        }
        Ok(())
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for AttributeSet {
    /// Later duplicates of a name are dropped.
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (name, value) in iter {
            let _ = set.insert(name, value);
        }
        set
    }
}

/// Free-text product properties keyed by text-kind attribute name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct ProductSpecs(pub BTreeMap<String, String>);

impl ProductSpecs {
    /// Keeps entries whose name is a text attribute of `schema`; returns the
    /// names that were dropped.
    pub fn retain_text_of(&mut self, schema: &AttributeSchema) -> Vec<String> {
        let mut dropped = Vec::new();
        self.0.retain(|name, _| {
            let keep = schema.kind_of(name) == Some(AttributeKind::Text);
            if !keep {
                dropped.push(name.clone());
            }
            keep
        });
        dropped
    }
}

/// Ordered image paths of one bundle, stored without the media base URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct ImageUrls(pub Vec<String>);

impl ImageUrls {
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }
}

fn json_scalar(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn scalar_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    json_scalar(&value)
        .ok_or_else(|| serde::de::Error::custom("attribute value must be a string, number or bool"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set(pairs: &[(&str, &str)]) -> AttributeSet {
        pairs.iter().copied().collect()
    }

    #[test]
    fn accepts_both_bag_shapes() {
        let from_pairs: AttributeSet = serde_json::from_value(json!([
            {"name": "color", "value": "Red"},
            {"name": "ram", "value": 16}
        ]))
        .unwrap();
        let from_map: AttributeSet =
            serde_json::from_value(json!({"ram": "16", "color": "Red"})).unwrap();

        assert_eq!(from_pairs, from_map);
        assert_eq!(from_pairs.get("ram"), Some("16"));
    }

    #[test]
    fn serializes_as_pair_list() {
        let value = serde_json::to_value(set(&[("color", "Red")])).unwrap();
        assert_eq!(value, json!([{"name": "color", "value": "Red"}]));
    }

    #[test]
    fn rejects_repeated_names() {
        let result: Result<AttributeSet, _> = serde_json::from_value(json!([
            {"name": "color", "value": "Red"},
            {"name": "color", "value": "Blue"}
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn equality_ignores_order() {
        assert_eq!(
            set(&[("color", "Red"), ("ram", "16")]),
            set(&[("ram", "16"), ("color", "Red")])
        );
        assert_ne!(set(&[("color", "Red")]), set(&[("color", "Red"), ("ram", "16")]));
        assert_eq!(
            set(&[("ram", "16"), ("color", "Red")]).key(),
            set(&[("color", "Red"), ("ram", "16")]).key()
        );
    }

    #[test]
    fn subset_relation() {
        let variant = set(&[("color", "Red"), ("ram", "16"), ("cpu", "i5")]);
        assert!(AttributeSet::new().is_subset_of(&variant));
        assert!(set(&[("color", "Red")]).is_subset_of(&variant));
        assert!(!set(&[("color", "Blue")]).is_subset_of(&variant));
        assert!(!set(&[("size", "L")]).is_subset_of(&variant));
    }

    #[test]
    fn schema_rejects_duplicates_and_defaults_kind() {
        let schema: Vec<AttributeDefinition> =
            serde_json::from_value(json!([{"name": "weight"}, {"name": "color", "kind": "option"}]))
                .unwrap();
        let schema = AttributeSchema::normalized(schema).unwrap();
        assert_eq!(schema.kind_of("weight"), Some(AttributeKind::Text));
        assert_eq!(schema.options().count(), 1);

        let dup = AttributeSchema::normalized(vec![
            AttributeDefinition::option("Color"),
            AttributeDefinition::text(" Color "),
        ]);
        assert!(matches!(dup, Err(ServiceError::ValidationError(_))));

        let case_differs = AttributeSchema::normalized(vec![
            AttributeDefinition::option("Color"),
            AttributeDefinition::option("color"),
        ]);
        assert!(case_differs.is_ok());
    }

    #[test]
    fn rejects_unknown_kind() {
        let result: Result<AttributeDefinition, _> =
            serde_json::from_value(json!({"name": "color", "kind": "range"}));
        assert!(result.is_err());
    }

    #[test]
    fn specs_keep_only_text_attributes() {
        let schema = AttributeSchema(vec![
            AttributeDefinition::text("weight"),
            AttributeDefinition::option("color"),
        ]);
        let mut specs = ProductSpecs(
            [("weight", "1kg"), ("color", "Red"), ("misc", "x")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        let mut dropped = specs.retain_text_of(&schema);
        dropped.sort();
        assert_eq!(dropped, vec!["color".to_string(), "misc".to_string()]);
        assert_eq!(specs.0.get("weight").map(String::as_str), Some("1kg"));
    }

    #[test]
    fn ensure_options_of_checks_kind() {
        let schema = AttributeSchema(vec![
            AttributeDefinition::text("weight"),
            AttributeDefinition::option("color"),
        ]);
        assert!(set(&[("color", "Red")]).ensure_options_of(&schema).is_ok());
        assert!(set(&[("weight", "1kg")]).ensure_options_of(&schema).is_err());
        assert!(set(&[("size", "L")]).ensure_options_of(&schema).is_err());
    }
}
