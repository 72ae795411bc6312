//! Catalog filters and the single predicate builder behind listing and counting.

use crate::entities::commerce::{product, product_variant, variant_attribute};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func, LikeExpr, Query, SelectStatement};
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Select};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// How several attribute filters relate to a product's variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeMatch {
    /// Each filter (and the price range) may be satisfied by a different
    /// variant of the product. A product with a Red/8GB and a Blue/16GB
    /// variant matches `color=Red, ram=16GB`.
    #[default]
    AnyVariant,
    /// One variant has to satisfy the price range and every attribute filter.
    SameVariant,
}

/// Product listing filters. Every field is optional and filters are ANDed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductFilters {
    pub published: Option<bool>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    /// Case-insensitive substring over name and description
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Attribute name -> required value
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub attribute_match: AttributeMatch,
}

impl ProductFilters {
    pub fn published() -> Self {
        Self {
            published: Some(true),
            ..Default::default()
        }
    }

    fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    fn attribute_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.trim(), value.trim()))
            .filter(|(name, value)| !name.is_empty() && !value.is_empty())
    }

    fn has_price_range(&self) -> bool {
        self.min_price.is_some() || self.max_price.is_some()
    }
}

/// Page selection for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pagination {
    /// `limit` falls back to the configured default page size and is capped
    /// by the configured maximum.
    Page {
        limit: Option<u64>,
        offset: Option<u64>,
    },
    /// Every matching row.
    All,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination::Page {
            limit: None,
            offset: None,
        }
    }
}

impl Pagination {
    pub fn page(limit: u64, offset: u64) -> Self {
        Pagination::Page {
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    /// Effective `(limit, offset)`; a `None` limit means unbounded.
    pub fn resolve(self, default_size: u64, max_size: u64) -> (Option<u64>, u64) {
        match self {
            Pagination::All => (None, 0),
            Pagination::Page { limit, offset } => {
                let limit = limit.unwrap_or(default_size).clamp(1, max_size.max(1));
                (Some(limit), offset.unwrap_or(0))
            }
        }
    }
}

/// Builds the product predicate for `filters`.
///
/// Listing and counting both call this, so their filter logic cannot drift.
pub fn product_condition(filters: &ProductFilters) -> Condition {
    let mut cond = Condition::all();

    if let Some(published) = filters.published {
        cond = cond.add(product::Column::IsPublished.eq(published));
    }
    if let Some(category_id) = filters.category_id {
        cond = cond.add(product::Column::CategoryId.eq(category_id));
    }
    if let Some(brand_id) = filters.brand_id {
        cond = cond.add(product::Column::BrandId.eq(brand_id));
    }

    if let Some(term) = filters.search_term() {
        let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
        cond = cond.add(
            Condition::any()
                .add(
                    Expr::expr(Func::lower(Expr::col((product::Entity, product::Column::Name))))
                        .like(LikeExpr::new(pattern.clone()).escape('\\')),
                )
                .add(
                    Expr::expr(Func::lower(Expr::col((
                        product::Entity,
                        product::Column::Description,
                    ))))
                    .like(LikeExpr::new(pattern).escape('\\')),
                ),
        );
    }

    match filters.attribute_match {
        AttributeMatch::AnyVariant => {
            if filters.has_price_range() {
                let mut variants = variant_products();
                restrict_price(&mut variants, filters);
                cond = cond.add(product::Column::Id.in_subquery(variants));
            }
            for (name, value) in filters.attribute_pairs() {
                let pairs = Query::select()
                    .column(variant_attribute::Column::ProductId)
                    .from(variant_attribute::Entity)
                    .and_where(variant_attribute::Column::Name.eq(name))
                    .and_where(variant_attribute::Column::Value.eq(value))
                    .to_owned();
                cond = cond.add(product::Column::Id.in_subquery(pairs));
            }
        }
        AttributeMatch::SameVariant => {
            let mut pairs = filters.attribute_pairs().peekable();
            if filters.has_price_range() || pairs.peek().is_some() {
                let mut variants = variant_products();
                restrict_price(&mut variants, filters);
                for (name, value) in pairs {
                    variants.and_where(
                        product_variant::Column::Id.in_subquery(
                            Query::select()
                                .column(variant_attribute::Column::VariantId)
                                .from(variant_attribute::Entity)
                                .and_where(variant_attribute::Column::Name.eq(name))
                                .and_where(variant_attribute::Column::Value.eq(value))
                                .to_owned(),
                        ),
                    );
                }
                cond = cond.add(product::Column::Id.in_subquery(variants));
            }
        }
    }

    cond
}

/// Filtered, deterministically ordered product query: newest first, id as tie-break.
pub fn product_query(filters: &ProductFilters) -> Select<product::Entity> {
    product::Entity::find()
        .filter(product_condition(filters))
        .order_by_desc(product::Column::CreatedAt)
        .order_by_desc(product::Column::Id)
}

/// [`product_query`] with a resolved page applied.
pub fn paged_product_query(filters: &ProductFilters, limit: Option<u64>, offset: u64) -> Select<product::Entity> {
    let query = product_query(filters);
    let query = match limit {
        Some(limit) => query.limit(limit),
        None => query,
    };
    if offset > 0 {
        query.offset(offset)
    } else {
        query
    }
}

fn variant_products() -> SelectStatement {
    Query::select()
        .column(product_variant::Column::ProductId)
        .from(product_variant::Entity)
        .to_owned()
}

fn restrict_price(select: &mut SelectStatement, filters: &ProductFilters) {
    if let Some(min) = filters.min_price {
        select.and_where(product_variant::Column::Price.gte(min));
    }
    if let Some(max) = filters.max_price {
        select.and_where(product_variant::Column::Price.lte(max));
    }
}

/// Escapes LIKE wildcards so a search term matches literally.
pub fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DbBackend, QueryTrait};

    fn sql(filters: &ProductFilters) -> String {
        product_query(filters).build(DbBackend::Postgres).to_string()
    }

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn empty_filters_only_order() {
        let sql = sql(&ProductFilters::default());
        assert!(!sql.contains("LIKE"));
        assert!(!sql.contains("IN (SELECT"));
        assert!(sql.contains(r#"ORDER BY "products"."created_at" DESC, "products"."id" DESC"#));
    }

    #[test]
    fn any_variant_uses_one_subquery_per_filter() {
        let mut filters = ProductFilters {
            min_price: Some(dec!(100)),
            max_price: Some(dec!(200)),
            ..Default::default()
        };
        filters.attributes.insert("color".into(), "Red".into());
        filters.attributes.insert("ram".into(), "16GB".into());

        let sql = sql(&filters);
        assert_eq!(sql.matches("IN (SELECT").count(), 3);
        assert!(sql.contains(r#""price" >= 100"#));
        assert!(sql.contains(r#""price" <= 200"#));
    }

    #[test]
    fn same_variant_nests_attribute_filters() {
        let mut filters = ProductFilters {
            min_price: Some(dec!(100)),
            attribute_match: AttributeMatch::SameVariant,
            ..Default::default()
        };
        filters.attributes.insert("color".into(), "Red".into());
        filters.attributes.insert("ram".into(), "16GB".into());

        let sql = sql(&filters);
        assert!(sql.contains(r#""products"."id" IN (SELECT "product_id" FROM "product_variants""#));
        assert_eq!(sql.matches(r#""id" IN (SELECT "variant_id""#).count(), 2);
    }

    #[test]
    fn blank_search_and_attribute_values_are_ignored() {
        let mut filters = ProductFilters {
            search: Some("   ".into()),
            ..Default::default()
        };
        filters.attributes.insert("color".into(), "".into());
        let sql = sql(&filters);
        assert!(!sql.contains("LIKE"));
        assert!(!sql.contains("IN (SELECT"));
    }

    #[test]
    fn pagination_defaults_and_caps() {
        assert_eq!(Pagination::default().resolve(20, 100), (Some(20), 0));
        assert_eq!(Pagination::page(500, 40).resolve(20, 100), (Some(100), 40));
        assert_eq!(Pagination::page(0, 0).resolve(20, 100), (Some(1), 0));
        assert_eq!(Pagination::All.resolve(20, 100), (None, 0));
    }
}
