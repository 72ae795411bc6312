use crate::{
    entities::commerce::{category, product, Category, CategoryModel, CategoryStatus, Product},
    errors::ServiceError,
    models::attributes::{AttributeDefinition, AttributeSchema},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Category administration and attribute schema access.
#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DatabaseConnection>,
}

impl CategoryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Category with its ordered attribute definitions.
    #[instrument(skip(self))]
    pub async fn get_category_by_id(&self, id: Uuid) -> Result<CategoryModel, ServiceError> {
        Category::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", id))
    }

    /// All categories by name, each with the number of products that use it.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<CategorySummary>, ServiceError> {
        let categories = Category::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?;

        let counts: HashMap<Uuid, i64> = Product::find()
            .select_only()
            .column(product::Column::CategoryId)
            .column_as(product::Column::Id.count(), "product_count")
            .group_by(product::Column::CategoryId)
            .into_tuple::<(Uuid, i64)>()
            .all(&*self.db)
            .await?
            .into_iter()
            .collect();

        Ok(categories
            .into_iter()
            .map(|category| {
                let product_count = counts.get(&category.id).copied().unwrap_or(0).max(0) as u64;
                CategorySummary {
                    category,
                    product_count,
                }
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn create_category(
        &self,
        input: CategoryInput,
    ) -> Result<CategoryModel, ServiceError> {
        let input = input.normalized()?;
        let id = Uuid::new_v4();
        self.ensure_parent(id, input.parent_id).await?;

        let category = category::ActiveModel {
            id: Set(id),
            parent_id: Set(input.parent_id),
            name: Set(input.name),
            slug: Set(input.slug),
            icon: Set(input.icon),
            status: Set(input.status.unwrap_or_default()),
            attributes: Set(input.schema),
            ..Default::default()
        };
        let category = category.insert(&*self.db).await?;

        info!("Created category: {} ({})", category.slug, id);
        Ok(category)
    }

    /// Replaces the category's fields and attribute schema.
    #[instrument(skip(self))]
    pub async fn update_category(
        &self,
        id: Uuid,
        input: CategoryInput,
    ) -> Result<CategoryModel, ServiceError> {
        let input = input.normalized()?;
        let existing = self.get_category_by_id(id).await?;
        self.ensure_parent(id, input.parent_id).await?;

        let mut category: category::ActiveModel = existing.into();
        category.parent_id = Set(input.parent_id);
        category.name = Set(input.name);
        category.slug = Set(input.slug);
        category.icon = Set(input.icon);
        if let Some(status) = input.status {
            category.status = Set(status);
        }
        category.attributes = Set(input.schema);
        let category = category.update(&*self.db).await?;

        info!("Updated category: {}", id);
        Ok(category)
    }

    /// Deletes a category that no product references.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: Uuid) -> Result<(), ServiceError> {
        let category = self.get_category_by_id(id).await?;

        let in_use = Product::find()
            .filter(product::Column::CategoryId.eq(id))
            .count(&*self.db)
            .await?;
        if in_use > 0 {
            return Err(ServiceError::Conflict(format!(
                "Category {} is used by {} product(s)",
                category.slug, in_use
            )));
        }

        Category::delete_by_id(id).exec(&*self.db).await?;
        info!("Deleted category: {}", id);
        Ok(())
    }

    async fn ensure_parent(&self, id: Uuid, parent_id: Option<Uuid>) -> Result<(), ServiceError> {
        let Some(parent_id) = parent_id else {
            return Ok(());
        };
        if parent_id == id {
            return Err(ServiceError::validation("a category cannot be its own parent"));
        }
        if Category::find_by_id(parent_id).one(&*self.db).await?.is_none() {
            return Err(ServiceError::not_found("Parent category", parent_id));
        }
        Ok(())
    }
}

/// Category with the number of products filed under it
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    #[serde(flatten)]
    pub category: CategoryModel,
    pub product_count: u64,
}

/// Input for creating or updating a category
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CategoryInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub slug: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub status: Option<CategoryStatus>,
    #[serde(default)]
    pub attributes: Vec<AttributeDefinition>,
}

struct NormalizedCategory {
    name: String,
    slug: String,
    parent_id: Option<Uuid>,
    icon: Option<String>,
    status: Option<CategoryStatus>,
    schema: AttributeSchema,
}

impl CategoryInput {
    fn normalized(self) -> Result<NormalizedCategory, ServiceError> {
        let input = CategoryInput {
            name: self.name.trim().to_string(),
            slug: self.slug.trim().to_string(),
            ..self
        };
        input.validate()?;
        Ok(NormalizedCategory {
            schema: AttributeSchema::normalized(input.attributes)?,
            name: input.name,
            slug: input.slug,
            parent_id: input.parent_id,
            icon: input.icon.filter(|i| !i.trim().is_empty()),
            status: input.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attributes::AttributeKind;
    use serde_json::json;

    #[test]
    fn input_accepts_definitions_without_kind() {
        let input: CategoryInput = serde_json::from_value(json!({
            "name": " Laptops ",
            "slug": "laptops",
            "attributes": [{"name": "color", "kind": "option"}, {"name": "weight"}]
        }))
        .unwrap();

        let normalized = input.normalized().unwrap();
        assert_eq!(normalized.name, "Laptops");
        assert_eq!(normalized.schema.kind_of("weight"), Some(AttributeKind::Text));
        assert_eq!(normalized.schema.kind_of("color"), Some(AttributeKind::Option));
    }

    #[test]
    fn duplicate_attribute_names_are_rejected() {
        let input = CategoryInput {
            name: "Phones".into(),
            slug: "phones".into(),
            parent_id: None,
            icon: None,
            status: None,
            attributes: vec![
                AttributeDefinition::option("color"),
                AttributeDefinition::text("color"),
            ],
        };
        assert!(matches!(
            input.normalized(),
            Err(ServiceError::ValidationError(_))
        ));
    }

    #[test]
    fn blank_name_is_rejected() {
        let input = CategoryInput {
            name: "   ".into(),
            slug: "x".into(),
            parent_id: None,
            icon: None,
            status: None,
            attributes: Vec::new(),
        };
        assert!(matches!(
            input.normalized(),
            Err(ServiceError::ValidationError(_))
        ));
    }
}
