use crate::{
    entities::commerce::{brand, Brand, BrandModel},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct BrandService {
    db: Arc<DatabaseConnection>,
}

impl BrandService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// All brands by name.
    #[instrument(skip(self))]
    pub async fn list_brands(&self) -> Result<Vec<BrandModel>, ServiceError> {
        Brand::find()
            .order_by_asc(brand::Column::Name)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get_brand(&self, id: Uuid) -> Result<BrandModel, ServiceError> {
        Brand::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Brand", id))
    }

    /// Creates a brand; a taken slug surfaces as `Conflict`.
    #[instrument(skip(self))]
    pub async fn create_brand(&self, input: BrandInput) -> Result<BrandModel, ServiceError> {
        let input = BrandInput {
            name: input.name.trim().to_string(),
            slug: input.slug.trim().to_string(),
        };
        input.validate()?;

        let brand = brand::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            slug: Set(input.slug),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?;

        info!("Created brand: {} ({})", brand.slug, brand.id);
        Ok(brand)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct BrandInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub slug: String,
}
