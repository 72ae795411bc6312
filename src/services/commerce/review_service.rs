use crate::{
    config::AppConfig,
    entities::{
        commerce::{product_variant, review, Product, Review, ReviewModel, ReviewStatus},
        order, order_item, OrderItem, OrderStatus,
    },
    errors::ServiceError,
};
use chrono::Utc;
use metrics::counter;
use sea_orm::{
    sea_query::Query, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Product reviews.
///
/// A review is marked as a verified purchase when its author has a
/// `completed` order containing any variant of the product. Only approved
/// reviews are listed; with `moderate_reviews` on, new reviews wait in
/// `pending` until [`ReviewService::set_review_status`] approves them.
#[derive(Clone)]
pub struct ReviewService {
    db: Arc<DatabaseConnection>,
    config: Arc<AppConfig>,
}

impl ReviewService {
    pub fn new(db: Arc<DatabaseConnection>, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }

    /// Stores a review for a product.
    ///
    /// # Errors
    ///
    /// * `ValidationError` - rating outside 1 to 5 or comment too long
    /// * `NotFound` - product does not exist
    #[instrument(skip(self, input), fields(product_id = %input.product_id))]
    pub async fn add_review(
        &self,
        user_id: Uuid,
        input: ReviewInput,
    ) -> Result<ReviewModel, ServiceError> {
        input.validate()?;
        Product::find_by_id(input.product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", input.product_id))?;

        let verified = has_completed_purchase(&*self.db, user_id, input.product_id).await?;
        let status = if self.config.moderate_reviews {
            ReviewStatus::Pending
        } else {
            ReviewStatus::Approved
        };
        let comment = input
            .comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let saved = review::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(input.product_id),
            user_id: Set(user_id),
            rating: Set(input.rating),
            comment: Set(comment),
            is_verified_purchase: Set(verified),
            status: Set(status),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        counter!("storefront_reviews.added", 1);
        info!(user_id = %user_id, verified, "Added review {} ({})", saved.id, saved.status);
        Ok(saved)
    }

    /// Approved reviews of a product, newest first.
    #[instrument(skip(self))]
    pub async fn get_product_reviews(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<ReviewModel>, ServiceError> {
        let reviews = Review::find()
            .filter(review::Column::ProductId.eq(product_id))
            .filter(review::Column::Status.eq(ReviewStatus::Approved))
            .order_by_desc(review::Column::CreatedAt)
            .order_by_desc(review::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(reviews)
    }

    /// Moderation: moves a review to `status`.
    #[instrument(skip(self))]
    pub async fn set_review_status(
        &self,
        review_id: Uuid,
        status: ReviewStatus,
    ) -> Result<ReviewModel, ServiceError> {
        let existing = Review::find_by_id(review_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Review", review_id))?;
        if existing.status == status {
            return Ok(existing);
        }

        let mut active: review::ActiveModel = existing.into();
        active.status = Set(status);
        let updated = active.update(&*self.db).await?;
        info!("Review {} is now {}", review_id, status);
        Ok(updated)
    }
}

/// Whether `user_id` has a completed order with any variant of `product_id`.
async fn has_completed_purchase<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    product_id: Uuid,
) -> Result<bool, ServiceError> {
    let variants = Query::select()
        .column(product_variant::Column::Id)
        .from(product_variant::Entity)
        .and_where(product_variant::Column::ProductId.eq(product_id))
        .to_owned();
    let lines = OrderItem::find()
        .inner_join(order::Entity)
        .filter(order::Column::UserId.eq(user_id))
        .filter(order::Column::Status.eq(OrderStatus::Completed))
        .filter(order_item::Column::VariantId.in_subquery(variants))
        .count(conn)
        .await?;
    Ok(lines > 0)
}

/// Input for [`ReviewService::add_review`]
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ReviewInput {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 5))]
    pub rating: i16,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}
