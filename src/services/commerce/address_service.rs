use crate::{
    db::UnitOfWork,
    entities::commerce::{customer_address, CustomerAddress, CustomerAddressModel},
    errors::ServiceError,
    models::ShippingAddress,
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Saved shipping addresses of a user
#[derive(Clone)]
pub struct AddressService {
    db: Arc<DatabaseConnection>,
}

impl AddressService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Saves an address. A new default replaces the user's previous default.
    #[instrument(skip(self, input))]
    pub async fn add_address(
        &self,
        user_id: Uuid,
        input: AddressInput,
    ) -> Result<CustomerAddressModel, ServiceError> {
        let AddressInput {
            address,
            is_default,
        } = input;
        address.validate()?;

        let unit = UnitOfWork::begin(&self.db, "add_address").await?;
        let result: Result<CustomerAddressModel, ServiceError> = async {
            if is_default {
                CustomerAddress::update_many()
                    .col_expr(customer_address::Column::IsDefault, Expr::value(false))
                    .filter(customer_address::Column::UserId.eq(user_id))
                    .exec(unit.conn())
                    .await?;
            }

            let saved = customer_address::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                recipient: Set(address.recipient.trim().to_string()),
                phone: Set(address.phone.trim().to_string()),
                line1: Set(address.line1.trim().to_string()),
                line2: Set(address.line2.clone()),
                ward: Set(address.ward.clone()),
                district: Set(address.district.clone()),
                province: Set(address.province.clone()),
                is_default: Set(is_default),
                created_at: Set(Utc::now()),
            }
            .insert(unit.conn())
            .await?;
            Ok(saved)
        }
        .await;
        let saved = unit.finish(result).await?;

        info!(user_id = %user_id, "Saved address {}", saved.id);
        Ok(saved)
    }

    /// The user's addresses, default first, then newest.
    #[instrument(skip(self))]
    pub async fn list_addresses(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<CustomerAddressModel>, ServiceError> {
        CustomerAddress::find()
            .filter(customer_address::Column::UserId.eq(user_id))
            .order_by_desc(customer_address::Column::IsDefault)
            .order_by_desc(customer_address::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get_address(
        &self,
        user_id: Uuid,
        address_id: Uuid,
    ) -> Result<CustomerAddressModel, ServiceError> {
        CustomerAddress::find_by_id(address_id)
            .filter(customer_address::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Address", address_id))
    }

    /// Deletes an address owned by `user_id`.
    #[instrument(skip(self))]
    pub async fn remove_address(&self, user_id: Uuid, address_id: Uuid) -> Result<(), ServiceError> {
        let result = CustomerAddress::delete_many()
            .filter(customer_address::Column::Id.eq(address_id))
            .filter(customer_address::Column::UserId.eq(user_id))
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Address", address_id));
        }
        info!(user_id = %user_id, "Removed address {}", address_id);
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AddressInput {
    #[serde(flatten)]
    pub address: ShippingAddress,
    #[serde(default)]
    pub is_default: bool,
}
