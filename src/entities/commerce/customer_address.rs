use crate::models::ShippingAddress;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Address-book entry of a user
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customer_addresses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub recipient: String,
    pub phone: String,
    pub line1: String,
    #[sea_orm(nullable)]
    pub line2: Option<String>,
    #[sea_orm(nullable)]
    pub ward: Option<String>,
    #[sea_orm(nullable)]
    pub district: Option<String>,
    #[sea_orm(nullable)]
    pub province: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Value copy stored on an order.
    pub fn to_shipping_address(&self) -> ShippingAddress {
        ShippingAddress {
            recipient: self.recipient.clone(),
            phone: self.phone.clone(),
            line1: self.line1.clone(),
            line2: self.line2.clone(),
            ward: self.ward.clone(),
            district: self.district.clone(),
            province: self.province.clone(),
        }
    }
}
