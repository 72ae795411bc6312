use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_id: Uuid,
    /// Payment method chosen at checkout, e.g. `cod`
    pub provider: String,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentStatus {
    /// Cash on delivery, collected later
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Handed to an online provider
    #[sea_orm(string_value = "initiated")]
    Initiated,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "canceled")]
    Canceled,
}

/// Payment method code for cash on delivery.
pub const CASH_ON_DELIVERY: &str = "cod";

impl PaymentStatus {
    /// Initial status of the placeholder written at checkout.
    pub fn initial_for(provider: &str) -> Self {
        if provider.eq_ignore_ascii_case(CASH_ON_DELIVERY) {
            PaymentStatus::Pending
        } else {
            PaymentStatus::Initiated
        }
    }
}
