use crate::{
    config::AppConfig,
    db::UnitOfWork,
    entities::{
        commerce::{
            cart, cart_item, customer_address, inventory_level, product, product_variant, CartItem,
            CartStatus, CustomerAddress, InventoryLevel, Product, ProductVariant,
        },
        order, order_item, order_status_history, payment, Order, OrderItem, OrderItemModel,
        OrderModel, OrderStatus, OrderStatusHistory, OrderStatusHistoryModel, Payment,
        PaymentModel, PaymentStatus,
    },
    errors::{Precondition, ServiceError},
    models::ShippingAddress,
    services::commerce::cart_service::find_open_cart,
};
use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

const ORDER_PLACED_COMMENT: &str = "Order placed successfully";

/// Checkout and order lifecycle.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    config: Arc<AppConfig>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }

    /// Converts the user's open cart into an order.
    ///
    /// Runs as one unit of work: either the order, its items, the payment
    /// placeholder, the first history row, the inventory decrement and the
    /// cart conversion all land, or none of them do.
    #[instrument(skip(self, input))]
    pub async fn place_order(
        &self,
        user_id: Uuid,
        input: PlaceOrderInput,
    ) -> Result<OrderDetail, ServiceError> {
        let PlaceOrderInput {
            shipping,
            payment_method,
            notes,
        } = input;
        let payment_method = payment_method.trim().to_lowercase();
        if payment_method.is_empty() {
            return Err(ServiceError::validation("payment method is required"));
        }
        let notes = notes.filter(|n| !n.trim().is_empty());

        let unit = UnitOfWork::begin(&self.db, "place_order").await?;
        let result: Result<OrderModel, ServiceError> = async {
            let cart = find_open_cart(unit.conn(), user_id)
                .await?
                .ok_or(ServiceError::PreconditionFailed(Precondition::NoOpenCart))?;
            let items = CartItem::find()
                .filter(cart_item::Column::CartId.eq(cart.id))
                .order_by_asc(cart_item::Column::CreatedAt)
                .order_by_asc(cart_item::Column::Id)
                .all(unit.conn())
                .await?;
            if items.is_empty() {
                return Err(ServiceError::PreconditionFailed(Precondition::EmptyCart));
            }
            let shipping = resolve_shipping(unit.conn(), user_id, shipping).await?;

            let lines = price_lines(unit.conn(), &items).await?;
            if !self.config.allow_oversell {
                ensure_stock(unit.conn(), &lines).await?;
            }

            let subtotal: Decimal = lines.iter().map(|l| l.line_total).sum();
            let shipping_fee = self.config.shipping_fee;
            let total = subtotal + shipping_fee;
            let now = Utc::now();

            let order = order::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                order_code: Set(generate_order_code(now)),
                status: Set(OrderStatus::Pending),
                currency: Set(self.config.default_currency.clone()),
                subtotal: Set(subtotal),
                shipping_fee: Set(shipping_fee),
                total: Set(total),
                shipping_address: Set(shipping),
                customer_notes: Set(notes.clone()),
                ..Default::default()
            }
            .insert(unit.conn())
            .await?;

            let rows = lines
                .iter()
                .enumerate()
                .map(|(position, line)| order_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    order_id: Set(order.id),
                    variant_id: Set(Some(line.variant_id)),
                    sku: Set(line.sku.clone()),
                    name: Set(line.name.clone()),
                    unit_price: Set(line.unit_price),
                    quantity: Set(line.quantity),
                    line_total: Set(line.line_total),
                    position: Set(position as i32),
                    created_at: Set(now),
                });
            OrderItem::insert_many(rows)
                .exec_without_returning(unit.conn())
                .await?;

            for line in &lines {
                decrement_stock(unit.conn(), line.variant_id, line.quantity, now).await?;
            }

            payment::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order.id),
                provider: Set(payment_method.clone()),
                amount: Set(total),
                currency: Set(order.currency.clone()),
                status: Set(PaymentStatus::initial_for(&payment_method)),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(unit.conn())
            .await?;

            CartItem::delete_many()
                .filter(cart_item::Column::CartId.eq(cart.id))
                .exec(unit.conn())
                .await?;
            let mut converted: cart::ActiveModel = cart.into();
            converted.status = Set(CartStatus::Converted);
            converted.open_owner_id = Set(None);
            converted.update(unit.conn()).await?;

            append_history(
                unit.conn(),
                order.id,
                OrderStatus::Pending,
                Some(ORDER_PLACED_COMMENT.to_string()),
                now,
            )
            .await?;

            Ok(order)
        }
        .await;
        let order = unit.finish(result).await?;

        counter!("storefront_orders.placed", 1);
        info!(
            user_id = %user_id,
            order_code = %order.order_code,
            total = %order.total,
            "Order placed"
        );
        self.get_order_detail(order.id, user_id).await
    }

    /// The user's orders, newest first, each with its items.
    #[instrument(skip(self))]
    pub async fn get_orders_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<OrderSummary>, ServiceError> {
        let orders = Order::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::Id)
            .all(&*self.db)
            .await?;
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let mut items: HashMap<Uuid, Vec<OrderItemModel>> = HashMap::new();
        for item in OrderItem::find()
            .filter(order_item::Column::OrderId.is_in(orders.iter().map(|o| o.id)))
            .order_by_asc(order_item::Column::Position)
            .all(&*self.db)
            .await?
        {
            items.entry(item.order_id).or_default().push(item);
        }

        Ok(orders
            .into_iter()
            .map(|order| OrderSummary {
                items: items.remove(&order.id).unwrap_or_default(),
                order,
            })
            .collect())
    }

    /// One of the user's orders with items, payment and history.
    ///
    /// An order that belongs to someone else is reported as `NotFound`.
    #[instrument(skip(self))]
    pub async fn get_order_detail(
        &self,
        order_id: Uuid,
        user_id: Uuid,
    ) -> Result<OrderDetail, ServiceError> {
        let order = Order::find_by_id(order_id)
            .filter(order::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", order_id))?;
        self.assemble_detail(order).await
    }

    /// Admin lookup by id, regardless of owner.
    #[instrument(skip(self))]
    pub async fn get_order_by_id(&self, order_id: Uuid) -> Result<OrderDetail, ServiceError> {
        let order = Order::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", order_id))?;
        self.assemble_detail(order).await
    }

    /// Moves an order along its lifecycle and records the step.
    ///
    /// Payment placeholders follow the order into `paid` and `canceled`.
    #[instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        order_id: Uuid,
        input: UpdateOrderStatusInput,
    ) -> Result<OrderModel, ServiceError> {
        let unit = UnitOfWork::begin(&self.db, "update_order_status").await?;
        let result: Result<(OrderModel, OrderStatus), ServiceError> = async {
            let order = Order::find_by_id(order_id)
                .one(unit.conn())
                .await?
                .ok_or_else(|| ServiceError::not_found("Order", order_id))?;

            let current = order.status;
            if !current.can_transition_to(input.status) {
                return Err(ServiceError::InvalidOperation(format!(
                    "order {} cannot move from {} to {}",
                    order.order_code, current, input.status
                )));
            }

            let mut active: order::ActiveModel = order.into();
            active.status = Set(input.status);
            let order = active.update(unit.conn()).await?;

            let payment_status = match input.status {
                OrderStatus::Paid => Some(PaymentStatus::Paid),
                OrderStatus::Canceled => Some(PaymentStatus::Canceled),
                _ => None,
            };
            let now = Utc::now();
            if let Some(status) = payment_status {
                Payment::update_many()
                    .col_expr(payment::Column::Status, Expr::value(status))
                    .col_expr(payment::Column::UpdatedAt, Expr::value(now))
                    .filter(payment::Column::OrderId.eq(order.id))
                    .exec(unit.conn())
                    .await?;
            }

            let comment = input.comment.clone().filter(|c| !c.trim().is_empty());
            append_history(unit.conn(), order.id, input.status, comment, now).await?;
            Ok((order, current))
        }
        .await;
        let (order, previous) = unit.finish(result).await?;

        info!(
            order_code = %order.order_code,
            "Order status changed from {} to {}",
            previous,
            order.status
        );
        Ok(order)
    }

    async fn assemble_detail(&self, order: OrderModel) -> Result<OrderDetail, ServiceError> {
        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .order_by_asc(order_item::Column::Position)
            .all(&*self.db)
            .await?;
        let payment = Payment::find()
            .filter(payment::Column::OrderId.eq(order.id))
            .order_by_desc(payment::Column::CreatedAt)
            .one(&*self.db)
            .await?;
        let history = OrderStatusHistory::find()
            .filter(order_status_history::Column::OrderId.eq(order.id))
            .order_by_asc(order_status_history::Column::CreatedAt)
            .order_by_asc(order_status_history::Column::Id)
            .all(&*self.db)
            .await?;

        Ok(OrderDetail {
            order,
            items,
            payment,
            history,
        })
    }
}

/// A cart line priced for the order being placed.
struct PricedLine {
    variant_id: Uuid,
    sku: String,
    name: String,
    unit_price: Decimal,
    quantity: i32,
    line_total: Decimal,
}

async fn resolve_shipping<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    choice: ShippingChoice,
) -> Result<ShippingAddress, ServiceError> {
    let address = match choice {
        ShippingChoice::Saved { address_id } => CustomerAddress::find_by_id(address_id)
            .filter(customer_address::Column::UserId.eq(user_id))
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Address", address_id))?
            .to_shipping_address(),
        ShippingChoice::Inline(address) => address,
    };
    address.validate()?;
    Ok(address)
}

/// Prices every cart line at its variant's current price.
async fn price_lines<C: ConnectionTrait>(
    conn: &C,
    items: &[cart_item::Model],
) -> Result<Vec<PricedLine>, ServiceError> {
    let variants: HashMap<Uuid, product_variant::Model> = ProductVariant::find()
        .filter(product_variant::Column::Id.is_in(items.iter().map(|i| i.variant_id)))
        .all(conn)
        .await?
        .into_iter()
        .map(|v| (v.id, v))
        .collect();
    let products: HashMap<Uuid, String> = Product::find()
        .filter(product::Column::Id.is_in(variants.values().map(|v| v.product_id)))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();

    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        let variant = variants
            .get(&item.variant_id)
            .ok_or_else(|| ServiceError::not_found("Variant", item.variant_id))?;
        if !variant.is_active() {
            return Err(ServiceError::validation(format!(
                "variant {} is no longer available",
                variant.sku
            )));
        }
        let product_name = products
            .get(&variant.product_id)
            .map(String::as_str)
            .unwrap_or_default();
        lines.push(PricedLine {
            variant_id: variant.id,
            sku: variant.sku.clone(),
            name: line_name(product_name, &variant.name),
            unit_price: variant.price,
            quantity: item.quantity,
            line_total: variant.price * Decimal::from(item.quantity),
        });
    }
    Ok(lines)
}

fn line_name(product_name: &str, variant_name: &str) -> String {
    if variant_name.is_empty() || variant_name == product_name {
        product_name.to_string()
    } else {
        format!("{} - {}", product_name, variant_name)
    }
}

async fn ensure_stock<C: ConnectionTrait>(
    conn: &C,
    lines: &[PricedLine],
) -> Result<(), ServiceError> {
    let on_hand: HashMap<Uuid, i32> = InventoryLevel::find()
        .filter(inventory_level::Column::VariantId.is_in(lines.iter().map(|l| l.variant_id)))
        .all(conn)
        .await?
        .into_iter()
        .map(|l| (l.variant_id, l.on_hand))
        .collect();

    for line in lines {
        let available = on_hand.get(&line.variant_id).copied().unwrap_or(0);
        if available < line.quantity {
            warn!(variant_id = %line.variant_id, available, requested = line.quantity, "Insufficient stock");
            return Err(ServiceError::InsufficientStock {
                variant_id: line.variant_id,
                requested: line.quantity,
                on_hand: available,
            });
        }
    }
    Ok(())
}

/// Subtracts `quantity` from the variant's stock, creating the level row if
/// the variant never had one.
async fn decrement_stock<C: ConnectionTrait>(
    conn: &C,
    variant_id: Uuid,
    quantity: i32,
    now: DateTime<Utc>,
) -> Result<(), ServiceError> {
    let level = inventory_level::ActiveModel {
        variant_id: Set(variant_id),
        on_hand: Set(-quantity),
        updated_at: Set(now),
    };
    InventoryLevel::insert(level)
        .on_conflict(
            OnConflict::column(inventory_level::Column::VariantId)
                .value(
                    inventory_level::Column::OnHand,
                    Expr::col((inventory_level::Entity, inventory_level::Column::OnHand))
                        .sub(quantity),
                )
                .value(inventory_level::Column::UpdatedAt, Expr::value(now))
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

async fn append_history<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
    status: OrderStatus,
    comment: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), ServiceError> {
    order_status_history::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        status: Set(status),
        comment: Set(comment),
        created_at: Set(now),
    }
    .insert(conn)
    .await?;
    Ok(())
}

/// `ORD-<UTC timestamp>-<8 random hex digits>`.
pub fn generate_order_code(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "ORD-{}-{}",
        now.format("%Y%m%d%H%M%S"),
        suffix[..8].to_uppercase()
    )
}

/// Where the order ships: a fresh address or one from the address book
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ShippingChoice {
    Saved { address_id: Uuid },
    Inline(ShippingAddress),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaceOrderInput {
    pub shipping: ShippingChoice,
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_payment_method() -> String {
    payment::CASH_ON_DELIVERY.to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdateOrderStatusInput {
    pub status: OrderStatus,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub order: OrderModel,
    pub items: Vec<OrderItemModel>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub order: OrderModel,
    pub items: Vec<OrderItemModel>,
    pub payment: Option<PaymentModel>,
    pub history: Vec<OrderStatusHistoryModel>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn order_code_shape() {
        let now = Utc.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap();
        let code = generate_order_code(now);
        assert!(code.starts_with("ORD-20250309140507-"));
        let suffix = &code["ORD-20250309140507-".len()..];
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert_ne!(generate_order_code(now), code);
    }

    #[test]
    fn line_names_join_product_and_variant() {
        assert_eq!(line_name("Laptop", "Red - 16GB"), "Laptop - Red - 16GB");
        assert_eq!(line_name("Laptop", "Laptop"), "Laptop");
        assert_eq!(line_name("Laptop", ""), "Laptop");
    }

    #[test]
    fn shipping_choice_accepts_saved_or_inline() {
        let id = Uuid::new_v4();
        let saved: ShippingChoice = serde_json::from_value(json!({ "address_id": id })).unwrap();
        assert!(matches!(saved, ShippingChoice::Saved { address_id } if address_id == id));

        let inline: ShippingChoice = serde_json::from_value(json!({
            "recipient": "Lan",
            "phone": "0900000000",
            "line1": "1 Le Loi"
        }))
        .unwrap();
        assert!(matches!(inline, ShippingChoice::Inline(a) if a.recipient == "Lan"));
    }

    #[test]
    fn payment_method_defaults_to_cash_on_delivery() {
        let input: PlaceOrderInput = serde_json::from_value(json!({
            "shipping": { "address_id": Uuid::nil() }
        }))
        .unwrap();
        assert_eq!(input.payment_method, "cod");
        assert_eq!(PaymentStatus::initial_for(&input.payment_method), PaymentStatus::Pending);
        assert_eq!(PaymentStatus::initial_for("vnpay"), PaymentStatus::Initiated);
    }
}
