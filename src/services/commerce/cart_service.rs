use crate::{
    config::AppConfig,
    db::UnitOfWork,
    entities::commerce::{
        cart, cart_item, inventory_level, product, product_variant, Cart, CartItem, CartModel,
        CartStatus, InventoryLevel, Product, ProductVariant,
    },
    errors::ServiceError,
    media,
    models::attributes::AttributeSet,
    services::commerce::{image_resolver, product_catalog_service::bundles_by_product},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Largest quantity a single cart line may hold.
pub const MAX_LINE_QUANTITY: i32 = 9_999;

/// Shopping cart service.
///
/// Each user has at most one cart in the `open` state. The store enforces
/// this through the unique `open_owner_id` column, which carries the user id
/// while the cart is open and is cleared when checkout converts it.
///
/// Cart lines reference variants, never bare products, and are priced at the
/// variant's current price every time the cart is read.
///
/// # Examples
///
/// ```ignore
/// use storefront_core::services::commerce::{AddItemInput, CartService};
///
/// let carts = CartService::new(db, config);
/// carts.add_item(user_id, AddItemInput { variant_id, quantity: 2 }).await?;
/// let view = carts.get_cart(user_id).await?;
/// assert_eq!(view.item_count, 2);
/// ```
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    config: Arc<AppConfig>,
}

impl CartService {
    /// Creates a new `CartService` instance.
    ///
    /// # Arguments
    ///
    /// * `db` - Database connection pool
    /// * `config` - Application configuration (media base URL for line images)
    pub fn new(db: Arc<DatabaseConnection>, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }

    /// Returns the user's open cart, creating it on first use.
    ///
    /// Two concurrent first calls race on the unique `open_owner_id`; the
    /// loser re-reads and returns the winner's cart.
    #[instrument(skip(self))]
    pub async fn get_or_create_cart(&self, user_id: Uuid) -> Result<CartModel, ServiceError> {
        if let Some(cart) = find_open_cart(&*self.db, user_id).await? {
            return Ok(cart);
        }

        let created = cart::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            open_owner_id: Set(Some(user_id)),
            status: Set(CartStatus::Open),
            ..Default::default()
        }
        .insert(&*self.db)
        .await;

        match created {
            Ok(cart) => {
                info!(user_id = %user_id, "Created cart {}", cart.id);
                Ok(cart)
            }
            Err(err) => match ServiceError::from(err) {
                ServiceError::Conflict(_) => {
                    debug!(user_id = %user_id, "Lost open cart race, re-reading");
                    find_open_cart(&*self.db, user_id)
                        .await?
                        .ok_or_else(|| ServiceError::InternalError("open cart vanished".into()))
                }
                other => Err(other),
            },
        }
    }

    /// Open cart with priced lines.
    ///
    /// # Returns
    ///
    /// * `Ok(CartView)` - Lines ordered by when they were first added
    /// * `Err(ServiceError)` - Database error
    #[instrument(skip(self))]
    pub async fn get_cart(&self, user_id: Uuid) -> Result<CartView, ServiceError> {
        let cart = self.get_or_create_cart(user_id).await?;
        let lines = load_cart_lines(&*self.db, cart.id, &self.config.media_base_url).await?;
        Ok(CartView::new(cart, lines))
    }

    /// Adds a variant to the open cart.
    ///
    /// Adding a variant already in the cart increments its quantity in a
    /// single upsert, so the cart never holds two lines for one variant.
    ///
    /// # Errors
    ///
    /// * `ValidationError` - quantity outside `1..=MAX_LINE_QUANTITY`, before
    ///   or after merging with an existing line, or variant inactive
    /// * `NotFound` - variant does not exist
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: Uuid,
        input: AddItemInput,
    ) -> Result<CartView, ServiceError> {
        input.validate()?;
        let variant = ProductVariant::find_by_id(input.variant_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Variant", input.variant_id))?;
        if !variant.is_active() {
            return Err(ServiceError::validation(format!(
                "variant {} is not available",
                variant.sku
            )));
        }

        let cart = self.get_or_create_cart(user_id).await?;
        let now = Utc::now();

        let unit = UnitOfWork::begin(&self.db, "add_cart_item").await?;
        let result: Result<(), ServiceError> = async {
            let held = CartItem::find()
                .filter(cart_item::Column::CartId.eq(cart.id))
                .filter(cart_item::Column::VariantId.eq(variant.id))
                .one(unit.conn())
                .await?
                .map_or(0, |line| line.quantity);
            if held + input.quantity > MAX_LINE_QUANTITY {
                return Err(ServiceError::validation(format!(
                    "a cart line holds at most {} units, {} already in cart",
                    MAX_LINE_QUANTITY, held
                )));
            }

            let line = cart_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart.id),
                variant_id: Set(variant.id),
                quantity: Set(input.quantity),
                created_at: Set(now),
                updated_at: Set(now),
            };
            CartItem::insert(line)
                .on_conflict(
                    OnConflict::columns([cart_item::Column::CartId, cart_item::Column::VariantId])
                        .value(
                            cart_item::Column::Quantity,
                            Expr::col((cart_item::Entity, cart_item::Column::Quantity))
                                .add(input.quantity),
                        )
                        .value(cart_item::Column::UpdatedAt, Expr::value(now))
                        .to_owned(),
                )
                .exec_without_returning(unit.conn())
                .await?;
            touch_cart(unit.conn(), cart.id).await
        }
        .await;
        unit.finish(result).await?;

        info!(user_id = %user_id, "Added {} x {} to cart {}", input.quantity, variant.sku, cart.id);
        self.get_cart(user_id).await
    }

    /// Sets a line's quantity; zero or less removes the line, more than
    /// `MAX_LINE_QUANTITY` is a `ValidationError`.
    #[instrument(skip(self))]
    pub async fn update_item_quantity(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<CartView, ServiceError> {
        if quantity <= 0 {
            return self.remove_item(user_id, item_id).await;
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(ServiceError::validation(format!(
                "a cart line holds at most {} units",
                MAX_LINE_QUANTITY
            )));
        }

        let item = self.owned_item(user_id, item_id).await?;
        let cart_id = item.cart_id;

        let unit = UnitOfWork::begin(&self.db, "update_cart_item").await?;
        let result: Result<(), ServiceError> = async {
            let mut item: cart_item::ActiveModel = item.into();
            item.quantity = Set(quantity);
            item.updated_at = Set(Utc::now());
            item.update(unit.conn()).await?;
            touch_cart(unit.conn(), cart_id).await
        }
        .await;
        unit.finish(result).await?;

        self.get_cart(user_id).await
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, user_id: Uuid, item_id: Uuid) -> Result<CartView, ServiceError> {
        let item = self.owned_item(user_id, item_id).await?;

        let unit = UnitOfWork::begin(&self.db, "remove_cart_item").await?;
        let result: Result<(), ServiceError> = async {
            CartItem::delete_by_id(item.id).exec(unit.conn()).await?;
            touch_cart(unit.conn(), item.cart_id).await
        }
        .await;
        unit.finish(result).await?;

        info!(user_id = %user_id, "Removed line {} from cart {}", item_id, item.cart_id);
        self.get_cart(user_id).await
    }

    /// Empties the open cart. The cart itself stays open.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self, user_id: Uuid) -> Result<(), ServiceError> {
        let Some(cart) = find_open_cart(&*self.db, user_id).await? else {
            return Ok(());
        };

        let unit = UnitOfWork::begin(&self.db, "clear_cart").await?;
        let result: Result<u64, ServiceError> = async {
            let deleted = CartItem::delete_many()
                .filter(cart_item::Column::CartId.eq(cart.id))
                .exec(unit.conn())
                .await?;
            touch_cart(unit.conn(), cart.id).await?;
            Ok(deleted.rows_affected)
        }
        .await;
        let removed = unit.finish(result).await?;

        info!(user_id = %user_id, removed, "Cleared cart {}", cart.id);
        Ok(())
    }

    /// A line of the user's open cart, `NotFound` for anyone else's.
    async fn owned_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
    ) -> Result<cart_item::Model, ServiceError> {
        let cart = find_open_cart(&*self.db, user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Cart item", item_id))?;
        CartItem::find_by_id(item_id)
            .filter(cart_item::Column::CartId.eq(cart.id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Cart item", item_id))
    }
}

/// The user's cart in the `open` state, if any.
pub(crate) async fn find_open_cart<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> Result<Option<CartModel>, ServiceError> {
    Cart::find()
        .filter(cart::Column::OpenOwnerId.eq(user_id))
        .filter(cart::Column::Status.eq(CartStatus::Open))
        .one(conn)
        .await
        .map_err(Into::into)
}

async fn touch_cart<C: ConnectionTrait>(conn: &C, cart_id: Uuid) -> Result<(), ServiceError> {
    Cart::update_many()
        .col_expr(cart::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(cart::Column::Id.eq(cart_id))
        .exec(conn)
        .await?;
    Ok(())
}

async fn load_cart_lines<C: ConnectionTrait>(
    conn: &C,
    cart_id: Uuid,
    media_base: &str,
) -> Result<Vec<CartLine>, ServiceError> {
    let items = CartItem::find()
        .filter(cart_item::Column::CartId.eq(cart_id))
        .order_by_asc(cart_item::Column::CreatedAt)
        .order_by_asc(cart_item::Column::Id)
        .all(conn)
        .await?;
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let variant_ids: Vec<Uuid> = items.iter().map(|i| i.variant_id).collect();
    let variants: HashMap<Uuid, product_variant::Model> = ProductVariant::find()
        .filter(product_variant::Column::Id.is_in(variant_ids.clone()))
        .all(conn)
        .await?
        .into_iter()
        .map(|v| (v.id, v))
        .collect();
    let stock: HashMap<Uuid, i32> = InventoryLevel::find()
        .filter(inventory_level::Column::VariantId.is_in(variant_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|l| (l.variant_id, l.on_hand))
        .collect();

    let product_ids: Vec<Uuid> = variants.values().map(|v| v.product_id).collect();
    let products: HashMap<Uuid, product::Model> = Product::find()
        .filter(product::Column::Id.is_in(product_ids.clone()))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    let bundles = bundles_by_product(conn, product_ids).await?;

    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        // Cascades keep lines and variants in step; a missing row means a
        // concurrent delete, so the line is skipped.
        let Some(variant) = variants.get(&item.variant_id) else {
            continue;
        };
        let Some(product) = products.get(&variant.product_id) else {
            continue;
        };
        let image = bundles
            .get(&product.id)
            .and_then(|b| image_resolver::resolve_image(b, &variant.attribute_set));

        lines.push(CartLine {
            item_id: item.id,
            variant_id: variant.id,
            product_id: product.id,
            product_name: product.name.clone(),
            product_slug: product.slug.clone(),
            variant_name: variant.name.clone(),
            sku: variant.sku.clone(),
            attribute_set: variant.attribute_set.clone(),
            unit_price: variant.price,
            quantity: item.quantity,
            line_total: variant.price * Decimal::from(item.quantity),
            image: media::absolutize_opt(media_base, image),
            available: variant.is_active(),
            on_hand: stock.get(&variant.id).copied().unwrap_or(0),
        });
    }
    Ok(lines)
}

/// One priced cart line
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub item_id: Uuid,
    pub variant_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_slug: String,
    pub variant_name: String,
    pub sku: String,
    pub attribute_set: AttributeSet,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
    pub image: Option<String>,
    pub available: bool,
    pub on_hand: i32,
}

/// Open cart with its lines and running totals
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub cart: CartModel,
    pub items: Vec<CartLine>,
    pub item_count: i64,
    pub subtotal: Decimal,
}

impl CartView {
    fn new(cart: CartModel, items: Vec<CartLine>) -> Self {
        let item_count = items.iter().map(|l| i64::from(l.quantity)).sum();
        let subtotal = items.iter().map(|l| l.line_total).sum();
        Self {
            cart,
            items,
            item_count,
            subtotal,
        }
    }
}

/// Input for adding a variant to the cart
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AddItemInput {
    pub variant_id: Uuid,
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, max = 9999))]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}
