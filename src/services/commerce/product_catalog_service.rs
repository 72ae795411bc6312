use crate::{
    config::AppConfig,
    db::UnitOfWork,
    entities::commerce::{
        attribute_image, brand, category, inventory_level, product, product_variant,
        variant_attribute, AttributeImage, AttributeImageModel, Brand, Category, InventoryLevel,
        Product, ProductModel, ProductVariant, ProductVariantModel, VariantAttribute,
        VariantStatus,
    },
    errors::ServiceError,
    media,
    models::attributes::{AttributeSchema, AttributeSet, ImageUrls, ProductSpecs},
    services::commerce::{
        catalog_query::{paged_product_query, product_condition, Pagination, ProductFilters},
        image_resolver,
        variant_generator::{
            regenerate_variants, synthesize_sku, OptionSelections, VariantDraft, DEFAULT_BASE_SKU,
        },
    },
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Product catalog service: listing, detail, and product/variant/image writes
#[derive(Clone)]
pub struct ProductCatalogService {
    db: Arc<DatabaseConnection>,
    config: Arc<AppConfig>,
}

impl ProductCatalogService {
    pub fn new(db: Arc<DatabaseConnection>, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }

    /// Filtered page of products with their variants and thumbnails.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filters: &ProductFilters,
        pagination: Pagination,
    ) -> Result<Vec<ProductListItem>, ServiceError> {
        let (limit, offset) =
            pagination.resolve(self.config.default_page_size, self.config.max_page_size);
        let products = paged_product_query(filters, limit, offset)
            .all(&*self.db)
            .await?;

        let data = load_catalog_data(&*self.db, &products).await?;
        Ok(products
            .into_iter()
            .map(|p| data.list_item(p, &self.config.media_base_url))
            .collect())
    }

    /// Number of products matching `filters`, ignoring pagination.
    #[instrument(skip(self))]
    pub async fn count_products(&self, filters: &ProductFilters) -> Result<u64, ServiceError> {
        Product::find()
            .filter(product_condition(filters))
            .count(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Storefront search over published products.
    #[instrument(skip(self))]
    pub async fn search_products(
        &self,
        term: &str,
        pagination: Pagination,
    ) -> Result<ProductPage, ServiceError> {
        let filters = ProductFilters {
            search: Some(term.to_string()),
            ..ProductFilters::published()
        };
        let total = self.count_products(&filters).await?;
        let items = self.list_products(&filters, pagination).await?;
        Ok(ProductPage { items, total })
    }

    /// Product with variants, image bundles, main image and gallery.
    #[instrument(skip(self))]
    pub async fn get_product_by_id(&self, product_id: Uuid) -> Result<ProductDetail, ServiceError> {
        let product = Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))?;

        let data = load_catalog_data(&*self.db, std::slice::from_ref(&product)).await?;
        Ok(data.detail(product, &self.config.media_base_url))
    }

    /// Create a product together with its variants and image bundles
    #[instrument(skip(self, input), fields(slug = %input.slug))]
    pub async fn create_product(&self, input: ProductInput) -> Result<ProductDetail, ServiceError> {
        let schema = self.category_schema(input.category_id).await?;
        self.ensure_brand(input.brand_id).await?;
        let prepared = prepare_product(input, &schema, &self.config.media_base_url)?;
        let product_id = Uuid::new_v4();

        let unit = UnitOfWork::begin(&self.db, "create_product").await?;
        let result: Result<(), ServiceError> = async {
            let product = product::ActiveModel {
                id: Set(product_id),
                name: Set(prepared.name.clone()),
                sku: Set(prepared.sku.clone()),
                slug: Set(prepared.slug.clone()),
                description: Set(prepared.description.clone()),
                category_id: Set(prepared.category_id),
                brand_id: Set(prepared.brand_id),
                specs: Set(prepared.specs.clone()),
                is_published: Set(prepared.is_published),
                ..Default::default()
            };
            product.insert(unit.conn()).await?;
            sync_variants(unit.conn(), product_id, Vec::new(), &prepared.variants).await?;
            sync_bundles(unit.conn(), product_id, Vec::new(), &prepared.bundles).await?;
            Ok(())
        }
        .await;
        unit.finish(result).await?;

        info!(
            "Created product {} with {} variant(s)",
            product_id,
            prepared.variants.len()
        );
        self.get_product_by_id(product_id).await
    }

    /// Replace a product's fields and merge its variants and image bundles.
    ///
    /// Variants are matched to stored rows by attribute set and bundles by
    /// combo. Matched rows keep their id, unmatched incoming rows are
    /// inserted, stored rows with no incoming match are deleted.
    #[instrument(skip(self, input), fields(slug = %input.slug))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: ProductInput,
    ) -> Result<ProductDetail, ServiceError> {
        let existing = Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))?;
        let schema = self.category_schema(input.category_id).await?;
        self.ensure_brand(input.brand_id).await?;
        let prepared = prepare_product(input, &schema, &self.config.media_base_url)?;

        let unit = UnitOfWork::begin(&self.db, "update_product").await?;
        let result: Result<(), ServiceError> = async {
            let mut product: product::ActiveModel = existing.into();
            product.name = Set(prepared.name.clone());
            product.sku = Set(prepared.sku.clone());
            product.slug = Set(prepared.slug.clone());
            product.description = Set(prepared.description.clone());
            product.category_id = Set(prepared.category_id);
            product.brand_id = Set(prepared.brand_id);
            product.specs = Set(prepared.specs.clone());
            product.is_published = Set(prepared.is_published);
            product.update(unit.conn()).await?;

            let variants = ProductVariant::find()
                .filter(product_variant::Column::ProductId.eq(product_id))
                .all(unit.conn())
                .await?;
            sync_variants(unit.conn(), product_id, variants, &prepared.variants).await?;

            let bundles = AttributeImage::find()
                .filter(attribute_image::Column::ProductId.eq(product_id))
                .all(unit.conn())
                .await?;
            sync_bundles(unit.conn(), product_id, bundles, &prepared.bundles).await
        }
        .await;
        unit.finish(result).await?;

        info!("Updated product {}", product_id);
        self.get_product_by_id(product_id).await
    }

    /// Regenerated variant list for the admin console, not persisted.
    ///
    /// With a `product_id`, the product's stored variants are merged in so
    /// existing combinations keep their id, sku, prices, stock and status.
    #[instrument(skip(self))]
    pub async fn preview_variants(
        &self,
        input: PreviewVariantsInput,
    ) -> Result<Vec<VariantDraft>, ServiceError> {
        let schema = self.category_schema(input.category_id).await?;

        let mut base_sku = input.base_sku.clone();
        let mut previous = Vec::new();
        if let Some(product_id) = input.product_id {
            let product = Product::find_by_id(product_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| ServiceError::not_found("Product", product_id))?;
            if base_sku.is_none() {
                base_sku = product.sku.clone();
            }

            let data = load_catalog_data(&*self.db, std::slice::from_ref(&product)).await?;
            previous = data
                .variants_of(product.id)
                .iter()
                .map(|v| VariantDraft {
                    id: Some(v.id),
                    sku: v.sku.clone(),
                    name: v.name.clone(),
                    attribute_set: v.attribute_set.clone(),
                    price: v.price,
                    compare_at_price: v.compare_at_price,
                    cost: v.cost,
                    stock: data.stock_of(v.id),
                    status: v.status,
                })
                .collect();
        }

        Ok(regenerate_variants(
            &schema,
            &input.selections,
            base_sku.as_deref(),
            &previous,
        ))
    }

    async fn category_schema(&self, category_id: Uuid) -> Result<AttributeSchema, ServiceError> {
        Category::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .map(|c| c.attributes)
            .ok_or_else(|| ServiceError::not_found("Category", category_id))
    }

    async fn ensure_brand(&self, brand_id: Option<Uuid>) -> Result<(), ServiceError> {
        if let Some(brand_id) = brand_id {
            if Brand::find_by_id(brand_id).one(&*self.db).await?.is_none() {
                return Err(ServiceError::not_found("Brand", brand_id));
            }
        }
        Ok(())
    }
}

/// Variant as shown to shoppers and admins
#[derive(Debug, Clone, Serialize)]
pub struct VariantView {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub attribute_set: AttributeSet,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub cost: Option<Decimal>,
    pub status: VariantStatus,
    pub stock: i32,
    /// Thumbnail chosen by the image resolver
    pub image: Option<String>,
}

/// One row of a product listing
#[derive(Debug, Clone, Serialize)]
pub struct ProductListItem {
    pub id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    pub slug: String,
    pub category_id: Uuid,
    pub category_name: Option<String>,
    pub brand_id: Option<Uuid>,
    pub brand_name: Option<String>,
    pub is_published: bool,
    pub main_image: Option<String>,
    /// Lowest price among active variants
    pub price_from: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub variants: Vec<VariantView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub items: Vec<ProductListItem>,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttributeImageView {
    pub id: Uuid,
    pub attribute_combo: AttributeSet,
    pub image_urls: Vec<String>,
    pub position: i32,
}

/// Full product page
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    pub product: ProductModel,
    pub category_name: Option<String>,
    pub brand_name: Option<String>,
    pub main_image: Option<String>,
    pub variants: Vec<VariantView>,
    pub attribute_images: Vec<AttributeImageView>,
    /// Images of the bundle that best matches the first active variant
    pub gallery: Vec<String>,
}

/// Rows needed to render a batch of products, loaded once per batch.
pub(crate) struct CatalogData {
    categories: HashMap<Uuid, String>,
    brands: HashMap<Uuid, String>,
    variants: HashMap<Uuid, Vec<ProductVariantModel>>,
    stock: HashMap<Uuid, i32>,
    bundles: HashMap<Uuid, Vec<AttributeImageModel>>,
}

pub(crate) async fn load_catalog_data<C: ConnectionTrait>(
    conn: &C,
    products: &[ProductModel],
) -> Result<CatalogData, ServiceError> {
    let mut data = CatalogData {
        categories: HashMap::new(),
        brands: HashMap::new(),
        variants: HashMap::new(),
        stock: HashMap::new(),
        bundles: HashMap::new(),
    };
    if products.is_empty() {
        return Ok(data);
    }

    let product_ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
    let category_ids: HashSet<Uuid> = products.iter().map(|p| p.category_id).collect();
    let brand_ids: HashSet<Uuid> = products.iter().filter_map(|p| p.brand_id).collect();

    data.categories = Category::find()
        .filter(category::Column::Id.is_in(category_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    if !brand_ids.is_empty() {
        data.brands = Brand::find()
            .filter(brand::Column::Id.is_in(brand_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|b| (b.id, b.name))
            .collect();
    }

    let variants = ProductVariant::find()
        .filter(product_variant::Column::ProductId.is_in(product_ids.clone()))
        .order_by_asc(product_variant::Column::Position)
        .order_by_asc(product_variant::Column::CreatedAt)
        .all(conn)
        .await?;
    let variant_ids: Vec<Uuid> = variants.iter().map(|v| v.id).collect();
    for variant in variants {
        data.variants
            .entry(variant.product_id)
            .or_default()
            .push(variant);
    }

    if !variant_ids.is_empty() {
        data.stock = InventoryLevel::find()
            .filter(inventory_level::Column::VariantId.is_in(variant_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|level| (level.variant_id, level.on_hand))
            .collect();
    }

    data.bundles = bundles_by_product(conn, product_ids).await?;
    Ok(data)
}

/// Image bundles of each product, in position order.
pub(crate) async fn bundles_by_product<C: ConnectionTrait>(
    conn: &C,
    product_ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, Vec<AttributeImageModel>>, ServiceError> {
    let mut bundles: HashMap<Uuid, Vec<AttributeImageModel>> = HashMap::new();
    if product_ids.is_empty() {
        return Ok(bundles);
    }
    for bundle in AttributeImage::find()
        .filter(attribute_image::Column::ProductId.is_in(product_ids))
        .order_by_asc(attribute_image::Column::Position)
        .all(conn)
        .await?
    {
        bundles.entry(bundle.product_id).or_default().push(bundle);
    }
    Ok(bundles)
}

impl CatalogData {
    fn variants_of(&self, product_id: Uuid) -> &[ProductVariantModel] {
        self.variants
            .get(&product_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn bundles_of(&self, product_id: Uuid) -> &[AttributeImageModel] {
        self.bundles
            .get(&product_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn stock_of(&self, variant_id: Uuid) -> i32 {
        self.stock.get(&variant_id).copied().unwrap_or(0)
    }

    fn variant_views(&self, product_id: Uuid, media_base: &str) -> Vec<VariantView> {
        let bundles = self.bundles_of(product_id);
        self.variants_of(product_id)
            .iter()
            .map(|v| VariantView {
                id: v.id,
                sku: v.sku.clone(),
                name: v.name.clone(),
                attribute_set: v.attribute_set.clone(),
                price: v.price,
                compare_at_price: v.compare_at_price,
                cost: v.cost,
                status: v.status,
                stock: self.stock_of(v.id),
                image: media::absolutize_opt(
                    media_base,
                    image_resolver::resolve_image(bundles, &v.attribute_set),
                ),
            })
            .collect()
    }

    fn main_image(&self, product_id: Uuid, media_base: &str) -> Option<String> {
        media::absolutize_opt(
            media_base,
            image_resolver::main_image(self.bundles_of(product_id)),
        )
    }

    fn list_item(&self, product: ProductModel, media_base: &str) -> ProductListItem {
        let variants = self.variant_views(product.id, media_base);
        let price_from = variants
            .iter()
            .filter(|v| v.status == VariantStatus::Active)
            .map(|v| v.price)
            .min();
        ProductListItem {
            main_image: self.main_image(product.id, media_base),
            category_name: self.categories.get(&product.category_id).cloned(),
            brand_name: product.brand_id.and_then(|id| self.brands.get(&id).cloned()),
            id: product.id,
            name: product.name,
            sku: product.sku,
            slug: product.slug,
            category_id: product.category_id,
            brand_id: product.brand_id,
            is_published: product.is_published,
            price_from,
            created_at: product.created_at,
            variants,
        }
    }

    fn detail(&self, product: ProductModel, media_base: &str) -> ProductDetail {
        let bundles = self.bundles_of(product.id);
        let lead_set = self
            .variants_of(product.id)
            .iter()
            .find(|v| v.is_active())
            .map(|v| v.attribute_set.clone())
            .unwrap_or_default();
        let gallery = image_resolver::resolve_gallery(bundles, &lead_set)
            .iter()
            .map(|url| media::absolutize(media_base, url))
            .collect();
        let attribute_images = bundles
            .iter()
            .map(|b| AttributeImageView {
                id: b.id,
                attribute_combo: b.attribute_combo.clone(),
                image_urls: b
                    .image_urls
                    .0
                    .iter()
                    .map(|url| media::absolutize(media_base, url))
                    .collect(),
                position: b.position,
            })
            .collect();

        ProductDetail {
            category_name: self.categories.get(&product.category_id).cloned(),
            brand_name: product.brand_id.and_then(|id| self.brands.get(&id).cloned()),
            main_image: self.main_image(product.id, media_base),
            variants: self.variant_views(product.id, media_base),
            attribute_images,
            gallery,
            product,
        }
    }
}

struct PreparedProduct {
    name: String,
    sku: Option<String>,
    slug: String,
    description: Option<String>,
    category_id: Uuid,
    brand_id: Option<Uuid>,
    specs: ProductSpecs,
    is_published: bool,
    variants: Vec<PreparedVariant>,
    bundles: Vec<PreparedBundle>,
}

struct PreparedVariant {
    sku: String,
    name: String,
    attribute_set: AttributeSet,
    price: Decimal,
    compare_at_price: Option<Decimal>,
    cost: Option<Decimal>,
    stock: Option<i32>,
    status: Option<VariantStatus>,
}

struct PreparedBundle {
    attribute_combo: AttributeSet,
    image_urls: ImageUrls,
}

/// Validates and normalizes a product write against the category schema.
fn prepare_product(
    input: ProductInput,
    schema: &AttributeSchema,
    media_base: &str,
) -> Result<PreparedProduct, ServiceError> {
    input.validate()?;
    let name = input.name.trim().to_string();
    let slug = input.slug.trim().to_string();
    if name.is_empty() || slug.is_empty() {
        return Err(ServiceError::validation("product name and slug are required"));
    }
    let sku = input
        .sku
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let mut specs = input.specs;
    let dropped = specs.retain_text_of(schema);
    if !dropped.is_empty() {
        warn!(?dropped, "Ignoring specs that are not text attributes of the category");
    }

    let base_sku = sku.as_deref().unwrap_or(DEFAULT_BASE_SKU);
    let mut seen = HashSet::new();
    let mut variants = Vec::with_capacity(input.variants.len());
    for variant in input.variants {
        variant.options.ensure_options_of(schema)?;
        if !seen.insert(variant.options.key()) {
            return Err(ServiceError::validation(format!(
                "variant combination '{}' appears more than once",
                variant.options.display_name()
            )));
        }
        ensure_non_negative("price", Some(variant.price))?;
        ensure_non_negative("compare_at_price", variant.compare_at_price)?;
        ensure_non_negative("cost", variant.cost)?;
        if variant.stock.is_some_and(|s| s < 0) {
            return Err(ServiceError::validation("stock cannot be negative"));
        }

        let variant_sku = variant
            .sku
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| synthesize_sku(base_sku, &variant.options));
        let variant_name = variant
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| {
                if variant.options.is_empty() {
                    name.clone()
                } else {
                    variant.options.display_name()
                }
            });

        variants.push(PreparedVariant {
            sku: variant_sku,
            name: variant_name,
            attribute_set: variant.options,
            price: variant.price,
            compare_at_price: variant.compare_at_price,
            cost: variant.cost,
            stock: variant.stock,
            status: variant.status,
        });
    }

    let mut seen = HashSet::new();
    let mut bundles = Vec::with_capacity(input.attribute_images.len());
    for bundle in input.attribute_images {
        bundle.attribute_combo.ensure_options_of(schema)?;
        if !seen.insert(bundle.attribute_combo.key()) {
            return Err(ServiceError::validation(format!(
                "image combination '{}' appears more than once",
                bundle.attribute_combo.display_name()
            )));
        }
        let urls = bundle
            .image_urls
            .iter()
            .map(|url| media::strip_base(media_base, url))
            .filter(|url| !url.is_empty())
            .collect();
        bundles.push(PreparedBundle {
            attribute_combo: bundle.attribute_combo,
            image_urls: ImageUrls(urls),
        });
    }

    Ok(PreparedProduct {
        name,
        sku,
        slug,
        description: input.description.filter(|d| !d.trim().is_empty()),
        category_id: input.category_id,
        brand_id: input.brand_id,
        specs,
        is_published: input.is_published,
        variants,
        bundles,
    })
}

fn ensure_non_negative(field: &str, value: Option<Decimal>) -> Result<(), ServiceError> {
    match value {
        Some(v) if v.is_sign_negative() && !v.is_zero() => Err(ServiceError::validation(format!(
            "{} cannot be negative",
            field
        ))),
        _ => Ok(()),
    }
}

async fn sync_variants<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    existing: Vec<ProductVariantModel>,
    incoming: &[PreparedVariant],
) -> Result<(), ServiceError> {
    let mut stored: HashMap<Vec<(String, String)>, ProductVariantModel> = existing
        .into_iter()
        .map(|v| (v.attribute_set.key(), v))
        .collect();
    let mut matched = Vec::with_capacity(incoming.len());
    for variant in incoming {
        matched.push(stored.remove(&variant.attribute_set.key()));
    }

    // Stale rows go first so their skus can be reused below.
    let stale: Vec<Uuid> = stored.values().map(|v| v.id).collect();
    if !stale.is_empty() {
        ProductVariant::delete_many()
            .filter(product_variant::Column::Id.is_in(stale.clone()))
            .exec(conn)
            .await?;
        info!(product_id = %product_id, removed = stale.len(), "Removed variants");
    }

    // Kept rows whose sku changes are parked on a placeholder first, so
    // skus can move between variants without tripping the unique index.
    let renamed: Vec<Uuid> = incoming
        .iter()
        .zip(&matched)
        .filter_map(|(variant, previous)| previous.as_ref().filter(|p| p.sku != variant.sku))
        .map(|previous| previous.id)
        .collect();
    for id in &renamed {
        ProductVariant::update_many()
            .col_expr(
                product_variant::Column::Sku,
                Expr::value(format!("~{}", id.simple())),
            )
            .filter(product_variant::Column::Id.eq(*id))
            .exec(conn)
            .await?;
    }

    let now = Utc::now();
    for (position, (variant, previous)) in incoming.iter().zip(matched).enumerate() {
        let variant_id = match previous {
            Some(previous) => {
                let status = variant.status.unwrap_or(previous.status);
                let mut active: product_variant::ActiveModel = previous.into();
                active.sku = Set(variant.sku.clone());
                active.name = Set(variant.name.clone());
                active.attribute_set = Set(variant.attribute_set.clone());
                active.price = Set(variant.price);
                active.compare_at_price = Set(variant.compare_at_price);
                active.cost = Set(variant.cost);
                active.status = Set(status);
                active.position = Set(position as i32);
                active.update(conn).await?.id
            }
            None => {
                let created = product_variant::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    product_id: Set(product_id),
                    sku: Set(variant.sku.clone()),
                    name: Set(variant.name.clone()),
                    attribute_set: Set(variant.attribute_set.clone()),
                    price: Set(variant.price),
                    compare_at_price: Set(variant.compare_at_price),
                    cost: Set(variant.cost),
                    status: Set(variant.status.unwrap_or_default()),
                    position: Set(position as i32),
                    ..Default::default()
                }
                .insert(conn)
                .await?;
                index_attributes(conn, &created).await?;
                if variant.stock.is_none() {
                    set_stock(conn, created.id, 0, now).await?;
                }
                created.id
            }
        };

        if let Some(stock) = variant.stock {
            set_stock(conn, variant_id, stock, now).await?;
        }
    }

    Ok(())
}

async fn index_attributes<C: ConnectionTrait>(
    conn: &C,
    variant: &ProductVariantModel,
) -> Result<(), ServiceError> {
    if variant.attribute_set.is_empty() {
        return Ok(());
    }
    let rows = variant
        .attribute_set
        .iter()
        .map(|pair| variant_attribute::ActiveModel {
            variant_id: Set(variant.id),
            name: Set(pair.name.clone()),
            value: Set(pair.value.clone()),
            product_id: Set(variant.product_id),
        });
    VariantAttribute::insert_many(rows)
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

async fn set_stock<C: ConnectionTrait>(
    conn: &C,
    variant_id: Uuid,
    on_hand: i32,
    now: DateTime<Utc>,
) -> Result<(), ServiceError> {
    let level = inventory_level::ActiveModel {
        variant_id: Set(variant_id),
        on_hand: Set(on_hand),
        updated_at: Set(now),
    };
    InventoryLevel::insert(level)
        .on_conflict(
            OnConflict::column(inventory_level::Column::VariantId)
                .update_columns([
                    inventory_level::Column::OnHand,
                    inventory_level::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

async fn sync_bundles<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    existing: Vec<AttributeImageModel>,
    incoming: &[PreparedBundle],
) -> Result<(), ServiceError> {
    let mut stored: HashMap<Vec<(String, String)>, AttributeImageModel> = existing
        .into_iter()
        .map(|b| (b.attribute_combo.key(), b))
        .collect();
    let mut matched = Vec::with_capacity(incoming.len());
    for bundle in incoming {
        matched.push(stored.remove(&bundle.attribute_combo.key()));
    }

    let stale: Vec<Uuid> = stored.values().map(|b| b.id).collect();
    if !stale.is_empty() {
        AttributeImage::delete_many()
            .filter(attribute_image::Column::Id.is_in(stale))
            .exec(conn)
            .await?;
    }

    let now = Utc::now();
    for (position, (bundle, previous)) in incoming.iter().zip(matched).enumerate() {
        match previous {
            Some(previous) => {
                let mut active: attribute_image::ActiveModel = previous.into();
                active.attribute_combo = Set(bundle.attribute_combo.clone());
                active.image_urls = Set(bundle.image_urls.clone());
                active.position = Set(position as i32);
                active.update(conn).await?;
            }
            None => {
                attribute_image::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    product_id: Set(product_id),
                    attribute_combo: Set(bundle.attribute_combo.clone()),
                    image_urls: Set(bundle.image_urls.clone()),
                    position: Set(position as i32),
                    created_at: Set(now),
                }
                .insert(conn)
                .await?;
            }
        }
    }

    Ok(())
}

/// Input for creating or updating a product
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ProductInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category_id: Uuid,
    #[serde(default)]
    pub brand_id: Option<Uuid>,
    #[serde(default)]
    pub specs: ProductSpecs,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub variants: Vec<VariantInput>,
    #[serde(default)]
    pub attribute_images: Vec<AttributeImageInput>,
}

/// One variant row of a product write
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VariantInput {
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "attributes", alias = "attribute_set")]
    pub options: AttributeSet,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub compare_at_price: Option<Decimal>,
    #[serde(default)]
    pub cost: Option<Decimal>,
    /// Absent keeps the stored stock of a matched variant
    #[serde(default)]
    pub stock: Option<i32>,
    #[serde(default)]
    pub status: Option<VariantStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AttributeImageInput {
    #[serde(default)]
    pub attribute_combo: AttributeSet,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PreviewVariantsInput {
    pub category_id: Uuid,
    #[serde(default)]
    pub product_id: Option<Uuid>,
    #[serde(default)]
    pub base_sku: Option<String>,
    #[serde(default)]
    pub selections: OptionSelections,
}
