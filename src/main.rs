use std::{collections::BTreeMap, fs, path::PathBuf, str::FromStr, sync::Arc};

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Serialize};
use storefront_core::{
    config::{self, AppConfig},
    db::{self, DbPool},
    entities::{commerce::ReviewStatus, OrderStatus},
    models::attributes::{AttributeDefinition, AttributeKind},
    services::commerce::{
        AttributeMatch, BrandInput, BrandService, CategoryInput, CategoryService, OrderDetail,
        OrderService, Pagination, PreviewVariantsInput, ProductCatalogService, ProductFilters,
        ProductInput, ProductListItem, ReviewService, UpdateOrderStatusInput,
    },
};
use tracing::info;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize().await?;

    match cli.command {
        Commands::Migrate => {
            db::run_migrations(&context.db)
                .await
                .context("failed to run migrations")?;
            println!("Migrations applied");
        }
        Commands::Categories(command) => handle_categories_command(&context, command, cli.json).await?,
        Commands::Brands(command) => handle_brands_command(&context, command, cli.json).await?,
        Commands::Products(command) => handle_products_command(&context, command, cli.json).await?,
        Commands::Orders(command) => handle_orders_command(&context, command, cli.json).await?,
        Commands::Reviews(command) => handle_reviews_command(&context, command, cli.json).await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "storefront", about = "Storefront catalog and order administration", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending schema migrations
    Migrate,
    #[command(subcommand)]
    Categories(CategoriesCommands),
    #[command(subcommand)]
    Brands(BrandsCommands),
    #[command(subcommand)]
    Products(ProductsCommands),
    #[command(subcommand)]
    Orders(OrdersCommands),
    #[command(subcommand)]
    Reviews(ReviewsCommands),
}

#[derive(Subcommand)]
enum CategoriesCommands {
    List,
    Show(IdArgs),
    Create(CategoryCreateArgs),
    Delete(IdArgs),
}

#[derive(Subcommand)]
enum BrandsCommands {
    List,
    Create(BrandCreateArgs),
}

#[derive(Subcommand)]
enum ProductsCommands {
    List(ProductListArgs),
    Show(IdArgs),
    /// Create a product from a JSON document
    Create(FileArgs),
    /// Replace a product from a JSON document
    Update(ProductUpdateArgs),
    /// Show the variants a selection would generate
    Preview(PreviewArgs),
}

#[derive(Subcommand)]
enum OrdersCommands {
    List(OrderListArgs),
    Show(IdArgs),
    SetStatus(SetStatusArgs),
}

#[derive(Subcommand)]
enum ReviewsCommands {
    /// Approved reviews of a product
    List(IdArgs),
    /// Approve or reject a review
    Moderate(ModerateArgs),
}

#[derive(Args)]
struct IdArgs {
    id: Uuid,
}

#[derive(Args)]
struct FileArgs {
    #[arg(long, help = "Path to a JSON file")]
    file: PathBuf,
}

#[derive(Args)]
struct CategoryCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    slug: String,
    #[arg(long)]
    parent: Option<Uuid>,
    #[arg(long)]
    icon: Option<String>,
    #[arg(
        long = "option",
        help = "Option attribute name (repeatable)",
        action = ArgAction::Append
    )]
    options: Vec<String>,
    #[arg(
        long = "text",
        help = "Text attribute name (repeatable)",
        action = ArgAction::Append
    )]
    texts: Vec<String>,
}

#[derive(Args)]
struct BrandCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    slug: String,
}

#[derive(Args)]
struct ProductListArgs {
    #[arg(long)]
    category: Option<Uuid>,
    #[arg(long)]
    brand: Option<Uuid>,
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    min_price: Option<Decimal>,
    #[arg(long)]
    max_price: Option<Decimal>,
    #[arg(
        long = "attr",
        help = "Attribute filter as name=value (repeatable)",
        action = ArgAction::Append
    )]
    attributes: Vec<KeyValue>,
    #[arg(long, action = ArgAction::SetTrue, help = "Require one variant to match every filter")]
    same_variant: bool,
    #[arg(long, action = ArgAction::SetTrue, help = "Only published products")]
    published: bool,
    #[arg(long)]
    limit: Option<u64>,
    #[arg(long, default_value_t = 0)]
    offset: u64,
    #[arg(long, action = ArgAction::SetTrue, help = "Return every match")]
    all: bool,
}

#[derive(Args)]
struct ProductUpdateArgs {
    id: Uuid,
    #[arg(long)]
    file: PathBuf,
}

#[derive(Args)]
struct PreviewArgs {
    #[arg(long)]
    category: Uuid,
    #[arg(long)]
    product: Option<Uuid>,
    #[arg(long)]
    base_sku: Option<String>,
    #[arg(
        long = "select",
        help = "Chosen values as name=v1,v2 (repeatable)",
        action = ArgAction::Append
    )]
    selections: Vec<KeyValue>,
}

#[derive(Args)]
struct OrderListArgs {
    #[arg(long)]
    user: Uuid,
}

#[derive(Args)]
struct SetStatusArgs {
    id: Uuid,
    #[arg(long)]
    status: String,
    #[arg(long)]
    comment: Option<String>,
}

#[derive(Args)]
struct ModerateArgs {
    id: Uuid,
    #[arg(long, help = "pending, approved or rejected")]
    status: String,
}

#[derive(Clone)]
struct KeyValue {
    key: String,
    value: String,
}

impl FromStr for KeyValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected name=value, got '{}'", s))?;
        Ok(Self {
            key: key.trim().to_string(),
            value: value.trim().to_string(),
        })
    }
}

struct CliContext {
    config: Arc<AppConfig>,
    db: Arc<DbPool>,
}

impl CliContext {
    async fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let db_pool = db::connect(&config)
            .await
            .context("failed to connect to database")?;
        db::ping(&db_pool).await.context("database is not reachable")?;
        if config.auto_migrate {
            db::run_migrations(&db_pool)
                .await
                .context("failed to run migrations")?;
        }
        info!(environment = %config.environment, "Storefront CLI ready");

        Ok(Self {
            config: Arc::new(config),
            db: Arc::new(db_pool),
        })
    }

    fn category_service(&self) -> CategoryService {
        CategoryService::new(self.db.clone())
    }

    fn brand_service(&self) -> BrandService {
        BrandService::new(self.db.clone())
    }

    fn product_service(&self) -> ProductCatalogService {
        ProductCatalogService::new(self.db.clone(), self.config.clone())
    }

    fn order_service(&self) -> OrderService {
        OrderService::new(self.db.clone(), self.config.clone())
    }

    fn review_service(&self) -> ReviewService {
        ReviewService::new(self.db.clone(), self.config.clone())
    }
}

async fn handle_categories_command(
    context: &CliContext,
    command: CategoriesCommands,
    json: bool,
) -> Result<()> {
    let service = context.category_service();
    match command {
        CategoriesCommands::List => {
            let categories = service.list_categories().await.context("failed to list categories")?;
            if json {
                print_json(&categories)?;
            } else {
                for summary in &categories {
                    println!(
                        "- {} ({}) • {} product(s) • {}",
                        summary.category.name,
                        summary.category.slug,
                        summary.product_count,
                        summary.category.id
                    );
                }
            }
        }
        CategoriesCommands::Show(args) => {
            let category = service
                .get_category_by_id(args.id)
                .await
                .with_context(|| format!("failed to fetch category {}", args.id))?;
            if json {
                print_json(&category)?;
            } else {
                println!("{} ({}) • status {}", category.name, category.slug, category.status);
                for def in category.attributes.definitions() {
                    println!("  • {} [{}]", def.name, kind_label(def.kind));
                }
            }
        }
        CategoriesCommands::Create(args) => {
            let attributes = args
                .options
                .into_iter()
                .map(AttributeDefinition::option)
                .chain(args.texts.into_iter().map(AttributeDefinition::text))
                .collect();
            let category = service
                .create_category(CategoryInput {
                    name: args.name,
                    slug: args.slug,
                    parent_id: args.parent,
                    icon: args.icon,
                    status: None,
                    attributes,
                })
                .await
                .context("failed to create category")?;
            if json {
                print_json(&category)?;
            } else {
                println!("Created category {} ({})", category.slug, category.id);
            }
        }
        CategoriesCommands::Delete(args) => {
            service
                .delete_category(args.id)
                .await
                .with_context(|| format!("failed to delete category {}", args.id))?;
            println!("Deleted category {}", args.id);
        }
    }
    Ok(())
}

async fn handle_brands_command(
    context: &CliContext,
    command: BrandsCommands,
    json: bool,
) -> Result<()> {
    let service = context.brand_service();
    match command {
        BrandsCommands::List => {
            let brands = service.list_brands().await.context("failed to list brands")?;
            if json {
                print_json(&brands)?;
            } else {
                for brand in &brands {
                    println!("- {} ({}) • {}", brand.name, brand.slug, brand.id);
                }
            }
        }
        BrandsCommands::Create(args) => {
            let brand = service
                .create_brand(BrandInput {
                    name: args.name,
                    slug: args.slug,
                })
                .await
                .context("failed to create brand")?;
            if json {
                print_json(&brand)?;
            } else {
                println!("Created brand {} ({})", brand.slug, brand.id);
            }
        }
    }
    Ok(())
}

async fn handle_products_command(
    context: &CliContext,
    command: ProductsCommands,
    json: bool,
) -> Result<()> {
    let service = context.product_service();
    match command {
        ProductsCommands::List(args) => {
            let filters = ProductFilters {
                published: args.published.then_some(true),
                category_id: args.category,
                brand_id: args.brand,
                search: args.search,
                min_price: args.min_price,
                max_price: args.max_price,
                attributes: args
                    .attributes
                    .into_iter()
                    .map(|kv| (kv.key, kv.value))
                    .collect(),
                attribute_match: if args.same_variant {
                    AttributeMatch::SameVariant
                } else {
                    AttributeMatch::AnyVariant
                },
            };
            let pagination = if args.all {
                Pagination::All
            } else {
                Pagination::Page {
                    limit: args.limit,
                    offset: Some(args.offset),
                }
            };
            let total = service.count_products(&filters).await.context("failed to count products")?;
            let items = service
                .list_products(&filters, pagination)
                .await
                .context("failed to list products")?;
            if json {
                print_json(&serde_json::json!({ "total": total, "items": items }))?;
            } else {
                println!("{} product(s) match, showing {}", total, items.len());
                for item in &items {
                    render_product(item);
                }
            }
        }
        ProductsCommands::Show(args) => {
            let detail = service
                .get_product_by_id(args.id)
                .await
                .with_context(|| format!("failed to fetch product {}", args.id))?;
            if json {
                print_json(&detail)?;
            } else {
                println!(
                    "{} ({}) • category {} • published {}",
                    detail.product.name,
                    detail.product.slug,
                    detail.category_name.as_deref().unwrap_or("-"),
                    detail.product.is_published
                );
                for variant in &detail.variants {
                    println!(
                        "  • {} {} @ {} • stock {} • {}",
                        variant.sku,
                        variant.name,
                        variant.price,
                        variant.stock,
                        variant.image.as_deref().unwrap_or("no image")
                    );
                }
            }
        }
        ProductsCommands::Create(args) => {
            let input: ProductInput = read_json(&args.file)?;
            let detail = service.create_product(input).await.context("failed to create product")?;
            if json {
                print_json(&detail)?;
            } else {
                println!(
                    "Created product {} ({}) with {} variant(s)",
                    detail.product.slug,
                    detail.product.id,
                    detail.variants.len()
                );
            }
        }
        ProductsCommands::Update(args) => {
            let input: ProductInput = read_json(&args.file)?;
            let detail = service
                .update_product(args.id, input)
                .await
                .with_context(|| format!("failed to update product {}", args.id))?;
            if json {
                print_json(&detail)?;
            } else {
                println!(
                    "Updated product {} with {} variant(s)",
                    detail.product.id,
                    detail.variants.len()
                );
            }
        }
        ProductsCommands::Preview(args) => {
            let mut selections = BTreeMap::new();
            for kv in args.selections {
                selections.insert(
                    kv.key,
                    kv.value.split(',').map(|v| v.trim().to_string()).collect(),
                );
            }
            let drafts = service
                .preview_variants(PreviewVariantsInput {
                    category_id: args.category,
                    product_id: args.product,
                    base_sku: args.base_sku,
                    selections,
                })
                .await
                .context("failed to preview variants")?;
            if json {
                print_json(&drafts)?;
            } else {
                println!("{} variant(s):", drafts.len());
                for draft in &drafts {
                    println!(
                        "  • {} {} @ {}{}",
                        draft.sku,
                        draft.name,
                        draft.price,
                        if draft.id.is_some() { " (existing)" } else { "" }
                    );
                }
            }
        }
    }
    Ok(())
}

async fn handle_orders_command(
    context: &CliContext,
    command: OrdersCommands,
    json: bool,
) -> Result<()> {
    let service = context.order_service();
    match command {
        OrdersCommands::List(args) => {
            let orders = service
                .get_orders_for_user(args.user)
                .await
                .with_context(|| format!("failed to list orders for user {}", args.user))?;
            if json {
                print_json(&orders)?;
            } else if orders.is_empty() {
                println!("User {} has no orders", args.user);
            } else {
                for summary in &orders {
                    println!(
                        "- {} • {} • {} item(s) • total {} {}",
                        summary.order.order_code,
                        summary.order.status,
                        summary.items.len(),
                        summary.order.total,
                        summary.order.currency
                    );
                }
            }
        }
        OrdersCommands::Show(args) => {
            let detail = service
                .get_order_by_id(args.id)
                .await
                .with_context(|| format!("failed to fetch order {}", args.id))?;
            if json {
                print_json(&detail)?;
            } else {
                render_order(&detail);
            }
        }
        OrdersCommands::SetStatus(args) => {
            let status = OrderStatus::from_str(&args.status)
                .map_err(|_| anyhow!("unknown order status '{}'", args.status))?;
            let order = service
                .update_order_status(
                    args.id,
                    UpdateOrderStatusInput {
                        status,
                        comment: args.comment,
                    },
                )
                .await
                .with_context(|| format!("failed to update status for order {}", args.id))?;
            if json {
                print_json(&order)?;
            } else {
                println!("Order {} is now {}", order.order_code, order.status);
            }
        }
    }
    Ok(())
}

async fn handle_reviews_command(
    context: &CliContext,
    command: ReviewsCommands,
    json: bool,
) -> Result<()> {
    let service = context.review_service();
    match command {
        ReviewsCommands::List(args) => {
            let reviews = service
                .get_product_reviews(args.id)
                .await
                .with_context(|| format!("failed to list reviews for product {}", args.id))?;
            if json {
                print_json(&reviews)?;
            } else if reviews.is_empty() {
                println!("Product {} has no approved reviews", args.id);
            } else {
                for review in &reviews {
                    println!(
                        "- {}/5{} • {} • {}",
                        review.rating,
                        if review.is_verified_purchase { " (verified)" } else { "" },
                        review.created_at.format("%Y-%m-%d"),
                        review.comment.as_deref().unwrap_or("")
                    );
                }
            }
        }
        ReviewsCommands::Moderate(args) => {
            let status = ReviewStatus::from_str(&args.status.to_lowercase())
                .map_err(|_| anyhow!("unknown review status '{}'", args.status))?;
            let review = service
                .set_review_status(args.id, status)
                .await
                .with_context(|| format!("failed to moderate review {}", args.id))?;
            if json {
                print_json(&review)?;
            } else {
                println!("Review {} is now {}", review.id, review.status);
            }
        }
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &PathBuf) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn kind_label(kind: AttributeKind) -> &'static str {
    if kind.is_option() {
        "option"
    } else {
        "text"
    }
}

fn render_product(item: &ProductListItem) {
    let price = item
        .price_from
        .map(|p| p.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "- {} ({}) • {} • from {} • {} variant(s)",
        item.name,
        item.slug,
        item.category_name.as_deref().unwrap_or("-"),
        price,
        item.variants.len()
    );
}

fn render_order(detail: &OrderDetail) {
    let order = &detail.order;
    println!(
        "Order {} • status {} • subtotal {} • shipping {} • total {} {}",
        order.order_code, order.status, order.subtotal, order.shipping_fee, order.total, order.currency
    );
    println!("  Ship to {}: {}", order.shipping_address.recipient, order.shipping_address.one_line());
    for item in &detail.items {
        println!(
            "  • {} x {} @ {} (total {})",
            item.quantity, item.name, item.unit_price, item.line_total
        );
    }
    if let Some(payment) = &detail.payment {
        println!("  Payment {} • {}", payment.provider, payment.status);
    }
    for entry in &detail.history {
        println!(
            "  [{}] {} {}",
            entry.created_at.format("%Y-%m-%d %H:%M"),
            entry.status,
            entry.comment.as_deref().unwrap_or("")
        );
    }
}
