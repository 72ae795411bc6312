#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use storefront_core::{
    config::AppConfig,
    db,
    models::attributes::{AttributeDefinition, AttributeSet},
    services::commerce::{
        AddressService, AttributeImageInput, BrandService, CartService, CategoryInput,
        CategoryService, OrderService, ProductCatalogService, ProductDetail, ProductInput,
        ReviewService, VariantInput,
    },
};
use uuid::Uuid;

/// Services backed by a fresh in-memory SQLite database with the real schema.
pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Like [`TestApp::new`], with a hook to adjust configuration first.
    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let mut cfg = AppConfig {
            database_url: "sqlite::memory:".to_string(),
            environment: "test".to_string(),
            // A single connection keeps every statement on the same in-memory database.
            db_max_connections: 1,
            db_min_connections: 1,
            ..AppConfig::default()
        };
        adjust(&mut cfg);

        let pool = db::connect(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations");

        Self {
            db: Arc::new(pool),
            config: Arc::new(cfg),
        }
    }

    pub fn categories(&self) -> CategoryService {
        CategoryService::new(self.db.clone())
    }

    pub fn brands(&self) -> BrandService {
        BrandService::new(self.db.clone())
    }

    pub fn catalog(&self) -> ProductCatalogService {
        ProductCatalogService::new(self.db.clone(), self.config.clone())
    }

    pub fn carts(&self) -> CartService {
        CartService::new(self.db.clone(), self.config.clone())
    }

    pub fn orders(&self) -> OrderService {
        OrderService::new(self.db.clone(), self.config.clone())
    }

    pub fn addresses(&self) -> AddressService {
        AddressService::new(self.db.clone())
    }

    pub fn reviews(&self) -> ReviewService {
        ReviewService::new(self.db.clone(), self.config.clone())
    }

    /// Category with option attributes `color` and `ram` and text attribute `weight`.
    pub async fn laptop_category(&self) -> Uuid {
        self.categories()
            .create_category(CategoryInput {
                name: "Laptops".into(),
                slug: format!("laptops-{}", Uuid::new_v4().simple()),
                parent_id: None,
                icon: None,
                status: None,
                attributes: vec![
                    AttributeDefinition::option("color"),
                    AttributeDefinition::option("ram"),
                    AttributeDefinition::text("weight"),
                ],
            })
            .await
            .expect("failed to create category")
            .id
    }

    pub async fn create_product(
        &self,
        category_id: Uuid,
        name: &str,
        variants: Vec<VariantInput>,
        attribute_images: Vec<AttributeImageInput>,
    ) -> ProductDetail {
        self.catalog()
            .create_product(product_input(category_id, name, variants, attribute_images))
            .await
            .expect("failed to create product")
    }
}

pub fn product_input(
    category_id: Uuid,
    name: &str,
    variants: Vec<VariantInput>,
    attribute_images: Vec<AttributeImageInput>,
) -> ProductInput {
    let slug = name.to_lowercase().replace(' ', "-");
    ProductInput {
        name: name.to_string(),
        sku: Some(slug.to_uppercase()),
        slug,
        description: Some(format!("{} description", name)),
        category_id,
        brand_id: None,
        specs: Default::default(),
        is_published: true,
        variants,
        attribute_images,
    }
}

pub fn set(pairs: &[(&str, &str)]) -> AttributeSet {
    pairs.iter().copied().collect()
}

pub fn variant(pairs: &[(&str, &str)], price: i64, stock: i32) -> VariantInput {
    VariantInput {
        options: set(pairs),
        price: Decimal::from(price),
        stock: Some(stock),
        ..Default::default()
    }
}

pub fn images(pairs: &[(&str, &str)], urls: &[&str]) -> AttributeImageInput {
    AttributeImageInput {
        attribute_combo: set(pairs),
        image_urls: urls.iter().map(|u| u.to_string()).collect(),
    }
}
