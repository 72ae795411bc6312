use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_catalog_tables::Migration),
            Box::new(m20250101_000002_create_cart_tables::Migration),
            Box::new(m20250101_000003_create_order_tables::Migration),
            Box::new(m20250101_000004_create_review_tables::Migration),
        ]
    }
}

// Migration implementations

mod m20250101_000001_create_catalog_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000001_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Categories::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Categories::ParentId).uuid().null())
                        .col(ColumnDef::new(Categories::Name).string().not_null())
                        .col(ColumnDef::new(Categories::Slug).string().not_null())
                        .col(ColumnDef::new(Categories::Icon).string().null())
                        .col(
                            ColumnDef::new(Categories::Status)
                                .string_len(20)
                                .not_null()
                                .default("active"),
                        )
                        .col(ColumnDef::new(Categories::Attributes).json().not_null())
                        .col(
                            ColumnDef::new(Categories::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Categories::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_categories_parent_id")
                                .from(Categories::Table, Categories::ParentId)
                                .to(Categories::Table, Categories::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_categories_slug")
                        .table(Categories::Table)
                        .col(Categories::Slug)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Brands::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Brands::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Brands::Name).string().not_null())
                        .col(ColumnDef::new(Brands::Slug).string().not_null())
                        .col(
                            ColumnDef::new(Brands::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_brands_slug")
                        .table(Brands::Table)
                        .col(Brands::Slug)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Sku).string().null())
                        .col(ColumnDef::new(Products::Slug).string().not_null())
                        .col(ColumnDef::new(Products::Description).text().null())
                        .col(ColumnDef::new(Products::CategoryId).uuid().not_null())
                        .col(ColumnDef::new(Products::BrandId).uuid().null())
                        .col(ColumnDef::new(Products::Specs).json().not_null())
                        .col(
                            ColumnDef::new(Products::IsPublished)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_products_category_id")
                                .from(Products::Table, Products::CategoryId)
                                .to(Categories::Table, Categories::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_products_brand_id")
                                .from(Products::Table, Products::BrandId)
                                .to(Brands::Table, Brands::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            for (name, column) in [
                ("uq_products_slug", Products::Slug),
                ("uq_products_sku", Products::Sku),
            ] {
                manager
                    .create_index(
                        Index::create()
                            .if_not_exists()
                            .name(name)
                            .table(Products::Table)
                            .col(column)
                            .unique()
                            .to_owned(),
                    )
                    .await?;
            }

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_created_at")
                        .table(Products::Table)
                        .col(Products::CreatedAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductVariants::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductVariants::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductVariants::ProductId).uuid().not_null())
                        .col(ColumnDef::new(ProductVariants::Sku).string().not_null())
                        .col(ColumnDef::new(ProductVariants::Name).string().not_null())
                        .col(
                            ColumnDef::new(ProductVariants::AttributeSet)
                                .json()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::Price)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::CompareAtPrice)
                                .decimal_len(16, 4)
                                .null(),
                        )
                        .col(ColumnDef::new(ProductVariants::Cost).decimal_len(16, 4).null())
                        .col(
                            ColumnDef::new(ProductVariants::Status)
                                .string_len(20)
                                .not_null()
                                .default("active"),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::Position)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_product_variants_product_id")
                                .from(ProductVariants::Table, ProductVariants::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_product_variants_sku")
                        .table(ProductVariants::Table)
                        .col(ProductVariants::Sku)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_variants_product_id")
                        .table(ProductVariants::Table)
                        .col(ProductVariants::ProductId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(VariantAttributeValues::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(VariantAttributeValues::VariantId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(VariantAttributeValues::Name)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(VariantAttributeValues::Value)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(VariantAttributeValues::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .primary_key(
                            Index::create()
                                .col(VariantAttributeValues::VariantId)
                                .col(VariantAttributeValues::Name),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_variant_attribute_values_variant_id")
                                .from(
                                    VariantAttributeValues::Table,
                                    VariantAttributeValues::VariantId,
                                )
                                .to(ProductVariants::Table, ProductVariants::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_variant_attribute_values_product_id")
                                .from(
                                    VariantAttributeValues::Table,
                                    VariantAttributeValues::ProductId,
                                )
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_variant_attribute_values_name_value")
                        .table(VariantAttributeValues::Table)
                        .col(VariantAttributeValues::Name)
                        .col(VariantAttributeValues::Value)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductAttributeImages::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductAttributeImages::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductAttributeImages::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductAttributeImages::AttributeCombo)
                                .json()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductAttributeImages::ImageUrls)
                                .json()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductAttributeImages::Position)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductAttributeImages::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_product_attribute_images_product_id")
                                .from(
                                    ProductAttributeImages::Table,
                                    ProductAttributeImages::ProductId,
                                )
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InventoryLevels::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryLevels::VariantId)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryLevels::OnHand)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryLevels::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_levels_variant_id")
                                .from(InventoryLevels::Table, InventoryLevels::VariantId)
                                .to(ProductVariants::Table, ProductVariants::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryLevels::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ProductAttributeImages::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(VariantAttributeValues::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ProductVariants::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Brands::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Categories {
        Table,
        Id,
        ParentId,
        Name,
        Slug,
        Icon,
        Status,
        Attributes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Brands {
        Table,
        Id,
        Name,
        Slug,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Products {
        Table,
        Id,
        Name,
        Sku,
        Slug,
        Description,
        CategoryId,
        BrandId,
        Specs,
        IsPublished,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum ProductVariants {
        Table,
        Id,
        ProductId,
        Sku,
        Name,
        AttributeSet,
        Price,
        CompareAtPrice,
        Cost,
        Status,
        Position,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum VariantAttributeValues {
        Table,
        VariantId,
        Name,
        Value,
        ProductId,
    }

    #[derive(DeriveIden)]
    enum ProductAttributeImages {
        Table,
        Id,
        ProductId,
        AttributeCombo,
        ImageUrls,
        Position,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum InventoryLevels {
        Table,
        VariantId,
        OnHand,
        UpdatedAt,
    }
}

mod m20250101_000002_create_cart_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000002_create_cart_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Carts::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Carts::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Carts::UserId).uuid().not_null())
                        .col(ColumnDef::new(Carts::OpenOwnerId).uuid().null())
                        .col(
                            ColumnDef::new(Carts::Status)
                                .string_len(20)
                                .not_null()
                                .default("open"),
                        )
                        .col(
                            ColumnDef::new(Carts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Carts::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // At most one open cart per user
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_carts_open_owner_id")
                        .table(Carts::Table)
                        .col(Carts::OpenOwnerId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_carts_user_id")
                        .table(Carts::Table)
                        .col(Carts::UserId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CartItems::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(CartItems::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(CartItems::CartId).uuid().not_null())
                        .col(ColumnDef::new(CartItems::VariantId).uuid().not_null())
                        .col(ColumnDef::new(CartItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(CartItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CartItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .check(Expr::col(CartItems::Quantity).gte(1))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_cart_items_cart_id")
                                .from(CartItems::Table, CartItems::CartId)
                                .to(Carts::Table, Carts::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_cart_items_variant_id")
                                .from(CartItems::Table, CartItems::VariantId)
                                .to(ProductVariants::Table, ProductVariants::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_cart_items_cart_variant")
                        .table(CartItems::Table)
                        .col(CartItems::CartId)
                        .col(CartItems::VariantId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CustomerAddresses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CustomerAddresses::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CustomerAddresses::UserId).uuid().not_null())
                        .col(ColumnDef::new(CustomerAddresses::Recipient).string().not_null())
                        .col(ColumnDef::new(CustomerAddresses::Phone).string().not_null())
                        .col(ColumnDef::new(CustomerAddresses::Line1).string().not_null())
                        .col(ColumnDef::new(CustomerAddresses::Line2).string().null())
                        .col(ColumnDef::new(CustomerAddresses::Ward).string().null())
                        .col(ColumnDef::new(CustomerAddresses::District).string().null())
                        .col(ColumnDef::new(CustomerAddresses::Province).string().null())
                        .col(
                            ColumnDef::new(CustomerAddresses::IsDefault)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(CustomerAddresses::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_customer_addresses_user_id")
                        .table(CustomerAddresses::Table)
                        .col(CustomerAddresses::UserId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CustomerAddresses::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(CartItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Carts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Carts {
        Table,
        Id,
        UserId,
        OpenOwnerId,
        Status,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum CartItems {
        Table,
        Id,
        CartId,
        VariantId,
        Quantity,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum ProductVariants {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum CustomerAddresses {
        Table,
        Id,
        UserId,
        Recipient,
        Phone,
        Line1,
        Line2,
        Ward,
        District,
        Province,
        IsDefault,
        CreatedAt,
    }
}

mod m20250101_000003_create_order_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000003_create_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Orders::UserId).uuid().not_null())
                        .col(ColumnDef::new(Orders::OrderCode).string().not_null())
                        .col(ColumnDef::new(Orders::Status).string_len(20).not_null())
                        .col(ColumnDef::new(Orders::Currency).string_len(3).not_null())
                        .col(ColumnDef::new(Orders::Subtotal).decimal_len(16, 4).not_null())
                        .col(
                            ColumnDef::new(Orders::ShippingFee)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::Total).decimal_len(16, 4).not_null())
                        .col(ColumnDef::new(Orders::ShippingAddress).json().not_null())
                        .col(ColumnDef::new(Orders::CustomerNotes).text().null())
                        .col(
                            ColumnDef::new(Orders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_orders_order_code")
                        .table(Orders::Table)
                        .col(Orders::OrderCode)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_user_id")
                        .table(Orders::Table)
                        .col(Orders::UserId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(OrderItems::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::VariantId).uuid().null())
                        .col(ColumnDef::new(OrderItems::Sku).string().not_null())
                        .col(ColumnDef::new(OrderItems::Name).string().not_null())
                        .col(
                            ColumnDef::new(OrderItems::UnitPrice)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(OrderItems::LineTotal)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderItems::Position)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(OrderItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_order_id")
                                .from(OrderItems::Table, OrderItems::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_variant_id")
                                .from(OrderItems::Table, OrderItems::VariantId)
                                .to(ProductVariants::Table, ProductVariants::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_items_order_id")
                        .table(OrderItems::Table)
                        .col(OrderItems::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Payments::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Payments::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Payments::OrderId).uuid().not_null())
                        .col(ColumnDef::new(Payments::Provider).string().not_null())
                        .col(ColumnDef::new(Payments::Amount).decimal_len(16, 4).not_null())
                        .col(ColumnDef::new(Payments::Currency).string_len(3).not_null())
                        .col(ColumnDef::new(Payments::Status).string_len(20).not_null())
                        .col(
                            ColumnDef::new(Payments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Payments::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_payments_order_id")
                                .from(Payments::Table, Payments::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_payments_order_id")
                        .table(Payments::Table)
                        .col(Payments::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderStatusHistory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderStatusHistory::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderStatusHistory::OrderId).uuid().not_null())
                        .col(
                            ColumnDef::new(OrderStatusHistory::Status)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderStatusHistory::Comment).text().null())
                        .col(
                            ColumnDef::new(OrderStatusHistory::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_status_history_order_id")
                                .from(OrderStatusHistory::Table, OrderStatusHistory::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_status_history_order_id")
                        .table(OrderStatusHistory::Table)
                        .col(OrderStatusHistory::OrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderStatusHistory::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Payments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Orders {
        Table,
        Id,
        UserId,
        OrderCode,
        Status,
        Currency,
        Subtotal,
        ShippingFee,
        Total,
        ShippingAddress,
        CustomerNotes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum OrderItems {
        Table,
        Id,
        OrderId,
        VariantId,
        Sku,
        Name,
        UnitPrice,
        Quantity,
        LineTotal,
        Position,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum ProductVariants {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Payments {
        Table,
        Id,
        OrderId,
        Provider,
        Amount,
        Currency,
        Status,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum OrderStatusHistory {
        Table,
        Id,
        OrderId,
        Status,
        Comment,
        CreatedAt,
    }
}

mod m20250101_000004_create_review_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000004_create_review_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Reviews::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Reviews::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Reviews::ProductId).uuid().not_null())
                        .col(ColumnDef::new(Reviews::UserId).uuid().not_null())
                        .col(ColumnDef::new(Reviews::Rating).small_integer().not_null())
                        .col(ColumnDef::new(Reviews::Comment).text().null())
                        .col(
                            ColumnDef::new(Reviews::IsVerifiedPurchase)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Reviews::Status).string_len(20).not_null())
                        .col(
                            ColumnDef::new(Reviews::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Reviews::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_reviews_product_id")
                                .from(Reviews::Table, Reviews::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_reviews_product_status")
                        .table(Reviews::Table)
                        .col(Reviews::ProductId)
                        .col(Reviews::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Reviews::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Reviews {
        Table,
        Id,
        ProductId,
        UserId,
        Rating,
        Comment,
        IsVerifiedPurchase,
        Status,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Products {
        Table,
        Id,
    }
}
