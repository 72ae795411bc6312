mod common;

use assert_matches::assert_matches;
use common::{images, product_input, set, variant, TestApp};
use rust_decimal_macros::dec;
use storefront_core::{
    errors::ServiceError,
    models::attributes::AttributeDefinition,
    services::commerce::{
        AddItemInput, AttributeMatch, CategoryInput, Pagination, PreviewVariantsInput,
        ProductFilters, VariantInput,
    },
};
use uuid::Uuid;

#[tokio::test]
async fn price_range_filter_counts_what_it_lists() {
    let app = TestApp::new().await;
    let category = app.laptop_category().await;

    let a = app
        .create_product(
            category,
            "Alpha",
            vec![variant(&[("color", "Red")], 50, 1), variant(&[("color", "Blue")], 150, 1)],
            vec![],
        )
        .await;
    app.create_product(category, "Bravo", vec![variant(&[("color", "Red")], 250, 1)], vec![])
        .await;
    let c = app
        .create_product(
            category,
            "Charlie",
            vec![variant(&[("ram", "8GB")], 100, 1), variant(&[("ram", "16GB")], 300, 1)],
            vec![],
        )
        .await;

    let filters = ProductFilters {
        min_price: Some(dec!(100)),
        max_price: Some(dec!(200)),
        ..Default::default()
    };
    let catalog = app.catalog();
    let listed = catalog.list_products(&filters, Pagination::All).await.unwrap();
    let count = catalog.count_products(&filters).await.unwrap();

    assert_eq!(count, listed.len() as u64);
    let mut ids: Vec<Uuid> = listed.iter().map(|p| p.id).collect();
    ids.sort();
    let mut expected = vec![a.product.id, c.product.id];
    expected.sort();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn search_is_case_insensitive_and_literal() {
    let app = TestApp::new().await;
    let category = app.laptop_category().await;
    app.create_product(category, "Gaming Laptop", vec![variant(&[], 10, 1)], vec![])
        .await;
    app.create_product(category, "Office Mouse", vec![variant(&[], 10, 1)], vec![])
        .await;

    let catalog = app.catalog();
    let page = catalog.search_products("LAPTOP", Pagination::default()).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].name, "Gaming Laptop");

    // Matches the description text too.
    let page = catalog.search_products("mouse desc", Pagination::default()).await.unwrap();
    assert_eq!(page.total, 1);

    let page = catalog.search_products("%", Pagination::default()).await.unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn attribute_filters_relax_across_variants_unless_asked_not_to() {
    let app = TestApp::new().await;
    let category = app.laptop_category().await;
    let mixed = app
        .create_product(
            category,
            "Mixed",
            vec![
                variant(&[("color", "Red"), ("ram", "8GB")], 100, 1),
                variant(&[("color", "Blue"), ("ram", "16GB")], 200, 1),
            ],
            vec![],
        )
        .await;
    let exact = app
        .create_product(
            category,
            "Exact",
            vec![variant(&[("color", "Red"), ("ram", "16GB")], 300, 1)],
            vec![],
        )
        .await;

    let mut filters = ProductFilters::default();
    filters.attributes.insert("color".into(), "Red".into());
    filters.attributes.insert("ram".into(), "16GB".into());

    let catalog = app.catalog();
    let relaxed = catalog.list_products(&filters, Pagination::All).await.unwrap();
    assert_eq!(relaxed.len(), 2);
    assert_eq!(catalog.count_products(&filters).await.unwrap(), 2);

    filters.attribute_match = AttributeMatch::SameVariant;
    let strict = catalog.list_products(&filters, Pagination::All).await.unwrap();
    assert_eq!(strict.len(), 1);
    assert_eq!(strict[0].id, exact.product.id);
    assert_ne!(strict[0].id, mixed.product.id);
    assert_eq!(catalog.count_products(&filters).await.unwrap(), 1);
}

#[tokio::test]
async fn pagination_walks_every_product_once() {
    let app = TestApp::new().await;
    let category = app.laptop_category().await;
    for name in ["One", "Two", "Three"] {
        app.create_product(category, name, vec![variant(&[], 10, 1)], vec![])
            .await;
    }

    let catalog = app.catalog();
    let filters = ProductFilters::published();
    let first = catalog.list_products(&filters, Pagination::page(2, 0)).await.unwrap();
    let second = catalog.list_products(&filters, Pagination::page(2, 2)).await.unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 1);

    let mut seen: Vec<Uuid> = first.iter().chain(second.iter()).map(|p| p.id).collect();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 3);
}

#[tokio::test]
async fn detail_resolves_images_against_the_media_base() {
    let app = TestApp::with_config(|cfg| cfg.media_base_url = "https://cdn.test".into()).await;
    let category = app.laptop_category().await;
    let detail = app
        .create_product(
            category,
            "Pictured",
            vec![
                variant(&[("color", "Red"), ("ram", "16GB")], 100, 1),
                variant(&[("color", "Blue"), ("ram", "8GB")], 90, 1),
            ],
            vec![
                images(&[], &["/img/general.jpg", "/img/general-2.jpg"]),
                images(&[("color", "Red")], &["https://cdn.test/img/red.jpg"]),
                images(&[("color", "Red"), ("ram", "16GB")], &["/img/red-16.jpg"]),
            ],
        )
        .await;

    assert_eq!(detail.main_image.as_deref(), Some("https://cdn.test/img/general.jpg"));
    let red = detail
        .variants
        .iter()
        .find(|v| v.attribute_set.contains("color", "Red"))
        .unwrap();
    assert_eq!(red.image.as_deref(), Some("https://cdn.test/img/red-16.jpg"));
    let blue = detail
        .variants
        .iter()
        .find(|v| v.attribute_set.contains("color", "Blue"))
        .unwrap();
    assert_eq!(blue.image.as_deref(), Some("https://cdn.test/img/general.jpg"));

    // Stored without the base, returned with it.
    let red_bundle = detail
        .attribute_images
        .iter()
        .find(|b| b.attribute_combo == set(&[("color", "Red")]))
        .unwrap();
    assert_eq!(red_bundle.image_urls, vec!["https://cdn.test/img/red.jpg".to_string()]);
    assert_eq!(detail.gallery, vec!["https://cdn.test/img/red-16.jpg".to_string()]);
}

#[tokio::test]
async fn update_merges_variants_and_keeps_cart_lines() {
    let app = TestApp::new().await;
    let category = app.laptop_category().await;
    let created = app
        .create_product(
            category,
            "Merged",
            vec![variant(&[("color", "Red")], 100, 5), variant(&[("color", "Blue")], 100, 5)],
            vec![],
        )
        .await;
    let red_id = created
        .variants
        .iter()
        .find(|v| v.attribute_set.contains("color", "Red"))
        .unwrap()
        .id;

    let user = Uuid::new_v4();
    app.carts()
        .add_item(user, AddItemInput { variant_id: red_id, quantity: 2 })
        .await
        .unwrap();

    let updated = app
        .catalog()
        .update_product(
            created.product.id,
            product_input(
                category,
                "Merged",
                vec![
                    VariantInput {
                        price: dec!(120),
                        ..variant(&[("color", "Red")], 0, 0)
                    }
                    .without_stock(),
                    variant(&[("color", "Green")], 80, 3),
                ],
                vec![],
            ),
        )
        .await
        .unwrap();

    assert_eq!(updated.variants.len(), 2);
    let red = updated.variants.iter().find(|v| v.id == red_id).unwrap();
    assert_eq!(red.price, dec!(120));
    assert_eq!(red.stock, 5);
    assert!(updated.variants.iter().all(|v| !v.attribute_set.contains("color", "Blue")));

    let cart = app.carts().get_cart(user).await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].variant_id, red_id);
    assert_eq!(cart.items[0].line_total, dec!(240));
}

#[tokio::test]
async fn variants_can_trade_skus_in_one_update() {
    let app = TestApp::new().await;
    let category = app.laptop_category().await;
    let with_sku = |sku: &str, color: &str| VariantInput {
        sku: Some(sku.to_string()),
        ..variant(&[("color", color)], 100, 4)
    };
    let created = app
        .create_product(
            category,
            "Swapped",
            vec![with_sku("SKU-A", "Red"), with_sku("SKU-B", "Blue")],
            vec![],
        )
        .await;
    let id_of = |color: &str| {
        created
            .variants
            .iter()
            .find(|v| v.attribute_set.contains("color", color))
            .unwrap()
            .id
    };
    let (red_id, blue_id) = (id_of("Red"), id_of("Blue"));

    let updated = app
        .catalog()
        .update_product(
            created.product.id,
            product_input(
                category,
                "Swapped",
                vec![with_sku("SKU-B", "Red"), with_sku("SKU-A", "Blue")],
                vec![],
            ),
        )
        .await
        .unwrap();

    let red = updated.variants.iter().find(|v| v.id == red_id).unwrap();
    let blue = updated.variants.iter().find(|v| v.id == blue_id).unwrap();
    assert_eq!(red.sku, "SKU-B");
    assert_eq!(blue.sku, "SKU-A");
    assert_eq!(red.stock, 4);
}

trait WithoutStock {
    fn without_stock(self) -> Self;
}

impl WithoutStock for VariantInput {
    fn without_stock(mut self) -> Self {
        self.stock = None;
        self
    }
}

#[tokio::test]
async fn preview_merges_stored_variants() {
    let app = TestApp::new().await;
    let category = app.laptop_category().await;
    let created = app
        .create_product(category, "Preview", vec![variant(&[("color", "Red")], 70, 4)], vec![])
        .await;

    let mut selections = std::collections::BTreeMap::new();
    selections.insert("color".to_string(), vec!["Red".to_string(), "Black".to_string()]);
    selections.insert("ram".to_string(), vec![]);
    let drafts = app
        .catalog()
        .preview_variants(PreviewVariantsInput {
            category_id: category,
            product_id: Some(created.product.id),
            base_sku: None,
            selections,
        })
        .await
        .unwrap();

    assert_eq!(drafts.len(), 2);
    assert_eq!(drafts[0].id, Some(created.variants[0].id));
    assert_eq!(drafts[0].price, dec!(70));
    assert_eq!(drafts[0].stock, 4);
    assert_eq!(drafts[1].id, None);
    assert_eq!(drafts[1].sku, "PREVIEW-BLA");
}

#[tokio::test]
async fn product_writes_are_validated_against_the_schema() {
    let app = TestApp::new().await;
    let category = app.laptop_category().await;
    let catalog = app.catalog();

    let text_keyed = product_input(category, "Heavy", vec![variant(&[("weight", "2kg")], 10, 1)], vec![]);
    assert_matches!(
        catalog.create_product(text_keyed).await,
        Err(ServiceError::ValidationError(_))
    );

    let unknown_category = product_input(Uuid::new_v4(), "Lost", vec![], vec![]);
    assert_matches!(
        catalog.create_product(unknown_category).await,
        Err(ServiceError::NotFound(_))
    );

    app.create_product(category, "Twin", vec![variant(&[], 10, 1)], vec![])
        .await;
    let mut duplicate = product_input(category, "Twin", vec![], vec![]);
    duplicate.sku = Some("OTHER".into());
    assert_matches!(
        catalog.create_product(duplicate).await,
        Err(ServiceError::Conflict(_))
    );
}

#[tokio::test]
async fn categories_report_usage_and_refuse_deletion_while_used() {
    let app = TestApp::new().await;
    let used = app.laptop_category().await;
    let service = app.categories();
    let empty = service
        .create_category(CategoryInput {
            name: "Accessories".into(),
            slug: "accessories".into(),
            parent_id: None,
            icon: None,
            status: None,
            attributes: vec![AttributeDefinition::text("material")],
        })
        .await
        .unwrap();
    app.create_product(used, "Counted", vec![variant(&[], 10, 1)], vec![])
        .await;

    let listed = service.list_categories().await.unwrap();
    assert_eq!(listed[0].category.name, "Accessories");
    assert_eq!(listed[0].product_count, 0);
    assert_eq!(listed[1].product_count, 1);

    assert_matches!(service.delete_category(used).await, Err(ServiceError::Conflict(_)));
    service.delete_category(empty.id).await.unwrap();
    assert_matches!(
        service.get_category_by_id(empty.id).await,
        Err(ServiceError::NotFound(_))
    );

    let fetched = service.get_category_by_id(used).await.unwrap();
    let names: Vec<&str> = fetched
        .attributes
        .definitions()
        .iter()
        .map(|d| d.name.as_str())
        .collect();
    assert_eq!(names, vec!["color", "ram", "weight"]);
}
