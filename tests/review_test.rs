mod common;

use assert_matches::assert_matches;
use common::{variant, TestApp};
use storefront_core::{
    entities::{commerce::ReviewStatus, OrderStatus},
    errors::ServiceError,
    models::ShippingAddress,
    services::commerce::{
        AddItemInput, PlaceOrderInput, ReviewInput, ShippingChoice, UpdateOrderStatusInput,
    },
};
use uuid::Uuid;

fn review(product_id: Uuid, rating: i16, comment: &str) -> ReviewInput {
    ReviewInput {
        product_id,
        rating,
        comment: Some(comment.to_string()),
    }
}

/// Places and completes an order for one unit of `variant_id`.
async fn complete_purchase(app: &TestApp, user: Uuid, variant_id: Uuid) {
    app.carts()
        .add_item(user, AddItemInput { variant_id, quantity: 1 })
        .await
        .unwrap();
    let placed = app
        .orders()
        .place_order(
            user,
            PlaceOrderInput {
                shipping: ShippingChoice::Inline(ShippingAddress {
                    recipient: "Minh".to_string(),
                    phone: "0912345678".to_string(),
                    line1: "3 Trang Tien".to_string(),
                    line2: None,
                    ward: None,
                    district: None,
                    province: Some("Ha Noi".to_string()),
                }),
                payment_method: "cod".to_string(),
                notes: None,
            },
        )
        .await
        .unwrap();
    for status in [OrderStatus::Paid, OrderStatus::Shipped, OrderStatus::Completed] {
        app.orders()
            .update_order_status(placed.order.id, UpdateOrderStatusInput { status, comment: None })
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn completed_orders_make_reviews_verified() {
    let app = TestApp::new().await;
    let category = app.laptop_category().await;
    let product = app
        .create_product(
            category,
            "Reviewed",
            vec![variant(&[("color", "Red")], 100, 5), variant(&[("color", "Blue")], 100, 5)],
            vec![],
        )
        .await;
    let other = app
        .create_product(category, "Other", vec![variant(&[("color", "Red")], 10, 5)], vec![])
        .await;
    let reviews = app.reviews();
    let buyer = Uuid::new_v4();

    let early = reviews
        .add_review(buyer, review(product.product.id, 4, "looks nice"))
        .await
        .unwrap();
    assert!(!early.is_verified_purchase);

    // A completed order of another product does not count.
    complete_purchase(&app, buyer, other.variants[0].id).await;
    let unrelated = reviews
        .add_review(buyer, review(product.product.id, 4, "still waiting"))
        .await
        .unwrap();
    assert!(!unrelated.is_verified_purchase);

    complete_purchase(&app, buyer, product.variants[1].id).await;
    let verified = reviews
        .add_review(buyer, review(product.product.id, 5, "great after a month"))
        .await
        .unwrap();
    assert!(verified.is_verified_purchase);
    assert_eq!(verified.status, ReviewStatus::Approved);

    let stranger = reviews
        .add_review(Uuid::new_v4(), review(product.product.id, 2, "never bought it"))
        .await
        .unwrap();
    assert!(!stranger.is_verified_purchase);
}

#[tokio::test]
async fn open_orders_do_not_verify_a_review() {
    let app = TestApp::new().await;
    let category = app.laptop_category().await;
    let product = app
        .create_product(category, "Pending", vec![variant(&[("color", "Red")], 100, 5)], vec![])
        .await;
    let buyer = Uuid::new_v4();
    app.carts()
        .add_item(buyer, AddItemInput { variant_id: product.variants[0].id, quantity: 1 })
        .await
        .unwrap();
    app.orders()
        .place_order(
            buyer,
            PlaceOrderInput {
                shipping: ShippingChoice::Inline(ShippingAddress {
                    recipient: "Minh".to_string(),
                    phone: "0912345678".to_string(),
                    line1: "3 Trang Tien".to_string(),
                    line2: None,
                    ward: None,
                    district: None,
                    province: None,
                }),
                payment_method: "cod".to_string(),
                notes: None,
            },
        )
        .await
        .unwrap();

    let saved = app
        .reviews()
        .add_review(buyer, review(product.product.id, 5, "arrives soon"))
        .await
        .unwrap();
    assert!(!saved.is_verified_purchase);
}

#[tokio::test]
async fn product_reviews_list_approved_newest_first() {
    let app = TestApp::with_config(|cfg| cfg.moderate_reviews = true).await;
    let category = app.laptop_category().await;
    let product = app
        .create_product(category, "Listed", vec![variant(&[("color", "Red")], 100, 5)], vec![])
        .await;
    let reviews = app.reviews();

    let first = reviews
        .add_review(Uuid::new_v4(), review(product.product.id, 3, "first"))
        .await
        .unwrap();
    let second = reviews
        .add_review(Uuid::new_v4(), review(product.product.id, 4, "second"))
        .await
        .unwrap();
    let hidden = reviews
        .add_review(Uuid::new_v4(), review(product.product.id, 1, "spam"))
        .await
        .unwrap();
    assert_eq!(first.status, ReviewStatus::Pending);
    assert!(reviews.get_product_reviews(product.product.id).await.unwrap().is_empty());

    reviews.set_review_status(first.id, ReviewStatus::Approved).await.unwrap();
    reviews.set_review_status(second.id, ReviewStatus::Approved).await.unwrap();
    reviews.set_review_status(hidden.id, ReviewStatus::Rejected).await.unwrap();

    let listed: Vec<Uuid> = reviews
        .get_product_reviews(product.product.id)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(listed, vec![second.id, first.id]);
}

#[tokio::test]
async fn review_input_is_checked() {
    let app = TestApp::new().await;
    let category = app.laptop_category().await;
    let product = app
        .create_product(category, "Checked", vec![variant(&[("color", "Red")], 100, 5)], vec![])
        .await;
    let reviews = app.reviews();
    let user = Uuid::new_v4();

    for rating in [0, 6] {
        assert_matches!(
            reviews.add_review(user, review(product.product.id, rating, "x")).await,
            Err(ServiceError::ValidationError(_))
        );
    }
    assert_matches!(
        reviews.add_review(user, review(Uuid::new_v4(), 5, "x")).await,
        Err(ServiceError::NotFound(_))
    );
    assert_matches!(
        reviews.set_review_status(Uuid::new_v4(), ReviewStatus::Approved).await,
        Err(ServiceError::NotFound(_))
    );
}
