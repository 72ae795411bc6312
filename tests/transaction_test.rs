mod common;

use assert_matches::assert_matches;
use chrono::Utc;
use common::TestApp;
use sea_orm::{ActiveModelTrait, DbErr, EntityTrait, PaginatorTrait, Set};
use storefront_core::{
    db::UnitOfWork,
    entities::commerce::{brand, Brand},
    errors::ServiceError,
};
use uuid::Uuid;

fn brand_row(slug: &str) -> brand::ActiveModel {
    brand::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(slug.to_uppercase()),
        slug: Set(slug.to_string()),
        created_at: Set(Utc::now()),
    }
}

async fn brand_count(app: &TestApp) -> u64 {
    Brand::find().count(&*app.db).await.unwrap()
}

#[tokio::test]
async fn committed_unit_persists_every_write() {
    let app = TestApp::new().await;

    let unit = UnitOfWork::begin(&app.db, "test_commit").await.unwrap();
    let result: Result<(), ServiceError> = async {
        brand_row("acme").insert(unit.conn()).await?;
        brand_row("globex").insert(unit.conn()).await?;
        Ok(())
    }
    .await;
    unit.finish(result).await.unwrap();

    assert_eq!(brand_count(&app).await, 2);
}

#[tokio::test]
async fn failed_unit_rolls_back_earlier_writes() {
    let app = TestApp::new().await;

    let unit = UnitOfWork::begin(&app.db, "test_rollback").await.unwrap();
    let result: Result<(), ServiceError> = async {
        brand_row("acme").insert(unit.conn()).await?;
        Err(ServiceError::validation("second step failed"))
    }
    .await;
    let err = unit.finish(result).await.unwrap_err();

    assert_matches!(err, ServiceError::ValidationError(_));
    assert_eq!(brand_count(&app).await, 0);
}

#[tokio::test]
async fn storage_failures_inside_a_unit_surface_as_aborted() {
    let app = TestApp::new().await;

    let unit = UnitOfWork::begin(&app.db, "test_abort").await.unwrap();
    let result: Result<(), ServiceError> = async {
        brand_row("acme").insert(unit.conn()).await?;
        Err(DbErr::Custom("disk full".into()).into())
    }
    .await;
    let err = unit.finish(result).await.unwrap_err();

    assert_matches!(
        err,
        ServiceError::TransactionAborted { ref operation, .. } if operation == "test_abort"
    );
    assert_eq!(brand_count(&app).await, 0);
}

#[tokio::test]
async fn duplicate_slugs_are_conflicts() {
    let app = TestApp::new().await;
    let brands = app.brands();
    brands
        .create_brand(storefront_core::services::commerce::BrandInput {
            name: "Acme".into(),
            slug: "acme".into(),
        })
        .await
        .unwrap();

    let again = brands
        .create_brand(storefront_core::services::commerce::BrandInput {
            name: "Acme Two".into(),
            slug: " acme ".into(),
        })
        .await;
    assert_matches!(again, Err(ServiceError::Conflict(_)));
    assert_eq!(brands.list_brands().await.unwrap().len(), 1);
}
