use std::env;

use customer_master_api::db::Database;
use customer_master_api::db_storage::{CustomerStore, PgCustomerStore};
use customer_master_api::errors::AppError;
use customer_master_api::models::{current_timestamp, Customer, CustomerChanges, CustomerSearch, NewCustomer};

/// Integration smoke test for the PostgreSQL customer store.
/// Marked ignored so it only runs when a database is available; set TEST_DATABASE_URL to run.
#[tokio::test]
#[ignore]
async fn test_pg_customer_store_smoke() -> anyhow::Result<()> {
    let db_url = env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL or DATABASE_URL to run this test"))?;

    let db = Database::new(&db_url, 2).await?;
    db.ensure_schema().await?;
    let store = PgCustomerStore::new(db.pool.clone());

    // Unique id so repeated runs do not collide.
    let id = format!("T{:04}", current_timestamp().timestamp_subsec_micros() % 10_000);
    let _ = store.delete(&id).await;

    let customer = Customer::from_new(
        NewCustomer {
            customer_id: Some(id.clone()),
            company_name: Some("Smoke 100% Test_Co".into()),
            phone: Some("555-0100".into()),
            ..Default::default()
        },
        current_timestamp(),
    );

    let inserted = store.insert(&customer).await.map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(inserted, customer);
    assert!(matches!(store.insert(&customer).await, Err(AppError::DuplicateId(_))));

    let found = store
        .search(&CustomerSearch {
            company_name: Some("100% TEST_".into()),
            ..Default::default()
        })
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert!(found.iter().any(|c| c.customer_id == id));

    let updated = store
        .update(
            &id,
            &CustomerChanges {
                phone: Some(None),
                ..Default::default()
            },
            current_timestamp(),
        )
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(updated.phone, None);
    assert!(updated.updated_at >= inserted.updated_at);

    store.delete(&id).await.map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert!(matches!(store.find_by_id(&id).await, Err(AppError::NotFound(_))));
    Ok(())
}
