use std::env;
use std::time::Duration;

use telecom_insights_api::data::db::Database;
use telecom_insights_api::data::sources::{DataSource, DatabaseSource};

/// Integration smoke test for the relational data source.
/// Marked ignored so it never runs against a shared database by accident; set TEST_DATABASE_URL to run.
#[tokio::test]
#[ignore]
async fn database_source_smoke_test() -> anyhow::Result<()> {
    let db_url = env::var("TEST_DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL to run this test"))?;

    let db = Database::connect_lazy(&db_url, Duration::from_secs(5))?;

    // Unique table per run; NUMERIC spend and a missing sms column exercise coercion.
    let table = format!("customers_smoke_{}", std::process::id());
    sqlx::query(&format!(
        "CREATE TABLE {} (customer_id BIGINT, name TEXT, region TEXT, \
         avg_monthly_data_gb DOUBLE PRECISION, avg_monthly_minutes INTEGER, \
         avg_monthly_spend NUMERIC(10, 2))",
        table
    ))
    .execute(&db.pool)
    .await?;
    sqlx::query(&format!(
        "INSERT INTO {} VALUES (1, 'Amit', 'Delhi', 5.5, 120, 399.99), (2, NULL, NULL, NULL, NULL, NULL)",
        table
    ))
    .execute(&db.pool)
    .await?;

    let source = DatabaseSource::new(db.pool.clone(), table.clone());
    let result = source.fetch().await;

    sqlx::query(&format!("DROP TABLE {}", table))
        .execute(&db.pool)
        .await?;

    let rows = result.map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].customer_id, Some(1));
    assert_eq!(rows[0].avg_monthly_minutes, Some(120.0));
    assert_eq!(rows[0].avg_monthly_spend, Some(399.99));
    assert_eq!(rows[0].avg_monthly_sms, None);
    assert_eq!(rows[1].name, None);
    Ok(())
}
