use crate::db::{connect_with_config, test_connection, DatabaseConfig};
use super::{db_tests_disabled, setup_test_db};
use sea_orm::{ConnectionTrait, Statement};
use std::time::{Duration, Instant};
use anyhow::Result;

#[tokio::test]
async fn test_basic_connection() -> Result<()> {
    if db_tests_disabled() {
        println!("Skipping database tests");
        return Ok(());
    }

    let start = Instant::now();
    let db = setup_test_db().await?;
    let connection_time = start.elapsed();

    let backend = db.get_database_backend();
    let row = db.query_one(Statement::from_string(backend, "SELECT 1 AS test".to_string())).await?;
    assert!(row.is_some());

    assert!(connection_time < Duration::from_secs(30), "connection took too long: {:?}", connection_time);
    Ok(())
}

#[tokio::test]
async fn test_custom_config_connection() -> Result<()> {
    if db_tests_disabled() {
        return Ok(());
    }

    let config = DatabaseConfig {
        url: crate::db::DATABASE_URL.clone(),
        max_connections: 3,
        min_connections: 1,
        connect_timeout: Duration::from_secs(10),
        ..DatabaseConfig::default()
    };
    let db = connect_with_config(&config).await?;
    test_connection(&db).await?;
    Ok(())
}
