/// Database connection tests
pub mod db_tests;

/// CRUD operations over the portal and source tables
pub mod crud_tests;


use anyhow::Result;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;

/// DB-backed tests run only with a reachable `DATABASE_URL`.
pub(crate) fn db_tests_disabled() -> bool {
    std::env::var("SKIP_DB_TESTS").is_ok() || std::env::var("DATABASE_URL").is_err()
}

pub(crate) async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = crate::db::connect().await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}
