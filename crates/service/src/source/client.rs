//! Connections to user data sources.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement, Value};
use tracing::{debug, info};

use crate::errors::ServiceError;
use super::dialect::{self, DataType};
use super::domain::{QueryColumn, SourceConfig, TableInfo};
use super::sql::{introspect, InsertStatement};

#[async_trait]
pub trait SourceClient: Send + Sync {
    async fn test_connection(&self, config: &SourceConfig) -> Result<(), ServiceError>;
    async fn list_tables(&self, config: &SourceConfig) -> Result<Vec<String>, ServiceError>;
    async fn table_exists(&self, config: &SourceConfig, table: &str) -> Result<bool, ServiceError>;
    async fn table_columns(&self, config: &SourceConfig, table: &str) -> Result<TableInfo, ServiceError>;
    /// Run one DDL statement.
    async fn execute(&self, config: &SourceConfig, sql: &str) -> Result<(), ServiceError>;
    /// Run one multi-row insert; returns rows affected.
    async fn insert_batch(&self, config: &SourceConfig, stmt: InsertStatement) -> Result<u64, ServiceError>;
    /// Forget any pooled connection for this config.
    fn release(&self, _config: &SourceConfig) {}
}

fn source_err(e: sea_orm::DbErr) -> ServiceError {
    ServiceError::Source(e.to_string())
}

type PoolKey = (String, String, String);

/// SeaORM/sqlx pools keyed by (url, username, password), opened on first use.
pub struct SeaOrmSourceClient {
    pools: DashMap<PoolKey, DatabaseConnection>,
    connect_timeout: Duration,
    max_connections: u32,
}

impl SeaOrmSourceClient {
    pub fn new(settings: &configs::SourceConfig) -> Self {
        Self {
            pools: DashMap::new(),
            connect_timeout: Duration::from_secs(settings.connect_timeout_secs),
            max_connections: settings.max_connections,
        }
    }

    fn key(config: &SourceConfig) -> PoolKey {
        (config.url.trim().to_string(), config.username.clone(), config.password.clone())
    }

    /// Open a new pool without caching it.
    async fn connect(&self, config: &SourceConfig, max_connections: u32) -> Result<DatabaseConnection, ServiceError> {
        match DataType::from_url(&config.url) {
            Some(dt) if dt.is_connectable() => {}
            _ => return Err(ServiceError::Source(format!("Unsupported data source: {}", config.url))),
        }
        let url = dialect::native_url(&config.url, &config.username, &config.password)?;
        let mut opts = ConnectOptions::new(url);
        opts.max_connections(max_connections)
            .min_connections(0)
            .connect_timeout(self.connect_timeout)
            .acquire_timeout(self.connect_timeout)
            .sqlx_logging(false);
        Database::connect(opts).await.map_err(source_err)
    }

    async fn pool(&self, config: &SourceConfig) -> Result<DatabaseConnection, ServiceError> {
        let key = Self::key(config);
        if let Some(db) = self.pools.get(&key) {
            return Ok(db.clone());
        }
        let db = self.connect(config, self.max_connections).await?;
        info!(url = %key.0, user = %key.1, "opened data source pool");
        // a concurrent caller may have won the race; keep whichever landed first
        let pooled = self.pools.entry(key).or_insert(db).clone();
        Ok(pooled)
    }
}

#[async_trait]
impl SourceClient for SeaOrmSourceClient {
    /// Always dials a fresh single connection so the given credentials are checked.
    async fn test_connection(&self, config: &SourceConfig) -> Result<(), ServiceError> {
        let db = self.connect(config, 1).await?;
        let backend = db.get_database_backend();
        let probed = db
            .execute(Statement::from_string(backend, "SELECT 1".to_string()))
            .await
            .map_err(source_err);
        if let Err(e) = db.close().await {
            debug!(error = %e, "closing test connection failed");
        }
        probed.map(|_| ())
    }

    async fn list_tables(&self, config: &SourceConfig) -> Result<Vec<String>, ServiceError> {
        let db = self.pool(config).await?;
        let backend = db.get_database_backend();
        let rows = db
            .query_all(Statement::from_string(backend, introspect::list_tables(backend).to_string()))
            .await
            .map_err(source_err)?;
        rows.iter()
            .map(|r| r.try_get::<String>("", "name").map_err(source_err))
            .collect()
    }

    async fn table_exists(&self, config: &SourceConfig, table: &str) -> Result<bool, ServiceError> {
        let db = self.pool(config).await?;
        let backend = db.get_database_backend();
        let row = db
            .query_one(Statement::from_sql_and_values(backend, introspect::table_exists(backend), [Value::from(table)]))
            .await
            .map_err(source_err)?;
        let count = match row {
            Some(r) => r.try_get::<i64>("", "cnt").map_err(source_err)?,
            None => 0,
        };
        Ok(count > 0)
    }

    async fn table_columns(&self, config: &SourceConfig, table: &str) -> Result<TableInfo, ServiceError> {
        let db = self.pool(config).await?;
        let backend = db.get_database_backend();
        let rows = db
            .query_all(Statement::from_sql_and_values(backend, introspect::table_columns(backend), [Value::from(table)]))
            .await
            .map_err(source_err)?;
        let mut info = TableInfo { table_name: table.to_string(), primary_keys: Vec::new(), columns: Vec::new() };
        for r in rows {
            let name: String = r.try_get("", "name").map_err(source_err)?;
            let column_type: String = r.try_get("", "type_name").map_err(source_err)?;
            let key: Option<String> = r.try_get("", "col_key").map_err(source_err)?;
            if key.as_deref() == Some("PRI") {
                info.primary_keys.push(name.clone());
            }
            info.columns.push(QueryColumn { name, column_type });
        }
        Ok(info)
    }

    async fn execute(&self, config: &SourceConfig, sql: &str) -> Result<(), ServiceError> {
        let db = self.pool(config).await?;
        debug!(%sql, "execute on data source");
        db.execute(Statement::from_string(db.get_database_backend(), sql.to_string()))
            .await
            .map_err(source_err)?;
        Ok(())
    }

    async fn insert_batch(&self, config: &SourceConfig, stmt: InsertStatement) -> Result<u64, ServiceError> {
        let db = self.pool(config).await?;
        let res = db
            .execute(stmt.into_statement(db.get_database_backend()))
            .await
            .map_err(source_err)?;
        Ok(res.rows_affected())
    }

    fn release(&self, config: &SourceConfig) {
        if self.pools.remove(&Self::key(config)).is_some() {
            debug!(url = %config.url, "released data source pool");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // nothing listens on port 1, so any real dial fails fast
    fn refused(password: &str) -> SourceConfig {
        SourceConfig {
            url: "jdbc:mysql://127.0.0.1:1/bi".into(),
            username: "bi".into(),
            password: password.into(),
            properties: None,
        }
    }

    fn client() -> SeaOrmSourceClient {
        SeaOrmSourceClient::new(&configs::SourceConfig { connect_timeout_secs: 1, max_connections: 2 })
    }

    #[tokio::test]
    async fn cached_pool_is_not_shared_across_passwords() {
        let client = client();
        client
            .pools
            .insert(SeaOrmSourceClient::key(&refused("right")), DatabaseConnection::Disconnected);

        assert!(client.pool(&refused("right")).await.is_ok());
        let wrong = client.pool(&refused("WRONG")).await;
        assert!(matches!(wrong, Err(ServiceError::Source(_))));
        assert_eq!(client.pools.len(), 1);
    }

    #[tokio::test]
    async fn test_connection_dials_fresh_and_caches_nothing() {
        let client = client();
        client
            .pools
            .insert(SeaOrmSourceClient::key(&refused("right")), DatabaseConnection::Disconnected);

        let res = client.test_connection(&refused("right")).await;
        assert!(matches!(res, Err(ServiceError::Source(_))));
        assert!(client.test_connection(&refused("other")).await.is_err());
        assert_eq!(client.pools.len(), 1);
    }

    #[test]
    fn release_drops_only_the_matching_credentials() {
        let client = client();
        client.pools.insert(SeaOrmSourceClient::key(&refused("a")), DatabaseConnection::Disconnected);
        client.pools.insert(SeaOrmSourceClient::key(&refused("b")), DatabaseConnection::Disconnected);
        client.release(&refused("a"));
        assert_eq!(client.pools.len(), 1);
        assert!(client.pools.contains_key(&SeaOrmSourceClient::key(&refused("b"))));
    }
}

/// Recording client for tests: tracks tables, executed DDL and inserted rows.
pub mod mock {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockSourceClient {
        tables: Mutex<HashSet<String>>,
        executed: Mutex<Vec<String>>,
        inserted: Mutex<HashMap<String, u64>>,
        unreachable: bool,
        fail_after: Option<usize>,
        insert_calls: AtomicUsize,
    }

    /// Table name inside the first pair of backticks.
    fn table_of(sql: &str) -> Option<String> {
        let start = sql.find('`')? + 1;
        let len = sql[start..].find('`')?;
        Some(sql[start..start + len].to_string())
    }

    impl MockSourceClient {
        pub fn with_table(self, table: &str) -> Self {
            self.tables.lock().unwrap().insert(table.to_string());
            self
        }

        pub fn unreachable(mut self) -> Self {
            self.unreachable = true;
            self
        }

        /// Inserts fail once `n` batches have succeeded.
        pub fn fail_inserts_after(mut self, n: usize) -> Self {
            self.fail_after = Some(n);
            self
        }

        pub fn executed(&self) -> Vec<String> {
            self.executed.lock().unwrap().clone()
        }

        pub fn inserted_rows(&self, table: &str) -> u64 {
            self.inserted.lock().unwrap().get(table).copied().unwrap_or(0)
        }

        fn check(&self, config: &SourceConfig) -> Result<(), ServiceError> {
            if self.unreachable {
                return Err(ServiceError::Source(format!("cannot connect to {}", config.url)));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl SourceClient for MockSourceClient {
        async fn test_connection(&self, config: &SourceConfig) -> Result<(), ServiceError> {
            self.check(config)
        }

        async fn list_tables(&self, config: &SourceConfig) -> Result<Vec<String>, ServiceError> {
            self.check(config)?;
            let mut tables: Vec<String> = self.tables.lock().unwrap().iter().cloned().collect();
            tables.sort();
            Ok(tables)
        }

        async fn table_exists(&self, config: &SourceConfig, table: &str) -> Result<bool, ServiceError> {
            self.check(config)?;
            Ok(self.tables.lock().unwrap().contains(table))
        }

        async fn table_columns(&self, config: &SourceConfig, table: &str) -> Result<TableInfo, ServiceError> {
            self.check(config)?;
            let exists = self.tables.lock().unwrap().contains(table);
            let columns = if exists {
                vec![QueryColumn { name: "id".into(), column_type: "bigint".into() }]
            } else {
                Vec::new()
            };
            let primary_keys = if exists { vec!["id".to_string()] } else { Vec::new() };
            Ok(TableInfo { table_name: table.to_string(), primary_keys, columns })
        }

        async fn execute(&self, config: &SourceConfig, sql: &str) -> Result<(), ServiceError> {
            self.check(config)?;
            self.executed.lock().unwrap().push(sql.to_string());
            if let Some(table) = table_of(sql) {
                let mut tables = self.tables.lock().unwrap();
                if sql.starts_with("CREATE TABLE") {
                    tables.insert(table);
                } else if sql.starts_with("DROP TABLE") {
                    tables.remove(&table);
                }
            }
            Ok(())
        }

        async fn insert_batch(&self, config: &SourceConfig, stmt: InsertStatement) -> Result<u64, ServiceError> {
            self.check(config)?;
            let call = self.insert_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_after.is_some_and(|n| call >= n) {
                return Err(ServiceError::Source("Duplicate entry for key PRIMARY".into()));
            }
            let table = table_of(&stmt.sql).unwrap_or_default();
            *self.inserted.lock().unwrap().entry(table).or_default() += stmt.rows as u64;
            Ok(stmt.rows as u64)
        }
    }
}
