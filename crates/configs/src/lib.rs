use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub source: SourceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_hours: i64,
}

fn default_token_ttl() -> i64 { 12 }

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_secret: String::new(), token_ttl_hours: default_token_ttl() }
    }
}

/// File upload tuning: rows per INSERT and how many INSERTs run at once.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: usize,
}

fn default_batch_size() -> usize { 1000 }
fn default_max_concurrency() -> usize { 8 }
fn default_max_file_bytes() -> usize { 50 * 1024 * 1024 }

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_concurrency: default_max_concurrency(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

/// Pools opened against user-registered data sources.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_source_max_connections")]
    pub max_connections: u32,
}

fn default_source_connect_timeout() -> u64 { 10 }
fn default_source_max_connections() -> u32 { 8 }

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_source_connect_timeout(),
            max_connections: default_source_max_connections(),
        }
    }
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`); a missing file yields defaults
    /// so a deployment can be configured purely through the environment.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_not_found(&e) => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.normalize_from_env();
        self.database.validate()?;
        self.auth.normalize_from_env();
        self.auth.validate()?;
        self.upload.validate()?;
        self.source.validate()?;
        Ok(())
    }
}

fn is_not_found(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("mysql://")
            || lower.starts_with("postgresql://")
            || lower.starts_with("postgres://"))
        {
            return Err(anyhow!("database.url must start with mysql://, postgres:// or postgresql://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn normalize_from_env(&mut self) {
        if self.jwt_secret.trim().is_empty() {
            if let Ok(secret) = std::env::var("JWT_SECRET") {
                self.jwt_secret = secret;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(anyhow!("auth.jwt_secret is empty; set it in config.toml or JWT_SECRET"));
        }
        if self.token_ttl_hours <= 0 {
            return Err(anyhow!("auth.token_ttl_hours must be positive"));
        }
        Ok(())
    }
}

impl UploadConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(anyhow!("upload.batch_size must be >= 1"));
        }
        if self.max_concurrency == 0 {
            return Err(anyhow!("upload.max_concurrency must be >= 1"));
        }
        if self.max_file_bytes == 0 {
            return Err(anyhow!("upload.max_file_bytes must be >= 1"));
        }
        Ok(())
    }
}

impl SourceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout_secs == 0 {
            return Err(anyhow!("source.connect_timeout_secs must be positive"));
        }
        if self.max_connections == 0 {
            return Err(anyhow!("source.max_connections must be >= 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [server]
        host = ""
        port = 9000

        [database]
        url = "mysql://root:pw@localhost:3306/davinci"

        [auth]
        jwt_secret = "s3cret"

        [upload]
        batch_size = 500
    "#;

    #[test]
    fn parses_and_normalizes_sample() {
        let mut cfg = load_from_str(SAMPLE).unwrap();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.worker_threads, Some(4));
        assert_eq!(cfg.database.max_connections, 10);
        assert_eq!(cfg.upload.batch_size, 500);
        assert_eq!(cfg.upload.max_concurrency, 8);
        assert_eq!(cfg.auth.token_ttl_hours, 12);
        assert_eq!(cfg.source.connect_timeout_secs, 10);
    }

    #[test]
    fn rejects_unsupported_database_scheme() {
        let db = DatabaseConfig { url: "sqlite://x.db".into(), min_connections: 1, max_connections: 2, connect_timeout_secs: 1, acquire_timeout_secs: 1, ..Default::default() };
        assert!(db.validate().is_err());
    }

    #[test]
    fn rejects_inverted_pool_bounds() {
        let db = DatabaseConfig { url: "postgres://localhost/x".into(), min_connections: 5, max_connections: 2, connect_timeout_secs: 1, acquire_timeout_secs: 1, ..Default::default() };
        assert!(db.validate().is_err());
    }

    #[test]
    fn rejects_zero_upload_batch() {
        let up = UploadConfig { batch_size: 0, ..Default::default() };
        assert!(up.validate().is_err());
    }

    #[test]
    fn rejects_empty_secret() {
        let auth = AuthConfig { jwt_secret: "  ".into(), token_ttl_hours: 1 };
        assert!(auth.validate().is_err());
    }
}
