//! Database dialect detection and JDBC-to-native URL conversion.

use std::fmt;

use url::Url;

use crate::errors::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Mysql,
    Mariadb,
    Postgresql,
    Oracle,
    Sqlserver,
    H2,
    Phoenix,
    Mongodb,
    Elasticsearch,
    Presto,
    Moonbox,
    Cassandra,
    Clickhouse,
    Kylin,
    Vertica,
    Hana,
    Impala,
}

impl DataType {
    /// Detect the dialect from a JDBC (`jdbc:mysql://`) or native (`mysql://`) URL.
    pub fn from_url(url: &str) -> Option<Self> {
        let trimmed = url.trim();
        let rest = trimmed.strip_prefix("jdbc:").unwrap_or(trimmed);
        let scheme = rest.split(':').next()?.to_ascii_lowercase();
        let dt = match scheme.as_str() {
            "mysql" => DataType::Mysql,
            "mariadb" => DataType::Mariadb,
            "postgresql" | "postgres" => DataType::Postgresql,
            "oracle" => DataType::Oracle,
            "sqlserver" => DataType::Sqlserver,
            "h2" => DataType::H2,
            "phoenix" => DataType::Phoenix,
            "mongodb" | "mongo" => DataType::Mongodb,
            "elasticsearch" | "es" => DataType::Elasticsearch,
            "presto" => DataType::Presto,
            "moonbox" => DataType::Moonbox,
            "cassandra" => DataType::Cassandra,
            "clickhouse" => DataType::Clickhouse,
            "kylin" => DataType::Kylin,
            "vertica" => DataType::Vertica,
            "sap" | "hana" => DataType::Hana,
            "impala" => DataType::Impala,
            _ => return None,
        };
        Some(dt)
    }

    pub fn name(self) -> &'static str {
        match self {
            DataType::Mysql => "mysql",
            DataType::Mariadb => "mariadb",
            DataType::Postgresql => "postgresql",
            DataType::Oracle => "oracle",
            DataType::Sqlserver => "sqlserver",
            DataType::H2 => "h2",
            DataType::Phoenix => "phoenix",
            DataType::Mongodb => "mongodb",
            DataType::Elasticsearch => "elasticsearch",
            DataType::Presto => "presto",
            DataType::Moonbox => "moonbox",
            DataType::Cassandra => "cassandra",
            DataType::Clickhouse => "clickhouse",
            DataType::Kylin => "kylin",
            DataType::Vertica => "vertica",
            DataType::Hana => "hana",
            DataType::Impala => "impala",
        }
    }

    /// Dialects this service can open a connection to.
    pub fn is_connectable(self) -> bool {
        matches!(self, DataType::Mysql | DataType::Mariadb | DataType::Postgresql)
    }

    fn native_scheme(self) -> Option<&'static str> {
        match self {
            DataType::Mysql | DataType::Mariadb => Some("mysql"),
            DataType::Postgresql => Some("postgres"),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Turn a stored URL plus credentials into a driver URL.
///
/// Credentials are percent-encoded into the authority; JDBC query
/// parameters are dropped.
pub fn native_url(url: &str, username: &str, password: &str) -> Result<String, ServiceError> {
    let unsupported = || ServiceError::Source(format!("Unsupported data source: {url}"));
    let data_type = DataType::from_url(url).ok_or_else(unsupported)?;
    let scheme = data_type.native_scheme().ok_or_else(unsupported)?;

    let trimmed = url.trim();
    let rest = trimmed.strip_prefix("jdbc:").unwrap_or(trimmed);
    let after_scheme = rest
        .split_once("://")
        .map(|(_, tail)| tail)
        .ok_or_else(|| ServiceError::Source(format!("invalid url: {url}")))?;

    let mut parsed = Url::parse(&format!("{scheme}://{after_scheme}"))
        .map_err(|e| ServiceError::Source(format!("invalid url {url}: {e}")))?;
    parsed.set_query(None);
    parsed.set_fragment(None);
    if !username.is_empty() {
        parsed
            .set_username(username)
            .map_err(|_| ServiceError::Source(format!("invalid url: {url}")))?;
    }
    if !password.is_empty() {
        parsed
            .set_password(Some(password))
            .map_err(|_| ServiceError::Source(format!("invalid url: {url}")))?;
    }
    Ok(parsed.to_string())
}
