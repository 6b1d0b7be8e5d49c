use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// Connection settings stored as JSON in `source.config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<SourceProperty>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceProperty {
    pub key: String,
    pub value: String,
}

impl SourceConfig {
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        serde_json::from_str(raw).map_err(|e| ServiceError::Source(format!("invalid source config: {e}")))
    }

    pub fn to_json(&self) -> Result<String, ServiceError> {
        serde_json::to_string(self).map_err(|e| ServiceError::Validation(e.to_string()))
    }

    /// Copy safe to log.
    pub fn redacted(&self) -> Self {
        Self { password: "******".into(), ..self.clone() }
    }
}

impl From<SourceTest> for SourceConfig {
    fn from(t: SourceTest) -> Self {
        Self { url: t.url, username: t.username, password: t.password, properties: None }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceCreate {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub source_type: String,
    pub project_id: i64,
    pub config: SourceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceInfo {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub source_type: String,
    pub config: SourceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceTest {
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Fields written for a new source row.
#[derive(Debug, Clone)]
pub struct NewSource {
    pub name: String,
    pub description: Option<String>,
    pub source_type: String,
    pub project_id: i64,
    pub config: String,
    pub create_by: i64,
}

/// How an upload treats the target table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum UploadMode {
    New = 0,
    Replace = 1,
    Append = 2,
}

impl TryFrom<i16> for UploadMode {
    type Error = String;

    fn try_from(v: i16) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(UploadMode::New),
            1 => Ok(UploadMode::Replace),
            2 => Ok(UploadMode::Append),
            other => Err(format!("unknown upload mode {other}")),
        }
    }
}

impl From<UploadMode> for i16 {
    fn from(m: UploadMode) -> Self { m as i16 }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadMeta {
    pub table_name: String,
    #[serde(default)]
    pub primary_keys: Option<String>,
    #[serde(default)]
    pub index_keys: Option<String>,
    pub mode: UploadMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Csv,
    Xlsx,
    Xls,
}

impl FromStr for FileType {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(FileType::Csv),
            "xlsx" => Ok(FileType::Xlsx),
            "xls" => Ok(FileType::Xls),
            _ => Err(ServiceError::Validation("Unsupported file format".into())),
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileType::Csv => "csv",
            FileType::Xlsx => "xlsx",
            FileType::Xls => "xls",
        })
    }
}

impl FileType {
    pub fn is_excel(self) -> bool { matches!(self, FileType::Xlsx | FileType::Xls) }

    /// The uploaded file name must carry an extension of the declared kind.
    pub fn check_file_name(self, name: &str) -> Result<(), ServiceError> {
        let lower = name.to_ascii_lowercase();
        if self.is_excel() {
            if !(lower.ends_with(".xlsx") || lower.ends_with(".xls")) {
                return Err(ServiceError::Validation("Please upload excel file".into()));
            }
        } else if !lower.ends_with(".csv") {
            return Err(ServiceError::Validation("Please upload csv file".into()));
        }
        Ok(())
    }
}

/// An uploaded file held in memory.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub table_name: String,
    pub primary_keys: Vec<String>,
    pub columns: Vec<QueryColumn>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    pub table_name: String,
    pub rows: u64,
    pub batches: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_mode_from_integer() {
        let meta: UploadMeta = serde_json::from_str(r#"{"table_name":"t","mode":2}"#).unwrap();
        assert_eq!(meta.mode, UploadMode::Append);
        assert!(serde_json::from_str::<UploadMeta>(r#"{"table_name":"t","mode":7}"#).is_err());
    }

    #[test]
    fn file_type_and_extension() {
        assert_eq!("XLSX".parse::<FileType>().unwrap(), FileType::Xlsx);
        assert!("pdf".parse::<FileType>().is_err());
        assert!(FileType::Csv.check_file_name("a.CSV").is_ok());
        assert!(matches!(FileType::Csv.check_file_name("a.xlsx"), Err(ServiceError::Validation(m)) if m == "Please upload csv file"));
        assert!(matches!(FileType::Xls.check_file_name("a.csv"), Err(ServiceError::Validation(m)) if m == "Please upload excel file"));
    }

    #[test]
    fn config_redaction_and_json() {
        let cfg = SourceConfig { url: "jdbc:mysql://h/db".into(), username: "u".into(), password: "p".into(), properties: None };
        assert_eq!(cfg.redacted().password, "******");
        let back = SourceConfig::parse(&cfg.to_json().unwrap()).unwrap();
        assert_eq!(back, cfg);
        assert!(SourceConfig::parse("not json").is_err());
    }
}
