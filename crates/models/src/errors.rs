use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Db(String),
}

impl From<DbErr> for ModelError {
    fn from(e: DbErr) -> Self {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => ModelError::Conflict(msg),
            _ => ModelError::Db(e.to_string()),
        }
    }
}

/// Shared name rule for portals, sources, projects and roles.
pub fn validate_name(name: &str, max_len: usize) -> Result<(), ModelError> {
    if name.trim().is_empty() {
        return Err(ModelError::Validation("name required".into()));
    }
    if name.chars().count() > max_len {
        return Err(ModelError::Validation(format!("name longer than {max_len} characters")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_rules() {
        assert!(validate_name("sales", 255).is_ok());
        assert!(matches!(validate_name("   ", 255), Err(ModelError::Validation(_))));
        assert!(matches!(validate_name(&"x".repeat(300), 255), Err(ModelError::Validation(_))));
    }

    #[test]
    fn plain_db_error_maps_to_db_variant() {
        let e: ModelError = DbErr::Custom("boom".into()).into();
        assert!(matches!(e, ModelError::Db(_)));
    }
}
