use thiserror::Error;

use models::errors::ModelError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("conflict: {0}")]
    Conflict(String),
    /// Failure talking to a user data source.
    #[error("data source error: {0}")]
    Source(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("model error: {0}")]
    Model(ModelError),
}

impl ServiceError {
    pub fn not_found(what: &str) -> Self { Self::NotFound(format!("{} not found", what)) }
}

impl From<ModelError> for ServiceError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Conflict(msg) => ServiceError::Conflict(msg),
            ModelError::Validation(msg) => ServiceError::Validation(msg),
            other => ServiceError::Model(other),
        }
    }
}

impl From<sea_orm::DbErr> for ServiceError {
    fn from(e: sea_orm::DbErr) -> Self {
        ServiceError::from(ModelError::from(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_conflict_becomes_service_conflict() {
        let e: ServiceError = ModelError::Conflict("dup".into()).into();
        assert!(matches!(e, ServiceError::Conflict(_)));
        let e: ServiceError = ModelError::Db("down".into()).into();
        assert!(matches!(e, ServiceError::Model(_)));
    }
}
