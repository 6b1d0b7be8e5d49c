use async_trait::async_trait;

use models::source;

use crate::errors::ServiceError;
use super::domain::NewSource;

#[async_trait]
pub trait SourceRepository: Send + Sync {
    async fn find(&self, id: i64) -> Result<Option<source::Model>, ServiceError>;
    async fn find_id_by_name(&self, project_id: i64, name: &str) -> Result<Option<i64>, ServiceError>;
    async fn list_by_project(&self, project_id: i64) -> Result<Vec<source::Model>, ServiceError>;
    async fn create(&self, source: NewSource) -> Result<source::Model, ServiceError>;
    async fn update(&self, source: source::Model) -> Result<source::Model, ServiceError>;
    /// Whether any view reads from the source.
    async fn has_views(&self, id: i64) -> Result<bool, ServiceError>;
    async fn delete(&self, id: i64) -> Result<bool, ServiceError>;
}

/// In-memory repository for service and router tests.
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockSourceRepository {
        sources: Mutex<Vec<source::Model>>,
        views: Mutex<Vec<i64>>, // source ids with a view
    }

    impl MockSourceRepository {
        pub fn with_view_on(self, source_id: i64) -> Self {
            self.views.lock().unwrap().push(source_id);
            self
        }
    }

    #[async_trait]
    impl SourceRepository for MockSourceRepository {
        async fn find(&self, id: i64) -> Result<Option<source::Model>, ServiceError> {
            Ok(self.sources.lock().unwrap().iter().find(|s| s.id == id).cloned())
        }

        async fn find_id_by_name(&self, project_id: i64, name: &str) -> Result<Option<i64>, ServiceError> {
            let sources = self.sources.lock().unwrap();
            Ok(sources.iter().find(|s| s.project_id == project_id && s.name == name).map(|s| s.id))
        }

        async fn list_by_project(&self, project_id: i64) -> Result<Vec<source::Model>, ServiceError> {
            Ok(self.sources.lock().unwrap().iter().filter(|s| s.project_id == project_id).cloned().collect())
        }

        async fn create(&self, new: NewSource) -> Result<source::Model, ServiceError> {
            let mut sources = self.sources.lock().unwrap();
            if sources.iter().any(|s| s.project_id == new.project_id && s.name == new.name) {
                return Err(ServiceError::Conflict("duplicate source name".into()));
            }
            let id = sources.iter().map(|s| s.id).max().unwrap_or(0) + 1;
            let model = source::Model {
                id,
                name: new.name,
                description: new.description,
                config: new.config,
                source_type: new.source_type,
                project_id: new.project_id,
                create_by: new.create_by,
                create_time: chrono::Utc::now(),
                update_by: None,
                update_time: None,
            };
            sources.push(model.clone());
            Ok(model)
        }

        async fn update(&self, model: source::Model) -> Result<source::Model, ServiceError> {
            let mut sources = self.sources.lock().unwrap();
            let slot = sources
                .iter_mut()
                .find(|s| s.id == model.id)
                .ok_or_else(|| ServiceError::not_found("source"))?;
            *slot = model.clone();
            Ok(model)
        }

        async fn has_views(&self, id: i64) -> Result<bool, ServiceError> {
            Ok(self.views.lock().unwrap().contains(&id))
        }

        async fn delete(&self, id: i64) -> Result<bool, ServiceError> {
            let mut sources = self.sources.lock().unwrap();
            let before = sources.len();
            sources.retain(|s| s.id != id);
            Ok(sources.len() < before)
        }
    }
}
