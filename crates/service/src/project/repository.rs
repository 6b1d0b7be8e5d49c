use async_trait::async_trait;

use crate::errors::ServiceError;

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn find_project(&self, id: i64) -> Result<Option<models::project::Model>, ServiceError>;
    /// `role_type` of the user's membership row.
    async fn find_membership(&self, project_id: i64, user_id: i64) -> Result<Option<i16>, ServiceError>;
    /// Permission rows of every role the user holds on the project.
    async fn find_role_grants(&self, project_id: i64, user_id: i64) -> Result<Vec<models::rel_role_project::Model>, ServiceError>;
    async fn exists_for_owner(&self, owner_id: i64, name: &str) -> Result<bool, ServiceError>;
    async fn create_project(&self, owner_id: i64, name: &str, description: Option<&str>, visibility: bool) -> Result<models::project::Model, ServiceError>;
}

/// In-memory repository for service and router tests.
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Inner {
        projects: Vec<models::project::Model>,
        members: Vec<(i64, i64, i16)>, // (project, user, role_type)
        grants: Vec<(i64, models::rel_role_project::Model)>, // (user, grant)
    }

    #[derive(Default)]
    pub struct MockProjectRepository {
        inner: Mutex<Inner>,
    }

    impl MockProjectRepository {
        pub fn with_project(self, id: i64, owner_id: i64, public: bool) -> Self {
            self.inner.lock().unwrap().projects.push(models::project::Model {
                id,
                name: format!("project-{id}"),
                description: None,
                user_id: owner_id,
                visibility: public,
                created_at: chrono::Utc::now(),
            });
            self
        }

        pub fn with_member(self, project_id: i64, user_id: i64, role_type: i16) -> Self {
            self.inner.lock().unwrap().members.push((project_id, user_id, role_type));
            self
        }

        /// Grant `user_id` a role on the project with the given levels.
        pub fn with_grant(self, project_id: i64, user_id: i64, role_id: i64, source: i16, viz: i16) -> Self {
            let mut inner = self.inner.lock().unwrap();
            let id = inner.grants.len() as i64 + 1;
            inner.grants.push((
                user_id,
                models::rel_role_project::Model {
                    id,
                    role_id,
                    project_id,
                    source_permission: source,
                    view_permission: 0,
                    widget_permission: 0,
                    viz_permission: viz,
                    schedule_permission: 0,
                    share_permission: false,
                    download_permission: false,
                },
            ));
            drop(inner);
            self
        }
    }

    #[async_trait]
    impl ProjectRepository for MockProjectRepository {
        async fn find_project(&self, id: i64) -> Result<Option<models::project::Model>, ServiceError> {
            Ok(self.inner.lock().unwrap().projects.iter().find(|p| p.id == id).cloned())
        }

        async fn find_membership(&self, project_id: i64, user_id: i64) -> Result<Option<i16>, ServiceError> {
            let inner = self.inner.lock().unwrap();
            Ok(inner.members.iter().find(|(p, u, _)| *p == project_id && *u == user_id).map(|(_, _, r)| *r))
        }

        async fn find_role_grants(&self, project_id: i64, user_id: i64) -> Result<Vec<models::rel_role_project::Model>, ServiceError> {
            let inner = self.inner.lock().unwrap();
            Ok(inner
                .grants
                .iter()
                .filter(|(u, g)| *u == user_id && g.project_id == project_id)
                .map(|(_, g)| g.clone())
                .collect())
        }

        async fn exists_for_owner(&self, owner_id: i64, name: &str) -> Result<bool, ServiceError> {
            Ok(self.inner.lock().unwrap().projects.iter().any(|p| p.user_id == owner_id && p.name == name))
        }

        async fn create_project(&self, owner_id: i64, name: &str, description: Option<&str>, visibility: bool) -> Result<models::project::Model, ServiceError> {
            let mut inner = self.inner.lock().unwrap();
            let id = inner.projects.iter().map(|p| p.id).max().unwrap_or(0) + 1;
            let p = models::project::Model {
                id,
                name: name.to_string(),
                description: description.map(str::to_string),
                user_id: owner_id,
                visibility,
                created_at: chrono::Utc::now(),
            };
            inner.projects.push(p.clone());
            Ok(p)
        }
    }
}
