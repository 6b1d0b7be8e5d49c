use std::sync::Arc;

use tracing::{info, instrument};

use common::{metrics, utils::logging::BUSINESS_TARGET};

use crate::auth::domain::AuthUser;
use crate::errors::ServiceError;
use super::domain::{ProjectCreate, ProjectDetail, ProjectPermission, UserPermission};
use super::repository::ProjectRepository;

/// Resolves a caller's access to a project. Shared by the portal and source services.
pub struct ProjectService {
    repo: Arc<dyn ProjectRepository>,
}

impl ProjectService {
    pub fn new(repo: Arc<dyn ProjectRepository>) -> Self { Self { repo } }

    /// Load the project and check the caller may see it (`modify` = may change it).
    pub async fn get_project_detail(&self, project_id: i64, user: &AuthUser, modify: bool) -> Result<ProjectDetail, ServiceError> {
        let project = self
            .repo
            .find_project(project_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("project is not found".into()))?;
        let membership = self.repo.find_membership(project_id, user.id).await?;
        let detail = ProjectDetail { project, membership };

        let insider = detail.is_owner(user.id) || detail.is_member();
        if !insider && (modify || !detail.project.visibility) {
            return Err(ServiceError::Unauthorized("you have not permission to access this project".into()));
        }
        if modify && !detail.is_maintainer(user.id) {
            return Err(ServiceError::Unauthorized("you have not permission to modify this project".into()));
        }
        Ok(detail)
    }

    pub fn is_maintainer(&self, detail: &ProjectDetail, user: &AuthUser) -> bool {
        detail.is_maintainer(user.id)
    }

    pub async fn get_project_permission(&self, detail: &ProjectDetail, user: &AuthUser) -> Result<ProjectPermission, ServiceError> {
        if detail.is_maintainer(user.id) {
            return Ok(ProjectPermission::maintainer());
        }
        let mut permission = ProjectPermission::default();
        for grant in self.repo.find_role_grants(detail.project.id, user.id).await? {
            permission.merge(&grant);
        }
        Ok(permission)
    }

    /// Viz permission of the caller, `None` when the project is out of reach.
    async fn viz_permission(&self, project_id: i64, user: &AuthUser) -> Result<Option<UserPermission>, ServiceError> {
        let detail = match self.get_project_detail(project_id, user, false).await {
            Ok(d) => d,
            Err(ServiceError::Unauthorized(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(Some(self.get_project_permission(&detail, user).await?.viz_permission))
    }

    pub async fn allow_write(&self, project_id: i64, user: &AuthUser) -> Result<bool, ServiceError> {
        Ok(self.viz_permission(project_id, user).await?.is_some_and(|p| p >= UserPermission::Write))
    }

    pub async fn allow_delete(&self, project_id: i64, user: &AuthUser) -> Result<bool, ServiceError> {
        Ok(self.viz_permission(project_id, user).await?.is_some_and(|p| p >= UserPermission::Delete))
    }

    #[instrument(skip(self, create), fields(user_id = user.id))]
    pub async fn create_project(&self, create: ProjectCreate, user: &AuthUser) -> Result<models::project::Model, ServiceError> {
        models::errors::validate_name(&create.name, 255)?;
        if self.repo.exists_for_owner(user.id, &create.name).await? {
            return Err(ServiceError::Conflict("the project name is already taken".into()));
        }
        let project = self
            .repo
            .create_project(user.id, &create.name, create.description.as_deref(), create.visibility)
            .await?;
        metrics::record_operation("project", "create");
        info!(target: BUSINESS_TARGET, project_id = project.id, user_id = user.id, "project ({}) is created", project.name);
        Ok(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::repository::mock::MockProjectRepository;
    use models::rel_user_project::{ROLE_MAINTAINER, ROLE_MEMBER};

    fn user(id: i64) -> AuthUser {
        AuthUser { id, username: format!("u{id}"), email: format!("u{id}@x.io") }
    }

    fn service(repo: MockProjectRepository) -> ProjectService {
        ProjectService::new(Arc::new(repo))
    }

    #[tokio::test]
    async fn missing_project_is_not_found() {
        let svc = service(MockProjectRepository::default());
        let err = svc.get_project_detail(1, &user(1), false).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(m) if m == "project is not found"));
    }

    #[tokio::test]
    async fn public_project_readable_but_not_modifiable_by_outsider() {
        let svc = service(MockProjectRepository::default().with_project(1, 10, true));
        assert!(svc.get_project_detail(1, &user(2), false).await.is_ok());
        assert!(matches!(svc.get_project_detail(1, &user(2), true).await, Err(ServiceError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn private_project_hidden_from_outsider() {
        let svc = service(MockProjectRepository::default().with_project(1, 10, false));
        assert!(matches!(svc.get_project_detail(1, &user(2), false).await, Err(ServiceError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn member_needs_maintainer_role_to_modify() {
        let repo = MockProjectRepository::default()
            .with_project(1, 10, false)
            .with_member(1, 2, ROLE_MEMBER)
            .with_member(1, 3, ROLE_MAINTAINER);
        let svc = service(repo);
        assert!(svc.get_project_detail(1, &user(2), false).await.is_ok());
        assert!(svc.get_project_detail(1, &user(2), true).await.is_err());
        let d = svc.get_project_detail(1, &user(3), true).await.unwrap();
        assert!(svc.is_maintainer(&d, &user(3)));
    }

    #[tokio::test]
    async fn permission_is_max_over_roles() {
        let repo = MockProjectRepository::default()
            .with_project(1, 10, false)
            .with_member(1, 2, ROLE_MEMBER)
            .with_grant(1, 2, 100, 1, 0)
            .with_grant(1, 2, 101, 0, 2);
        let svc = service(repo);
        let d = svc.get_project_detail(1, &user(2), false).await.unwrap();
        let p = svc.get_project_permission(&d, &user(2)).await.unwrap();
        assert_eq!(p.source_permission, UserPermission::Read);
        assert_eq!(p.viz_permission, UserPermission::Write);
        assert!(svc.allow_write(1, &user(2)).await.unwrap());
        assert!(!svc.allow_delete(1, &user(2)).await.unwrap());
    }

    #[tokio::test]
    async fn owner_gets_everything() {
        let svc = service(MockProjectRepository::default().with_project(1, 10, false));
        let d = svc.get_project_detail(1, &user(10), true).await.unwrap();
        assert_eq!(svc.get_project_permission(&d, &user(10)).await.unwrap(), ProjectPermission::maintainer());
        assert!(svc.allow_delete(1, &user(10)).await.unwrap());
    }

    #[tokio::test]
    async fn create_project_rejects_duplicate_name() {
        let svc = service(MockProjectRepository::default());
        let create = || ProjectCreate { name: "bi".into(), description: None, visibility: false };
        let p = svc.create_project(create(), &user(1)).await.unwrap();
        assert_eq!(p.user_id, 1);
        assert!(matches!(svc.create_project(create(), &user(1)).await, Err(ServiceError::Conflict(_))));
    }
}
