use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use common::{metrics, utils::logging::BUSINESS_TARGET};
use models::dashboard_portal;

use crate::auth::domain::AuthUser;
use crate::errors::ServiceError;
use crate::project::{ProjectService, UserPermission};
use super::domain::{DashboardPortalCreate, DashboardPortalUpdate, NewPortal};
use super::repository::PortalRepository;

pub struct DashboardPortalService {
    repo: Arc<dyn PortalRepository>,
    projects: Arc<ProjectService>,
}

impl DashboardPortalService {
    pub fn new(repo: Arc<dyn PortalRepository>, projects: Arc<ProjectService>) -> Self { Self { repo, projects } }

    /// With `id`, true only when a different portal already holds `name`.
    pub async fn is_exist(&self, name: &str, id: Option<i64>, project_id: i64) -> Result<bool, ServiceError> {
        let found = self.repo.find_id_by_name(project_id, name).await?;
        Ok(match (id, found) {
            (Some(id), Some(existing)) => id != existing,
            (_, found) => found.is_some_and(|existing| existing > 0),
        })
    }

    /// `None` when the caller may not see the project's portals.
    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn get_dashboard_portals(&self, project_id: i64, user: &AuthUser) -> Result<Option<Vec<dashboard_portal::Model>>, ServiceError> {
        let detail = match self.projects.get_project_detail(project_id, user, false).await {
            Ok(d) => d,
            Err(ServiceError::Unauthorized(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        let permission = self.projects.get_project_permission(&detail, user).await?;
        if permission.viz_permission < UserPermission::Read {
            return Ok(None);
        }
        Ok(Some(self.repo.list_visible(project_id, user.id).await?))
    }

    #[instrument(skip(self, create, user), fields(user_id = user.id, project_id = create.project_id))]
    pub async fn create_dashboard_portal(&self, create: DashboardPortalCreate, user: &AuthUser) -> Result<dashboard_portal::Model, ServiceError> {
        models::errors::validate_name(&create.name, 255)?;
        let detail = self.projects.get_project_detail(create.project_id, user, false).await?;
        let permission = self.projects.get_project_permission(&detail, user).await?;
        if permission.viz_permission < UserPermission::Write {
            info!(username = %user.username, "user has no permission to create portal");
            return Err(ServiceError::Unauthorized("you have not permission to create portal".into()));
        }

        if self.is_exist(&create.name, None, create.project_id).await? {
            info!(name = %create.name, "the dashboardPortal name is already taken");
            return Err(ServiceError::Conflict("the dashboard portal name is already taken".into()));
        }

        let role_ids = self.repo.existing_role_ids(&create.role_ids).await?;
        let portal = self
            .repo
            .create_with_roles(
                NewPortal {
                    name: create.name,
                    description: create.description,
                    project_id: create.project_id,
                    avatar: create.avatar,
                    publish: create.publish,
                    create_by: user.id,
                },
                &role_ids,
            )
            .await?;

        metrics::record_operation("portal", "create");
        info!(target: BUSINESS_TARGET, portal_id = portal.id, user_id = user.id, "portal ({:?}) is created", portal);
        if !role_ids.is_empty() {
            info!(target: BUSINESS_TARGET, portal_id = portal.id, "portal limit role ({:?}) access", role_ids);
        }
        Ok(portal)
    }

    #[instrument(skip(self, update, user), fields(user_id = user.id, portal_id = update.id))]
    pub async fn update_dashboard_portal(&self, update: DashboardPortalUpdate, user: &AuthUser) -> Result<dashboard_portal::Model, ServiceError> {
        models::errors::validate_name(&update.name, 255)?;
        let found = self
            .repo
            .find_with_project(update.id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("dashboardPortal not found".into()))?;
        let project = found.project.ok_or_else(|| ServiceError::NotFound("project not found".into()))?;

        if !self.projects.allow_write(project.id, user).await? {
            info!(username = %user.username, "user has no permission to update portal");
            return Err(ServiceError::Unauthorized("you have not permission to update the dashboardPortal".into()));
        }

        if self.is_exist(&update.name, Some(update.id), project.id).await? {
            info!(name = %update.name, "the dashboardPortal name is already taken");
            return Err(ServiceError::Conflict("the dashboardPortal name is already taken".into()));
        }

        let before = found.portal;
        let portal = dashboard_portal::Model {
            name: update.name,
            description: update.description,
            avatar: update.avatar,
            publish: update.publish,
            project_id: project.id,
            update_by: Some(user.id),
            update_time: Some(Utc::now()),
            ..before.clone()
        };
        let updated = self.repo.update_with_exclusions(portal, update.team_ids, user.id).await?;

        metrics::record_operation("portal", "update");
        info!(target: BUSINESS_TARGET, portal_id = updated.id, user_id = user.id, "portal ({:?}) is updated, origin: ({:?})", updated, before);
        Ok(updated)
    }

    pub async fn get_exclude_teams(&self, portal_id: i64) -> Result<Vec<i64>, ServiceError> {
        self.repo.exclude_team_ids(portal_id).await
    }

    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn delete_dashboard_portal(&self, id: i64, user: &AuthUser) -> Result<bool, ServiceError> {
        let found = self
            .repo
            .find_with_project(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("dashboardPortal not found".into()))?;

        if !self.projects.allow_delete(found.portal.project_id, user).await? {
            info!(username = %user.username, portal_id = id, "user has no permission to delete portal");
            return Err(ServiceError::Unauthorized("you have not permission to delete the dashboardPortal".into()));
        }

        let deleted = self.repo.delete_cascade(id).await?;
        if deleted {
            metrics::record_operation("portal", "delete");
            info!(target: BUSINESS_TARGET, portal_id = id, user_id = user.id, "portal ({:?}) is deleted", found.portal);
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::repository::mock::MockPortalRepository;
    use crate::project::repository::mock::MockProjectRepository;
    use models::rel_user_project::ROLE_MEMBER;

    const OWNER: i64 = 1;
    const READER: i64 = 2;
    const WRITER: i64 = 3;
    const OUTSIDER: i64 = 4;

    fn user(id: i64) -> AuthUser {
        AuthUser { id, username: format!("u{id}"), email: format!("u{id}@x.io") }
    }

    fn setup() -> (DashboardPortalService, Arc<MockPortalRepository>) {
        let projects = MockProjectRepository::default()
            .with_project(1, OWNER, false)
            .with_member(1, READER, ROLE_MEMBER)
            .with_member(1, WRITER, ROLE_MEMBER)
            .with_grant(1, WRITER, 20, 0, 2);
        let portals = Arc::new(
            MockPortalRepository::default()
                .with_project(1, OWNER)
                .with_role(10, Some(READER))
                .with_role(11, None)
                // the first portal created in a test gets id 1
                .with_dashboard(1, 1),
        );
        let svc = DashboardPortalService::new(portals.clone(), Arc::new(ProjectService::new(Arc::new(projects))));
        (svc, portals)
    }

    fn create(name: &str) -> DashboardPortalCreate {
        DashboardPortalCreate { name: name.into(), description: None, project_id: 1, avatar: None, publish: true, role_ids: vec![] }
    }

    fn update(id: i64, name: &str, teams: Option<Vec<i64>>) -> DashboardPortalUpdate {
        DashboardPortalUpdate { id, name: name.into(), description: Some("d".into()), avatar: None, publish: false, team_ids: teams }
    }

    #[tokio::test]
    async fn create_requires_viz_write() {
        let (svc, _) = setup();
        let err = svc.create_dashboard_portal(create("p"), &user(READER)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(m) if m == "you have not permission to create portal"));
        let p = svc.create_dashboard_portal(create("p"), &user(WRITER)).await.unwrap();
        assert_eq!(p.create_by, WRITER);
    }

    #[tokio::test]
    async fn create_rejects_taken_name() {
        let (svc, _) = setup();
        svc.create_dashboard_portal(create("sales"), &user(OWNER)).await.unwrap();
        let err = svc.create_dashboard_portal(create("sales"), &user(OWNER)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(m) if m == "the dashboard portal name is already taken"));
    }

    #[tokio::test]
    async fn create_missing_project_propagates_not_found() {
        let (svc, _) = setup();
        let mut c = create("x");
        c.project_id = 99;
        assert!(matches!(svc.create_dashboard_portal(c, &user(OWNER)).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn create_with_roles_keeps_only_existing_roles_and_hides_portal() {
        let (svc, repo) = setup();
        let mut c = create("limited");
        c.role_ids = vec![10, 11, 999];
        let p = svc.create_dashboard_portal(c, &user(OWNER)).await.unwrap();
        assert_eq!(repo.role_rows_of(p.id), vec![(10, false), (11, false)]);

        // READER holds role 10, so the portal is filtered out for them
        let listed = svc.get_dashboard_portals(1, &user(READER)).await.unwrap().unwrap();
        assert!(listed.iter().all(|x| x.id != p.id));
        let listed = svc.get_dashboard_portals(1, &user(OWNER)).await.unwrap().unwrap();
        assert!(listed.iter().any(|x| x.id == p.id));
    }

    #[tokio::test]
    async fn listing_for_outsider_is_none() {
        let (svc, _) = setup();
        assert!(svc.get_dashboard_portals(1, &user(OUTSIDER)).await.unwrap().is_none());
        assert!(matches!(svc.get_dashboard_portals(42, &user(OWNER)).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn is_exist_ignores_own_id() {
        let (svc, _) = setup();
        let p = svc.create_dashboard_portal(create("a"), &user(OWNER)).await.unwrap();
        assert!(svc.is_exist("a", None, 1).await.unwrap());
        assert!(!svc.is_exist("a", Some(p.id), 1).await.unwrap());
        assert!(svc.is_exist("a", Some(p.id + 1), 1).await.unwrap());
        assert!(!svc.is_exist("b", None, 1).await.unwrap());
    }

    #[tokio::test]
    async fn update_stamps_and_reconciles_teams() {
        let (svc, _) = setup();
        let p = svc.create_dashboard_portal(create("a"), &user(OWNER)).await.unwrap();

        let u = svc.update_dashboard_portal(update(p.id, "a2", Some(vec![5, 6, 6])), &user(WRITER)).await.unwrap();
        assert_eq!(u.name, "a2");
        assert_eq!(u.update_by, Some(WRITER));
        assert!(u.update_time.is_some());
        assert_eq!(u.create_by, OWNER);
        assert_eq!(svc.get_exclude_teams(p.id).await.unwrap(), vec![5, 6]);

        svc.update_dashboard_portal(update(p.id, "a2", Some(vec![6, 7])), &user(WRITER)).await.unwrap();
        let mut teams = svc.get_exclude_teams(p.id).await.unwrap();
        teams.sort();
        assert_eq!(teams, vec![6, 7]);

        svc.update_dashboard_portal(update(p.id, "a2", None), &user(WRITER)).await.unwrap();
        assert!(svc.get_exclude_teams(p.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_errors() {
        let (svc, _) = setup();
        let a = svc.create_dashboard_portal(create("a"), &user(OWNER)).await.unwrap();
        svc.create_dashboard_portal(create("b"), &user(OWNER)).await.unwrap();

        let err = svc.update_dashboard_portal(update(999, "x", None), &user(OWNER)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(m) if m == "dashboardPortal not found"));
        let err = svc.update_dashboard_portal(update(a.id, "x", None), &user(READER)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
        let err = svc.update_dashboard_portal(update(a.id, "b", None), &user(OWNER)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn delete_requires_viz_delete_and_cascades() {
        let (svc, repo) = setup();
        let p = svc.create_dashboard_portal(create("gone"), &user(OWNER)).await.unwrap();
        assert_eq!(repo.dashboards_of(p.id), 1);
        svc.update_dashboard_portal(update(p.id, "gone", Some(vec![3])), &user(OWNER)).await.unwrap();

        let err = svc.delete_dashboard_portal(p.id, &user(WRITER)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        assert!(svc.delete_dashboard_portal(p.id, &user(OWNER)).await.unwrap());
        assert_eq!(repo.dashboards_of(p.id), 0);
        assert!(svc.get_exclude_teams(p.id).await.unwrap().is_empty());

        let err = svc.delete_dashboard_portal(p.id, &user(OWNER)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(m) if m == "dashboardPortal not found"));
    }
}
