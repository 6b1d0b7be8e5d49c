use async_trait::async_trait;

use models::dashboard_portal;

use crate::errors::ServiceError;
use super::domain::{NewPortal, PortalWithProject};

#[async_trait]
pub trait PortalRepository: Send + Sync {
    async fn find_id_by_name(&self, project_id: i64, name: &str) -> Result<Option<i64>, ServiceError>;
    async fn find_with_project(&self, id: i64) -> Result<Option<PortalWithProject>, ServiceError>;
    /// Portals of the project minus those hidden from any role the user holds.
    async fn list_visible(&self, project_id: i64, user_id: i64) -> Result<Vec<dashboard_portal::Model>, ServiceError>;
    async fn existing_role_ids(&self, role_ids: &[i64]) -> Result<Vec<i64>, ServiceError>;
    /// Insert the portal and a hidden `rel_role_portal` row per role, atomically.
    async fn create_with_roles(&self, portal: NewPortal, role_ids: &[i64]) -> Result<dashboard_portal::Model, ServiceError>;
    /// Write the portal, then reconcile its team exclusions, atomically.
    async fn update_with_exclusions(
        &self,
        portal: dashboard_portal::Model,
        team_ids: Option<Vec<i64>>,
        user_id: i64,
    ) -> Result<dashboard_portal::Model, ServiceError>;
    async fn exclude_team_ids(&self, portal_id: i64) -> Result<Vec<i64>, ServiceError>;
    /// Delete dashboards, the portal and its child rows. False when the portal row was already gone.
    async fn delete_cascade(&self, portal_id: i64) -> Result<bool, ServiceError>;
}

/// In-memory repository for service and router tests.
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    use crate::portal::domain::plan_team_exclusions;

    #[derive(Default)]
    struct Inner {
        projects: Vec<models::project::Model>,
        portals: Vec<dashboard_portal::Model>,
        dashboards: Vec<(i64, i64)>, // (dashboard, portal)
        roles: Vec<i64>,
        user_roles: Vec<(i64, i64)>, // (user, role)
        role_portals: Vec<(i64, i64, bool)>, // (role, portal, visible)
        exclusions: Vec<(i64, i64)>, // (portal, team)
    }

    #[derive(Default)]
    pub struct MockPortalRepository {
        inner: Mutex<Inner>,
    }

    impl MockPortalRepository {
        pub fn with_project(self, id: i64, owner_id: i64) -> Self {
            self.inner.lock().unwrap().projects.push(models::project::Model {
                id,
                name: format!("project-{id}"),
                description: None,
                user_id: owner_id,
                visibility: false,
                created_at: chrono::Utc::now(),
            });
            self
        }

        pub fn with_role(self, role_id: i64, user_id: Option<i64>) -> Self {
            let mut inner = self.inner.lock().unwrap();
            inner.roles.push(role_id);
            if let Some(u) = user_id {
                inner.user_roles.push((u, role_id));
            }
            drop(inner);
            self
        }

        pub fn with_dashboard(self, dashboard_id: i64, portal_id: i64) -> Self {
            self.inner.lock().unwrap().dashboards.push((dashboard_id, portal_id));
            self
        }

        pub fn dashboards_of(&self, portal_id: i64) -> usize {
            self.inner.lock().unwrap().dashboards.iter().filter(|(_, p)| *p == portal_id).count()
        }

        pub fn role_rows_of(&self, portal_id: i64) -> Vec<(i64, bool)> {
            let inner = self.inner.lock().unwrap();
            inner.role_portals.iter().filter(|(_, p, _)| *p == portal_id).map(|(r, _, v)| (*r, *v)).collect()
        }
    }

    #[async_trait]
    impl PortalRepository for MockPortalRepository {
        async fn find_id_by_name(&self, project_id: i64, name: &str) -> Result<Option<i64>, ServiceError> {
            let inner = self.inner.lock().unwrap();
            Ok(inner.portals.iter().find(|p| p.project_id == project_id && p.name == name).map(|p| p.id))
        }

        async fn find_with_project(&self, id: i64) -> Result<Option<PortalWithProject>, ServiceError> {
            let inner = self.inner.lock().unwrap();
            Ok(inner.portals.iter().find(|p| p.id == id).map(|p| PortalWithProject {
                portal: p.clone(),
                project: inner.projects.iter().find(|pr| pr.id == p.project_id).cloned(),
            }))
        }

        async fn list_visible(&self, project_id: i64, user_id: i64) -> Result<Vec<dashboard_portal::Model>, ServiceError> {
            let inner = self.inner.lock().unwrap();
            let roles: Vec<i64> = inner.user_roles.iter().filter(|(u, _)| *u == user_id).map(|(_, r)| *r).collect();
            let hidden = |portal_id: i64| {
                inner.role_portals.iter().any(|(r, p, v)| *p == portal_id && !*v && roles.contains(r))
            };
            Ok(inner
                .portals
                .iter()
                .filter(|p| p.project_id == project_id && !hidden(p.id))
                .cloned()
                .collect())
        }

        async fn existing_role_ids(&self, role_ids: &[i64]) -> Result<Vec<i64>, ServiceError> {
            let inner = self.inner.lock().unwrap();
            Ok(role_ids.iter().copied().filter(|r| inner.roles.contains(r)).collect())
        }

        async fn create_with_roles(&self, portal: NewPortal, role_ids: &[i64]) -> Result<dashboard_portal::Model, ServiceError> {
            let mut inner = self.inner.lock().unwrap();
            if inner.portals.iter().any(|p| p.project_id == portal.project_id && p.name == portal.name) {
                return Err(ServiceError::Conflict("duplicate portal name".into()));
            }
            let id = inner.portals.iter().map(|p| p.id).max().unwrap_or(0) + 1;
            let model = dashboard_portal::Model {
                id,
                name: portal.name,
                description: portal.description,
                project_id: portal.project_id,
                avatar: portal.avatar,
                publish: portal.publish,
                create_by: portal.create_by,
                create_time: chrono::Utc::now(),
                update_by: None,
                update_time: None,
            };
            inner.portals.push(model.clone());
            for r in role_ids {
                inner.role_portals.push((*r, id, false));
            }
            Ok(model)
        }

        async fn update_with_exclusions(
            &self,
            portal: dashboard_portal::Model,
            team_ids: Option<Vec<i64>>,
            _user_id: i64,
        ) -> Result<dashboard_portal::Model, ServiceError> {
            let mut inner = self.inner.lock().unwrap();
            let slot = inner
                .portals
                .iter_mut()
                .find(|p| p.id == portal.id)
                .ok_or_else(|| ServiceError::not_found("dashboardPortal"))?;
            *slot = portal.clone();

            let existing: Vec<i64> = inner.exclusions.iter().filter(|(p, _)| *p == portal.id).map(|(_, t)| *t).collect();
            let plan = plan_team_exclusions(&existing, team_ids.as_deref());
            if plan.remove_all {
                inner.exclusions.retain(|(p, _)| *p != portal.id);
            } else {
                inner.exclusions.retain(|(p, t)| *p != portal.id || !plan.remove.contains(t));
            }
            for t in plan.add {
                inner.exclusions.push((portal.id, t));
            }
            Ok(portal)
        }

        async fn exclude_team_ids(&self, portal_id: i64) -> Result<Vec<i64>, ServiceError> {
            let inner = self.inner.lock().unwrap();
            Ok(inner.exclusions.iter().filter(|(p, _)| *p == portal_id).map(|(_, t)| *t).collect())
        }

        async fn delete_cascade(&self, portal_id: i64) -> Result<bool, ServiceError> {
            let mut inner = self.inner.lock().unwrap();
            inner.dashboards.retain(|(_, p)| *p != portal_id);
            let before = inner.portals.len();
            inner.portals.retain(|p| p.id != portal_id);
            let deleted = inner.portals.len() < before;
            if deleted {
                inner.exclusions.retain(|(p, _)| *p != portal_id);
                inner.role_portals.retain(|(_, p, _)| *p != portal_id);
            }
            Ok(deleted)
        }
    }
}
