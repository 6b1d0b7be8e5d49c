use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use tracing::debug;

use models::{dashboard, dashboard_portal, exclude_portal_team, project, rel_role_portal, rel_role_user, role};

use crate::errors::ServiceError;
use crate::portal::domain::{plan_team_exclusions, NewPortal, PortalWithProject};
use crate::portal::repository::PortalRepository;

pub struct SeaOrmPortalRepository {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl PortalRepository for SeaOrmPortalRepository {
    async fn find_id_by_name(&self, project_id: i64, name: &str) -> Result<Option<i64>, ServiceError> {
        Ok(dashboard_portal::find_by_name(&self.db, project_id, name).await?.map(|p| p.id))
    }

    async fn find_with_project(&self, id: i64) -> Result<Option<PortalWithProject>, ServiceError> {
        let found = dashboard_portal::Entity::find_by_id(id)
            .find_also_related(project::Entity)
            .one(&self.db)
            .await?;
        Ok(found.map(|(portal, project)| PortalWithProject { portal, project }))
    }

    async fn list_visible(&self, project_id: i64, user_id: i64) -> Result<Vec<dashboard_portal::Model>, ServiceError> {
        let role_ids: Vec<i64> = rel_role_user::Entity::find()
            .filter(rel_role_user::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|r| r.role_id)
            .collect();

        let mut query = dashboard_portal::Entity::find().filter(dashboard_portal::Column::ProjectId.eq(project_id));
        if !role_ids.is_empty() {
            let hidden: Vec<i64> = rel_role_portal::Entity::find()
                .filter(rel_role_portal::Column::RoleId.is_in(role_ids))
                .filter(rel_role_portal::Column::Visible.eq(false))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|r| r.portal_id)
                .collect();
            if !hidden.is_empty() {
                query = query.filter(dashboard_portal::Column::Id.is_not_in(hidden));
            }
        }
        Ok(query.all(&self.db).await?)
    }

    async fn existing_role_ids(&self, role_ids: &[i64]) -> Result<Vec<i64>, ServiceError> {
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = role::Entity::find()
            .select_only()
            .column(role::Column::Id)
            .filter(role::Column::Id.is_in(role_ids.to_vec()))
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(ids)
    }

    async fn create_with_roles(&self, portal: NewPortal, role_ids: &[i64]) -> Result<dashboard_portal::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let created = dashboard_portal::ActiveModel {
            name: Set(portal.name),
            description: Set(portal.description),
            project_id: Set(portal.project_id),
            avatar: Set(portal.avatar),
            publish: Set(portal.publish),
            create_by: Set(portal.create_by),
            create_time: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        if !role_ids.is_empty() {
            let rows = role_ids
                .iter()
                .map(|r| rel_role_portal::new_active(*r, created.id, false, portal.create_by));
            rel_role_portal::Entity::insert_many(rows).exec(&txn).await?;
        }
        txn.commit().await?;
        Ok(created)
    }

    async fn update_with_exclusions(
        &self,
        portal: dashboard_portal::Model,
        team_ids: Option<Vec<i64>>,
        user_id: i64,
    ) -> Result<dashboard_portal::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let portal_id = portal.id;

        let mut am = portal.clone().into_active_model();
        am.name = Set(portal.name.clone());
        am.description = Set(portal.description.clone());
        am.avatar = Set(portal.avatar.clone());
        am.publish = Set(portal.publish);
        am.update_by = Set(portal.update_by);
        am.update_time = Set(portal.update_time);
        let updated = am.update(&txn).await?;

        let existing: Vec<i64> = exclude_portal_team::Entity::find()
            .filter(exclude_portal_team::Column::PortalId.eq(portal_id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|e| e.team_id)
            .collect();
        let plan = plan_team_exclusions(&existing, team_ids.as_deref());
        debug!(portal_id, ?plan, "reconciling team exclusions");

        if plan.remove_all {
            exclude_portal_team::Entity::delete_many()
                .filter(exclude_portal_team::Column::PortalId.eq(portal_id))
                .exec(&txn)
                .await?;
        } else if !plan.remove.is_empty() {
            exclude_portal_team::Entity::delete_many()
                .filter(exclude_portal_team::Column::PortalId.eq(portal_id))
                .filter(exclude_portal_team::Column::TeamId.is_in(plan.remove.clone()))
                .exec(&txn)
                .await?;
        }
        if !plan.add.is_empty() {
            let rows = plan.add.iter().map(|t| exclude_portal_team::new_active(portal_id, *t, user_id));
            exclude_portal_team::Entity::insert_many(rows).exec(&txn).await?;
        }

        txn.commit().await?;
        Ok(updated)
    }

    async fn exclude_team_ids(&self, portal_id: i64) -> Result<Vec<i64>, ServiceError> {
        let rows = exclude_portal_team::Entity::find()
            .filter(exclude_portal_team::Column::PortalId.eq(portal_id))
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|r| r.team_id).collect())
    }

    async fn delete_cascade(&self, portal_id: i64) -> Result<bool, ServiceError> {
        let txn = self.db.begin().await?;
        dashboard::Entity::delete_many()
            .filter(dashboard::Column::DashboardPortalId.eq(portal_id))
            .exec(&txn)
            .await?;
        let res = dashboard_portal::Entity::delete_by_id(portal_id).exec(&txn).await?;
        let deleted = res.rows_affected > 0;
        if deleted {
            exclude_portal_team::Entity::delete_many()
                .filter(exclude_portal_team::Column::PortalId.eq(portal_id))
                .exec(&txn)
                .await?;
            rel_role_portal::Entity::delete_many()
                .filter(rel_role_portal::Column::PortalId.eq(portal_id))
                .exec(&txn)
                .await?;
        }
        txn.commit().await?;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{db_tests_disabled, get_db, unique};

    #[tokio::test]
    async fn portal_lifecycle_against_database() {
        if db_tests_disabled() {
            return;
        }
        let db = get_db().await.expect("db");
        let owner = models::user::create(&db, &unique("owner"), &format!("{}@x.io", unique("o")), "hash").await.unwrap();
        let viewer = models::user::create(&db, &unique("viewer"), &format!("{}@x.io", unique("v")), "hash").await.unwrap();
        let project = models::project::create(&db, owner.id, &unique("proj"), None, false).await.unwrap();
        let role = models::role::create(&db, &unique("role"), None).await.unwrap();
        models::rel_role_user::assign(&db, role.id, viewer.id).await.unwrap();

        let repo = SeaOrmPortalRepository { db: db.clone() };
        let portal = repo
            .create_with_roles(
                NewPortal {
                    name: unique("portal"),
                    description: None,
                    project_id: project.id,
                    avatar: None,
                    publish: false,
                    create_by: owner.id,
                },
                &[role.id],
            )
            .await
            .unwrap();
        assert_eq!(repo.existing_role_ids(&[role.id, -1]).await.unwrap(), vec![role.id]);

        // the new role row is hidden, so only the owner still lists the portal
        let ids = |v: Vec<dashboard_portal::Model>| v.into_iter().map(|p| p.id).collect::<Vec<_>>();
        assert!(ids(repo.list_visible(project.id, owner.id).await.unwrap()).contains(&portal.id));
        assert!(!ids(repo.list_visible(project.id, viewer.id).await.unwrap()).contains(&portal.id));

        repo.update_with_exclusions(portal.clone(), Some(vec![1, 2]), owner.id).await.unwrap();
        repo.update_with_exclusions(portal.clone(), Some(vec![2, 3]), owner.id).await.unwrap();
        let mut teams = repo.exclude_team_ids(portal.id).await.unwrap();
        teams.sort();
        assert_eq!(teams, vec![2, 3]);
        repo.update_with_exclusions(portal.clone(), None, owner.id).await.unwrap();
        assert!(repo.exclude_team_ids(portal.id).await.unwrap().is_empty());

        models::dashboard::create(&db, portal.id, "board", 0, 0, owner.id).await.unwrap();
        assert!(repo.delete_cascade(portal.id).await.unwrap());
        assert!(!repo.delete_cascade(portal.id).await.unwrap());
        let left = dashboard::Entity::find()
            .filter(dashboard::Column::DashboardPortalId.eq(portal.id))
            .all(&db)
            .await
            .unwrap();
        assert!(left.is_empty());
    }
}
