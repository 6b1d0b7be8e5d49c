use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use models::{project, rel_role_project, rel_role_user, rel_user_project};

use crate::errors::ServiceError;
use crate::project::repository::ProjectRepository;

pub struct SeaOrmProjectRepository {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl ProjectRepository for SeaOrmProjectRepository {
    async fn find_project(&self, id: i64) -> Result<Option<project::Model>, ServiceError> {
        Ok(project::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn find_membership(&self, project_id: i64, user_id: i64) -> Result<Option<i16>, ServiceError> {
        let row = rel_user_project::Entity::find()
            .filter(rel_user_project::Column::ProjectId.eq(project_id))
            .filter(rel_user_project::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(row.map(|r| r.role_type))
    }

    async fn find_role_grants(&self, project_id: i64, user_id: i64) -> Result<Vec<rel_role_project::Model>, ServiceError> {
        let role_ids: Vec<i64> = rel_role_user::Entity::find()
            .filter(rel_role_user::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|r| r.role_id)
            .collect();
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = rel_role_project::Entity::find()
            .filter(rel_role_project::Column::ProjectId.eq(project_id))
            .filter(rel_role_project::Column::RoleId.is_in(role_ids))
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn exists_for_owner(&self, owner_id: i64, name: &str) -> Result<bool, ServiceError> {
        let found = project::Entity::find()
            .filter(project::Column::UserId.eq(owner_id))
            .filter(project::Column::Name.eq(name))
            .one(&self.db)
            .await?;
        Ok(found.is_some())
    }

    async fn create_project(&self, owner_id: i64, name: &str, description: Option<&str>, visibility: bool) -> Result<project::Model, ServiceError> {
        Ok(project::create(&self.db, owner_id, name, description, visibility).await?)
    }
}
