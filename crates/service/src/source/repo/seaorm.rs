use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, Set,
};

use models::{source, view};

use crate::errors::ServiceError;
use crate::source::domain::NewSource;
use crate::source::repository::SourceRepository;

pub struct SeaOrmSourceRepository {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl SourceRepository for SeaOrmSourceRepository {
    async fn find(&self, id: i64) -> Result<Option<source::Model>, ServiceError> {
        Ok(source::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn find_id_by_name(&self, project_id: i64, name: &str) -> Result<Option<i64>, ServiceError> {
        Ok(source::find_by_name(&self.db, project_id, name).await?.map(|s| s.id))
    }

    async fn list_by_project(&self, project_id: i64) -> Result<Vec<source::Model>, ServiceError> {
        Ok(source::Entity::find()
            .filter(source::Column::ProjectId.eq(project_id))
            .all(&self.db)
            .await?)
    }

    async fn create(&self, new: NewSource) -> Result<source::Model, ServiceError> {
        models::errors::validate_name(&new.name, 255)?;
        source::validate_type(&new.source_type)?;
        let created = source::ActiveModel {
            name: Set(new.name),
            description: Set(new.description),
            config: Set(new.config),
            source_type: Set(new.source_type),
            project_id: Set(new.project_id),
            create_by: Set(new.create_by),
            create_time: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(created)
    }

    async fn update(&self, model: source::Model) -> Result<source::Model, ServiceError> {
        let mut am = model.clone().into_active_model();
        am.name = Set(model.name);
        am.description = Set(model.description);
        am.config = Set(model.config);
        am.source_type = Set(model.source_type);
        am.update_by = Set(model.update_by);
        am.update_time = Set(model.update_time);
        Ok(am.update(&self.db).await?)
    }

    async fn has_views(&self, id: i64) -> Result<bool, ServiceError> {
        let count = view::Entity::find()
            .filter(view::Column::SourceId.eq(id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool, ServiceError> {
        let res = source::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(res.rows_affected > 0)
    }
}
