use sea_orm::{entity::prelude::*, ColumnTrait, QueryFilter, Set, DatabaseConnection};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{self, ModelError};
use crate::project;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dashboard_portal")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub project_id: i64,
    pub avatar: Option<String>,
    pub publish: bool,
    pub create_by: i64,
    pub create_time: DateTimeUtc,
    pub update_by: Option<i64>,
    pub update_time: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Project }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Project => Entity::belongs_to(project::Entity).from(Column::ProjectId).to(project::Column::Id).into(),
        }
    }
}

impl Related<project::Entity> for Entity {
    fn to() -> RelationDef { Relation::Project.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn create(
    db: &DatabaseConnection,
    project_id: i64,
    name: &str,
    description: Option<&str>,
    avatar: Option<&str>,
    publish: bool,
    create_by: i64,
) -> Result<Model, ModelError> {
    errors::validate_name(name, 255)?;
    let am = ActiveModel {
        name: Set(name.to_string()),
        description: Set(description.map(str::to_string)),
        project_id: Set(project_id),
        avatar: Set(avatar.map(str::to_string)),
        publish: Set(publish),
        create_by: Set(create_by),
        create_time: Set(Utc::now()),
        ..Default::default()
    };
    Ok(am.insert(db).await?)
}

pub async fn find_by_name(db: &DatabaseConnection, project_id: i64, name: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find()
        .filter(Column::ProjectId.eq(project_id))
        .filter(Column::Name.eq(name))
        .one(db)
        .await?)
}
