use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{self, ModelError};
use crate::source;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "view")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub project_id: i64,
    pub source_id: i64,
    #[sea_orm(column_type = "Text", nullable)]
    pub sql: Option<String>,
    pub create_by: i64,
    pub create_time: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Source }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Source => Entity::belongs_to(source::Entity).from(Column::SourceId).to(source::Column::Id).into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn create(db: &DatabaseConnection, project_id: i64, source_id: i64, name: &str, sql: Option<&str>, create_by: i64) -> Result<Model, ModelError> {
    errors::validate_name(name, 255)?;
    let am = ActiveModel {
        name: Set(name.to_string()),
        description: Set(None),
        project_id: Set(project_id),
        source_id: Set(source_id),
        sql: Set(sql.map(str::to_string)),
        create_by: Set(create_by),
        create_time: Set(Utc::now()),
        ..Default::default()
    };
    Ok(am.insert(db).await?)
}
