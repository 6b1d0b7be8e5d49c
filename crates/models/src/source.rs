use sea_orm::{entity::prelude::*, ColumnTrait, QueryFilter, Set, DatabaseConnection};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{self, ModelError};
use crate::project;

pub const TYPE_JDBC: &str = "jdbc";
pub const TYPE_CSV: &str = "csv";

/// `config` holds the connection settings as JSON text.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "source")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub config: String,
    #[sea_orm(column_name = "type")]
    pub source_type: String,
    pub project_id: i64,
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

pub fn validate_type(source_type: &str) -> Result<(), ModelError> {
    match source_type {
        TYPE_JDBC | TYPE_CSV => Ok(()),
        other => Err(ModelError::Validation(format!("unknown source type: {other}"))),
    }
}

pub async fn create(
    db: &DatabaseConnection,
    project_id: i64,
    name: &str,
    description: Option<&str>,
    source_type: &str,
    config: &str,
    create_by: i64,
) -> Result<Model, ModelError> {
    errors::validate_name(name, 255)?;
    validate_type(source_type)?;
    let am = ActiveModel {
        name: Set(name.to_string()),
        description: Set(description.map(str::to_string)),
        config: Set(config.to_string()),
        source_type: Set(source_type.to_string()),
        project_id: Set(project_id),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_types_only() {
        assert!(validate_type("jdbc").is_ok());
        assert!(validate_type("csv").is_ok());
        assert!(validate_type("mongo").is_err());
    }
}
