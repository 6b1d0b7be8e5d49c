use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::{project, user};

pub const ROLE_MEMBER: i16 = 0;
pub const ROLE_MAINTAINER: i16 = 1;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rel_user_project")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub project_id: i64,
    pub user_id: i64,
    pub role_type: i16,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Project, User }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Project => Entity::belongs_to(project::Entity).from(Column::ProjectId).to(project::Column::Id).into(),
            Relation::User => Entity::belongs_to(user::Entity).from(Column::UserId).to(user::Column::Id).into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn add_member(db: &DatabaseConnection, project_id: i64, user_id: i64, role_type: i16) -> Result<Model, ModelError> {
    if role_type != ROLE_MEMBER && role_type != ROLE_MAINTAINER {
        return Err(ModelError::Validation(format!("unknown role type {role_type}")));
    }
    let am = ActiveModel {
        project_id: Set(project_id),
        user_id: Set(user_id),
        role_type: Set(role_type),
        ..Default::default()
    };
    Ok(am.insert(db).await?)
}
