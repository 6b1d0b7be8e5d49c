use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::{role, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rel_role_user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub role_id: i64,
    pub user_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Role, User }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Role => Entity::belongs_to(role::Entity).from(Column::RoleId).to(role::Column::Id).into(),
            Relation::User => Entity::belongs_to(user::Entity).from(Column::UserId).to(user::Column::Id).into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn assign(db: &DatabaseConnection, role_id: i64, user_id: i64) -> Result<Model, ModelError> {
    let am = ActiveModel { role_id: Set(role_id), user_id: Set(user_id), ..Default::default() };
    Ok(am.insert(db).await?)
}
