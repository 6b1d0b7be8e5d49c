use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{self, ModelError};
use crate::user;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "project")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// owner
    pub user_id: i64,
    /// public projects are readable by non-members
    pub visibility: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { User }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self { Relation::User => Entity::belongs_to(user::Entity).from(Column::UserId).to(user::Column::Id).into() }
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn create(db: &DatabaseConnection, owner_id: i64, name: &str, description: Option<&str>, visibility: bool) -> Result<Model, ModelError> {
    errors::validate_name(name, 255)?;
    let am = ActiveModel {
        name: Set(name.to_string()),
        description: Set(description.map(str::to_string)),
        user_id: Set(owner_id),
        visibility: Set(visibility),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    Ok(am.insert(db).await?)
}
