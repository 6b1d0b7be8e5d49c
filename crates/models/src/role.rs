use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{self, ModelError};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "role")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub async fn create(db: &DatabaseConnection, name: &str, description: Option<&str>) -> Result<Model, ModelError> {
    errors::validate_name(name, 128)?;
    let am = ActiveModel {
        name: Set(name.to_string()),
        description: Set(description.map(str::to_string)),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    Ok(am.insert(db).await?)
}
