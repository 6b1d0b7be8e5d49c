use sea_orm::{entity::prelude::*, ColumnTrait, QueryFilter, Set, DatabaseConnection};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{self, ModelError};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_email(email: &str) -> Result<(), ModelError> {
    if !email.contains('@') { return Err(ModelError::Validation("invalid email".into())); }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), ModelError> {
    errors::validate_name(username, 128)?;
    if username.chars().any(char::is_whitespace) {
        return Err(ModelError::Validation("username must not contain whitespace".into()));
    }
    Ok(())
}

pub async fn create(db: &DatabaseConnection, username: &str, email: &str, password_hash: &str) -> Result<Model, ModelError> {
    validate_username(username)?;
    validate_email(email)?;
    if password_hash.trim().is_empty() { return Err(ModelError::Validation("password hash required".into())); }
    let am = ActiveModel {
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    Ok(am.insert(db).await?)
}

pub async fn find_by_username(db: &DatabaseConnection, username: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find().filter(Column::Username.eq(username)).one(db).await?)
}

pub async fn hard_delete(db: &DatabaseConnection, id: i64) -> Result<(), ModelError> {
    Entity::delete_by_id(id).exec(db).await?;
    Ok(())
}
