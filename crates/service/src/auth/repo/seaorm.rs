use sea_orm::{DatabaseConnection, EntityTrait};

use crate::auth::domain::{AuthUser, Credentials};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

fn to_auth_user(u: models::user::Model) -> AuthUser {
    AuthUser { id: u.id, username: u.username, email: u.email }
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<AuthUser>, AuthError> {
        let res = models::user::find_by_username(&self.db, username).await?;
        Ok(res.map(to_auth_user))
    }

    async fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<AuthUser, AuthError> {
        let created = models::user::create(&self.db, username, email, password_hash).await?;
        Ok(to_auth_user(created))
    }

    async fn get_credentials(&self, user_id: i64) -> Result<Option<Credentials>, AuthError> {
        let res = models::user::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(|u| Credentials { user_id: u.id, password_hash: u.password_hash }))
    }
}
