use async_trait::async_trait;

use super::domain::{AuthUser, Credentials};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<AuthUser, AuthError>;
    async fn get_credentials(&self, user_id: i64) -> Result<Option<Credentials>, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<String, AuthUser>>, // key: username
        creds: Mutex<HashMap<i64, Credentials>>, // key: user_id
        next_id: Mutex<i64>,
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_user_by_username(&self, username: &str) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.get(username).cloned())
        }

        async fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<AuthUser, AuthError> {
            let mut users = self.users.lock().unwrap();
            if users.contains_key(username) {
                return Err(AuthError::Conflict);
            }
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            let user = AuthUser { id: *next, username: username.to_string(), email: email.to_string() };
            users.insert(username.to_string(), user.clone());
            self.creds
                .lock()
                .unwrap()
                .insert(user.id, Credentials { user_id: user.id, password_hash: password_hash.to_string() });
            Ok(user)
        }

        async fn get_credentials(&self, user_id: i64) -> Result<Option<Credentials>, AuthError> {
            let creds = self.creds.lock().unwrap();
            Ok(creds.get(&user_id).cloned())
        }
    }
}
