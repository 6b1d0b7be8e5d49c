use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use rand::rngs::OsRng;
use tracing::{info, debug, instrument};

use super::domain::{AuthSession, AuthUser, Claims, LoginInput, RegisterInput};
use super::errors::AuthError;
use super::repository::AuthRepository;

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

impl From<&configs::AuthConfig> for AuthConfig {
    fn from(c: &configs::AuthConfig) -> Self {
        Self { jwt_secret: c.jwt_secret.clone(), token_ttl_hours: c.token_ttl_hours }
    }
}

/// Auth business service independent of web framework
pub struct AuthService {
    repo: Arc<dyn AuthRepository>,
    cfg: AuthConfig,
}

impl AuthService {
    pub fn new(repo: Arc<dyn AuthRepository>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    /// Register a new user with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::RegisterInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig { jwt_secret: "secret".into(), token_ttl_hours: 1 });
    /// let input = RegisterInput { username: "user".into(), email: "user@example.com".into(), password: "Secret123".into() };
    /// let user = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(user.email, "user@example.com");
    /// ```
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthUser, AuthError> {
        models::user::validate_username(&input.username)?;
        models::user::validate_email(&input.email)?;
        if input.password.len() < 8 {
            return Err(AuthError::Validation("password too short (>=8)".into()));
        }
        if let Some(existing) = self.repo.find_user_by_username(&input.username).await? {
            debug!("user exists: {}", existing.username);
            return Err(AuthError::Conflict);
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(input.password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();

        let user = self.repo.create_user(&input.username, &input.email, &hash).await?;
        info!(target: common::utils::logging::BUSINESS_TARGET, user_id = user.id, username = %user.username, "user_registered");
        Ok(user)
    }

    /// Authenticate a user and issue a token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{RegisterInput, LoginInput};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig { jwt_secret: "secret".into(), token_ttl_hours: 1 });
    /// let _ = tokio_test::block_on(svc.register(RegisterInput { username: "u".into(), email: "u@e.com".into(), password: "Passw0rd".into() }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { username: "u".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// assert!(!session.token.is_empty());
    /// ```
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = self.repo
            .find_user_by_username(&input.username)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let cred = self.repo
            .get_credentials(user.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let parsed = PasswordHash::new(&cred.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default().verify_password(input.password.as_bytes(), &parsed).is_err() {
            return Err(AuthError::Unauthorized);
        }

        let token = self.issue_token(&user)?;
        Ok(AuthSession { user, token })
    }

    pub fn issue_token(&self, user: &AuthUser) -> Result<String, AuthError> {
        let exp = (chrono::Utc::now() + chrono::Duration::hours(self.cfg.token_ttl_hours)).timestamp() as usize;
        let claims = Claims { sub: user.username.clone(), uid: user.id, email: user.email.clone(), exp };
        encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(self.cfg.jwt_secret.as_bytes()))
            .map_err(|e| AuthError::TokenError(e.to_string()))
    }

    /// Decode and validate an HS256 token; expired or tampered tokens fail.
    pub fn verify_token(&self, token: &str) -> Result<AuthUser, AuthError> {
        let key = DecodingKey::from_secret(self.cfg.jwt_secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<Claims>(token, &key, &validation).map_err(|e| AuthError::TokenError(e.to_string()))?;
        Ok(data.claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::mock::MockAuthRepository;

    fn svc() -> AuthService {
        AuthService::new(Arc::new(MockAuthRepository::default()), AuthConfig { jwt_secret: "test-secret".into(), token_ttl_hours: 1 })
    }

    #[tokio::test]
    async fn register_login_verify() {
        let s = svc();
        let u = s.register(RegisterInput { username: "alice".into(), email: "a@x.io".into(), password: "Password1".into() }).await.unwrap();
        let session = s.login(LoginInput { username: "alice".into(), password: "Password1".into() }).await.unwrap();
        let verified = s.verify_token(&session.token).unwrap();
        assert_eq!(verified, u);
    }

    #[tokio::test]
    async fn duplicate_and_bad_password() {
        let s = svc();
        s.register(RegisterInput { username: "bob".into(), email: "b@x.io".into(), password: "Password1".into() }).await.unwrap();
        let dup = s.register(RegisterInput { username: "bob".into(), email: "b2@x.io".into(), password: "Password1".into() }).await;
        assert!(matches!(dup, Err(AuthError::Conflict)));
        let bad = s.login(LoginInput { username: "bob".into(), password: "wrong-pass".into() }).await;
        assert!(matches!(bad, Err(AuthError::Unauthorized)));
    }

    #[test]
    fn token_from_other_secret_rejected() {
        let s = svc();
        let other = AuthService::new(Arc::new(MockAuthRepository::default()), AuthConfig { jwt_secret: "other".into(), token_ttl_hours: 1 });
        let user = AuthUser { id: 7, username: "eve".into(), email: "e@x.io".into() };
        let token = other.issue_token(&user).unwrap();
        assert!(s.verify_token(&token).is_err());
        assert!(s.verify_token("garbage").is_err());
    }
}
