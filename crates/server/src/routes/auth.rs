use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use tracing::{error, info, warn};

use service::auth::domain::{AuthUser, LoginInput, RegisterInput};
use service::auth::service::AuthService;
use service::portal::service::DashboardPortalService;
use service::project::ProjectService;
use service::source::SourceService;

use crate::errors::JsonApiError;

pub const AUTH_COOKIE: &str = "auth_token";

/// Services shared by every handler.
#[derive(Clone)]
pub struct ServerState {
    pub auth: Arc<AuthService>,
    pub projects: Arc<ProjectService>,
    pub portals: Arc<DashboardPortalService>,
    pub sources: Arc<SourceService>,
    pub max_file_bytes: usize,
}

#[derive(Serialize)]
pub struct LoginOutput {
    pub user: AuthUser,
    pub token: String,
}

#[utoipa::path(post, path = "/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 200, description = "Registered"), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn register(State(state): State<ServerState>, Json(input): Json<RegisterInput>) -> Result<Json<AuthUser>, JsonApiError> {
    let user = state.auth.register(input).await?;
    info!(user_id = user.id, username = %user.username, "user registered");
    Ok(Json(user))
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged In"), (status = 401, description = "Unauthorized")))]
pub async fn login(State(state): State<ServerState>, jar: CookieJar, Json(input): Json<LoginInput>) -> Result<(CookieJar, Json<LoginOutput>), JsonApiError> {
    let session = state.auth.login(input).await?;
    let mut cookie = Cookie::new(AUTH_COOKIE, session.token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    let jar = jar.add(cookie);
    Ok((jar, Json(LoginOutput { user: session.user, token: session.token })))
}

#[utoipa::path(post, path = "/auth/logout", tag = "auth", responses((status = 204, description = "Logged Out")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let mut cookie = Cookie::from(AUTH_COOKIE);
    cookie.set_path("/");
    (jar.remove(cookie), StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/api/v1/me", tag = "auth", responses((status = 200, description = "Current user"), (status = 401, description = "Unauthorized")))]
pub async fn me(Extension(user): Extension<AuthUser>) -> Json<AuthUser> {
    Json(user)
}

fn token_from_cookie(req: &Request) -> Option<String> {
    let raw = req.headers().get(header::COOKIE)?.to_str().ok()?;
    raw.split(';')
        .filter_map(|part| part.trim().strip_prefix("auth_token="))
        .find(|t| !t.is_empty())
        .map(str::to_string)
}

/// Verify `Authorization: Bearer <token>` (or the `auth_token` cookie) and put the
/// caller into request extensions. Missing token is 400, invalid or expired is 401.
pub async fn require_bearer_token(State(state): State<ServerState>, mut req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        return next.run(req).await;
    }
    let path = req.uri().path().to_string();

    let token = match req.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(h) => match h.strip_prefix("Bearer ") {
            Some(t) => t.trim().to_string(),
            None => {
                warn!(path = %path, "invalid Authorization format (expect Bearer)");
                return JsonApiError::new(StatusCode::UNAUTHORIZED, "Unauthorized", Some("expect Bearer token".into())).into_response();
            }
        },
        None => match token_from_cookie(&req) {
            Some(t) => t,
            None => {
                warn!(path = %path, "missing Authorization header and auth_token cookie");
                return JsonApiError::bad_request("missing token").into_response();
            }
        },
    };

    match state.auth.verify_token(&token) {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(e) => {
            error!(path = %path, err = %e, "token validation failed");
            JsonApiError::from(e).into_response()
        }
    }
}
