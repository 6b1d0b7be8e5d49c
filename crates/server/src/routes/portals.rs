use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use tracing::info;

use models::dashboard_portal;
use service::auth::domain::AuthUser;
use service::portal::domain::{DashboardPortalCreate, DashboardPortalUpdate};

use crate::{errors::JsonApiError, routes::auth::ServerState};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ProjectQuery {
    pub project_id: i64,
}

fn check_id(id: i64) -> Result<(), JsonApiError> {
    if id < 1 {
        return Err(JsonApiError::bad_request("Invalid id"));
    }
    Ok(())
}

#[utoipa::path(
    get, path = "/api/v1/dashboard-portals", tag = "portals",
    params(ProjectQuery),
    responses(
        (status = 200, description = "Portals visible to the caller, or null"),
        (status = 404, description = "Project Not Found")
    )
)]
pub async fn list(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Query(q): Query<ProjectQuery>,
) -> Result<Json<Option<Vec<dashboard_portal::Model>>>, JsonApiError> {
    check_id(q.project_id)?;
    Ok(Json(state.portals.get_dashboard_portals(q.project_id, &user).await?))
}

#[utoipa::path(
    post, path = "/api/v1/dashboard-portals", tag = "portals",
    request_body = crate::openapi::PortalCreateDoc,
    responses(
        (status = 200, description = "Created"),
        (status = 401, description = "No Permission"),
        (status = 409, description = "Name Taken")
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<DashboardPortalCreate>,
) -> Result<Json<dashboard_portal::Model>, JsonApiError> {
    check_id(input.project_id)?;
    let portal = state.portals.create_dashboard_portal(input, &user).await?;
    info!(portal_id = portal.id, user_id = user.id, "created dashboard portal");
    Ok(Json(portal))
}

#[utoipa::path(
    put, path = "/api/v1/dashboard-portals/{id}", tag = "portals",
    params(("id" = i64, Path, description = "Portal id")),
    request_body = crate::openapi::PortalUpdateDoc,
    responses(
        (status = 200, description = "Updated"),
        (status = 400, description = "Invalid Id"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(input): Json<DashboardPortalUpdate>,
) -> Result<Json<dashboard_portal::Model>, JsonApiError> {
    check_id(id)?;
    if input.id != id {
        return Err(JsonApiError::bad_request("Invalid dashboard portal id"));
    }
    Ok(Json(state.portals.update_dashboard_portal(input, &user).await?))
}

#[utoipa::path(
    delete, path = "/api/v1/dashboard-portals/{id}", tag = "portals",
    params(("id" = i64, Path, description = "Portal id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "No Permission"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, JsonApiError> {
    check_id(id)?;
    if state.portals.delete_dashboard_portal(id, &user).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(JsonApiError::new(StatusCode::NOT_FOUND, "Not Found", Some("dashboardPortal not found".into())))
    }
}

#[utoipa::path(
    get, path = "/api/v1/dashboard-portals/{id}/exclude-teams", tag = "portals",
    params(("id" = i64, Path, description = "Portal id")),
    responses((status = 200, description = "Excluded team ids"))
)]
pub async fn exclude_teams(State(state): State<ServerState>, Path(id): Path<i64>) -> Result<Json<Vec<i64>>, JsonApiError> {
    check_id(id)?;
    Ok(Json(state.portals.get_exclude_teams(id).await?))
}
