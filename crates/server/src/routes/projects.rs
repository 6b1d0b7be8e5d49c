use axum::{extract::State, Extension, Json};
use tracing::info;

use service::auth::domain::AuthUser;
use service::project::domain::ProjectCreate;

use crate::{errors::JsonApiError, routes::auth::ServerState};

#[utoipa::path(
    post, path = "/api/v1/projects", tag = "projects",
    request_body = crate::openapi::ProjectCreateDoc,
    responses(
        (status = 200, description = "Created"),
        (status = 400, description = "Validation Error"),
        (status = 409, description = "Name Taken")
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<ProjectCreate>,
) -> Result<Json<models::project::Model>, JsonApiError> {
    let project = state.projects.create_project(input, &user).await?;
    info!(project_id = project.id, user_id = user.id, "created project");
    Ok(Json(project))
}
