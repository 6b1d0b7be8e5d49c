use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::{info, warn};

use models::source;
use service::auth::domain::AuthUser;
use service::source::domain::{
    SourceCreate, SourceFile, SourceInfo, SourceTest, TableInfo, UploadMeta, UploadMode, UploadReport,
};

use crate::{errors::JsonApiError, routes::auth::ServerState, routes::portals::ProjectQuery};

fn check_id(id: i64) -> Result<(), JsonApiError> {
    if id < 1 {
        return Err(JsonApiError::bad_request("Invalid source id"));
    }
    Ok(())
}

#[utoipa::path(
    get, path = "/api/v1/sources", tag = "sources",
    params(ProjectQuery),
    responses((status = 200, description = "Sources of the project, or null"), (status = 404, description = "Project Not Found"))
)]
pub async fn list(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Query(q): Query<ProjectQuery>,
) -> Result<Json<Option<Vec<source::Model>>>, JsonApiError> {
    if q.project_id < 1 {
        return Err(JsonApiError::bad_request("Invalid project id"));
    }
    Ok(Json(state.sources.get_sources(q.project_id, &user).await?))
}

#[utoipa::path(
    post, path = "/api/v1/sources", tag = "sources",
    request_body = crate::openapi::SourceCreateDoc,
    responses(
        (status = 200, description = "Created"),
        (status = 400, description = "Invalid Type"),
        (status = 409, description = "Name Taken"),
        (status = 502, description = "Connection Failed")
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<SourceCreate>,
) -> Result<Json<source::Model>, JsonApiError> {
    let created = state.sources.create_source(input, &user).await?;
    info!(source_id = created.id, user_id = user.id, "created source");
    Ok(Json(created))
}

#[utoipa::path(
    put, path = "/api/v1/sources/{id}", tag = "sources",
    params(("id" = i64, Path, description = "Source id")),
    request_body = crate::openapi::SourceInfoDoc,
    responses((status = 200, description = "Updated"), (status = 404, description = "Not Found"))
)]
pub async fn update(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(input): Json<SourceInfo>,
) -> Result<Json<source::Model>, JsonApiError> {
    check_id(id)?;
    if input.id != id {
        return Err(JsonApiError::bad_request("Invalid source id"));
    }
    Ok(Json(state.sources.update_source(input, &user).await?))
}

#[utoipa::path(
    delete, path = "/api/v1/sources/{id}", tag = "sources",
    params(("id" = i64, Path, description = "Source id")),
    responses((status = 204, description = "Deleted"), (status = 409, description = "Used By Views"))
)]
pub async fn delete(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, JsonApiError> {
    check_id(id)?;
    if state.sources.delete_source(id, &user).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(JsonApiError::new(StatusCode::NOT_FOUND, "Not Found", Some("this source is not found".into())))
    }
}

#[utoipa::path(
    post, path = "/api/v1/sources/test", tag = "sources",
    request_body = crate::openapi::SourceTestDoc,
    responses((status = 200, description = "Connection OK"), (status = 502, description = "Connection Failed"))
)]
pub async fn test(State(state): State<ServerState>, Json(input): Json<SourceTest>) -> Result<Json<bool>, JsonApiError> {
    Ok(Json(state.sources.test_source(input).await?))
}

#[utoipa::path(
    post, path = "/api/v1/sources/{id}/upload-meta", tag = "sources",
    params(("id" = i64, Path, description = "Source id")),
    request_body = crate::openapi::UploadMetaDoc,
    responses((status = 204, description = "Upload Allowed"), (status = 400, description = "Table Conflicts With Mode"))
)]
pub async fn upload_meta(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(meta): Json<UploadMeta>,
) -> Result<StatusCode, JsonApiError> {
    check_id(id)?;
    state.sources.valid_upload_meta(id, &meta, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn field_error(e: MultipartError) -> JsonApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return JsonApiError::new(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large", Some(e.body_text()));
    }
    JsonApiError::bad_request(format!("invalid multipart body: {e}"))
}

fn file_too_large(max_file_bytes: usize) -> JsonApiError {
    JsonApiError::new(
        StatusCode::PAYLOAD_TOO_LARGE,
        "Payload Too Large",
        Some(format!("upload file exceeds {max_file_bytes} bytes")),
    )
}

/// Collect the upload form: `table_name`, `primary_keys`, `index_keys`, `mode` and `file`.
async fn read_upload_form(mut form: Multipart, max_file_bytes: usize) -> Result<(UploadMeta, SourceFile), JsonApiError> {
    let (mut table_name, mut primary_keys, mut index_keys, mut mode, mut file) = (None, None, None, None, None);
    while let Some(field) = form.next_field().await.map_err(field_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(field_error)?;
                if bytes.len() > max_file_bytes {
                    return Err(file_too_large(max_file_bytes));
                }
                file = Some(SourceFile { name: file_name, bytes: bytes.to_vec() });
            }
            "table_name" => table_name = Some(field.text().await.map_err(field_error)?),
            "primary_keys" => primary_keys = Some(field.text().await.map_err(field_error)?),
            "index_keys" => index_keys = Some(field.text().await.map_err(field_error)?),
            "mode" => {
                let raw = field.text().await.map_err(field_error)?;
                let level: i16 = raw.trim().parse().map_err(|_| JsonApiError::bad_request(format!("invalid mode {raw}")))?;
                mode = Some(UploadMode::try_from(level).map_err(JsonApiError::bad_request)?);
            }
            other => warn!(field = other, "ignoring unknown upload field"),
        }
    }
    let table_name = table_name
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| JsonApiError::bad_request("table cannot be empty"))?;
    let file = file.ok_or_else(|| JsonApiError::bad_request("upload file cannot be empty"))?;
    let meta = UploadMeta {
        table_name: table_name.trim().to_string(),
        primary_keys: primary_keys.filter(|k| !k.trim().is_empty()),
        index_keys: index_keys.filter(|k| !k.trim().is_empty()),
        mode: mode.unwrap_or(UploadMode::New),
    };
    Ok((meta, file))
}

#[utoipa::path(
    post, path = "/api/v1/sources/{id}/upload/{file_type}", tag = "sources",
    params(
        ("id" = i64, Path, description = "Source id"),
        ("file_type" = String, Path, description = "csv, xlsx or xls")
    ),
    request_body(content = crate::openapi::UploadFormDoc, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Rows inserted"),
        (status = 400, description = "Bad File Or Mode"),
        (status = 413, description = "File Too Large"),
        (status = 502, description = "Insert Failed")
    )
)]
pub async fn upload(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path((id, file_type)): Path<(i64, String)>,
    form: Multipart,
) -> Result<Json<UploadReport>, JsonApiError> {
    check_id(id)?;
    let (meta, file) = read_upload_form(form, state.max_file_bytes).await?;
    let report = state.sources.data_upload(id, meta, file, &user, &file_type).await?;
    info!(source_id = id, user_id = user.id, rows = report.rows, batches = report.batches, "upload finished");
    Ok(Json(report))
}

#[utoipa::path(
    get, path = "/api/v1/sources/{id}/tables", tag = "sources",
    params(("id" = i64, Path, description = "Source id")),
    responses((status = 200, description = "Table names, or null"), (status = 404, description = "Not Found"))
)]
pub async fn tables(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Option<Vec<String>>>, JsonApiError> {
    check_id(id)?;
    Ok(Json(state.sources.get_source_tables(id, &user).await?))
}

#[utoipa::path(
    get, path = "/api/v1/sources/{id}/tables/{table}/columns", tag = "sources",
    params(
        ("id" = i64, Path, description = "Source id"),
        ("table" = String, Path, description = "Table name")
    ),
    responses((status = 200, description = "Columns and primary keys, or null"), (status = 404, description = "Not Found"))
)]
pub async fn columns(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path((id, table)): Path<(i64, String)>,
) -> Result<Json<Option<TableInfo>>, JsonApiError> {
    check_id(id)?;
    Ok(Json(state.sources.get_table_columns(id, &table, &user).await?))
}
