use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct RegisterRequest { pub username: String, pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct LoginRequest { pub username: String, pub password: String }

#[derive(ToSchema)]
pub struct ProjectCreateDoc { pub name: String, pub description: Option<String>, pub visibility: bool }

#[derive(ToSchema)]
pub struct PortalCreateDoc {
    pub name: String,
    pub description: Option<String>,
    pub project_id: i64,
    pub avatar: Option<String>,
    pub publish: bool,
    /// Roles the portal starts hidden from
    pub role_ids: Vec<i64>,
}

#[derive(ToSchema)]
pub struct PortalUpdateDoc {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub avatar: Option<String>,
    pub publish: bool,
    /// Absent or empty clears the exclusion list
    pub team_ids: Option<Vec<i64>>,
}

#[derive(ToSchema)]
pub struct SourceConfigDoc { pub url: String, pub username: String, pub password: String }

#[derive(ToSchema)]
pub struct SourceCreateDoc {
    pub name: String,
    pub description: Option<String>,
    /// `jdbc` or `csv`
    pub r#type: String,
    pub project_id: i64,
    pub config: SourceConfigDoc,
}

#[derive(ToSchema)]
pub struct SourceInfoDoc {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub r#type: String,
    pub config: SourceConfigDoc,
}

#[derive(ToSchema)]
pub struct SourceTestDoc { pub url: String, pub username: String, pub password: String }

#[derive(ToSchema)]
pub struct UploadMetaDoc {
    pub table_name: String,
    pub primary_keys: Option<String>,
    pub index_keys: Option<String>,
    /// 0 new, 1 replace, 2 append
    pub mode: i16,
}

#[derive(ToSchema)]
pub struct UploadFormDoc {
    pub table_name: String,
    pub primary_keys: Option<String>,
    pub index_keys: Option<String>,
    pub mode: i16,
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::projects::create,
        crate::routes::portals::list,
        crate::routes::portals::create,
        crate::routes::portals::update,
        crate::routes::portals::delete,
        crate::routes::portals::exclude_teams,
        crate::routes::sources::list,
        crate::routes::sources::create,
        crate::routes::sources::update,
        crate::routes::sources::delete,
        crate::routes::sources::test,
        crate::routes::sources::upload_meta,
        crate::routes::sources::upload,
        crate::routes::sources::tables,
        crate::routes::sources::columns,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            ProjectCreateDoc,
            PortalCreateDoc,
            PortalUpdateDoc,
            SourceConfigDoc,
            SourceCreateDoc,
            SourceInfoDoc,
            SourceTestDoc,
            UploadMetaDoc,
            UploadFormDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "projects"),
        (name = "portals"),
        (name = "sources")
    )
)]
pub struct ApiDoc;
