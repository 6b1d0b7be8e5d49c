use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, instrument, warn};

use common::{metrics, utils::logging::BUSINESS_TARGET};
use models::source;

use crate::auth::domain::AuthUser;
use crate::errors::ServiceError;
use crate::project::{ProjectDetail, ProjectPermission, ProjectService, UserPermission};
use super::client::SourceClient;
use super::dialect::DataType;
use super::domain::{
    FileType, NewSource, SourceConfig, SourceCreate, SourceFile, SourceInfo, SourceTest, TableInfo, UploadMeta,
    UploadMode, UploadReport,
};
use super::repository::SourceRepository;
use super::{sql, upload};

const CONNECTION_FAIL: &str = "get source connection fail";

/// Paging of uploaded rows into insert statements.
#[derive(Debug, Clone, Copy)]
pub struct UploadSettings {
    pub batch_size: usize,
    pub max_concurrency: usize,
}

impl From<&configs::UploadConfig> for UploadSettings {
    fn from(c: &configs::UploadConfig) -> Self {
        Self { batch_size: c.batch_size, max_concurrency: c.max_concurrency }
    }
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self { batch_size: 1000, max_concurrency: 8 }
    }
}

pub struct SourceService {
    repo: Arc<dyn SourceRepository>,
    client: Arc<dyn SourceClient>,
    projects: Arc<ProjectService>,
    upload: UploadSettings,
}

fn check_type(source_type: &str) -> Result<(), ServiceError> {
    source::validate_type(source_type).map_err(|_| ServiceError::Validation("Invalid source type".into()))
}

fn redacted_config(raw: &str) -> String {
    SourceConfig::parse(raw)
        .and_then(|c| c.redacted().to_json())
        .unwrap_or_else(|_| "<unreadable>".into())
}

impl SourceService {
    pub fn new(
        repo: Arc<dyn SourceRepository>,
        client: Arc<dyn SourceClient>,
        projects: Arc<ProjectService>,
        upload: UploadSettings,
    ) -> Self {
        Self { repo, client, projects, upload }
    }

    /// With `id`, true only when a different source already holds `name`.
    pub async fn is_exist(&self, name: &str, id: Option<i64>, project_id: i64) -> Result<bool, ServiceError> {
        let found = self.repo.find_id_by_name(project_id, name).await?;
        Ok(match (id, found) {
            (Some(id), Some(existing)) => id != existing,
            (_, found) => found.is_some_and(|existing| existing > 0),
        })
    }

    async fn load(&self, id: i64, missing: &str) -> Result<source::Model, ServiceError> {
        self.repo.find(id).await?.ok_or_else(|| ServiceError::NotFound(missing.to_string()))
    }

    async fn access(&self, project_id: i64, user: &AuthUser) -> Result<(ProjectDetail, ProjectPermission), ServiceError> {
        let detail = self.projects.get_project_detail(project_id, user, false).await?;
        let permission = self.projects.get_project_permission(&detail, user).await?;
        Ok((detail, permission))
    }

    async fn require(&self, project_id: i64, user: &AuthUser, level: UserPermission, action: &str) -> Result<(), ServiceError> {
        let (_, permission) = self.access(project_id, user).await?;
        if permission.source_permission < level {
            info!(username = %user.username, project_id, "user has no permission to {} source", action);
            return Err(ServiceError::Unauthorized(format!("you have not permission to {action} this source")));
        }
        Ok(())
    }

    /// Hidden source permission blocks non-maintainers.
    fn hidden_from(&self, detail: &ProjectDetail, permission: &ProjectPermission, user: &AuthUser) -> bool {
        !self.projects.is_maintainer(detail, user) && permission.source_permission == UserPermission::Hidden
    }

    async fn check_connection(&self, config: &SourceConfig) -> Result<(), ServiceError> {
        self.client.test_connection(config).await.map_err(|e| {
            warn!(url = %config.url, error = %e, "source connection test failed");
            ServiceError::Source(CONNECTION_FAIL.into())
        })
    }

    pub async fn get_sources(&self, project_id: i64, user: &AuthUser) -> Result<Option<Vec<source::Model>>, ServiceError> {
        let (detail, permission) = match self.access(project_id, user).await {
            Ok(v) => v,
            Err(ServiceError::Unauthorized(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        let sources = self.repo.list_by_project(project_id).await?;
        if !sources.is_empty() && self.hidden_from(&detail, &permission, user) {
            return Ok(None);
        }
        Ok(Some(sources))
    }

    #[instrument(skip(self, create, user), fields(user_id = user.id, project_id = create.project_id))]
    pub async fn create_source(&self, create: SourceCreate, user: &AuthUser) -> Result<source::Model, ServiceError> {
        models::errors::validate_name(&create.name, 255)?;
        self.require(create.project_id, user, UserPermission::Write, "create").await?;

        if self.is_exist(&create.name, None, create.project_id).await? {
            info!(name = %create.name, "the source name is already taken");
            return Err(ServiceError::Conflict("the source name is already taken".into()));
        }
        check_type(&create.source_type)?;
        self.check_connection(&create.config).await?;

        let created = self
            .repo
            .create(NewSource {
                name: create.name,
                description: create.description,
                source_type: create.source_type,
                project_id: create.project_id,
                config: create.config.to_json()?,
                create_by: user.id,
            })
            .await?;

        metrics::record_operation("source", "create");
        info!(
            target: BUSINESS_TARGET,
            source_id = created.id,
            user_id = user.id,
            "source ({}) is created, config: {}",
            created.name,
            redacted_config(&created.config)
        );
        Ok(created)
    }

    #[instrument(skip(self, info, user), fields(user_id = user.id, source_id = info.id))]
    pub async fn update_source(&self, info: SourceInfo, user: &AuthUser) -> Result<source::Model, ServiceError> {
        models::errors::validate_name(&info.name, 255)?;
        let before = self.load(info.id, "this source is not found").await?;
        self.require(before.project_id, user, UserPermission::Write, "update").await?;

        if self.is_exist(&info.name, Some(info.id), before.project_id).await? {
            info!(name = %info.name, "the source name is already taken");
            return Err(ServiceError::Conflict("the source name is already taken".into()));
        }
        check_type(&info.source_type)?;
        self.check_connection(&info.config).await?;

        let updated = self
            .repo
            .update(source::Model {
                name: info.name,
                description: info.description,
                source_type: info.source_type,
                config: info.config.to_json()?,
                update_by: Some(user.id),
                update_time: Some(Utc::now()),
                ..before.clone()
            })
            .await?;
        if let Ok(old) = SourceConfig::parse(&before.config) {
            if old.url != info.config.url || old.username != info.config.username || old.password != info.config.password {
                self.client.release(&old);
            }
        }

        metrics::record_operation("source", "update");
        info!(
            target: BUSINESS_TARGET,
            source_id = updated.id,
            user_id = user.id,
            "source ({}) is updated, origin: ({}, {})",
            updated.name,
            before.name,
            redacted_config(&before.config)
        );
        Ok(updated)
    }

    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn delete_source(&self, id: i64, user: &AuthUser) -> Result<bool, ServiceError> {
        let found = self.load(id, "this source is not found").await?;
        self.require(found.project_id, user, UserPermission::Delete, "delete").await?;

        if self.repo.has_views(id).await? {
            info!(source_id = id, "source is used by views, not deleted");
            return Err(ServiceError::Conflict(
                "There is at least one view using the source, it is can not be deleted".into(),
            ));
        }

        let deleted = self.repo.delete(id).await?;
        if deleted {
            if let Ok(config) = SourceConfig::parse(&found.config) {
                self.client.release(&config);
            }
            metrics::record_operation("source", "delete");
            info!(target: BUSINESS_TARGET, source_id = id, user_id = user.id, "source ({}) is deleted", found.name);
        }
        Ok(deleted)
    }

    pub async fn test_source(&self, test: SourceTest) -> Result<bool, ServiceError> {
        let config = SourceConfig::from(test);
        match self.client.test_connection(&config).await {
            Ok(()) => Ok(true),
            Err(ServiceError::Source(msg)) if !msg.is_empty() => Err(ServiceError::Source(msg)),
            Err(e) => {
                warn!(url = %config.url, error = %e, "source test failed");
                Err(ServiceError::Source(CONNECTION_FAIL.into()))
            }
        }
    }

    /// Check an upload target against the mode before the file is sent.
    pub async fn valid_upload_meta(&self, source_id: i64, meta: &UploadMeta, user: &AuthUser) -> Result<(), ServiceError> {
        let found = self.load(source_id, "source not found").await?;
        self.require(found.project_id, user, UserPermission::Write, "upload to").await?;
        models::errors::validate_name(&meta.table_name, 64)?;
        let config = SourceConfig::parse(&found.config)?;
        self.check_mode(&config, &meta.table_name, meta.mode).await
    }

    async fn check_mode(&self, config: &SourceConfig, table: &str, mode: UploadMode) -> Result<(), ServiceError> {
        if mode == UploadMode::Replace {
            return Ok(());
        }
        let exists = self.client.table_exists(config, table).await?;
        if mode == UploadMode::New && exists {
            return Err(ServiceError::Validation(format!("table {table} is already exist")));
        }
        if mode == UploadMode::Append && !exists {
            return Err(ServiceError::Validation(format!("table {table} is not exist")));
        }
        Ok(())
    }

    #[instrument(skip(self, meta, file, user), fields(user_id = user.id, table = %meta.table_name, file = %file.name))]
    pub async fn data_upload(
        &self,
        source_id: i64,
        meta: UploadMeta,
        file: SourceFile,
        user: &AuthUser,
        file_type: &str,
    ) -> Result<UploadReport, ServiceError> {
        let found = self.load(source_id, "source not found").await?;
        self.require(found.project_id, user, UserPermission::Write, "upload to").await?;

        let file_type: FileType = file_type.parse()?;
        file_type.check_file_name(&file.name)?;
        if file.bytes.is_empty() {
            return Err(ServiceError::Validation("upload file is empty".into()));
        }
        models::errors::validate_name(&meta.table_name, 64)?;

        let config = SourceConfig::parse(&found.config)?;
        if DataType::from_url(&config.url) != Some(DataType::Mysql) {
            return Err(ServiceError::Validation(format!("Unsupported data source: {}", config.url)));
        }

        let started = Instant::now();
        let sheet = tokio::task::spawn_blocking(move || upload::parse(file_type, &file.bytes))
            .await
            .map_err(|e| ServiceError::Validation(format!("file parsing aborted: {e}")))??;
        let primary_keys = upload::split_keys(meta.primary_keys.as_deref(), &sheet.headers)?;
        let index_keys = upload::split_keys(meta.index_keys.as_deref(), &sheet.headers)?;
        let table = meta.table_name.as_str();

        match meta.mode {
            UploadMode::Replace => {
                self.client.execute(&config, &sql::drop_table_if_exists(table)).await?;
                let columns = upload::infer_columns(&sheet);
                self.client.execute(&config, &sql::create_table(table, &columns, &primary_keys, &index_keys)).await?;
            }
            UploadMode::New => {
                self.check_mode(&config, table, UploadMode::New).await?;
                let columns = upload::infer_columns(&sheet);
                self.client.execute(&config, &sql::create_table(table, &columns, &primary_keys, &index_keys)).await?;
            }
            UploadMode::Append => self.check_mode(&config, table, UploadMode::Append).await?,
        }

        let (rows, batches) = upload::insert_rows(
            self.client.clone(),
            &config,
            table,
            sheet,
            self.upload.batch_size,
            self.upload.max_concurrency,
        )
        .await?;

        metrics::record_operation("source", "upload");
        info!(
            target: BUSINESS_TARGET,
            source_id,
            user_id = user.id,
            rows,
            batches,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "data uploaded into table {} of source ({})",
            table,
            found.name
        );
        Ok(UploadReport { table_name: meta.table_name, rows, batches })
    }

    /// Table names of the source; `None` when source permission is hidden.
    pub async fn get_source_tables(&self, id: i64, user: &AuthUser) -> Result<Option<Vec<String>>, ServiceError> {
        let found = self.load(id, "source is not found").await?;
        let (detail, permission) = self.access(found.project_id, user).await?;
        if self.hidden_from(&detail, &permission, user) {
            return Ok(None);
        }
        let config = SourceConfig::parse(&found.config)?;
        Ok(Some(self.client.list_tables(&config).await?))
    }

    pub async fn get_table_columns(&self, id: i64, table_name: &str, user: &AuthUser) -> Result<Option<TableInfo>, ServiceError> {
        if table_name.trim().is_empty() {
            return Err(ServiceError::Validation("table cannot be empty".into()));
        }
        let found = self.load(id, "source is not found").await?;
        let (detail, permission) = self.access(found.project_id, user).await?;
        if self.hidden_from(&detail, &permission, user) {
            return Ok(None);
        }
        let config = SourceConfig::parse(&found.config)?;
        Ok(Some(self.client.table_columns(&config, table_name).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::repository::mock::MockProjectRepository;
    use crate::source::client::mock::MockSourceClient;
    use crate::source::repository::mock::MockSourceRepository;
    use models::rel_user_project::ROLE_MEMBER;

    const OWNER: i64 = 1;
    const READER: i64 = 2;
    const WRITER: i64 = 3;
    const HIDDEN: i64 = 4;
    const OUTSIDER: i64 = 5;

    fn user(id: i64) -> AuthUser {
        AuthUser { id, username: format!("u{id}"), email: format!("u{id}@x.io") }
    }

    fn projects() -> Arc<ProjectService> {
        let repo = MockProjectRepository::default()
            .with_project(1, OWNER, false)
            .with_member(1, READER, ROLE_MEMBER)
            .with_member(1, WRITER, ROLE_MEMBER)
            .with_member(1, HIDDEN, ROLE_MEMBER)
            .with_grant(1, READER, 30, 1, 1)
            .with_grant(1, WRITER, 31, 2, 1);
        Arc::new(ProjectService::new(Arc::new(repo)))
    }

    fn service_with(repo: MockSourceRepository, client: MockSourceClient) -> (SourceService, Arc<MockSourceClient>) {
        let client = Arc::new(client);
        let svc = SourceService::new(
            Arc::new(repo),
            client.clone(),
            projects(),
            UploadSettings { batch_size: 2, max_concurrency: 2 },
        );
        (svc, client)
    }

    fn service() -> (SourceService, Arc<MockSourceClient>) {
        service_with(MockSourceRepository::default(), MockSourceClient::default())
    }

    fn mysql() -> SourceConfig {
        SourceConfig { url: "jdbc:mysql://db:3306/bi".into(), username: "bi".into(), password: "secret".into(), properties: None }
    }

    fn create(name: &str) -> SourceCreate {
        SourceCreate { name: name.into(), description: None, source_type: "jdbc".into(), project_id: 1, config: mysql() }
    }

    fn meta(table: &str, mode: UploadMode) -> UploadMeta {
        UploadMeta { table_name: table.into(), primary_keys: None, index_keys: None, mode }
    }

    fn csv_file() -> SourceFile {
        SourceFile { name: "orders.csv".into(), bytes: b"id,city,amount\n1,Paris,3.5\n2,Rome,4\n3,Oslo,\n".to_vec() }
    }

    #[tokio::test]
    async fn create_checks_permission_name_type_and_connection() {
        let (svc, _) = service();
        let err = svc.create_source(create("s"), &user(READER)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        let s = svc.create_source(create("s"), &user(WRITER)).await.unwrap();
        assert_eq!(s.create_by, WRITER);
        assert_eq!(SourceConfig::parse(&s.config).unwrap(), mysql());

        let err = svc.create_source(create("s"), &user(WRITER)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(m) if m == "the source name is already taken"));

        let mut bad = create("t");
        bad.source_type = "mongo".into();
        let err = svc.create_source(bad, &user(WRITER)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(m) if m == "Invalid source type"));
    }

    #[tokio::test]
    async fn create_fails_when_source_unreachable() {
        let (svc, _) = service_with(MockSourceRepository::default(), MockSourceClient::default().unreachable());
        let err = svc.create_source(create("s"), &user(OWNER)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Source(m) if m == "get source connection fail"));
    }

    #[tokio::test]
    async fn listing_respects_hidden_permission() {
        let (svc, _) = service();
        assert_eq!(svc.get_sources(1, &user(HIDDEN)).await.unwrap(), Some(vec![]));
        svc.create_source(create("s"), &user(OWNER)).await.unwrap();

        assert!(svc.get_sources(1, &user(HIDDEN)).await.unwrap().is_none());
        assert!(svc.get_sources(1, &user(OUTSIDER)).await.unwrap().is_none());
        assert_eq!(svc.get_sources(1, &user(READER)).await.unwrap().map(|v| v.len()), Some(1));
        assert!(matches!(svc.get_sources(9, &user(OWNER)).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_stamps_and_checks_name() {
        let (svc, _) = service();
        let a = svc.create_source(create("a"), &user(OWNER)).await.unwrap();
        svc.create_source(create("b"), &user(OWNER)).await.unwrap();

        let info = |name: &str, id: i64| SourceInfo {
            id,
            name: name.into(),
            description: Some("d".into()),
            source_type: "csv".into(),
            config: mysql(),
        };
        let err = svc.update_source(info("x", 99), &user(OWNER)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(m) if m == "this source is not found"));
        let err = svc.update_source(info("b", a.id), &user(OWNER)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let u = svc.update_source(info("a2", a.id), &user(WRITER)).await.unwrap();
        assert_eq!(u.name, "a2");
        assert_eq!(u.source_type, "csv");
        assert_eq!(u.update_by, Some(WRITER));
        assert_eq!(u.create_by, OWNER);
    }

    #[tokio::test]
    async fn delete_blocked_by_views_and_permission() {
        let (svc, _) = service_with(MockSourceRepository::default().with_view_on(1), MockSourceClient::default());
        let used = svc.create_source(create("used"), &user(OWNER)).await.unwrap();
        let free = svc.create_source(create("free"), &user(OWNER)).await.unwrap();
        assert_eq!(used.id, 1);

        let err = svc.delete_source(used.id, &user(OWNER)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(m) if m.starts_with("There is at least one view")));
        let err = svc.delete_source(free.id, &user(WRITER)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
        assert!(svc.delete_source(free.id, &user(OWNER)).await.unwrap());
        assert!(matches!(svc.delete_source(free.id, &user(OWNER)).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_source_reports_failure() {
        let (ok, _) = service();
        let t = || SourceTest { url: "jdbc:mysql://db/bi".into(), username: "u".into(), password: "p".into() };
        assert!(ok.test_source(t()).await.unwrap());
        let (down, _) = service_with(MockSourceRepository::default(), MockSourceClient::default().unreachable());
        assert!(matches!(down.test_source(t()).await, Err(ServiceError::Source(_))));
    }

    #[tokio::test]
    async fn upload_meta_checks_mode_against_table() {
        let (svc, _) = service_with(MockSourceRepository::default(), MockSourceClient::default().with_table("orders"));
        let s = svc.create_source(create("s"), &user(OWNER)).await.unwrap();

        let err = svc.valid_upload_meta(s.id, &meta("orders", UploadMode::New), &user(WRITER)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(m) if m == "table orders is already exist"));
        let err = svc.valid_upload_meta(s.id, &meta("fresh", UploadMode::Append), &user(WRITER)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(m) if m == "table fresh is not exist"));
        svc.valid_upload_meta(s.id, &meta("orders", UploadMode::Replace), &user(WRITER)).await.unwrap();
        svc.valid_upload_meta(s.id, &meta("orders", UploadMode::Append), &user(WRITER)).await.unwrap();

        let err = svc.valid_upload_meta(s.id, &meta("orders", UploadMode::Append), &user(READER)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
        let err = svc.valid_upload_meta(77, &meta("orders", UploadMode::Append), &user(OWNER)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(m) if m == "source not found"));
    }

    #[tokio::test]
    async fn upload_new_table_creates_and_inserts_in_pages() {
        let (svc, client) = service();
        let s = svc.create_source(create("s"), &user(OWNER)).await.unwrap();
        let mut m = meta("orders", UploadMode::New);
        m.primary_keys = Some("id".into());
        m.index_keys = Some("city".into());

        let report = svc.data_upload(s.id, m, csv_file(), &user(WRITER), "csv").await.unwrap();
        assert_eq!(report, UploadReport { table_name: "orders".into(), rows: 3, batches: 2 });
        assert_eq!(client.inserted_rows("orders"), 3);

        let ddl = client.executed();
        assert_eq!(ddl.len(), 1);
        assert!(ddl[0].starts_with("CREATE TABLE `orders` (`id` BIGINT NOT NULL, `city` VARCHAR(255) NULL, `amount` DOUBLE NULL"));
        assert!(ddl[0].contains("PRIMARY KEY (`id`)"));
        assert!(ddl[0].contains("KEY `idx_city` (`city`)"));

        // the table exists now, a second NEW upload is refused
        let err = svc.data_upload(s.id, meta("orders", UploadMode::New), csv_file(), &user(WRITER), "csv").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(m) if m == "table orders is already exist"));
    }

    #[tokio::test]
    async fn upload_replace_drops_first_and_append_needs_table() {
        let (svc, client) = service_with(MockSourceRepository::default(), MockSourceClient::default().with_table("orders"));
        let s = svc.create_source(create("s"), &user(OWNER)).await.unwrap();

        svc.data_upload(s.id, meta("orders", UploadMode::Replace), csv_file(), &user(OWNER), "csv").await.unwrap();
        let ddl = client.executed();
        assert_eq!(ddl[0], "DROP TABLE IF EXISTS `orders`");
        assert!(ddl[1].starts_with("CREATE TABLE `orders`"));

        let report = svc.data_upload(s.id, meta("orders", UploadMode::Append), csv_file(), &user(OWNER), "csv").await.unwrap();
        assert_eq!(report.rows, 3);
        assert_eq!(client.inserted_rows("orders"), 6);

        let err = svc.data_upload(s.id, meta("missing", UploadMode::Append), csv_file(), &user(OWNER), "csv").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(m) if m == "table missing is not exist"));
    }

    #[tokio::test]
    async fn upload_rejects_bad_files() {
        let (svc, _) = service();
        let s = svc.create_source(create("s"), &user(OWNER)).await.unwrap();
        let owner = user(OWNER);
        let replace = || meta("t", UploadMode::Replace);

        let err = svc.data_upload(s.id, replace(), csv_file(), &owner, "pdf").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(m) if m == "Unsupported file format"));
        let err = svc.data_upload(s.id, replace(), csv_file(), &owner, "xlsx").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(m) if m == "Please upload excel file"));
        let empty = SourceFile { name: "e.csv".into(), bytes: vec![] };
        let err = svc.data_upload(s.id, replace(), empty, &owner, "csv").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(m) if m == "upload file is empty"));

        let mut m = meta("t", UploadMode::Replace);
        m.primary_keys = Some("zip".into());
        let err = svc.data_upload(s.id, m, csv_file(), &user(OWNER), "csv").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn upload_needs_mysql_source() {
        let (svc, _) = service();
        let mut c = create("pg");
        c.config.url = "jdbc:postgresql://db:5432/bi".into();
        let s = svc.create_source(c, &user(OWNER)).await.unwrap();
        let err = svc.data_upload(s.id, meta("t", UploadMode::Replace), csv_file(), &user(OWNER), "csv").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(m) if m.starts_with("Unsupported data source")));
    }

    #[tokio::test]
    async fn introspection_hidden_from_members_without_source_permission() {
        let (svc, _) = service_with(MockSourceRepository::default(), MockSourceClient::default().with_table("orders"));
        let s = svc.create_source(create("s"), &user(OWNER)).await.unwrap();

        assert!(svc.get_source_tables(s.id, &user(HIDDEN)).await.unwrap().is_none());
        assert_eq!(svc.get_source_tables(s.id, &user(READER)).await.unwrap(), Some(vec!["orders".to_string()]));
        let err = svc.get_source_tables(99, &user(OWNER)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(m) if m == "source is not found"));
        assert!(matches!(svc.get_source_tables(s.id, &user(OUTSIDER)).await, Err(ServiceError::Unauthorized(_))));

        let info = svc.get_table_columns(s.id, "orders", &user(OWNER)).await.unwrap().unwrap();
        assert_eq!(info.primary_keys, vec!["id"]);
        assert!(svc.get_table_columns(s.id, "orders", &user(HIDDEN)).await.unwrap().is_none());
        assert!(matches!(svc.get_table_columns(s.id, " ", &user(OWNER)).await, Err(ServiceError::Validation(_))));
    }
}
