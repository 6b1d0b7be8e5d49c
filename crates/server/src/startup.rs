use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use dotenvy::dotenv;
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use tracing::info;

use configs::AppConfig;
use migration::MigratorTrait;
use service::auth::{repo::seaorm::SeaOrmAuthRepository, service::AuthService};
use service::portal::{repo::seaorm::SeaOrmPortalRepository, DashboardPortalService};
use service::project::{repo::seaorm::SeaOrmProjectRepository, ProjectService};
use service::source::{client::SeaOrmSourceClient, repo::seaorm::SeaOrmSourceRepository, SourceService};

use crate::errors::StartupError;
use crate::routes::{self, auth::ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address: {e}")))
}

/// Wire SeaORM repositories and services over one connection pool.
pub fn build_state(db: DatabaseConnection, cfg: &AppConfig) -> ServerState {
    let projects = Arc::new(ProjectService::new(Arc::new(SeaOrmProjectRepository { db: db.clone() })));
    let auth = Arc::new(AuthService::new(Arc::new(SeaOrmAuthRepository { db: db.clone() }), (&cfg.auth).into()));
    let portals = Arc::new(DashboardPortalService::new(
        Arc::new(SeaOrmPortalRepository { db: db.clone() }),
        projects.clone(),
    ));
    let sources = Arc::new(SourceService::new(
        Arc::new(SeaOrmSourceRepository { db }),
        Arc::new(SeaOrmSourceClient::new(&cfg.source)),
        projects.clone(),
        (&cfg.upload).into(),
    ));
    ServerState { auth, projects, portals, sources, max_file_bytes: cfg.upload.max_file_bytes }
}

/// Public entry: load config, migrate, build the app and serve until Ctrl+C.
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    let cfg = AppConfig::load_and_validate().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;

    let db = models::db::connect_with_config(&models::db::DatabaseConfig::from(&cfg.database)).await?;
    models::db::test_connection(&db)
        .await
        .map_err(|e| StartupError::Runtime(format!("database not reachable: {e}")))?;
    migration::Migrator::up(&db, None).await?;
    info!("database migrated");

    let app: Router = routes::build_router(build_state(db, &cfg), build_cors());

    let addr = bind_addr(&cfg)?;
    info!(%addr, "starting dashboard hub server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;
    Ok(())
}
