//! matriculas-dr - dashboard data review service
//!
//! Serves the nine remote datasets through the two-tier cache, with
//! cross-reference lookup by matricula and CICA/reconocedores analytics.

use anyhow::Result;
use clap::Parser;
use matriculas_common::cache::{MemoryStore, SqliteStore, TieredCache};
use matriculas_common::config::{resolve_root_folder, DashboardConfig};
use matriculas_common::db::{init_database, DATABASE_FILE_NAME};
use matriculas_common::source::HttpDataSource;
use matriculas_common::users::SqliteUserRepository;
use matriculas_common::DatasetGateway;
use matriculas_dr::{build_router, is_loopback_bind, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "matriculas-dr", version, about = "Matriculas dashboard review service")]
struct Args {
    /// Folder holding matriculas.db (overrides MATRICULAS_ROOT and config)
    #[arg(long)]
    root_folder: Option<String>,

    /// Config file (default: platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address (overrides config)
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting matriculas-dr v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let config = DashboardConfig::load_or_default(args.config.as_deref())?;

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &config);
    let db_path = root_folder.join(DATABASE_FILE_NAME);
    info!("Database path: {}", db_path.display());

    let pool = match init_database(&db_path).await {
        Ok(pool) => {
            info!("✓ Connected to database");
            pool
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    let users = SqliteUserRepository::new(pool.clone());
    match &config.root_user {
        Some(root) => users.seed_root(&root.email, &root.password).await?,
        None => warn!("No root_user configured; only viewer accounts can self-register"),
    }

    let cache = TieredCache::new(
        Arc::new(MemoryStore::with_limit(config.capped_tier_limit_bytes)),
        Arc::new(SqliteStore::new(pool)),
    );
    let source = HttpDataSource::from_config(&config)?;
    info!("Remote data source: {}", config.base_url);

    let gateway = DatasetGateway::new(cache, Arc::new(source));
    let state = AppState::new(Arc::new(gateway), Arc::new(users));
    let app = build_router(state);

    let bind = args.bind.unwrap_or(config.bind);
    if !is_loopback_bind(&bind) {
        warn!(
            "Binding to {}: x-user-email is trusted as-is, only expose this address to the session proxy",
            bind
        );
    }
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("matriculas-dr listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app).await?;

    Ok(())
}
