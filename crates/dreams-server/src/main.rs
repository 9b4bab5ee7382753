mod config;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use dreams_api::{AppStateInner, router};
use dreams_db::{Database, JsonFileRepository, SqliteRepository};

use crate::config::{Config, StoreKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "dreams=debug,dreams_api=debug,dreams_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    let db = match config.store {
        StoreKind::Json => Database::open(JsonFileRepository::new(&config.data_path))?,
        StoreKind::Sqlite => Database::open(SqliteRepository::open(&config.data_path)?)?,
        StoreKind::Memory => Database::in_memory(),
    };
    info!("Using {:?} store at {}", config.store, config.data_path.display());

    let app = router(AppStateInner::new(db, &config.jwt_secret))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("Dreams server listening on {}", config.addr);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
