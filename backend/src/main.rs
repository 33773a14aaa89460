use axum::{
    http::{Method, header},
    routing::get,
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod database;
mod error;
mod handlers;
mod middleware;
mod services;
mod validation;

use services::{ExportService, OpportunityStore, ReportService};

#[cfg(test)]
mod tests;

pub struct AppState {
    pub store: Arc<dyn OpportunityStore>,
    pub exports: ExportService,
}

impl AppState {
    pub fn new(store: Arc<dyn OpportunityStore>, export_concurrency: usize) -> Self {
        let exports = ExportService::new(store.clone(), export_concurrency);
        Self { store, exports }
    }
}

/// API, health and (when given) the built dashboard client as SPA fallback.
pub fn build_router(state: Arc<AppState>, static_dir: Option<&Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    let mut app = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/health/detailed", get(middleware::detailed_health_check))
        .nest("/api", handlers::api_routes())
        .with_state(state);

    if let Some(dir) = static_dir {
        app = app.fallback_service(
            ServeDir::new(dir).not_found_service(ServeFile::new(dir.join("index.html"))),
        );
    }

    app.layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn(middleware::request_id))
            .layer(TraceLayer::new_for_http().make_span_with(middleware::make_span))
            .layer(cors),
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from_env()?;
    let db_pool = database::create_pool(&config.database_url, &config.pool).await?;

    if config.run_migrations {
        database::migrate(&db_pool).await?;
    }

    let store: Arc<dyn OpportunityStore> = Arc::new(ReportService::new(db_pool));
    let app_state = Arc::new(AppState::new(store, config.export_concurrency));

    let static_dir = config.static_dir.is_dir().then_some(config.static_dir.as_path());
    if static_dir.is_none() {
        tracing::warn!(dir = %config.static_dir.display(), "static directory missing, dashboard client not served");
    }
    let app = build_router(app_state, static_dir);

    let listener = tokio::net::TcpListener::bind(&config.server_addr).await?;
    tracing::info!("Server running on {}", config.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
