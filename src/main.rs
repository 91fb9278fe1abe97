//! Symptom survey service
//!
//! Runs a multi-step symptom questionnaire per respondent, scores it,
//! recommends a specialist and keeps a durable log of completed reports.

mod api;
mod assessment;
mod catalog;
mod config;
mod db;
mod report;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use catalog::Catalog;
use config::SurveyConfig;
use db::ReportStore;
use runtime::{LogNotifier, SessionManager};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "symptom_survey=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = SurveyConfig::from_env()?;

    let catalog = match &config.catalog_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading catalog");
            Catalog::from_json_file(path)?
        }
        None => Catalog::builtin(),
    };
    tracing::info!(categories = ?catalog.list_categories(), "Catalog ready");

    // Initialize report store
    tracing::info!(path = %config.db_path.display(), "Opening report store");
    let store = ReportStore::open(&config.db_path)?;
    tracing::info!(reports = store.count()?, "Report store ready");

    if config.admin_id.is_none() {
        tracing::warn!("SURVEY_ADMIN_ID not set; report export is disabled");
    }

    let sessions = SessionManager::new(
        Arc::new(catalog),
        Arc::new(store),
        Arc::new(LogNotifier::new(config.export_path.clone())),
    )
    .with_admin(config.admin_id.clone());

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(AppState::new(sessions))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Symptom survey server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
