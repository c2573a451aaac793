mod content;
mod error;
mod generate;
mod upload;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use postcraft::{ai::AiClient, config::AppConfig, store::Store};
use std::{path::Path, sync::Arc};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
pub struct AppState {
    pub ai: Arc<AiClient>,
    pub store: Store,
    pub upload_limit: usize,
}

/// Request bodies may carry a base64 copy of an upload, so they get headroom over the raw limit.
fn body_limit(upload_limit: usize) -> usize {
    upload_limit / 3 * 4 + 1024 * 1024
}

pub fn router(state: AppState, static_dir: Option<&Path>) -> Router {
    let mut app = Router::new()
        .route("/api/generate/captions", post(generate::generate_captions))
        .route("/api/generate/bio", post(generate::generate_bio))
        .route("/api/generate/hashtags", post(generate::generate_hashtags))
        .route("/api/upload", post(upload::upload_image))
        .route("/api/grid", post(upload::convert_grid))
        .route("/api/content/item/{id}", get(content::get_content))
        // `{key}` is a content type for GET and a record id for DELETE.
        .route(
            "/api/content/{key}",
            get(content::list_content).delete(content::delete_content),
        );

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(DefaultBodyLimit::max(body_limit(state.upload_limit)))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    if config.ai.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; generation requests will fail");
    }

    let store = Store::connect(config.database_url.as_deref()).await?;
    let ai = AiClient::new(config.ai.clone())?;

    let state = AppState {
        ai: Arc::new(ai),
        store,
        upload_limit: config.upload_limit,
    };
    let app = router(state, config.static_dir.as_deref());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "serving");
    axum::serve(listener, app).await?;

    Ok(())
}
