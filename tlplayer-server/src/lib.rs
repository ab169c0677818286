//! HTTP boundary for the media player: JSON search routes plus the static
//! browser client.
use anyhow::Result;
use axum::Router;
use axum::routing::get;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tlplayer_config::TwitterConfig;
use tlplayer_http::HttpClient;
use tlplayer_social::twitter::{CredentialProvider, MediaFeed, RateLimitGate, TwitterApi};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod routes;

pub use error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct AppState {
    pub feed: Arc<MediaFeed>,
}

impl AppState {
    pub fn new(feed: MediaFeed) -> Self {
        Self {
            feed: Arc::new(feed),
        }
    }

    /// Wire the upstream client from configuration. The credential provider and the
    /// rate-limit gate are created here once and shared by handle.
    pub fn from_config(cfg: &TwitterConfig) -> Result<Self> {
        let http = HttpClient::new(&api_base(&cfg.base_url))?;
        let credentials = Arc::new(CredentialProvider::from_secret_file(
            cfg.secrets_path.clone(),
            http.clone(),
        ));
        let gate = Arc::new(RateLimitGate::new());
        let api = TwitterApi::new(http, credentials, gate);

        tracing::info!(
            base_url = %cfg.base_url,
            secrets = %cfg.secrets_path.display(),
            page_size = cfg.page_size,
            max_attempts = cfg.max_attempts,
            "server.state.ready"
        );
        Ok(Self::new(
            MediaFeed::new(Arc::new(api))
                .with_page_size(cfg.page_size)
                .with_max_attempts(cfg.max_attempts),
        ))
    }
}

/// Endpoint paths are joined onto the base, so it must end in `/` to keep any
/// path prefix.
fn api_base(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    }
}

pub fn router(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/healthz", get(routes::healthz))
        .route("/api/search", get(routes::search))
        .route("/api/search-newer", get(routes::search_newer))
        .fallback_service(ServeDir::new(static_dir.as_ref()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(addr: SocketAddr, router: Router) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown requested");
    }
}
