//! JSON HTTP interface: health check and monitor management.

pub mod error;
pub mod handlers;

use crate::core::service::MonitorService;
use crate::utils::error::{Result, SitePulseError};
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// `monitors` is `None` when the store could not be opened; monitor routes then answer 503.
#[derive(Clone, Default)]
pub struct AppState {
    pub monitors: Option<MonitorService>,
}

impl AppState {
    pub fn new(monitors: MonitorService) -> Self {
        Self {
            monitors: Some(monitors),
        }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    pub(crate) fn service(&self) -> std::result::Result<&MonitorService, ApiError> {
        self.monitors
            .as_ref()
            .ok_or_else(|| {
                ApiError::from_error(SitePulseError::StoreUnavailable, error::DATABASE_UNAVAILABLE)
            })
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health_check))
        .route(
            "/monitors",
            post(handlers::add_monitor).get(handlers::list_monitors),
        )
        .route(
            "/monitors/{monitor_id}",
            get(handlers::get_monitor).delete(handlers::delete_monitor),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!("🚀 SitePulse API listening on http://{}", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}
