//! Read-only HTTP API over the last published snapshot.
//!
//! # Data Flow
//! ```text
//! supervisor → mpsc → store::consume → SnapshotStore (ArcSwap)
//!                                          ↓
//! GET /api/status, /api/rawdata → auth.rs → handlers.rs
//! ```
//!
//! # Design Decisions
//! - Handlers never block the publisher: reads are lock-free loads
//! - No key configured means no authentication

pub mod auth;
pub mod handlers;
pub mod store;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::lifecycle::ShutdownSignal;

use self::auth::api_auth_middleware;
use self::handlers::{get_rawdata, get_status};

pub use self::store::{consume, SnapshotStore};

/// State injected into API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<SnapshotStore>,
    pub api_key: Arc<str>,
}

impl ApiState {
    pub fn new(store: Arc<SnapshotStore>, api_key: &str) -> Self {
        Self {
            store,
            api_key: Arc::from(api_key),
        }
    }
}

pub fn setup_api_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/status", get(get_status))
        .route("/api/rawdata", get(get_rawdata))
        .layer(middleware::from_fn_with_state(state.clone(), api_auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API until shutdown.
pub async fn serve(
    listener: TcpListener,
    state: ApiState,
    mut shutdown: ShutdownSignal,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "API server starting");

    axum::serve(listener, setup_api_router(state))
        .with_graceful_shutdown(async move { shutdown.recv().await })
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::{Configuration, Message, Snapshot};
    use crate::api::handlers::ProviderStatus;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    fn request(path: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn published() -> Message {
        let mut snapshot = Snapshot::default();
        snapshot.instances.insert(
            "web".into(),
            Configuration {
                enable: true,
                ..Default::default()
            },
        );
        Message {
            provider_name: "lxd".into(),
            snapshot,
        }
    }

    #[tokio::test]
    async fn test_rawdata_not_found_before_first_snapshot() {
        let app = setup_api_router(ApiState::new(Arc::new(SnapshotStore::new()), ""));
        let response = app.oneshot(request("/api/rawdata", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_rawdata_returns_latest_message() {
        let store = Arc::new(SnapshotStore::new());
        store.update(published());
        let app = setup_api_router(ApiState::new(store, ""));

        let response = app.oneshot(request("/api/rawdata", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let message: Message = serde_json::from_slice(&body).unwrap();
        assert_eq!(message, published());
    }

    #[tokio::test]
    async fn test_status_counts_snapshots() {
        let store = Arc::new(SnapshotStore::new());
        store.update(published());
        store.update(published());
        let app = setup_api_router(ApiState::new(store, ""));

        let response = app.oneshot(request("/api/status", None)).await.unwrap();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let status: ProviderStatus = serde_json::from_slice(&body).unwrap();

        assert_eq!(status.provider, "lxd");
        assert_eq!(status.snapshots_received, 2);
        assert_eq!(status.instances, 1);
        assert!(status.last_update.is_some());
    }

    #[tokio::test]
    async fn test_api_key_required_when_configured() {
        let state = ApiState::new(Arc::new(SnapshotStore::new()), "s3cret");

        let response = setup_api_router(state.clone())
            .oneshot(request("/api/status", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = setup_api_router(state.clone())
            .oneshot(request("/api/status", Some("wrong")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = setup_api_router(state)
            .oneshot(request("/api/status", Some("s3cret")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
