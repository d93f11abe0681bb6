use crate::gateway::{Envelope, Gateway};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, Method, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the router serving the gateway endpoint
pub fn create_router(gateway: Arc<Gateway>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/git", post(git_handler))
        .route("/", post(git_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(gateway)
}

async fn git_handler(
    State(gateway): State<Arc<Gateway>>,
    body: Result<Json<Value>, JsonRejection>,
) -> (StatusCode, Json<Envelope>) {
    match body {
        Ok(Json(body)) => (StatusCode::OK, Json(gateway.handle(body).await)),
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "malformed request body");
            (
                StatusCode::BAD_REQUEST,
                Json(Envelope::failure(format!(
                    "Invalid JSON body: {}",
                    rejection.body_text()
                ))),
            )
        }
    }
}

/// Resolves on Ctrl+C (and SIGTERM on unix)
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
