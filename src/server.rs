//! Auto-refreshing web view.
//!
//! GET /               page shell (polls the API on the refresh interval)
//! GET /api/dashboard  one refresh cycle, as JSON

use crate::config::DashboardConfig;
use crate::error::Error;
use crate::query::PinotConnector;
use crate::render;
use crate::view::{self, Dashboard};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
struct AppState {
    connector: Arc<PinotConnector>,
    config: Arc<DashboardConfig>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

pub async fn serve(
    addr: SocketAddr,
    connector: PinotConnector,
    config: DashboardConfig,
) -> anyhow::Result<()> {
    let state = AppState {
        connector: Arc::new(connector),
        config: Arc::new(config),
    };
    let app = Router::new()
        .route("/", get(index))
        .route("/api/dashboard", get(dashboard))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "serving dashboard");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index(State(state): State<AppState>) -> Response {
    match render::render_live_page(&state.config.page) {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            error!(error = %err, "failed to render page");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}

/// A failed cycle answers 502; the page keeps its last panels.
async fn dashboard(
    State(state): State<AppState>,
) -> Result<Json<Dashboard>, (StatusCode, Json<ErrorBody>)> {
    view::refresh(state.connector.as_ref(), &state.config)
        .await
        .map(Json)
        .map_err(|err| {
            let upstream_down =
                matches!(&err, Error::Query { source, .. } if source.is_connectivity());
            error!(error = %err, upstream_down, "refresh cycle failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorBody {
                    error: err.to_string(),
                }),
            )
        })
}
