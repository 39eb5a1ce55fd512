use std::sync::Arc;

use axum::extract::{Query, Request, State};
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::Method;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use contracts::{
    ApiError, ChangeLogEntry, ControlAck, ErrorCode, Facility, SimStatusResponse,
    MSG_FAST_FORWARD, MSG_RESET_COMPLETE, MSG_SIMULATION_PAUSED, MSG_SIMULATION_RUNNING,
    MSG_SINGLE_TICK, SCHEMA_VERSION_V1,
};
use serde::{Deserialize, Serialize};
use sim_core::{Clock, SimController};
use tokio::net::TcpListener;

use crate::executor::store_stamp;
use crate::persistence::PersistenceError;
use crate::scheduler::SharedStore;

const DEFAULT_LOG_LIMIT: usize = 50;
const MAX_LOG_LIMIT: usize = 500;
const ROOT_BANNER: &str = "Carpark Simulation Engine is running.";

include!("error.rs");
include!("state.rs");
include!("routes/control.rs");
include!("routes/query.rs");
include!("util.rs");

/// Serves the control API until `shutdown` resolves.
pub async fn serve_control_api(
    listener: TcpListener,
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let app = router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/sim/status", get(get_status))
        .route("/sim/start", post(start_sim))
        .route("/sim/pause", post(pause_sim))
        .route("/sim/tick", post(tick_sim))
        .route("/sim/fastforward", post(fast_forward_sim))
        .route("/sim/reset", post(reset_sim))
        .route("/sim/facilities", get(list_facilities))
        .route("/sim/log", get(get_log))
        .layer(middleware::from_fn(cors_middleware))
        .with_state(state)
}

async fn cors_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = Response::new(axum::body::Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}

#[cfg(test)]
mod tests;
