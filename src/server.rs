//! HTTP interface
//!
//! Exposes [`fetch_ratings`] as a small JSON endpoint. `GET /?title=...` and
//! `POST /` with `{"title": "..."}` both return the season list; scraping
//! failures come back as `400` with the error message as a JSON string.
//! Every response carries permissive cross-origin headers so browser front
//! ends can call the endpoint directly.

use crate::config::ScraperConfig;
use crate::session::PageFetcher;
use crate::{RatingsError, fetch_ratings};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderName, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Headers attached to every response.
///
/// Sent unconditionally, also without an `Origin` request header, which
/// `tower_http::cors::CorsLayer` would not do.
const RESPONSE_HEADERS: [(HeaderName, &str); 4] = [
    (header::CONTENT_TYPE, "application/json"),
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "OPTIONS,POST,GET"),
];

/// Shared state of the HTTP interface
#[derive(Clone)]
pub struct AppState {
    fetcher: Arc<dyn PageFetcher + Send + Sync>,
    config: Arc<ScraperConfig>,
}

impl AppState {
    /// Creates the state from a shared fetcher, usually a [`crate::Session`]
    pub fn new(fetcher: Arc<dyn PageFetcher + Send + Sync>, config: ScraperConfig) -> Self {
        Self {
            fetcher,
            config: Arc::new(config),
        }
    }
}

/// Request payload: the series title
#[derive(Debug, Deserialize)]
struct TitleRequest {
    title: String,
}

/// Builds the router serving the ratings endpoint at `/`
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            get(get_ratings).post(post_ratings).options(preflight),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `addr` and serves until the process is stopped
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Serving episode ratings on {}", addr);
    axum::serve(listener, create_router(state)).await
}

async fn preflight() -> Response {
    (StatusCode::OK, RESPONSE_HEADERS).into_response()
}

async fn get_ratings(
    State(state): State<AppState>,
    query: Result<Query<TitleRequest>, QueryRejection>,
) -> Response {
    match query {
        Ok(Query(request)) => ratings_response(state, request.title).await,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Rejected GET without title");
            bad_request("Missing 'title' query parameter")
        }
    }
}

async fn post_ratings(State(state): State<AppState>, body: Bytes) -> Response {
    // Clients do not reliably send a JSON content type, so the body is parsed by hand
    match serde_json::from_slice::<TitleRequest>(&body) {
        Ok(request) => ratings_response(state, request.title).await,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected POST body");
            bad_request("Request body must be a JSON object with a 'title' field")
        }
    }
}

/// Runs the blocking pipeline off the async workers and turns the outcome into a response
async fn ratings_response(state: AppState, title: String) -> Response {
    let AppState { fetcher, config } = state;
    tracing::info!(%title, "Fetching ratings");

    let outcome = tokio::task::spawn_blocking(move || {
        fetch_ratings(fetcher.as_ref(), &config, &title, |_| {})
    })
    .await;

    match outcome {
        Ok(Ok(ratings)) => {
            tracing::debug!(seasons = ratings.len(), "Ratings fetched");
            (StatusCode::OK, RESPONSE_HEADERS, Json(ratings)).into_response()
        }
        Ok(Err(error)) => failure_response(&error),
        Err(join_error) => {
            tracing::error!(error = %join_error, "Scraping task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                RESPONSE_HEADERS,
                Json("Internal server error"),
            )
                .into_response()
        }
    }
}

fn failure_response(error: &RatingsError) -> Response {
    tracing::error!(error = %error, "Fetching ratings failed");
    bad_request(&error.to_string())
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, RESPONSE_HEADERS, Json(message)).into_response()
}
