//! HTTP transport — SPEC_FULL.md §4.11, spec.md §6's "HTTP endpoint".
//!
//! A single route accepting `GET` and `HEAD`; everything else falls
//! through to axum's default `404`. The raw query string is parsed by
//! hand rather than through axum's `Query<T>` extractor, which silently
//! drops malformed or duplicate pairs — this endpoint needs the exact
//! validation and first-occurrence-wins semantics the aggregator expects.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{on, MethodFilter};
use axum::Router;

use rscheck_core::{Aggregator, QueryArgs, Status};

use crate::config::HttpConfig;

const SERVER_HEADER: &str = concat!("RSCheck/", env!("CARGO_PKG_VERSION"));

pub struct AppState {
    pub aggregator: Aggregator,
    pub http: HttpConfig,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(&state.http.location, on(MethodFilter::GET | MethodFilter::HEAD, handler))
        .with_state(state)
}

async fn handler(State(state): State<Arc<AppState>>, req: Request<Body>) -> Response {
    let method = req.method().clone();
    let raw_query = req.uri().query().unwrap_or("").to_string();

    let pairs = match rscheck_core::aggregator::parse_pairs(&raw_query) {
        Ok(pairs) => pairs,
        Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    };
    let args = QueryArgs::from_pairs(&pairs);

    let query_outcome = state
        .aggregator
        .run_query(&raw_query, &args, state.http.query_timeout, state.http.error_message)
        .await;

    let (status, message) = state.aggregator.snapshot(Some(&query_outcome), &args.exclude).await;

    build_response(&method, status, &message, &state.http)
}

fn build_response(method: &Method, status: Status, message: &str, http: &HttpConfig) -> Response {
    let is_head = *method == Method::HEAD;
    let body_text = if is_head { String::new() } else { message.to_string() };
    let http_status = if is_head {
        if status.is_ok() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        }
    } else {
        StatusCode::OK
    };

    let mut builder = Response::builder()
        .status(http_status)
        .header("Content-Type", "text/html; charset=utf-8")
        .header("Server", SERVER_HEADER);

    builder = if http.keep_alive {
        builder.header("Content-Length", body_text.len().to_string())
    } else {
        builder.header("Connection", "close")
    };

    builder.body(Body::from(body_text)).expect("response is well-formed")
}
