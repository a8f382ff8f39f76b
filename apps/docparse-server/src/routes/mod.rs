//! Route modules for Docparse Server

pub mod health;
pub mod parse;

use axum::Router;
use tower_http::compression::predicate::{DefaultPredicate, Predicate, SizeAbove};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Responses smaller than this go out uncompressed
pub const MIN_COMPRESS_BYTES: u16 = 1000;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let max_upload_bytes = state.config().server.max_upload_bytes;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .compress_when(DefaultPredicate::new().and(SizeAbove::new(MIN_COMPRESS_BYTES)));

    Router::new()
        .merge(health::router())
        .merge(parse::router(max_upload_bytes))
        .layer(compression)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
