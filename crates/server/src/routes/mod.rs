use std::path::Path;

use axum::{
    routing::{get, post},
    Router,
};
use shared::api::{Exercise, Object};
use tower_http::{
    limit::RequestBodyLimitLayer,
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::AppState;

pub mod exercise;

mod ping;
pub use ping::*;

const BODY_MAX_BYTES: usize = 16 * 1024;

/// The whole app. `/` serves the assets dir's index.html, any path without a
/// route falls through to the other static files
pub fn router(state: AppState, assets_dir: &Path) -> Router {
    Router::new()
        .route(Object::Ping.path(), get(ping))
        .route(Exercise::Log.path(), get(exercise::exercise_log))
        .route(Exercise::NewUser.path(), post(exercise::new_user))
        .route(Exercise::Add.path(), post(exercise::add_exercise))
        .route_service("/", ServeFile::new(assets_dir.join("index.html")))
        .fallback_service(ServeDir::new(assets_dir))
        .layer(RequestBodyLimitLayer::new(BODY_MAX_BYTES))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
