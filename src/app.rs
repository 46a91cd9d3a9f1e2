use crate::state;

use axum::Router;
use axum::routing::get;
use axum::routing::post;

mod notify;
mod push;

pub fn app(state: state::AppState) -> Router {
    Router::new()
        .route("/api/push/public-key", get(push::push_public_key))
        .route("/api/push/test", post(push::push_test))
        .route("/api/notify", post(notify::notify))
        .route("/health", get(health))
        .with_state(state)
}

pub(crate) async fn health() -> &'static str {
    "ok"
}
