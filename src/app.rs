use crate::{
    image_io::MAX_IMAGE_BYTES,
    logging::{access_log, log_payloads},
    models::AppState,
    routes::{chat, images, page, recipe, session},
};

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::{Json, Router};

use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

async fn healthz() -> Json<&'static str> {
    Json("ok")
}

pub fn build_app(state: AppState) -> Router {
    // Request-ID middleware is the outermost layer so the loggers
    // below it see the x-request-id header.
    let request_id_layer = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id());

    // Oversized photos still reach the handler so they can be refused with a notice.
    let upload_limit = DefaultBodyLimit::max(2 * MAX_IMAGE_BYTES);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/", get(page::index))
        .route("/images/{tab}", post(images::upload).layer(upload_limit))
        .route("/recipe/{tab}", post(recipe::create))
        .route("/chat", post(chat::send))
        .route("/session", get(session::show))
        .route("/session/reset", post(session::reset))
        .with_state(state)
        .layer(from_fn(log_payloads))
        .layer(from_fn(access_log))
        .layer(request_id_layer)
}
