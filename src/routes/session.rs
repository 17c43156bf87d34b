use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};

use crate::models::AppState;
use crate::routes::{TabQuery, back_to};
use crate::session::{Session, expired_session_cookie, session_id_from_headers};

/// JSON view of the caller's session.
///
/// Read-only: a caller without a live session sees an empty one and no
/// session is created for it.
pub async fn show(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let handle = match session_id_from_headers(&headers) {
        Some(id) => state.sessions.get(id).await,
        None => None,
    };
    let snapshot = match handle {
        Some(handle) => handle.lock().await.snapshot(),
        None => Session::default().snapshot(),
    };
    Json(snapshot).into_response()
}

/// End the session. The next visit starts from an empty one.
pub async fn reset(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<TabQuery>,
) -> Response {
    if let Some(id) = session_id_from_headers(&headers) {
        state.sessions.remove(id).await;
    }
    let mut res = back_to(q.tab).into_response();
    res.headers_mut()
        .insert(header::SET_COOKIE, expired_session_cookie());
    res
}
