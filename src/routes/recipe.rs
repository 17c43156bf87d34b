use axum::{
    extract::{Path, State},
    response::Response,
};

use crate::conversation;
use crate::error::AppResult;
use crate::models::AppState;
use crate::routes::{CurrentSession, back_to};
use crate::session::Tab;

/// "Make me a recipe" for the photo acquired on `tab`.
///
/// The completion call runs to the end even if the browser goes away.
///
/// # Errors
///
/// Returns an error only if the analysis task panicked.
pub async fn create(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(tab): Path<Tab>,
) -> AppResult<Response> {
    let task = conversation::create_recipe(session.handle.clone(), tab, state.llm.clone());
    let outcome = tokio::spawn(task).await?;
    tracing::info!(%tab, ?outcome, "recipe requested");

    Ok(session.respond(back_to(tab)))
}
