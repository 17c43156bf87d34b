use axum::{Form, extract::State, response::Response};
use serde::Deserialize;

use crate::conversation;
use crate::error::AppResult;
use crate::models::AppState;
use crate::routes::{CurrentSession, back_to};
use crate::session::Tab;

#[derive(Debug, Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub tab: Tab,
}

/// Send a follow-up message about the current recipe.
///
/// # Errors
///
/// Returns an error only if the chat task panicked.
pub async fn send(
    State(state): State<AppState>,
    session: CurrentSession,
    Form(form): Form<ChatForm>,
) -> AppResult<Response> {
    let task = conversation::send_chat(session.handle.clone(), form.message, state.llm.clone());
    let outcome = tokio::spawn(task).await?;
    tracing::info!(?outcome, "chat message handled");

    Ok(session.respond(back_to(form.tab)))
}
