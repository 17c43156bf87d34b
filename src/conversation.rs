//! Actions a user can take on their session.
//!
//! The session lock is held only while reading or mutating state, never across
//! a completion call. Phases mark an action as in flight so a second trigger on
//! the same session is turned away instead of overlapping the first.

use crate::image_io::{AcquireError, AcquiredImage};
use crate::llm::LlmClient;
use crate::session::{AnalysisPhase, ChatPhase, SessionHandle, Tab};

const BUSY_RECIPE: &str = "Still working on your recipe, hang tight.";
const BUSY_CHAT: &str = "Still waiting for the previous answer.";

#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum ActionOutcome {
    /// Nothing to do (no image, empty message). State untouched.
    Ignored,
    /// The same action is already in flight for this session.
    Busy,
    Completed,
    /// The action failed; the message was stored as the session notice.
    Failed(String),
}

/// Store a freshly acquired photo for `tab`.
///
/// Empty uploads are ignored. Rejected files leave the previous image in place.
pub async fn acquire_image(handle: &SessionHandle, tab: Tab, bytes: Vec<u8>) -> ActionOutcome {
    let image = match AcquiredImage::from_bytes(bytes) {
        Ok(image) => image,
        Err(AcquireError::Empty) => return ActionOutcome::Ignored,
        Err(e) => return reject_image(handle, tab, &e).await,
    };

    tracing::info!(%tab, bytes = image.bytes.len(), mime = image.mime(), "image acquired");
    let mut session = handle.lock().await;
    session.set_image(tab, image);
    if session.analysis(tab) != AnalysisPhase::AwaitingRecipe {
        session.set_analysis(tab, AnalysisPhase::Idle);
    }
    ActionOutcome::Completed
}

/// Record why a photo for `tab` was refused. The previous image stays in place.
pub async fn reject_image(handle: &SessionHandle, tab: Tab, err: &AcquireError) -> ActionOutcome {
    tracing::info!(%tab, error = %err, "image rejected");
    let msg = err.to_string();
    handle.lock().await.notice = Some(msg.clone());
    ActionOutcome::Failed(msg)
}

/// Analyse the photo acquired on `tab` and replace the session recipe with the reply.
pub async fn create_recipe(handle: SessionHandle, tab: Tab, llm: LlmClient) -> ActionOutcome {
    let (image, previous) = {
        let mut session = handle.lock().await;
        let Some(image) = session.image(tab).cloned() else {
            return ActionOutcome::Ignored;
        };
        let previous = session.analysis(tab);
        if previous == AnalysisPhase::AwaitingRecipe {
            session.notice = Some(BUSY_RECIPE.into());
            return ActionOutcome::Busy;
        }
        session.set_analysis(tab, AnalysisPhase::AwaitingRecipe);
        (image, previous)
    };

    let result = llm.analyze_image(&image.bytes).await;

    let mut session = handle.lock().await;
    // a photo acquired during the call has not been analysed yet
    let replaced = session.image(tab) != Some(&image);
    match result {
        Ok(recipe) => {
            session.state.set_recipe(recipe);
            let phase = if replaced {
                AnalysisPhase::Idle
            } else {
                AnalysisPhase::RecipeReady
            };
            session.set_analysis(tab, phase);
            ActionOutcome::Completed
        }
        Err(e) => {
            let phase = if replaced {
                AnalysisPhase::Idle
            } else {
                previous
            };
            session.set_analysis(tab, phase);
            let msg = e.user_notice();
            session.notice = Some(msg.clone());
            ActionOutcome::Failed(msg)
        }
    }
}

/// Send a follow-up message and record both turns once the reply arrives.
///
/// Blank messages are ignored without touching the session.
pub async fn send_chat(handle: SessionHandle, message: String, llm: LlmClient) -> ActionOutcome {
    if message.trim().is_empty() {
        return ActionOutcome::Ignored;
    }

    let (history, recipe) = {
        let mut session = handle.lock().await;
        if session.chat == ChatPhase::AwaitingReply {
            session.notice = Some(BUSY_CHAT.into());
            return ActionOutcome::Busy;
        }
        session.chat = ChatPhase::AwaitingReply;
        (
            session.state.chat_history.clone(),
            session.state.recipe().map(ToString::to_string),
        )
    };

    let result = llm
        .send_chat_message(&history, recipe.as_deref(), &message)
        .await;

    let mut session = handle.lock().await;
    session.chat = ChatPhase::Idle;
    match result {
        Ok(reply) => {
            session.state.push_exchange(message, reply);
            ActionOutcome::Completed
        }
        Err(e) => {
            let msg = e.user_notice();
            session.notice = Some(msg.clone());
            ActionOutcome::Failed(msg)
        }
    }
}
