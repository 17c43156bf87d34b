pub mod chat;
pub mod images;
pub mod page;
pub mod recipe;
pub mod session;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::convert::Infallible;
use uuid::Uuid;

use crate::models::AppState;
use crate::session::{SessionHandle, Tab, session_cookie, session_id_from_headers};

/// The caller's session, created on the fly when the cookie is missing or stale.
pub struct CurrentSession {
    pub id: Uuid,
    pub handle: SessionHandle,
    pub fresh: bool,
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookie_id = session_id_from_headers(&parts.headers);
        let (id, handle, fresh) = state.sessions.resolve(cookie_id).await;
        Ok(Self { id, handle, fresh })
    }
}

impl CurrentSession {
    /// Finish a response, attaching the cookie if this request created the session.
    pub fn respond(&self, res: impl IntoResponse) -> Response {
        let mut res = res.into_response();
        if self.fresh {
            res.headers_mut()
                .insert(header::SET_COOKIE, session_cookie(self.id));
        }
        res
    }
}

#[derive(Debug, Deserialize, Default, Clone, Copy)]
pub struct TabQuery {
    #[serde(default)]
    pub tab: Tab,
}

/// Post/Redirect/Get back to the page for `tab`.
#[must_use]
pub fn back_to(tab: Tab) -> Redirect {
    Redirect::to(&format!("/?tab={tab}"))
}
