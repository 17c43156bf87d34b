use axum::{
    extract::Query,
    response::{Html, Response},
};

use crate::html::{PageView, render_page};
use crate::routes::{CurrentSession, TabQuery};

/// Render the page for the caller's session. A pending notice is shown once.
pub async fn index(session: CurrentSession, Query(q): Query<TabQuery>) -> Response {
    let html = {
        let mut s = session.handle.lock().await;
        let notice = s.notice.take();
        render_page(&PageView::of(&s, q.tab, notice.as_deref()))
    };
    session.respond(Html(html))
}
