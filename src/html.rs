use std::fmt::Write as _;

use crate::image_io::AcquiredImage;
use crate::session::{AnalysisPhase, ChatPhase, Role, Session, SessionState, Tab};

/// Everything the page shows, borrowed from one session.
#[derive(Debug, Clone, Copy)]
pub struct PageView<'a> {
    pub tab: Tab,
    pub image: Option<&'a AcquiredImage>,
    pub analysis: AnalysisPhase,
    pub chat: ChatPhase,
    pub state: &'a SessionState,
    pub notice: Option<&'a str>,
}

impl<'a> PageView<'a> {
    #[must_use]
    pub fn of(session: &'a Session, tab: Tab, notice: Option<&'a str>) -> Self {
        Self {
            tab,
            image: session.image(tab),
            analysis: session.analysis(tab),
            chat: session.chat,
            state: &session.state,
            notice,
        }
    }
}

const fn tab_label(tab: Tab) -> &'static str {
    match tab {
        Tab::Upload => "Upload Image",
        Tab::Camera => "Take Photo",
    }
}

const fn image_caption(tab: Tab) -> &'static str {
    match tab {
        Tab::Upload => "Uploaded Image",
        Tab::Camera => "Captured Image",
    }
}

const fn busy_label(tab: Tab) -> &'static str {
    match tab {
        Tab::Upload => "Doing my magic...",
        Tab::Camera => "Analyzing...",
    }
}

const STYLE: &str = r"
body { font-family: system-ui, sans-serif; background: #fafaf7; color: #222; margin: 0; }
main { max-width: 760px; margin: 0 auto; padding: 24px 16px 64px; }
h1 { margin: 0 0 16px; }
.notice { background: #fdecea; border: 1px solid #f5c2c0; color: #8a1c14; padding: 10px 14px; border-radius: 8px; }
.tabs { display: flex; gap: 4px; border-bottom: 2px solid #e4e4de; margin: 16px 0; }
.tabs a { padding: 8px 14px; text-decoration: none; color: #555; border-radius: 8px 8px 0 0; }
.tabs a.active { background: #e4e4de; color: #111; font-weight: 600; }
figure { margin: 16px 0; }
figure img { max-width: 100%; border-radius: 8px; }
figcaption { color: #777; font-size: 0.9em; text-align: center; }
button { background: #e85d2a; color: #fff; border: 0; border-radius: 8px; padding: 8px 16px; cursor: pointer; }
button[disabled] { background: #bbb; cursor: default; }
button.link { background: none; color: #777; padding: 0; text-decoration: underline; }
.recipe-text { white-space: pre-wrap; background: #fff; border: 1px solid #e4e4de; border-radius: 8px; padding: 12px; }
.transcript { list-style: none; padding: 0; }
.msg { margin: 8px 0; padding: 10px 12px; border-radius: 10px; white-space: pre-wrap; }
.msg.user { background: #dcefff; margin-left: 20%; }
.msg.assistant { background: #f0f0ea; margin-right: 20%; }
.who { display: block; font-size: 0.8em; color: #666; }
.busy { color: #777; font-style: italic; }
form.chat { display: flex; gap: 8px; }
form.chat input[type=text] { flex: 1; padding: 8px; border: 1px solid #ccc; border-radius: 8px; }
";

/// Render the whole page. Pure function of the view.
#[must_use]
pub fn render_page(view: &PageView<'_>) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str("<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n<title>Fridgecipe</title>\n",
    );
    let _ = writeln!(out, "<style>{STYLE}</style>\n</head>\n<body>\n<main>");
    out.push_str("<h1>Fridgecipe</h1>\n");

    if let Some(notice) = view.notice {
        let _ = writeln!(out, "<p class=\"notice\" role=\"alert\">{}</p>", escape(notice));
    }

    render_tabs(&mut out, view.tab);
    render_acquire(&mut out, view);

    if let Some(recipe) = view.state.recipe() {
        let _ = writeln!(
            out,
            "<section class=\"recipe\">\n<h3>Analysis Result:</h3>\n<div class=\"recipe-text\">{}</div>\n</section>",
            escape(recipe)
        );
    }

    render_chat(&mut out, view);

    let _ = writeln!(
        out,
        "<form method=\"post\" action=\"/session/reset?tab={}\"><button class=\"link\" type=\"submit\">Start over</button></form>",
        view.tab
    );
    out.push_str("</main>\n</body>\n</html>\n");
    out
}

fn render_tabs(out: &mut String, active: Tab) {
    out.push_str("<nav class=\"tabs\">");
    for tab in Tab::ALL {
        let class = if tab == active { " class=\"active\"" } else { "" };
        let _ = write!(out, "<a href=\"/?tab={tab}\"{class}>{}</a>", tab_label(tab));
    }
    out.push_str("</nav>\n");
}

fn render_acquire(out: &mut String, view: &PageView<'_>) {
    let tab = view.tab;
    out.push_str("<section class=\"acquire\">\n");

    let (prompt, capture) = match tab {
        Tab::Upload => ("Choose an image...", ""),
        Tab::Camera => ("Take a picture", " capture=\"environment\""),
    };
    let _ = writeln!(
        out,
        "<form method=\"post\" action=\"/images/{tab}\" enctype=\"multipart/form-data\">\n<label>{prompt} <input type=\"file\" name=\"image\" accept=\"image/jpeg,image/png\"{capture} required></label>\n<button type=\"submit\">Use this photo</button>\n</form>"
    );

    if let Some(image) = view.image {
        let caption = image_caption(tab);
        let _ = writeln!(
            out,
            "<figure><img src=\"{}\" alt=\"{caption}\"><figcaption>{caption}</figcaption></figure>",
            image.preview_uri()
        );
    }

    let busy = view.analysis == AnalysisPhase::AwaitingRecipe;
    let disabled = if view.image.is_none() || busy {
        " disabled"
    } else {
        ""
    };
    let label = if busy { busy_label(tab) } else { "Make me a recipe" };
    let _ = writeln!(
        out,
        "<form method=\"post\" action=\"/recipe/{tab}\" onsubmit=\"var b=this.querySelector('button');b.disabled=true;b.textContent='{}';\">\n<button type=\"submit\"{disabled}>{label}</button>\n</form>",
        busy_label(tab)
    );
    out.push_str("</section>\n");
}

fn render_chat(out: &mut String, view: &PageView<'_>) {
    out.push_str("<section class=\"chat\">\n<h3>Chat</h3>\n<ol class=\"transcript\">\n");
    for msg in &view.state.chat_history {
        let (class, who) = match msg.role {
            Role::User => ("user", "You"),
            Role::Assistant => ("assistant", "Chef"),
            Role::System => continue,
        };
        let _ = writeln!(
            out,
            "<li class=\"msg {class}\"><span class=\"who\">{who}</span>{}</li>",
            escape(&msg.content)
        );
    }
    out.push_str("</ol>\n");

    if view.chat == ChatPhase::AwaitingReply {
        out.push_str("<p class=\"busy\">Thinking...</p>\n");
    }

    let _ = writeln!(
        out,
        "<form class=\"chat\" method=\"post\" action=\"/chat\">\n<input type=\"hidden\" name=\"tab\" value=\"{}\">\n<input type=\"text\" name=\"message\" placeholder=\"Ask about the recipe\" autocomplete=\"off\">\n<button type=\"submit\">Send</button>\n</form>",
        view.tab
    );
    out.push_str("</section>\n");
}

/// Escape text for use in HTML element content and quoted attributes.
#[must_use]
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
