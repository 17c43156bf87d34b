#![allow(dead_code)]

use std::{collections::VecDeque, sync::Arc, time::Duration};

use axum::{
    Json, Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
    routing::post,
};
use clap::Parser;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tower::ServiceExt;

use fridgecipe::config::Config;

/// Fake JPEG: the magic bytes are all format detection looks at.
pub const IMG1: &[u8] = b"\xFF\xD8\xFF\xE0\x00\x10JFIF\x00first-photo";
pub const IMG2: &[u8] = b"\xFF\xD8\xFF\xE0\x00\x10JFIF\x00second-photo";
pub const PNG1: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDRpng-photo";

type Reply = (StatusCode, String);

/// Minimal chat-completions endpoint that records request bodies and answers
/// with scripted replies, in order.
pub struct MockLlm {
    port: u16,
    received: Arc<Mutex<Vec<Value>>>,
    replies: Arc<Mutex<VecDeque<Reply>>>,
    delay: Arc<Mutex<Duration>>,
}

pub fn completion_body(text: &str) -> String {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "message": { "role": "assistant", "content": text },
                "finish_reason": "stop"
            }
        ]
    })
    .to_string()
}

impl MockLlm {
    pub async fn start() -> Self {
        let received: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
        let replies: Arc<Mutex<VecDeque<Reply>>> = Arc::new(Mutex::new(VecDeque::new()));
        let delay: Arc<Mutex<Duration>> = Arc::new(Mutex::new(Duration::ZERO));
        let store = received.clone();
        let script = replies.clone();
        let wait = delay.clone();

        let app = Router::new().route(
            "/v1/chat/completions",
            post(move |Json(body): Json<Value>| {
                let store = store.clone();
                let script = script.clone();
                let wait = wait.clone();
                async move {
                    store.lock().await.push(body);
                    let pause = *wait.lock().await;
                    tokio::time::sleep(pause).await;
                    let (status, text) = script
                        .lock()
                        .await
                        .pop_front()
                        .unwrap_or_else(|| (StatusCode::OK, completion_body("ok")));
                    (status, [(header::CONTENT_TYPE, "application/json")], text)
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock llm");
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(axum::serve(listener, app).into_future());

        Self {
            port,
            received,
            replies,
            delay,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}/v1", self.port)
    }

    pub async fn reply_with(&self, text: &str) {
        self.replies
            .lock()
            .await
            .push_back((StatusCode::OK, completion_body(text)));
    }

    pub async fn fail_with(&self, status: StatusCode, body: &str) {
        self.replies
            .lock()
            .await
            .push_back((status, body.to_string()));
    }

    /// Hold every answer back for `pause` after the request is recorded.
    pub async fn answer_after(&self, pause: Duration) {
        *self.delay.lock().await = pause;
    }

    /// Wait until at least `n` requests have arrived.
    pub async fn wait_for_requests(&self, n: usize) {
        for _ in 0..200 {
            if self.received.lock().await.len() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("mock llm never received {n} request(s)");
    }

    pub async fn requests(&self) -> Vec<Value> {
        self.received.lock().await.clone()
    }
}

pub fn test_config(base_url: &str) -> Config {
    test_config_with(base_url, &[])
}

pub fn test_config_with(base_url: &str, extra: &[&str]) -> Config {
    let mut args = vec![
        "fridgecipe",
        "--llm-api-url",
        base_url,
        "--llm-api-key",
        "test-key",
        "--llm-timeout-secs",
        "5",
    ];
    args.extend_from_slice(extra);
    Config::parse_from(args)
}

/* ---------- in-process HTTP helpers ---------- */

pub struct HttpReply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

pub async fn call(app: &Router, req: Request<Body>) -> HttpReply {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let headers = res.headers().clone();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    HttpReply {
        status,
        headers,
        body: String::from_utf8_lossy(&bytes).to_string(),
    }
}

/// `name=value` part of the session cookie set by a response.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|kv| kv.trim().to_string())
}

/// Open a session and return its cookie.
pub async fn open_session(app: &Router) -> String {
    let res = call(app, Request::get("/").body(Body::empty()).unwrap()).await;
    assert_eq!(res.status, StatusCode::OK);
    session_cookie(&res.headers).expect("first visit sets a session cookie")
}

pub fn get(uri: &str, cookie: &str) -> Request<Body> {
    Request::get(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

pub fn post_empty(uri: &str, cookie: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

pub fn post_form(uri: &str, cookie: &str, form: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

const BOUNDARY: &str = "fridgecipe-test-boundary";

pub fn post_image(uri: &str, cookie: &str, field: &str, bytes: &[u8]) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"photo.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::post(uri)
        .header(header::COOKIE, cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn session_json(app: &Router, cookie: &str) -> Value {
    let res = call(app, get("/session", cookie)).await;
    assert_eq!(res.status, StatusCode::OK);
    serde_json::from_str(&res.body).unwrap()
}
