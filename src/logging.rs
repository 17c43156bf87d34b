use crate::config::Config;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Instant;

use axum::body::Body;
use axum::http::{HeaderMap, Request, Response, header};
use axum::middleware::Next;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Keep guards alive for the lifetime of the app.
pub struct LogGuards {
    _file_guard: WorkerGuard,
}

const PREVIEW_BYTES: usize = 16 * 1024;
const MAX_LOGGED_BODY: usize = 64 * 1024;

fn split_path(path: &Path) -> (PathBuf, String) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    let file = path
        .file_name()
        .unwrap_or_else(|| OsStr::new("fridgecipe.logs"))
        .to_string_lossy()
        .to_string();
    (dir, file)
}

pub fn init_logging(config: &Config) -> LogGuards {
    let filter = EnvFilter::new(config.log_filter());

    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_ansi(true)
        .compact()
        .with_timer(fmt::time::ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()));

    let (dir, file) = split_path(&config.log_file);
    let appender = tracing_appender::rolling::never(dir, file);
    let (nb, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .compact()
        .with_timer(fmt::time::ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_writer(nb);

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    LogGuards { _file_guard: guard }
}

fn request_id<B>(req: &Request<B>) -> String {
    req.headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

fn content_type(headers: &HeaderMap) -> String {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

/// One line per request: method, uri, status, latency, request id.
pub async fn access_log(req: Request<Body>, next: Next) -> Response<Body> {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let req_id = request_id(&req);
    let started = Instant::now();

    let res = next.run(req).await;

    let status = res.status();
    let latency_ms = started.elapsed().as_millis();
    if status.is_server_error() {
        tracing::error!(request_id=%req_id, %method, %uri, %status, latency_ms, "request failed");
    } else {
        tracing::info!(request_id=%req_id, %method, %uri, %status, latency_ms, "request");
    }
    res
}

fn preview(bytes: &[u8]) -> String {
    if bytes.len() > PREVIEW_BYTES {
        format!(
            "{}… [truncated]",
            String::from_utf8_lossy(&bytes[..PREVIEW_BYTES])
        )
    } else {
        String::from_utf8_lossy(bytes).to_string()
    }
}

/// Logs small textual request & response bodies at debug level.
/// Skips multipart uploads, pages and images (they carry photo bytes).
pub async fn log_payloads(req: Request<Body>, next: Next) -> Response<Body> {
    if !tracing::enabled!(Level::DEBUG) {
        return next.run(req).await;
    }

    let req_id = request_id(&req);
    let req_ct = content_type(req.headers());

    let (req_parts, req_body) = req.into_parts();
    let req = if req_ct.starts_with("multipart/") {
        Request::from_parts(req_parts, req_body)
    } else {
        match axum::body::to_bytes(req_body, MAX_LOGGED_BODY).await {
            Ok(bytes) => {
                if !bytes.is_empty() {
                    tracing::debug!(request_id=%req_id, request_body=%preview(&bytes), "request body");
                }
                Request::from_parts(req_parts, Body::from(bytes))
            }
            Err(e) => {
                tracing::warn!(request_id=%req_id, error=%e, "failed reading request body");
                Request::from_parts(req_parts, Body::empty())
            }
        }
    };

    let res = next.run(req).await;

    let res_ct = content_type(res.headers());
    if res_ct.starts_with("text/html")
        || res_ct.starts_with("image/")
        || res_ct.starts_with("application/octet-stream")
    {
        return res;
    }

    let (res_parts, res_body) = res.into_parts();
    match axum::body::to_bytes(res_body, MAX_LOGGED_BODY).await {
        Ok(bytes) => {
            if !bytes.is_empty() {
                tracing::debug!(request_id=%req_id, response_body=%preview(&bytes), "response body");
            }
            Response::from_parts(res_parts, Body::from(bytes))
        }
        Err(e) => {
            tracing::warn!(request_id=%req_id, error=%e, "failed reading response body");
            Response::from_parts(res_parts, Body::empty())
        }
    }
}
