use axum::{
    body::to_bytes,
    extract::Request,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    error::AppError,
    response::{JsonApiResponse, log_app_error},
};

const MAX_ERROR_BODY_BYTES: usize = 16 * 1024;

/// Rewrites plain-text error bodies (extractor rejections, 404 fallbacks,
/// 405s) into the `{error, message}` envelope. HTML pages pass through.
pub async fn json_error_middleware(req: Request, next: Next) -> Response {
    let wants_html = header_contains(req.headers().get(header::ACCEPT), &["text/html"]);
    let response = next.run(req).await;
    let status = response.status();

    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let content_type = response.headers().get(header::CONTENT_TYPE);
    if wants_html || header_contains(content_type, &["application/json", "+json", "text/html"]) {
        return response;
    }

    let (parts, body) = response.into_parts();
    let message = match to_bytes(body, MAX_ERROR_BODY_BYTES).await {
        Ok(bytes) => {
            let text = String::from_utf8_lossy(&bytes).trim().to_string();
            if text.is_empty() { default_message(status) } else { text }
        }
        Err(_) => default_message(status),
    };

    let app_error = AppError::from_status(status, message);
    if status.is_server_error() {
        log_app_error(&app_error, status);
    }

    // keep the original status (405 stays 405) but use the envelope body
    let mut rewritten = JsonApiResponse::from_error(&app_error).into_response();
    *rewritten.status_mut() = status;
    copy_headers(&parts.headers, rewritten.headers_mut());
    rewritten
}

fn header_contains(value: Option<&HeaderValue>, needles: &[&str]) -> bool {
    value
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            let value = value.to_ascii_lowercase();
            needles.iter().any(|needle| value.contains(needle))
        })
        .unwrap_or(false)
}

fn default_message(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or("Request failed").to_string()
}

fn copy_headers(src: &HeaderMap, dest: &mut HeaderMap) {
    for (name, value) in src {
        if name == header::CONTENT_TYPE || name == header::CONTENT_LENGTH {
            continue;
        }
        dest.insert(name.clone(), value.clone());
    }
}
