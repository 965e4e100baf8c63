//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// The maximum number of bytes of a request or response body to log at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// Only HTML, plain text and form bodies are logged. Other bodies, such as
/// static images, are passed through without being read.
/// If the body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let summary = format!("Received request: {} {}", parts.method, parts.uri);

    let body = if has_text_body(&parts.headers) {
        match log_text_body(&summary, body).await {
            Ok(body) => body,
            Err(error) => {
                tracing::error!("Could not read request body: {error}");
                return StatusCode::BAD_REQUEST.into_response();
            }
        }
    } else {
        tracing::info!("{summary}");
        body
    };

    let response = next.run(Request::from_parts(parts, body)).await;

    let (parts, body) = response.into_parts();
    let summary = format!("Sending response: {}", parts.status);

    let body = if has_text_body(&parts.headers) {
        match log_text_body(&summary, body).await {
            Ok(body) => body,
            Err(error) => {
                tracing::error!("Could not read response body: {error}");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        }
    } else {
        tracing::info!("{summary}");
        body
    };

    Response::from_parts(parts, body)
}

fn has_text_body(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };

    let mime_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime_type.starts_with("text/") || mime_type == "application/x-www-form-urlencoded"
}

/// Buffer `body`, log it, and return a body with the same bytes.
async fn log_text_body(summary: &str, body: Body) -> Result<Body, axum::Error> {
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await?;

    log_body(summary, &String::from_utf8_lossy(&body_bytes));

    Ok(Body::from(body_bytes))
}

fn log_body(summary: &str, body: &str) {
    match truncate(body, LOG_BODY_LENGTH_LIMIT) {
        Some(truncated_body) => {
            tracing::info!("{summary}\nbody: {truncated_body}...");
            tracing::debug!("Full body: {body:?}");
        }
        None => tracing::info!("{summary}\nbody: {body:?}"),
    }
}

/// Returns the first `limit` bytes of `text`, rounded down to a char
/// boundary, or `None` if `text` is short enough to log in full.
fn truncate(text: &str, limit: usize) -> Option<&str> {
    if text.len() <= limit {
        return None;
    }

    let end = (0..=limit)
        .rev()
        .find(|&index| text.is_char_boundary(index))
        .unwrap_or(0);

    Some(&text[..end])
}
