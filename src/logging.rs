//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::Request,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{COOKIE, SET_COOKIE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::Error;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level, with the
/// auth cookie redacted. If a body is longer than [LOG_BODY_LENGTH_LIMIT]
/// bytes, it is truncated and the full body is logged at the `debug` level.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_text = match body_to_text(body).await {
        Ok(text) => text,
        Err(error) => {
            tracing::warn!("Could not read request body: {error}");
            return Error::Validation("could not read the request body".to_owned())
                .into_response();
        }
    };
    tracing::info!(
        "Received request: {} {}\nheaders: {:?}\nbody: {}",
        parts.method,
        parts.uri,
        redact_cookies(&parts.headers),
        truncate(&body_text)
    );
    log_full_body("request", &body_text);

    let request = Request::from_parts(parts, body_text.into());
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_text = match body_to_text(body).await {
        Ok(text) => text,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    tracing::info!(
        "Sending response: {}\nheaders: {:?}\nbody: {}",
        parts.status,
        redact_cookies(&parts.headers),
        truncate(&body_text)
    );
    log_full_body("response", &body_text);

    Response::from_parts(parts, body_text.into())
}

async fn body_to_text(body: Body) -> Result<String, axum::Error> {
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await?;

    Ok(String::from_utf8_lossy(&body_bytes).into_owned())
}

fn redact_cookies(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();

    for name in [COOKIE, SET_COOKIE] {
        if headers.contains_key(&name) {
            headers.insert(name, HeaderValue::from_static("********"));
        }
    }

    headers
}

const LOG_BODY_LENGTH_LIMIT: usize = 64;

fn truncate(body: &str) -> String {
    if body.len() <= LOG_BODY_LENGTH_LIMIT {
        return format!("{body:?}");
    }

    let mut end = LOG_BODY_LENGTH_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}...", &body[..end])
}

fn log_full_body(direction: &str, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::debug!("Full {direction} body: {body:?}");
    }
}
