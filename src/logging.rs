//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};

const LOG_BODY_LENGTH_LIMIT: usize = 64;
/// Form fields whose values never appear in the logs.
const REDACTED_FIELDS: [&str; 2] = ["password", "confirm_password"];

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level. Bodies
/// longer than [LOG_BODY_LENGTH_LIMIT] characters are truncated, the full
/// body is logged at the `debug` level. Uploads and downloads are logged
/// without their bodies.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();

    let request = if has_text_body(&parts.headers) {
        let Some(bytes) = collect_body(body).await else {
            return StatusCode::BAD_REQUEST.into_response();
        };
        let text = String::from_utf8_lossy(&bytes);
        let text = REDACTED_FIELDS
            .iter()
            .fold(text.to_string(), |text, field| redact_field(&text, field));
        log_body("Received request", &format!("{parts:#?}"), &text);

        Request::from_parts(parts, Body::from(bytes))
    } else {
        tracing::info!("Received request: {parts:#?}\nbody: <not logged>");
        Request::from_parts(parts, body)
    };

    let response = next.run(request).await;
    let (parts, body) = response.into_parts();

    if !has_text_body(&parts.headers) {
        tracing::info!("Sending response: {parts:#?}\nbody: <not logged>");
        return Response::from_parts(parts, body);
    }

    let Some(bytes) = collect_body(body).await else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    log_body(
        "Sending response",
        &format!("{parts:#?}"),
        &String::from_utf8_lossy(&bytes),
    );

    Response::from_parts(parts, Body::from(bytes))
}

/// Form posts, JSON and HTML. A missing content type counts as text since
/// redirects and empty bodies have none.
fn has_text_body(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return true;
    };

    content_type.starts_with("text/")
        || content_type.starts_with("application/json")
        || content_type.starts_with("application/x-www-form-urlencoded")
}

async fn collect_body(body: Body) -> Option<Bytes> {
    axum::body::to_bytes(body, usize::MAX)
        .await
        .inspect_err(|error| tracing::error!("could not read body for logging: {error}"))
        .ok()
}

fn redact_field(form_text: &str, field_name: &str) -> String {
    let prefix = format!("{field_name}=");

    form_text
        .split('&')
        .map(|pair| {
            if pair.starts_with(&prefix) {
                format!("{prefix}********")
            } else {
                pair.to_owned()
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn log_body(message: &str, headers: &str, body: &str) {
    if body.chars().count() > LOG_BODY_LENGTH_LIMIT {
        let truncated: String = body.chars().take(LOG_BODY_LENGTH_LIMIT).collect();
        tracing::info!("{message}: {headers}\nbody: {truncated}...");
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("{message}: {headers}\nbody: {body:?}");
    }
}
