//! HTTP helpers: security headers, method fallback and download headers.

use axum::body::Body as AxumBody;
use axum::http::{HeaderValue, Request, StatusCode, header};
use axum::{middleware, response::Response};

use crate::error::ApiError;

/// Adds baseline security headers to every response.
pub async fn add_security_headers(
    request: Request<AxumBody>,
    next: middleware::Next,
) -> Result<Response, StatusCode> {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    Ok(response)
}

/// Fallback for a known route hit with the wrong verb.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Builds `attachment; filename=<name>`, switching to the RFC 5987 form when
/// the name is not valid header text.
pub fn attachment_disposition(name: &str) -> HeaderValue {
    let plain = format!("attachment; filename={name}");
    if name.is_ascii()
        && let Ok(value) = HeaderValue::from_str(&plain)
    {
        return value;
    }
    let encoded = format!(
        "attachment; filename*=UTF-8''{}",
        urlencoding::encode(name)
    );
    HeaderValue::from_str(&encoded).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
