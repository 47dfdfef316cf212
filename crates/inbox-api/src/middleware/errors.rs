use axum::{
    body::to_bytes,
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Longest plain-text error body carried over into the envelope
const MAX_ERROR_BODY: usize = 16 * 1024;

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |ct| ct.starts_with("application/json"))
}

/// Rewrap error responses produced outside the handlers (method not
/// allowed, timeouts, body limits) in the `api_error` envelope
pub async fn json_errors(req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) || is_json(response.headers()) {
        return response;
    }

    let (parts, body) = response.into_parts();
    let text = match to_bytes(body, MAX_ERROR_BODY).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).trim().to_string(),
        Err(_) => String::new(),
    };
    let message = if text.is_empty() {
        status.canonical_reason().unwrap_or("Error").to_string()
    } else {
        text
    };

    let mut wrapped = (
        status,
        Json(json!({ "message": message, "type": "api_error" })),
    )
        .into_response();
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            wrapped.headers_mut().append(name.clone(), value.clone());
        }
    }
    wrapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use serde_json::Value;
    use tower::ServiceExt;

    /// Body-less 408, as the timeout layer answers
    async fn timed_out() -> Response {
        (StatusCode::REQUEST_TIMEOUT, Body::empty()).into_response()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn app() -> Router {
        Router::new()
            .route("/slow", get(timed_out))
            .route("/plain", get(|| async { (StatusCode::BAD_REQUEST, "bad input") }))
            .route("/ok", get(|| async { "fine" }))
            .layer(middleware::from_fn(json_errors))
    }

    #[tokio::test]
    async fn test_empty_error_body_gets_reason() {
        let request = Request::builder().uri("/slow").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Request Timeout");
        assert_eq!(body["type"], "api_error");
    }

    #[tokio::test]
    async fn test_plain_text_error_is_wrapped() {
        let request = Request::builder().uri("/plain").body(Body::empty()).unwrap();
        let body = body_json(app().oneshot(request).await.unwrap()).await;
        assert_eq!(body["message"], "bad input");
    }

    #[tokio::test]
    async fn test_method_not_allowed_keeps_allow_header() {
        let request = Request::builder()
            .method("POST")
            .uri("/ok")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(response.headers().contains_key(header::ALLOW));
        assert_eq!(body_json(response).await["type"], "api_error");
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let request = Request::builder().uri("/ok").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"fine");
    }
}
