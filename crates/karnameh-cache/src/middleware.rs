//! HTTP caching middleware for report routes.
//!
//! Reports change whenever a lesson is recorded, so clients must revalidate
//! every time. The ETag middleware hashes the response body and answers
//! `304 Not Modified` when the client already holds that body.
//!
//! ```ignore
//! use axum::{Router, middleware};
//! use karnameh_cache::{CacheControl, cache_control, etag_middleware};
//!
//! let reports = Router::new()
//!     .route("/students/{id}/report-card", get(handler))
//!     .layer(middleware::from_fn(etag_middleware))
//!     .layer(cache_control(CacheControl::Revalidate));
//! ```

use axum::{
    body::Body,
    extract::Request,
    http::{
        HeaderValue, Method, StatusCode,
        header::{CACHE_CONTROL, ETAG, IF_NONE_MATCH},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::BodyExt;
use sha2::{Digest, Sha256};
use tower_http::set_header::SetResponseHeaderLayer;

/// Cache-Control policies used by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheControl {
    /// Private to the browser and revalidated on every use
    Revalidate,
    /// Private, fresh for the given number of seconds
    PrivateFor(u64),
    /// Never stored
    NoStore,
}

impl CacheControl {
    pub fn header_value(self) -> HeaderValue {
        match self {
            Self::Revalidate => HeaderValue::from_static("private, no-cache, must-revalidate"),
            Self::PrivateFor(seconds) => HeaderValue::from_str(&format!("private, max-age={seconds}"))
                .unwrap_or_else(|_| HeaderValue::from_static("no-cache")),
            Self::NoStore => HeaderValue::from_static("no-store"),
        }
    }
}

/// Sets Cache-Control on responses that do not have one yet.
pub fn cache_control(policy: CacheControl) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::if_not_present(CACHE_CONTROL, policy.header_value())
}

fn generate_etag(body: &[u8]) -> String {
    let digest = Sha256::digest(body);
    format!("\"{}\"", hex::encode(&digest[..16]))
}

/// Weak comparison: the `W/` prefix is ignored.
fn etags_match(client_etag: &str, server_etag: &str) -> bool {
    let client = client_etag.trim().trim_start_matches("W/");
    let server = server_etag.trim().trim_start_matches("W/");
    client == "*" || client == server
}

fn if_none_match_hits(header: &str, etag: &str) -> bool {
    header.split(',').any(|tag| etags_match(tag, etag))
}

/// Adds an ETag to successful GET responses and honours `If-None-Match`.
///
/// The whole body is buffered to hash it.
pub async fn etag_middleware(request: Request, next: Next) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let if_none_match = request
        .headers()
        .get(IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let response = next.run(request).await;
    if !response.status().is_success() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    let etag = generate_etag(&bytes);
    let etag_value = HeaderValue::from_str(&etag).ok();

    if if_none_match.is_some_and(|header| if_none_match_hits(&header, &etag)) {
        let mut not_modified = StatusCode::NOT_MODIFIED.into_response();
        if let Some(value) = etag_value {
            not_modified.headers_mut().insert(ETAG, value);
        }
        return not_modified;
    }

    if let Some(value) = etag_value {
        parts.headers.insert(ETAG, value);
    }
    Response::from_parts(parts, Body::from(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, middleware, routing::get};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/report", get(|| async { "{\"weighted_average\":17.0}" }))
            .layer(middleware::from_fn(etag_middleware))
            .layer(cache_control(CacheControl::Revalidate))
    }

    #[test]
    fn test_header_values() {
        assert_eq!(
            CacheControl::PrivateFor(60).header_value().to_str().unwrap(),
            "private, max-age=60"
        );
        assert_eq!(CacheControl::NoStore.header_value(), "no-store");
    }

    #[test]
    fn test_etags_match() {
        assert!(etags_match("\"abc\"", "\"abc\""));
        assert!(etags_match("W/\"abc\"", "\"abc\""));
        assert!(etags_match("*", "\"abc\""));
        assert!(!etags_match("\"abc\"", "\"xyz\""));
        assert!(if_none_match_hits("\"xyz\", \"abc\"", "\"abc\""));
    }

    #[tokio::test]
    async fn test_etag_round_trip() {
        let response = app()
            .oneshot(Request::builder().uri("/report").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CACHE_CONTROL).unwrap(),
            "private, no-cache, must-revalidate"
        );
        let etag = response.headers().get(ETAG).unwrap().clone();

        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/report")
                    .header(IF_NONE_MATCH, etag)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn test_stale_etag_gets_full_body() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/report")
                    .header(IF_NONE_MATCH, "\"stale\"")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
