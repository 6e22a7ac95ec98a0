use axum::{extract::Request, http::header, middleware::Next, response::IntoResponse};

/// Attach browser hardening headers.
///
/// JSON routes under `/api` get a CSP that blocks everything; HTML pages may
/// load their own stylesheet and inline styles so printed invoices render.
pub async fn security_headers_middleware(req: Request, next: Next) -> impl IntoResponse {
    let is_api_route = req.uri().path().starts_with("/api");

    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        header::HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::X_FRAME_OPTIONS,
        header::HeaderValue::from_static("DENY"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        header::HeaderValue::from_static("same-origin"),
    );

    if is_api_route {
        headers.insert(
            header::CONTENT_SECURITY_POLICY,
            header::HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
        );
    } else {
        headers.insert(
            header::CONTENT_SECURITY_POLICY,
            header::HeaderValue::from_static(
                "default-src 'self'; \
                 style-src 'self' 'unsafe-inline'; \
                 script-src 'self' 'unsafe-inline'; \
                 img-src 'self' data:; \
                 frame-ancestors 'none'",
            ),
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request as HttpRequest, middleware::from_fn, routing::get};
    use tower::ServiceExt;

    fn router() -> Router {
        Router::new()
            .route("/api/ping", get(|| async { "pong" }))
            .route("/page", get(|| async { "page" }))
            .layer(from_fn(security_headers_middleware))
    }

    #[tokio::test]
    async fn api_routes_get_strict_csp() {
        let response = router()
            .oneshot(HttpRequest::builder().uri("/api/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let csp = response.headers().get(header::CONTENT_SECURITY_POLICY).unwrap();
        assert!(csp.to_str().unwrap().starts_with("default-src 'none'"));
    }

    #[tokio::test]
    async fn pages_allow_inline_styles() {
        let response = router()
            .oneshot(HttpRequest::builder().uri("/page").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let csp = response.headers().get(header::CONTENT_SECURITY_POLICY).unwrap();
        assert!(csp.to_str().unwrap().contains("'unsafe-inline'"));
        assert_eq!(response.headers().get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
    }
}
