use axum::{
    extract::{ConnectInfo, Request},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use uuid::Uuid;

/// Request ID wrapper for use in request extensions
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Request context containing request metadata. The redirect handler reads
/// the client ip / user agent / referer from here when enqueuing clicks.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct RequestContext {
    pub request_id: String,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

/// Extract the client IP, preferring common proxy headers over the socket
/// address.
pub fn extract_client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    // X-Forwarded-For can be a comma-separated list; take the first entry.
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(first_ip) = forwarded_str.split(',').next() {
                let first_ip = first_ip.trim();
                if !first_ip.is_empty() {
                    return Some(first_ip.to_string());
                }
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(real_ip_str) = real_ip.to_str() {
            if !real_ip_str.is_empty() {
                return Some(real_ip_str.to_string());
            }
        }
    }

    peer.map(|addr| addr.ip().to_string())
}

/// Extract user agent from headers
pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get("user-agent")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}

/// Extract referer from headers
pub fn extract_referer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("referer")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}

/// Request ID middleware - adds a unique ID to each request
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    // Try to get existing request ID from header, or generate new one
    let request_id: String = req
        .headers()
        .get("x-request-id")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    // Add request ID to request extensions for use in handlers
    req.extensions_mut().insert(RequestId(request_id.clone()));

    tracing::info!(
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
        "Incoming request"
    );

    let mut response = next.run(req).await;

    // Add request ID to response headers
    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", header_value);
    }

    response
}

/// Request context middleware - adds context to each request
pub async fn request_context_middleware(mut req: Request, next: Next) -> Response {
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0);

    let headers = req.headers();
    let context = RequestContext {
        request_id,
        client_ip: extract_client_ip(headers, peer),
        user_agent: extract_user_agent(headers),
        referer: extract_referer(headers),
    };
    req.extensions_mut().insert(context);

    next.run(req).await
}
