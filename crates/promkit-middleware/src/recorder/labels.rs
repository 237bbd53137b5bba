//! Endpoint label functions and size accounting for HTTP requests.

use axum::body::HttpBody;
use axum::extract::{MatchedPath, Request};
use axum::http::{header, HeaderMap};
use axum::response::Response;

/// Default endpoint label: the raw URI path.
pub fn raw_path(req: &Request) -> String {
    req.uri().path().to_string()
}

/// The route template axum matched (`/users/:id`), falling back to the raw
/// path for unrouted requests.
pub fn matched_route(req: &Request) -> String {
    req.extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| raw_path(req))
}

/// Raw path with numeric and UUID segments collapsed to `:id`.
pub fn normalized_path(req: &Request) -> String {
    normalize_path(req.uri().path())
}

/// Collapse dynamic path segments to keep label cardinality bounded.
///
/// ```
/// use promkit_middleware::recorder::normalize_path;
///
/// assert_eq!(normalize_path("/users/123"), "/users/:id");
/// assert_eq!(normalize_path("/jobs/550e8400-e29b-41d4-a716-446655440000/log"), "/jobs/:id/log");
/// assert_eq!(normalize_path("/api/health/"), "/api/health");
/// ```
pub fn normalize_path(path: &str) -> String {
    let path = path.trim_end_matches('/');
    if path.is_empty() {
        return "/".to_string();
    }

    path.split('/')
        .map(|seg| if is_uuid(seg) || is_numeric(seg) { ":id" } else { seg })
        .collect::<Vec<_>>()
        .join("/")
}

fn is_uuid(s: &str) -> bool {
    if s.len() != 36 {
        return false;
    }
    let parts: Vec<&str> = s.split('-').collect();
    parts.len() == 5
        && parts
            .iter()
            .zip([8, 4, 4, 4, 12])
            .all(|(p, n)| p.len() == n && p.chars().all(|c| c.is_ascii_hexdigit()))
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Approximate wire size of a request: URI, method, protocol, every header
/// name and value, plus the declared body length when known.
pub fn request_size(req: &Request) -> u64 {
    let mut size = req.uri().to_string().len();
    size += req.method().as_str().len();
    size += format!("{:?}", req.version()).len();

    for (name, value) in req.headers() {
        size += name.as_str().len();
        size += value.as_bytes().len();
    }

    size as u64 + content_length(req.headers()).unwrap_or(0)
}

/// Response body size, or `-1` when it cannot be known without reading the
/// body.
pub fn response_size(res: &Response) -> i64 {
    res.body()
        .size_hint()
        .exact()
        .or_else(|| content_length(res.headers()))
        .and_then(|n| i64::try_from(n).ok())
        .unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn normalize_collapses_ids() {
        assert_eq!(normalize_path("/users/12345/profile"), "/users/:id/profile");
        assert_eq!(
            normalize_path("/jobs/ABCDEF12-3456-7890-ABCD-EF1234567890/status"),
            "/jobs/:id/status"
        );
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("/api/v1/health"), "/api/v1/health");
    }

    #[test]
    fn uuid_shape() {
        assert!(is_uuid("550e8400-e29b-41d4-a716-446655440000"));
        assert!(!is_uuid("550e8400-e29b-41d4-a716-44665544000"));
        assert!(!is_uuid("not-a-uuid"));
    }

    #[test]
    fn request_size_counts_line_headers_and_body() {
        let req = Request::builder()
            .method("POST")
            .uri("/echo")
            .header("content-length", "10")
            .body(Body::empty())
            .expect("request");

        // "/echo" + "POST" + "HTTP/1.1" + "content-length" + "10" + body 10
        assert_eq!(request_size(&req), 5 + 4 + 8 + 14 + 2 + 10);
    }

    #[test]
    fn response_size_from_body_hint() {
        let res = Response::new(Body::from("pong"));
        assert_eq!(response_size(&res), 4);
        assert_eq!(response_size(&Response::new(Body::empty())), 0);
    }

    #[test]
    fn raw_path_ignores_query() {
        let req = Request::builder()
            .uri("/search?q=x")
            .body(Body::empty())
            .expect("request");
        assert_eq!(raw_path(&req), "/search");
        assert_eq!(matched_route(&req), "/search");
    }
}
