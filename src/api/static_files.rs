//! Static file serving for the embedded SPA build
//!
//! Serves the React build out of the binary. Hashed assets get immutable
//! cache headers; every unknown GET route falls back to index.html so the
//! client router can take over. The crawler middleware runs before this
//! handler, so bot requests never reach the SPA fallback for content
//! routes.

use axum::{
    body::Body,
    http::{header, StatusCode, Uri},
    response::Response,
};
use rust_embed::RustEmbed;

/// Embedded SPA build output
#[derive(RustEmbed)]
#[folder = "web/dist/"]
#[include = "*"]
struct SpaAssets;

/// Serve static files, falling back to the SPA shell
pub async fn serve_static(uri: Uri) -> Response {
    let path = uri.path();
    // Decode encoded characters in asset names (e.g. %5B%5D)
    let decoded_path = urlencoding::decode(path).unwrap_or_else(|_| path.into());
    let asset_path = decoded_path.trim_start_matches('/');

    if !asset_path.is_empty() {
        if let Some(content) = SpaAssets::get(asset_path) {
            return build_response(asset_path, &content.data);
        }
    }

    // SPA fallback: index.html for every route the client router owns
    if let Some(content) = SpaAssets::get("index.html") {
        return build_response("index.html", &content.data);
    }

    not_found()
}

/// Build HTTP response with content type and cache headers
fn build_response(path: &str, data: &[u8]) -> Response {
    let content_type = get_content_type(path);
    let cache_control = if is_immutable(path) {
        "public, max-age=31536000, immutable"
    } else if content_type.starts_with("text/html") {
        "no-cache"
    } else {
        "public, max-age=3600"
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, cache_control)
        .body(Body::from(data.to_vec()))
        .unwrap()
}

/// 404 response
fn not_found() -> Response {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .body(Body::from("<html><body><h1>404 Not Found</h1></body></html>"))
        .unwrap()
}

/// Get content type from file extension
fn get_content_type(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or("") {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "webp" => "image/webp",
        "txt" => "text/plain",
        "mp3" => "audio/mpeg",
        _ => "application/octet-stream",
    }
}

/// Check if file is immutable (hashed filename under assets/)
fn is_immutable(path: &str) -> bool {
    path.contains("assets/") && (path.ends_with(".js") || path.ends_with(".css"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_types() {
        assert_eq!(get_content_type("index.html"), "text/html; charset=utf-8");
        assert_eq!(get_content_type("assets/app-1a2b.js"), "application/javascript");
        assert_eq!(get_content_type("unknown.bin"), "application/octet-stream");
    }

    #[test]
    fn test_immutable_detection() {
        assert!(is_immutable("assets/index-8f3a.js"));
        assert!(is_immutable("assets/index-8f3a.css"));
        assert!(!is_immutable("index.html"));
        assert!(!is_immutable("assets/logo.png"));
    }
}
