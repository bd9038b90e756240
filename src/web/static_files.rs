//! Embedded stylesheet and script

use axum::{
    body::Body,
    extract::Path,
    http::{header, StatusCode},
    response::Response,
};
use rust_embed::RustEmbed;

use super::error::{WebError, WebResult};

#[derive(RustEmbed)]
#[folder = "static/"]
struct StaticAssets;

/// GET /static/{*path}
pub async fn serve(Path(path): Path<String>) -> WebResult<Response> {
    let file = StaticAssets::get(&path)
        .ok_or_else(|| WebError::NotFound(format!("Datoteka {} ne postoji", path)))?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, get_content_type(&path))
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(Body::from(file.data.into_owned()))
        .map_err(|e| WebError::Internal(e.into()))
}

fn get_content_type(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or("") {
        "css" => "text/css; charset=utf-8",
        "js" => "application/javascript; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "ico" => "image/x-icon",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type() {
        assert_eq!(get_content_type("site.css"), "text/css; charset=utf-8");
        assert_eq!(get_content_type("site.js"), "application/javascript; charset=utf-8");
        assert_eq!(get_content_type("README"), "application/octet-stream");
    }

    #[test]
    fn test_assets_are_embedded() {
        assert!(StaticAssets::get("site.css").is_some());
        assert!(StaticAssets::get("site.js").is_some());
    }
}
