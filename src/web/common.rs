//! Common helpers for web handlers

use axum::body::Body;
use axum::extract::Multipart;
use axum::http::{header, StatusCode};
use axum::response::Response;
use serde::Deserialize;

use super::error::{WebError, WebResult};

/// Optional `return_to` posted by delete buttons or passed to edit links
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReturnTo {
    pub return_to: String,
}

impl ReturnTo {
    pub fn or<'a>(&'a self, fallback: &'a str) -> &'a str {
        local_path(&self.return_to).unwrap_or(fallback)
    }
}

/// `path` if it stays on this site: starts with one `/` and has no backslash
pub fn local_path(path: &str) -> Option<&str> {
    let path = path.trim();
    let local = path.starts_with('/') && !path.starts_with("//") && !path.contains('\\');
    local.then_some(path)
}

/// Where to go after a successful save
pub fn back_to<'a>(return_to: &'a str, fallback: &'a str) -> &'a str {
    local_path(return_to).unwrap_or(fallback)
}

/// File download with `Content-Disposition: attachment`
pub fn download(bytes: Vec<u8>, content_type: &'static str, filename: &str) -> WebResult<Response> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from(bytes))
        .map_err(|e| WebError::Internal(e.into()))
}

/// Bytes of the multipart field `name`, or `None` when absent or empty
pub async fn read_file_field(multipart: &mut Multipart, name: &str) -> WebResult<Option<Vec<u8>>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| WebError::BadRequest(format!("Neispravan zahtjev: {}", e)))?
    {
        if field.name() != Some(name) {
            continue;
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| WebError::BadRequest(format!("Datoteka nije učitana: {}", e)))?;
        return Ok((!data.is_empty()).then(|| data.to_vec()));
    }
    Ok(None)
}

/// `1048576` -> `1 MB`
pub fn format_size(bytes: u64) -> String {
    const MB: u64 = 1024 * 1024;
    if bytes >= MB && bytes % MB == 0 {
        format!("{} MB", bytes / MB)
    } else if bytes >= 1024 {
        format!("{} KB", bytes / 1024)
    } else {
        format!("{} B", bytes)
    }
}
