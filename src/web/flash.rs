//! One-shot banners carried across a redirect
//!
//! The message travels in the `flash` cookie as URL-encoded JSON. The next
//! page that renders it also expires the cookie.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Redirect, Response};
use serde::{Deserialize, Serialize};

pub const COOKIE_NAME: &str = "flash";

const CLEAR_COOKIE: &str = "flash=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    pub fn encode(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        urlencoding::encode(&json).into_owned()
    }

    pub fn decode(value: &str) -> Option<Self> {
        let json = urlencoding::decode(value).ok()?;
        serde_json::from_str(&json).ok()
    }

    /// Read the banner from a `Cookie` header, if any
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .find_map(|cookie| {
                cookie
                    .trim()
                    .strip_prefix("flash=")
                    .filter(|value| !value.is_empty())
                    .and_then(Self::decode)
            })
    }

    /// Add the `Set-Cookie` carrying this banner to `response`
    pub fn attach(&self, response: &mut Response) {
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            COOKIE_NAME,
            self.encode()
        );
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => tracing::warn!("Flash cookie dropped: {}", e),
        }
    }

    /// 303 redirect to `to` with this banner attached
    pub fn redirect(self, to: &str) -> Response {
        let mut response = Redirect::to(to).into_response();
        self.attach(&mut response);
        response
    }

    /// `Set-Cookie` value that expires the banner
    pub fn clear_cookie() -> HeaderValue {
        HeaderValue::from_static(CLEAR_COOKIE)
    }
}

/// Banner sent by the previous response, if any
#[derive(Debug, Clone, Default)]
pub struct IncomingFlash(pub Option<Flash>);

impl<S> FromRequestParts<S> for IncomingFlash
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(Flash::from_headers(&parts.headers)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_encode_decode() {
        let flash = Flash::error("Projekt ima poslove; ne može se obrisati");
        let encoded = flash.encode();
        assert!(!encoded.contains(';'));
        assert!(!encoded.contains(' '));
        assert_eq!(Flash::decode(&encoded), Some(flash));
    }

    #[test]
    fn test_decode_garbage() {
        assert_eq!(Flash::decode("%7Bnije-json"), None);
    }

    #[test]
    fn test_from_headers_finds_flash_cookie() {
        let flash = Flash::success("Osoba je dodana");
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("theme=dark; flash={}; other=1", flash.encode())).unwrap(),
        );
        assert_eq!(Flash::from_headers(&headers), Some(flash));

        let mut cleared = HeaderMap::new();
        cleared.insert(COOKIE, HeaderValue::from_static("flash="));
        assert_eq!(Flash::from_headers(&cleared), None);
    }

    #[test]
    fn test_redirect_sets_cookie() {
        let response = Flash::success("Spremljeno").redirect("/osobe");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/osobe");
        let cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("flash="));
        assert!(cookie.contains("Path=/"));
    }
}
