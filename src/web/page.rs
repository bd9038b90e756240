//! Rendered HTML pages

use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Serialize;
use tera::Context as TeraContext;

use super::error::WebResult;
use super::flash::{Flash, IncomingFlash};
use super::middleware::AppState;
use crate::models::LookupKind;

#[derive(Debug, Clone, Serialize)]
pub struct NavLink {
    pub slug: &'static str,
    pub title: &'static str,
}

/// Lookup tables listed in the layout menu
pub fn nav_lookups() -> Vec<NavLink> {
    LookupKind::ALL
        .iter()
        .map(|kind| NavLink {
            slug: kind.slug(),
            title: kind.title(),
        })
        .collect()
}

/// A template plus its context, rendered inside `layout.html`
pub struct Page {
    template: &'static str,
    context: TeraContext,
    status: StatusCode,
}

impl Page {
    pub fn new(template: &'static str, title: &str) -> Self {
        let mut context = TeraContext::new();
        context.insert("title", title);
        Self {
            template,
            context,
            status: StatusCode::OK,
        }
    }

    pub fn with<T: Serialize + ?Sized>(mut self, key: &str, value: &T) -> Self {
        self.context.insert(key, value);
        self
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Render the page, showing and expiring the incoming banner
    pub fn render(mut self, state: &AppState, flash: IncomingFlash) -> WebResult<Response> {
        self.context.insert("nav_lookups", &nav_lookups());
        if let Some(flash) = &flash.0 {
            self.context.insert("flash", flash);
        }

        let html = state.views.render(self.template, &self.context)?;
        let mut response = (self.status, Html(html)).into_response();
        if flash.0.is_some() {
            response
                .headers_mut()
                .append(SET_COOKIE, Flash::clear_cookie());
        }
        Ok(response)
    }
}
