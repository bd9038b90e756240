//! Edit forms
//!
//! Every create/edit page is `form.html` driven by a list of `Field`s.
//! Posted values are echoed back as-is so a rejected form keeps its input.

use axum::http::StatusCode;
use axum::response::Response;
use serde::Serialize;

use super::common::local_path;
use super::error::{WebError, WebResult};
use super::flash::IncomingFlash;
use super::middleware::AppState;
use super::page::Page;
use crate::models::validation::parse_date;
use crate::models::{SelectItem, ValidationErrors};
use crate::services::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Email,
    Date,
    Textarea,
    Select,
    Autocomplete,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Field {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub value: String,
    pub required: bool,
    pub options: Vec<FieldOption>,
    /// Autocomplete endpoint
    pub source: Option<&'static str>,
    /// Text shown in an autocomplete input
    pub display: String,
    pub errors: Vec<String>,
}

impl Field {
    fn new(name: &'static str, label: &'static str, kind: FieldKind, value: &str) -> Self {
        Self {
            name,
            label,
            kind,
            value: value.to_string(),
            required: false,
            options: Vec::new(),
            source: None,
            display: String::new(),
            errors: Vec::new(),
        }
    }

    pub fn text(name: &'static str, label: &'static str, value: &str) -> Self {
        Self::new(name, label, FieldKind::Text, value)
    }

    pub fn email(name: &'static str, label: &'static str, value: &str) -> Self {
        Self::new(name, label, FieldKind::Email, value)
    }

    pub fn textarea(name: &'static str, label: &'static str, value: &str) -> Self {
        Self::new(name, label, FieldKind::Textarea, value)
    }

    /// Date input; accepted `dd.mm.yyyy` values are shown as ISO dates
    pub fn date(name: &'static str, label: &'static str, value: &str) -> Self {
        let value = parse_date(value)
            .map(|d| d.to_string())
            .unwrap_or_else(|| value.to_string());
        Self::new(name, label, FieldKind::Date, &value)
    }

    /// Select over `{id, label}` options
    pub fn select(name: &'static str, label: &'static str, value: &str, items: &[SelectItem]) -> Self {
        let value = value.trim();
        let mut field = Self::new(name, label, FieldKind::Select, value);
        field.options = items
            .iter()
            .map(|item| {
                let id = item.id.to_string();
                FieldOption {
                    selected: id == value,
                    value: id,
                    label: item.label.clone(),
                }
            })
            .collect();
        field
    }

    /// Select over fixed `(value, label)` pairs
    pub fn choice(
        name: &'static str,
        label: &'static str,
        value: &str,
        choices: &[(&str, &str)],
    ) -> Self {
        let value = value.trim();
        let mut field = Self::new(name, label, FieldKind::Select, value);
        field.options = choices
            .iter()
            .map(|(option, text)| FieldOption {
                value: option.to_string(),
                label: text.to_string(),
                selected: option.eq_ignore_ascii_case(value),
            })
            .collect();
        field
    }

    /// Hidden id plus a text input backed by `source`
    pub fn autocomplete(
        name: &'static str,
        label: &'static str,
        value: &str,
        display: impl Into<String>,
        source: &'static str,
    ) -> Self {
        let mut field = Self::new(name, label, FieldKind::Autocomplete, value);
        field.display = display.into();
        field.source = Some(source);
        field
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A create or edit page
#[derive(Debug, Clone, Serialize)]
pub struct FormView {
    #[serde(skip)]
    title: String,
    pub action: String,
    pub cancel_url: String,
    pub return_to: String,
    pub fields: Vec<Field>,
    pub banner: Option<String>,
}

impl FormView {
    pub fn new(title: impl Into<String>, action: impl Into<String>, cancel_url: &str) -> Self {
        Self {
            title: title.into(),
            action: action.into(),
            cancel_url: cancel_url.to_string(),
            return_to: String::new(),
            fields: Vec::new(),
            banner: None,
        }
    }

    /// Only local paths are kept; cancel then goes back there too
    pub fn return_to(mut self, return_to: &str) -> Self {
        if let Some(path) = local_path(return_to) {
            self.return_to = path.to_string();
            self.cancel_url = path.to_string();
        }
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Attach messages to their fields; messages for unknown fields go to the banner
    pub fn errors(mut self, errors: &ValidationErrors) -> Self {
        let mut unplaced = Vec::new();
        for field in &mut self.fields {
            field.errors = errors.get(field.name).to_vec();
        }
        for message in errors.messages() {
            if !self.fields.iter().any(|f| f.errors.iter().any(|e| e == message)) {
                unplaced.push(message.to_string());
            }
        }
        if !unplaced.is_empty() {
            self.banner = Some(unplaced.join(" "));
        }
        self
    }

    pub fn banner(mut self, message: impl Into<String>) -> Self {
        self.banner = Some(message.into());
        self
    }

    pub fn page(self, status: StatusCode) -> Page {
        Page::new("form.html", &self.title.clone())
            .with("form", &self)
            .status(status)
    }

    pub fn render(self, state: &AppState, flash: IncomingFlash) -> WebResult<Response> {
        self.page(StatusCode::OK).render(state, flash)
    }
}

/// How a rejected save is shown again
#[derive(Debug)]
pub struct Rejected {
    pub status: StatusCode,
    pub errors: ValidationErrors,
    pub banner: Option<String>,
}

impl Rejected {
    /// Split a save error into what the form shows; other errors pass through
    pub fn from_error(err: ServiceError) -> WebResult<Self> {
        match err {
            ServiceError::Validation(errors) => Ok(Self {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                errors,
                banner: None,
            }),
            e @ (ServiceError::Conflict(_) | ServiceError::InsufficientFunds { .. }) => Ok(Self {
                status: StatusCode::CONFLICT,
                errors: ValidationErrors::new(),
                banner: Some(e.to_string()),
            }),
            other => Err(WebError::from(other)),
        }
    }

    /// Re-render `form` with the messages of this rejection
    pub fn render(self, form: FormView, state: &AppState) -> WebResult<Response> {
        let mut form = form.errors(&self.errors);
        if let Some(banner) = self.banner {
            form = form.banner(banner);
        }
        form.page(self.status).render(state, IncomingFlash::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_marks_current_value() {
        let items = [SelectItem::new(1, "Jedan"), SelectItem::new(2, "Dva")];
        let field = Field::select("vrsta_id", "Vrsta", " 2 ", &items);
        assert!(!field.options[0].selected);
        assert!(field.options[1].selected);
    }

    #[test]
    fn test_date_field_shows_iso() {
        assert_eq!(Field::date("datum", "Datum", "05.03.2024").value, "2024-03-05");
        assert_eq!(Field::date("datum", "Datum", "nije datum").value, "nije datum");
    }

    #[test]
    fn test_choice_is_case_insensitive() {
        let field = Field::choice("smjer", "Smjer", "Uplata", &[("uplata", "Uplata"), ("isplata", "Isplata")]);
        assert!(field.options[0].selected);
    }

    #[test]
    fn test_errors_placed_on_fields_or_banner() {
        let mut errors = ValidationErrors::single("naziv", "Naziv je obavezan");
        errors.add("projekt_id", "Projekt ne postoji");
        let form = FormView::new("Novi", "/x/create", "/x")
            .field(Field::text("naziv", "Naziv", ""))
            .errors(&errors);
        assert_eq!(form.fields[0].errors, vec!["Naziv je obavezan".to_string()]);
        assert_eq!(form.banner.as_deref(), Some("Projekt ne postoji"));
    }

    #[test]
    fn test_return_to_must_be_local() {
        let form = FormView::new("Novi", "/poslovi/create", "/poslovi").return_to("//evil.example");
        assert_eq!(form.return_to, "");
        assert_eq!(form.cancel_url, "/poslovi");

        let form = FormView::new("Novi", "/poslovi/create", "/poslovi").return_to("/projekti/3");
        assert_eq!(form.return_to, "/projekti/3");
        assert_eq!(form.cancel_url, "/projekti/3");
    }

    #[test]
    fn test_rejected_from_error() {
        let rejected = Rejected::from_error(ServiceError::Conflict("Duplikat".into())).unwrap();
        assert_eq!(rejected.status, StatusCode::CONFLICT);
        assert_eq!(rejected.banner.as_deref(), Some("Duplikat"));

        let rejected =
            Rejected::from_error(ServiceError::Validation(ValidationErrors::single("a", "b"))).unwrap();
        assert_eq!(rejected.status, StatusCode::UNPROCESSABLE_ENTITY);

        assert!(Rejected::from_error(ServiceError::NotFound("x".into())).is_err());
    }
}
