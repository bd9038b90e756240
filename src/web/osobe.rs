//! People pages

use async_trait::async_trait;
use axum::{
    extract::{Multipart, Path, Query, State},
    response::Response,
    routing::{get, post},
    Form, Router,
};

use super::common::ReturnTo;
use super::crud::{self, Listing, Resource};
use super::error::WebResult;
use super::flash::IncomingFlash;
use super::form::{Field, FormView, Rejected};
use super::middleware::AppState;
use crate::models::{ListQuery, ListWindow, Osoba, OsobaForm};
use crate::reports::Tabular;
use crate::services::{OsobaService, RowImporter, ServiceResult};

pub const RESOURCE: Resource = Resource {
    title: "Osobe",
    base: "/osobe",
    detail: false,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/create", get(create_form).post(create))
        .route("/{id}/edit", get(edit_form).post(edit))
        .route("/{id}/delete", post(delete))
        .route("/export.xlsx", get(export_xlsx))
        .route("/export.pdf", get(export_pdf))
        .route("/import", get(import_form).post(import))
}

#[async_trait]
impl Listing for OsobaService {
    type Row = Osoba;

    async fn count(&self) -> ServiceResult<i64> {
        OsobaService::count(self).await
    }

    async fn rows(&self, window: &ListWindow) -> ServiceResult<Vec<Osoba>> {
        self.list(window).await
    }

    fn id(row: &Osoba) -> i64 {
        row.id
    }
}

fn form_view(title: &str, action: String, form: &OsobaForm) -> FormView {
    FormView::new(title, action, RESOURCE.base)
        .field(Field::text("ime", "Ime", &form.ime).required())
        .field(Field::text("prezime", "Prezime", &form.prezime).required())
        .field(Field::text("oib", "OIB", &form.oib).required())
        .field(Field::email("email", "E-mail", &form.email))
        .field(Field::text("telefon", "Telefon", &form.telefon))
}

async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    flash: IncomingFlash,
) -> WebResult<Response> {
    crud::index(&state, &RESOURCE, state.services.osobe.as_ref(), query, flash).await
}

async fn create_form(State(state): State<AppState>, flash: IncomingFlash) -> WebResult<Response> {
    form_view("Nova osoba", "/osobe/create".into(), &OsobaForm::default()).render(&state, flash)
}

async fn create(State(state): State<AppState>, Form(form): Form<OsobaForm>) -> WebResult<Response> {
    match state.services.osobe.create(&form).await {
        Ok(_) => Ok(crud::saved(
            &format!("Osoba {} {} je dodana", form.ime.trim(), form.prezime.trim()),
            "",
            RESOURCE.base,
        )),
        Err(e) => Rejected::from_error(e)?
            .render(form_view("Nova osoba", "/osobe/create".into(), &form), &state),
    }
}

async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    flash: IncomingFlash,
) -> WebResult<Response> {
    let osoba = state.services.osobe.get(id).await?;
    form_view(&osoba.label(), RESOURCE.edit_url(id), &OsobaForm::from(&osoba)).render(&state, flash)
}

async fn edit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<OsobaForm>,
) -> WebResult<Response> {
    match state.services.osobe.update(id, &form).await {
        Ok(()) => Ok(crud::saved("Osoba je spremljena", "", RESOURCE.base)),
        Err(e) => Rejected::from_error(e)?
            .render(form_view("Uređivanje osobe", RESOURCE.edit_url(id), &form), &state),
    }
}

async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(back): Form<ReturnTo>,
) -> WebResult<Response> {
    let result = state.services.osobe.delete(id).await;
    crud::deleted(result, &RESOURCE, &back, "Osoba je obrisana")
}

async fn export_xlsx(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> WebResult<Response> {
    crud::export_xlsx(&RESOURCE, state.services.osobe.as_ref(), query).await
}

async fn export_pdf(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> WebResult<Response> {
    crud::export_pdf(&RESOURCE, state.services.osobe.as_ref(), query).await
}

async fn import_form(State(state): State<AppState>, flash: IncomingFlash) -> WebResult<Response> {
    crud::import_form(
        &state,
        &RESOURCE,
        state.services.osobe.required(),
        Osoba::COLUMNS,
        flash,
    )
}

async fn import(State(state): State<AppState>, multipart: Multipart) -> WebResult<Response> {
    crud::import_upload(&state, &RESOURCE, state.services.osobe.as_ref(), multipart).await
}
