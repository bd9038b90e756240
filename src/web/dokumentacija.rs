//! Project documentation pages

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
use crate::models::{Dokumentacija, DokumentacijaForm, ListQuery, ListWindow, LookupKind};
use crate::reports::Tabular;
use crate::services::{DokumentacijaService, RowImporter, ServiceResult};

pub const RESOURCE: Resource = Resource {
    title: "Dokumentacija",
    base: "/dokumentacija",
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
impl Listing for DokumentacijaService {
    type Row = Dokumentacija;

    async fn count(&self) -> ServiceResult<i64> {
        DokumentacijaService::count(self).await
    }

    async fn rows(&self, window: &ListWindow) -> ServiceResult<Vec<Dokumentacija>> {
        self.list(window).await
    }

    fn id(row: &Dokumentacija) -> i64 {
        row.id
    }
}

async fn form_view(
    state: &AppState,
    title: &str,
    action: String,
    form: &DokumentacijaForm,
) -> WebResult<FormView> {
    let projekti = state.services.projekti.options().await?;
    let vrste = state.services.lookups.options(LookupKind::VrstaDok).await?;

    Ok(FormView::new(title, action, RESOURCE.base)
        .return_to(&form.return_to)
        .field(Field::select("projekt_id", "Projekt", &form.projekt_id, &projekti).required())
        .field(
            Field::select("vrsta_dok_id", "Vrsta dokumentacije", &form.vrsta_dok_id, &vrste)
                .required(),
        )
        .field(Field::text("naziv", "Naziv", &form.naziv).required())
        .field(Field::date("datum", "Datum", &form.datum).required())
        .field(Field::text("putanja", "Putanja", &form.putanja)))
}

async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    flash: IncomingFlash,
) -> WebResult<Response> {
    crud::index(&state, &RESOURCE, state.services.dokumentacija.as_ref(), query, flash).await
}

async fn create_form(
    State(state): State<AppState>,
    Query(form): Query<DokumentacijaForm>,
    flash: IncomingFlash,
) -> WebResult<Response> {
    form_view(&state, "Novi dokument", "/dokumentacija/create".into(), &form)
        .await?
        .render(&state, flash)
}

async fn create(
    State(state): State<AppState>,
    Form(form): Form<DokumentacijaForm>,
) -> WebResult<Response> {
    match state.services.dokumentacija.create(&form).await {
        Ok(_) => Ok(crud::saved(
            &format!("Dokument {} je dodan", form.naziv.trim()),
            &form.return_to,
            RESOURCE.base,
        )),
        Err(e) => Rejected::from_error(e)?.render(
            form_view(&state, "Novi dokument", "/dokumentacija/create".into(), &form).await?,
            &state,
        ),
    }
}

async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(back): Query<ReturnTo>,
    flash: IncomingFlash,
) -> WebResult<Response> {
    let dokument = state.services.dokumentacija.get(id).await?;
    let mut form = DokumentacijaForm::from(&dokument);
    form.return_to = back.return_to;
    form_view(&state, &dokument.naziv, RESOURCE.edit_url(id), &form)
        .await?
        .render(&state, flash)
}

async fn edit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<DokumentacijaForm>,
) -> WebResult<Response> {
    match state.services.dokumentacija.update(id, &form).await {
        Ok(()) => Ok(crud::saved("Dokument je spremljen", &form.return_to, RESOURCE.base)),
        Err(e) => Rejected::from_error(e)?.render(
            form_view(&state, "Uređivanje dokumenta", RESOURCE.edit_url(id), &form).await?,
            &state,
        ),
    }
}

async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(back): Form<ReturnTo>,
) -> WebResult<Response> {
    let result = state.services.dokumentacija.delete(id).await;
    crud::deleted(result, &RESOURCE, &back, "Dokument je obrisan")
}

async fn export_xlsx(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> WebResult<Response> {
    crud::export_xlsx(&RESOURCE, state.services.dokumentacija.as_ref(), query).await
}

async fn export_pdf(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> WebResult<Response> {
    crud::export_pdf(&RESOURCE, state.services.dokumentacija.as_ref(), query).await
}

async fn import_form(State(state): State<AppState>, flash: IncomingFlash) -> WebResult<Response> {
    crud::import_form(
        &state,
        &RESOURCE,
        state.services.dokumentacija.required(),
        Dokumentacija::COLUMNS,
        flash,
    )
}

async fn import(State(state): State<AppState>, multipart: Multipart) -> WebResult<Response> {
    crud::import_upload(&state, &RESOURCE, state.services.dokumentacija.as_ref(), multipart).await
}
