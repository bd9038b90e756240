//! Project pages
//!
//! The detail page lists the project's documentation, card and jobs, each
//! with links that come back here after saving.

use async_trait::async_trait;
use axum::{
    extract::{Multipart, Path, Query, State},
    response::Response,
    routing::{get, post},
    Form, Router,
};

use super::common::ReturnTo;
use super::crud::{self, DetailView, Listing, Resource, Section};
use super::error::WebResult;
use super::flash::IncomingFlash;
use super::form::{Field, FormView, Rejected};
use super::middleware::AppState;
use super::{dokumentacija, kartice, poslovi};
use crate::models::{ListQuery, ListWindow, LookupKind, Projekt, ProjektForm};
use crate::reports::Tabular;
use crate::services::{ProjektService, RowImporter, ServiceResult};

pub const RESOURCE: Resource = Resource {
    title: "Projekti",
    base: "/projekti",
    detail: true,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/create", get(create_form).post(create))
        .route("/{id}", get(detail))
        .route("/{id}/edit", get(edit_form).post(edit))
        .route("/{id}/delete", post(delete))
        .route("/export.xlsx", get(export_xlsx))
        .route("/export.pdf", get(export_pdf))
        .route("/import", get(import_form).post(import))
}

#[async_trait]
impl Listing for ProjektService {
    type Row = Projekt;

    async fn count(&self) -> ServiceResult<i64> {
        ProjektService::count(self).await
    }

    async fn rows(&self, window: &ListWindow) -> ServiceResult<Vec<Projekt>> {
        self.list(window).await
    }

    fn id(row: &Projekt) -> i64 {
        row.id
    }
}

async fn form_view(
    state: &AppState,
    title: &str,
    action: String,
    form: &ProjektForm,
) -> WebResult<FormView> {
    let vrste = state
        .services
        .lookups
        .options(LookupKind::VrstaProjekta)
        .await?;

    Ok(FormView::new(title, action, RESOURCE.base)
        .field(Field::text("naziv", "Naziv", &form.naziv).required())
        .field(Field::text("kratica", "Kratica", &form.kratica).required())
        .field(
            Field::select(
                "vrsta_projekta_id",
                "Vrsta projekta",
                &form.vrsta_projekta_id,
                &vrste,
            )
            .required(),
        )
        .field(Field::date("datum_pocetka", "Početak", &form.datum_pocetka).required())
        .field(Field::date("datum_zavrsetka", "Završetak", &form.datum_zavrsetka))
        .field(Field::textarea("opis", "Opis", &form.opis)))
}

async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    flash: IncomingFlash,
) -> WebResult<Response> {
    crud::index(&state, &RESOURCE, state.services.projekti.as_ref(), query, flash).await
}

async fn create_form(State(state): State<AppState>, flash: IncomingFlash) -> WebResult<Response> {
    form_view(&state, "Novi projekt", "/projekti/create".into(), &ProjektForm::default())
        .await?
        .render(&state, flash)
}

async fn create(
    State(state): State<AppState>,
    Form(form): Form<ProjektForm>,
) -> WebResult<Response> {
    match state.services.projekti.create(&form).await {
        Ok(_) => Ok(crud::saved(
            &format!("Projekt {} je dodan", form.kratica.trim()),
            "",
            RESOURCE.base,
        )),
        Err(e) => Rejected::from_error(e)?.render(
            form_view(&state, "Novi projekt", "/projekti/create".into(), &form).await?,
            &state,
        ),
    }
}

async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    flash: IncomingFlash,
) -> WebResult<Response> {
    let detail = state.services.projekti.detail(id).await?;
    let projekt = &detail.projekt;
    let self_url = RESOURCE.detail_url(id);

    let mut kartica = Section::new(&kartice::RESOURCE, detail.kartica.as_slice(), |k| k.id);
    kartica.title = "Kartica";
    if detail.kartica.is_none() {
        kartica = kartica.create_with("projekt_id", id, &self_url);
    }

    DetailView::new(&RESOURCE, id, projekt)
        .section(
            Section::new(&dokumentacija::RESOURCE, &detail.dokumentacija, |d| d.id)
                .create_with("projekt_id", id, &self_url),
        )
        .section(kartica)
        .section(
            Section::new(&poslovi::RESOURCE, &detail.poslovi, |p| p.id)
                .create_with("projekt_id", id, &self_url),
        )
        .render(&state, &projekt.label(), flash)
}

async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    flash: IncomingFlash,
) -> WebResult<Response> {
    let projekt = state.services.projekti.get(id).await?;
    form_view(
        &state,
        &format!("Projekt {}", projekt.kratica),
        RESOURCE.edit_url(id),
        &ProjektForm::from(&projekt),
    )
    .await?
    .render(&state, flash)
}

async fn edit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<ProjektForm>,
) -> WebResult<Response> {
    match state.services.projekti.update(id, &form).await {
        Ok(()) => Ok(crud::saved("Projekt je spremljen", "", RESOURCE.base)),
        Err(e) => Rejected::from_error(e)?.render(
            form_view(&state, "Uređivanje projekta", RESOURCE.edit_url(id), &form).await?,
            &state,
        ),
    }
}

async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(back): Form<ReturnTo>,
) -> WebResult<Response> {
    let result = state.services.projekti.delete(id).await;
    crud::deleted(result, &RESOURCE, &back, "Projekt je obrisan")
}

async fn export_xlsx(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> WebResult<Response> {
    crud::export_xlsx(&RESOURCE, state.services.projekti.as_ref(), query).await
}

async fn export_pdf(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> WebResult<Response> {
    crud::export_pdf(&RESOURCE, state.services.projekti.as_ref(), query).await
}

async fn import_form(State(state): State<AppState>, flash: IncomingFlash) -> WebResult<Response> {
    crud::import_form(
        &state,
        &RESOURCE,
        state.services.projekti.required(),
        Projekt::COLUMNS,
        flash,
    )
}

async fn import(State(state): State<AppState>, multipart: Multipart) -> WebResult<Response> {
    crud::import_upload(&state, &RESOURCE, state.services.projekti.as_ref(), multipart).await
}
