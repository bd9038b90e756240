//! Project card pages
//!
//! The balance is never edited directly; it follows the starting balance
//! and the card's transactions.

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
use super::transakcije;
use crate::models::{Kartica, KarticaForm, ListQuery, ListWindow};
use crate::reports::Tabular;
use crate::services::{KarticaService, RowImporter, ServiceResult};

pub const RESOURCE: Resource = Resource {
    title: "Kartice",
    base: "/kartice",
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
impl Listing for KarticaService {
    type Row = Kartica;

    async fn count(&self) -> ServiceResult<i64> {
        KarticaService::count(self).await
    }

    async fn rows(&self, window: &ListWindow) -> ServiceResult<Vec<Kartica>> {
        self.list(window).await
    }

    fn id(row: &Kartica) -> i64 {
        row.id
    }
}

async fn form_view(
    state: &AppState,
    title: &str,
    action: String,
    form: &KarticaForm,
) -> WebResult<FormView> {
    let projekti = state.services.projekti.options().await?;

    Ok(FormView::new(title, action, RESOURCE.base)
        .return_to(&form.return_to)
        .field(Field::select("projekt_id", "Projekt", &form.projekt_id, &projekti).required())
        .field(Field::text("broj", "Broj (IBAN)", &form.broj).required())
        .field(Field::text("banka", "Banka", &form.banka).required())
        .field(Field::text("pocetno_stanje", "Početno stanje", &form.pocetno_stanje).required()))
}

async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    flash: IncomingFlash,
) -> WebResult<Response> {
    crud::index(&state, &RESOURCE, state.services.kartice.as_ref(), query, flash).await
}

async fn create_form(
    State(state): State<AppState>,
    Query(form): Query<KarticaForm>,
    flash: IncomingFlash,
) -> WebResult<Response> {
    form_view(&state, "Nova kartica", "/kartice/create".into(), &form)
        .await?
        .render(&state, flash)
}

async fn create(State(state): State<AppState>, Form(form): Form<KarticaForm>) -> WebResult<Response> {
    match state.services.kartice.create(&form).await {
        Ok(_) => Ok(crud::saved("Kartica je dodana", &form.return_to, RESOURCE.base)),
        Err(e) => Rejected::from_error(e)?.render(
            form_view(&state, "Nova kartica", "/kartice/create".into(), &form).await?,
            &state,
        ),
    }
}

async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    flash: IncomingFlash,
) -> WebResult<Response> {
    let detail = state.services.kartice.detail(id).await?;
    let self_url = RESOURCE.detail_url(id);

    DetailView::new(&RESOURCE, id, &detail.kartica)
        .fact("Broj transakcija", detail.transakcije.len().to_string())
        .section(
            Section::new(&transakcije::RESOURCE, &detail.transakcije, |t| t.id)
                .create_with("kartica_id", id, &self_url),
        )
        .render(&state, &detail.kartica.label(), flash)
}

async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(back): Query<ReturnTo>,
    flash: IncomingFlash,
) -> WebResult<Response> {
    let kartica = state.services.kartice.get(id).await?;
    let mut form = KarticaForm::from(&kartica);
    form.return_to = back.return_to;
    form_view(&state, &kartica.label(), RESOURCE.edit_url(id), &form)
        .await?
        .render(&state, flash)
}

async fn edit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<KarticaForm>,
) -> WebResult<Response> {
    match state.services.kartice.update(id, &form).await {
        Ok(()) => Ok(crud::saved("Kartica je spremljena", &form.return_to, RESOURCE.base)),
        Err(e) => Rejected::from_error(e)?.render(
            form_view(&state, "Uređivanje kartice", RESOURCE.edit_url(id), &form).await?,
            &state,
        ),
    }
}

async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(back): Form<ReturnTo>,
) -> WebResult<Response> {
    let result = state.services.kartice.delete(id).await;
    crud::deleted(result, &RESOURCE, &back, "Kartica je obrisana")
}

async fn export_xlsx(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> WebResult<Response> {
    crud::export_xlsx(&RESOURCE, state.services.kartice.as_ref(), query).await
}

async fn export_pdf(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> WebResult<Response> {
    crud::export_pdf(&RESOURCE, state.services.kartice.as_ref(), query).await
}

async fn import_form(State(state): State<AppState>, flash: IncomingFlash) -> WebResult<Response> {
    crud::import_form(
        &state,
        &RESOURCE,
        state.services.kartice.required(),
        Kartica::COLUMNS,
        flash,
    )
}

async fn import(State(state): State<AppState>, multipart: Multipart) -> WebResult<Response> {
    crud::import_upload(&state, &RESOURCE, state.services.kartice.as_ref(), multipart).await
}
