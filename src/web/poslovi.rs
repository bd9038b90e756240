//! Job pages
//!
//! A job ties a person to a project. The person is picked through the
//! autocomplete input; project, role and kind are plain selects.

use async_trait::async_trait;
use axum::{
    extract::{Multipart, Path, Query, State},
    response::Response,
    routing::{get, post},
    Form, Router,
};

use super::autocomplete::osoba_label;
use super::common::ReturnTo;
use super::crud::{self, Listing, Resource};
use super::error::WebResult;
use super::flash::IncomingFlash;
use super::form::{Field, FormView, Rejected};
use super::middleware::AppState;
use crate::models::{ListQuery, ListWindow, LookupKind, Posao, PosaoForm};
use crate::reports::Tabular;
use crate::services::{PosaoService, RowImporter, ServiceResult};

pub const RESOURCE: Resource = Resource {
    title: "Poslovi",
    base: "/poslovi",
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
impl Listing for PosaoService {
    type Row = Posao;

    async fn count(&self) -> ServiceResult<i64> {
        PosaoService::count(self).await
    }

    async fn rows(&self, window: &ListWindow) -> ServiceResult<Vec<Posao>> {
        self.list(window).await
    }

    fn id(row: &Posao) -> i64 {
        row.id
    }
}

async fn form_view(
    state: &AppState,
    title: &str,
    action: String,
    form: &PosaoForm,
) -> WebResult<FormView> {
    let services = &state.services;
    let projekti = services.projekti.options().await?;
    let uloge = services.lookups.options(LookupKind::Uloga).await?;
    let vrste = services.lookups.options(LookupKind::VrstaPosla).await?;
    let osoba = osoba_label(state, &form.osoba_id).await?;

    Ok(FormView::new(title, action, RESOURCE.base)
        .return_to(&form.return_to)
        .field(Field::select("projekt_id", "Projekt", &form.projekt_id, &projekti).required())
        .field(
            Field::autocomplete("osoba_id", "Osoba", &form.osoba_id, osoba, "/autocomplete/osobe")
                .required(),
        )
        .field(Field::select("uloga_id", "Uloga", &form.uloga_id, &uloge).required())
        .field(
            Field::select("vrsta_posla_id", "Vrsta posla", &form.vrsta_posla_id, &vrste)
                .required(),
        )
        .field(Field::text("satnica", "Satnica", &form.satnica).required())
        .field(Field::date("datum_od", "Od", &form.datum_od).required())
        .field(Field::date("datum_do", "Do", &form.datum_do))
        .field(Field::textarea("opis", "Opis", &form.opis)))
}

async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    flash: IncomingFlash,
) -> WebResult<Response> {
    crud::index(&state, &RESOURCE, state.services.poslovi.as_ref(), query, flash).await
}

/// Query values preselect fields, e.g. `?projekt_id=3&return_to=/projekti/3`
async fn create_form(
    State(state): State<AppState>,
    Query(form): Query<PosaoForm>,
    flash: IncomingFlash,
) -> WebResult<Response> {
    form_view(&state, "Novi posao", "/poslovi/create".into(), &form)
        .await?
        .render(&state, flash)
}

async fn create(State(state): State<AppState>, Form(form): Form<PosaoForm>) -> WebResult<Response> {
    match state.services.poslovi.create(&form).await {
        Ok(_) => Ok(crud::saved("Posao je dodan", &form.return_to, RESOURCE.base)),
        Err(e) => Rejected::from_error(e)?.render(
            form_view(&state, "Novi posao", "/poslovi/create".into(), &form).await?,
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
    let posao = state.services.poslovi.get(id).await?;
    let mut form = PosaoForm::from(&posao);
    form.return_to = back.return_to;
    form_view(
        &state,
        &format!("Posao: {} na {}", posao.osoba, posao.projekt_kratica),
        RESOURCE.edit_url(id),
        &form,
    )
    .await?
    .render(&state, flash)
}

async fn edit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<PosaoForm>,
) -> WebResult<Response> {
    match state.services.poslovi.update(id, &form).await {
        Ok(()) => Ok(crud::saved("Posao je spremljen", &form.return_to, RESOURCE.base)),
        Err(e) => Rejected::from_error(e)?.render(
            form_view(&state, "Uređivanje posla", RESOURCE.edit_url(id), &form).await?,
            &state,
        ),
    }
}

async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(back): Form<ReturnTo>,
) -> WebResult<Response> {
    let result = state.services.poslovi.delete(id).await;
    crud::deleted(result, &RESOURCE, &back, "Posao je obrisan")
}

async fn export_xlsx(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> WebResult<Response> {
    crud::export_xlsx(&RESOURCE, state.services.poslovi.as_ref(), query).await
}

async fn export_pdf(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> WebResult<Response> {
    crud::export_pdf(&RESOURCE, state.services.poslovi.as_ref(), query).await
}

async fn import_form(State(state): State<AppState>, flash: IncomingFlash) -> WebResult<Response> {
    crud::import_form(
        &state,
        &RESOURCE,
        state.services.poslovi.required(),
        Posao::COLUMNS,
        flash,
    )
}

async fn import(State(state): State<AppState>, multipart: Multipart) -> WebResult<Response> {
    crud::import_upload(&state, &RESOURCE, state.services.poslovi.as_ref(), multipart).await
}
