//! Partner pages

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
use crate::models::{ListQuery, ListWindow, LookupKind, Partner, PartnerForm};
use crate::reports::Tabular;
use crate::services::{PartnerService, RowImporter, ServiceResult};

pub const RESOURCE: Resource = Resource {
    title: "Partneri",
    base: "/partneri",
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
impl Listing for PartnerService {
    type Row = Partner;

    async fn count(&self) -> ServiceResult<i64> {
        PartnerService::count(self).await
    }

    async fn rows(&self, window: &ListWindow) -> ServiceResult<Vec<Partner>> {
        self.list(window).await
    }

    fn id(row: &Partner) -> i64 {
        row.id
    }
}

async fn form_view(
    state: &AppState,
    title: &str,
    action: String,
    form: &PartnerForm,
) -> WebResult<FormView> {
    let vrste = state
        .services
        .lookups
        .options(LookupKind::VrstaPartnera)
        .await?;

    Ok(FormView::new(title, action, RESOURCE.base)
        .field(Field::text("naziv", "Naziv", &form.naziv).required())
        .field(Field::text("oib", "OIB", &form.oib).required())
        .field(Field::text("adresa", "Adresa", &form.adresa))
        .field(Field::email("email", "E-mail", &form.email))
        .field(
            Field::select(
                "vrsta_partnera_id",
                "Vrsta partnera",
                &form.vrsta_partnera_id,
                &vrste,
            )
            .required(),
        ))
}

async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    flash: IncomingFlash,
) -> WebResult<Response> {
    crud::index(&state, &RESOURCE, state.services.partneri.as_ref(), query, flash).await
}

async fn create_form(State(state): State<AppState>, flash: IncomingFlash) -> WebResult<Response> {
    form_view(&state, "Novi partner", "/partneri/create".into(), &PartnerForm::default())
        .await?
        .render(&state, flash)
}

async fn create(
    State(state): State<AppState>,
    Form(form): Form<PartnerForm>,
) -> WebResult<Response> {
    match state.services.partneri.create(&form).await {
        Ok(_) => Ok(crud::saved(
            &format!("Partner {} je dodan", form.naziv.trim()),
            "",
            RESOURCE.base,
        )),
        Err(e) => Rejected::from_error(e)?.render(
            form_view(&state, "Novi partner", "/partneri/create".into(), &form).await?,
            &state,
        ),
    }
}

async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    flash: IncomingFlash,
) -> WebResult<Response> {
    let partner = state.services.partneri.get(id).await?;
    form_view(
        &state,
        &partner.label(),
        RESOURCE.edit_url(id),
        &PartnerForm::from(&partner),
    )
    .await?
    .render(&state, flash)
}

async fn edit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<PartnerForm>,
) -> WebResult<Response> {
    match state.services.partneri.update(id, &form).await {
        Ok(()) => Ok(crud::saved("Partner je spremljen", "", RESOURCE.base)),
        Err(e) => Rejected::from_error(e)?.render(
            form_view(&state, "Uređivanje partnera", RESOURCE.edit_url(id), &form).await?,
            &state,
        ),
    }
}

async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(back): Form<ReturnTo>,
) -> WebResult<Response> {
    let result = state.services.partneri.delete(id).await;
    crud::deleted(result, &RESOURCE, &back, "Partner je obrisan")
}

async fn export_xlsx(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> WebResult<Response> {
    crud::export_xlsx(&RESOURCE, state.services.partneri.as_ref(), query).await
}

async fn export_pdf(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> WebResult<Response> {
    crud::export_pdf(&RESOURCE, state.services.partneri.as_ref(), query).await
}

async fn import_form(State(state): State<AppState>, flash: IncomingFlash) -> WebResult<Response> {
    crud::import_form(
        &state,
        &RESOURCE,
        state.services.partneri.required(),
        Partner::COLUMNS,
        flash,
    )
}

async fn import(State(state): State<AppState>, multipart: Multipart) -> WebResult<Response> {
    crud::import_upload(&state, &RESOURCE, state.services.partneri.as_ref(), multipart).await
}
