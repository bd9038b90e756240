//! Task pages

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
use crate::models::{ListQuery, ListWindow, LookupKind, Zadatak, ZadatakForm};
use crate::reports::Tabular;
use crate::services::{RowImporter, ServiceResult, ZadatakService};

pub const RESOURCE: Resource = Resource {
    title: "Zadaci",
    base: "/zadaci",
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
impl Listing for ZadatakService {
    type Row = Zadatak;

    async fn count(&self) -> ServiceResult<i64> {
        ZadatakService::count(self).await
    }

    async fn rows(&self, window: &ListWindow) -> ServiceResult<Vec<Zadatak>> {
        self.list(window).await
    }

    fn id(row: &Zadatak) -> i64 {
        row.id
    }
}

async fn form_view(
    state: &AppState,
    title: &str,
    action: String,
    form: &ZadatakForm,
) -> WebResult<FormView> {
    let zahtjevi = state.services.zahtjevi.options().await?;
    let statusi = state.services.lookups.options(LookupKind::Status).await?;
    let osoba = osoba_label(state, &form.osoba_id).await?;

    Ok(FormView::new(title, action, RESOURCE.base)
        .return_to(&form.return_to)
        .field(Field::select("zahtjev_id", "Zahtjev", &form.zahtjev_id, &zahtjevi).required())
        .field(Field::text("naziv", "Naziv", &form.naziv).required())
        .field(Field::select("status_id", "Status", &form.status_id, &statusi).required())
        .field(Field::autocomplete(
            "osoba_id",
            "Izvršitelj",
            &form.osoba_id,
            osoba,
            "/autocomplete/osobe",
        ))
        .field(
            Field::date("planirani_pocetak", "Planirani početak", &form.planirani_pocetak)
                .required(),
        )
        .field(Field::date("planirani_kraj", "Planirani kraj", &form.planirani_kraj))
        .field(Field::date("stvarni_kraj", "Stvarni kraj", &form.stvarni_kraj))
        .field(Field::textarea("opis", "Opis", &form.opis)))
}

async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    flash: IncomingFlash,
) -> WebResult<Response> {
    crud::index(&state, &RESOURCE, state.services.zadaci.as_ref(), query, flash).await
}

async fn create_form(
    State(state): State<AppState>,
    Query(form): Query<ZadatakForm>,
    flash: IncomingFlash,
) -> WebResult<Response> {
    form_view(&state, "Novi zadatak", "/zadaci/create".into(), &form)
        .await?
        .render(&state, flash)
}

async fn create(State(state): State<AppState>, Form(form): Form<ZadatakForm>) -> WebResult<Response> {
    match state.services.zadaci.create(&form).await {
        Ok(_) => Ok(crud::saved(
            &format!("Zadatak \"{}\" je dodan", form.naziv.trim()),
            &form.return_to,
            RESOURCE.base,
        )),
        Err(e) => Rejected::from_error(e)?.render(
            form_view(&state, "Novi zadatak", "/zadaci/create".into(), &form).await?,
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
    let zadatak = state.services.zadaci.get(id).await?;
    let mut form = ZadatakForm::from(&zadatak);
    form.return_to = back.return_to;
    form_view(&state, &zadatak.naziv, RESOURCE.edit_url(id), &form)
        .await?
        .render(&state, flash)
}

async fn edit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<ZadatakForm>,
) -> WebResult<Response> {
    match state.services.zadaci.update(id, &form).await {
        Ok(()) => Ok(crud::saved("Zadatak je spremljen", &form.return_to, RESOURCE.base)),
        Err(e) => Rejected::from_error(e)?.render(
            form_view(&state, "Uređivanje zadatka", RESOURCE.edit_url(id), &form).await?,
            &state,
        ),
    }
}

async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(back): Form<ReturnTo>,
) -> WebResult<Response> {
    let result = state.services.zadaci.delete(id).await;
    crud::deleted(result, &RESOURCE, &back, "Zadatak je obrisan")
}

async fn export_xlsx(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> WebResult<Response> {
    crud::export_xlsx(&RESOURCE, state.services.zadaci.as_ref(), query).await
}

async fn export_pdf(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> WebResult<Response> {
    crud::export_pdf(&RESOURCE, state.services.zadaci.as_ref(), query).await
}

async fn import_form(State(state): State<AppState>, flash: IncomingFlash) -> WebResult<Response> {
    crud::import_form(
        &state,
        &RESOURCE,
        state.services.zadaci.required(),
        Zadatak::COLUMNS,
        flash,
    )
}

async fn import(State(state): State<AppState>, multipart: Multipart) -> WebResult<Response> {
    crud::import_upload(&state, &RESOURCE, state.services.zadaci.as_ref(), multipart).await
}
