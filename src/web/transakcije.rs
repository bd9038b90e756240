//! Card transaction pages
//!
//! Saving or deleting a transaction moves the card balance; a refused
//! payout comes back as a 409 with the balance in the banner.

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
use crate::models::{ListQuery, ListWindow, LookupKind, Smjer, Transakcija, TransakcijaForm};
use crate::reports::Tabular;
use crate::services::{RowImporter, ServiceResult, TransakcijaService};

pub const RESOURCE: Resource = Resource {
    title: "Transakcije",
    base: "/transakcije",
    detail: false,
};

const SMJEROVI: [(&str, &str); 2] = [
    (Smjer::Uplata.as_str(), Smjer::Uplata.label()),
    (Smjer::Isplata.as_str(), Smjer::Isplata.label()),
];

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
impl Listing for TransakcijaService {
    type Row = Transakcija;

    async fn count(&self) -> ServiceResult<i64> {
        TransakcijaService::count(self).await
    }

    async fn rows(&self, window: &ListWindow) -> ServiceResult<Vec<Transakcija>> {
        self.list(window).await
    }

    fn id(row: &Transakcija) -> i64 {
        row.id
    }
}

async fn form_view(
    state: &AppState,
    title: &str,
    action: String,
    form: &TransakcijaForm,
) -> WebResult<FormView> {
    let kartice = state.services.kartice.options().await?;
    let vrste = state
        .services
        .lookups
        .options(LookupKind::VrstaTransakcije)
        .await?;

    Ok(FormView::new(title, action, RESOURCE.base)
        .return_to(&form.return_to)
        .field(Field::select("kartica_id", "Kartica", &form.kartica_id, &kartice).required())
        .field(Field::choice("smjer", "Smjer", &form.smjer, &SMJEROVI).required())
        .field(Field::text("iznos", "Iznos", &form.iznos).required())
        .field(Field::date("datum", "Datum", &form.datum).required())
        .field(
            Field::select(
                "vrsta_transakcije_id",
                "Vrsta transakcije",
                &form.vrsta_transakcije_id,
                &vrste,
            )
            .required(),
        )
        .field(Field::text("protustrana", "Protustrana", &form.protustrana))
        .field(Field::textarea("opis", "Opis", &form.opis)))
}

async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    flash: IncomingFlash,
) -> WebResult<Response> {
    crud::index(&state, &RESOURCE, state.services.transakcije.as_ref(), query, flash).await
}

async fn create_form(
    State(state): State<AppState>,
    Query(form): Query<TransakcijaForm>,
    flash: IncomingFlash,
) -> WebResult<Response> {
    form_view(&state, "Nova transakcija", "/transakcije/create".into(), &form)
        .await?
        .render(&state, flash)
}

async fn create(
    State(state): State<AppState>,
    Form(form): Form<TransakcijaForm>,
) -> WebResult<Response> {
    match state.services.transakcije.create(&form).await {
        Ok(_) => Ok(crud::saved("Transakcija je dodana", &form.return_to, RESOURCE.base)),
        Err(e) => Rejected::from_error(e)?.render(
            form_view(&state, "Nova transakcija", "/transakcije/create".into(), &form).await?,
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
    let transakcija = state.services.transakcije.get(id).await?;
    let mut form = TransakcijaForm::from(&transakcija);
    form.return_to = back.return_to;
    form_view(
        &state,
        &format!(
            "{}: {} {}",
            transakcija.kartica_broj,
            transakcija.smjer.label(),
            transakcija.datum.format("%d.%m.%Y")
        ),
        RESOURCE.edit_url(id),
        &form,
    )
    .await?
    .render(&state, flash)
}

async fn edit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<TransakcijaForm>,
) -> WebResult<Response> {
    match state.services.transakcije.update(id, &form).await {
        Ok(()) => Ok(crud::saved("Transakcija je spremljena", &form.return_to, RESOURCE.base)),
        Err(e) => Rejected::from_error(e)?.render(
            form_view(&state, "Uređivanje transakcije", RESOURCE.edit_url(id), &form).await?,
            &state,
        ),
    }
}

async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(back): Form<ReturnTo>,
) -> WebResult<Response> {
    let result = state.services.transakcije.delete(id).await;
    crud::deleted(result, &RESOURCE, &back, "Transakcija je obrisana")
}

async fn export_xlsx(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> WebResult<Response> {
    crud::export_xlsx(&RESOURCE, state.services.transakcije.as_ref(), query).await
}

async fn export_pdf(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> WebResult<Response> {
    crud::export_pdf(&RESOURCE, state.services.transakcije.as_ref(), query).await
}

async fn import_form(State(state): State<AppState>, flash: IncomingFlash) -> WebResult<Response> {
    crud::import_form(
        &state,
        &RESOURCE,
        state.services.transakcije.required(),
        Transakcija::COLUMNS,
        flash,
    )
}

async fn import(State(state): State<AppState>, multipart: Multipart) -> WebResult<Response> {
    crud::import_upload(&state, &RESOURCE, state.services.transakcije.as_ref(), multipart).await
}
