//! Request pages; a request's detail page lists its tasks

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
use super::zadaci;
use crate::models::{ListQuery, ListWindow, LookupKind, Zahtjev, ZahtjevForm};
use crate::reports::Tabular;
use crate::services::{RowImporter, ServiceResult, ZahtjevService};

pub const RESOURCE: Resource = Resource {
    title: "Zahtjevi",
    base: "/zahtjevi",
    detail: true,
};

/// 1 is the most urgent
const PRIORITETI: [(&str, &str); 5] = [
    ("1", "1 - hitno"),
    ("2", "2 - visok"),
    ("3", "3 - srednji"),
    ("4", "4 - nizak"),
    ("5", "5 - kad stigne"),
];

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
impl Listing for ZahtjevService {
    type Row = Zahtjev;

    async fn count(&self) -> ServiceResult<i64> {
        ZahtjevService::count(self).await
    }

    async fn rows(&self, window: &ListWindow) -> ServiceResult<Vec<Zahtjev>> {
        self.list(window).await
    }

    fn id(row: &Zahtjev) -> i64 {
        row.id
    }
}

async fn form_view(
    state: &AppState,
    title: &str,
    action: String,
    form: &ZahtjevForm,
) -> WebResult<FormView> {
    let projekti = state.services.projekti.options().await?;
    let vrste = state
        .services
        .lookups
        .options(LookupKind::VrstaZahtjeva)
        .await?;

    Ok(FormView::new(title, action, RESOURCE.base)
        .return_to(&form.return_to)
        .field(Field::select("projekt_id", "Projekt", &form.projekt_id, &projekti).required())
        .field(
            Field::select(
                "vrsta_zahtjeva_id",
                "Vrsta zahtjeva",
                &form.vrsta_zahtjeva_id,
                &vrste,
            )
            .required(),
        )
        .field(Field::text("naslov", "Naslov", &form.naslov).required())
        .field(Field::choice("prioritet", "Prioritet", &form.prioritet, &PRIORITETI).required())
        .field(Field::date("datum_podnosenja", "Podnesen", &form.datum_podnosenja).required())
        .field(Field::textarea("opis", "Opis", &form.opis)))
}

async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    flash: IncomingFlash,
) -> WebResult<Response> {
    crud::index(&state, &RESOURCE, state.services.zahtjevi.as_ref(), query, flash).await
}

async fn create_form(
    State(state): State<AppState>,
    Query(form): Query<ZahtjevForm>,
    flash: IncomingFlash,
) -> WebResult<Response> {
    form_view(&state, "Novi zahtjev", "/zahtjevi/create".into(), &form)
        .await?
        .render(&state, flash)
}

async fn create(State(state): State<AppState>, Form(form): Form<ZahtjevForm>) -> WebResult<Response> {
    match state.services.zahtjevi.create(&form).await {
        Ok(_) => Ok(crud::saved(
            &format!("Zahtjev \"{}\" je dodan", form.naslov.trim()),
            &form.return_to,
            RESOURCE.base,
        )),
        Err(e) => Rejected::from_error(e)?.render(
            form_view(&state, "Novi zahtjev", "/zahtjevi/create".into(), &form).await?,
            &state,
        ),
    }
}

async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    flash: IncomingFlash,
) -> WebResult<Response> {
    let detail = state.services.zahtjevi.detail(id).await?;
    let self_url = RESOURCE.detail_url(id);
    let otvoreni = detail.zadaci.iter().filter(|z| z.stvarni_kraj.is_none()).count();

    DetailView::new(&RESOURCE, id, &detail.zahtjev)
        .fact("Otvoreni zadaci", format!("{} od {}", otvoreni, detail.zadaci.len()))
        .section(
            Section::new(&zadaci::RESOURCE, &detail.zadaci, |z| z.id)
                .create_with("zahtjev_id", id, &self_url),
        )
        .render(&state, &detail.zahtjev.label(), flash)
}

async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(back): Query<ReturnTo>,
    flash: IncomingFlash,
) -> WebResult<Response> {
    let zahtjev = state.services.zahtjevi.get(id).await?;
    let mut form = ZahtjevForm::from(&zahtjev);
    form.return_to = back.return_to;
    form_view(&state, &zahtjev.label(), RESOURCE.edit_url(id), &form)
        .await?
        .render(&state, flash)
}

async fn edit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<ZahtjevForm>,
) -> WebResult<Response> {
    match state.services.zahtjevi.update(id, &form).await {
        Ok(()) => Ok(crud::saved("Zahtjev je spremljen", &form.return_to, RESOURCE.base)),
        Err(e) => Rejected::from_error(e)?.render(
            form_view(&state, "Uređivanje zahtjeva", RESOURCE.edit_url(id), &form).await?,
            &state,
        ),
    }
}

async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(back): Form<ReturnTo>,
) -> WebResult<Response> {
    let result = state.services.zahtjevi.delete(id).await;
    crud::deleted(result, &RESOURCE, &back, "Zahtjev je obrisan")
}

async fn export_xlsx(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> WebResult<Response> {
    crud::export_xlsx(&RESOURCE, state.services.zahtjevi.as_ref(), query).await
}

async fn export_pdf(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> WebResult<Response> {
    crud::export_pdf(&RESOURCE, state.services.zahtjevi.as_ref(), query).await
}

async fn import_form(State(state): State<AppState>, flash: IncomingFlash) -> WebResult<Response> {
    crud::import_form(
        &state,
        &RESOURCE,
        state.services.zahtjevi.required(),
        Zahtjev::COLUMNS,
        flash,
    )
}

async fn import(State(state): State<AppState>, multipart: Multipart) -> WebResult<Response> {
    crud::import_upload(&state, &RESOURCE, state.services.zahtjevi.as_ref(), multipart).await
}
