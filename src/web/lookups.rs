//! Lookup table pages
//!
//! One router per `LookupKind`, nested under the kind's path. The kind
//! reaches the handlers as a request extension.

use async_trait::async_trait;
use axum::{
    extract::{Multipart, Path, Query, State},
    response::Response,
    routing::{get, post},
    Extension, Form, Router,
};

use super::common::ReturnTo;
use super::crud::{self, Listing, Resource};
use super::error::WebResult;
use super::flash::IncomingFlash;
use super::form::{Field, FormView, Rejected};
use super::middleware::AppState;
use crate::models::{ListQuery, ListWindow, Lookup, LookupForm, LookupKind};
use crate::reports::Tabular;
use crate::services::{LookupService, ServiceResult};

pub fn router(kind: LookupKind) -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/create", get(create_form).post(create))
        .route("/{id}/edit", get(edit_form).post(edit))
        .route("/{id}/delete", post(delete))
        .route("/export.xlsx", get(export_xlsx))
        .route("/export.pdf", get(export_pdf))
        .route("/import", get(import_form).post(import))
        .layer(Extension(kind))
}

fn resource(kind: LookupKind) -> Resource {
    Resource {
        title: kind.title(),
        base: kind.path(),
        detail: false,
    }
}

struct KindListing<'a> {
    service: &'a LookupService,
    kind: LookupKind,
}

#[async_trait]
impl Listing for KindListing<'_> {
    type Row = Lookup;

    async fn count(&self) -> ServiceResult<i64> {
        self.service.count(self.kind).await
    }

    async fn rows(&self, window: &ListWindow) -> ServiceResult<Vec<Lookup>> {
        self.service.list(self.kind, window).await
    }

    fn id(row: &Lookup) -> i64 {
        row.id
    }
}

fn listing(state: &AppState, kind: LookupKind) -> KindListing<'_> {
    KindListing {
        service: &state.services.lookups,
        kind,
    }
}

fn form_view(kind: LookupKind, title: String, action: String, form: &LookupForm) -> FormView {
    FormView::new(title, action, kind.path())
        .field(Field::text("naziv", "Naziv", &form.naziv).required())
}

async fn index(
    State(state): State<AppState>,
    Extension(kind): Extension<LookupKind>,
    Query(query): Query<ListQuery>,
    flash: IncomingFlash,
) -> WebResult<Response> {
    crud::index(&state, &resource(kind), &listing(&state, kind), query, flash).await
}

async fn create_form(
    State(state): State<AppState>,
    Extension(kind): Extension<LookupKind>,
    flash: IncomingFlash,
) -> WebResult<Response> {
    form_view(
        kind,
        format!("{}: novi zapis", kind.title()),
        format!("{}/create", kind.path()),
        &LookupForm::default(),
    )
    .render(&state, flash)
}

async fn create(
    State(state): State<AppState>,
    Extension(kind): Extension<LookupKind>,
    Form(form): Form<LookupForm>,
) -> WebResult<Response> {
    match state.services.lookups.create(kind, &form).await {
        Ok(_) => Ok(crud::saved(
            &format!("{}: zapis \"{}\" je dodan", kind.title(), form.naziv.trim()),
            "",
            kind.path(),
        )),
        Err(e) => Rejected::from_error(e)?.render(
            form_view(
                kind,
                format!("{}: novi zapis", kind.title()),
                format!("{}/create", kind.path()),
                &form,
            ),
            &state,
        ),
    }
}

async fn edit_form(
    State(state): State<AppState>,
    Extension(kind): Extension<LookupKind>,
    Path(id): Path<i64>,
    flash: IncomingFlash,
) -> WebResult<Response> {
    let lookup = state.services.lookups.get(kind, id).await?;
    form_view(
        kind,
        format!("{}: {}", kind.label(), lookup.naziv),
        format!("{}/{}/edit", kind.path(), id),
        &LookupForm::from(&lookup),
    )
    .render(&state, flash)
}

async fn edit(
    State(state): State<AppState>,
    Extension(kind): Extension<LookupKind>,
    Path(id): Path<i64>,
    Form(form): Form<LookupForm>,
) -> WebResult<Response> {
    match state.services.lookups.update(kind, id, &form).await {
        Ok(()) => Ok(crud::saved(
            &format!("{}: zapis je spremljen", kind.title()),
            "",
            kind.path(),
        )),
        Err(e) => Rejected::from_error(e)?.render(
            form_view(
                kind,
                format!("{}: uređivanje", kind.label()),
                format!("{}/{}/edit", kind.path(), id),
                &form,
            ),
            &state,
        ),
    }
}

async fn delete(
    State(state): State<AppState>,
    Extension(kind): Extension<LookupKind>,
    Path(id): Path<i64>,
    Form(back): Form<ReturnTo>,
) -> WebResult<Response> {
    let result = state.services.lookups.delete(kind, id).await;
    crud::deleted(
        result,
        &resource(kind),
        &back,
        &format!("{}: zapis je obrisan", kind.title()),
    )
}

async fn export_xlsx(
    State(state): State<AppState>,
    Extension(kind): Extension<LookupKind>,
    Query(query): Query<ListQuery>,
) -> WebResult<Response> {
    crud::export_xlsx(&resource(kind), &listing(&state, kind), query).await
}

async fn export_pdf(
    State(state): State<AppState>,
    Extension(kind): Extension<LookupKind>,
    Query(query): Query<ListQuery>,
) -> WebResult<Response> {
    crud::export_pdf(&resource(kind), &listing(&state, kind), query).await
}

async fn import_form(
    State(state): State<AppState>,
    Extension(kind): Extension<LookupKind>,
    flash: IncomingFlash,
) -> WebResult<Response> {
    crud::import_form(&state, &resource(kind), Lookup::COLUMNS, Lookup::COLUMNS, flash)
}

async fn import(
    State(state): State<AppState>,
    Extension(kind): Extension<LookupKind>,
    multipart: Multipart,
) -> WebResult<Response> {
    let importer = state.services.lookups.importer(kind);
    crud::import_upload(&state, &resource(kind), &importer, multipart).await
}
